//! Discovery: listing the source directory and filtering candidates.

mod common;

use chromo_core::{
    config::SourceLayout,
    error::ChromoError,
    scanner::{candidate_ids, new_cases, FsEntries, Scanner},
    types::CaseType,
};
use std::collections::BTreeSet;

#[test]
fn candidate_ids_cut_dedupe_and_sort() {
    let names = [
        "L2104052638.045.MMI",
        "L2104052638.046.MMI",
        "G2104050001.001.MMI",
        "L2104050100.001.jpg",
        "notes.txt",
    ];
    assert_eq!(candidate_ids(names, "MMI"), ["G2104050001", "L2104052638"]);
}

#[test]
fn marker_may_appear_anywhere_in_the_name() {
    let names = ["L2104050001.MMI.bak", "L2104050002_MMI"];
    assert_eq!(candidate_ids(names, "MMI"), ["L2104050001", "L2104050002_MMI"]);
}

#[test]
fn flat_layout_lists_the_root() {
    let dir = tempfile::tempdir().unwrap();
    common::touch(
        dir.path(),
        &["L2104050002.001.MMI", "L2104050001.001.MMI", "L2104050001.002.MMI"],
    );
    let scanner = Scanner::new(FsEntries, dir.path(), "MMI", SourceLayout::Flat);

    let found = scanner.candidates(&common::clock()).unwrap();
    assert_eq!(found, ["L2104050001", "L2104050002"]);
    // Read-only: a second listing is identical.
    assert_eq!(scanner.candidates(&common::clock()).unwrap(), found);
}

#[test]
fn monthly_layout_lists_the_current_month() {
    let dir = tempfile::tempdir().unwrap();
    common::touch(&dir.path().join("2104"), &["L2104050001.001.MMI"]);
    common::touch(&dir.path().join("2103"), &["L2103310001.001.MMI"]);
    let scanner = Scanner::new(FsEntries, dir.path(), "MMI", SourceLayout::Monthly);

    assert_eq!(scanner.scan_path(&common::clock()), dir.path().join("2104"));
    assert_eq!(scanner.candidates(&common::clock()).unwrap(), ["L2104050001"]);
}

#[test]
fn missing_directory_is_a_scan_error() {
    let dir = tempfile::tempdir().unwrap();
    let scanner = Scanner::new(FsEntries, dir.path().join("absent"), "MMI", SourceLayout::Flat);

    let err = scanner.candidates(&common::clock()).unwrap_err();
    assert!(matches!(err, ChromoError::Scan { .. }), "got {err:?}");
}

#[test]
fn new_cases_drop_known_malformed_and_disabled() {
    let candidates: Vec<String> = [
        "G2104050001",
        "L2104050001",
        "L2104050002",
        "L21040",
        "X2104050003",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    let known: BTreeSet<String> = ["L2104050001".to_string()].into_iter().collect();

    let all: Vec<String> = new_cases(&candidates, &known, &CaseType::ALL)
        .iter()
        .map(|c| c.to_string())
        .collect();
    assert_eq!(all, ["G2104050001", "L2104050002"]);

    let only_l = new_cases(&candidates, &known, &[CaseType::L]);
    assert_eq!(only_l.len(), 1);
    assert_eq!(only_l[0].as_str(), "L2104050002");
}
