//! Shared fixtures: a small lab roster, a frozen clock, and scan directories.
#![allow(dead_code)]

use chromo_core::{
    clock::{Clock, FixedClock},
    config::SourceLayout,
    quota::Division,
    reconcile::Reconciler,
    scanner::{FsEntries, Scanner},
    store::{CaseStore, GroupRow, Roster, UserRow},
    types::{CaseType, WorkType},
};
use std::path::Path;

pub const NOW: &str = "2021-04-05T09:00:00+08:00";

pub fn clock() -> FixedClock {
    FixedClock::parse(NOW).expect("valid timestamp")
}

fn user(id: &str, realname: &str) -> UserRow {
    UserRow {
        id: id.into(),
        username: id.into(),
        realname: realname.into(),
        is_admin: false,
    }
}

fn division(id: &str, group_id: &str, user_id: &str, quantities: u32, case_type: CaseType) -> Division {
    Division {
        id: id.into(),
        group_id: group_id.into(),
        user_id: user_id.into(),
        user_name: None,
        quantities,
        case_type,
    }
}

/// Two analysis pairs and two counters.
///
/// L: "Analysis A" [a1=6, a2=4], "Analysis B" [a3=5, a4=5]; counters k1=5, k2=5.
/// G: "Analysis A" [a1=1, a2=1]; counters k1=g, k2=g where g = `g_count_quota`.
pub fn roster(g_count_quota: u32) -> Roster {
    Roster {
        users: vec![
            user("a1", "Analyst One"),
            user("a2", "Analyst Two"),
            user("a3", "Analyst Three"),
            user("a4", "Analyst Four"),
            user("k1", "Counter One"),
            user("k2", "Counter Two"),
        ],
        groups: vec![
            GroupRow {
                id: "gb".into(),
                group_name: "Analysis B".into(),
                group_type: WorkType::Analysis,
            },
            GroupRow {
                id: "ga".into(),
                group_name: "Analysis A".into(),
                group_type: WorkType::Analysis,
            },
            GroupRow {
                id: "gc".into(),
                group_name: "Count".into(),
                group_type: WorkType::Count,
            },
        ],
        divisions: vec![
            division("d1", "ga", "a1", 6, CaseType::L),
            division("d2", "ga", "a2", 4, CaseType::L),
            division("d3", "gb", "a3", 5, CaseType::L),
            division("d4", "gb", "a4", 5, CaseType::L),
            division("d5", "gc", "k1", 5, CaseType::L),
            division("d6", "gc", "k2", 5, CaseType::L),
            division("d7", "ga", "a1", 1, CaseType::G),
            division("d8", "ga", "a2", 1, CaseType::G),
            division("d9", "gc", "k1", g_count_quota, CaseType::G),
            division("d10", "gc", "k2", g_count_quota, CaseType::G),
        ],
    }
}

/// Route library logs through the test harness. Safe to call repeatedly.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn seeded_store(g_count_quota: u32) -> CaseStore {
    init_logging();
    let store = CaseStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    store
        .import_roster(&roster(g_count_quota), clock().now())
        .expect("roster import");
    store
}

pub fn touch(dir: &Path, names: &[&str]) {
    std::fs::create_dir_all(dir).expect("create scan dir");
    for name in names {
        std::fs::write(dir.join(name), b"").expect("write scan file");
    }
}

pub fn reconciler(store: CaseStore, dir: &Path) -> Reconciler<CaseStore, FsEntries> {
    Reconciler::new(
        store,
        Scanner::new(FsEntries, dir, "MMI", SourceLayout::Flat),
        Box::new(clock()),
        CaseType::ALL.to_vec(),
    )
}
