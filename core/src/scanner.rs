//! Discovery Scanner: lists the source location and derives candidate
//! case identifiers.
//!
//! Filenames look like `L2104052638.045.MMI`: everything after the first
//! `.` is dropped, duplicates collapse, and the result is sorted.
//! Listing is read-only, so scanning twice yields the same candidates.

use crate::{
    clock::Clock,
    config::{ChromoConfig, SourceLayout},
    error::{ChromoError, ChromoResult},
    types::{CaseId, CaseType},
};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Anything that can list the names in a directory-like location.
pub trait EntrySource: Send {
    fn list_entries(&self, path: &Path) -> std::io::Result<Vec<String>>;
}

/// The local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsEntries;

impl EntrySource for FsEntries {
    fn list_entries(&self, path: &Path) -> std::io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(path)? {
            names.push(entry?.file_name().to_string_lossy().into_owned());
        }
        Ok(names)
    }
}

pub struct Scanner<S: EntrySource> {
    source: S,
    root: PathBuf,
    marker: String,
    layout: SourceLayout,
}

impl<S: EntrySource> Scanner<S> {
    pub fn new(source: S, root: impl Into<PathBuf>, marker: impl Into<String>, layout: SourceLayout) -> Self {
        Self {
            source,
            root: root.into(),
            marker: marker.into(),
            layout,
        }
    }

    pub fn from_config(source: S, config: &ChromoConfig) -> Self {
        Self::new(source, config.src_path.clone(), config.src_ext.clone(), config.layout)
    }

    /// The directory this pass will list.
    pub fn scan_path(&self, clock: &dyn Clock) -> PathBuf {
        match self.layout {
            SourceLayout::Flat => self.root.clone(),
            SourceLayout::Monthly => self.root.join(clock.month_dir()),
        }
    }

    /// Sorted, deduplicated candidate identifiers from the current listing.
    pub fn candidates(&self, clock: &dyn Clock) -> ChromoResult<Vec<String>> {
        let path = self.scan_path(clock);
        let names = self
            .source
            .list_entries(&path)
            .map_err(|source| ChromoError::Scan {
                path: path.display().to_string(),
                source,
            })?;
        Ok(candidate_ids(names, &self.marker))
    }
}

/// Keep names containing `marker`, cut each at the first `.`,
/// drop duplicates, sort ascending.
pub fn candidate_ids<I>(names: I, marker: &str) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    names
        .into_iter()
        .filter(|n| n.as_ref().contains(marker))
        .filter_map(|n| n.as_ref().split('.').next().map(str::to_string))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Candidates not yet known to storage, restricted to well-formed
/// identifiers of an enabled case type. Anything else is dropped silently.
pub fn new_cases(candidates: &[String], known: &BTreeSet<String>, enabled: &[CaseType]) -> Vec<CaseId> {
    candidates
        .iter()
        .filter(|c| !known.contains(c.as_str()))
        .filter_map(|c| match CaseId::parse(c) {
            Ok(id) if enabled.contains(&id.case_type()) => Some(id),
            Ok(_) => {
                log::trace!("skipping {c}: case type not enabled");
                None
            }
            Err(reason) => {
                log::trace!("skipping {c}: {reason:?}");
                None
            }
        })
        .collect()
}
