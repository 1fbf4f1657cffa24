//! Review-side rules over persisted cases: what role a user plays on a
//! case, and whether a case is complete enough to export.

use crate::store::CaseDetail;
use serde::{Deserialize, Serialize};

/// Entries the main analyst must record.
pub const MAIN_ANALYSIS_ENTRIES: usize = 3;
/// Entries the secondary analyst must record.
pub const SECONDARY_ANALYSIS_ENTRIES: usize = 2;
/// Cells the counter must record.
pub const COUNT_ENTRIES: usize = 15;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum WorkRole {
    #[serde(rename = "C")]
    Count,
    #[serde(rename = "MA")]
    MainAnalysis,
    #[serde(rename = "SA")]
    SecondaryAnalysis,
}

/// The user's role on the case. Counting wins if the user holds both.
pub fn work_role(detail: &CaseDetail, user_id: &str) -> Option<WorkRole> {
    if detail.count.as_ref().is_some_and(|c| c.user_id == user_id) {
        return Some(WorkRole::Count);
    }
    detail
        .analyses
        .iter()
        .find(|a| a.user_id == user_id)
        .map(|a| {
            if a.is_main {
                WorkRole::MainAnalysis
            } else {
                WorkRole::SecondaryAnalysis
            }
        })
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExportIssue {
    MainAnalysisIncomplete,
    SecondaryAnalysisIncomplete,
    KaryotypeMismatch,
    CountIncomplete,
}

/// Everything blocking export of this case. Empty means ready.
pub fn export_issues(detail: &CaseDetail) -> Vec<ExportIssue> {
    let mut issues = Vec::new();
    let main = detail.analyses.iter().find(|a| a.is_main);
    let secondary = detail.analyses.iter().find(|a| !a.is_main);

    if main.map_or(true, |a| a.analysis.len() != MAIN_ANALYSIS_ENTRIES) {
        issues.push(ExportIssue::MainAnalysisIncomplete);
    }
    if secondary.map_or(true, |a| a.analysis.len() != SECONDARY_ANALYSIS_ENTRIES) {
        issues.push(ExportIssue::SecondaryAnalysisIncomplete);
    }
    let karyotypes_agree = match (main, secondary) {
        (Some(m), Some(s)) => m.karyotype == s.karyotype,
        _ => false,
    };
    if !karyotypes_agree {
        issues.push(ExportIssue::KaryotypeMismatch);
    }
    if detail
        .count
        .as_ref()
        .map_or(true, |c| c.count.len() != COUNT_ENTRIES)
    {
        issues.push(ExportIssue::CountIncomplete);
    }
    issues
}
