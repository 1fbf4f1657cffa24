use crate::types::{CaseType, WorkType};
use thiserror::Error;

/// Pass-scoped failures. Any of these abandons the in-flight pass
/// without writing anything.
#[derive(Error, Debug)]
pub enum ChromoError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Cannot list {path}: {source}")]
    Scan {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid stored value in {table}.{column}: {value}")]
    CorruptRow {
        table: &'static str,
        column: &'static str,
        value: String,
    },

    #[error("Background task failed: {0}")]
    Task(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type ChromoResult<T> = Result<T, ChromoError>;

/// Case-scoped configuration errors. The case is skipped and retried
/// on the next pass; the rest of the batch proceeds.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AllocationError {
    #[error("no {work} workers configured for case type {case_type}")]
    NoQuota { case_type: CaseType, work: WorkType },

    #[error("total {work} quota for case type {case_type} is zero")]
    ZeroQuota { case_type: CaseType, work: WorkType },

    #[error("count group '{group_name}' has zero total quota for case type {case_type}")]
    ZeroQuotaGroup {
        group_name: String,
        case_type: CaseType,
    },

    #[error("analysis group '{group_name}' has {members} members for case type {case_type}, expected 2")]
    MalformedGroup {
        group_name: String,
        case_type: CaseType,
        members: usize,
    },

    #[error("analysis group '{group_name}' lists user {user_id} twice for case type {case_type}")]
    DuplicateMember {
        group_name: String,
        case_type: CaseType,
        user_id: String,
    },

    #[error("rotation for case {case_id} selected no {work} slot")]
    Unassigned { case_id: String, work: WorkType },
}
