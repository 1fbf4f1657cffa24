//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database.
//! The reconciliation driver reaches it through CaseRepository;
//! it never executes SQL directly.

use crate::{
    allocation::Assignment,
    error::{ChromoError, ChromoResult},
    quota::Division,
    types::{RecordId, UserId, WorkType},
};
use chrono::{DateTime, FixedOffset};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

mod case;
mod roster;

pub struct CaseStore {
    conn: Connection,
}

impl CaseStore {
    pub fn open(path: &str) -> ChromoResult<Self> {
        let conn = Connection::open(path)?;
        // WAL only matters for real files; :memory: ignores it.
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> ChromoResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> ChromoResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_foundation.sql"))?;
        Ok(())
    }
}

pub(crate) fn new_record_id() -> RecordId {
    uuid::Uuid::new_v4().simple().to_string()
}

pub(crate) fn parse_work_type(value: String) -> ChromoResult<WorkType> {
    WorkType::parse(&value).ok_or(ChromoError::CorruptRow {
        table: "work_group",
        column: "group_type",
        value,
    })
}

// ── Row types ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserRow {
    pub id: UserId,
    pub username: String,
    pub realname: String,
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroupRow {
    pub id: RecordId,
    pub group_name: String,
    pub group_type: WorkType,
}

/// Users, groups and divisions imported together.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Roster {
    pub users: Vec<UserRow>,
    pub groups: Vec<GroupRow>,
    pub divisions: Vec<Division>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaseRow {
    pub id: RecordId,
    pub case_id: String,
    pub finished: bool,
    pub create_time: String,
    pub update_time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisRow {
    pub id: RecordId,
    pub case_id: String,
    pub user_id: UserId,
    pub user_name: Option<String>,
    pub is_main: bool,
    pub analysis: Vec<String>,
    pub karyotype: Option<String>,
    pub create_time: String,
    pub update_time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CountRow {
    pub id: RecordId,
    pub case_id: String,
    pub user_id: UserId,
    pub user_name: Option<String>,
    pub count: Vec<String>,
    pub extra: Vec<String>,
    pub remark: Option<String>,
    pub create_time: String,
    pub update_time: String,
}

/// A case with both analysis records and its count record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaseDetail {
    pub case: CaseRow,
    pub analyses: Vec<AnalysisRow>,
    pub count: Option<CountRow>,
}

/// Everything one pass writes. Persisted atomically or not at all.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaseBatch {
    pub cases: Vec<CaseRow>,
    pub analyses: Vec<AnalysisRow>,
    pub counts: Vec<CountRow>,
}

impl CaseBatch {
    /// Add one case with its two analysis records and one count record,
    /// all with empty payloads.
    pub fn push_assignment(&mut self, a: &Assignment, now: DateTime<FixedOffset>) {
        let ts = now.to_rfc3339();
        let case_id = a.case_id.as_str().to_string();

        self.cases.push(CaseRow {
            id: new_record_id(),
            case_id: case_id.clone(),
            finished: false,
            create_time: ts.clone(),
            update_time: ts.clone(),
        });
        for (worker, is_main) in [(&a.primary, true), (&a.secondary, false)] {
            self.analyses.push(AnalysisRow {
                id: new_record_id(),
                case_id: case_id.clone(),
                user_id: worker.user_id.clone(),
                user_name: worker.user_name.clone(),
                is_main,
                analysis: Vec::new(),
                karyotype: None,
                create_time: ts.clone(),
                update_time: ts.clone(),
            });
        }
        self.counts.push(CountRow {
            id: new_record_id(),
            case_id,
            user_id: a.counter.user_id.clone(),
            user_name: a.counter.user_name.clone(),
            count: Vec::new(),
            extra: Vec::new(),
            remark: None,
            create_time: ts.clone(),
            update_time: ts,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }
}
