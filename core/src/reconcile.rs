//! Reconciliation Driver: one pass of scan → diff → allocate → persist.
//!
//! PASS ORDER (fixed):
//!   1. List the source location and derive candidate identifiers.
//!   2. Load the known case identifiers from storage.
//!   3. new = candidates − known, well-formed and of an enabled case type.
//!   4. Build the QuotaTable from current group/division state.
//!   5. Allocate each new case independently.
//!   6. Successful cases go into one batch; failed cases are reported and
//!      left out, so they stay "new" and are retried next pass.
//!   7. Persist the batch in one write. An empty batch writes nothing.
//!
//! A listing or storage failure abandons the pass with nothing written.

use crate::{
    allocation::allocate,
    clock::{Clock, SystemClock},
    config::ChromoConfig,
    error::{AllocationError, ChromoResult},
    quota::{Group, QuotaTable},
    scanner::{new_cases, EntrySource, Scanner},
    store::{CaseBatch, CaseStore},
    types::CaseType,
};
use std::collections::BTreeSet;

/// The storage operations a pass needs.
pub trait CaseRepository: Send {
    fn list_known_case_ids(&self) -> ChromoResult<BTreeSet<String>>;

    fn list_groups_and_quotas(&self) -> ChromoResult<Vec<Group>>;

    /// Must be atomic: either every row of the batch is written or none is.
    fn insert_case_batch(&mut self, batch: &CaseBatch) -> ChromoResult<()>;
}

impl CaseRepository for CaseStore {
    fn list_known_case_ids(&self) -> ChromoResult<BTreeSet<String>> {
        self.known_case_ids()
    }

    fn list_groups_and_quotas(&self) -> ChromoResult<Vec<Group>> {
        self.groups_with_divisions()
    }

    fn insert_case_batch(&mut self, batch: &CaseBatch) -> ChromoResult<()> {
        CaseStore::insert_case_batch(self, batch)
    }
}

/// A case that could not be allocated this pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseFailure {
    pub case_id: String,
    pub error: AllocationError,
}

/// What one pass did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PassReport {
    pub scanned_path: String,
    /// Distinct candidate identifiers in the listing.
    pub discovered: usize,
    /// Candidates that were unknown, well-formed and enabled.
    pub new_cases: usize,
    pub inserted: Vec<String>,
    pub failures: Vec<CaseFailure>,
}

pub struct Reconciler<R: CaseRepository, S: EntrySource> {
    repo: R,
    scanner: Scanner<S>,
    clock: Box<dyn Clock>,
    case_types: Vec<CaseType>,
}

impl<R: CaseRepository, S: EntrySource> Reconciler<R, S> {
    pub fn new(repo: R, scanner: Scanner<S>, clock: Box<dyn Clock>, case_types: Vec<CaseType>) -> Self {
        Self {
            repo,
            scanner,
            clock,
            case_types,
        }
    }

    /// Wire a reconciler from configuration, using the system clock.
    pub fn from_config(repo: R, source: S, config: &ChromoConfig) -> Self {
        Self::new(
            repo,
            Scanner::from_config(source, config),
            Box::new(SystemClock::with_offset_hours(config.utc_offset_hours)),
            config.case_types.clone(),
        )
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Run one pass and return what it did.
    pub fn run_pass(&mut self) -> ChromoResult<PassReport> {
        let scanned_path = self.scanner.scan_path(self.clock.as_ref());
        let candidates = self.scanner.candidates(self.clock.as_ref())?;
        let known = self.repo.list_known_case_ids()?;
        let fresh = new_cases(&candidates, &known, &self.case_types);

        let table = QuotaTable::build(&self.repo.list_groups_and_quotas()?);
        let now = self.clock.now();

        let mut batch = CaseBatch::default();
        let mut inserted = Vec::new();
        let mut failures = Vec::new();
        for case_id in &fresh {
            match allocate(case_id, &table) {
                Ok(assignment) => {
                    log::debug!(
                        "case {case_id}: primary={} secondary={} counter={}",
                        assignment.primary.user_id,
                        assignment.secondary.user_id,
                        assignment.counter.user_id
                    );
                    batch.push_assignment(&assignment, now);
                    inserted.push(case_id.to_string());
                }
                Err(error) => {
                    log::error!("case {case_id} skipped: {error}");
                    failures.push(CaseFailure {
                        case_id: case_id.to_string(),
                        error,
                    });
                }
            }
        }

        if !batch.is_empty() {
            self.repo.insert_case_batch(&batch)?;
        }

        let report = PassReport {
            scanned_path: scanned_path.display().to_string(),
            discovered: candidates.len(),
            new_cases: fresh.len(),
            inserted,
            failures,
        };
        log::info!(
            "reconcile {}: discovered={} new={} inserted={} failed={}",
            report.scanned_path,
            report.discovered,
            report.new_cases,
            report.inserted.len(),
            report.failures.len()
        );
        Ok(report)
    }

    /// Scheduler entry point: run a pass, log the outcome, report success.
    pub fn reconcile(&mut self) -> bool {
        match self.run_pass() {
            Ok(_) => true,
            Err(e) => {
                log::error!("reconcile pass abandoned: {e}");
                false
            }
        }
    }
}
