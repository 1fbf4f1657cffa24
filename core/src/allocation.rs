//! Allocation Function: deterministic quota-weighted rotation.
//!
//! Given a case identifier and the pass's QuotaTable, picks the primary
//! analyst, the secondary analyst and the counter. Pure: same inputs,
//! same assignment, no side effects.
//!
//! Analysis rotation (1-indexed):
//!   cursor = analysis_seed mod total, with 0 mapped to total.
//!   Walk groups in name order, subtracting each group's quota while the
//!   cursor exceeds it. In the landing group the first worker is primary
//!   when cursor <= first.quota, otherwise the second worker is primary.
//!
//! Count rotation (0-indexed):
//!   cursor = count_seed mod total.
//!   Walk counters in name order; the first one with cursor < quota wins,
//!   otherwise subtract its quota and move on.
//!
//! The two rotations use different zero boundaries. Existing assignments
//! depend on both; do not unify them.

use crate::{
    error::AllocationError,
    quota::{CaseTypeQuotas, QuotaTable, WorkerQuota},
    types::{CaseId, WorkType},
};
use serde::{Deserialize, Serialize};

/// Who works on one case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub case_id: CaseId,
    pub primary: WorkerQuota,
    pub secondary: WorkerQuota,
    pub counter: WorkerQuota,
}

pub fn allocate(case_id: &CaseId, table: &QuotaTable) -> Result<Assignment, AllocationError> {
    let case_type = case_id.case_type();
    let quotas = table
        .for_case_type(case_type)
        .ok_or(AllocationError::NoQuota {
            case_type,
            work: WorkType::Analysis,
        })?;
    if let Some(defect) = quotas.blocking_defect() {
        return Err(defect.clone());
    }

    let (primary, secondary) = pick_analysts(case_id, quotas)?;
    let counter = pick_counter(case_id, quotas)?;

    Ok(Assignment {
        case_id: case_id.clone(),
        primary: primary.clone(),
        secondary: secondary.clone(),
        counter: counter.clone(),
    })
}

fn pick_analysts<'q>(
    case_id: &CaseId,
    quotas: &'q CaseTypeQuotas,
) -> Result<(&'q WorkerQuota, &'q WorkerQuota), AllocationError> {
    let case_type = case_id.case_type();
    if quotas.analysis_groups().is_empty() {
        return Err(AllocationError::NoQuota {
            case_type,
            work: WorkType::Analysis,
        });
    }
    let total = quotas.total_analysis_quota();
    if total == 0 {
        return Err(AllocationError::ZeroQuota {
            case_type,
            work: WorkType::Analysis,
        });
    }

    let mut cursor = match case_id.analysis_residue(total) {
        0 => total,
        r => r,
    };
    for group in quotas.analysis_groups() {
        if cursor > group.quota() {
            cursor -= group.quota();
            continue;
        }
        let pair = if cursor <= u64::from(group.first().quota) {
            (group.first(), group.second())
        } else {
            (group.second(), group.first())
        };
        return Ok(pair);
    }

    Err(AllocationError::Unassigned {
        case_id: case_id.to_string(),
        work: WorkType::Analysis,
    })
}

fn pick_counter<'q>(
    case_id: &CaseId,
    quotas: &'q CaseTypeQuotas,
) -> Result<&'q WorkerQuota, AllocationError> {
    let case_type = case_id.case_type();
    if quotas.counters().is_empty() {
        return Err(AllocationError::NoQuota {
            case_type,
            work: WorkType::Count,
        });
    }
    let total = quotas.total_count_quota();
    if total == 0 {
        return Err(AllocationError::ZeroQuota {
            case_type,
            work: WorkType::Count,
        });
    }

    let mut cursor = case_id.count_residue(total);
    for slot in quotas.counters() {
        let quota = u64::from(slot.worker.quota);
        if cursor < quota {
            return Ok(&slot.worker);
        }
        cursor -= quota;
    }

    Err(AllocationError::Unassigned {
        case_id: case_id.to_string(),
        work: WorkType::Count,
    })
}
