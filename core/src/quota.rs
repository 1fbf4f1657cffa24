//! Quota Table Builder: turns persisted groups and divisions into the
//! ordered rotation tables the allocator walks.
//!
//! RULES:
//!   - Rebuilt from storage on every pass, never cached across passes.
//!   - Analysis groups and counters are ordered by group name; the sort is
//!     stable, so equal names keep their storage order.
//!   - An analysis group must hold exactly two distinct workers per case type.
//!     Groups that don't are reported as defects and block allocation for
//!     that case type; they never reach the allocator as ad hoc shapes.

use crate::{
    error::AllocationError,
    types::{CaseType, RecordId, UserId, WorkType},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One persisted quota assignment of a worker to a group for a case type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Division {
    pub id: RecordId,
    pub group_id: RecordId,
    pub user_id: UserId,
    pub user_name: Option<String>,
    pub quantities: u32,
    pub case_type: CaseType,
}

/// A named group with all of its divisions, as loaded from storage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Group {
    pub group_id: RecordId,
    pub group_name: String,
    pub work_type: WorkType,
    pub divisions: Vec<Division>,
}

/// A worker and its rotation weight for one (group, case type).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkerQuota {
    pub user_id: UserId,
    pub user_name: Option<String>,
    pub quota: u32,
}

impl WorkerQuota {
    fn from_division(d: &Division) -> Self {
        Self {
            user_id: d.user_id.clone(),
            user_name: d.user_name.clone(),
            quota: d.quantities,
        }
    }
}

/// An analysis pair. The first worker is the one listed first in storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisGroupSlot {
    group_name: String,
    pair: [WorkerQuota; 2],
}

impl AnalysisGroupSlot {
    pub fn new(
        group_name: impl Into<String>,
        case_type: CaseType,
        members: Vec<WorkerQuota>,
    ) -> Result<Self, AllocationError> {
        let group_name = group_name.into();
        let count = members.len();
        let pair: [WorkerQuota; 2] =
            members
                .try_into()
                .map_err(|_| AllocationError::MalformedGroup {
                    group_name: group_name.clone(),
                    case_type,
                    members: count,
                })?;
        if pair[0].user_id == pair[1].user_id {
            return Err(AllocationError::DuplicateMember {
                group_name,
                case_type,
                user_id: pair[0].user_id.clone(),
            });
        }
        Ok(Self { group_name, pair })
    }

    pub fn group_name(&self) -> &str {
        &self.group_name
    }

    pub fn first(&self) -> &WorkerQuota {
        &self.pair[0]
    }

    pub fn second(&self) -> &WorkerQuota {
        &self.pair[1]
    }

    /// Combined weight of the pair.
    pub fn quota(&self) -> u64 {
        u64::from(self.pair[0].quota) + u64::from(self.pair[1].quota)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterSlot {
    pub group_name: String,
    pub worker: WorkerQuota,
}

/// Rotation tables for a single case type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaseTypeQuotas {
    analysis_groups: Vec<AnalysisGroupSlot>,
    counters: Vec<CounterSlot>,
    defects: Vec<AllocationError>,
}

impl CaseTypeQuotas {
    pub fn analysis_groups(&self) -> &[AnalysisGroupSlot] {
        &self.analysis_groups
    }

    pub fn counters(&self) -> &[CounterSlot] {
        &self.counters
    }

    pub fn defects(&self) -> &[AllocationError] {
        &self.defects
    }

    pub fn total_analysis_quota(&self) -> u64 {
        self.analysis_groups.iter().map(AnalysisGroupSlot::quota).sum()
    }

    pub fn total_count_quota(&self) -> u64 {
        self.counters.iter().map(|c| u64::from(c.worker.quota)).sum()
    }

    /// The first defect that makes this case type unallocatable, if any.
    pub fn blocking_defect(&self) -> Option<&AllocationError> {
        self.defects
            .iter()
            .find(|d| {
                matches!(
                    d,
                    AllocationError::MalformedGroup { .. } | AllocationError::DuplicateMember { .. }
                )
            })
    }
}

/// Per-case-type rotation tables for one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuotaTable {
    by_type: BTreeMap<CaseType, CaseTypeQuotas>,
}

// Analysis members collected before pair validation.
struct PendingGroup<'a> {
    group_id: &'a str,
    group_name: &'a str,
    members: Vec<WorkerQuota>,
}

impl QuotaTable {
    /// Build the table from storage state. Does not mutate its input.
    pub fn build(groups: &[Group]) -> Self {
        let mut by_type: BTreeMap<CaseType, CaseTypeQuotas> = BTreeMap::new();
        let mut pending: BTreeMap<CaseType, Vec<PendingGroup<'_>>> = BTreeMap::new();

        for group in groups {
            match group.work_type {
                WorkType::Count => {
                    let mut group_totals: BTreeMap<CaseType, u64> = BTreeMap::new();
                    for d in &group.divisions {
                        *group_totals.entry(d.case_type).or_default() += u64::from(d.quantities);
                        by_type.entry(d.case_type).or_default().counters.push(CounterSlot {
                            group_name: group.group_name.clone(),
                            worker: WorkerQuota::from_division(d),
                        });
                    }
                    for (case_type, total) in group_totals {
                        if total == 0 {
                            by_type.entry(case_type).or_default().defects.push(
                                AllocationError::ZeroQuotaGroup {
                                    group_name: group.group_name.clone(),
                                    case_type,
                                },
                            );
                        }
                    }
                }
                WorkType::Analysis => {
                    for d in &group.divisions {
                        let slots = pending.entry(d.case_type).or_default();
                        match slots.iter_mut().find(|p| p.group_id == group.group_id) {
                            Some(p) => p.members.push(WorkerQuota::from_division(d)),
                            None => slots.push(PendingGroup {
                                group_id: &group.group_id,
                                group_name: &group.group_name,
                                members: vec![WorkerQuota::from_division(d)],
                            }),
                        }
                    }
                }
            }
        }

        for (case_type, slots) in pending {
            let quotas = by_type.entry(case_type).or_default();
            for p in slots {
                match AnalysisGroupSlot::new(p.group_name, case_type, p.members) {
                    Ok(slot) => quotas.analysis_groups.push(slot),
                    Err(e) => quotas.defects.push(e),
                }
            }
        }

        for (case_type, quotas) in &mut by_type {
            quotas
                .analysis_groups
                .sort_by(|a, b| a.group_name.cmp(&b.group_name));
            quotas
                .counters
                .sort_by(|a, b| a.group_name.cmp(&b.group_name));
            for defect in &quotas.defects {
                log::warn!("quota table for case type {case_type}: {defect}");
            }
        }

        Self { by_type }
    }

    pub fn for_case_type(&self, case_type: CaseType) -> Option<&CaseTypeQuotas> {
        self.by_type.get(&case_type)
    }

    /// Every defect found while building, across all case types.
    pub fn defects(&self) -> impl Iterator<Item = &AllocationError> {
        self.by_type.values().flat_map(|q| q.defects.iter())
    }
}
