//! Cross-branch patient lookups for the doctor dashboard.

use std::collections::BTreeMap;
use std::sync::Arc;

use clinic_types::Branch;
use serde::Serialize;

use crate::records::PatientRecord;
use crate::{ClinicDb, ClinicResult};

/// One visit found by a name search, tagged with its branch.
#[derive(Debug, Clone, Serialize)]
pub struct VisitAtBranch {
    #[serde(flatten)]
    pub record: PatientRecord,
    pub location: String,
}

/// All visits for one patient name, across branches.
#[derive(Debug, Clone, Serialize)]
pub struct PatientMatch {
    pub name: String,
    pub locations: Vec<String>,
    pub visits: Vec<VisitAtBranch>,
}

/// Patient counts per branch.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchCounts {
    pub total: usize,
    pub per_branch: BTreeMap<String, usize>,
}

pub struct PatientIndex {
    db: Arc<ClinicDb>,
}

impl PatientIndex {
    pub fn new(db: Arc<ClinicDb>) -> Self {
        Self { db }
    }

    /// Case-insensitive substring search on patient name across all three
    /// branch collections, grouped by the exact stored name.
    pub fn search(&self, name: &str) -> ClinicResult<Vec<PatientMatch>> {
        let needle = name.to_lowercase();
        let mut matches: Vec<PatientMatch> = Vec::new();

        for branch in Branch::ALL {
            let hits = self.db.patients(branch).select(|p| {
                p.name
                    .as_deref()
                    .is_some_and(|n| n.to_lowercase().contains(&needle))
            })?;

            for (_, record) in hits {
                let Some(display) = record.name.clone() else {
                    continue;
                };
                let location = branch.name().to_owned();

                let index = match matches.iter().position(|m| m.name == display) {
                    Some(index) => index,
                    None => {
                        matches.push(PatientMatch {
                            name: display,
                            locations: Vec::new(),
                            visits: Vec::new(),
                        });
                        matches.len() - 1
                    }
                };
                let group = &mut matches[index];
                if !group.locations.contains(&location) {
                    group.locations.push(location.clone());
                }
                group.visits.push(VisitAtBranch { record, location });
            }
        }

        Ok(matches)
    }

    /// Patient count for one branch.
    pub fn count(&self, branch: Branch) -> ClinicResult<usize> {
        Ok(self.db.patients(branch).len()?)
    }

    /// Total and per-branch patient counts.
    pub fn counts(&self) -> ClinicResult<BranchCounts> {
        let mut per_branch = BTreeMap::new();
        let mut total = 0;
        for branch in Branch::ALL {
            let count = self.count(branch)?;
            per_branch.insert(branch.name().to_owned(), count);
            total += count;
        }
        Ok(BranchCounts { total, per_branch })
    }
}
