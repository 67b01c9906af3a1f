//! Clinic calendar policy and closed-day administration.

use std::sync::Arc;

use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use clinic_store::DocumentId;
use clinic_types::{Branch, BranchScope};

use crate::records::{ClosedDay, ClosedSpan};
use crate::{ClinicDb, ClinicResult};

/// Decides whether a calendar date is a working day for a branch.
///
/// Built from a snapshot of the closed-day entries; pure once constructed.
/// A date is closed when it is a Sunday, or when any entry scoped to `All`
/// or to the branch covers it (calendar-day granularity, inclusive ranges).
#[derive(Debug, Clone)]
pub struct CalendarPolicy {
    entries: Vec<ClosedDay>,
}

impl CalendarPolicy {
    pub fn new(entries: Vec<ClosedDay>) -> Self {
        Self { entries }
    }

    /// Snapshots the current closed-day collection.
    pub fn load(db: &ClinicDb) -> ClinicResult<Self> {
        let entries = db
            .closed_days
            .all()?
            .into_iter()
            .map(|(_, entry)| entry)
            .collect();
        Ok(Self::new(entries))
    }

    pub fn is_closed(&self, day: NaiveDate, branch: Branch) -> bool {
        if day.weekday() == Weekday::Sun {
            return true;
        }
        self.entries
            .iter()
            .any(|entry| entry.branch.covers(branch) && entry.span.contains(day))
    }
}

/// Nurse-admin operations on the closed-day collection.
pub struct ClosedDayCalendar {
    db: Arc<ClinicDb>,
}

impl ClosedDayCalendar {
    pub fn new(db: Arc<ClinicDb>) -> Self {
        Self { db }
    }

    /// All entries, most recent start date first.
    pub fn list(&self) -> ClinicResult<Vec<(DocumentId, ClosedDay)>> {
        let mut entries = self.db.closed_days.all()?;
        entries.sort_by(|(_, a), (_, b)| b.span.starts_on().cmp(&a.span.starts_on()));
        Ok(entries)
    }

    pub fn add(
        &self,
        span: ClosedSpan,
        branch: BranchScope,
        reason: String,
        now: DateTime<Utc>,
    ) -> ClinicResult<DocumentId> {
        let id = self.db.closed_days.insert(ClosedDay {
            span,
            branch,
            reason,
            created_at: now,
        })?;
        Ok(id)
    }

    /// Removes an entry; returns `false` when the id was already gone.
    pub fn remove(&self, id: DocumentId) -> ClinicResult<bool> {
        Ok(self.db.closed_days.remove(id)?)
    }
}
