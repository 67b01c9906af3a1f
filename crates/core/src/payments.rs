//! Payment reconciliation.
//!
//! A visit can carry several payment records: a provisional `pending`
//! placeholder written at booking, and later records written when the actual
//! payment method becomes known. The placeholder is never mutated, so
//! resolution has to decide which record is authoritative.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use clinic_store::StoreResult;
use clinic_types::PaymentState;
use serde::Serialize;

use crate::records::PaymentRecord;
use crate::{ClinicDb, ClinicError, ClinicResult};

/// The display status a payment lookup resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    /// A non-pending record was found; its state is the status.
    Settled(PaymentState),
    /// The authoritative record is still the booking placeholder.
    Pending,
    /// No record exists for the visit.
    NoRecord,
    /// The visit itself has no identifier to look up.
    NoVisitNumber,
    /// The lookup failed; distinct from "no record" so operators can tell
    /// data-quality problems from transient failures.
    LookupFailed,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentStatus::Settled(state) => f.write_str(state.as_str()),
            PaymentStatus::Pending => f.write_str("Payment pending"),
            PaymentStatus::NoRecord => f.write_str("Payment not recorded"),
            PaymentStatus::NoVisitNumber => f.write_str("No visit number"),
            PaymentStatus::LookupFailed => f.write_str("Payment lookup failed"),
        }
    }
}

/// Result of removing stale pending duplicates.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupSummary {
    pub removed_pending_records: usize,
    pub duplicate_groups: usize,
}

/// Lookup and mutation of payment records.
pub struct PaymentLedger {
    db: Arc<ClinicDb>,
}

impl PaymentLedger {
    pub fn new(db: Arc<ClinicDb>) -> Self {
        Self { db }
    }

    /// Resolves the display status for one appointment.
    ///
    /// Tiered lookup, each tier only consulted when the previous found
    /// nothing:
    ///
    /// 1. exact `(visit_no, date, time)` match, oldest first;
    /// 2. most recent non-pending record for the visit;
    /// 3. most recent record for the visit, any state.
    ///
    /// The state of whichever record the tiers produce is taken as-is. An
    /// exact match on a still-pending placeholder therefore reports
    /// "Payment pending" even when a newer non-pending record exists under
    /// the same visit number without matching date/time.
    ///
    /// Lookup failures are swallowed into [`PaymentStatus::LookupFailed`] so
    /// one bad record cannot take down a whole listing.
    pub fn resolve(
        &self,
        visit_no: Option<&str>,
        date: NaiveDate,
        time: Option<&str>,
    ) -> PaymentStatus {
        let Some(visit_no) = visit_no else {
            return PaymentStatus::NoVisitNumber;
        };

        match self.tiered_lookup(visit_no, date, time) {
            Ok(Some(record)) => {
                if record.payment.is_pending() {
                    PaymentStatus::Pending
                } else {
                    PaymentStatus::Settled(record.payment)
                }
            }
            Ok(None) => PaymentStatus::NoRecord,
            Err(e) => {
                tracing::warn!(visit_no, error = %e, "payment lookup failed");
                PaymentStatus::LookupFailed
            }
        }
    }

    fn tiered_lookup(
        &self,
        visit_no: &str,
        date: NaiveDate,
        time: Option<&str>,
    ) -> StoreResult<Option<PaymentRecord>> {
        // Preferred: the record written for this exact appointment.
        if let Some((_, record)) = self.db.payments.find(|r| {
            r.visit_no == visit_no && r.date == Some(date) && r.time.as_deref() == time
        })? {
            return Ok(Some(record));
        }

        // Next: the most recent non-pending evidence for the visit.
        if let Some((_, record)) = self
            .db
            .payments
            .find_latest(|r| r.visit_no == visit_no && !r.payment.is_pending())?
        {
            return Ok(Some(record));
        }

        // Last resort: whatever was recorded most recently.
        Ok(self
            .db
            .payments
            .find_latest(|r| r.visit_no == visit_no)?
            .map(|(_, record)| record))
    }

    /// Marks a visit's payment as cash, collected or not.
    ///
    /// The exact `(visit_no, date, time)` record is updated when one exists;
    /// otherwise the first record for the visit alone is updated, covering
    /// stored records with coarser date/time granularity. Fails with
    /// [`ClinicError::PaymentNotFound`] when neither matched.
    pub fn mark_cash_collection(
        &self,
        visit_no: &str,
        date: Option<NaiveDate>,
        time: Option<&str>,
        collected: bool,
    ) -> ClinicResult<PaymentState> {
        let target = if collected {
            PaymentState::CashCollected
        } else {
            PaymentState::Cash
        };

        let exact = self.db.payments.find(|r| {
            r.visit_no == visit_no && r.date == date && r.time.as_deref() == time
        })?;
        let hit = match exact {
            Some(hit) => Some(hit),
            None => self.db.payments.find(|r| r.visit_no == visit_no)?,
        };

        match hit {
            Some((id, _)) => {
                self.db.payments.modify(id, |r| r.payment = target)?;
                Ok(target)
            }
            None => Err(ClinicError::PaymentNotFound),
        }
    }

    /// Removes stale `pending` placeholders.
    ///
    /// For every visit number carrying more than one record, the pending
    /// ones are deleted once at least one non-pending record exists.
    pub fn cleanup_stale_pending(&self) -> ClinicResult<CleanupSummary> {
        let mut groups: HashMap<String, Vec<(clinic_store::DocumentId, PaymentState)>> =
            HashMap::new();
        for (id, record) in self.db.payments.all()? {
            groups
                .entry(record.visit_no)
                .or_default()
                .push((id, record.payment));
        }

        let mut removed = 0;
        let mut duplicate_groups = 0;
        for records in groups.values() {
            if records.len() < 2 {
                continue;
            }
            duplicate_groups += 1;

            let has_pending = records.iter().any(|(_, p)| p.is_pending());
            let has_settled = records.iter().any(|(_, p)| !p.is_pending());
            if !(has_pending && has_settled) {
                continue;
            }

            for (id, payment) in records {
                if payment.is_pending() && self.db.payments.remove(*id)? {
                    removed += 1;
                }
            }
        }

        Ok(CleanupSummary {
            removed_pending_records: removed,
            duplicate_groups,
        })
    }
}
