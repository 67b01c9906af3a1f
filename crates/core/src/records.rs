//! Stored document shapes.
//!
//! These structs are the on-disk schema of the clinic's collections. Field
//! names serialize in camelCase to match the wire format the dashboard
//! already speaks (`visitNo`, `dateFrom`, `remindAt`, ...).
//!
//! Patient records are treated as data as-found: almost every field is
//! optional, and the visit number is kept as a raw string so that a
//! malformed identifier in an old record is displayed rather than dropped.
//! Validated identifiers ([`clinic_types::VisitNo`]) are only minted at
//! intake time.

use chrono::{DateTime, NaiveDate, Utc};
use clinic_types::{BranchScope, NonEmptyText, PaymentState};
use serde::{Deserialize, Serialize};

use crate::reminders::DispatchOutcome;

/// One appointment inside a patient record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentEntry {
    pub clinic: String,
    pub location: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub time: Option<String>,
    pub payment: PaymentState,
}

/// A patient's record in a branch collection, accumulated over their
/// lifetime: demographics plus every appointment ever booked.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientRecord {
    #[serde(default)]
    pub visit_no: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub age: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(default)]
    pub medical_conditions: Option<String>,
    #[serde(default)]
    pub allergy: Option<String>,
    #[serde(default)]
    pub family_history: Option<String>,
    #[serde(default)]
    pub appointments: Vec<AppointmentEntry>,
    pub created_at: DateTime<Utc>,
}

/// A record of money owed or collected for a visit.
///
/// A visit may accumulate several of these: a provisional `pending` record
/// at booking and a later authoritative one once the payment method is
/// known. Resolution order lives in [`crate::payments`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    pub visit_no: String,
    #[serde(default)]
    pub clinic: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub time: Option<String>,
    pub payment: PaymentState,
    pub created_at: DateTime<Utc>,
}

/// The day(s) a closed-day entry covers: a single date or an inclusive range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClosedSpan {
    #[serde(rename_all = "camelCase")]
    Range {
        date_from: NaiveDate,
        date_to: NaiveDate,
    },
    Single { date: NaiveDate },
}

impl ClosedSpan {
    /// Whether `day` falls within the span (inclusive on both ends).
    pub fn contains(&self, day: NaiveDate) -> bool {
        match self {
            ClosedSpan::Range { date_from, date_to } => *date_from <= day && day <= *date_to,
            ClosedSpan::Single { date } => *date == day,
        }
    }

    /// The first calendar day of the span, used for ordering listings.
    pub fn starts_on(&self) -> NaiveDate {
        match self {
            ClosedSpan::Range { date_from, .. } => *date_from,
            ClosedSpan::Single { date } => *date,
        }
    }
}

/// A clinic non-operating period.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosedDay {
    #[serde(flatten)]
    pub span: ClosedSpan,
    pub branch: BranchScope,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

/// A scheduled reminder for a projected next appointment.
///
/// `sent_at` is set at most once; a follow-up is never reprocessed after it
/// has been stamped, whatever the outcome was.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Followup {
    pub visit_no: String,
    /// Branch code as captured at creation time. Kept as a raw string and
    /// resolved at dispatch time, so an unrecognised code becomes an
    /// `invalid-branch` outcome instead of a lost record.
    pub branch: String,
    pub next_appointment_date: NaiveDate,
    pub remind_at: DateTime<Utc>,
    #[serde(default)]
    pub contact: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub sent_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sent_result: Option<DispatchOutcome>,
    #[serde(default)]
    pub sent_detail: Option<serde_json::Value>,
}

/// Reference to a prescription image hosted externally.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionImage {
    pub visit_no: String,
    pub branch: String,
    pub url: String,
    pub uploaded_at: DateTime<Utc>,
}

/// Free-text note attached when prescription images are uploaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionNote {
    pub visit_no: String,
    pub branch: String,
    pub note: NonEmptyText,
    pub created_at: DateTime<Utc>,
}

/// Reference to a lab report document hosted externally.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabReport {
    pub visit_no: String,
    pub branch: String,
    pub url: String,
    pub uploaded_at: DateTime<Utc>,
}

/// At most one note per `(visit_no, branch)`, updated in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabReportNote {
    pub visit_no: String,
    pub branch: String,
    pub note: NonEmptyText,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closed_span_serde_shapes() {
        let single: ClosedSpan = serde_json::from_str(r#"{"date":"2025-10-02"}"#).unwrap();
        assert_eq!(
            single,
            ClosedSpan::Single {
                date: NaiveDate::from_ymd_opt(2025, 10, 2).unwrap()
            }
        );

        let range: ClosedSpan =
            serde_json::from_str(r#"{"dateFrom":"2025-10-02","dateTo":"2025-10-05"}"#).unwrap();
        assert!(matches!(range, ClosedSpan::Range { .. }));
    }

    #[test]
    fn test_closed_span_contains_is_inclusive() {
        let from = NaiveDate::from_ymd_opt(2025, 10, 2).unwrap();
        let to = NaiveDate::from_ymd_opt(2025, 10, 5).unwrap();
        let span = ClosedSpan::Range {
            date_from: from,
            date_to: to,
        };

        assert!(span.contains(from));
        assert!(span.contains(to));
        assert!(span.contains(NaiveDate::from_ymd_opt(2025, 10, 3).unwrap()));
        assert!(!span.contains(NaiveDate::from_ymd_opt(2025, 10, 6).unwrap()));
        assert!(!span.contains(NaiveDate::from_ymd_opt(2025, 10, 1).unwrap()));
    }

    #[test]
    fn test_patient_record_wire_names() {
        let json = r#"{
            "visitNo": "D-00000001",
            "name": "Asha Rao",
            "appointments": [
                {"clinic": "Malad Clinic", "location": "Malad",
                 "date": "2025-09-30", "time": "10:00", "payment": "cash"}
            ],
            "createdAt": "2025-09-01T09:00:00Z"
        }"#;
        let record: PatientRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.visit_no.as_deref(), Some("D-00000001"));
        assert_eq!(record.appointments.len(), 1);
        assert_eq!(record.appointments[0].payment, PaymentState::Cash);
        // Unset fields deserialize as absent rather than failing.
        assert!(record.contact.is_none());
    }
}
