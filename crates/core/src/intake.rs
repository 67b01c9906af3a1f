//! Manual visit booking.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use clinic_types::{Branch, PaymentState, VisitNo};
use serde::Deserialize;

use crate::records::{AppointmentEntry, PatientRecord, PaymentRecord};
use crate::{ClinicDb, ClinicResult};

/// A walk-in or phone booking taken by a nurse.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub branch: String,
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
    pub date: NaiveDate,
    #[serde(default)]
    pub time: Option<String>,
}

/// Creates patient records with freshly allocated visit numbers.
pub struct IntakeService {
    db: Arc<ClinicDb>,
}

impl IntakeService {
    pub fn new(db: Arc<ClinicDb>) -> Self {
        Self { db }
    }

    /// Allocates the next visit number for a branch.
    ///
    /// The highest stored identifier (plain string ordering, which equals
    /// numeric ordering for well-formed zero-padded identifiers) is parsed
    /// and incremented; when there is none, or it does not match the
    /// expected shape, numbering restarts at `D-00000001`.
    pub fn next_visit_no(&self, branch: Branch) -> ClinicResult<VisitNo> {
        let highest = self
            .db
            .patients(branch)
            .all()?
            .into_iter()
            .filter_map(|(_, p)| p.visit_no)
            .max();
        Ok(VisitNo::next_after(highest.as_deref()))
    }

    /// Books a visit: inserts the patient record with its first appointment
    /// and the matching payment record, both as cash.
    pub fn book_visit(&self, booking: BookingRequest, now: DateTime<Utc>) -> ClinicResult<VisitNo> {
        let branch = Branch::parse(&booking.branch)?;
        let visit_no = self.next_visit_no(branch)?;
        let clinic = format!("{} Clinic", branch.name());

        self.db.patients(branch).insert(PatientRecord {
            visit_no: Some(visit_no.to_string()),
            name: booking.name,
            age: booking.age,
            gender: booking.gender,
            contact: booking.contact,
            medical_conditions: booking.medical_conditions,
            allergy: booking.allergy,
            family_history: booking.family_history,
            appointments: vec![AppointmentEntry {
                clinic: clinic.clone(),
                location: branch.name().to_owned(),
                date: booking.date,
                time: booking.time.clone(),
                payment: PaymentState::Cash,
            }],
            created_at: now,
        })?;

        self.db.payments.insert(PaymentRecord {
            visit_no: visit_no.to_string(),
            clinic: Some(clinic),
            location: Some(branch.name().to_owned()),
            date: Some(booking.date),
            time: booking.time,
            payment: PaymentState::Cash,
            created_at: now,
        })?;

        Ok(visit_no)
    }
}
