//! Day-sheet listing for the nurse dashboard.

use std::sync::Arc;

use chrono::NaiveDate;
use clinic_store::DocumentId;
use clinic_types::Branch;
use serde::Serialize;

use crate::payments::PaymentLedger;
use crate::records::PatientRecord;
use crate::{ClinicDb, ClinicResult};

/// One row of the day sheet, ready for display.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentRow {
    pub id: DocumentId,
    pub visit_no: String,
    pub name: String,
    pub contact: String,
    pub time: String,
    pub payment: String,
}

/// A page of the day sheet; `total` counts all matches before pagination.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentPage {
    pub total: usize,
    pub appointments: Vec<AppointmentRow>,
}

/// Builds the per-date appointment listing with resolved payment status.
pub struct AppointmentDesk {
    db: Arc<ClinicDb>,
    ledger: PaymentLedger,
}

impl AppointmentDesk {
    pub fn new(db: Arc<ClinicDb>) -> Self {
        let ledger = PaymentLedger::new(db.clone());
        Self { db, ledger }
    }

    /// Lists every visit with an appointment on `date` in the branch.
    ///
    /// Pagination skips `(page - 1) * page_size` records; pages are
    /// one-based and a page below 1 is treated as the first. Payment
    /// resolution runs per row and a failure there degrades only that row's
    /// status text, never the listing.
    pub fn list(
        &self,
        branch: Branch,
        date: NaiveDate,
        page: usize,
        page_size: usize,
    ) -> ClinicResult<AppointmentPage> {
        let matches = self
            .db
            .patients(branch)
            .select(|p| p.appointments.iter().any(|a| a.date == date))?;
        let total = matches.len();

        let appointments = matches
            .into_iter()
            .skip(page.saturating_sub(1).saturating_mul(page_size))
            .take(page_size)
            .map(|(id, record)| self.row(id, record, date))
            .collect();

        Ok(AppointmentPage {
            total,
            appointments,
        })
    }

    fn row(&self, id: DocumentId, record: PatientRecord, date: NaiveDate) -> AppointmentRow {
        // When several entries share the date, the first in storage order is
        // the one shown.
        let entry = record.appointments.iter().find(|a| a.date == date);
        let time = entry.and_then(|a| a.time.clone());

        let payment = self.ledger.resolve(
            record.visit_no.as_deref(),
            date,
            entry.and_then(|a| a.time.as_deref()),
        );

        AppointmentRow {
            id,
            visit_no: record.visit_no.unwrap_or_else(|| "N/A".into()),
            name: record.name.unwrap_or_else(|| "Unknown".into()),
            contact: record.contact.unwrap_or_else(|| "N/A".into()),
            time: time.unwrap_or_else(|| "N/A".into()),
            payment: payment.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::AppointmentEntry;
    use chrono::{DateTime, Utc};
    use clinic_types::PaymentState;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Arc<ClinicDb>) {
        let temp = TempDir::new().expect("temp dir");
        let store = clinic_store::Store::open(temp.path()).expect("store");
        let db = Arc::new(ClinicDb::open(&store).expect("db"));
        (temp, db)
    }

    fn ts() -> DateTime<Utc> {
        "2025-09-01T09:00:00Z".parse().expect("valid timestamp")
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn entry(day: NaiveDate, time: &str) -> AppointmentEntry {
        AppointmentEntry {
            clinic: "Malad Clinic".into(),
            location: "Malad".into(),
            date: day,
            time: Some(time.into()),
            payment: PaymentState::Cash,
        }
    }

    fn patient(visit_no: Option<&str>, name: Option<&str>, entries: Vec<AppointmentEntry>) -> PatientRecord {
        PatientRecord {
            visit_no: visit_no.map(str::to_owned),
            name: name.map(str::to_owned),
            age: None,
            gender: None,
            contact: None,
            medical_conditions: None,
            allergy: None,
            family_history: None,
            appointments: entries,
            created_at: ts(),
        }
    }

    #[test]
    fn test_lists_only_visits_on_the_date() {
        let (_temp, db) = setup();
        let day = date(2025, 9, 30);
        let other_day = date(2025, 10, 1);

        db.patients(Branch::Malad)
            .insert(patient(
                Some("D-00000001"),
                Some("Asha Rao"),
                vec![entry(day, "10:00")],
            ))
            .expect("insert");
        db.patients(Branch::Malad)
            .insert(patient(
                Some("D-00000002"),
                Some("Vikram Shah"),
                vec![entry(other_day, "11:00")],
            ))
            .expect("insert");

        let desk = AppointmentDesk::new(db);
        let page = desk.list(Branch::Malad, day, 1, 10).expect("list");
        assert_eq!(page.total, 1);
        assert_eq!(page.appointments.len(), 1);
        assert_eq!(page.appointments[0].visit_no, "D-00000001");
        assert_eq!(page.appointments[0].time, "10:00");
    }

    #[test]
    fn test_pagination_reports_unpaginated_total() {
        let (_temp, db) = setup();
        let day = date(2025, 9, 30);

        for i in 0..5 {
            db.patients(Branch::Borivali)
                .insert(patient(
                    Some(&format!("D-0000000{}", i + 1)),
                    Some("Patient"),
                    vec![entry(day, "09:00")],
                ))
                .expect("insert");
        }

        let desk = AppointmentDesk::new(db);
        let page = desk.list(Branch::Borivali, day, 2, 2).expect("list");
        assert_eq!(page.total, 5);
        assert_eq!(page.appointments.len(), 2);
        assert_eq!(page.appointments[0].visit_no, "D-00000003");
        assert_eq!(page.appointments[1].visit_no, "D-00000004");

        // Past the end: empty page, same total.
        let page = desk.list(Branch::Borivali, day, 4, 2).expect("list");
        assert_eq!(page.total, 5);
        assert!(page.appointments.is_empty());
    }

    #[test]
    fn test_first_entry_wins_when_dates_repeat() {
        let (_temp, db) = setup();
        let day = date(2025, 9, 30);

        db.patients(Branch::Malad)
            .insert(patient(
                Some("D-00000001"),
                Some("Asha Rao"),
                vec![entry(day, "09:00"), entry(day, "15:00")],
            ))
            .expect("insert");

        let desk = AppointmentDesk::new(db);
        let page = desk.list(Branch::Malad, day, 1, 10).expect("list");
        assert_eq!(page.appointments[0].time, "09:00");
    }

    #[test]
    fn test_missing_fields_default_to_placeholders() {
        let (_temp, db) = setup();
        let day = date(2025, 9, 30);

        let mut record = patient(None, None, vec![entry(day, "10:00")]);
        record.appointments[0].time = None;
        db.patients(Branch::Bhayander)
            .insert(record)
            .expect("insert");

        let desk = AppointmentDesk::new(db);
        let page = desk.list(Branch::Bhayander, day, 1, 10).expect("list");
        let row = &page.appointments[0];
        assert_eq!(row.visit_no, "N/A");
        assert_eq!(row.name, "Unknown");
        assert_eq!(row.contact, "N/A");
        assert_eq!(row.time, "N/A");
        // No visit number short-circuits payment resolution.
        assert_eq!(row.payment, "No visit number");
    }

    #[test]
    fn test_rows_carry_resolved_payment_status() {
        let (_temp, db) = setup();
        let day = date(2025, 9, 30);

        db.patients(Branch::Malad)
            .insert(patient(
                Some("D-00000001"),
                Some("Asha Rao"),
                vec![entry(day, "10:00")],
            ))
            .expect("insert");
        db.payments
            .insert(crate::records::PaymentRecord {
                visit_no: "D-00000001".into(),
                clinic: None,
                location: None,
                date: Some(day),
                time: Some("10:00".into()),
                payment: PaymentState::Upi,
                created_at: ts(),
            })
            .expect("insert");

        // A second visit with no payment record at all.
        db.patients(Branch::Malad)
            .insert(patient(
                Some("D-00000002"),
                Some("Vikram Shah"),
                vec![entry(day, "11:00")],
            ))
            .expect("insert");

        let desk = AppointmentDesk::new(db);
        let page = desk.list(Branch::Malad, day, 1, 10).expect("list");
        assert_eq!(page.appointments[0].payment, "upi");
        assert_eq!(page.appointments[1].payment, "Payment not recorded");
    }
}
