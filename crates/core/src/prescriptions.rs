//! Prescription image references and follow-up creation.
//!
//! Images themselves live on an external host; the clinic stores URL
//! references per visit. Recording a prescription is also the moment a next
//! appointment gets projected, so this service owns follow-up creation: the
//! target date either arrives explicitly or is computed from a month offset
//! through the calendar policy.

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use clinic_types::{Branch, NonEmptyText};
use serde::Deserialize;

use crate::calendar::CalendarPolicy;
use crate::records::{Followup, PrescriptionImage, PrescriptionNote};
use crate::schedule;
use crate::{ClinicDb, ClinicError, ClinicResult};

/// How many days before the target appointment the reminder fires.
const REMINDER_LEAD_DAYS: i64 = 7;

/// An upload of prescription image references for one visit.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageUpload {
    pub visit_no: String,
    pub branch: String,
    pub images: Vec<String>,
    #[serde(default)]
    pub note: Option<String>,
    /// Explicit next-appointment date; wins over the month offset.
    #[serde(default)]
    pub next_appointment_date: Option<NaiveDate>,
    /// Months ahead to schedule the next appointment; 0 means none.
    #[serde(default)]
    pub next_appointment_months: Option<u32>,
}

/// What an upload changed.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageUploadOutcome {
    /// Number of image references newly stored (duplicates are skipped).
    pub inserted: usize,
    /// The next-appointment date recorded, when one was requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_appointment_date: Option<NaiveDate>,
}

pub struct PrescriptionService {
    db: Arc<ClinicDb>,
}

impl PrescriptionService {
    pub fn new(db: Arc<ClinicDb>) -> Self {
        Self { db }
    }

    /// Stores image references, the optional note, and — when a next
    /// appointment was requested — the follow-up reminder.
    ///
    /// A failure while creating the follow-up is logged and swallowed: the
    /// upload itself must not be lost over a reminder.
    pub fn save_images(
        &self,
        upload: ImageUpload,
        now: DateTime<Utc>,
    ) -> ClinicResult<ImageUploadOutcome> {
        if upload.visit_no.trim().is_empty()
            || upload.branch.trim().is_empty()
            || upload.images.is_empty()
        {
            return Err(ClinicError::InvalidInput(
                "Missing visitNo, branch, or images".into(),
            ));
        }

        let mut inserted = 0;
        for url in &upload.images {
            let exists = self
                .db
                .prescription_images
                .find(|i| {
                    i.visit_no == upload.visit_no && i.branch == upload.branch && i.url == *url
                })?
                .is_some();
            if !exists {
                self.db.prescription_images.insert(PrescriptionImage {
                    visit_no: upload.visit_no.clone(),
                    branch: upload.branch.clone(),
                    url: url.clone(),
                    uploaded_at: now,
                })?;
                inserted += 1;
            }
        }

        if let Ok(note) = NonEmptyText::new(upload.note.as_deref().unwrap_or_default()) {
            self.db.prescription_notes.insert(PrescriptionNote {
                visit_no: upload.visit_no.clone(),
                branch: upload.branch.clone(),
                note,
                created_at: now,
            })?;
        }

        let next_appointment_date = self.next_appointment_target(&upload, now.date_naive())?;
        if let Some(date) = next_appointment_date {
            if let Err(e) = self.create_followup(&upload, date, now) {
                tracing::warn!(visit_no = %upload.visit_no, error = %e, "failed to create follow-up");
            }
        }

        Ok(ImageUploadOutcome {
            inserted,
            next_appointment_date,
        })
    }

    /// Resolves the requested next-appointment date, if any.
    ///
    /// An explicit date is taken as-is; a month offset is projected from
    /// today through the calendar policy, skipping Sundays and closures.
    fn next_appointment_target(
        &self,
        upload: &ImageUpload,
        today: NaiveDate,
    ) -> ClinicResult<Option<NaiveDate>> {
        if let Some(date) = upload.next_appointment_date {
            return Ok(Some(date));
        }
        match upload.next_appointment_months {
            Some(months) if months > 0 => {
                let branch = Branch::parse(&upload.branch)?;
                let policy = CalendarPolicy::load(&self.db)?;
                let date = schedule::next_appointment(&policy, today, months, branch)?;
                Ok(Some(date))
            }
            _ => Ok(None),
        }
    }

    fn create_followup(
        &self,
        upload: &ImageUpload,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> ClinicResult<()> {
        let remind_at = date.and_time(NaiveTime::MIN).and_utc() - Duration::days(REMINDER_LEAD_DAYS);

        // Capture the registered contact for the mismatch check at dispatch
        // time. An unrecognised branch or missing record just leaves the
        // contact unset.
        let contact = Branch::parse(&upload.branch).ok().and_then(|branch| {
            match self
                .db
                .patients(branch)
                .find(|p| p.visit_no.as_deref() == Some(upload.visit_no.as_str()))
            {
                Ok(found) => found.and_then(|(_, p)| p.contact),
                Err(e) => {
                    tracing::warn!(error = %e, "could not fetch patient for follow-up contact");
                    None
                }
            }
        });

        self.db.followups.insert(Followup {
            visit_no: upload.visit_no.clone(),
            branch: upload.branch.clone(),
            next_appointment_date: date,
            remind_at,
            contact,
            created_at: now,
            sent_at: None,
            sent_result: None,
            sent_detail: None,
        })?;
        Ok(())
    }

    /// The last three image URLs for a visit, most recent first.
    pub fn recent_images(&self, visit_no: &str, branch: &str) -> ClinicResult<Vec<String>> {
        let mut hits = self
            .db
            .prescription_images
            .select(|i| i.visit_no == visit_no && i.branch == branch)?;
        hits.reverse();
        Ok(hits.into_iter().take(3).map(|(_, i)| i.url).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{ClosedSpan, PatientRecord};
    use clinic_types::BranchScope;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Arc<ClinicDb>) {
        let temp = TempDir::new().expect("temp dir");
        let store = clinic_store::Store::open(temp.path()).expect("store");
        let db = Arc::new(ClinicDb::open(&store).expect("db"));
        (temp, db)
    }

    fn now() -> DateTime<Utc> {
        "2025-09-01T09:00:00Z".parse().expect("valid timestamp")
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn upload(urls: &[&str]) -> ImageUpload {
        ImageUpload {
            visit_no: "D-00000001".into(),
            branch: "Mal".into(),
            images: urls.iter().map(|u| u.to_string()).collect(),
            note: None,
            next_appointment_date: None,
            next_appointment_months: None,
        }
    }

    fn patient(visit_no: &str, contact: Option<&str>) -> PatientRecord {
        PatientRecord {
            visit_no: Some(visit_no.into()),
            name: Some("Asha Rao".into()),
            age: None,
            gender: None,
            contact: contact.map(str::to_owned),
            medical_conditions: None,
            allergy: None,
            family_history: None,
            appointments: vec![],
            created_at: now(),
        }
    }

    #[test]
    fn test_duplicate_urls_are_not_reinserted() {
        let (_temp, db) = setup();
        let service = PrescriptionService::new(db.clone());

        let outcome = service
            .save_images(upload(&["https://img.example/a.jpg"]), now())
            .expect("save");
        assert_eq!(outcome.inserted, 1);

        let outcome = service
            .save_images(
                upload(&["https://img.example/a.jpg", "https://img.example/b.jpg"]),
                now(),
            )
            .expect("save");
        assert_eq!(outcome.inserted, 1);
        assert_eq!(db.prescription_images.len().expect("len"), 2);
    }

    #[test]
    fn test_rejects_incomplete_uploads() {
        let (_temp, db) = setup();
        let service = PrescriptionService::new(db);

        let mut missing_images = upload(&[]);
        missing_images.images.clear();
        assert!(matches!(
            service.save_images(missing_images, now()),
            Err(ClinicError::InvalidInput(_))
        ));

        let mut missing_visit = upload(&["https://img.example/a.jpg"]);
        missing_visit.visit_no = "  ".into();
        assert!(matches!(
            service.save_images(missing_visit, now()),
            Err(ClinicError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_note_stored_only_when_non_blank() {
        let (_temp, db) = setup();
        let service = PrescriptionService::new(db.clone());

        let mut with_note = upload(&["https://img.example/a.jpg"]);
        with_note.note = Some("  twice daily after meals  ".into());
        service.save_images(with_note, now()).expect("save");

        let mut blank_note = upload(&["https://img.example/b.jpg"]);
        blank_note.note = Some("   ".into());
        service.save_images(blank_note, now()).expect("save");

        let notes = db.prescription_notes.all().expect("all");
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].1.note.as_str(), "twice daily after meals");
    }

    #[test]
    fn test_explicit_date_creates_followup_with_lead() {
        let (_temp, db) = setup();
        db.patients(Branch::Malad)
            .insert(patient("D-00000001", Some("9999999999")))
            .expect("insert");
        let service = PrescriptionService::new(db.clone());

        let mut req = upload(&["https://img.example/a.jpg"]);
        req.next_appointment_date = Some(date(2025, 9, 30));
        let outcome = service.save_images(req, now()).expect("save");
        assert_eq!(outcome.next_appointment_date, Some(date(2025, 9, 30)));

        let (_, followup) = db
            .followups
            .find(|_| true)
            .expect("find")
            .expect("present");
        assert_eq!(followup.next_appointment_date, date(2025, 9, 30));
        assert_eq!(
            followup.remind_at,
            "2025-09-23T00:00:00Z".parse::<DateTime<Utc>>().expect("ts")
        );
        assert_eq!(followup.contact.as_deref(), Some("9999999999"));
        assert!(followup.sent_at.is_none());
    }

    #[test]
    fn test_month_offset_is_scheduled_through_policy() {
        let (_temp, db) = setup();
        // 2025-10-01 closed everywhere; 2025-09-01 + 1 month would land on
        // it, so scheduling moves forward to 2025-10-02 (a Thursday).
        db.closed_days
            .insert(crate::records::ClosedDay {
                span: ClosedSpan::Single {
                    date: date(2025, 10, 1),
                },
                branch: BranchScope::All,
                reason: "festival".into(),
                created_at: now(),
            })
            .expect("insert");
        let service = PrescriptionService::new(db.clone());

        let mut req = upload(&["https://img.example/a.jpg"]);
        req.next_appointment_months = Some(1);
        let outcome = service.save_images(req, now()).expect("save");
        assert_eq!(outcome.next_appointment_date, Some(date(2025, 10, 2)));

        let (_, followup) = db
            .followups
            .find(|_| true)
            .expect("find")
            .expect("present");
        assert_eq!(followup.next_appointment_date, date(2025, 10, 2));
        // No patient record: contact stays unset.
        assert!(followup.contact.is_none());
    }

    #[test]
    fn test_no_next_appointment_requested_means_no_followup() {
        let (_temp, db) = setup();
        let service = PrescriptionService::new(db.clone());

        let mut req = upload(&["https://img.example/a.jpg"]);
        req.next_appointment_months = Some(0);
        service.save_images(req, now()).expect("save");
        assert!(db.followups.is_empty().expect("is_empty"));
    }

    #[test]
    fn test_recent_images_returns_last_three_newest_first() {
        let (_temp, db) = setup();
        let service = PrescriptionService::new(db);

        for i in 1..=4 {
            service
                .save_images(upload(&[&format!("https://img.example/{i}.jpg")]), now())
                .expect("save");
        }

        let urls = service
            .recent_images("D-00000001", "Mal")
            .expect("recent");
        assert_eq!(
            urls,
            vec![
                "https://img.example/4.jpg",
                "https://img.example/3.jpg",
                "https://img.example/2.jpg",
            ]
        );

        // Other visits' images are out of scope.
        assert!(service
            .recent_images("D-00000002", "Mal")
            .expect("recent")
            .is_empty());
    }
}
