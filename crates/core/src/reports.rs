//! Lab report references.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use clinic_types::NonEmptyText;
use serde::Deserialize;

use crate::records::{LabReport, LabReportNote};
use crate::{ClinicDb, ClinicError, ClinicResult};

/// An upload of lab report document references for one visit.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportUpload {
    pub visit_no: String,
    pub branch: String,
    pub reports: Vec<String>,
    #[serde(default)]
    pub report_note: Option<String>,
}

pub struct ReportService {
    db: Arc<ClinicDb>,
}

impl ReportService {
    pub fn new(db: Arc<ClinicDb>) -> Self {
        Self { db }
    }

    /// Stores report references and updates the visit's single note in
    /// place when a non-blank one is supplied.
    pub fn save_reports(&self, upload: ReportUpload, now: DateTime<Utc>) -> ClinicResult<()> {
        if upload.visit_no.trim().is_empty()
            || upload.branch.trim().is_empty()
            || upload.reports.is_empty()
        {
            return Err(ClinicError::InvalidInput(
                "Missing visitNo, branch, or reports".into(),
            ));
        }

        for url in &upload.reports {
            self.db.lab_reports.insert(LabReport {
                visit_no: upload.visit_no.clone(),
                branch: upload.branch.clone(),
                url: url.clone(),
                uploaded_at: now,
            })?;
        }

        if let Ok(note) = NonEmptyText::new(upload.report_note.as_deref().unwrap_or_default()) {
            let existing = self
                .db
                .lab_report_notes
                .find(|n| n.visit_no == upload.visit_no && n.branch == upload.branch)?;
            match existing {
                Some((id, _)) => {
                    self.db.lab_report_notes.modify(id, |n| {
                        n.note = note;
                        n.updated_at = now;
                    })?;
                }
                None => {
                    self.db.lab_report_notes.insert(LabReportNote {
                        visit_no: upload.visit_no.clone(),
                        branch: upload.branch.clone(),
                        note,
                        updated_at: now,
                    })?;
                }
            }
        }

        Ok(())
    }

    /// The last three report URLs (most recent first) plus the note, if any.
    pub fn recent_reports(
        &self,
        visit_no: &str,
        branch: &str,
    ) -> ClinicResult<(Vec<String>, Option<String>)> {
        let mut hits = self
            .db
            .lab_reports
            .select(|r| r.visit_no == visit_no && r.branch == branch)?;
        hits.reverse();
        let urls = hits.into_iter().take(3).map(|(_, r)| r.url).collect();

        let note = self
            .db
            .lab_report_notes
            .find(|n| n.visit_no == visit_no && n.branch == branch)?
            .map(|(_, n)| n.note.as_str().to_owned());

        Ok((urls, note))
    }
}
