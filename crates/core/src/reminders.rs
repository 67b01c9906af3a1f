//! Follow-up reminder dispatch.
//!
//! Invoked by an external periodic trigger (HTTP endpoint or the CLI), never
//! self-scheduling. Due follow-ups are processed one at a time so a failure
//! in one cannot interleave with the state update of another, and every
//! processed record is stamped `sent_at` whatever its outcome: each
//! follow-up gets at most one attempt, ever.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use clinic_notify::{NotificationSender, SendError};
use clinic_types::Branch;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::records::Followup;
use crate::{ClinicDb, ClinicResult};

/// Terminal outcome of one dispatch attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DispatchOutcome {
    /// The stored branch code did not resolve to a patient collection.
    InvalidBranch,
    /// No patient record, or a record without a contact, at send time.
    NoRegisteredContact,
    /// The stored contact no longer matches the registered one.
    ContactMismatch,
    /// The follow-up itself carries no contact.
    NoContact,
    /// Provider credentials are not configured.
    NoTwilioConfig,
    Sent,
    Failed,
    Error,
}

impl DispatchOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            DispatchOutcome::InvalidBranch => "invalid-branch",
            DispatchOutcome::NoRegisteredContact => "no-registered-contact",
            DispatchOutcome::ContactMismatch => "contact-mismatch",
            DispatchOutcome::NoContact => "no-contact",
            DispatchOutcome::NoTwilioConfig => "no-twilio-config",
            DispatchOutcome::Sent => "sent",
            DispatchOutcome::Failed => "failed",
            DispatchOutcome::Error => "error",
        }
    }
}

impl fmt::Display for DispatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened to one due follow-up.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchReport {
    pub visit_no: String,
    pub result: DispatchOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<Value>,
}

/// Processes due follow-ups and records their outcomes.
pub struct ReminderDispatcher {
    db: Arc<ClinicDb>,
}

impl ReminderDispatcher {
    pub fn new(db: Arc<ClinicDb>) -> Self {
        Self { db }
    }

    /// Dispatches every follow-up with `remind_at <= now` and no `sent_at`.
    ///
    /// Records are processed sequentially. Each one is stamped
    /// `sent_at = now` with its outcome before the next is considered, so a
    /// second run with no time advance finds nothing to do.
    pub async fn dispatch_due<S: NotificationSender>(
        &self,
        now: DateTime<Utc>,
        sender: Option<&S>,
    ) -> ClinicResult<Vec<DispatchReport>> {
        let due = self
            .db
            .followups
            .select(|f| f.remind_at <= now && f.sent_at.is_none())?;

        let mut reports = Vec::with_capacity(due.len());
        for (id, followup) in due {
            let (outcome, detail) = self.attempt(&followup, sender).await;

            let stored_detail = detail.clone();
            self.db.followups.modify(id, |f| {
                f.sent_at = Some(now);
                f.sent_result = Some(outcome);
                f.sent_detail = stored_detail;
            })?;

            tracing::info!(visit_no = %followup.visit_no, result = %outcome, "processed follow-up");
            reports.push(DispatchReport {
                visit_no: followup.visit_no,
                result: outcome,
                detail,
            });
        }

        Ok(reports)
    }

    async fn attempt<S: NotificationSender>(
        &self,
        followup: &Followup,
        sender: Option<&S>,
    ) -> (DispatchOutcome, Option<Value>) {
        let Ok(branch) = Branch::parse(&followup.branch) else {
            return (DispatchOutcome::InvalidBranch, None);
        };

        // Re-fetch the registered contact at send time: the stored one may
        // have been wrong at capture time or changed since.
        let patient = match self
            .db
            .patients(branch)
            .find(|p| p.visit_no.as_deref() == Some(followup.visit_no.as_str()))
        {
            Ok(found) => found.map(|(_, p)| p),
            Err(e) => return (DispatchOutcome::Error, Some(Value::String(e.to_string()))),
        };
        let Some(registered) = patient
            .and_then(|p| p.contact)
            .filter(|c| !c.is_empty())
        else {
            return (DispatchOutcome::NoRegisteredContact, None);
        };

        let stored = followup.contact.clone().unwrap_or_default();
        if squash_whitespace(&registered) != squash_whitespace(&stored) {
            return (DispatchOutcome::ContactMismatch, None);
        }
        if stored.is_empty() {
            return (DispatchOutcome::NoContact, None);
        }

        let Some(sender) = sender else {
            return (DispatchOutcome::NoTwilioConfig, None);
        };

        let body = format!(
            "Reminder: You have an upcoming appointment on {}. Please attend or call to reschedule.",
            followup.next_appointment_date
        );
        match sender.send(&stored, &body).await {
            Ok(receipt) => (DispatchOutcome::Sent, Some(receipt.payload)),
            Err(SendError::Provider { payload }) => (DispatchOutcome::Failed, Some(payload)),
            Err(err) => (DispatchOutcome::Error, Some(Value::String(err.to_string()))),
        }
    }
}

fn squash_whitespace(input: &str) -> String {
    input.split_whitespace().collect()
}
