//! Outbound patient notifications.
//!
//! The clinic sends appointment reminders as SMS through a Twilio-style REST
//! provider. The [`NotificationSender`] trait is the seam the reminder
//! dispatcher works against; [`TwilioSender`] is the production
//! implementation. Provider credentials are optional at runtime — when they
//! are absent the dispatcher records the fact instead of sending.

use std::future::Future;
use std::time::Duration;

use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum SendError {
    /// The HTTP call to the provider failed outright.
    #[error("notification transport failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// The provider answered with a non-success status; `payload` holds its
    /// error body for the caller to record.
    #[error("notification provider rejected the message")]
    Provider { payload: Value },
}

/// What the provider returned for an accepted message.
#[derive(Debug, Clone)]
pub struct ProviderReceipt {
    /// Provider-assigned message id, when one was present in the response.
    pub sid: Option<String>,
    /// The full provider response body.
    pub payload: Value,
}

/// A one-shot message sender.
///
/// Implementations own the sender ("from") identity; callers supply only the
/// destination and the message body.
pub trait NotificationSender: Send + Sync {
    fn send(
        &self,
        to: &str,
        body: &str,
    ) -> impl Future<Output = Result<ProviderReceipt, SendError>> + Send;
}

/// Twilio credentials, resolved once at startup.
#[derive(Debug, Clone)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
}

impl TwilioConfig {
    /// Builds a config only when all three credentials are present and
    /// non-empty; anything less means the sender is unconfigured.
    pub fn from_values(
        account_sid: Option<String>,
        auth_token: Option<String>,
        from_number: Option<String>,
    ) -> Option<Self> {
        let account_sid = account_sid.filter(|v| !v.trim().is_empty())?;
        let auth_token = auth_token.filter(|v| !v.trim().is_empty())?;
        let from_number = from_number.filter(|v| !v.trim().is_empty())?;
        Some(Self {
            account_sid,
            auth_token,
            from_number,
        })
    }
}

/// SMS sender backed by the Twilio Messages REST endpoint.
#[derive(Debug, Clone)]
pub struct TwilioSender {
    http: reqwest::Client,
    config: TwilioConfig,
}

/// Upper bound on one provider call; a stalled call ties up only its own
/// record for at most this long.
const SEND_TIMEOUT: Duration = Duration::from_secs(30);

impl TwilioSender {
    pub fn new(config: TwilioConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(SEND_TIMEOUT)
            .build()
            .expect("HTTP client construction");
        Self { http, config }
    }

    fn messages_url(&self) -> String {
        format!(
            "https://api.twilio.com/2010-04-01/Accounts/{}/Messages.json",
            self.config.account_sid
        )
    }
}

impl NotificationSender for TwilioSender {
    async fn send(&self, to: &str, body: &str) -> Result<ProviderReceipt, SendError> {
        let params = [
            ("To", to),
            ("From", self.config.from_number.as_str()),
            ("Body", body),
        ];

        let response = self
            .http
            .post(self.messages_url())
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        let payload: Value = response.json().await?;

        if status.is_success() {
            let sid = payload
                .get("sid")
                .and_then(Value::as_str)
                .map(str::to_owned);
            tracing::debug!(?sid, "provider accepted message");
            Ok(ProviderReceipt { sid, payload })
        } else {
            tracing::warn!(%status, "provider rejected message");
            Err(SendError::Provider { payload })
        }
    }
}
