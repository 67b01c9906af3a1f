use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use clinic_core::{ClinicConfig, ClinicDb, ClinicError};
use clinic_notify::TwilioSender;
use serde_json::json;

/// Application state shared across REST API handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<ClinicDb>,
    pub config: Arc<ClinicConfig>,
    /// Absent when Twilio credentials are not configured; the reminder
    /// dispatcher records that per follow-up instead of failing.
    pub sms: Option<TwilioSender>,
}

/// Error response carrying the `{"error": "..."}` body the dashboard
/// expects.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn unauthorized() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: "Unauthorized".into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    pub fn internal() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "Internal server error".into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<ClinicError> for ApiError {
    fn from(err: ClinicError) -> Self {
        match err {
            ClinicError::InvalidInput(message) => ApiError::bad_request(message),
            ClinicError::UnknownBranch(_) => ApiError::bad_request("Invalid branch"),
            ClinicError::PaymentNotFound => {
                ApiError::not_found("Payment record not found or not updated")
            }
            ClinicError::DateOutOfRange(detail) => {
                ApiError::bad_request(format!("date arithmetic out of range: {detail}"))
            }
            ClinicError::Store(e) => {
                tracing::error!(error = %e, "store operation failed");
                ApiError::internal()
            }
        }
    }
}
