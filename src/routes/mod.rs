//! HTTP surface of the clinic service.

pub mod doctor;
pub mod nurse;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use clinic_core::payments::PaymentLedger;
use serde::Serialize;
use tower_http::cors::CorsLayer;
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use crate::state::{ApiError, AppState};

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        cleanup_payments,
        nurse::list_appointments,
        nurse::mark_cash_collection,
        nurse::manual_book,
        nurse::save_prescription_images,
        nurse::recent_prescription_images,
        nurse::save_reports,
        nurse::recent_reports,
        nurse::list_closed_days,
        nurse::add_closed_day,
        nurse::delete_closed_day,
        nurse::send_reminders,
        doctor::search_patient,
        doctor::active_patients,
    ),
    components(schemas(
        HealthRes,
        CleanupRes,
        nurse::AppointmentsRes,
        nurse::CashCollectionReq,
        nurse::SuccessRes,
        nurse::BookingRes,
        nurse::PrescriptionSaveRes,
        nurse::ImagesRes,
        nurse::ReportsRes,
        nurse::ClosedDayView,
        nurse::ClosedDaysRes,
        nurse::NewClosedDayReq,
        nurse::CreatedRes,
        nurse::RemindersRes,
        doctor::SearchRes,
        doctor::ActivePatientsRes,
    ))
)]
pub struct ApiDoc;

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/api/nurse/appointments",
            get(nurse::list_appointments).patch(nurse::mark_cash_collection),
        )
        .route("/api/nurse/manual_book", post(nurse::manual_book))
        .route(
            "/api/nurse/prescription_img",
            get(nurse::recent_prescription_images).post(nurse::save_prescription_images),
        )
        .route(
            "/api/nurse/report",
            get(nurse::recent_reports).post(nurse::save_reports),
        )
        .route(
            "/api/nurse/closed_days",
            get(nurse::list_closed_days)
                .post(nurse::add_closed_day)
                .delete(nurse::delete_closed_day),
        )
        .route("/api/nurse/send_reminders", post(nurse::send_reminders))
        .route("/api/cleanup", post(cleanup_payments))
        .route("/api/doctor/searchPatient", get(doctor::search_patient))
        .route("/api/doctor/activePatients", get(doctor::active_patients))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthRes {
    ok: bool,
    message: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Health check response", body = HealthRes))
)]
/// Health check endpoint for monitoring and load balancers.
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "clinic service is alive".into(),
    })
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CleanupRes {
    success: bool,
    removed_pending_records: usize,
    duplicate_groups: usize,
}

#[utoipa::path(
    post,
    path = "/api/cleanup",
    responses(
        (status = 200, description = "Stale pending payment duplicates removed", body = CleanupRes),
        (status = 500, description = "Internal server error")
    )
)]
/// Removes pending payment placeholders superseded by a real record.
async fn cleanup_payments(State(state): State<AppState>) -> Result<Json<CleanupRes>, ApiError> {
    let summary = PaymentLedger::new(state.db.clone()).cleanup_stale_pending()?;
    Ok(Json(CleanupRes {
        success: true,
        removed_pending_records: summary.removed_pending_records,
        duplicate_groups: summary.duplicate_groups,
    }))
}
