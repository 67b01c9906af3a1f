//! Nurse dashboard endpoints.

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::{NaiveDate, Utc};
use clinic_core::appointments::{AppointmentDesk, AppointmentRow};
use clinic_core::calendar::ClosedDayCalendar;
use clinic_core::intake::{BookingRequest, IntakeService};
use clinic_core::payments::PaymentLedger;
use clinic_core::prescriptions::{ImageUpload, PrescriptionService};
use clinic_core::records::{ClosedDay, ClosedSpan};
use clinic_core::reminders::{DispatchReport, ReminderDispatcher};
use clinic_core::reports::{ReportService, ReportUpload};
use clinic_store::DocumentId;
use clinic_types::{Branch, BranchScope};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::state::{ApiError, AppState};

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentsQuery {
    branch: Option<String>,
    date: Option<NaiveDate>,
    page: Option<usize>,
    page_size: Option<usize>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AppointmentsRes {
    total: usize,
    #[schema(value_type = Vec<Object>)]
    appointments: Vec<AppointmentRow>,
}

#[utoipa::path(
    get,
    path = "/api/nurse/appointments",
    params(AppointmentsQuery),
    responses(
        (status = 200, description = "Paginated day sheet with payment status", body = AppointmentsRes),
        (status = 400, description = "Missing branch/date or invalid branch"),
        (status = 500, description = "Internal server error")
    )
)]
/// The appointment listing for one branch and date.
pub async fn list_appointments(
    State(state): State<AppState>,
    Query(query): Query<AppointmentsQuery>,
) -> Result<Json<AppointmentsRes>, ApiError> {
    let (Some(branch), Some(date)) = (query.branch.as_deref(), query.date) else {
        return Err(ApiError::bad_request("Branch and date required"));
    };
    let branch = Branch::parse(branch).map_err(|_| ApiError::bad_request("Invalid branch"))?;

    let desk = AppointmentDesk::new(state.db.clone());
    let page = desk.list(
        branch,
        date,
        query.page.unwrap_or(1),
        query.page_size.unwrap_or(10),
    )?;
    Ok(Json(AppointmentsRes {
        total: page.total,
        appointments: page.appointments,
    }))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CashCollectionReq {
    visit_no: Option<String>,
    date: Option<NaiveDate>,
    time: Option<String>,
    #[serde(default)]
    collected: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SuccessRes {
    success: bool,
}

#[utoipa::path(
    patch,
    path = "/api/nurse/appointments",
    request_body = CashCollectionReq,
    responses(
        (status = 200, description = "Payment state updated", body = SuccessRes),
        (status = 400, description = "visitNo missing"),
        (status = 404, description = "No payment record matched")
    )
)]
/// Marks a visit's cash payment as collected (or back to plain cash).
pub async fn mark_cash_collection(
    State(state): State<AppState>,
    Json(req): Json<CashCollectionReq>,
) -> Result<Json<SuccessRes>, ApiError> {
    let Some(visit_no) = req.visit_no.as_deref().filter(|v| !v.is_empty()) else {
        return Err(ApiError::bad_request("visitNo required"));
    };

    let ledger = PaymentLedger::new(state.db.clone());
    ledger.mark_cash_collection(visit_no, req.date, req.time.as_deref(), req.collected)?;
    Ok(Json(SuccessRes { success: true }))
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingRes {
    visit_no: String,
}

#[utoipa::path(
    post,
    path = "/api/nurse/manual_book",
    responses(
        (status = 200, description = "Visit booked; allocated visit number returned", body = BookingRes),
        (status = 400, description = "Invalid branch")
    )
)]
/// Books a walk-in visit and allocates the next visit number.
pub async fn manual_book(
    State(state): State<AppState>,
    Json(req): Json<BookingRequest>,
) -> Result<Json<BookingRes>, ApiError> {
    let intake = IntakeService::new(state.db.clone());
    let visit_no = intake.book_visit(req, Utc::now())?;
    Ok(Json(BookingRes {
        visit_no: visit_no.to_string(),
    }))
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionSaveRes {
    success: bool,
    inserted: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    next_appointment_date: Option<NaiveDate>,
}

#[utoipa::path(
    post,
    path = "/api/nurse/prescription_img",
    responses(
        (status = 200, description = "Image references stored", body = PrescriptionSaveRes),
        (status = 400, description = "Missing visitNo, branch, or images")
    )
)]
/// Stores prescription image references; optionally records the projected
/// next appointment and its reminder.
pub async fn save_prescription_images(
    State(state): State<AppState>,
    Json(req): Json<ImageUpload>,
) -> Result<Json<PrescriptionSaveRes>, ApiError> {
    let service = PrescriptionService::new(state.db.clone());
    let outcome = service.save_images(req, Utc::now())?;
    Ok(Json(PrescriptionSaveRes {
        success: true,
        inserted: outcome.inserted,
        next_appointment_date: outcome.next_appointment_date,
    }))
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct VisitScopedQuery {
    visit_no: Option<String>,
    branch: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ImagesRes {
    images: Vec<String>,
}

#[utoipa::path(
    get,
    path = "/api/nurse/prescription_img",
    params(VisitScopedQuery),
    responses(
        (status = 200, description = "Last three image URLs, most recent first", body = ImagesRes),
        (status = 400, description = "Missing visitNo or branch")
    )
)]
/// The most recent prescription images for a visit.
pub async fn recent_prescription_images(
    State(state): State<AppState>,
    Query(query): Query<VisitScopedQuery>,
) -> Result<Json<ImagesRes>, ApiError> {
    let (Some(visit_no), Some(branch)) = (query.visit_no.as_deref(), query.branch.as_deref())
    else {
        return Err(ApiError::bad_request("Missing visitNo or branch"));
    };

    let service = PrescriptionService::new(state.db.clone());
    let images = service.recent_images(visit_no, branch)?;
    Ok(Json(ImagesRes { images }))
}

#[utoipa::path(
    post,
    path = "/api/nurse/report",
    responses(
        (status = 200, description = "Report references stored", body = SuccessRes),
        (status = 400, description = "Missing visitNo, branch, or reports")
    )
)]
/// Stores lab report references and the per-visit note.
pub async fn save_reports(
    State(state): State<AppState>,
    Json(req): Json<ReportUpload>,
) -> Result<Json<SuccessRes>, ApiError> {
    let service = ReportService::new(state.db.clone());
    service.save_reports(req, Utc::now())?;
    Ok(Json(SuccessRes { success: true }))
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportsRes {
    reports: Vec<String>,
    report_note: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/nurse/report",
    params(VisitScopedQuery),
    responses(
        (status = 200, description = "Last three report URLs plus note", body = ReportsRes),
        (status = 400, description = "Missing visitNo or branch")
    )
)]
/// The most recent lab reports for a visit.
pub async fn recent_reports(
    State(state): State<AppState>,
    Query(query): Query<VisitScopedQuery>,
) -> Result<Json<ReportsRes>, ApiError> {
    let (Some(visit_no), Some(branch)) = (query.visit_no.as_deref(), query.branch.as_deref())
    else {
        return Err(ApiError::bad_request("Missing visitNo or branch"));
    };

    let service = ReportService::new(state.db.clone());
    let (reports, report_note) = service.recent_reports(visit_no, branch)?;
    Ok(Json(ReportsRes {
        reports,
        report_note,
    }))
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClosedDayView {
    id: u64,
    #[serde(flatten)]
    #[schema(value_type = Object)]
    entry: ClosedDay,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClosedDaysRes {
    closed_days: Vec<ClosedDayView>,
}

#[utoipa::path(
    get,
    path = "/api/nurse/closed_days",
    responses(
        (status = 200, description = "All closed-day entries, most recent first", body = ClosedDaysRes)
    )
)]
/// Lists closed-day entries.
pub async fn list_closed_days(
    State(state): State<AppState>,
) -> Result<Json<ClosedDaysRes>, ApiError> {
    let calendar = ClosedDayCalendar::new(state.db.clone());
    let closed_days = calendar
        .list()?
        .into_iter()
        .map(|(id, entry)| ClosedDayView {
            id: id.value(),
            entry,
        })
        .collect();
    Ok(Json(ClosedDaysRes { closed_days }))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewClosedDayReq {
    date: Option<NaiveDate>,
    date_from: Option<NaiveDate>,
    date_to: Option<NaiveDate>,
    branch: Option<String>,
    reason: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreatedRes {
    success: bool,
    id: u64,
}

#[utoipa::path(
    post,
    path = "/api/nurse/closed_days",
    request_body = NewClosedDayReq,
    responses(
        (status = 200, description = "Closed-day entry created", body = CreatedRes),
        (status = 400, description = "Missing date/branch or invalid branch")
    )
)]
/// Creates a closed-day entry (single date, or inclusive range via
/// `dateFrom`/`dateTo`).
pub async fn add_closed_day(
    State(state): State<AppState>,
    Json(req): Json<NewClosedDayReq>,
) -> Result<Json<CreatedRes>, ApiError> {
    let span = match (req.date_from, req.date) {
        (Some(from), _) => ClosedSpan::Range {
            date_from: from,
            date_to: req.date_to.unwrap_or(from),
        },
        (None, Some(date)) => ClosedSpan::Single { date },
        (None, None) => return Err(ApiError::bad_request("dateFrom/date and branch required")),
    };
    let Some(branch) = req.branch.as_deref().filter(|b| !b.is_empty()) else {
        return Err(ApiError::bad_request("dateFrom/date and branch required"));
    };
    let scope =
        BranchScope::parse(branch).map_err(|_| ApiError::bad_request("Invalid branch"))?;

    let calendar = ClosedDayCalendar::new(state.db.clone());
    let id = calendar.add(span, scope, req.reason.unwrap_or_default(), Utc::now())?;
    Ok(Json(CreatedRes {
        success: true,
        id: id.value(),
    }))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct DeleteClosedDayQuery {
    id: Option<u64>,
}

#[utoipa::path(
    delete,
    path = "/api/nurse/closed_days",
    params(DeleteClosedDayQuery),
    responses(
        (status = 200, description = "Entry removed (or already gone)", body = SuccessRes),
        (status = 400, description = "id missing")
    )
)]
/// Deletes a closed-day entry by id.
pub async fn delete_closed_day(
    State(state): State<AppState>,
    Query(query): Query<DeleteClosedDayQuery>,
) -> Result<Json<SuccessRes>, ApiError> {
    let Some(id) = query.id else {
        return Err(ApiError::bad_request("id required"));
    };

    let calendar = ClosedDayCalendar::new(state.db.clone());
    if !calendar.remove(DocumentId::from_value(id))? {
        tracing::warn!(id, "delete for unknown closed-day entry");
    }
    Ok(Json(SuccessRes { success: true }))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RemindersRes {
    sent: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Vec<Object>>)]
    results: Option<Vec<DispatchReport>>,
}

#[utoipa::path(
    post,
    path = "/api/nurse/send_reminders",
    responses(
        (status = 200, description = "Due follow-ups processed", body = RemindersRes),
        (status = 401, description = "Missing or wrong x-reminder-token"),
        (status = 500, description = "Internal server error")
    )
)]
/// Processes all due follow-up reminders. Intended to be hit by an external
/// scheduler; requires `x-reminder-token` when a token is configured.
pub async fn send_reminders(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<RemindersRes>, ApiError> {
    if let Some(required) = state.config.reminder_token() {
        let provided = headers
            .get("x-reminder-token")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if provided != required {
            return Err(ApiError::unauthorized());
        }
    }

    let dispatcher = ReminderDispatcher::new(state.db.clone());
    let results = dispatcher
        .dispatch_due(Utc::now(), state.sms.as_ref())
        .await?;

    if results.is_empty() {
        return Ok(Json(RemindersRes {
            sent: 0,
            message: Some("No reminders due".into()),
            results: None,
        }));
    }
    Ok(Json(RemindersRes {
        sent: results.len(),
        message: None,
        results: Some(results),
    }))
}
