//! Doctor dashboard endpoints.

use std::collections::BTreeMap;

use axum::extract::{Query, State};
use axum::Json;
use clinic_core::patients::{PatientIndex, PatientMatch};
use clinic_types::Branch;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::state::{ApiError, AppState};

#[derive(Debug, Deserialize, IntoParams)]
pub struct SearchQuery {
    name: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SearchRes {
    #[schema(value_type = Vec<Object>)]
    patients: Vec<PatientMatch>,
}

#[utoipa::path(
    get,
    path = "/api/doctor/searchPatient",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching patients grouped by name", body = SearchRes),
        (status = 400, description = "Name missing")
    )
)]
/// Searches patient history across all branches by name.
pub async fn search_patient(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchRes>, ApiError> {
    let Some(name) = query.name.as_deref().filter(|n| !n.is_empty()) else {
        return Err(ApiError::bad_request("Name required"));
    };

    let index = PatientIndex::new(state.db.clone());
    let patients = index.search(name)?;
    Ok(Json(SearchRes { patients }))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ActivePatientsQuery {
    branch: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(untagged)]
pub enum ActivePatientsRes {
    Single {
        branch: String,
        count: usize,
    },
    All {
        total: usize,
        #[serde(rename = "perBranch")]
        per_branch: BTreeMap<String, usize>,
    },
}

#[utoipa::path(
    get,
    path = "/api/doctor/activePatients",
    params(ActivePatientsQuery),
    responses(
        (status = 200, description = "Patient counts, per branch or overall", body = ActivePatientsRes)
    )
)]
/// Patient counts: one branch when a recognised branch is given, otherwise
/// the total plus a per-branch breakdown.
pub async fn active_patients(
    State(state): State<AppState>,
    Query(query): Query<ActivePatientsQuery>,
) -> Result<Json<ActivePatientsRes>, ApiError> {
    let index = PatientIndex::new(state.db.clone());

    if let Some(branch) = query.branch.as_deref().and_then(|b| Branch::parse(b).ok()) {
        let count = index.count(branch)?;
        return Ok(Json(ActivePatientsRes::Single {
            branch: branch.name().to_owned(),
            count,
        }));
    }

    let counts = index.counts()?;
    Ok(Json(ActivePatientsRes::All {
        total: counts.total,
        per_branch: counts.per_branch,
    }))
}
