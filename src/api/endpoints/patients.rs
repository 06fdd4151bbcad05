//! Patient records.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, OkResponse};
use crate::db;
use crate::models::{Patient, PatientCreate, PatientFilter, PatientUpdate};

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub q: Option<String>,
}

/// `GET /patients[?q=]`
pub async fn list(
    State(ctx): State<ApiContext>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Vec<Patient>>, ApiError> {
    let Query(params) = params?;
    let conn = ctx.core.open_db()?;
    let filter = PatientFilter { query: params.q };
    Ok(Json(db::list_patients(&conn, &filter)?))
}

/// `POST /patients`
pub async fn create(
    State(ctx): State<ApiContext>,
    body: Result<Json<PatientCreate>, JsonRejection>,
) -> Result<Json<Patient>, ApiError> {
    let Json(input) = body?;
    let conn = ctx.core.open_db()?;
    let patient = db::insert_patient(&conn, &input)?;
    tracing::info!(patient_id = patient.id, "Patient created");
    Ok(Json(patient))
}

/// `GET /patients/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Patient>, ApiError> {
    let Path(id) = id?;
    let conn = ctx.core.open_db()?;
    db::get_patient(&conn, id)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Patient not found".into()))
}

/// `PATCH /patients/:id`
pub async fn update(
    State(ctx): State<ApiContext>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<PatientUpdate>, JsonRejection>,
) -> Result<Json<Patient>, ApiError> {
    let Path(id) = id?;
    let Json(update) = body?;
    let conn = ctx.core.open_db()?;
    Ok(Json(db::update_patient(&conn, id, update)?))
}

/// `DELETE /patients/:id`. Encounters go with it, appointments are unlinked.
pub async fn remove(
    State(ctx): State<ApiContext>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<OkResponse>, ApiError> {
    let Path(id) = id?;
    let conn = ctx.core.open_db()?;
    db::delete_patient(&conn, id)?;
    tracing::info!(patient_id = id, "Patient deleted");
    Ok(Json(OkResponse::ok()))
}
