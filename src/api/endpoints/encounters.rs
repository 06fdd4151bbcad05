//! Encounters, always scoped to one patient.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db;
use crate::models::{Encounter, EncounterCreate};

/// `GET /patients/:id/encounters`, newest first.
pub async fn list(
    State(ctx): State<ApiContext>,
    patient_id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Vec<Encounter>>, ApiError> {
    let Path(patient_id) = patient_id?;
    let conn = ctx.core.open_db()?;
    Ok(Json(db::list_encounters(&conn, patient_id)?))
}

/// `POST /patients/:id/encounters`
pub async fn create(
    State(ctx): State<ApiContext>,
    patient_id: Result<Path<i64>, PathRejection>,
    body: Result<Json<EncounterCreate>, JsonRejection>,
) -> Result<Json<Encounter>, ApiError> {
    let Path(patient_id) = patient_id?;
    let Json(input) = body?;
    let conn = ctx.core.open_db()?;
    let encounter = db::insert_encounter(&conn, patient_id, &input, Utc::now())?;
    tracing::info!(patient_id, encounter_id = encounter.id, "Encounter recorded");
    Ok(Json(encounter))
}

/// `GET /patients/:id/encounters/:encounter_id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    ids: Result<Path<(i64, i64)>, PathRejection>,
) -> Result<Json<Encounter>, ApiError> {
    let Path((patient_id, encounter_id)) = ids?;
    let conn = ctx.core.open_db()?;
    db::get_encounter(&conn, patient_id, encounter_id)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Encounter not found".into()))
}
