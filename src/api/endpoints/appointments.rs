//! Appointment scheduling.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, OkResponse};
use crate::db;
use crate::models::timestamp;
use crate::models::{Appointment, AppointmentCreate, AppointmentFilter, AppointmentUpdate};

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    #[serde(default, deserialize_with = "timestamp::option::deserialize")]
    pub start: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamp::option::deserialize")]
    pub end: Option<DateTime<Utc>>,
    pub specialist: Option<String>,
}

/// `GET /appointments[?start=&end=&specialist=]`
///
/// Appointments fully inside the window, earliest first. The window
/// defaults to the next 30 days.
pub async fn list(
    State(ctx): State<ApiContext>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Vec<Appointment>>, ApiError> {
    let Query(params) = params?;
    let filter =
        AppointmentFilter::with_defaults(params.start, params.end, params.specialist, Utc::now());
    let conn = ctx.core.open_db()?;
    Ok(Json(db::list_appointments(&conn, &filter)?))
}

/// `POST /appointments`
pub async fn create(
    State(ctx): State<ApiContext>,
    body: Result<Json<AppointmentCreate>, JsonRejection>,
) -> Result<Json<Appointment>, ApiError> {
    let Json(input) = body?;
    let conn = ctx.core.open_db()?;
    let appt = db::insert_appointment(&conn, &input)?;
    tracing::info!(appointment_id = appt.id, "Appointment created");
    Ok(Json(appt))
}

/// `GET /appointments/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Appointment>, ApiError> {
    let Path(id) = id?;
    let conn = ctx.core.open_db()?;
    db::get_appointment(&conn, id)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Appointment not found".into()))
}

/// `PATCH /appointments/:id`
pub async fn update(
    State(ctx): State<ApiContext>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<AppointmentUpdate>, JsonRejection>,
) -> Result<Json<Appointment>, ApiError> {
    let Path(id) = id?;
    let Json(update) = body?;
    let conn = ctx.core.open_db()?;
    Ok(Json(db::update_appointment(&conn, id, update)?))
}

/// `DELETE /appointments/:id`
pub async fn remove(
    State(ctx): State<ApiContext>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<OkResponse>, ApiError> {
    let Path(id) = id?;
    let conn = ctx.core.open_db()?;
    db::delete_appointment(&conn, id)?;
    tracing::info!(appointment_id = id, "Appointment deleted");
    Ok(Json(OkResponse::ok()))
}
