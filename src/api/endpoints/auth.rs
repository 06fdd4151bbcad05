//! Login and refresh-token rotation.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::auth;
use crate::crypto::TokenPair;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshParams {
    pub refresh_token: String,
}

/// `POST /auth/login`
pub async fn login(
    State(ctx): State<ApiContext>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<TokenPair>, ApiError> {
    let Json(req) = body?;
    let conn = ctx.core.open_db()?;
    let pair = auth::login(&conn, &ctx.core.tokens, req.email.trim(), &req.password)?;
    Ok(Json(pair))
}

/// `POST /auth/refresh?refresh_token=...`
pub async fn refresh(
    State(ctx): State<ApiContext>,
    params: Result<Query<RefreshParams>, QueryRejection>,
) -> Result<Json<TokenPair>, ApiError> {
    let Query(params) = params?;
    let conn = ctx.core.open_db()?;
    let pair = auth::refresh(
        &conn,
        &ctx.core.tokens,
        &params.refresh_token,
        ctx.core.settings.revoke_rotated_refresh_tokens,
    )?;
    Ok(Json(pair))
}
