//! Bearer token authentication middleware.
//!
//! Extracts `Authorization: Bearer <token>`, validates it as an access
//! token, resolves the active user and injects `CurrentUser` into request
//! extensions for downstream handlers.

use axum::http::{header, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::auth;

/// Require a valid access token from an active user.
///
/// Accesses `ApiContext` from request extensions (injected by Extension layer).
pub async fn require_auth(req: Request<axum::body::Body>, next: Next) -> Response {
    match require_auth_inner(req, next).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

async fn require_auth_inner(
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx: ApiContext = req
        .extensions()
        .get::<ApiContext>()
        .cloned()
        .ok_or(ApiError::Internal("missing API context".into()))?;

    let token = bearer_token(&req).ok_or(ApiError::Unauthorized)?.to_string();

    let current = {
        let conn = ctx.core.open_db()?;
        auth::authenticate(&conn, &ctx.core.tokens, &token)?
    }; // Connection dropped here, before any .await

    req.extensions_mut().insert(current);
    Ok(next.run(req).await)
}

fn bearer_token<B>(req: &Request<B>) -> Option<&str> {
    let value = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
