//! Access logging middleware.
//!
//! Logs every protected request with method, path, status, acting user
//! and latency. Runs innermost (after auth has injected `CurrentUser`).

use std::time::Instant;

use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::auth::CurrentUser;

pub async fn log_access(req: Request<axum::body::Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let user = req
        .extensions()
        .get::<CurrentUser>()
        .map(|u| u.user().email.clone())
        .unwrap_or_else(|| "-".to_string());

    let started = Instant::now();
    let response = next.run(req).await;

    tracing::info!(
        %method,
        path,
        status = response.status().as_u16(),
        user,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "API access"
    );

    response
}
