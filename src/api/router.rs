//! HTTP API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//!
//! Protected middleware stack (outermost → innermost):
//! Extension(ApiContext) → Auth → Access log → Handler

use std::sync::Arc;

use axum::http::{header, HeaderValue};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::config::Settings;
use crate::core_state::CoreState;

/// Build the API router.
///
/// Middleware uses `Extension<ApiContext>` (injected as the outermost layer).
/// Endpoint handlers use `State<ApiContext>` (provided via `with_state`).
pub fn api_router(core: Arc<CoreState>) -> Router {
    let cors = cors_layer(&core.settings);
    build_router(ApiContext::new(core)).layer(cors)
}

fn build_router(ctx: ApiContext) -> Router {
    // Auth and access log are route layers: unknown paths fall through to a
    // plain 404 without touching the database.
    //
    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let protected = Router::new()
        .route("/me", get(endpoints::me::me))
        .route(
            "/patients",
            get(endpoints::patients::list).post(endpoints::patients::create),
        )
        .route(
            "/patients/:id",
            get(endpoints::patients::detail)
                .patch(endpoints::patients::update)
                .delete(endpoints::patients::remove),
        )
        .route(
            "/patients/:id/encounters",
            get(endpoints::encounters::list).post(endpoints::encounters::create),
        )
        .route(
            "/patients/:id/encounters/:encounter_id",
            get(endpoints::encounters::detail),
        )
        .route(
            "/appointments",
            get(endpoints::appointments::list).post(endpoints::appointments::create),
        )
        .route(
            "/appointments/:id",
            get(endpoints::appointments::detail)
                .patch(endpoints::appointments::update)
                .delete(endpoints::appointments::remove),
        )
        .with_state(ctx.clone())
        // Middleware stack (innermost first, outermost last):
        .route_layer(axum::middleware::from_fn(middleware::access_log::log_access))
        .route_layer(axum::middleware::from_fn(middleware::auth::require_auth))
        // Extension must be outermost so middleware can extract ApiContext
        .layer(axum::Extension(ctx.clone()));

    let public = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/auth/login", post(endpoints::auth::login))
        .route("/auth/refresh", post(endpoints::auth::refresh))
        .with_state(ctx);

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
}

/// Credentials are allowed, so origins are listed explicitly and methods
/// and headers mirror the preflight request. A `*` entry mirrors any origin.
fn cors_layer(settings: &Settings) -> CorsLayer {
    let origin = if settings.cors_origins.iter().any(|o| o == "*") {
        AllowOrigin::mirror_request()
    } else {
        let origins: Vec<HeaderValue> = settings
            .cors_origins
            .iter()
            .filter_map(|o| match HeaderValue::from_str(o) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %o, "Ignoring unparseable CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}
