//! Bundlehub storefront library.
//!
//! The JSON API server as a library, so the router can be built in tests
//! and the services reused by the CLI.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod paystack;
pub mod routes;
pub mod services;
pub mod state;
pub mod vendor;

use axum::Router;
use axum::http::{HeaderName, HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tower_sessions::{SessionManagerLayer, SessionStore};
use tracing::Span;

use crate::middleware::request_id::REQUEST_ID_HEADER;
use crate::state::AppState;

/// Build the full application router.
///
/// `rate_limit` puts the governor layers on `/api/auth` and `/api/shop`.
/// They key on the client address, so the server must be started with
/// `into_make_service_with_connect_info`; tests pass `false`.
pub fn app<S>(state: AppState, sessions: SessionManagerLayer<S>, rate_limit: bool) -> Router
where
    S: SessionStore + Clone,
{
    let (auth, shop) = if rate_limit {
        (
            routes::auth_routes().layer(middleware::auth_rate_limiter()),
            routes::shop_routes().layer(middleware::shop_rate_limiter()),
        )
    } else {
        (routes::auth_routes(), routes::shop_routes())
    };

    let cors = cors_layer(&state.config().cors_allowed_origins);

    let router = routes::routes()
        .nest("/api/auth", auth)
        .nest("/api/shop", shop)
        .layer(sessions);

    let router = match cors {
        Some(cors) => router.layer(cors),
        None => router,
    };

    router
        .layer(axum::middleware::from_fn(
            middleware::request_id_middleware,
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}

/// CORS for the configured browser origins; none configured means
/// same-origin only.
fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    if origins.is_empty() {
        return None;
    }

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
            .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(REQUEST_ID_HEADER)])
            .expose_headers([HeaderName::from_static(REQUEST_ID_HEADER)])
            .allow_credentials(true),
    )
}
