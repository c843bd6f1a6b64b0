//! HTTP API route definitions.

use std::time::Duration;

use axum::{
    extract::Request,
    handler::Handler,
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, MethodRouter},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::warn;

use super::handlers::{health, list_providers, method_not_allowed, status, AppState};

/// Budget for reading a request and writing its response.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Largest accepted total size of request header names and values.
pub const MAX_HEADER_BYTES: usize = 1 << 20;

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health endpoint
        .route("/health", get_only(health))
        // API v1 endpoints
        .route("/api/v1/providers", get_only(list_providers))
        .route("/api/v1/status", get_only(status))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
                .layer(middleware::from_fn(limit_header_size)),
        )
        .with_state(state)
}

/// Route GET to `handler` and answer every other method, HEAD included, with 405.
fn get_only<H, T>(handler: H) -> MethodRouter<AppState>
where
    H: Handler<T, AppState>,
    T: 'static,
{
    get(handler)
        .head(method_not_allowed)
        .fallback(method_not_allowed)
}

async fn limit_header_size(request: Request, next: Next) -> Response {
    let size: usize = request
        .headers()
        .iter()
        .map(|(name, value)| name.as_str().len() + value.len())
        .sum();

    if size > MAX_HEADER_BYTES {
        warn!(size, limit = MAX_HEADER_BYTES, "Rejecting oversized request headers");
        return (
            StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE,
            "Request header fields too large\n",
        )
            .into_response();
    }

    next.run(request).await
}
