pub mod health;
pub mod jobs;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree covered by the request timeout.
///
/// ```text
/// /jobs/{key}/start                                queue tracked run (POST)
/// /jobs/{key}/status                               progress record (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/jobs", jobs::router())
}

/// Build the `/api/v1` routes that run a whole job inside the request.
///
/// ```text
/// /jobs/{key}/start-sync                           inline run (POST)
/// ```
pub fn inline_routes() -> Router<AppState> {
    Router::new().nest("/jobs", jobs::inline_router())
}
