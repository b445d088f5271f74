// Gatehouse library
// Decision: Shared library for the server binary and the flow tests - the
// router builder lives here so tests can drive the real application

pub mod auth;
pub mod mail;
pub mod session;
pub mod storage;

use axum::{routing::get, Json, Router};
use serde::Serialize;

use auth::AuthState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Build the application router.
pub fn app(state: AuthState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(auth::routes(state))
}
