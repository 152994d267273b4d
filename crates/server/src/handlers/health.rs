use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::storage::Storage;

/// JSON response body.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// Create a router that provides an API server with the health check route.
pub(crate) fn routes() -> Router<Arc<Storage>> {
    Router::new().route("/health", get(health))
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "healthy" })
}
