/// Static analysis and repository provisioning routes.
mod analyze;

/// Placeholder analysis results route.
mod results;

/// Source file upload route.
mod upload;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::storage::Storage;

/// Create a router that provides an API server with project handling routes.
///
/// Upload request bodies are limited to `upload_limit` bytes.
pub(crate) fn routes(upload_limit: usize) -> Router<Arc<Storage>> {
    Router::new()
        .route(
            "/upload",
            post(upload::upload).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/analyze",
            get(analyze::analyze_query).post(analyze::analyze),
        )
        .route("/results/:project_id", get(results::results))
}
