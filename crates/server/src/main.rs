//! # Code analysis API server
//!
//! Accepts single source files, runs a line-based static scan over them and,
//! when GitHub credentials are configured, provisions a private repository
//! with an analysis workflow for every analyzed project.
//!
//! Uploaded files are stored on disk, see [`storage`] for the layout.

mod cli;
mod handlers;
mod scanner;
mod storage;
mod validation;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use axum::{Extension, Router, Server};
use clap::Parser;
use common::{config::Config, logging};
use storage::Storage;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::cli::Cli;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    let config = Config::new(cli.config)?;

    logging::init(&config);

    info!(path = %config.storage.path.display(), "opening upload storage");
    let storage = Arc::new(Storage::open(&config.storage.path).await?);

    if config.github.credentials().is_none() {
        info!("GitHub credentials are not configured, repository provisioning is disabled");
    }

    let server = Server::bind(&config.server.address);
    let config = Arc::new(config);

    info!(address = %config.server.address, "starting API server");
    server
        .serve(app_router(storage, config).into_make_service())
        .await?;

    Ok(())
}

fn app_router(storage: Arc<Storage>, config: Arc<Config>) -> Router {
    let api_routes = Router::new()
        .merge(handlers::projects::routes(config.server.upload_limit))
        .merge(handlers::health::routes());

    Router::new()
        .nest("/api", api_routes)
        .layer(Extension(config))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(storage)
}
