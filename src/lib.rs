//! Report backend library.
//!
//! A small content-management backend for activity reports: a JSON-file
//! backed post store, a REST API over it, and an offline static page
//! generator.
//!
//! ## Modules
//!
//! - `api`: HTTP handlers
//! - `config`: Service configuration
//! - `error`: Error types
//! - `models`: Data models
//! - `render`: Markdown and template rendering
//! - `store`: Post collection storage

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod render;
pub mod store;

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::store::PostStore;

pub use error::{AppError, Result};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<PostStore>,
    pub config: Config,
}

/// Build the application router with every route and layer attached.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api::routes())
        .nest_service("/img", ServeDir::new(&state.config.storage.uploads_dir))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
