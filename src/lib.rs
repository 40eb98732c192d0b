//! kinocat — movie catalog import service
//!
//! Ingests batch imports of movie records: the raw upload is copied to a
//! blob store, the records are validated and persisted in one SQLite
//! transaction, every attempt is recorded in an append-only audit trail, and
//! committed imports are broadcast to live SSE subscribers.

pub mod api;
pub mod blob;
pub mod config;
pub mod db;
pub mod error;
pub mod import;
pub mod models;
pub mod notify;
pub mod sse;
pub mod validate;

pub use crate::error::{ApiError, ApiResult};

use std::sync::Arc;

use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;

use crate::blob::BlobStore;
use crate::import::ImportOrchestrator;
use crate::notify::NotificationBus;
use crate::sse::SubscriberRegistry;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Blob store holding raw import uploads
    pub blob: Arc<dyn BlobStore>,
    /// Live streaming subscribers
    pub registry: Arc<SubscriberRegistry>,
    /// Import saga coordinator
    pub orchestrator: ImportOrchestrator,
    /// Service startup timestamp for uptime reporting
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        blob: Arc<dyn BlobStore>,
        registry: Arc<SubscriberRegistry>,
    ) -> Self {
        let bus = NotificationBus::new(registry.clone());
        let orchestrator = ImportOrchestrator::new(db.clone(), blob.clone(), bus);
        Self {
            db,
            blob,
            registry,
            orchestrator,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::import_routes())
        .merge(api::sse_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
