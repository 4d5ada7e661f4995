//! hearth-server library
//!
//! Family board service: profiles, calendar events, tasks, notes, memories and
//! announcements, plus WhatsApp/SMS reminders driven by an external scheduler.

use axum::extract::DefaultBodyLimit;
use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod services;

pub use config::HearthConfig;
pub use error::{ApiError, ApiResult};

use services::photo_store::PHOTOS_URL_PREFIX;
use services::{MessagingGateway, PhotoStore, QuoteService};

/// Largest request body accepted; photo handlers apply their own tighter limits
const REQUEST_BODY_LIMIT: usize = 8 * 1024 * 1024;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Outbound WhatsApp/SMS gateway
    pub gateway: Arc<dyn MessagingGateway>,
    /// Daily quote chain for the good-morning run
    pub quotes: Arc<QuoteService>,
    /// Uploaded photo storage
    pub photos: PhotoStore,
    pub config: Arc<HearthConfig>,
    /// Service start time, for uptime reporting
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        gateway: Arc<dyn MessagingGateway>,
        quotes: Arc<QuoteService>,
        photos: PhotoStore,
        config: HearthConfig,
    ) -> Self {
        Self {
            db,
            gateway,
            quotes,
            photos,
            config: Arc::new(config),
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
///
/// Session-protected routes sit behind [`auth::auth_middleware`]. Health, signup,
/// login and the scheduler triggers are public; the triggers check the shared
/// secret themselves.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;

    let protected = Router::new()
        .merge(api::auth::session_routes())
        .merge(api::profiles::profile_routes())
        .merge(api::events::event_routes())
        .merge(api::tasks::task_routes())
        .merge(api::notes::note_routes())
        .merge(api::memories::memory_routes())
        .merge(api::announcements::announcement_routes())
        .merge(api::settings::settings_routes())
        .merge(api::notifications::manual_send_routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ));

    let public = Router::new()
        .merge(api::health_routes())
        .merge(api::auth::account_routes())
        .merge(api::notifications::trigger_routes());

    let photos = ServeDir::new(state.photos.root());

    Router::new()
        .merge(protected)
        .merge(public)
        .nest_service(PHOTOS_URL_PREFIX, photos)
        .layer(DefaultBodyLimit::max(REQUEST_BODY_LIMIT))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
