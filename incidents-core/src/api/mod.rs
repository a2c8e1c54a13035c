//! # HTTP API
//!
//! JSON endpoints for creating, listing, fetching and re-labelling
//! incidents, plus two greeting routes.

mod error;
mod handlers;

pub use error::ApiError;

use crate::store::IncidentStore;
use axum::{
    Router,
    routing::{get, patch},
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared state handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub store: IncidentStore,
}

impl AppState {
    pub fn new(store: IncidentStore) -> Self {
        Self { store }
    }
}

/// Thread-safe shared state reference for axum handlers.
pub type SharedState = Arc<AppState>;

/// Build the service router.
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/hello/{name}", get(handlers::say_hello))
        .route(
            "/incidents",
            get(handlers::list_incidents).post(handlers::create_incident),
        )
        .route("/incidents/{id}", get(handlers::get_incident))
        .route(
            "/incidents/{id}/status",
            patch(handlers::update_incident_status),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
