//! # Incidents Core
//!
//! Core library for the incidents service: the incident model and its
//! request payloads, the SQLite store, the axum HTTP API, configuration,
//! and process bootstrap.

pub mod api;
pub mod config;
pub mod error;
pub mod model;
pub mod server;
pub mod store;

// Re-export commonly used types at the crate root.
pub use api::{ApiError, AppState, SharedState, router};
pub use config::{ConfigOverrides, ServerConfig, load_config};
pub use error::{ConfigError, IncidentsError, Result, StoreError, ValidationError};
pub use model::{Incident, IncidentStatus, ListQuery, NewIncident, StatusUpdate};
pub use store::IncidentStore;
