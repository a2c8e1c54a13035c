//! Request handlers.
//!
//! Each incident handler validates its input, then performs exactly one
//! storage call on the blocking pool.

use super::SharedState;
use super::error::ApiError;
use crate::model::{Incident, ListQuery, NewIncident, StatusUpdate};
use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
};
use serde_json::{Value, json};
use tracing::{debug, info};

pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Hello World" }))
}

pub async fn say_hello(Path(name): Path<String>) -> Json<Value> {
    Json(json!({ "message": format!("Hello {name}") }))
}

/// `POST /incidents`
pub async fn create_incident(
    State(state): State<SharedState>,
    payload: Result<Json<NewIncident>, JsonRejection>,
) -> Result<(StatusCode, Json<Incident>), ApiError> {
    let Json(new) = payload?;
    new.validate()?;

    let incident = state.store.blocking(move |s| s.create(&new)).await?;
    info!(
        id = incident.id,
        status = %incident.status,
        source = %incident.source,
        "Incident created"
    );
    Ok((StatusCode::CREATED, Json(incident)))
}

/// `GET /incidents?status=...`
pub async fn list_incidents(
    State(state): State<SharedState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Vec<Incident>>, ApiError> {
    let Query(ListQuery { status }) = query?;
    let incidents = state.store.blocking(move |s| s.list(status)).await?;
    Ok(Json(incidents))
}

/// `GET /incidents/{id}`
pub async fn get_incident(
    State(state): State<SharedState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Incident>, ApiError> {
    let Path(id) = id?;
    let incident = state.store.blocking(move |s| s.get(id)).await?;
    debug!(id, "Incident fetched");
    Ok(Json(incident))
}

/// `PATCH /incidents/{id}/status`
pub async fn update_incident_status(
    State(state): State<SharedState>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<StatusUpdate>, JsonRejection>,
) -> Result<Json<Incident>, ApiError> {
    let Path(id) = id?;
    let Json(StatusUpdate { status }) = payload?;

    let incident = state
        .store
        .blocking(move |s| s.update_status(id, status))
        .await?;
    info!(id, status = %status, "Incident status updated");
    Ok(Json(incident))
}
