use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::routing::{get, patch, post};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::ingest::admin::{self, RegisterRequest, StatusChangeRequest};
use crate::ingest::location::{self, LocationReport};
use crate::ingest::presence::{self, PresenceEvent};
use crate::models::driver::Driver;
use crate::models::live::{DriverLocationsMessage, LivePosition};
use crate::registry::PresenceReason;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/drivers", post(register_driver).get(list_drivers))
        .route("/drivers/live", get(live_drivers))
        .route("/drivers/:id", get(get_driver))
        .route("/drivers/:id/location", patch(update_location))
        .route("/drivers/:id/status", patch(update_status))
        .route("/drivers/:id/presence", patch(update_presence))
        .route("/presence", post(presence_event))
}

#[derive(Deserialize)]
pub struct PresenceRequest {
    pub online: bool,
}

async fn register_driver(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<Driver>, AppError> {
    admin::register(&state, payload).map(Json)
}

async fn list_drivers(State(state): State<Arc<AppState>>) -> Json<Vec<Driver>> {
    Json(state.registry.snapshot())
}

/// Polling fallback: same shape as the websocket push message.
async fn live_drivers(State(state): State<Arc<AppState>>) -> Json<DriverLocationsMessage> {
    let live = state.registry.live_snapshot(state.freshness_window);
    Json(DriverLocationsMessage::new(&live))
}

async fn get_driver(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Driver>, AppError> {
    state
        .registry
        .get(&id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("driver {id} not found")))
}

async fn update_location(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(report): Json<LocationReport>,
) -> Result<Json<LivePosition>, AppError> {
    let driver = location::apply(&state, id, report)?;

    LivePosition::from_driver(&driver)
        .map(Json)
        .ok_or_else(|| AppError::Internal("accepted report left no location".to_string()))
}

async fn update_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<StatusChangeRequest>,
) -> Result<Json<Driver>, AppError> {
    admin::change_status(&state, id, payload).map(Json)
}

async fn update_presence(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<PresenceRequest>,
) -> Result<Json<Driver>, AppError> {
    state
        .registry
        .set_presence(&id, payload.online, PresenceReason::Manual)
        .map(Json)
}

async fn presence_event(
    State(state): State<Arc<AppState>>,
    Json(event): Json<PresenceEvent>,
) -> Result<Json<Driver>, AppError> {
    presence::apply(&state, event).map(Json)
}
