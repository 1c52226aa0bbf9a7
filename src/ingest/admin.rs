use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::driver::{Driver, DriverStatus};
use crate::registry::NewDriver;
use crate::state::AppState;

/// Manual registration via the API. An explicit `id` or `status` override is
/// allowed for migrations from the upstream system.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub id: Option<Uuid>,
    pub external_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub vehicle_type: String,
    #[serde(default)]
    pub vehicle_plate: String,
    pub status: Option<DriverStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusChangeRequest {
    pub status: DriverStatus,
}

pub fn register(state: &AppState, request: RegisterRequest) -> Result<Driver, AppError> {
    state.registry.register(NewDriver {
        id: request.id,
        external_id: request.external_id,
        name: request.name,
        phone: request.phone,
        vehicle_type: request.vehicle_type,
        vehicle_plate: request.vehicle_plate,
        status: request.status,
    })
}

pub fn change_status(
    state: &AppState,
    id: Uuid,
    request: StatusChangeRequest,
) -> Result<Driver, AppError> {
    state.registry.set_status(&id, request.status)
}
