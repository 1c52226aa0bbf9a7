use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::driver::Driver;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LivePosition {
    pub id: Uuid,
    pub lat: f64,
    pub lng: f64,
    pub bearing: f64,
    pub last_updated: DateTime<Utc>,
}

impl LivePosition {
    pub fn from_driver(driver: &Driver) -> Option<Self> {
        driver.location.as_ref().map(|loc| Self {
            id: driver.id,
            lat: loc.lat,
            lng: loc.lng,
            bearing: loc.bearing,
            last_updated: loc.updated_at,
        })
    }
}

/// Wire message pushed to every viewer and returned by the polling fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverLocationsMessage {
    #[serde(rename = "type")]
    pub kind: String,
    pub data: Vec<LivePosition>,
}

impl DriverLocationsMessage {
    pub fn new(drivers: &[Driver]) -> Self {
        Self {
            kind: "driver_locations".to_string(),
            data: drivers.iter().filter_map(LivePosition::from_driver).collect(),
        }
    }
}
