use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::driver::Driver;
use crate::state::AppState;

/// One GPS report, regardless of source (chat relay share, device push,
/// manual API call). `timestamp` is the time the source generated the fix;
/// it defaults to receive time only when the source cannot supply one.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationReport {
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub bearing: f64,
    pub timestamp: Option<DateTime<Utc>>,
}

pub fn apply(state: &AppState, id: Uuid, report: LocationReport) -> Result<Driver, AppError> {
    let recorded_at = report.timestamp.unwrap_or_else(Utc::now);

    let result =
        state
            .registry
            .update_location(&id, report.lat, report.lng, report.bearing, recorded_at);

    let outcome = match &result {
        Ok(_) => "accepted",
        Err(AppError::StaleReport) => "stale",
        Err(_) => "rejected",
    };
    state
        .metrics
        .location_updates_total
        .with_label_values(&[outcome])
        .inc();

    result
}
