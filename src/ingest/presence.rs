use serde::Deserialize;

use crate::error::AppError;
use crate::models::driver::{Driver, DriverStatus};
use crate::registry::{NewDriver, PresenceReason};
use crate::state::AppState;

/// Normalized group-membership event from the upstream chat relay, keyed by
/// the external identity of the member.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceEvent {
    pub external_id: String,
    pub event: PresenceKind,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub vehicle_type: Option<String>,
    pub vehicle_plate: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PresenceKind {
    Joined,
    Left,
}

pub fn apply(state: &AppState, event: PresenceEvent) -> Result<Driver, AppError> {
    match state.registry.resolve_external(&event.external_id) {
        Some(id) => match event.event {
            PresenceKind::Joined => {
                let driver = state.registry.set_presence(&id, true, PresenceReason::Join)?;
                // A rejoin of a driver that was retired re-enters the pipeline.
                if driver.status == DriverStatus::Inactive {
                    return state.registry.set_status(&id, DriverStatus::Pending);
                }
                Ok(driver)
            }
            PresenceKind::Left => {
                state
                    .registry
                    .set_presence(&id, false, PresenceReason::Leave)?;
                state.registry.set_status(&id, DriverStatus::Inactive)
            }
        },
        None => match event.event {
            PresenceKind::Joined => {
                let name = event
                    .name
                    .filter(|name| !name.trim().is_empty())
                    .ok_or_else(|| {
                        AppError::InvalidFields("join event missing member name".to_string())
                    })?;

                let driver = state.registry.register(NewDriver {
                    id: None,
                    external_id: Some(event.external_id),
                    name,
                    phone: event.phone.unwrap_or_default(),
                    vehicle_type: event.vehicle_type.unwrap_or_default(),
                    vehicle_plate: event.vehicle_plate.unwrap_or_default(),
                    status: None,
                })?;
                state
                    .registry
                    .set_presence(&driver.id, true, PresenceReason::Join)
            }
            PresenceKind::Left => Err(AppError::NotFound(format!(
                "no driver registered for external id {}",
                event.external_id
            ))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn test_state() -> AppState {
        AppState::new(&Config {
            http_port: 0,
            log_level: "info".to_string(),
            sweep_interval_secs: 5,
            freshness_window_secs: 30,
            ws_send_timeout_ms: 5000,
        })
    }

    fn join(external_id: &str, name: Option<&str>) -> PresenceEvent {
        PresenceEvent {
            external_id: external_id.to_string(),
            event: PresenceKind::Joined,
            name: name.map(str::to_string),
            phone: None,
            vehicle_type: None,
            vehicle_plate: None,
        }
    }

    fn leave(external_id: &str) -> PresenceEvent {
        PresenceEvent {
            external_id: external_id.to_string(),
            event: PresenceKind::Left,
            name: None,
            phone: None,
            vehicle_type: None,
            vehicle_plate: None,
        }
    }

    #[test]
    fn first_join_registers_and_marks_online() {
        let state = test_state();
        let driver = apply(&state, join("tg-1", Some("Ada"))).unwrap();

        assert!(driver.online);
        assert_eq!(driver.status, DriverStatus::Pending);
        assert_eq!(driver.external_id.as_deref(), Some("tg-1"));
    }

    #[test]
    fn join_without_name_is_rejected_without_registering() {
        let state = test_state();
        let result = apply(&state, join("tg-1", None));

        assert!(matches!(result, Err(AppError::InvalidFields(_))));
        assert!(state.registry.is_empty());
    }

    #[test]
    fn leave_marks_offline_and_inactive_but_keeps_record() {
        let state = test_state();
        let driver = apply(&state, join("tg-1", Some("Ada"))).unwrap();

        let left = apply(&state, leave("tg-1")).unwrap();
        assert!(!left.online);
        assert_eq!(left.status, DriverStatus::Inactive);
        assert!(state.registry.get(&driver.id).is_some());
    }

    #[test]
    fn rejoin_after_leave_reenters_pending() {
        let state = test_state();
        apply(&state, join("tg-1", Some("Ada"))).unwrap();
        apply(&state, leave("tg-1")).unwrap();

        let rejoined = apply(&state, join("tg-1", None)).unwrap();
        assert!(state
            .registry
            .get(&rejoined.id)
            .unwrap()
            .online);
        assert_eq!(rejoined.status, DriverStatus::Pending);
        assert_eq!(state.registry.len(), 1);
    }

    #[test]
    fn leave_for_unknown_member_is_not_found() {
        let state = test_state();
        assert!(matches!(
            apply(&state, leave("tg-404")),
            Err(AppError::NotFound(_))
        ));
    }
}
