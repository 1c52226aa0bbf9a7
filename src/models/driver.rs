use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DriverStatus {
    Pending,
    Active,
    Suspended,
    Inactive,
}

impl DriverStatus {
    /// Transition policy: suspended drivers re-enter through pending,
    /// inactive drivers can only be re-activated via pending. Same-state
    /// transitions are idempotent no-ops.
    pub fn can_transition_to(self, next: DriverStatus) -> bool {
        use DriverStatus::*;

        if self == next {
            return true;
        }

        matches!(
            (self, next),
            (Pending, Active)
                | (Pending, Suspended)
                | (Pending, Inactive)
                | (Active, Suspended)
                | (Active, Inactive)
                | (Suspended, Pending)
                | (Suspended, Inactive)
                | (Inactive, Pending)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverLocation {
    pub lat: f64,
    pub lng: f64,
    pub bearing: f64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Driver {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    pub name: String,
    pub phone: String,
    pub vehicle_type: String,
    pub vehicle_plate: String,
    pub status: DriverStatus,
    pub online: bool,
    pub location: Option<DriverLocation>,
    pub registered_at: DateTime<Utc>,
}

impl Driver {
    /// Live means online and reporting within the freshness window. A driver
    /// that never sent a location is not live no matter how recently it joined.
    pub fn is_live(&self, now: DateTime<Utc>, window: Duration) -> bool {
        self.online
            && self
                .location
                .as_ref()
                .is_some_and(|loc| now - loc.updated_at < window)
    }

    /// Last moment the driver was heard from, for staleness decisions.
    pub fn last_activity(&self) -> DateTime<Utc> {
        self.location
            .as_ref()
            .map(|loc| loc.updated_at)
            .unwrap_or(self.registered_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn driver(online: bool, location: Option<DriverLocation>) -> Driver {
        Driver {
            id: Uuid::from_u128(1),
            external_id: None,
            name: "test-driver".to_string(),
            phone: String::new(),
            vehicle_type: String::new(),
            vehicle_plate: String::new(),
            status: DriverStatus::Pending,
            online,
            location,
            registered_at: Utc::now(),
        }
    }

    #[test]
    fn driver_without_location_is_not_live() {
        let d = driver(true, None);
        assert!(!d.is_live(Utc::now(), Duration::seconds(30)));
    }

    #[test]
    fn offline_driver_with_fresh_location_is_not_live() {
        let now = Utc::now();
        let d = driver(
            false,
            Some(DriverLocation {
                lat: 1.0,
                lng: 2.0,
                bearing: 0.0,
                updated_at: now,
            }),
        );
        assert!(!d.is_live(now, Duration::seconds(30)));
    }

    #[test]
    fn fresh_online_driver_is_live_until_window_elapses() {
        let now = Utc::now();
        let d = driver(
            true,
            Some(DriverLocation {
                lat: 1.0,
                lng: 2.0,
                bearing: 0.0,
                updated_at: now,
            }),
        );
        assert!(d.is_live(now, Duration::seconds(30)));
        assert!(!d.is_live(now + Duration::seconds(30), Duration::seconds(30)));
    }

    #[test]
    fn suspended_cannot_go_directly_active() {
        assert!(!DriverStatus::Suspended.can_transition_to(DriverStatus::Active));
        assert!(DriverStatus::Suspended.can_transition_to(DriverStatus::Pending));
        assert!(DriverStatus::Pending.can_transition_to(DriverStatus::Active));
    }

    #[test]
    fn inactive_only_reenters_via_pending() {
        assert!(DriverStatus::Inactive.can_transition_to(DriverStatus::Pending));
        assert!(!DriverStatus::Inactive.can_transition_to(DriverStatus::Active));
        assert!(!DriverStatus::Inactive.can_transition_to(DriverStatus::Suspended));
    }

    #[test]
    fn same_state_transition_is_allowed() {
        assert!(DriverStatus::Inactive.can_transition_to(DriverStatus::Inactive));
    }
}
