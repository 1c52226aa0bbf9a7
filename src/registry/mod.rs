pub mod sweeper;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use dashmap::mapref::one::RefMut;
use dashmap::try_result::TryResult;
use tokio::sync::watch;
use tracing::debug;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::driver::{Driver, DriverLocation, DriverStatus};

// Attempts against a contended entry before giving up with Busy.
const LOCK_ATTEMPTS: usize = 64;

#[derive(Debug, Clone, Copy)]
pub enum PresenceReason {
    Join,
    Leave,
    Timeout,
    Manual,
}

#[derive(Debug, Clone, Default)]
pub struct NewDriver {
    pub id: Option<Uuid>,
    pub external_id: Option<String>,
    pub name: String,
    pub phone: String,
    pub vehicle_type: String,
    pub vehicle_plate: String,
    pub status: Option<DriverStatus>,
}

/// Authoritative store of driver state. Mutations serialize per driver id
/// (DashMap shard locking); reads clone out of the map so callers never hold
/// internal references. Every successful mutation bumps a revision channel
/// that the broadcast hub subscribes to.
pub struct DriverRegistry {
    drivers: DashMap<Uuid, Driver>,
    external_ids: DashMap<String, Uuid>,
    changes: watch::Sender<u64>,
}

impl DriverRegistry {
    pub fn new() -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            drivers: DashMap::new(),
            external_ids: DashMap::new(),
            changes,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    fn notify(&self) {
        self.changes.send_modify(|rev| *rev += 1);
    }

    pub fn register(&self, new: NewDriver) -> Result<Driver, AppError> {
        let name = new.name.trim();
        if name.is_empty() {
            return Err(AppError::InvalidFields("name cannot be empty".to_string()));
        }

        let id = new.id.unwrap_or_else(Uuid::new_v4);

        // Reserve the external id through the entry lock before touching the
        // driver map, so concurrent registrations for the same external
        // identity cannot both pass a lookup and insert twice.
        if let Some(external_id) = &new.external_id {
            match self.external_ids.entry(external_id.clone()) {
                Entry::Occupied(_) => {
                    return Err(AppError::DuplicateId(format!(
                        "external id {external_id} already registered"
                    )));
                }
                Entry::Vacant(slot) => {
                    slot.insert(id);
                }
            }
        }
        let driver = Driver {
            id,
            external_id: new.external_id.clone(),
            name: name.to_string(),
            phone: new.phone,
            vehicle_type: new.vehicle_type,
            vehicle_plate: new.vehicle_plate,
            status: new.status.unwrap_or(DriverStatus::Pending),
            online: false,
            location: None,
            registered_at: Utc::now(),
        };

        match self.drivers.entry(id) {
            Entry::Occupied(_) => {
                // Roll the reservation back so the external id stays usable.
                if let Some(external_id) = &new.external_id {
                    self.external_ids.remove(external_id);
                }
                return Err(AppError::DuplicateId(format!(
                    "driver {id} already registered"
                )));
            }
            Entry::Vacant(slot) => {
                slot.insert(driver.clone());
            }
        }

        self.notify();
        Ok(driver)
    }

    /// Applies a location report. Location and online flip together, or not
    /// at all: a report older than the stored timestamp is rejected without
    /// touching the record.
    pub fn update_location(
        &self,
        id: &Uuid,
        lat: f64,
        lng: f64,
        bearing: f64,
        recorded_at: DateTime<Utc>,
    ) -> Result<Driver, AppError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(AppError::OutOfRange(format!(
                "latitude {lat} outside [-90, 90]"
            )));
        }
        if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            return Err(AppError::OutOfRange(format!(
                "longitude {lng} outside [-180, 180]"
            )));
        }

        let updated = {
            let mut driver = self.locked(id)?;

            if let Some(location) = &driver.location {
                if recorded_at < location.updated_at {
                    return Err(AppError::StaleReport);
                }
            }

            driver.location = Some(DriverLocation {
                lat,
                lng,
                bearing,
                updated_at: recorded_at,
            });
            driver.online = true;
            driver.clone()
        };

        self.notify();
        Ok(updated)
    }

    /// Flips the online flag. Location history stays in place so a driver
    /// going offline keeps its last known position.
    pub fn set_presence(
        &self,
        id: &Uuid,
        online: bool,
        reason: PresenceReason,
    ) -> Result<Driver, AppError> {
        let updated = {
            let mut driver = self.locked(id)?;
            driver.online = online;
            driver.clone()
        };

        debug!(driver_id = %id, online, ?reason, "presence changed");
        self.notify();
        Ok(updated)
    }

    /// Marks a driver offline only if it is still silent while the entry
    /// lock is held. A report landing between the caller's scan and this
    /// call makes it a no-op, so a fresh driver is never demoted.
    pub fn demote_if_silent(
        &self,
        id: &Uuid,
        now: DateTime<Utc>,
        window: Duration,
    ) -> Result<bool, AppError> {
        {
            let mut driver = self.locked(id)?;

            if !driver.online || now - driver.last_activity() < window {
                return Ok(false);
            }

            driver.online = false;
        }

        debug!(driver_id = %id, online = false, reason = ?PresenceReason::Timeout, "presence changed");
        self.notify();
        Ok(true)
    }

    pub fn set_status(&self, id: &Uuid, status: DriverStatus) -> Result<Driver, AppError> {
        let updated = {
            let mut driver = self.locked(id)?;

            if !driver.status.can_transition_to(status) {
                return Err(AppError::InvalidTransition(format!(
                    "{:?} -> {:?} is not allowed",
                    driver.status, status
                )));
            }

            driver.status = status;
            driver.clone()
        };

        self.notify();
        Ok(updated)
    }

    pub fn get(&self, id: &Uuid) -> Option<Driver> {
        self.drivers.get(id).map(|entry| entry.value().clone())
    }

    pub fn resolve_external(&self, external_id: &str) -> Option<Uuid> {
        self.external_ids
            .get(external_id)
            .map(|entry| *entry.value())
    }

    /// Point-in-time copy of every driver, in registration order.
    pub fn snapshot(&self) -> Vec<Driver> {
        let mut drivers: Vec<Driver> = self
            .drivers
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        sort_by_registration(&mut drivers);
        drivers
    }

    pub fn live_snapshot(&self, window: Duration) -> Vec<Driver> {
        let now = Utc::now();
        let mut drivers: Vec<Driver> = self
            .drivers
            .iter()
            .filter(|entry| entry.value().is_live(now, window))
            .map(|entry| entry.value().clone())
            .collect();
        sort_by_registration(&mut drivers);
        drivers
    }

    pub fn len(&self) -> usize {
        self.drivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }

    fn locked(&self, id: &Uuid) -> Result<RefMut<'_, Uuid, Driver>, AppError> {
        for _ in 0..LOCK_ATTEMPTS {
            match self.drivers.try_get_mut(id) {
                TryResult::Present(driver) => return Ok(driver),
                TryResult::Absent => {
                    return Err(AppError::NotFound(format!("driver {id} not found")));
                }
                TryResult::Locked => std::thread::yield_now(),
            }
        }

        Err(AppError::Busy)
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn sort_by_registration(drivers: &mut [Driver]) {
    drivers.sort_by(|a, b| {
        a.registered_at
            .cmp(&b.registered_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}
