use std::time::Duration as StdDuration;

use chrono::Duration;

use crate::config::Config;
use crate::hub::BroadcastHub;
use crate::observability::metrics::Metrics;
use crate::registry::DriverRegistry;

pub struct AppState {
    pub registry: DriverRegistry,
    pub hub: BroadcastHub,
    pub metrics: Metrics,
    pub freshness_window: Duration,
    pub sweep_interval: StdDuration,
    pub ws_send_timeout: StdDuration,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            registry: DriverRegistry::new(),
            hub: BroadcastHub::new(),
            metrics: Metrics::new(),
            freshness_window: Duration::seconds(config.freshness_window_secs as i64),
            sweep_interval: StdDuration::from_secs(config.sweep_interval_secs),
            ws_send_timeout: StdDuration::from_millis(config.ws_send_timeout_ms),
        }
    }
}
