use std::sync::Arc;

use chrono::Utc;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::state::AppState;

/// Demotes drivers that went silent: online but with no report inside the
/// freshness window. Turns silent disappearance into an observable presence
/// change; never touches `status`.
pub async fn run_staleness_sweeper(state: Arc<AppState>) {
    let mut ticker = tokio::time::interval(state.sweep_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(
        interval_secs = state.sweep_interval.as_secs_f64(),
        "staleness sweeper started"
    );

    loop {
        ticker.tick().await;

        let now = Utc::now();
        let silent: Vec<_> = state
            .registry
            .snapshot()
            .into_iter()
            .filter(|driver| {
                driver.online && now - driver.last_activity() >= state.freshness_window
            })
            .map(|driver| driver.id)
            .collect();

        for id in silent {
            // Silence is re-checked under the entry lock: a report that
            // landed since the scan turns the demotion into a no-op.
            match state
                .registry
                .demote_if_silent(&id, now, state.freshness_window)
            {
                Ok(true) => {
                    state.metrics.stale_demotions_total.inc();
                    info!(driver_id = %id, "driver marked offline after silence");
                }
                Ok(false) => {}
                Err(err) => {
                    warn!(driver_id = %id, error = %err, "failed to demote silent driver");
                }
            }
        }
    }
}
