use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use tokio::sync::watch;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::live::DriverLocationsMessage;
use crate::state::AppState;

/// Fan-out of live snapshots to connected viewers. Each connection owns a
/// watch channel: a capacity-1 queue holding only the latest pending
/// snapshot, so an unsent snapshot is superseded rather than accumulated and
/// a slow viewer can skip snapshots but never observes one out of order.
pub struct BroadcastHub {
    connections: DashMap<Uuid, watch::Sender<DriverLocationsMessage>>,
}

impl BroadcastHub {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
        }
    }

    /// Registers a viewer, seeded with the current snapshot so it does not
    /// have to wait for the next registry change.
    pub fn connect(
        &self,
        initial: DriverLocationsMessage,
    ) -> (Uuid, watch::Receiver<DriverLocationsMessage>) {
        let id = Uuid::new_v4();
        let (tx, rx) = watch::channel(initial);
        self.connections.insert(id, tx);
        (id, rx)
    }

    pub fn disconnect(&self, id: &Uuid) {
        self.connections.remove(id);
    }

    /// Replaces every viewer's pending snapshot with the latest one and
    /// prunes connections whose receiver side is gone. Never blocks on a
    /// viewer.
    pub fn publish(&self, message: &DriverLocationsMessage) {
        self.connections.retain(|_, tx| {
            if tx.is_closed() {
                return false;
            }
            tx.send_replace(message.clone());
            true
        });
    }

    pub fn viewer_count(&self) -> usize {
        self.connections.len()
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new()
    }
}

/// Composes one fresh snapshot per registry change notification and fans it
/// out. Bursts of changes while a snapshot is being composed coalesce into a
/// single wake-up of the revision channel.
pub async fn run_broadcast_hub(state: Arc<AppState>) {
    let mut changes = state.registry.subscribe();

    info!("broadcast hub started");

    while changes.changed().await.is_ok() {
        let start = Instant::now();

        let live = state.registry.live_snapshot(state.freshness_window);
        state.metrics.live_drivers.set(live.len() as i64);

        let message = DriverLocationsMessage::new(&live);
        state.hub.publish(&message);

        state.metrics.broadcasts_total.inc();
        state
            .metrics
            .snapshot_compose_seconds
            .observe(start.elapsed().as_secs_f64());
    }

    warn!("broadcast hub stopped: registry change channel closed");
}
