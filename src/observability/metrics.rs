use prometheus::{
    Encoder, Histogram, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub location_updates_total: IntCounterVec,
    pub stale_demotions_total: IntCounter,
    pub broadcasts_total: IntCounter,
    pub live_drivers: IntGauge,
    pub connected_viewers: IntGauge,
    pub snapshot_compose_seconds: Histogram,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let location_updates_total = IntCounterVec::new(
            Opts::new("location_updates_total", "Location reports by outcome"),
            &["outcome"],
        )
        .expect("valid location_updates_total metric");

        let stale_demotions_total = IntCounter::new(
            "stale_demotions_total",
            "Drivers marked offline by the staleness sweeper",
        )
        .expect("valid stale_demotions_total metric");

        let broadcasts_total = IntCounter::new(
            "broadcasts_total",
            "Live snapshots fanned out to viewers",
        )
        .expect("valid broadcasts_total metric");

        let live_drivers = IntGauge::new("live_drivers", "Drivers currently live")
            .expect("valid live_drivers metric");

        let connected_viewers =
            IntGauge::new("connected_viewers", "Currently connected websocket viewers")
                .expect("valid connected_viewers metric");

        let snapshot_compose_seconds = Histogram::with_opts(prometheus::HistogramOpts::new(
            "snapshot_compose_seconds",
            "Time to compose and fan out one live snapshot",
        ))
        .expect("valid snapshot_compose_seconds metric");

        registry
            .register(Box::new(location_updates_total.clone()))
            .expect("register location_updates_total");
        registry
            .register(Box::new(stale_demotions_total.clone()))
            .expect("register stale_demotions_total");
        registry
            .register(Box::new(broadcasts_total.clone()))
            .expect("register broadcasts_total");
        registry
            .register(Box::new(live_drivers.clone()))
            .expect("register live_drivers");
        registry
            .register(Box::new(connected_viewers.clone()))
            .expect("register connected_viewers");
        registry
            .register(Box::new(snapshot_compose_seconds.clone()))
            .expect("register snapshot_compose_seconds");

        Self {
            registry,
            location_updates_total,
            stale_demotions_total,
            broadcasts_total,
            live_drivers,
            connected_viewers,
            snapshot_compose_seconds,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
