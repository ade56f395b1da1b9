use crate::registry::GeofenceRegistry;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info, instrument, warn};

/// Runs a full synchronization pass every `period`, starting one period from now.
#[instrument(skip(registry))]
pub async fn reconciler(registry: Arc<GeofenceRegistry>, period: Duration) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        debug!("🔄 Reconciling regions with the monitor...");
        let report = registry.synchronize_all().await;
        if report.is_unchanged() {
            debug!("🔄 Reconciling regions with the monitor... OK, nothing changed");
        } else {
            info!(
                "🔄 Reconciling regions with the monitor... OK, {} started, {} stopped",
                report.started.len(),
                report.stopped.len()
            );
        }

        for (identifier, warning) in &report.warnings {
            warn!(identifier = identifier.as_str(), "⚠️ Region '{}' is not monitored: {}", identifier, warning);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NewGeoRegion, TriggerOn};
    use crate::monitor::{RegionMonitor, SimulatedMonitor};
    use crate::persistence::MemoryStore;
    use test_log::test;

    #[test(tokio::test(start_paused = true))]
    async fn activates_regions_once_permission_arrives() {
        let monitor = Arc::new(SimulatedMonitor::new(20, 1000.0));
        let registry = Arc::new(GeofenceRegistry::new(Arc::new(MemoryStore::new()), monitor.clone()));
        monitor.set_authorized(false).await;
        registry
            .add(NewGeoRegion {
                identifier: "home".to_string(),
                latitude: 37.0,
                longitude: -122.0,
                radius: 500.0,
                note: "".to_string(),
                trigger_on: TriggerOn::OnEntry,
            })
            .await
            .unwrap();

        let handle = tokio::spawn(reconciler(registry.clone(), Duration::from_secs(60)));
        monitor.set_authorized(true).await;

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(monitor.currently_monitored().await.is_empty());

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert!(monitor.currently_monitored().await.contains("home"));

        handle.abort();
    }
}
