use crate::domain::{GeoRegion, NewGeoRegion};
use crate::monitor::RegionMonitor;
use crate::persistence::PersistenceStore;
use crate::registry::{Added, LoadReport, MonitoringState, MonitoringWarning, RegistryError, Removed, SyncReport};
use std::sync::Arc;
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, instrument, warn};

pub type RegionSnapshot = Arc<Vec<GeoRegion>>;

/// Owns the canonical, insertion-ordered list of regions and keeps the store and the monitor in line with it.
///
/// Every mutation holds `regions` from the first check until the monitor has been updated, so mutations never
/// interleave. Readers never take that lock: they read the snapshot published after each successful mutation.
#[derive(Debug)]
pub struct GeofenceRegistry {
    store: Arc<dyn PersistenceStore>,
    monitor: Arc<dyn RegionMonitor>,
    regions: Mutex<Vec<GeoRegion>>,
    snapshot_tx: watch::Sender<RegionSnapshot>,
}

impl GeofenceRegistry {
    pub fn new(store: Arc<dyn PersistenceStore>, monitor: Arc<dyn RegionMonitor>) -> Self {
        let (snapshot_tx, _snapshot_rx) = watch::channel::<RegionSnapshot>(Arc::new(Vec::new()));

        GeofenceRegistry {
            store,
            monitor,
            regions: Mutex::new(Vec::new()),
            snapshot_tx,
        }
    }

    /// Replaces the in-memory list with the persisted one. Monitoring is left to `synchronize_all`.
    #[instrument(skip(self))]
    pub async fn initialize(&self) -> Result<LoadReport, RegistryError> {
        let mut regions = self.regions.lock().await;
        info!("📍 Loading regions...");

        let loaded = self.store.load().await?;
        let skipped = loaded.skipped();
        let maximum_regions = self.monitor.maximum_regions();
        let maximum_radius = self.monitor.maximum_radius();

        let mut admitted: Vec<GeoRegion> = Vec::with_capacity(maximum_regions.min(loaded.regions().len()));
        let mut dropped = 0;
        for region in loaded.into_regions() {
            if admitted.iter().any(|existing| existing.identifier() == region.identifier()) {
                warn!(identifier = region.identifier(), "⚠️ Dropping persisted region '{}', duplicate identifier", region.identifier());
                dropped += 1;
            } else if admitted.len() >= maximum_regions {
                warn!(identifier = region.identifier(), "⚠️ Dropping persisted region '{}', capacity of {} reached", region.identifier(), maximum_regions);
                dropped += 1;
            } else {
                admitted.push(region.clamped_to(maximum_radius));
            }
        }

        *regions = admitted;
        self.publish(&regions);

        let report = LoadReport {
            loaded: regions.len(),
            skipped,
            dropped,
        };
        info!("📍 Loading regions... OK, {} loaded, {} skipped, {} dropped", report.loaded, report.skipped, report.dropped);
        Ok(report)
    }

    #[instrument(skip_all, fields(identifier = candidate.identifier.as_str()))]
    pub async fn add(&self, candidate: NewGeoRegion) -> Result<Added, RegistryError> {
        let region = GeoRegion::try_from(candidate)?;
        let mut regions = self.regions.lock().await;

        if regions.iter().any(|existing| existing.identifier() == region.identifier()) {
            return Err(RegistryError::DuplicateIdentifier(region.identifier().to_string()));
        }

        let maximum = self.monitor.maximum_regions();
        if regions.len() >= maximum {
            return Err(RegistryError::CapacityExceeded { maximum });
        }

        let region = region.clamped_to(self.monitor.maximum_radius());
        regions.push(region.clone());

        if let Err(err) = self.store.save(&regions).await {
            regions.pop();
            warn!("⚠️ Adding region '{}'... failed, {}", region.identifier(), err);
            return Err(err.into());
        }
        self.publish(&regions);

        let monitoring_warning = self.synchronize_one(&region).await;
        info!("📍 Added region '{}' ({}), {} of {}", region.identifier(), region.display_subtitle(), regions.len(), maximum);
        Ok(Added::new(region, monitoring_warning))
    }

    #[instrument(skip(self))]
    pub async fn remove(&self, identifier: &str) -> Result<Removed, RegistryError> {
        let mut regions = self.regions.lock().await;

        let Some(index) = regions.iter().position(|region| region.identifier() == identifier) else {
            return Err(RegistryError::NotFound(identifier.to_string()));
        };

        // A leftover registration does less harm than a region that cannot be removed
        let monitoring_warning = match self.monitor.stop_monitoring(identifier).await {
            Ok(()) => None,
            Err(err) => {
                warn!("⚠️ Could not stop monitoring '{}': {}", identifier, err);
                Some(MonitoringWarning::MonitorStopFailed(err))
            }
        };

        let region = regions.remove(index);
        if let Err(err) = self.store.save(&regions).await {
            regions.insert(index, region.clone());
            warn!("⚠️ Removing region '{}'... failed, {}", identifier, err);

            if let Some(warning) = self.synchronize_one(&region).await {
                warn!("⚠️ Region '{}' was kept but is not monitored: {}", identifier, warning);
            }
            return Err(err.into());
        }
        self.publish(&regions);

        info!("📍 Removed region '{}', {} left", identifier, regions.len());
        Ok(Removed::new(region, monitoring_warning))
    }

    /// Starts monitoring every region the monitor does not know about and stops every registration that has no region.
    /// Running it again without an intervening mutation changes nothing.
    #[instrument(skip(self))]
    pub async fn synchronize_all(&self) -> SyncReport {
        let regions = self.regions.lock().await;
        let monitored = self.monitor.currently_monitored().await;
        let mut report = SyncReport::default();

        let mut stale = monitored
            .iter()
            .filter(|identifier| !regions.iter().any(|region| region.identifier() == identifier.as_str()))
            .cloned()
            .collect::<Vec<_>>();
        stale.sort();

        // Stale registrations go first as they take up monitor slots
        for identifier in stale {
            match self.monitor.stop_monitoring(&identifier).await {
                Ok(()) => report.stopped.push(identifier),
                Err(err) => report.warnings.push((identifier, MonitoringWarning::MonitorStopFailed(err))),
            }
        }

        for region in regions.iter().filter(|region| !monitored.contains(region.identifier())) {
            match self.synchronize_one(region).await {
                None => report.started.push(region.identifier().to_string()),
                Some(warning) => report.warnings.push((region.identifier().to_string(), warning)),
            }
        }

        debug!(
            started = report.started.len(),
            stopped = report.stopped.len(),
            warnings = report.warnings.len(),
            "🔄 Synchronized {} region(s)",
            regions.len()
        );
        report
    }

    async fn synchronize_one(&self, region: &GeoRegion) -> Option<MonitoringWarning> {
        if !self.monitor.is_available().await {
            warn!(identifier = region.identifier(), "⚠️ Geofencing is not supported on this device");
            return Some(MonitoringWarning::DeviceUnsupported);
        }

        if !self.monitor.authorization_granted().await {
            warn!(identifier = region.identifier(), "⚠️ Region '{}' is saved but location access is not granted", region.identifier());
            return Some(MonitoringWarning::PermissionNotGranted);
        }

        match self.monitor.start_monitoring(region).await {
            Ok(()) => None,
            Err(err) => {
                warn!(identifier = region.identifier(), "⚠️ Could not start monitoring '{}': {}", region.identifier(), err);
                Some(MonitoringWarning::MonitorStartFailed(err))
            }
        }
    }

    fn publish(&self, regions: &[GeoRegion]) {
        self.snapshot_tx.send_replace(Arc::new(regions.to_vec()));
    }

    /// Snapshot of all regions in insertion order.
    pub fn list(&self) -> RegionSnapshot {
        self.snapshot_tx.borrow().clone()
    }

    pub fn count(&self) -> usize {
        self.snapshot_tx.borrow().len()
    }

    pub fn capacity(&self) -> usize {
        self.monitor.maximum_regions()
    }

    /// When true, the next `add` would be rejected with `CapacityExceeded`.
    pub fn is_full(&self) -> bool {
        self.count() >= self.capacity()
    }

    pub fn subscribe(&self) -> watch::Receiver<RegionSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Every region of the current snapshot paired with whether the monitor is watching it.
    pub async fn monitoring_states(&self) -> Vec<(GeoRegion, MonitoringState)> {
        let regions = self.list();
        let monitored = self.monitor.currently_monitored().await;

        regions
            .iter()
            .map(|region| {
                let state = if monitored.contains(region.identifier()) {
                    MonitoringState::Monitored
                } else {
                    MonitoringState::Unmonitored
                };
                (region.clone(), state)
            })
            .collect()
    }
}

#[cfg(test)]
impl GeofenceRegistry {
    pub async fn monitoring_state(&self, identifier: &str) -> Option<MonitoringState> {
        self.monitoring_states()
            .await
            .into_iter()
            .find(|(region, _)| region.identifier() == identifier)
            .map(|(_, state)| state)
    }
}
