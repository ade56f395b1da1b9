use crate::app_config::Monitor;
use crate::domain::GeoRegion;
use crate::monitor::{AuthorizationStatus, LocationPermission, MonitorError, RegionMonitor};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

/// In-process stand-in for the platform region monitor. It enforces the same limits a device would.
#[derive(Debug)]
pub struct SimulatedMonitor {
    maximum_regions: usize,
    maximum_radius: f64,
    grant_on_request: bool,
    state: Mutex<MonitorState>,
}

#[derive(Debug, Default)]
struct MonitorState {
    available: bool,
    authorized: bool,
    monitored: HashMap<String, GeoRegion>,
    rejected_starts: HashMap<String, String>,
    rejected_stops: HashMap<String, String>,
}

impl SimulatedMonitor {
    pub fn from_config(config: &Monitor) -> Self {
        SimulatedMonitor {
            maximum_regions: config.maximum_regions(),
            maximum_radius: config.maximum_radius(),
            grant_on_request: config.grant_on_request(),
            state: Mutex::new(MonitorState {
                available: config.available(),
                authorized: config.authorized(),
                ..MonitorState::default()
            }),
        }
    }
}

#[cfg(test)]
impl SimulatedMonitor {
    pub fn new(maximum_regions: usize, maximum_radius: f64) -> Self {
        SimulatedMonitor {
            maximum_regions,
            maximum_radius,
            grant_on_request: true,
            state: Mutex::new(MonitorState {
                available: true,
                authorized: true,
                ..MonitorState::default()
            }),
        }
    }

    pub async fn set_available(&self, available: bool) {
        self.state.lock().await.available = available;
    }

    pub async fn set_authorized(&self, authorized: bool) {
        self.state.lock().await.authorized = authorized;
    }

    pub async fn reject_start_of(&self, identifier: &str, reason: &str) {
        self.state.lock().await.rejected_starts.insert(identifier.to_string(), reason.to_string());
    }

    pub async fn reject_stop_of(&self, identifier: &str, reason: &str) {
        self.state.lock().await.rejected_stops.insert(identifier.to_string(), reason.to_string());
    }

    /// Registers a region behind the registry's back, like a leftover from an earlier run.
    pub async fn register_directly(&self, region: GeoRegion) {
        self.state.lock().await.monitored.insert(region.identifier().to_string(), region);
    }

    pub async fn monitored_region(&self, identifier: &str) -> Option<GeoRegion> {
        self.state.lock().await.monitored.get(identifier).cloned()
    }
}

#[async_trait]
impl RegionMonitor for SimulatedMonitor {
    async fn is_available(&self) -> bool {
        self.state.lock().await.available
    }

    async fn authorization_granted(&self) -> bool {
        self.state.lock().await.authorized
    }

    fn maximum_regions(&self) -> usize {
        self.maximum_regions
    }

    fn maximum_radius(&self) -> f64 {
        self.maximum_radius
    }

    #[instrument(skip_all, fields(identifier = region.identifier()))]
    async fn start_monitoring(&self, region: &GeoRegion) -> Result<(), MonitorError> {
        let mut state = self.state.lock().await;

        if !state.available {
            return Err(MonitorError::Unavailable);
        }

        if !state.authorized {
            return Err(MonitorError::NotAuthorized);
        }

        if let Some(reason) = state.rejected_starts.get(region.identifier()) {
            return Err(MonitorError::Rejected(reason.clone()));
        }

        if region.radius() > self.maximum_radius {
            return Err(MonitorError::RadiusTooLarge {
                radius: region.radius(),
                maximum: self.maximum_radius,
            });
        }

        // Starting an identifier that is already monitored replaces its registration
        if !state.monitored.contains_key(region.identifier()) && state.monitored.len() >= self.maximum_regions {
            return Err(MonitorError::CapacityReached {
                maximum: self.maximum_regions,
            });
        }

        state.monitored.insert(region.identifier().to_string(), region.clone());
        debug!(
            notify_on_entry = region.trigger_on().notify_on_entry(),
            notify_on_exit = region.trigger_on().notify_on_exit(),
            "📡 Monitoring '{}' ({})",
            region.identifier(),
            region.display_subtitle()
        );
        Ok(())
    }

    #[instrument(skip(self))]
    async fn stop_monitoring(&self, identifier: &str) -> Result<(), MonitorError> {
        let mut state = self.state.lock().await;

        if let Some(reason) = state.rejected_stops.get(identifier) {
            return Err(MonitorError::Rejected(reason.clone()));
        }

        if state.monitored.remove(identifier).is_some() {
            debug!("📡 Stopped monitoring '{}'", identifier);
        }
        Ok(())
    }

    async fn currently_monitored(&self) -> HashSet<String> {
        self.state.lock().await.monitored.keys().cloned().collect()
    }
}

#[async_trait]
impl LocationPermission for SimulatedMonitor {
    #[instrument(skip(self))]
    async fn request_always_authorization(&self) -> AuthorizationStatus {
        let mut state = self.state.lock().await;
        if self.grant_on_request {
            state.authorized = true;
        }

        let status = if state.authorized {
            AuthorizationStatus::Granted
        } else {
            AuthorizationStatus::NotYetGranted
        };
        info!("🔑 Requested \"always\" location authorization: {:?}", status);
        status
    }
}
