use crate::domain::{GeoRegion, GeoRegionError};
use crate::monitor::MonitorError;
use crate::persistence::PersistenceError;
use thiserror::Error;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MonitoringState {
    Unmonitored,
    Monitored,
}

/// Why a saved region is not (or no longer) being watched. Never a reason to fail the operation itself.
#[derive(Error, Clone, PartialEq, Debug)]
pub enum MonitoringWarning {
    #[error("geofencing is not supported on this device")]
    DeviceUnsupported,
    #[error("the region is saved but only becomes active once location access is granted")]
    PermissionNotGranted,
    #[error("could not start monitoring: {0}")]
    MonitorStartFailed(MonitorError),
    #[error("could not stop monitoring: {0}")]
    MonitorStopFailed(MonitorError),
}

impl MonitoringWarning {
    pub fn code(&self) -> &'static str {
        match self {
            MonitoringWarning::DeviceUnsupported => "DeviceUnsupported",
            MonitoringWarning::PermissionNotGranted => "PermissionNotGranted",
            MonitoringWarning::MonitorStartFailed(_) => "MonitorStartFailed",
            MonitoringWarning::MonitorStopFailed(_) => "MonitorStopFailed",
        }
    }
}

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("invalid region: {0}")]
    InvalidRegion(#[from] GeoRegionError),
    #[error("a region with identifier '{0}' already exists")]
    DuplicateIdentifier(String),
    #[error("cannot hold more than {maximum} region(s)")]
    CapacityExceeded { maximum: usize },
    #[error("could not persist regions: {0}")]
    PersistenceFailure(#[from] PersistenceError),
    #[error("no region with identifier '{0}'")]
    NotFound(String),
}

impl RegistryError {
    pub fn code(&self) -> &'static str {
        match self {
            RegistryError::InvalidRegion(_) => "InvalidRegion",
            RegistryError::DuplicateIdentifier(_) => "DuplicateIdentifier",
            RegistryError::CapacityExceeded { .. } => "CapacityExceeded",
            RegistryError::PersistenceFailure(_) => "PersistenceFailure",
            RegistryError::NotFound(_) => "NotFound",
        }
    }
}

/// A region was admitted and saved. A warning means it is saved but not being monitored.
#[derive(Debug, PartialEq)]
pub struct Added {
    region: GeoRegion,
    monitoring_warning: Option<MonitoringWarning>,
}

impl Added {
    pub fn new(region: GeoRegion, monitoring_warning: Option<MonitoringWarning>) -> Self {
        Added { region, monitoring_warning }
    }

    pub fn region(&self) -> &GeoRegion {
        &self.region
    }

    pub fn monitoring_warning(&self) -> Option<&MonitoringWarning> {
        self.monitoring_warning.as_ref()
    }
}

#[derive(Debug, PartialEq)]
pub struct Removed {
    region: GeoRegion,
    monitoring_warning: Option<MonitoringWarning>,
}

impl Removed {
    pub fn new(region: GeoRegion, monitoring_warning: Option<MonitoringWarning>) -> Self {
        Removed { region, monitoring_warning }
    }

    pub fn region(&self) -> &GeoRegion {
        &self.region
    }

    pub fn monitoring_warning(&self) -> Option<&MonitoringWarning> {
        self.monitoring_warning.as_ref()
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct LoadReport {
    pub loaded: usize,
    /// Records that could not be decoded.
    pub skipped: usize,
    /// Decoded records left out because of a duplicate identifier or because the monitor's capacity was reached.
    pub dropped: usize,
}

#[derive(Debug, Default, PartialEq)]
pub struct SyncReport {
    pub started: Vec<String>,
    pub stopped: Vec<String>,
    pub warnings: Vec<(String, MonitoringWarning)>,
}

impl SyncReport {
    /// True when the pass did not change anything on the monitor.
    pub fn is_unchanged(&self) -> bool {
        self.started.is_empty() && self.stopped.is_empty()
    }
}
