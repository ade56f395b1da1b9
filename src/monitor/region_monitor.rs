use crate::domain::GeoRegion;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt::Debug;
use thiserror::Error;

/// The platform service that watches the device location against circular regions.
///
/// The registry only queries availability and authorization here, it never asks for them.
#[async_trait]
pub trait RegionMonitor: Debug + Send + Sync {
    /// Whether circular-region monitoring is supported on this host at all.
    async fn is_available(&self) -> bool;

    /// Whether the "always" location permission has been granted.
    async fn authorization_granted(&self) -> bool;

    /// Maximum number of regions that can be monitored at the same time.
    fn maximum_regions(&self) -> usize;

    /// Maximum radius of a single region, in meters.
    fn maximum_radius(&self) -> f64;

    async fn start_monitoring(&self, region: &GeoRegion) -> Result<(), MonitorError>;

    /// Succeeds without doing anything if the identifier is not monitored.
    async fn stop_monitoring(&self, identifier: &str) -> Result<(), MonitorError>;

    async fn currently_monitored(&self) -> HashSet<String>;
}

#[async_trait]
pub trait LocationPermission: Debug + Send + Sync {
    async fn request_always_authorization(&self) -> AuthorizationStatus;
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AuthorizationStatus {
    Granted,
    NotYetGranted,
}

#[derive(Error, Clone, PartialEq, Debug)]
pub enum MonitorError {
    #[error("region monitoring is not available on this device")]
    Unavailable,
    #[error("location access has not been authorized")]
    NotAuthorized,
    #[error("already monitoring the maximum of {maximum} region(s)")]
    CapacityReached { maximum: usize },
    #[error("radius {radius}m exceeds the maximum of {maximum}m")]
    RadiusTooLarge { radius: f64, maximum: f64 },
    #[error("{0}")]
    Rejected(String),
}
