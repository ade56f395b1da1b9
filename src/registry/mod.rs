mod geofence_registry;
mod outcome;

pub use geofence_registry::{GeofenceRegistry, RegionSnapshot};
pub use outcome::{Added, LoadReport, MonitoringState, MonitoringWarning, RegistryError, Removed, SyncReport};
