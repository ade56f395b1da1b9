mod region_monitor;
mod simulated_monitor;

pub use region_monitor::{AuthorizationStatus, LocationPermission, MonitorError, RegionMonitor};
pub use simulated_monitor::SimulatedMonitor;
