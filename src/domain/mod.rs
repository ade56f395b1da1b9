mod geo_region;

pub use geo_region::{Coordinate, GeoRegion, GeoRegionError, NewGeoRegion, TriggerOn};
