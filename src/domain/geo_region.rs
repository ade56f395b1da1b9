use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use thiserror::Error;

const NO_NOTE: &str = "No Note";

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeoRegionError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(GeoRegionError::InvalidLatitude(latitude));
        }

        if !(-180.0..=180.0).contains(&longitude) {
            return Err(GeoRegionError::InvalidLongitude(longitude));
        }

        Ok(Coordinate { latitude, longitude })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum TriggerOn {
    #[serde(rename = "On Entry", alias = "onEntry")]
    OnEntry,
    #[serde(rename = "On Exit", alias = "onExit")]
    OnExit,
}

impl TriggerOn {
    pub fn label(&self) -> &'static str {
        match self {
            TriggerOn::OnEntry => "On Entry",
            TriggerOn::OnExit => "On Exit",
        }
    }

    pub fn notify_on_entry(&self) -> bool {
        matches!(self, TriggerOn::OnEntry)
    }

    pub fn notify_on_exit(&self) -> bool {
        !self.notify_on_entry()
    }
}

impl Display for TriggerOn {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Caller-supplied fields for a geofence that has not been admitted yet.
#[derive(Clone, PartialEq, Debug)]
pub struct NewGeoRegion {
    pub identifier: String,
    pub latitude: f64,
    pub longitude: f64,
    pub radius: f64,
    pub note: String,
    pub trigger_on: TriggerOn,
}

/// A circular geofence. Values are never changed in place: an edit is a remove followed by an add.
#[derive(Clone, PartialEq, Debug)]
pub struct GeoRegion {
    identifier: String,
    center: Coordinate,
    radius: f64, // In meters
    note: String,
    trigger_on: TriggerOn,
}

impl GeoRegion {
    pub fn new(identifier: String, center: Coordinate, radius: f64, note: String, trigger_on: TriggerOn) -> Result<Self, GeoRegionError> {
        if identifier.is_empty() {
            return Err(GeoRegionError::EmptyIdentifier);
        }

        if !(radius.is_finite() && radius > 0.0) {
            return Err(GeoRegionError::InvalidRadius(radius));
        }

        Ok(GeoRegion {
            identifier,
            center,
            radius,
            note,
            trigger_on,
        })
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn center(&self) -> Coordinate {
        self.center
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn note(&self) -> &str {
        &self.note
    }

    pub fn trigger_on(&self) -> TriggerOn {
        self.trigger_on
    }

    pub fn clamped_radius(&self, max_distance: f64) -> f64 {
        self.radius.min(max_distance)
    }

    pub fn clamped_to(self, max_distance: f64) -> GeoRegion {
        let radius = self.clamped_radius(max_distance);
        GeoRegion { radius, ..self }
    }

    pub fn display_note(&self) -> &str {
        if self.note.is_empty() { NO_NOTE } else { &self.note }
    }

    pub fn display_subtitle(&self) -> String {
        format!("Radius: {}m - {}", self.radius, self.trigger_on)
    }
}

impl TryFrom<NewGeoRegion> for GeoRegion {
    type Error = GeoRegionError;

    fn try_from(candidate: NewGeoRegion) -> Result<Self, Self::Error> {
        let center = Coordinate::new(candidate.latitude, candidate.longitude)?;
        GeoRegion::new(candidate.identifier, center, candidate.radius, candidate.note, candidate.trigger_on)
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum GeoRegionError {
    #[error("identifier must not be empty")]
    EmptyIdentifier,
    #[error("invalid latitude: {0}, must be between -90 and 90")]
    InvalidLatitude(f64),
    #[error("invalid longitude: {0}, must be between -180 and 180")]
    InvalidLongitude(f64),
    #[error("invalid radius: {0}, must be a positive number of meters")]
    InvalidRadius(f64),
}
