use crate::domain::GeoRegion;
use async_trait::async_trait;
use std::fmt::Debug;
use std::io;
use thiserror::Error;

/// A durable key-value slot holding the full list of regions.
///
/// `save` replaces the slot as a whole: a later `load` observes either the previous list or the new one, never a mix.
#[async_trait]
pub trait PersistenceStore: Debug + Send + Sync {
    /// Returns the persisted regions in their stored order, or an empty list if the slot was never written.
    async fn load(&self) -> Result<LoadedRegions, PersistenceError>;

    async fn save(&self, regions: &[GeoRegion]) -> Result<(), PersistenceError>;
}

#[derive(Debug, Default, PartialEq)]
pub struct LoadedRegions {
    regions: Vec<GeoRegion>,
    skipped: usize,
}

impl LoadedRegions {
    pub fn new(regions: Vec<GeoRegion>, skipped: usize) -> Self {
        LoadedRegions { regions, skipped }
    }

    pub fn regions(&self) -> &[GeoRegion] {
        &self.regions
    }

    /// Number of records that could not be decoded and were left out.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn into_regions(self) -> Vec<GeoRegion> {
        self.regions
    }
}

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("i/o error on slot '{slot}': {source}")]
    Io { source: io::Error, slot: String },
    #[error("could not encode regions: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("slot '{slot}' does not hold a list of regions: {source}")]
    Corrupt { source: serde_json::Error, slot: String },
}
