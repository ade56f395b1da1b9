use crate::domain::GeoRegion;
use crate::persistence::serialized_region::{decode, encode};
use crate::persistence::{LoadedRegions, PersistenceError, PersistenceStore};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;
use tracing::debug;

/// Keeps the encoded slot in memory. Nothing survives the process, but the encoding is the same as `FileStore`'s.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slot: Mutex<Option<Vec<u8>>>,
    saves: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }
}

#[cfg(test)]
impl MemoryStore {
    pub fn with_contents(bytes: Vec<u8>) -> Self {
        MemoryStore {
            slot: Mutex::new(Some(bytes)),
            saves: AtomicUsize::new(0),
        }
    }

    pub async fn contents(&self) -> Option<Vec<u8>> {
        self.slot.lock().await.clone()
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PersistenceStore for MemoryStore {
    async fn load(&self) -> Result<LoadedRegions, PersistenceError> {
        match self.slot.lock().await.as_deref() {
            Some(bytes) => decode(bytes).map_err(|source| PersistenceError::Corrupt {
                source,
                slot: "memory".to_string(),
            }),
            None => Ok(LoadedRegions::default()),
        }
    }

    async fn save(&self, regions: &[GeoRegion]) -> Result<(), PersistenceError> {
        let bytes = encode(regions).map_err(PersistenceError::Encode)?;
        *self.slot.lock().await = Some(bytes);
        let saves = self.saves.fetch_add(1, Ordering::SeqCst) + 1;

        debug!("💾 Saved {} region(s) in memory, write #{}", regions.len(), saves);
        Ok(())
    }
}
