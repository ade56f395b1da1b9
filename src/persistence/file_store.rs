use crate::domain::GeoRegion;
use crate::persistence::serialized_region::{decode, encode};
use crate::persistence::{LoadedRegions, PersistenceError, PersistenceStore};
use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};

/// Stores the slot as `<directory>/<slot>.json`.
#[derive(Debug)]
pub struct FileStore {
    directory: PathBuf,
    slot: String,
}

impl FileStore {
    pub fn new(directory: impl Into<PathBuf>, slot: impl Into<String>) -> Self {
        FileStore {
            directory: directory.into(),
            slot: slot.into(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.directory.join(format!("{}.json", self.slot))
    }

    fn temp_path(&self) -> PathBuf {
        self.directory.join(format!("{}.json.tmp", self.slot))
    }

    fn io_error(&self, source: io::Error) -> PersistenceError {
        PersistenceError::Io {
            source,
            slot: self.slot.clone(),
        }
    }

    async fn write_atomically(&self, bytes: &[u8]) -> io::Result<()> {
        fs::create_dir_all(&self.directory).await?;

        let temp_path = self.temp_path();
        let mut file = fs::File::create(&temp_path).await?;
        let result = Self::write_and_replace(&mut file, bytes, &temp_path, &self.path()).await;
        drop(file);

        if result.is_err() {
            if let Err(cleanup) = fs::remove_file(&temp_path).await {
                warn!("⚠️ Could not remove '{}': {}", temp_path.display(), cleanup);
            }
        }
        result
    }

    async fn write_and_replace(file: &mut fs::File, bytes: &[u8], temp_path: &Path, path: &Path) -> io::Result<()> {
        file.write_all(bytes).await?;
        file.sync_all().await?;

        // A rename within one directory replaces the slot in a single step
        fs::rename(temp_path, path).await
    }
}

#[async_trait]
impl PersistenceStore for FileStore {
    #[instrument(skip(self), fields(slot = self.slot.as_str()))]
    async fn load(&self) -> Result<LoadedRegions, PersistenceError> {
        let path = self.path();
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!("💾 No saved regions at '{}'", path.display());
                return Ok(LoadedRegions::default());
            }
            Err(err) => return Err(self.io_error(err)),
        };

        let loaded = decode(&bytes).map_err(|source| PersistenceError::Corrupt {
            source,
            slot: self.slot.clone(),
        })?;

        info!("💾 Loaded {} region(s) from '{}', {} skipped", loaded.regions().len(), path.display(), loaded.skipped());
        Ok(loaded)
    }

    #[instrument(skip_all, fields(slot = self.slot.as_str()))]
    async fn save(&self, regions: &[GeoRegion]) -> Result<(), PersistenceError> {
        let bytes = encode(regions).map_err(PersistenceError::Encode)?;
        self.write_atomically(&bytes).await.map_err(|err| self.io_error(err))?;

        debug!("💾 Saved {} region(s)", regions.len());
        Ok(())
    }
}
