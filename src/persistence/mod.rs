mod file_store;
mod memory_store;
mod serialized_region;
mod store;

pub use file_store::FileStore;
pub use memory_store::MemoryStore;
pub use store::{LoadedRegions, PersistenceError, PersistenceStore};
