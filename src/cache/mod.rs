//! Profile caching: storage backends and the reuse gate.

pub mod file;
pub mod gate;
pub mod memory;
pub mod traits;

pub use file::JsonFileCache;
pub use gate::{is_reusable, CacheDecision, CacheGate, DEFAULT_FRESHNESS_SECS};
pub use memory::InMemoryProfileCache;
pub use traits::{normalize_category, CacheEntry, ProfileCache, ProfileSet, StorageError};
