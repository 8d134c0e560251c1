pub mod keys;
pub mod memory;
pub mod store;

pub use keys::CacheKey;
pub use memory::{MemoryCache, DEFAULT_CACHE_TTL, MAX_CACHE_TTL};
pub use store::{CacheError, CacheResult, CacheStore};
