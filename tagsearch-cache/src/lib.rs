//! Two-tier result cache: a database-indexed set of `(key, expiration,
//! tags)` rows backed by [`tagsearch_db::Store`], paired with a filesystem
//! tree of advisory-locked JSON pages.
//!
//! ```no_run
//! use tagsearch_cache::{cache_key, CacheManager};
//!
//! let key = cache_key("\"RUST\"");
//! let cache = CacheManager::new("/var/lib/tagsearch/cache");
//! assert!(!cache.has(&key));
//! ```

mod files;
mod key;
mod manager;

pub use files::{ConfigFile, ExpirationFile};
pub use key::cache_key;
pub use manager::{CacheManager, Expiration, SweepReport};
