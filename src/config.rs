use std::path::PathBuf;

/// The engine's external knobs: where the filesystem half of the cache
/// lives, how the database half is reached, and the two pagination
/// parameters.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root of the filesystem cache tree (`<base>/<key>/...`).
    pub cache_base: PathBuf,
    /// `diesel`-compatible connection string, e.g. a SQLite file path.
    pub database_url: String,
    /// Maximum tag literals accepted per query. `None` means unlimited.
    pub limit_tag: Option<u32>,
    /// Page size used to compute LIMIT/OFFSET and the max page number.
    pub max_show_count: i64,
}

impl Config {
    pub fn new(cache_base: impl Into<PathBuf>, database_url: impl Into<String>) -> Self {
        Self {
            cache_base: cache_base.into(),
            database_url: database_url.into(),
            limit_tag: Some(3),
            max_show_count: 10,
        }
    }

    pub fn with_limit_tag(mut self, limit_tag: Option<u32>) -> Self {
        self.limit_tag = limit_tag;
        self
    }

    pub fn with_max_show_count(mut self, max_show_count: i64) -> Self {
        self.max_show_count = max_show_count;
        self
    }
}
