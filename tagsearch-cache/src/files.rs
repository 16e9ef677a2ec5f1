use anyhow::{Context, Result};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use time::OffsetDateTime;

pub const EXPIRATION_FILE: &str = "expiration.json";
pub const CONFIG_FILE: &str = "config.json";

/// `expiration.json`'s shape: an absolute timestamp and, when non-zero, the
/// sliding interval in minutes that governs each read-extension.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExpirationFile {
    pub expiration: String,
    pub interval: i64,
}

/// `config.json`'s shape: total result count and the highest valid page
/// number for this cached query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConfigFile {
    pub count: i64,
    #[serde(rename = "max-page")]
    pub max_page: i64,
}

pub fn entry_dir(base: &Path, key: &str) -> PathBuf {
    base.join(key)
}

pub fn page_file_name(prefix: &str, page: u32) -> String {
    format!("{prefix}{page}.json")
}

/// Writes `contents` to `path` under an exclusive advisory lock, via a
/// sibling temp file plus rename so concurrent lockless readers never see a
/// partial write.
pub fn write_locked_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("create cache entry directory")?;
    }
    let tmp_path = path.with_extension("tmp");
    let mut tmp_file = File::create(&tmp_path).context("create temp cache file")?;
    tmp_file
        .lock_exclusive()
        .context("take exclusive lock on temp cache file")?;
    tmp_file
        .write_all(contents)
        .context("write temp cache file")?;
    tmp_file.sync_all().ok();
    FileExt::unlock(&tmp_file).ok();
    fs::rename(&tmp_path, path).context("rename temp cache file into place")?;
    Ok(())
}

pub fn read_to_string(path: &Path) -> Result<String> {
    let mut buf = String::new();
    File::open(path)
        .context("open cache file")?
        .read_to_string(&mut buf)
        .context("read cache file")?;
    Ok(buf)
}

pub fn format_timestamp(dt: OffsetDateTime) -> String {
    dt.format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| dt.to_string())
}

pub fn parse_timestamp(s: &str) -> Result<OffsetDateTime> {
    OffsetDateTime::parse(s, &time::format_description::well_known::Rfc3339)
        .context("parse cache timestamp")
}
