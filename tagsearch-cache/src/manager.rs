use crate::files::{
    self, format_timestamp, page_file_name, ConfigFile, ExpirationFile, CONFIG_FILE,
    EXPIRATION_FILE,
};
use anyhow::{anyhow, Context, Result};
use fs2::FileExt;
use std::fs::{self, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::PathBuf;
use tagsearch_db::Store;
use time::{format_description, Duration, OffsetDateTime};
use tracing::warn;

/// How long a freshly created entry should live: an absolute, pinned
/// deadline, or a relative window that slides forward on every read.
#[derive(Debug, Clone, Copy)]
pub enum Expiration {
    Absolute(OffsetDateTime),
    Relative { minutes: i64 },
}

impl Expiration {
    fn resolve(self, now: OffsetDateTime) -> (OffsetDateTime, i64) {
        match self {
            Expiration::Absolute(at) => (at, 0),
            Expiration::Relative { minutes } => (now + Duration::minutes(minutes), minutes),
        }
    }
}

fn rename_suffix_format() -> Vec<format_description::FormatItem<'static>> {
    format_description::parse("[year][month][day][hour][minute][second]")
        .expect("static rename-suffix format is valid")
}

/// The filesystem half of the two-tier result cache. One manager instance
/// per configured `base` directory; cheap to construct, holds no state of
/// its own beyond the path.
pub struct CacheManager {
    base: PathBuf,
}

impl CacheManager {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    fn dir(&self, key: &str) -> PathBuf {
        files::entry_dir(&self.base, key)
    }

    /// Directory, `expiration.json`, and `config.json` all exist.
    pub fn has(&self, key: &str) -> bool {
        let dir = self.dir(key);
        dir.is_dir() && dir.join(EXPIRATION_FILE).is_file() && dir.join(CONFIG_FILE).is_file()
    }

    /// Same as [`Self::has`] plus the named page file.
    pub fn has_page(&self, key: &str, prefix: &str, page: u32) -> bool {
        self.has(key) && self.dir(key).join(page_file_name(prefix, page)).is_file()
    }

    /// Reads `config.json` unlocked (files are immutable once written).
    /// `None` on any missing or malformed file — callers treat this as a
    /// cache miss.
    pub fn read_config(&self, key: &str) -> Option<ConfigFile> {
        files::read_to_string(&self.dir(key).join(CONFIG_FILE))
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
    }

    /// Creates a cache entry: DB row(s), directory, `expiration.json`,
    /// `config.json`, in that order. Any IO failure is returned to the
    /// caller (the façade treats `create` as best-effort and swallows it).
    pub fn create(
        &self,
        store: &mut Store,
        key: &str,
        tag_values: &[String],
        expiration: Expiration,
        count: i64,
        max_page: i64,
    ) -> Result<()> {
        let now = OffsetDateTime::now_utc();
        let (absolute, interval) = expiration.resolve(now);
        store
            .cache_upsert(key, tag_values, &format_timestamp(absolute))
            .context("upsert cache db rows")?;

        let dir = self.dir(key);
        fs::create_dir_all(&dir).context("mkdir cache entry directory")?;

        let expiration_json = serde_json::to_vec_pretty(&ExpirationFile {
            expiration: format_timestamp(absolute),
            interval,
        })?;
        files::write_locked_atomic(&dir.join(EXPIRATION_FILE), &expiration_json)
            .context("write expiration.json")?;

        let config_json = serde_json::to_vec_pretty(&ConfigFile { count, max_page })?;
        files::write_locked_atomic(&dir.join(CONFIG_FILE), &config_json)
            .context("write config.json")?;

        Ok(())
    }

    /// Reads a page. `Ok(None)` means a genuine cache miss (missing or
    /// corrupt entry/page). `Ok(Some(vec![]))` means the entry exists but
    /// `page` is out of `[1, max_page]` — an empty result without touching
    /// the page file.
    pub fn get(&self, key: &str, prefix: &str, page: u32) -> Result<Option<Vec<String>>> {
        if !self.has(key) {
            return Ok(None);
        }
        let dir = self.dir(key);
        let config: ConfigFile = match files::read_to_string(&dir.join(CONFIG_FILE))
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
        {
            Some(c) => c,
            None => return Ok(None),
        };

        if page < 1 || page as i64 > config.max_page {
            return Ok(Some(Vec::new()));
        }

        let page_path = dir.join(page_file_name(prefix, page));
        let ids: Vec<String> = match files::read_to_string(&page_path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
        {
            Some(ids) => ids,
            None => return Ok(None),
        };

        self.update(key, None)?;
        Ok(Some(ids))
    }

    /// Writes a page file. Requires the entry to already exist.
    /// `extend_expiration` slides the entry forward on a successful write,
    /// mirroring a read-extension.
    pub fn set(
        &self,
        key: &str,
        prefix: &str,
        page: u32,
        id_list: &[String],
        extend_expiration: bool,
    ) -> Result<()> {
        if !self.has(key) {
            return Err(anyhow!("set called for cache entry `{key}` that does not exist"));
        }
        let path = self.dir(key).join(page_file_name(prefix, page));
        let body = serde_json::to_vec_pretty(id_list)?;
        files::write_locked_atomic(&path, &body).context("write cache page file")?;
        if extend_expiration {
            self.update(key, None)?;
        }
        Ok(())
    }

    /// Non-blocking exclusive update of `expiration.json`. A contended lock
    /// is a silent no-op — readers holding shared locks must never be
    /// blocked by this call.
    pub fn update(&self, key: &str, override_at: Option<OffsetDateTime>) -> Result<()> {
        let path = self.dir(key).join(EXPIRATION_FILE);
        let mut file = match OpenOptions::new().read(true).write(true).open(&path) {
            Ok(f) => f,
            Err(_) => return Ok(()), // entry vanished under us; nothing to update
        };
        if file.try_lock_exclusive().is_err() {
            return Ok(());
        }

        let new_contents = if let Some(at) = override_at {
            ExpirationFile {
                expiration: format_timestamp(at),
                interval: 0,
            }
        } else {
            let mut raw = String::new();
            file.read_to_string(&mut raw).context("read expiration.json")?;
            let current: ExpirationFile =
                serde_json::from_str(&raw).context("parse expiration.json")?;
            if current.interval == 0 {
                file.unlock().ok();
                return Ok(()); // pinned entry, immutable
            }
            let now = OffsetDateTime::now_utc();
            ExpirationFile {
                expiration: format_timestamp(now + Duration::minutes(current.interval)),
                interval: current.interval,
            }
        };

        let body = serde_json::to_vec_pretty(&new_contents)?;
        file.set_len(0).context("truncate expiration.json")?;
        file.seek(SeekFrom::Start(0)).context("seek expiration.json")?;
        file.write_all(&body).context("rewrite expiration.json")?;
        file.unlock().ok();
        Ok(())
    }

    /// `Ok(Some(_))` on a successful shared-lock read, `Ok(None)` when the
    /// lock is contended (try again later), `Err` when the file is missing
    /// or unparsable (a permanently corrupt entry).
    pub fn expiration_time(&self, key: &str) -> Result<Option<OffsetDateTime>> {
        let path = self.dir(key).join(EXPIRATION_FILE);
        let mut file = fs::File::open(&path).context("open expiration.json")?;
        if file.try_lock_shared().is_err() {
            return Ok(None);
        }
        let mut raw = String::new();
        file.read_to_string(&mut raw).context("read expiration.json")?;
        file.unlock().ok();
        let parsed: ExpirationFile =
            serde_json::from_str(&raw).context("parse expiration.json")?;
        Ok(Some(files::parse_timestamp(&parsed.expiration)?))
    }

    /// Renames the entry directory out of the visible namespace and removes
    /// its DB rows. If the rename fails (readers hold the directory open),
    /// instead shortens the DB-side expiration to `now` so the entry is
    /// picked up by the next sweep.
    pub fn delete_cache_during_transaction(
        &self,
        store: &mut Store,
        key: &str,
        now: OffsetDateTime,
    ) -> Result<()> {
        let dir = self.dir(key);
        let suffix = now
            .format(&rename_suffix_format())
            .context("format rename suffix")?;
        let renamed = self.base.join(format!("{key}.{suffix}"));
        match fs::rename(&dir, &renamed) {
            Ok(()) => store.cache_delete(key).context("delete cache db rows"),
            Err(_) => store
                .cache_update_expiration(key, &format_timestamp(now))
                .context("defer cache deletion to next sweep"),
        }
    }

    /// Invalidates every cache entry whose tag set includes `norm_tag`.
    pub fn delete_by_tag(
        &self,
        store: &mut Store,
        norm_tag: &str,
        now: OffsetDateTime,
    ) -> Result<()> {
        let ids = store
            .cache_ids_for_tag(norm_tag)
            .context("find cache entries for tag")?;
        for id in ids {
            self.delete_cache_during_transaction(store, &id, now)?;
        }
        Ok(())
    }

    /// Invalidates every cache entry whose DB-side `expiration_time` is due,
    /// re-checking the on-disk expiration first in case a reader slid it
    /// forward since the DB row was selected.
    pub fn delete_by_datetime(&self, store: &mut Store, now: OffsetDateTime) -> Result<()> {
        let ids = store
            .cache_ids_expiring_before(&format_timestamp(now))
            .context("find expiring cache entries")?;
        for id in ids {
            match self.expiration_time(&id) {
                Ok(Some(on_disk)) if on_disk <= now => {
                    self.delete_cache_during_transaction(store, &id, now)?;
                }
                Ok(Some(on_disk)) => {
                    store
                        .cache_update_expiration(&id, &format_timestamp(on_disk))
                        .context("resync cache expiration")?;
                }
                Ok(None) => {
                    // lock contended; leave the DB row for the next sweep pass
                }
                Err(_) => {
                    // corrupt entry: treat as due rather than leaving it to rot
                    self.delete_cache_during_transaction(store, &id, now)?;
                }
            }
        }
        Ok(())
    }

    /// Finishes deferred deletes: removes every `<base>/<key>.<suffix>/`
    /// directory left behind by a failed rename. Partial failures are
    /// logged and left for the next sweep.
    pub fn sweep_filesystem(&self) -> Result<SweepReport> {
        let mut report = SweepReport::default();
        let entries = match fs::read_dir(&self.base) {
            Ok(entries) => entries,
            Err(_) => return Ok(report),
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let name = match path.file_name().and_then(|n| n.to_str()) {
                Some(n) => n,
                None => continue,
            };
            if !name.contains('.') {
                continue;
            }
            match remove_entry_dir(&path) {
                Ok(()) => report.directories_removed += 1,
                Err(e) => {
                    report.errors += 1;
                    warn!(?path, error = %e, "sweep: deferring removal, will retry next pass");
                }
            }
        }
        Ok(report)
    }
}

/// Summary of one `sweep_filesystem` pass, for a caller (e.g. a cron-style
/// binary) to log a one-line result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub directories_removed: usize,
    pub errors: usize,
}

fn remove_entry_dir(path: &std::path::Path) -> Result<()> {
    for file in fs::read_dir(path).context("list cache entry for sweep")? {
        let file = file.context("read cache entry file")?;
        fs::remove_file(file.path()).context("unlink swept file")?;
    }
    fs::remove_dir(path).context("remove swept directory")
}
