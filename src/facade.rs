use crate::config::Config;
use anyhow::{anyhow, Result};
use once_cell::sync::OnceCell;
use std::sync::Mutex;
use tagsearch_cache::{cache_key, CacheManager, Expiration, SweepReport};
use tagsearch_db::Store;
use tagsearch_sql::{lower_count_query, lower_query, BindValue, Order};
use tagsearch_syntax::parse_query;
use time::OffsetDateTime;
use tracing::{instrument, warn};

/// A page of search results plus the total count across all pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub id_list: Vec<String>,
    pub count: i64,
}

/// Orchestrates parse → canonicalize → key → cache lookup → on-miss SQL →
/// cache population, and exposes the article-write paths that invalidate
/// affected cache entries.
///
/// The database handle is a capability obtained lazily: constructing a
/// `Query` never opens a connection, so tests and short-lived callers that
/// only touch the filesystem cache pay no connection cost.
pub struct Query {
    config: Config,
    cache: CacheManager,
    db: OnceCell<Mutex<Store>>,
}

impl Query {
    pub fn new(config: Config) -> Self {
        let cache = CacheManager::new(config.cache_base.clone());
        Self {
            config,
            cache,
            db: OnceCell::new(),
        }
    }

    fn with_db<T>(&self, f: impl FnOnce(&mut Store) -> Result<T>) -> Result<T> {
        let cell = self.db.get_or_try_init(|| -> Result<Mutex<Store>> {
            Ok(Mutex::new(Store::connect(&self.config.database_url)?))
        })?;
        let mut guard = cell
            .lock()
            .map_err(|_| anyhow!("database connection mutex poisoned"))?;
        f(&mut guard)
    }

    /// Parses and canonicalizes `query_text`, serves a cached page when one
    /// is available, and otherwise runs the lowered SQL and populates the
    /// cache before returning.
    #[instrument(skip(self))]
    pub fn search(&self, query_text: &str, page: u32, order: Order) -> Result<SearchResult> {
        let tree = parse_query(query_text, self.config.limit_tag);
        let canonical = tree.as_ref().map(|t| t.canonical()).unwrap_or_default();
        let key = cache_key(&canonical);
        let prefix = order.page_prefix();
        let limit = self.config.max_show_count.max(1);
        let offset = i64::from(page.saturating_sub(1)) * limit;

        let lowered = lower_query(tree.as_ref(), order, limit, offset);
        let tag_binds: Vec<String> = lowered
            .binds
            .iter()
            .filter_map(|b| match b {
                BindValue::Text(v) => Some(v.clone()),
                BindValue::Int(_) => None,
            })
            .collect();

        let had_entry = self.cache.has(&key);
        let cached_count = had_entry.then(|| self.cache.read_config(&key)).flatten().map(|c| c.count);
        let cached_ids = if had_entry { self.cache.get(&key, &prefix, page)? } else { None };

        if let (Some(ids), Some(count)) = (cached_ids, cached_count) {
            return Ok(SearchResult { id_list: ids, count });
        }

        let count_query = lower_count_query(tree.as_ref());
        let (ids, count) = self.with_db(|store| {
            let ids = store.run_id_query(&lowered.sql, &lowered.binds)?;
            let count = store.run_count_query(&count_query.sql, &count_query.binds)?;
            if !self.cache.has(&key) {
                let expiration = expiration_policy(&tag_binds, count);
                let max_page = (count + limit - 1) / limit;
                if let Err(e) = self.cache.create(store, &key, &tag_binds, expiration, count, max_page) {
                    warn!(error = %e, %key, "cache create failed; search result still returned");
                }
            }
            Ok((ids, count))
        })?;

        if !self.cache.has_page(&key, &prefix, page) {
            if let Err(e) = self.cache.set(&key, &prefix, page, &ids, false) {
                warn!(error = %e, %key, "cache set failed; search result still returned");
            }
        }

        Ok(SearchResult { id_list: ids, count })
    }

    /// Inserts a new article or updates an existing one's dates and tags.
    /// Article persistence always completes or rolls back; cache
    /// invalidation for the changed tags is best-effort and swallowed
    /// per-tag.
    #[instrument(skip(self, tag_list))]
    pub fn insert_or_update_article(
        &self,
        article_id: &str,
        post_date: &str,
        update_date: &str,
        tag_list: &[String],
    ) -> Result<()> {
        let normalized: Vec<String> = tag_list.iter().map(|t| tagsearch_syntax::normalize(t)).collect();
        let diff = self.with_db(|store| {
            store.upsert_article(article_id, post_date, update_date, &normalized)
        })?;
        for tag in diff.changed() {
            if let Err(e) = self.invalidate_by_tag(&tag) {
                warn!(error = %e, %tag, "cache invalidation failed after article write");
            }
        }
        Ok(())
    }

    /// Removes an article and invalidates the cache entries for its tags.
    #[instrument(skip(self))]
    pub fn delete_article(&self, article_id: &str) -> Result<()> {
        let removed_tags = self.with_db(|store| store.delete_article(article_id))?;
        for tag in removed_tags {
            if let Err(e) = self.invalidate_by_tag(&tag) {
                warn!(error = %e, %tag, "cache invalidation failed after article delete");
            }
        }
        Ok(())
    }

    /// Invalidates every cache entry whose query touched `normalized_tag`.
    pub fn invalidate_by_tag(&self, normalized_tag: &str) -> Result<()> {
        let now = OffsetDateTime::now_utc();
        self.with_db(|store| self.cache.delete_by_tag(store, normalized_tag, now))
    }

    /// Invalidates every cache entry that has expired as of `now`.
    pub fn invalidate_by_time(&self, now: OffsetDateTime) -> Result<()> {
        self.with_db(|store| self.cache.delete_by_datetime(store, now))
    }

    /// Removes cache directories that have been renamed out of their
    /// namespace by a prior invalidation but never cleaned up.
    pub fn sweep_filesystem(&self) -> Result<SweepReport> {
        self.cache.sweep_filesystem()
    }
}

/// Trivial queries (no tag, or one tag with hits) are pinned far in the
/// future; empty results expire quickly so a later write is picked up
/// soon; everything else gets a week-long window.
fn expiration_policy(tag_binds: &[String], count: i64) -> Expiration {
    if tag_binds.is_empty() || (tag_binds.len() == 1 && count > 0) {
        Expiration::Absolute(far_future())
    } else if count == 0 {
        Expiration::Relative { minutes: 15 }
    } else {
        Expiration::Relative { minutes: 7 * 24 * 60 }
    }
}

fn far_future() -> OffsetDateTime {
    OffsetDateTime::parse(
        "9999-01-01T00:00:00Z",
        &time::format_description::well_known::Rfc3339,
    )
    .expect("static far-future timestamp is valid")
}
