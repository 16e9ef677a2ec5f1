use crate::models::{Article, ArticleIdRow, ArticleTag, Tag, TagSearchCache, TagSearchCacheTag};
use crate::schema;
use anyhow::{anyhow, Context, Result};
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Text};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use rand::distributions::Alphanumeric;
use rand::Rng;
use tagsearch_sql::BindValue;

const CONNECTION_PRAGMAS: &str = "
PRAGMA journal_mode = WAL;
PRAGMA synchronous = NORMAL;
PRAGMA foreign_keys = ON;
";

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

fn generate_id(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// What changed about an article's tag set during [`Store::upsert_article`]
/// or [`Store::delete_article`] — the façade invalidates cache entries for
/// the union of the two lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagDiff {
    pub inserted: Vec<String>,
    pub removed: Vec<String>,
}

impl TagDiff {
    /// `inserted ∪ removed`, the set of normalized tags whose cached
    /// searches may now return different results.
    pub fn changed(&self) -> Vec<String> {
        let mut changed = self.inserted.clone();
        changed.extend(self.removed.iter().cloned());
        changed
    }
}

/// Owns the single SQLite connection used by one request worker. Obtained
/// through `connect`, which establishes the connection, applies pragmas,
/// and runs pending migrations before handing the store back.
pub struct Store {
    conn: SqliteConnection,
}

impl Store {
    pub fn connect(database_url: &str) -> Result<Self> {
        let mut conn = SqliteConnection::establish(database_url)
            .with_context(|| format!("establish sqlite connection at `{database_url}`"))?;
        conn.batch_execute(CONNECTION_PRAGMAS)
            .context("run connection pragmas")?;
        conn.run_pending_migrations(&MIGRATIONS)
            .map_err(|e| anyhow!(e))
            .context("run pending migrations")?;
        Ok(Self { conn })
    }

    /// Runs a lowered, parameterized id-query (`tagsearch_sql::lower_query`'s
    /// output) and returns the matching article ids in result order.
    pub fn run_id_query(&mut self, sql: &str, binds: &[BindValue]) -> Result<Vec<String>> {
        let mut query = diesel::sql_query(sql).into_boxed::<diesel::sqlite::Sqlite>();
        for bind in binds {
            query = match bind {
                BindValue::Text(v) => query.bind::<Text, _>(v.clone()),
                BindValue::Int(v) => query.bind::<BigInt, _>(*v),
            };
        }
        let rows: Vec<ArticleIdRow> = query
            .load(&mut self.conn)
            .context("run lowered id query")?;
        Ok(rows.into_iter().map(|r| r.id).collect())
    }

    /// Runs a lowered, parameterized count-query
    /// (`tagsearch_sql::lower_count_query`'s output) and returns the single
    /// row count.
    pub fn run_count_query(&mut self, sql: &str, binds: &[BindValue]) -> Result<i64> {
        #[derive(QueryableByName)]
        struct CountRow {
            #[diesel(sql_type = BigInt)]
            count: i64,
        }
        let mut query = diesel::sql_query(sql).into_boxed::<diesel::sqlite::Sqlite>();
        for bind in binds {
            query = match bind {
                BindValue::Text(v) => query.bind::<Text, _>(v.clone()),
                BindValue::Int(v) => query.bind::<BigInt, _>(*v),
            };
        }
        let row: CountRow = query.get_result(&mut self.conn).context("run lowered count query")?;
        Ok(row.count)
    }

    /// Maps normalized tag names to their surrogate ids. Names with no
    /// matching row are silently omitted, per `create`'s tag-resolution
    /// rule.
    fn resolve_tag_ids(&mut self, norm_names: &[String]) -> Result<Vec<(String, String)>> {
        use schema::tags::dsl::*;
        if norm_names.is_empty() {
            return Ok(Vec::new());
        }
        tags.select((norm_name, id))
            .filter(norm_name.eq_any(norm_names))
            .load::<(String, String)>(&mut self.conn)
            .context("resolve tag ids")
    }

    fn ensure_tags_exist(&mut self, norm_names: &[String]) -> Result<Vec<(String, String)>> {
        let mut resolved = self.resolve_tag_ids(norm_names)?;
        let known: std::collections::HashSet<&str> =
            resolved.iter().map(|(n, _)| n.as_str()).collect();
        for name in norm_names {
            if known.contains(name.as_str()) {
                continue;
            }
            let new_id = generate_id(14);
            diesel::insert_into(schema::tags::table)
                .values(&Tag {
                    id: new_id.clone(),
                    org_name: name.clone(),
                    norm_name: name.clone(),
                })
                .execute(&mut self.conn)
                .context("insert new tag row")?;
            resolved.push((name.clone(), new_id));
        }
        Ok(resolved)
    }

    fn article_tag_names(&mut self, article: &str) -> Result<Vec<String>> {
        use schema::posted_articles_tags::dsl as pat;
        use schema::tags::dsl as t;
        pat::posted_articles_tags
            .inner_join(t::tags.on(pat::tag_id.eq(t::id)))
            .filter(pat::article_id.eq(article))
            .select(t::norm_name)
            .load(&mut self.conn)
            .context("load article tags")
    }

    /// Upserts the article row and reconciles its tag set against
    /// `norm_tags`, inside one transaction. Tags that don't exist yet are
    /// created. Returns the set of tags that were added or removed so the
    /// caller can invalidate the matching cache entries.
    pub fn upsert_article(
        &mut self,
        article_id: &str,
        post_date: &str,
        update_date: &str,
        norm_tags: &[String],
    ) -> Result<TagDiff> {
        let resolved = self.ensure_tags_exist(norm_tags)?;
        let current = self.article_tag_names(article_id)?;
        let current_set: std::collections::HashSet<&str> =
            current.iter().map(String::as_str).collect();
        let wanted_set: std::collections::HashSet<&str> =
            norm_tags.iter().map(String::as_str).collect();

        let inserted: Vec<String> = wanted_set
            .difference(&current_set)
            .map(|s| s.to_string())
            .collect();
        let removed: Vec<String> = current_set
            .difference(&wanted_set)
            .map(|s| s.to_string())
            .collect();

        let by_name: std::collections::HashMap<&str, &str> = resolved
            .iter()
            .map(|(name, id)| (name.as_str(), id.as_str()))
            .collect();

        self.conn
            .transaction(|conn| {
                diesel::insert_into(schema::posted_articles::table)
                    .values(&Article {
                        id: article_id.to_string(),
                        post_date: post_date.to_string(),
                        update_date: update_date.to_string(),
                    })
                    .on_conflict(schema::posted_articles::id)
                    .do_update()
                    .set(schema::posted_articles::update_date.eq(update_date.to_string()))
                    .execute(conn)?;

                for name in &inserted {
                    if let Some(tag_id) = by_name.get(name.as_str()) {
                        diesel::insert_into(schema::posted_articles_tags::table)
                            .values(&ArticleTag {
                                article_id: article_id.to_string(),
                                tag_id: tag_id.to_string(),
                            })
                            .execute(conn)?;
                    }
                }

                for name in &removed {
                    if let Some(tag_id) = by_name.get(name.as_str()) {
                        use schema::posted_articles_tags::dsl as pat;
                        diesel::delete(
                            pat::posted_articles_tags
                                .filter(pat::article_id.eq(article_id))
                                .filter(pat::tag_id.eq(*tag_id)),
                        )
                        .execute(conn)?;
                    }
                }
                Ok::<(), diesel::result::Error>(())
            })
            .context("upsert article transaction")?;

        Ok(TagDiff { inserted, removed })
    }

    /// Deletes an article and its tag associations inside one transaction,
    /// returning the tags it carried so the caller can invalidate their
    /// cache entries.
    pub fn delete_article(&mut self, article_id: &str) -> Result<Vec<String>> {
        let tags_before = self.article_tag_names(article_id)?;
        self.conn
            .transaction(|conn| {
                use schema::posted_articles::dsl as pa;
                use schema::posted_articles_tags::dsl as pat;
                diesel::delete(pat::posted_articles_tags.filter(pat::article_id.eq(article_id)))
                    .execute(conn)?;
                diesel::delete(pa::posted_articles.filter(pa::id.eq(article_id))).execute(conn)?;
                Ok::<(), diesel::result::Error>(())
            })
            .context("delete article transaction")?;
        Ok(tags_before)
    }

    /// `true` once `tag_search_caches` has a row for `key`.
    pub fn cache_row_exists(&mut self, key: &str) -> Result<bool> {
        use schema::tag_search_caches::dsl::*;
        let count: i64 = tag_search_caches
            .filter(id.eq(key))
            .count()
            .get_result(&mut self.conn)
            .context("check cache row existence")?;
        Ok(count > 0)
    }

    /// Inserts a fresh cache row plus its tag associations, or — if a row
    /// for `key` already exists — updates only its expiration. Tags with no
    /// matching row in `tags` are silently omitted, matching article-side
    /// resolution.
    pub fn cache_upsert(
        &mut self,
        key: &str,
        norm_tags: &[String],
        expiration_time: &str,
    ) -> Result<()> {
        let resolved = self.resolve_tag_ids(norm_tags)?;
        let exists = self.cache_row_exists(key)?;
        let new_expiration = expiration_time.to_string();
        self.conn
            .transaction(|conn| {
                if exists {
                    use schema::tag_search_caches::dsl as tsc;
                    diesel::update(tsc::tag_search_caches.filter(tsc::id.eq(key)))
                        .set(tsc::expiration_time.eq(&new_expiration))
                        .execute(conn)?;
                } else {
                    diesel::insert_into(schema::tag_search_caches::table)
                        .values(&TagSearchCache {
                            id: key.to_string(),
                            expiration_time: new_expiration.clone(),
                        })
                        .execute(conn)?;
                    for (_, tag_id) in &resolved {
                        diesel::insert_into(schema::tag_search_caches_tags::table)
                            .values(&TagSearchCacheTag {
                                cache_id: key.to_string(),
                                tag_id: tag_id.clone(),
                            })
                            .execute(conn)?;
                    }
                }
                Ok::<(), diesel::result::Error>(())
            })
            .context("upsert cache row transaction")
    }

    /// Updates only `expiration_time` for an existing cache row.
    pub fn cache_update_expiration(&mut self, key: &str, expiration_time: &str) -> Result<()> {
        use schema::tag_search_caches::dsl as tsc;
        diesel::update(tsc::tag_search_caches.filter(tsc::id.eq(key)))
            .set(tsc::expiration_time.eq(expiration_time.to_string()))
            .execute(&mut self.conn)
            .context("update cache expiration")?;
        Ok(())
    }

    /// Deletes a cache row and its tag associations. Callers run this under
    /// the same transaction as the directory-rename invalidation step.
    pub fn cache_delete(&mut self, key: &str) -> Result<()> {
        self.conn
            .transaction(|conn| {
                use schema::tag_search_caches::dsl as tsc;
                use schema::tag_search_caches_tags::dsl as tsct;
                diesel::delete(tsct::tag_search_caches_tags.filter(tsct::cache_id.eq(key)))
                    .execute(conn)?;
                diesel::delete(tsc::tag_search_caches.filter(tsc::id.eq(key))).execute(conn)?;
                Ok::<(), diesel::result::Error>(())
            })
            .context("delete cache row transaction")
    }

    /// Materializes `delete_caches` as a temporary table of cache ids whose
    /// tag set includes `norm_tag`, then drains it into a `Vec` before
    /// dropping the table.
    pub fn cache_ids_for_tag(&mut self, norm_tag: &str) -> Result<Vec<String>> {
        self.conn
            .transaction(|conn| {
                diesel::sql_query(
                    "CREATE TEMPORARY TABLE delete_caches AS \
                     SELECT DISTINCT cache_id FROM tag_search_caches_tags \
                     JOIN tags ON tag_search_caches_tags.tag_id = tags.id \
                     WHERE tags.norm_name = ?",
                )
                .bind::<Text, _>(norm_tag)
                .execute(conn)?;

                #[derive(QueryableByName)]
                struct CacheIdRow {
                    #[diesel(sql_type = Text)]
                    cache_id: String,
                }
                let rows: Vec<CacheIdRow> =
                    diesel::sql_query("SELECT cache_id FROM delete_caches").load(conn)?;

                diesel::sql_query("DROP TABLE delete_caches").execute(conn)?;

                Ok::<Vec<String>, diesel::result::Error>(
                    rows.into_iter().map(|r| r.cache_id).collect(),
                )
            })
            .context("materialize delete_caches temp table")
    }

    /// Cache ids whose `expiration_time` is at or before `now`, for
    /// `deleteByDatetime`'s sweep pass.
    pub fn cache_ids_expiring_before(&mut self, now: &str) -> Result<Vec<String>> {
        use schema::tag_search_caches::dsl::*;
        tag_search_caches
            .filter(expiration_time.le(now))
            .select(id)
            .load(&mut self.conn)
            .context("select expiring cache rows")
    }
}
