//! Tag-search query engine with a two-tier (database + filesystem) result
//! cache.
//!
//! The three hard pieces live in their own crates —
//! [`tagsearch_syntax`] (grammar, lexer, parser, canonical query tree),
//! [`tagsearch_sql`] (SQL lowering), and [`tagsearch_cache`] plus
//! [`tagsearch_db`] (the cache manager and its relational backend). This
//! crate wires them together behind [`Query`], the public entry point.
//!
//! ```no_run
//! use tagsearch::{Config, Query};
//! use tagsearch_sql::Order;
//!
//! let query = Query::new(Config::new("/var/lib/tagsearch/cache", "tagsearch.sqlite3"));
//! let results = query.search("rust -tutorial", 1, Order::DescPostDate)?;
//! println!("{} matching articles", results.count);
//! # Ok::<(), anyhow::Error>(())
//! ```

mod config;
mod facade;

pub use config::Config;
pub use facade::{Query, SearchResult};

pub use tagsearch_cache::{cache_key, Expiration, SweepReport};
pub use tagsearch_db::TagDiff;
pub use tagsearch_sql::Order;
pub use tagsearch_syntax::{normalize, parse_query, QueryTree};
