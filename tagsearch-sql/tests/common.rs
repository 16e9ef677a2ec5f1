#![allow(dead_code)]
//! Shared helpers for `tagsearch-sql` integration tests.

use tagsearch_sql::{lower_query, LoweredQuery, Order};
use tagsearch_syntax::parse_query;

pub fn lower(input: &str, order: Order, limit: i64, offset: i64) -> LoweredQuery {
    let tree = parse_query(input, None);
    lower_query(tree.as_ref(), order, limit, offset)
}
