//! Lowers canonical [`tagsearch_syntax::QueryTree`]s into parameterized SQL.
//!
//! The lowerer only ever emits nested `INNER JOIN`, `UNION`, and `NOT IN`
//! subqueries — no `INTERSECT` or `EXCEPT` — so the generated statements run
//! unmodified against SQLite.
//!
//! ```
//! use tagsearch_sql::{lower_query, Order};
//! use tagsearch_syntax::parse_query;
//!
//! let tree = parse_query("rust -tutorial", None);
//! let lowered = lower_query(tree.as_ref(), Order::DescPostDate, 10, 0);
//! assert!(lowered.sql.contains("NOT IN"));
//! ```

mod lower;
mod order;

pub use lower::{lower_count_query, lower_query, BindValue, LoweredQuery};
pub use order::{Order, UnknownOrderError};
