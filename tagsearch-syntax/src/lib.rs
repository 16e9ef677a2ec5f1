//! Lexer, recursive-descent parser, and canonical query tree for tag-search
//! boolean queries.
//!
//! A query is a free-form boolean expression over tag tokens: conjunction by
//! juxtaposition, explicit `OR`, unary exclusion `-`, grouping parentheses,
//! and double-quoted literal tags. [`parse_query`] turns the text into a
//! [`QueryTree`] that has already been normalized into canonical form, so
//! that semantically equivalent inputs (differing only in operand order,
//! redundant parens, or same-operator nesting) produce byte-identical
//! [`QueryTree::canonical`] strings — the property the cache layer relies on
//! to hash equivalent queries to the same key.
//!
//! ```
//! use tagsearch_syntax::parse_query;
//!
//! let a = parse_query("(a OR b) c", None).unwrap();
//! let b = parse_query("c (b OR a)", None).unwrap();
//! assert_eq!(a.canonical(), b.canonical());
//! ```

mod lexer;
mod normalize;
mod parser;
mod tree;

pub use normalize::normalize;
pub use parser::{parse_query, Parser};
pub use tree::{canonical_cmp, QueryTree};
