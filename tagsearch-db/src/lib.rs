//! The relational side of the two-tier cache: schema, embedded migrations,
//! and the transaction boundary around article writes and cache-row
//! bookkeeping.
//!
//! Everything here is reached through [`Store`]; callers never touch
//! `diesel` directly.

mod models;
mod schema;
mod store;

pub use store::{Store, TagDiff};
