//! # AniDojo Core
//!
//! The tracking core: persisted list and review stores, the pure view
//! engine, the statistics engine, the mood-based recommendation scorer,
//! search/recommendation history, and JSON export.
//!
//! Stores own their collections exclusively and persist the whole collection
//! through an injected [`anidojo_common::storage::Region`] after every
//! mutation. All store operations are synchronous; the only async code in
//! the workspace is the catalog client.

pub mod export;
pub mod history;
pub mod list_store;
pub mod recommend;
pub mod review_store;
pub mod stats;
pub mod view;

pub use list_store::ListStore;
pub use review_store::ReviewStore;

/// Result of a mutating store operation.
///
/// Domain failures (duplicate, not found, validation) are `Err` at the
/// operation level and mutate nothing. A persistence failure is not a domain
/// failure: the in-memory store still reflects the change, but
/// `persisted == false` tells the caller to warn the user that the change
/// did not reach disk.
#[derive(Debug, Clone, PartialEq)]
pub struct Saved<T> {
    pub value: T,
    pub persisted: bool,
}

/// Outcome of an idempotent removal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed,
    NotFound,
}
