//! Stale-response guard for in-flight catalog requests
//!
//! Catalog fetches are the only async operations in the core. When the input
//! driving a fetch changes (the user keeps typing), the earlier response may
//! still arrive later; applying it would clobber fresher results. Callers
//! take a token before awaiting and check it is still current before using
//! the response.

use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonically increasing request sequence.
///
/// `begin` issues a new token and invalidates all earlier ones; `is_current`
/// tells a resumed caller whether its response is still the latest.
#[derive(Debug, Default)]
pub struct RequestSequence {
    counter: AtomicU64,
}

impl RequestSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new request, superseding any in flight
    pub fn begin(&self) -> u64 {
        self.counter.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Whether `token` still identifies the latest request
    pub fn is_current(&self, token: u64) -> bool {
        self.counter.load(Ordering::SeqCst) == token
    }
}
