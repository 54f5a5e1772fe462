//! # AniDojo Catalog Client
//!
//! Read-only access to the external anime catalog API:
//! - HTTP client with pagination and polite rate limiting
//! - Normalization of raw catalog payloads into `AnimeSummary`
//! - Stale-response guard for superseded in-flight requests
//!
//! Everything downstream of this crate sees only the normalized
//! `AnimeSummary` shape, never raw catalog JSON.

pub mod client;
pub mod normalizer;
pub mod sequence;

pub use client::{CatalogClient, CatalogPage};
pub use normalizer::normalize;
pub use sequence::RequestSequence;
