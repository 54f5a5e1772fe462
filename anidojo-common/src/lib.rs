//! # AniDojo Common Library
//!
//! Shared code for the AniDojo tracking core including:
//! - Domain model types (anime summaries, list entries, reviews)
//! - Error types (the `Error` enum and field-level `ValidationError`)
//! - Store change events
//! - The persisted-region abstraction
//! - Data directory resolution

pub mod config;
pub mod error;
pub mod events;
pub mod models;
pub mod storage;

pub use error::{Error, Result, ValidationError};
pub use events::StoreEvent;
