//! Common error types for AniDojo

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// Common result type for AniDojo operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the AniDojo core
#[derive(Error, Debug)]
pub enum Error {
    /// An anime is already present in the list (add rejected)
    #[error("Duplicate entry: anime {0} is already in the list")]
    DuplicateEntry(i64),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Field-level validation failure; carries one message per failing field
    #[error("Validation failed: {0}")]
    Validation(ValidationError),

    /// Recommendation scoring requires at least one selected mood
    #[error("At least one mood must be selected")]
    MoodRequired,

    /// The external catalog could not be reached or returned garbage
    #[error("Catalog unavailable: {0}")]
    CatalogUnavailable(String),

    /// Persisted-region read/write failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error (wraps serde_json::Error)
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Field-level validation failure.
///
/// Keys are field names, values are short human-readable messages suitable
/// for inline display next to a form field. A `BTreeMap` keeps the field
/// order deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationError {
    pub fields: BTreeMap<String, String>,
}

impl ValidationError {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure message for a field
    pub fn add(&mut self, field: &str, message: &str) {
        self.fields.insert(field.to_string(), message.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Convert to a `Result`: `Err` if any field failed
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(self))
        }
    }

    /// Message recorded for a field, if any
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.fields {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", field, message)?;
            first = false;
        }
        Ok(())
    }
}
