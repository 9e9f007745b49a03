//! Core types for the collection catalog.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A validated collection name.
///
/// Collection names become part of namespaces (`db.collection`), so they are
/// restricted to a conservative character set:
/// - 1-120 characters
/// - ASCII alphanumerics, underscores, hyphens, dots
/// - Must start with a letter or underscore
///
/// The `system.` prefix is reserved for internal collections and rejected
/// here; the catalog mints those itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CollectionName(String);

impl CollectionName {
    /// Prefix reserved for internal collections.
    pub const RESERVED_PREFIX: &'static str = "system.";

    /// Name of the catalog's own bookkeeping collection.
    ///
    /// Every database carries one; it is stored like any other entry but
    /// never reported by the listing command.
    pub const BOOKKEEPING: &'static str = "system.catalog";

    /// Create a new name, validating the input.
    pub fn new(name: impl Into<String>) -> Result<Self, InvalidNameError> {
        let name = name.into();
        Self::validate(&name)?;
        if name.starts_with(Self::RESERVED_PREFIX) {
            return Err(InvalidNameError::Reserved(name));
        }
        Ok(Self(name))
    }

    /// The bookkeeping collection seeded into every database.
    pub(crate) fn bookkeeping() -> Self {
        Self(Self::BOOKKEEPING.to_string())
    }

    fn validate(name: &str) -> Result<(), InvalidNameError> {
        if name.is_empty() {
            return Err(InvalidNameError::Empty);
        }

        if name.len() > 120 {
            return Err(InvalidNameError::TooLong(name.len()));
        }

        let first = name.chars().next().unwrap();
        if !first.is_ascii_alphabetic() && first != '_' {
            return Err(InvalidNameError::InvalidStart(first));
        }

        for (i, c) in name.chars().enumerate() {
            if !c.is_ascii_alphanumeric() && c != '_' && c != '-' && c != '.' {
                return Err(InvalidNameError::InvalidCharacter { char: c, position: i });
            }
        }

        Ok(())
    }

    /// Get the string representation.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert to an owned String.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CollectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for CollectionName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Creation options for a collection, echoed back by the listing command.
///
/// Default options serialize to the empty document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionOptions {
    /// Whether the collection is capped to a fixed size.
    #[serde(default, skip_serializing_if = "is_false")]
    pub capped: bool,

    /// Maximum size in bytes for capped collections.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_size_bytes: Option<u64>,

    /// Maximum document count for capped collections.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_documents: Option<u64>,
}

impl CollectionOptions {
    /// Options for a capped collection of at most `max_size_bytes` bytes.
    pub fn capped(max_size_bytes: u64) -> Self {
        Self {
            capped: true,
            max_size_bytes: Some(max_size_bytes),
            max_documents: None,
        }
    }

    /// Set the maximum number of documents.
    pub fn with_max_documents(mut self, max: u64) -> Self {
        self.max_documents = Some(max);
        self
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Error type for invalid collection names.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidNameError {
    #[error("name cannot be empty")]
    Empty,

    #[error("name too long: {0} characters")]
    TooLong(usize),

    #[error("name cannot start with '{0}'")]
    InvalidStart(char),

    #[error("invalid character '{char}' at position {position}")]
    InvalidCharacter { char: char, position: usize },

    #[error("'{0}' is in the reserved system namespace")]
    Reserved(String),
}
