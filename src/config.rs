//! Resolver configuration.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Member names that are never treated as dynamic attributes.
pub const DEFAULT_RESERVED_MEMBERS: [&str; 5] = ["to_hash", "to_ary", "to_a", "to_str", "to_int"];

/// Name suffixes that mark predicate, bang and assignment members.
pub const DEFAULT_RESERVED_SUFFIXES: [char; 3] = ['?', '!', '='];

/// Configuration shared by every entity built from a [`Resolver`](crate::entity::Resolver).
///
/// # Examples
///
/// ```
/// use factlens::ResolverConfig;
///
/// let config = ResolverConfig::from_json_str(r#"{"language": "fr"}"#).unwrap();
/// assert_eq!(config.language, "fr");
/// assert!(config.is_reserved("to_str"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Language whose sitelink is a record's cross-referenced document.
    pub language: String,
    /// Exact member names excluded from attribute access.
    pub reserved_members: BTreeSet<String>,
    /// Member name suffixes excluded from attribute access.
    pub reserved_suffixes: Vec<char>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            reserved_members: DEFAULT_RESERVED_MEMBERS
                .iter()
                .map(ToString::to_string)
                .collect(),
            reserved_suffixes: DEFAULT_RESERVED_SUFFIXES.to_vec(),
        }
    }
}

impl ResolverConfig {
    /// Parses and validates a JSON configuration. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ValidationError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ValidationError::InvalidConfig {
                reason: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the cross-reference language.
    ///
    /// The record service indexes titles by its own language; both should
    /// agree for name-first resolution to reach records.
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.language.trim().is_empty() {
            return Err(ValidationError::InvalidConfig {
                reason: "language cannot be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Returns true if `name` must never be intercepted as an attribute.
    #[must_use]
    pub fn is_reserved(&self, name: &str) -> bool {
        name.is_empty()
            || self.reserved_members.contains(name)
            || name.chars().any(|c| self.reserved_suffixes.contains(&c))
    }
}
