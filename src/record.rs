//! Structured-store records.
//!
//! A record is the fact-store side of an entity: a stable id, a set of
//! claims (predicate/value pairs) and sitelinks that cross-reference the
//! entity's document in each language.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::value::Value;

/// Stable identifier into the structured fact store (e.g. `Q90`).
///
/// Ids are case-sensitive, non-empty and contain no whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecordId(String);

impl RecordId {
    /// Creates a record id, validating its shape.
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
            return Err(ValidationError::InvalidRecordId { value: id });
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RecordId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for RecordId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RecordId> for String {
    fn from(id: RecordId) -> Self {
        id.0
    }
}

/// A single predicate/value statement of a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    /// Predicate identifier or name (e.g. `P1082` or `population`).
    pub predicate: String,
    /// Claimed value.
    pub value: Value,
}

impl Claim {
    #[must_use]
    pub fn new(predicate: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            predicate: predicate.into(),
            value: value.into(),
        }
    }
}

/// A structured-store entry for an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Stable store id.
    pub id: RecordId,

    /// Primary label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Alternative labels.
    #[serde(default)]
    pub aliases: Vec<String>,

    /// Document titles keyed by language code.
    #[serde(default)]
    pub sitelinks: BTreeMap<String, String>,

    /// Predicate/value statements.
    #[serde(default)]
    pub claims: Vec<Claim>,
}

impl Record {
    /// Creates an empty record with the given id.
    #[must_use]
    pub fn new(id: RecordId) -> Self {
        Self {
            id,
            label: None,
            aliases: Vec::new(),
            sitelinks: BTreeMap::new(),
            claims: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    #[must_use]
    pub fn with_sitelink(mut self, language: impl Into<String>, title: impl Into<String>) -> Self {
        self.sitelinks.insert(language.into(), title.into());
        self
    }

    #[must_use]
    pub fn with_claim(mut self, predicate: impl Into<String>, value: impl Into<Value>) -> Self {
        self.claims.push(Claim::new(predicate, value));
        self
    }

    /// The cross-referenced document title in `language`, if any.
    #[must_use]
    pub fn document_title(&self, language: &str) -> Option<&str> {
        self.sitelinks.get(language).map(String::as_str)
    }

    /// Iterates over every label this record is known by.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.label
            .iter()
            .chain(self.aliases.iter())
            .map(String::as_str)
    }
}
