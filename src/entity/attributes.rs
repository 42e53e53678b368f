//! Attribute mapping and extraction from records.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::record::Record;
use crate::value::Value;

/// Open-ended attribute mapping of an entity, ordered by name.
///
/// The mapping only grows: [`Attributes::merge`] adds new keys and
/// refreshes existing ones, it never removes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes(BTreeMap<String, Value>);

impl Attributes {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    #[must_use]
    pub fn contains_key(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(name.into(), value)
    }

    /// Merges `other` into this mapping, returning how many keys were new.
    pub fn merge(&mut self, other: Self) -> usize {
        let mut added = 0;
        for (name, value) in other.0 {
            if self.0.insert(name, value).is_none() {
                added += 1;
            }
        }
        added
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Value)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Turns a record's claims into an attribute mapping.
pub trait AttributeExtractor: Send + Sync {
    fn extract(&self, record: &Record) -> Attributes;
}

/// Normalises a predicate into an attribute name (`Birth Date` → `birth_date`).
#[must_use]
pub fn attribute_name(predicate: &str) -> String {
    predicate
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

/// Extracts attributes by renaming predicates through a vocabulary.
///
/// Unmapped predicates keep their normalised predicate name unless the
/// vocabulary is strict, in which case they are dropped. A predicate
/// claimed more than once yields a [`Value::List`] in claim order.
#[derive(Debug, Clone, Default)]
pub struct PredicateVocabulary {
    names: HashMap<String, String>,
    strict: bool,
}

impl PredicateVocabulary {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A vocabulary that drops predicates it has no name for.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            names: HashMap::new(),
            strict: true,
        }
    }

    /// Maps `predicate` (e.g. `P1082`) to attribute `name` (e.g. `population`).
    #[must_use]
    pub fn with(mut self, predicate: impl Into<String>, name: &str) -> Self {
        self.names.insert(predicate.into(), attribute_name(name));
        self
    }

    fn name_for(&self, predicate: &str) -> Option<String> {
        match self.names.get(predicate) {
            Some(name) => Some(name.clone()),
            None if self.strict => None,
            None => Some(attribute_name(predicate)).filter(|n| !n.is_empty()),
        }
    }
}

impl AttributeExtractor for PredicateVocabulary {
    fn extract(&self, record: &Record) -> Attributes {
        let mut grouped: BTreeMap<String, Vec<Value>> = BTreeMap::new();
        for claim in &record.claims {
            if let Some(name) = self.name_for(&claim.predicate) {
                grouped.entry(name).or_default().push(claim.value.clone());
            }
        }

        grouped
            .into_iter()
            .map(|(name, mut values)| {
                let value = if values.len() == 1 {
                    values.remove(0)
                } else {
                    Value::List(values)
                };
                (name, value)
            })
            .collect()
    }
}
