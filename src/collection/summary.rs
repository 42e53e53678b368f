//! Aggregate description of a collection.

use std::collections::BTreeMap;
use std::fmt;

use crate::collection::collection::EntityCollection;
use crate::describe::describe;

/// Distribution of type tags and attribute keys across a collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionSummary {
    /// Number of members, nil placeholders included.
    pub count: usize,
    /// Loaded members per type tag, ordered by tag.
    pub types: BTreeMap<String, usize>,
    /// Members carrying each attribute key, ordered by key.
    pub keys: BTreeMap<String, usize>,
}

impl CollectionSummary {
    pub(crate) fn of(collection: &EntityCollection) -> Self {
        let mut summary = Self {
            count: collection.len(),
            ..Self::default()
        };
        for entity in collection.entities() {
            let entity = entity.borrow();
            if entity.is_loaded() {
                if let Some(tag) = entity.type_tag() {
                    *summary.types.entry(tag.to_string()).or_default() += 1;
                }
            }
            for key in entity.attributes().keys() {
                *summary.keys.entry(key.to_string()).or_default() += 1;
            }
        }
        summary
    }
}

fn counts(map: &BTreeMap<String, usize>) -> String {
    map.iter()
        .map(|(k, c)| format!("{k} ({c})"))
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for CollectionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows = vec![
            ("types".to_string(), counts(&self.types)),
            ("keys".to_string(), counts(&self.keys)),
        ];
        let title = format!("#<EntityCollection({} items)>", self.count);
        f.write_str(&describe(&title, &rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let summary = CollectionSummary {
            count: 3,
            types: BTreeMap::from([("city".to_string(), 2), ("person".to_string(), 1)]),
            keys: BTreeMap::from([("population".to_string(), 2)]),
        };
        assert_eq!(
            summary.to_string(),
            "#<EntityCollection(3 items)>\n  types: city (2), person (1)\n   keys: population (2)"
        );
    }
}
