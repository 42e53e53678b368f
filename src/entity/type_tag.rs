//! Type tags and the capabilities they grant.
//!
//! A type tag is derived once from an entity's document. Each tag maps to
//! a [`Capability`] that contributes computed members (e.g. a person's
//! `age`) which take precedence over plain attribute lookup.

use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, Datelike, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::entity::attributes::Attributes;
use crate::value::Value;

/// Classification of an entity, derived from its document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TypeTag {
    /// A human person
    Person,
    /// A city, town or other settlement
    City,
    /// A sovereign state
    Country,
    /// A company, institution, or group
    Organization,
    /// Any other classification
    Custom(String),
}

impl TryFrom<String> for TypeTag {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let value = value.trim();
        if value.is_empty() {
            return Err("type tag cannot be empty".to_string());
        }

        if let Some(rest) = value
            .get(..7)
            .filter(|p| p.eq_ignore_ascii_case("custom:"))
            .map(|_| value[7..].trim())
        {
            if rest.is_empty() {
                return Err("custom type tag cannot be empty".to_string());
            }
            return Ok(Self::Custom(rest.to_string()));
        }

        Ok(if value.eq_ignore_ascii_case("person") {
            Self::Person
        } else if value.eq_ignore_ascii_case("city") {
            Self::City
        } else if value.eq_ignore_ascii_case("country") {
            Self::Country
        } else if value.eq_ignore_ascii_case("organization") {
            Self::Organization
        } else {
            return Err(format!(
                "unknown type tag: {value}. Use person, city, country, organization or custom:<name>"
            ));
        })
    }
}

impl From<TypeTag> for String {
    fn from(value: TypeTag) -> Self {
        value.to_string()
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Person => write!(f, "person"),
            Self::City => write!(f, "city"),
            Self::Country => write!(f, "country"),
            Self::Organization => write!(f, "organization"),
            Self::Custom(name) => write!(f, "custom:{name}"),
        }
    }
}

/// Derives a type tag from a document.
pub trait TypeClassifier: Send + Sync {
    fn derive(&self, document: &Document) -> Option<TypeTag>;
}

const INFOBOX_PATTERN: &str = r"(?i)\{\{\s*infobox[\s_]+([^|}\n]+)";

fn infobox_regex() -> Option<&'static Regex> {
    static INFOBOX: OnceLock<Option<Regex>> = OnceLock::new();
    INFOBOX
        .get_or_init(|| Regex::new(INFOBOX_PATTERN).ok())
        .as_ref()
}

fn normalize_template(name: &str) -> String {
    name.split(|c: char| c.is_whitespace() || c == '_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Classifies documents by the name of their first infobox template.
///
/// Templates without a mapping classify as [`TypeTag::Custom`] carrying the
/// normalised template name; documents without an infobox stay untyped.
#[derive(Debug, Clone)]
pub struct InfoboxClassifier {
    templates: HashMap<String, TypeTag>,
}

impl Default for InfoboxClassifier {
    fn default() -> Self {
        let mut templates = HashMap::new();
        for name in [
            "person",
            "officeholder",
            "scientist",
            "writer",
            "artist",
            "musical artist",
            "royalty",
            "football biography",
        ] {
            templates.insert(name.to_string(), TypeTag::Person);
        }
        for name in ["settlement", "city", "french commune", "german location", "uk place"] {
            templates.insert(name.to_string(), TypeTag::City);
        }
        for name in ["country", "former country"] {
            templates.insert(name.to_string(), TypeTag::Country);
        }
        for name in ["company", "organization", "university", "political party"] {
            templates.insert(name.to_string(), TypeTag::Organization);
        }
        Self { templates }
    }
}

impl InfoboxClassifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps an additional infobox template name to a tag.
    #[must_use]
    pub fn with_template(mut self, template: &str, tag: TypeTag) -> Self {
        self.templates.insert(normalize_template(template), tag);
        self
    }
}

impl TypeClassifier for InfoboxClassifier {
    fn derive(&self, document: &Document) -> Option<TypeTag> {
        let captures = infobox_regex()?.captures(&document.content)?;
        let template = normalize_template(captures.get(1)?.as_str());
        if template.is_empty() {
            return None;
        }
        Some(
            self.templates
                .get(&template)
                .cloned()
                .unwrap_or(TypeTag::Custom(template)),
        )
    }
}

/// Computed members contributed by a type tag.
pub trait Capability: Send + Sync {
    /// Member names this capability answers.
    fn members(&self) -> &'static [&'static str];

    /// Evaluates `member` against the entity's attributes.
    fn evaluate(&self, member: &str, attributes: &Attributes) -> Option<Value>;

    fn has_member(&self, member: &str) -> bool {
        self.members().contains(&member)
    }
}

/// Whole years between two instants.
fn years_between(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    let mut years = i64::from(to.year() - from.year());
    if (to.month(), to.day()) < (from.month(), from.day()) {
        years -= 1;
    }
    years
}

struct PersonCapability;

impl Capability for PersonCapability {
    fn members(&self) -> &'static [&'static str] {
        &["age", "alive"]
    }

    fn evaluate(&self, member: &str, attributes: &Attributes) -> Option<Value> {
        let born = attributes.get("birth_date").and_then(Value::as_time);
        let died = attributes.get("death_date").and_then(Value::as_time);
        match member {
            "age" => born.map(|b| Value::Int(years_between(b, died.unwrap_or_else(Utc::now)))),
            "alive" => Some(Value::Bool(died.is_none())),
            _ => None,
        }
    }
}

struct PlaceCapability;

impl Capability for PlaceCapability {
    fn members(&self) -> &'static [&'static str] {
        &["population_density"]
    }

    fn evaluate(&self, member: &str, attributes: &Attributes) -> Option<Value> {
        if member != "population_density" {
            return None;
        }
        let population = attributes.get("population").and_then(Value::as_float)?;
        let area = attributes.get("area").and_then(Value::as_float)?;
        (area > 0.0).then(|| Value::Float(population / area))
    }
}

struct NoCapability;

impl Capability for NoCapability {
    fn members(&self) -> &'static [&'static str] {
        &[]
    }

    fn evaluate(&self, _member: &str, _attributes: &Attributes) -> Option<Value> {
        None
    }
}

/// Looks up the capability granted by `tag`.
#[must_use]
pub fn capability_for(tag: &TypeTag) -> &'static dyn Capability {
    match tag {
        TypeTag::Person => &PersonCapability,
        TypeTag::City | TypeTag::Country => &PlaceCapability,
        TypeTag::Organization | TypeTag::Custom(_) => &NoCapability,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn doc(content: &str) -> Document {
        Document::new("Test", content)
    }

    #[test]
    fn test_type_tag_display_and_parse() {
        assert_eq!(TypeTag::City.to_string(), "city");
        assert_eq!(TypeTag::try_from("Person".to_string()).unwrap(), TypeTag::Person);
        assert_eq!(
            TypeTag::try_from("custom:river".to_string()).unwrap(),
            TypeTag::Custom("river".to_string())
        );
        assert!(TypeTag::try_from("planet".to_string()).is_err());
        assert!(TypeTag::try_from("custom:".to_string()).is_err());
    }

    #[test]
    fn test_type_tag_serde_is_string() {
        let json = serde_json::to_value(TypeTag::Country).unwrap();
        assert_eq!(json, serde_json::Value::String("country".to_string()));
        let parsed: TypeTag = serde_json::from_str("\"custom:river\"").unwrap();
        assert_eq!(parsed, TypeTag::Custom("river".to_string()));
    }

    #[test]
    fn test_infobox_classifier() {
        let classifier = InfoboxClassifier::new();
        assert_eq!(
            classifier.derive(&doc("{{Infobox settlement\n| name = Paris}}")),
            Some(TypeTag::City)
        );
        assert_eq!(
            classifier.derive(&doc("intro\n{{infobox_Scientist | name = Marie}}")),
            Some(TypeTag::Person)
        );
        assert_eq!(
            classifier.derive(&doc("{{Infobox river|name=Seine}}")),
            Some(TypeTag::Custom("river".to_string()))
        );
        assert_eq!(classifier.derive(&doc("no templates here")), None);
    }

    #[test]
    fn test_infobox_classifier_custom_template() {
        let classifier = InfoboxClassifier::new()
            .with_template("Planet", TypeTag::Custom("planet".to_string()));
        assert_eq!(
            classifier.derive(&doc("{{Infobox planet}}")),
            Some(TypeTag::Custom("planet".to_string()))
        );
    }

    #[test]
    fn test_person_age_until_death() {
        let mut attrs = Attributes::new();
        attrs.insert(
            "birth_date",
            Value::Time(Utc.with_ymd_and_hms(1879, 3, 14, 0, 0, 0).unwrap()),
        );
        attrs.insert(
            "death_date",
            Value::Time(Utc.with_ymd_and_hms(1955, 4, 18, 0, 0, 0).unwrap()),
        );

        let person = capability_for(&TypeTag::Person);
        assert_eq!(person.evaluate("age", &attrs), Some(Value::Int(76)));
        assert_eq!(person.evaluate("alive", &attrs), Some(Value::Bool(false)));
    }

    #[test]
    fn test_person_age_before_birthday() {
        let born = Utc.with_ymd_and_hms(2000, 6, 15, 0, 0, 0).unwrap();
        let before = Utc.with_ymd_and_hms(2010, 6, 14, 0, 0, 0).unwrap();
        assert_eq!(years_between(born, before), 9);
    }

    #[test]
    fn test_population_density() {
        let mut attrs = Attributes::new();
        attrs.insert("population", Value::Int(2000));
        attrs.insert(
            "area",
            Value::Quantity {
                amount: 100.0,
                unit: Some("km²".to_string()),
            },
        );
        let city = capability_for(&TypeTag::City);
        assert!(city.has_member("population_density"));
        assert_eq!(
            city.evaluate("population_density", &attrs),
            Some(Value::Float(20.0))
        );

        attrs.insert("area", Value::Int(0));
        assert_eq!(city.evaluate("population_density", &attrs), None);
    }

    #[test]
    fn test_untyped_capability_is_empty() {
        assert!(capability_for(&TypeTag::Organization).members().is_empty());
    }
}
