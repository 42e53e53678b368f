//! Value types that entity attributes can hold.
//!
//! Values are produced by an [`AttributeExtractor`](crate::entity::AttributeExtractor)
//! from a record's claims. They stay typed inside the entity; the structured
//! projection coerces them to plain JSON with [`Value::to_simple`].

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::record::RecordId;

/// A reference from one attribute value to another entity.
///
/// Links are not live entities; turn them into entities with
/// [`EntityCollection::from_values`](crate::collection::EntityCollection::from_values).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityLink {
    /// Display name of the linked entity.
    pub name: String,

    /// Structured-store id of the linked entity, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_id: Option<RecordId>,
}

impl EntityLink {
    /// Creates a link by name only.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            record_id: None,
        }
    }

    /// Creates a link with a known record id.
    #[must_use]
    pub fn with_id(name: impl Into<String>, record_id: RecordId) -> Self {
        Self {
            name: name.into(),
            record_id: Some(record_id),
        }
    }
}

/// Possible values an attribute can hold.
///
/// # Examples
///
/// ```
/// use factlens::Value;
///
/// let population = Value::Int(2_102_650);
/// assert_eq!(population.as_int(), Some(2_102_650));
/// assert_eq!(population.to_simple(), serde_json::json!(2_102_650));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Time(DateTime<Utc>),
    Quantity {
        amount: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        unit: Option<String>,
    },
    Coordinates {
        lat: f64,
        lng: f64,
    },
    Entity(EntityLink),
    List(Vec<Value>),
    Structured(serde_json::Value),
    Null,
}

impl Value {
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub const fn is_entity(&self) -> bool {
        matches!(self, Self::Entity(_))
    }

    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Reads any numeric value as a float, including quantity amounts.
    #[allow(clippy::cast_precision_loss)]
    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            Self::Quantity { amount, .. } => Some(*amount),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    pub const fn as_time(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Time(v) => Some(*v),
            _ => None,
        }
    }

    pub const fn as_entity(&self) -> Option<&EntityLink> {
        match self {
            Self::Entity(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(v) => Some(v),
            _ => None,
        }
    }

    /// Returns a human-readable type name.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Time(_) => "time",
            Self::Quantity { .. } => "quantity",
            Self::Coordinates { .. } => "coordinates",
            Self::Entity(_) => "entity",
            Self::List(_) => "list",
            Self::Structured(_) => "structured",
            Self::Null => "null",
        }
    }

    /// Coerces the value to a plain JSON value.
    ///
    /// Entity links collapse to their name, times to RFC 3339 strings and
    /// quantities to `{amount, unit}` objects. Non-finite floats become null.
    #[must_use]
    pub fn to_simple(&self) -> serde_json::Value {
        use serde_json::{json, Value as Json};

        match self {
            Self::Bool(v) => Json::Bool(*v),
            Self::Int(v) => json!(v),
            Self::Float(v) => serde_json::Number::from_f64(*v).map_or(Json::Null, Json::Number),
            Self::String(v) => Json::String(v.clone()),
            Self::Time(v) => Json::String(v.to_rfc3339()),
            Self::Quantity { amount, unit: None } => {
                serde_json::Number::from_f64(*amount).map_or(Json::Null, Json::Number)
            }
            Self::Quantity {
                amount,
                unit: Some(unit),
            } => json!({ "amount": amount, "unit": unit }),
            Self::Coordinates { lat, lng } => json!({ "lat": lat, "lng": lng }),
            Self::Entity(link) => Json::String(link.name.clone()),
            Self::List(items) => Json::Array(items.iter().map(Self::to_simple).collect()),
            Self::Structured(v) => v.clone(),
            Self::Null => Json::Null,
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::Null
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::String(v) => write!(f, "{v:?}"),
            Self::Time(v) => write!(f, "{}", v.format("%Y-%m-%d")),
            Self::Quantity { amount, unit: None } => write!(f, "{amount}"),
            Self::Quantity {
                amount,
                unit: Some(unit),
            } => write!(f, "{amount}{unit}"),
            Self::Coordinates { lat, lng } => write!(f, "#<Coord {lat},{lng}>"),
            Self::Entity(link) => write!(f, "#<Entity?({})>", link.name),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Structured(v) => write!(f, "{v}"),
            Self::Null => write!(f, "null"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Time(v)
    }
}

impl From<EntityLink> for Value {
    fn from(v: EntityLink) -> Self {
        Self::Entity(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::List(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Self::Structured(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_value_int() {
        let val = Value::Int(42);
        assert_eq!(val.as_int(), Some(42));
        assert_eq!(val.as_float(), Some(42.0));
        assert_eq!(val.type_name(), "int");
    }

    #[test]
    fn test_quantity_reads_as_float() {
        let val = Value::Quantity {
            amount: 105.4,
            unit: Some("km²".to_string()),
        };
        assert!((val.as_float().unwrap() - 105.4).abs() < f64::EPSILON);
        assert!(val.as_int().is_none());
    }

    #[test]
    fn test_to_simple_entity_link_is_name() {
        let link = EntityLink::with_id("France", RecordId::new("Q142").unwrap());
        assert_eq!(
            Value::Entity(link).to_simple(),
            serde_json::Value::String("France".to_string())
        );
    }

    #[test]
    fn test_to_simple_time_is_rfc3339() {
        let t = Utc.with_ymd_and_hms(1879, 3, 14, 0, 0, 0).unwrap();
        let simple = Value::Time(t).to_simple();
        assert!(simple.as_str().unwrap().starts_with("1879-03-14"));
    }

    #[test]
    fn test_to_simple_nested_list() {
        let val = Value::List(vec![
            Value::Entity(EntityLink::named("Seine")),
            Value::Quantity {
                amount: 12.0,
                unit: Some("m".to_string()),
            },
            Value::Null,
        ]);
        assert_eq!(
            val.to_simple(),
            serde_json::json!(["Seine", {"amount": 12.0, "unit": "m"}, null])
        );
    }

    #[test]
    fn test_to_simple_non_finite_float_is_null() {
        assert!(Value::Float(f64::NAN).to_simple().is_null());
    }

    #[test]
    fn test_value_display() {
        assert_eq!(format!("{}", Value::Bool(true)), "true");
        assert_eq!(format!("{}", Value::String("hi".into())), "\"hi\"");
        assert_eq!(format!("{}", Value::Null), "null");
        assert_eq!(
            format!("{}", Value::List(vec![Value::Int(1), Value::Int(2)])),
            "[1, 2]"
        );
        assert_eq!(
            format!("{}", Value::Entity(EntityLink::named("Paris"))),
            "#<Entity?(Paris)>"
        );
    }

    #[test]
    fn test_value_serialization() {
        let val = Value::Quantity {
            amount: 3.5,
            unit: None,
        };
        let json = serde_json::to_string(&val).unwrap();
        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(val, back);
    }

    #[test]
    fn test_value_type_mismatch() {
        let val = Value::Bool(true);
        assert!(val.as_int().is_none());
        assert!(val.as_string().is_none());
        assert!(val.as_entity().is_none());
    }
}
