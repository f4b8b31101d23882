use std::{collections::BTreeMap, sync::Arc};

use serde_json::{Map, Number};
use uuid::Uuid;

use crate::interpreter::value::core::{PropertyMap, Value};

/// Object key that marks a JSON object as an entity link:
/// `{"$entity": "<uuid>"}`.
pub const ENTITY_KEY: &str = "$entity";

impl From<&serde_json::Value> for Value {
    fn from(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(*b),
            serde_json::Value::Number(n) => n.as_f64().map_or(Self::Null, Self::Number),
            serde_json::Value::String(s) => Self::String(s.clone()),
            serde_json::Value::Array(items) => {
                Self::List(Arc::new(items.iter().map(Self::from).collect()))
            },
            serde_json::Value::Object(fields) => entity_link(fields).map_or_else(|| {
                Self::Record(Arc::new(fields.iter()
                                            .map(|(name, value)| (name.clone(), Self::from(value)))
                                            .collect::<BTreeMap<_, _>>()))
            }, Self::Entity),
        }
    }
}

fn entity_link(fields: &Map<String, serde_json::Value>) -> Option<Uuid> {
    if fields.len() != 1 {
        return None;
    }
    fields.get(ENTITY_KEY)
          .and_then(serde_json::Value::as_str)
          .and_then(|id| Uuid::parse_str(id).ok())
}

impl Value {
    /// Converts the value to JSON. Dates become RFC 3339 strings, entity
    /// links become `{"$entity": "<uuid>"}` and non-finite numbers become
    /// `null`.
    ///
    /// # Example
    /// ```
    /// use computed_props::interpreter::value::core::Value;
    ///
    /// let value = Value::from(vec![Value::from(1), Value::Null]);
    /// assert_eq!(value.to_json(), serde_json::json!([1.0, null]));
    /// ```
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Number(n) => Number::from_f64(*n).map_or(serde_json::Value::Null,
                                                           serde_json::Value::Number),
            Self::String(s) => serde_json::Value::String(s.clone()),
            Self::Date(d) => serde_json::Value::String(d.to_rfc3339()),
            Self::List(items) => serde_json::Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Record(fields) => {
                serde_json::Value::Object(fields.iter()
                                                .map(|(name, value)| (name.clone(), value.to_json()))
                                                .collect())
            },
            Self::Entity(id) => serde_json::json!({ ENTITY_KEY: id.to_string() }),
        }
    }
}

/// Reads a JSON object as a property map.
///
/// Returns `None` when `json` is not an object.
///
/// # Example
/// ```
/// use computed_props::interpreter::value::{core::Value, json::property_map_from_json};
///
/// let map = property_map_from_json(&serde_json::json!({ "price": 10, "name": "Widget" })).unwrap();
/// assert_eq!(map["price"], Value::Number(10.0));
/// assert!(property_map_from_json(&serde_json::json!([1, 2])).is_none());
/// ```
#[must_use]
pub fn property_map_from_json(json: &serde_json::Value) -> Option<PropertyMap> {
    json.as_object().map(|fields| {
                        fields.iter()
                              .map(|(name, value)| (name.clone(), Value::from(value)))
                              .collect()
                    })
}
