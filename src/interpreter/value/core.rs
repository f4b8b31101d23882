use std::{
    cmp::Ordering,
    collections::{BTreeMap, HashMap},
    fmt,
    sync::Arc,
};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;

use crate::{key::EntityId, util::num::format_number};

/// Property values of one entity, keyed by property name.
pub type PropertyMap = HashMap<String, Value>;

/// Represents a runtime value.
///
/// Collections and records are reference counted so that values can be
/// cloned cheaply while paths are followed, and so that they can be shared
/// across threads.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// The absence of a value.
    Null,
    /// `true` or `false`.
    Bool(bool),
    /// A double precision number; the only numeric type.
    Number(f64),
    /// A UTF-8 string.
    String(String),
    /// A point in time, always normalised to UTC.
    Date(DateTime<Utc>),
    /// An ordered collection, such as the targets of a relationship.
    List(Arc<Vec<Self>>),
    /// A nested object with named fields.
    Record(Arc<BTreeMap<String, Self>>),
    /// A link to another entity; following it goes through the resolver.
    Entity(EntityId),
}

/// Type tags for values; used in function signatures and error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Null,
    Boolean,
    Number,
    String,
    Date,
    List,
    Record,
    Entity,
    /// Any of the above; for functions whose result type follows their input.
    Any,
}

impl ValueType {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::Number => "number",
            Self::String => "string",
            Self::Date => "date",
            Self::List => "list",
            Self::Record => "record",
            Self::Entity => "entity",
            Self::Any => "any",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Number(f64::from(v))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Date(v)
    }
}

impl From<Vec<Self>> for Value {
    fn from(v: Vec<Self>) -> Self {
        Self::List(Arc::new(v))
    }
}

impl From<BTreeMap<String, Self>> for Value {
    fn from(v: BTreeMap<String, Self>) -> Self {
        Self::Record(Arc::new(v))
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl Value {
    /// Builds a record from `(name, value)` pairs.
    ///
    /// # Example
    /// ```
    /// use computed_props::interpreter::value::core::Value;
    ///
    /// let line = Value::record([("amount", Value::from(5)), ("sku", Value::from("A-1"))]);
    /// assert_eq!(line.type_name(), "record");
    /// ```
    #[must_use]
    pub fn record<K: Into<String>>(fields: impl IntoIterator<Item = (K, Self)>) -> Self {
        Self::Record(Arc::new(fields.into_iter()
                                    .map(|(name, value)| (name.into(), value))
                                    .collect()))
    }

    #[must_use]
    pub const fn value_type(&self) -> ValueType {
        match self {
            Self::Null => ValueType::Null,
            Self::Bool(_) => ValueType::Boolean,
            Self::Number(_) => ValueType::Number,
            Self::String(_) => ValueType::String,
            Self::Date(_) => ValueType::Date,
            Self::List(_) => ValueType::List,
            Self::Record(_) => ValueType::Record,
            Self::Entity(_) => ValueType::Entity,
        }
    }

    /// The name of the value's type, as used in error messages.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.value_type().name()
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Reads the value as a condition: booleans as themselves and null as
    /// `false`. Any other type has no truth value.
    #[must_use]
    pub const fn as_condition(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Null => Some(false),
            _ => None,
        }
    }

    /// Reads the value as a date. Strings are accepted in RFC 3339 form,
    /// as `YYYY-MM-DDTHH:MM:SS` (taken as UTC) or as `YYYY-MM-DD` (midnight
    /// UTC).
    ///
    /// # Example
    /// ```
    /// use chrono::Datelike;
    /// use computed_props::interpreter::value::core::Value;
    ///
    /// let date = Value::from("2024-03-09").as_date().unwrap();
    /// assert_eq!((date.year(), date.month(), date.day()), (2024, 3, 9));
    /// assert!(Value::from("not a date").as_date().is_none());
    /// ```
    #[must_use]
    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Date(d) => Some(*d),
            Self::String(s) => parse_date(s),
            _ => None,
        }
    }

    /// Orders two values of the same kind: numbers, strings or dates.
    /// A date also compares with a string that reads as a date.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.partial_cmp(b),
            (Self::String(a), Self::String(b)) => Some(a.cmp(b)),
            (Self::Date(a), Self::Date(b)) => Some(a.cmp(b)),
            (Self::Date(a), Self::String(_)) => other.as_date().map(|b| a.cmp(&b)),
            (Self::String(_), Self::Date(b)) => self.as_date().map(|a| a.cmp(b)),
            _ => None,
        }
    }
}

/// Parses the date formats accepted by [`Value::as_date`].
#[must_use]
pub fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(text) {
        return Some(date.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()
                                               .and_then(|date| date.and_hms_opt(0, 0, 0))
                                               .map(|naive| naive.and_utc())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => f.write_str(&format_number(*n)),
            Self::String(s) => f.write_str(s),
            Self::Date(d) => write!(f, "{}", d.to_rfc3339()),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            },
            Self::Record(fields) => {
                f.write_str("{")?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name}: {value}")?;
                }
                f.write_str("}")
            },
            Self::Entity(id) => write!(f, "@{{{id}}}"),
        }
    }
}
