use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of an entity whose properties may be referenced by expressions.
pub type EntityId = Uuid;
/// Identifier of the tenant that scopes a dependency graph.
pub type TenantId = Uuid;

/// The addressable unit of the dependency graph: one property of one entity.
///
/// The canonical string form is `"entityId.propertyName"`, which is what
/// [`fmt::Display`] produces and [`FromStr`] accepts.
///
/// # Example
/// ```
/// use computed_props::key::PropertyKey;
/// use uuid::Uuid;
///
/// let entity = Uuid::nil();
/// let key = PropertyKey::new(entity, "total");
///
/// assert_eq!(key.to_string(), "00000000-0000-0000-0000-000000000000.total");
/// assert_eq!(key.to_string().parse::<PropertyKey>().unwrap(), key);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyKey {
    /// The entity owning the property.
    pub entity_id:     EntityId,
    /// The property name on that entity.
    pub property_name: String,
}

impl PropertyKey {
    #[must_use]
    pub fn new(entity_id: EntityId, property_name: impl Into<String>) -> Self {
        Self { entity_id,
               property_name: property_name.into() }
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.entity_id, self.property_name)
    }
}

/// Failure to read a [`PropertyKey`] from its canonical string form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyParseError {
    #[error("property key `{0}` has no `.` separator")]
    MissingSeparator(String),
    #[error("property key `{0}` has an empty property name")]
    EmptyProperty(String),
    #[error("property key `{key}` has an invalid entity id")]
    InvalidEntity {
        key:    String,
        #[source]
        source: uuid::Error,
    },
}

impl FromStr for PropertyKey {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (entity, property) =
            s.split_once('.')
             .ok_or_else(|| KeyParseError::MissingSeparator(s.to_string()))?;
        if property.is_empty() {
            return Err(KeyParseError::EmptyProperty(s.to_string()));
        }
        let entity_id = Uuid::parse_str(entity).map_err(|source| KeyParseError::InvalidEntity {
                                                   key: s.to_string(),
                                                   source,
                                               })?;
        Ok(Self::new(entity_id, property))
    }
}
