use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::key::{EntityId, PropertyKey, TenantId};

/// Records that a property became stale because something it depends on
/// changed.
///
/// One event is produced per property per propagation run. Events are
/// immutable facts; they serialize in camelCase for transport.
///
/// # Example
/// ```
/// use computed_props::{key::PropertyKey, staleness::PropertyStaleEvent};
/// use uuid::Uuid;
///
/// let tenant = Uuid::new_v4();
/// let order = Uuid::new_v4();
/// let event = PropertyStaleEvent::new(tenant,
///                                     &PropertyKey::new(order, "total"),
///                                     PropertyKey::new(order, "subtotal"));
///
/// assert_eq!(event.key(), PropertyKey::new(order, "total"));
/// let json = serde_json::to_value(&event).unwrap();
/// assert_eq!(json["propertyName"], "total");
/// assert_eq!(json["causedBy"]["propertyName"], "subtotal");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyStaleEvent {
    /// Unique id of this event.
    pub id:            Uuid,
    pub tenant_id:     TenantId,
    pub entity_id:     EntityId,
    pub property_name: String,
    /// The property whose dependents list led to this one: the changed
    /// property for direct dependents, an intermediate property otherwise.
    pub caused_by:     PropertyKey,
    pub occurred_at:   DateTime<Utc>,
}

impl PropertyStaleEvent {
    #[must_use]
    pub fn new(tenant_id: TenantId, key: &PropertyKey, caused_by: PropertyKey) -> Self {
        Self { id: Uuid::new_v4(),
               tenant_id,
               entity_id: key.entity_id,
               property_name: key.property_name.clone(),
               caused_by,
               occurred_at: Utc::now() }
    }

    /// The key of the property that became stale.
    #[must_use]
    pub fn key(&self) -> PropertyKey {
        PropertyKey::new(self.entity_id, self.property_name.clone())
    }
}
