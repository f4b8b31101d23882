use std::{collections::HashSet, future::Future, sync::Arc};

use parking_lot::Mutex;
use tracing::debug;

use crate::{
    key::{EntityId, PropertyKey, TenantId},
    staleness::{
        event::PropertyStaleEvent,
        propagator::{PropagationError, StalenessPropagator},
    },
};

/// Handle passed to a deferred-staleness callback to note changed
/// properties. Clones share the same record.
#[derive(Debug, Clone, Default)]
pub struct StaleRecorder {
    changes: Arc<Mutex<Vec<PropertyKey>>>,
}

impl StaleRecorder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, entity: EntityId, property: impl Into<String>) {
        self.record_key(PropertyKey::new(entity, property));
    }

    pub fn record_key(&self, key: PropertyKey) {
        self.changes.lock().push(key);
    }

    /// Number of recorded changes, duplicates included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.changes.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.lock().is_empty()
    }

    /// Takes the distinct recorded keys in first-recorded order.
    #[must_use]
    pub fn drain(&self) -> Vec<PropertyKey> {
        let recorded = std::mem::take(&mut *self.changes.lock());
        let mut seen = HashSet::with_capacity(recorded.len());
        recorded.into_iter().filter(|key| seen.insert(key.clone())).collect()
    }
}

impl StalenessPropagator {
    /// Runs `f` with a [`StaleRecorder`] and propagates once afterwards.
    ///
    /// Writes made inside `f` only record which properties changed. When `f`
    /// succeeds, the distinct recorded keys seed a single batch run, so ten
    /// writes to one property cost one traversal instead of ten. When `f`
    /// fails nothing is propagated.
    ///
    /// ## Example
    /// ```
    /// use std::sync::Arc;
    ///
    /// use computed_props::{key::PropertyKey,
    ///                      staleness::{InMemoryDependencyGraph, StalenessPropagator}};
    /// use uuid::Uuid;
    ///
    /// # tokio::runtime::Runtime::new().unwrap().block_on(async {
    /// let tenant = Uuid::new_v4();
    /// let order = Uuid::new_v4();
    /// let graph = Arc::new(InMemoryDependencyGraph::new());
    /// graph.add_dependency(tenant, PropertyKey::new(order, "total"), PropertyKey::new(order, "qty"));
    ///
    /// let propagator = StalenessPropagator::new(graph);
    /// let (written, events) = propagator.with_deferred_staleness(tenant, |recorder| async move {
    ///                                       for _ in 0..10 {
    ///                                           recorder.record(order, "qty");
    ///                                       }
    ///                                       Ok(10)
    ///                                   })
    ///                                   .await
    ///                                   .unwrap();
    ///
    /// assert_eq!(written, 10);
    /// assert_eq!(events.len(), 1);
    /// # });
    /// ```
    ///
    /// # Errors
    /// [`PropagationError::Callback`] when `f` fails, otherwise the errors of
    /// [`StalenessPropagator::batch_propagate_staleness`].
    pub async fn with_deferred_staleness<T, F, Fut>(&self,
                                                    tenant: TenantId,
                                                    f: F)
                                                    -> Result<(T, Vec<PropertyStaleEvent>), PropagationError>
        where F: FnOnce(StaleRecorder) -> Fut,
              Fut: Future<Output = anyhow::Result<T>>
    {
        let recorder = StaleRecorder::new();
        let value = f(recorder.clone()).await.map_err(PropagationError::Callback)?;

        let recorded = recorder.len();
        let changes = recorder.drain();
        debug!(%tenant, recorded, distinct = changes.len(), "deferred staleness collected");

        let events = self.batch_propagate_staleness(tenant, &changes).await?;
        Ok((value, events))
    }
}
