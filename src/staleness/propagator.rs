use std::{
    collections::{HashSet, VecDeque},
    sync::Arc,
};

use tracing::{debug, info, trace};

use crate::{
    key::{PropertyKey, TenantId},
    staleness::{
        adapter::{DependencyGraph, EventSink},
        event::PropertyStaleEvent,
    },
};

/// Failure of a propagation run. Events emitted before the failure are not
/// rolled back.
#[derive(Debug, thiserror::Error)]
pub enum PropagationError {
    #[error("dependency graph failed to {operation} `{key}`")]
    Graph {
        operation: &'static str,
        key:       PropertyKey,
        #[source]
        source:    anyhow::Error,
    },
    #[error("event sink rejected the stale event for `{key}`")]
    Sink {
        key:    PropertyKey,
        #[source]
        source: anyhow::Error,
    },
    #[error("deferred staleness callback failed")]
    Callback(#[source] anyhow::Error),
}

/// Marks every property that transitively depends on a changed property as
/// stale.
///
/// A run is a breadth-first walk from the changed properties. Each reachable
/// property is marked through [`DependencyGraph::mark_stale`] and reported by
/// exactly one [`PropertyStaleEvent`], which is also passed to the sink when
/// one is configured. The changed properties themselves are never marked,
/// even when a cycle leads back to them.
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
/// let key = |name: &str| PropertyKey::new(order, name);
///
/// let graph = Arc::new(InMemoryDependencyGraph::new());
/// graph.add_dependency(tenant, key("subtotal"), key("lines"));
/// graph.add_dependency(tenant, key("total"), key("subtotal"));
///
/// let propagator = StalenessPropagator::new(graph.clone());
/// let events = propagator.propagate_staleness(tenant, &key("lines")).await.unwrap();
///
/// assert_eq!(events.len(), 2);
/// assert_eq!(events[1].caused_by, key("subtotal"));
/// assert!(graph.is_stale(tenant, &key("total")));
/// # });
/// ```
#[derive(Clone)]
pub struct StalenessPropagator {
    graph: Arc<dyn DependencyGraph>,
    sink:  Option<Arc<dyn EventSink>>,
}

impl StalenessPropagator {
    #[must_use]
    pub fn new(graph: Arc<dyn DependencyGraph>) -> Self {
        Self { graph, sink: None }
    }

    /// Also sends every event to `sink` as it is produced.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Propagates one change.
    ///
    /// # Errors
    /// [`PropagationError::Graph`] or [`PropagationError::Sink`] when an
    /// adapter fails; the run stops at that point.
    pub async fn propagate_staleness(&self,
                                     tenant: TenantId,
                                     changed: &PropertyKey)
                                     -> Result<Vec<PropertyStaleEvent>, PropagationError> {
        self.batch_propagate_staleness(tenant, std::slice::from_ref(changed)).await
    }

    /// Propagates several changes in one run.
    ///
    /// All seeds share one processed set, so a property reachable from
    /// several changes is marked once. Duplicate seeds are collapsed.
    ///
    /// # Errors
    /// Same as [`StalenessPropagator::propagate_staleness`].
    pub async fn batch_propagate_staleness(&self,
                                           tenant: TenantId,
                                           changes: &[PropertyKey])
                                           -> Result<Vec<PropertyStaleEvent>, PropagationError> {
        let mut processed: HashSet<PropertyKey> = HashSet::with_capacity(changes.len());
        let mut seeds = Vec::with_capacity(changes.len());
        for changed in changes {
            if processed.insert(changed.clone()) {
                seeds.push(changed);
            }
        }
        debug!(%tenant, seeds = seeds.len(), "staleness propagation started");

        let mut queue: VecDeque<(PropertyKey, PropertyKey)> = VecDeque::new();
        for seed in seeds {
            for dependent in self.dependents(tenant, seed).await? {
                queue.push_back((dependent, seed.clone()));
            }
        }

        let mut events = Vec::new();
        while let Some((key, caused_by)) = queue.pop_front() {
            if !processed.insert(key.clone()) {
                continue;
            }

            self.graph
                .mark_stale(tenant, &key)
                .await
                .map_err(|source| PropagationError::Graph { operation: "mark stale",
                                                            key: key.clone(),
                                                            source })?;
            let event = PropertyStaleEvent::new(tenant, &key, caused_by);
            trace!(key = %key, caused_by = %event.caused_by, "property marked stale");
            if let Some(sink) = &self.sink {
                sink.emit(&event)
                    .await
                    .map_err(|source| PropagationError::Sink { key: key.clone(),
                                                               source })?;
            }

            for dependent in self.dependents(tenant, &key).await? {
                if !processed.contains(&dependent) {
                    queue.push_back((dependent, key.clone()));
                }
            }
            events.push(event);
        }

        info!(%tenant, stale = events.len(), "staleness propagation finished");
        Ok(events)
    }

    async fn dependents(&self,
                        tenant: TenantId,
                        key: &PropertyKey)
                        -> Result<Vec<PropertyKey>, PropagationError> {
        self.graph
            .get_dependents(tenant, key)
            .await
            .map_err(|source| PropagationError::Graph { operation: "read dependents of",
                                                        key: key.clone(),
                                                        source })
    }
}
