use std::{
    collections::{HashMap, HashSet},
    sync::atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};

use crate::{
    key::{PropertyKey, TenantId},
    staleness::event::PropertyStaleEvent,
};

/// The store of dependency edges between properties.
///
/// The propagator only ever asks for the direct dependents of one key at a
/// time, so implementations may load the graph lazily.
#[async_trait]
pub trait DependencyGraph: Send + Sync {
    /// Properties whose expressions read `key`.
    async fn get_dependents(&self, tenant: TenantId, key: &PropertyKey) -> anyhow::Result<Vec<PropertyKey>>;

    /// Records that `key` must be recomputed.
    async fn mark_stale(&self, tenant: TenantId, key: &PropertyKey) -> anyhow::Result<()>;
}

/// Receives every stale event as it is produced.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn emit(&self, event: &PropertyStaleEvent) -> anyhow::Result<()>;
}

/// A [`DependencyGraph`] held in memory, keyed by tenant.
///
/// It counts `get_dependents` calls so callers can observe how much of the
/// graph a propagation run touched.
#[derive(Debug, Default)]
pub struct InMemoryDependencyGraph {
    dependents: RwLock<HashMap<(TenantId, PropertyKey), Vec<PropertyKey>>>,
    stale:      RwLock<HashSet<(TenantId, PropertyKey)>>,
    lookups:    AtomicUsize,
}

impl InMemoryDependencyGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `dependent` reads `dependency`.
    pub fn add_dependency(&self, tenant: TenantId, dependent: PropertyKey, dependency: PropertyKey) {
        let mut dependents = self.dependents.write();
        let entry = dependents.entry((tenant, dependency)).or_default();
        if !entry.contains(&dependent) {
            entry.push(dependent);
        }
    }

    /// Replaces the dependencies of `dependent` with `dependencies`, for
    /// example after its expression was edited and re-extracted.
    pub fn set_dependencies(&self,
                            tenant: TenantId,
                            dependent: &PropertyKey,
                            dependencies: impl IntoIterator<Item = PropertyKey>) {
        let mut graph = self.dependents.write();
        for ((owner, _), list) in graph.iter_mut() {
            if *owner == tenant {
                list.retain(|key| key != dependent);
            }
        }
        for dependency in dependencies {
            let entry = graph.entry((tenant, dependency)).or_default();
            if !entry.contains(dependent) {
                entry.push(dependent.clone());
            }
        }
    }

    #[must_use]
    pub fn is_stale(&self, tenant: TenantId, key: &PropertyKey) -> bool {
        self.stale.read().contains(&(tenant, key.clone()))
    }

    /// Stale keys of `tenant`, sorted.
    #[must_use]
    pub fn stale_keys(&self, tenant: TenantId) -> Vec<PropertyKey> {
        let mut keys: Vec<PropertyKey> = self.stale
                                             .read()
                                             .iter()
                                             .filter(|(owner, _)| *owner == tenant)
                                             .map(|(_, key)| key.clone())
                                             .collect();
        keys.sort();
        keys
    }

    /// Clears the stale mark, as a recomputation would.
    pub fn clear_stale(&self, tenant: TenantId, key: &PropertyKey) -> bool {
        self.stale.write().remove(&(tenant, key.clone()))
    }

    /// Number of `get_dependents` calls served so far.
    #[must_use]
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl DependencyGraph for InMemoryDependencyGraph {
    async fn get_dependents(&self, tenant: TenantId, key: &PropertyKey) -> anyhow::Result<Vec<PropertyKey>> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        Ok(self.dependents
               .read()
               .get(&(tenant, key.clone()))
               .cloned()
               .unwrap_or_default())
    }

    async fn mark_stale(&self, tenant: TenantId, key: &PropertyKey) -> anyhow::Result<()> {
        self.stale.write().insert((tenant, key.clone()));
        Ok(())
    }
}

/// An [`EventSink`] that keeps every event in memory.
#[derive(Debug, Default)]
pub struct MemoryEventSink {
    events: Mutex<Vec<PropertyStaleEvent>>,
}

impl MemoryEventSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn events(&self) -> Vec<PropertyStaleEvent> {
        self.events.lock().clone()
    }

    pub fn take(&self) -> Vec<PropertyStaleEvent> {
        std::mem::take(&mut *self.events.lock())
    }
}

#[async_trait]
impl EventSink for MemoryEventSink {
    async fn emit(&self, event: &PropertyStaleEvent) -> anyhow::Result<()> {
        self.events.lock().push(event.clone());
        Ok(())
    }
}
