use std::collections::HashMap;

use async_trait::async_trait;

use crate::{
    error::ExpressionError,
    interpreter::{evaluator::core::EvalResult, value::core::{PropertyMap, Value}},
    key::EntityId,
};

/// Supplies property values of entities the evaluator cannot see directly.
///
/// `depth` counts the resolver hops taken so far, this one included. A
/// resolver that answers by evaluating another computed property should build
/// its nested [`Context`](crate::interpreter::evaluator::core::Context) with
/// `with_depth(depth)`, so that self-referential chains eventually fail with
/// `MAX_DEPTH_EXCEEDED` instead of recursing forever.
pub trait EntityResolver: Send + Sync {
    /// Reads `property` of `entity`.
    ///
    /// Returns `Ok(None)` when the entity exists but has no such property.
    ///
    /// # Errors
    /// `ENTITY_NOT_FOUND` when the entity does not exist, or any error raised
    /// while computing the value.
    fn resolve(&self, entity: EntityId, property: &str, depth: usize) -> EvalResult<Option<Value>>;

    /// Names of the entity's properties, used for "did you mean" suggestions.
    fn property_names(&self, _entity: EntityId) -> Vec<String> {
        Vec::new()
    }
}

/// The asynchronous counterpart of [`EntityResolver`], for entity data that
/// lives behind I/O. Consumed by
/// [`Context::eval_async`](crate::interpreter::evaluator::core::Context::eval_async).
#[async_trait]
pub trait AsyncEntityResolver: Send + Sync {
    /// Reads `property` of `entity`; same contract as
    /// [`EntityResolver::resolve`].
    async fn resolve(&self, entity: EntityId, property: &str, depth: usize) -> EvalResult<Option<Value>>;

    async fn property_names(&self, _entity: EntityId) -> Vec<String> {
        Vec::new()
    }
}

/// Entities held in memory, keyed by id.
impl EntityResolver for HashMap<EntityId, PropertyMap> {
    fn resolve(&self, entity: EntityId, property: &str, _depth: usize) -> EvalResult<Option<Value>> {
        self.get(&entity)
            .map(|properties| properties.get(property).cloned())
            .ok_or_else(|| ExpressionError::entity_not_found(entity))
    }

    fn property_names(&self, entity: EntityId) -> Vec<String> {
        self.get(&entity)
            .map(|properties| properties.keys().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl AsyncEntityResolver for HashMap<EntityId, PropertyMap> {
    async fn resolve(&self, entity: EntityId, property: &str, depth: usize) -> EvalResult<Option<Value>> {
        EntityResolver::resolve(self, entity, property, depth)
    }

    async fn property_names(&self, entity: EntityId) -> Vec<String> {
        EntityResolver::property_names(self, entity)
    }
}
