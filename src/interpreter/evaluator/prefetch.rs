use std::collections::HashMap;

use parking_lot::Mutex;
use tracing::trace;

use crate::{
    ast::Expression,
    dependencies::extract_dependencies,
    error::ExpressionError,
    interpreter::{
        evaluator::{
            core::{Context, EvalResult},
            resolver::{AsyncEntityResolver, EntityResolver},
        },
        value::core::Value,
    },
    key::EntityId,
};

type Lookup = (EntityId, String, usize);

/// Lookups answered by an [`AsyncEntityResolver`], served synchronously to
/// the evaluator.
///
/// A lookup that has not been fetched yet is recorded as pending and fails,
/// which abandons the current evaluation pass.
#[derive(Default)]
struct Prefetched {
    values:  Mutex<HashMap<(EntityId, String), EvalResult<Option<Value>>>>,
    names:   Mutex<HashMap<EntityId, Vec<String>>>,
    pending: Mutex<Vec<Lookup>>,
}

impl Prefetched {
    fn is_cached(&self, entity: EntityId, property: &str) -> bool {
        self.values.lock().contains_key(&(entity, property.to_string()))
    }

    fn take_pending(&self) -> Vec<Lookup> {
        std::mem::take(&mut *self.pending.lock())
    }

    /// Fetches one lookup, plus the entity's property names when the
    /// property turns out to be missing.
    async fn fetch(&self,
                   resolver: &dyn AsyncEntityResolver,
                   entity: EntityId,
                   property: String,
                   depth: usize) {
        if self.is_cached(entity, &property) {
            return;
        }
        let result = resolver.resolve(entity, &property, depth).await;
        let names_known = self.names.lock().contains_key(&entity);
        if matches!(result, Ok(None)) && !names_known {
            let names = resolver.property_names(entity).await;
            self.names.lock().insert(entity, names);
        }
        self.values.lock().insert((entity, property), result);
    }
}

impl EntityResolver for Prefetched {
    fn resolve(&self, entity: EntityId, property: &str, depth: usize) -> EvalResult<Option<Value>> {
        if let Some(result) = self.values.lock().get(&(entity, property.to_string())) {
            return result.clone();
        }
        self.pending.lock().push((entity, property.to_string(), depth));
        Err(ExpressionError::entity_not_found(entity))
    }

    fn property_names(&self, entity: EntityId) -> Vec<String> {
        self.names.lock().get(&entity).cloned().unwrap_or_default()
    }
}

impl Context<'_> {
    /// Evaluates a parsed expression, reading entities other than the
    /// property map through `resolver`.
    ///
    /// Evaluation itself stays synchronous. Properties the expression reads
    /// directly from other entities, and `self` properties missing from the
    /// property map, are fetched first. Any lookup found only while
    /// evaluating, such as a step through an entity link or a read made by a
    /// reading function, abandons that pass; it is fetched and the
    /// expression is evaluated again over everything fetched so far. Each
    /// pass fetches at least one new lookup, so the loop ends once
    /// evaluation needs nothing new. The context's own resolver is not
    /// consulted.
    ///
    /// # Errors
    /// Same as [`Context::eval`]; resolver errors surface where the lookup
    /// was made.
    pub async fn eval_async(&self,
                            expression: &Expression,
                            resolver: &dyn AsyncEntityResolver)
                            -> EvalResult<Value> {
        let prefetched = Prefetched::default();

        let depth = self.depth + 1;
        if depth <= self.max_depth {
            for dependency in extract_dependencies(expression) {
                let Some(property) = dependency.root_property() else {
                    continue;
                };
                let entity = match (dependency.entity_id(), self.self_id) {
                    (Some(entity), _) => entity,
                    (None, Some(entity)) if !self.properties.contains_key(property) => entity,
                    _ => continue,
                };
                prefetched.fetch(resolver, entity, property.to_string(), depth).await;
            }
        }

        let context = self.clone().with_resolver(&prefetched);
        let mut pass = 1;
        loop {
            let result = context.eval(expression);
            let pending = prefetched.take_pending();
            if pending.is_empty() {
                return result;
            }
            trace!(pass, lookups = pending.len(), "evaluation needs more lookups");
            for (entity, property, depth) in pending {
                prefetched.fetch(resolver, entity, property, depth).await;
            }
            pass += 1;
        }
    }
}
