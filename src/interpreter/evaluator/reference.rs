use std::sync::Arc;

use crate::{
    ast::{PathSegment, PropertyReference, ReferenceBase, Span, Traversal},
    error::ExpressionError,
    interpreter::{
        evaluator::{
            core::{Context, EvalResult, Scope},
            resolver::EntityResolver,
        },
        value::core::Value,
    },
    key::EntityId,
};

impl Context<'_> {
    /// Evaluates a property reference.
    ///
    /// The first segment is read from the context's property map (falling
    /// back to the resolver) or, for `@{uuid}`, from the resolver. Every later
    /// segment reads a field of the previous value: a record field, or a
    /// property of a linked entity through the resolver.
    ///
    /// `[n]` picks one element of a list. `[*]` maps the rest of the path over
    /// every element and yields a list; nested `[*]` results are flattened
    /// into a single list.
    ///
    /// # Errors
    /// - `COLLECTION_WITHOUT_AGGREGATION` when the path uses `[*]` outside the
    ///   arguments of an aggregation function.
    /// - `PROPERTY_NOT_FOUND`, `ENTITY_NOT_FOUND` for missing targets, and
    ///   `RELATIONSHIP_NOT_FOUND` when the missing name is not the last
    ///   segment.
    /// - `MAX_DEPTH_EXCEEDED` when a resolver hop goes past `max_depth`.
    /// - `NULL_REFERENCE` when an intermediate value is null.
    /// - `INDEX_OUT_OF_BOUNDS`, `TYPE_MISMATCH` for bad traversals.
    pub(crate) fn eval_reference(&self,
                                 reference: &PropertyReference,
                                 scope: Scope)
                                 -> EvalResult<Value> {
        if !scope.in_aggregate
           && let Some(segment) = reference.collection_segment()
        {
            return Err(ExpressionError::collection_without_aggregation(&segment.property,
                                                                       reference.span)
                       .with_suggestions(vec![format!("SUM({reference})")]));
        }

        let Some(first) = reference.path.first() else {
            return Err(ExpressionError::unexpected_end("property name", reference.span.end));
        };
        let root = self.read_root(reference.base, &reference.path)?;
        let trail = format!("{}.{}", reference.base, first.property);
        self.apply_traversal(root, &reference.path, 0, trail)
    }

    /// Reads the first segment's property from the reference base.
    fn read_root(&self, base: ReferenceBase, path: &[PathSegment]) -> EvalResult<Value> {
        match base {
            ReferenceBase::Entity(id) => self.read_entity_property(id, path, 0, &base.to_string()),
            ReferenceBase::SelfEntity => {
                let segment = &path[0];
                if let Some(value) = self.properties.get(&segment.property) {
                    return Ok(value.clone());
                }
                let mut candidates: Vec<String> = self.properties.keys().cloned().collect();
                if let (Some(id), Some(resolver)) = (self.self_id, self.resolver) {
                    if let Some(value) =
                        self.resolve_hop(resolver, id, &segment.property, segment.span)?
                    {
                        return Ok(value);
                    }
                    candidates.extend(resolver.property_names(id));
                }
                let suggestions =
                    self.suggest_names(&segment.property, candidates.iter().map(String::as_str));
                Err(missing_segment(path, 0, "@self", suggestions))
            },
        }
    }

    /// Reads `path[index]` of another entity through the resolver. `owner`
    /// describes the entity in messages.
    fn read_entity_property(&self,
                            id: EntityId,
                            path: &[PathSegment],
                            index: usize,
                            owner: &str)
                            -> EvalResult<Value> {
        let segment = &path[index];
        let Some(resolver) = self.resolver else {
            return Err(ExpressionError::entity_not_found(id).at(segment.span));
        };
        match self.resolve_hop(resolver, id, &segment.property, segment.span)? {
            Some(value) => Ok(value),
            None => {
                let names = resolver.property_names(id);
                let suggestions =
                    self.suggest_names(&segment.property, names.iter().map(String::as_str));
                Err(missing_segment(path, index, owner, suggestions))
            },
        }
    }

    /// Reads `property` of `entity` through the resolver, exactly as a path
    /// step onto that entity would. Meant for reading functions, see
    /// [`Implementation::Reading`](super::function::core::Implementation::Reading).
    ///
    /// # Errors
    /// - `ENTITY_NOT_FOUND` when the context has no resolver or the entity
    ///   does not exist.
    /// - `PROPERTY_NOT_FOUND`, with suggestions, when the entity lacks the
    ///   property.
    /// - `MAX_DEPTH_EXCEEDED` when the hop would exceed `max_depth`.
    pub fn read_property(&self, entity: EntityId, property: &str, span: Span) -> EvalResult<Value> {
        let Some(resolver) = self.resolver else {
            return Err(ExpressionError::entity_not_found(entity).at(span));
        };
        match self.resolve_hop(resolver, entity, property, span)? {
            Some(value) => Ok(value),
            None => {
                let names = resolver.property_names(entity);
                let suggestions = self.suggest_names(property, names.iter().map(String::as_str));
                Err(ExpressionError::property_not_found(&format!("@{{{entity}}}"),
                                                        property,
                                                        suggestions)
                    .at(span))
            },
        }
    }

    /// Asks the resolver for one property, one hop deeper than this context.
    fn resolve_hop(&self,
                   resolver: &dyn EntityResolver,
                   entity: EntityId,
                   property: &str,
                   span: Span)
                   -> EvalResult<Option<Value>> {
        let depth = self.depth + 1;
        if depth > self.max_depth {
            return Err(ExpressionError::max_depth_exceeded(self.max_depth, span));
        }
        resolver.resolve(entity, property, depth)
                .map_err(|error| error.or_at(span))
    }

    /// Applies the traversal of `path[index]` to `value` (the raw value read
    /// for that segment) and continues with the rest of the path.
    fn apply_traversal(&self,
                       value: Value,
                       path: &[PathSegment],
                       index: usize,
                       trail: String)
                       -> EvalResult<Value> {
        let segment = &path[index];
        match segment.traversal {
            None => self.follow(value, path, index + 1, &trail),
            Some(Traversal::Index(position)) => {
                let element = match &value {
                    Value::List(items) => items.get(position).cloned().ok_or_else(|| {
                                              ExpressionError::index_out_of_bounds(position,
                                                                                   items.len(),
                                                                                   &trail,
                                                                                   segment.span)
                                          })?,
                    Value::Null => {
                        return Err(ExpressionError::null_reference(&trail,
                                                                   &format!("[{position}]"),
                                                                   segment.span));
                    },
                    other => return Err(not_a_list(&trail, other, segment)),
                };
                self.follow(element, path, index + 1, &format!("{trail}[{position}]"))
            },
            Some(Traversal::All) => {
                let elements = match value {
                    Value::List(items) => items,
                    Value::Null => Arc::new(Vec::new()),
                    other => return Err(not_a_list(&trail, &other, segment)),
                };
                let trail = format!("{trail}[*]");
                let flatten = path[index + 1..].iter().any(PathSegment::is_collection);
                let mut out = Vec::with_capacity(elements.len());
                for element in elements.iter() {
                    match self.follow(element.clone(), path, index + 1, &trail)? {
                        Value::List(nested) if flatten => out.extend(nested.iter().cloned()),
                        mapped => out.push(mapped),
                    }
                }
                Ok(Value::List(Arc::new(out)))
            },
        }
    }

    /// Reads `path[index]` from `current`, or returns `current` once the path
    /// is exhausted.
    fn follow(&self,
              current: Value,
              path: &[PathSegment],
              index: usize,
              trail: &str)
              -> EvalResult<Value> {
        let Some(segment) = path.get(index) else {
            return Ok(current);
        };
        let value = match &current {
            Value::Null => {
                return Err(ExpressionError::null_reference(trail, &segment.property, segment.span));
            },
            Value::Record(fields) => match fields.get(&segment.property) {
                Some(value) => value.clone(),
                None => {
                    let suggestions =
                        self.suggest_names(&segment.property, fields.keys().map(String::as_str));
                    return Err(missing_segment(path, index, trail, suggestions));
                },
            },
            Value::Entity(id) => self.read_entity_property(*id, path, index, trail)?,
            Value::List(_) => {
                return Err(ExpressionError::type_mismatch(format!("Cannot read '{}' from {trail}: \
                                                                   it is a list, use [n] or [*] \
                                                                   to reach its elements",
                                                                  segment.property),
                                                          segment.span));
            },
            other => {
                return Err(ExpressionError::type_mismatch(format!("Cannot read '{}' from {trail}: \
                                                                   it is a {}",
                                                                  segment.property,
                                                                  other.type_name()),
                                                          segment.span));
            },
        };
        self.apply_traversal(value, path, index, format!("{trail}.{}", segment.property))
    }
}

/// The error for `path[index]` missing on `owner`: `RELATIONSHIP_NOT_FOUND`
/// when the path goes on through it, `PROPERTY_NOT_FOUND` when it is the
/// final segment.
fn missing_segment(path: &[PathSegment],
                   index: usize,
                   owner: &str,
                   suggestions: Vec<String>)
                   -> ExpressionError {
    let segment = &path[index];
    let error = if segment.traversal.is_some() || index + 1 < path.len() {
        ExpressionError::relationship_not_found(owner, &segment.property)
    } else {
        ExpressionError::property_not_found(owner, &segment.property, Vec::new())
    };
    error.with_suggestions(suggestions).at(segment.span)
}

fn not_a_list(trail: &str, value: &Value, segment: &PathSegment) -> ExpressionError {
    ExpressionError::type_mismatch(format!("Cannot index {trail}: expected a list, found {}",
                                           value.type_name()),
                                   segment.span)
}
