use std::{collections::HashSet, fmt};

use crate::{
    ast::{Expr, Expression, PathSegment, ReferenceBase, Span},
    key::{EntityId, PropertyKey},
};

/// One distinct property path an expression reads.
///
/// Two references with the same base and path, such as `#price` and
/// `@self.price`, are one dependency; the first occurrence supplies the span.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedDependency {
    pub base: ReferenceBase,
    pub path: Vec<PathSegment>,
    /// Source range of the first occurrence.
    pub span: Span,
}

impl ExtractedDependency {
    /// The entity named explicitly by an `@{uuid}` base.
    #[must_use]
    pub const fn entity_id(&self) -> Option<EntityId> {
        match self.base {
            ReferenceBase::SelfEntity => None,
            ReferenceBase::Entity(id) => Some(id),
        }
    }

    #[must_use]
    pub fn root_property(&self) -> Option<&str> {
        self.path.first().map(|segment| segment.property.as_str())
    }

    #[must_use]
    pub fn has_collection_traversal(&self) -> bool {
        self.path.iter().any(PathSegment::is_collection)
    }

    /// The key of the property read directly on the base entity, with `self`
    /// standing for `self_id`. This is the edge a dependency store records.
    ///
    /// # Example
    /// ```
    /// use computed_props::{dependencies::extract_dependencies, key::PropertyKey, parse};
    /// use uuid::Uuid;
    ///
    /// let order = Uuid::new_v4();
    /// let expression = parse("SUM(@self.lines[*].amount)").unwrap();
    /// let dependency = &extract_dependencies(&expression)[0];
    ///
    /// assert_eq!(dependency.to_string(), "@self.lines[*].amount");
    /// assert_eq!(dependency.root_key(order), Some(PropertyKey::new(order, "lines")));
    /// ```
    #[must_use]
    pub fn root_key(&self, self_id: EntityId) -> Option<PropertyKey> {
        let entity = self.entity_id().unwrap_or(self_id);
        self.root_property().map(|property| PropertyKey::new(entity, property))
    }
}

impl fmt::Display for ExtractedDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base)?;
        for segment in &self.path {
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

/// Collects every distinct property reference, in first-occurrence order.
///
/// References are found inside operands and call arguments at any depth.
/// The walk is purely structural and cannot fail.
///
/// # Example
/// ```
/// use computed_props::{dependencies::extract_dependencies, parse};
///
/// let expression = parse("#price * #quantity + IF(#price > 10, @self.price, 0)").unwrap();
/// let texts: Vec<String> = extract_dependencies(&expression).iter()
///                                                           .map(ToString::to_string)
///                                                           .collect();
/// assert_eq!(texts, vec!["@self.price", "@self.quantity"]);
/// ```
#[must_use]
pub fn extract_dependencies(expression: &Expression) -> Vec<ExtractedDependency> {
    let mut seen = HashSet::new();
    let mut dependencies = Vec::new();
    expression.body.walk(&mut |node| {
                       if let Expr::PropertyReference(reference) = node {
                           let dependency = ExtractedDependency { base: reference.base,
                                                                  path: reference.path.clone(),
                                                                  span: reference.span, };
                           if seen.insert(dependency.to_string()) {
                               dependencies.push(dependency);
                           }
                       }
                   });
    dependencies
}

/// Whether any reference in the expression uses `[*]`.
#[must_use]
pub fn has_collection_traversal(expression: &Expression) -> bool {
    let mut found = false;
    expression.body.walk(&mut |node| {
                       if let Expr::PropertyReference(reference) = node {
                           found |= reference.has_collection_traversal();
                       }
                   });
    found
}

/// Distinct entity ids named by `@{uuid}` references, in first-occurrence
/// order.
#[must_use]
pub fn get_referenced_entity_ids(expression: &Expression) -> Vec<EntityId> {
    let mut ids = Vec::new();
    expression.body.walk(&mut |node| {
                       if let Expr::PropertyReference(reference) = node
                          && let ReferenceBase::Entity(id) = reference.base
                          && !ids.contains(&id)
                       {
                           ids.push(id);
                       }
                   });
    ids
}

/// Distinct upper-cased names of called functions, in first-occurrence order.
///
/// # Example
/// ```
/// use computed_props::{dependencies::get_used_functions, parse};
///
/// let expression = parse("round(SUM(#a[*]) / count(#a[*]), 2)").unwrap();
/// assert_eq!(get_used_functions(&expression), vec!["ROUND", "SUM", "COUNT"]);
/// ```
#[must_use]
pub fn get_used_functions(expression: &Expression) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    expression.body.walk(&mut |node| {
                       if let Expr::Call { name, .. } = node {
                           let upper = name.to_uppercase();
                           if !names.contains(&upper) {
                               names.push(upper);
                           }
                       }
                   });
    names
}

/// Distinct [`root keys`](ExtractedDependency::root_key) of every
/// dependency, with `self` standing for `self_id`.
#[must_use]
pub fn dependency_keys(expression: &Expression, self_id: EntityId) -> Vec<PropertyKey> {
    let mut keys = Vec::new();
    for key in extract_dependencies(expression).iter()
                                               .filter_map(|dependency| dependency.root_key(self_id))
    {
        if !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys
}
