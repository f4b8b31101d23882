use std::collections::{HashMap, HashSet, VecDeque};

use crate::{error::ExpressionError, key::PropertyKey};

/// Result of [`topological_sort`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopologicalOrder {
    /// Every requested property, each after the properties it depends on.
    /// Properties on a cycle are included; within a cycle the order is the
    /// order the walk reached them in.
    pub order:    Vec<PropertyKey>,
    /// One entry per detected cycle, listing its members in path order.
    pub circular: Vec<Vec<PropertyKey>>,
}

impl TopologicalOrder {
    #[must_use]
    pub fn is_acyclic(&self) -> bool {
        self.circular.is_empty()
    }

    /// Every property that sits on some detected cycle.
    #[must_use]
    pub fn circular_keys(&self) -> HashSet<&PropertyKey> {
        self.circular.iter().flatten().collect()
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

/// Orders `properties` so that every property comes after the properties
/// it depends on.
///
/// `dependencies` maps a property to the properties its expression reads.
/// Edges leading outside `properties` are ignored. A cycle does not abort
/// the sort: the walk stops descending where it re-enters a property that is
/// still open, records the cycle in [`TopologicalOrder::circular`], and
/// carries on, so properties outside the cycle keep a valid order.
///
/// The walk is iterative and visits roots in the order given, then each
/// property's dependencies in map order, so the result is deterministic.
///
/// ## Example
/// ```
/// use std::collections::HashMap;
///
/// use computed_props::{key::PropertyKey, staleness::topological_sort};
/// use uuid::Uuid;
///
/// let key = |name: &str| PropertyKey::new(Uuid::nil(), name);
/// let dependencies = HashMap::from([(key("total"), vec![key("subtotal"), key("tax")]),
///                                   (key("tax"), vec![key("subtotal")])]);
///
/// let sorted = topological_sort(&[key("total"), key("tax"), key("subtotal")], &dependencies);
/// assert_eq!(sorted.order, vec![key("subtotal"), key("tax"), key("total")]);
/// assert!(sorted.is_acyclic());
/// ```
#[must_use]
pub fn topological_sort(properties: &[PropertyKey],
                        dependencies: &HashMap<PropertyKey, Vec<PropertyKey>>)
                        -> TopologicalOrder {
    let wanted: HashSet<&PropertyKey> = properties.iter().collect();
    let mut marks: HashMap<&PropertyKey, Mark> = HashMap::with_capacity(properties.len());
    let mut result = TopologicalOrder::default();
    let mut seen_cycles: HashSet<Vec<&PropertyKey>> = HashSet::new();

    for root in properties {
        if marks.contains_key(root) {
            continue;
        }
        marks.insert(root, Mark::Visiting);
        let mut stack: Vec<(&PropertyKey, usize)> = vec![(root, 0)];

        while let Some(&mut (node, ref mut next)) = stack.last_mut() {
            let children = dependencies.get(node).map_or(&[][..], Vec::as_slice);
            let Some(child) = children.get(*next) else {
                marks.insert(node, Mark::Done);
                result.order.push(node.clone());
                stack.pop();
                continue;
            };
            *next += 1;
            if !wanted.contains(child) {
                continue;
            }

            match marks.get(child).copied() {
                None => {
                    marks.insert(child, Mark::Visiting);
                    stack.push((child, 0));
                },
                Some(Mark::Visiting) => {
                    let start = stack.iter().position(|(open, _)| *open == child).unwrap_or(0);
                    let cycle: Vec<&PropertyKey> = stack[start..].iter().map(|(open, _)| *open).collect();
                    let mut canonical = cycle.clone();
                    canonical.sort();
                    if seen_cycles.insert(canonical) {
                        result.circular.push(cycle.into_iter().cloned().collect());
                    }
                },
                Some(Mark::Done) => {},
            }
        }
    }

    result
}

/// Finds a dependency cycle through `start`.
///
/// Returns the shortest chain `start -> ... -> start` following
/// `dependencies` edges, with `start` at both ends, or `None` when `start`
/// cannot reach itself. Used to reject a definition before it is stored.
///
/// ## Example
/// ```
/// use std::collections::HashMap;
///
/// use computed_props::{key::PropertyKey, staleness::find_cycle};
/// use uuid::Uuid;
///
/// let key = |name: &str| PropertyKey::new(Uuid::nil(), name);
/// let dependencies = HashMap::from([(key("a"), vec![key("b")]),
///                                   (key("b"), vec![key("c")]),
///                                   (key("c"), vec![key("a")])]);
///
/// let chain = find_cycle(&key("a"), &dependencies).unwrap();
/// assert_eq!(chain, vec![key("a"), key("b"), key("c"), key("a")]);
/// assert_eq!(find_cycle(&key("z"), &dependencies), None);
/// ```
#[must_use]
pub fn find_cycle(start: &PropertyKey,
                  dependencies: &HashMap<PropertyKey, Vec<PropertyKey>>)
                  -> Option<Vec<PropertyKey>> {
    let mut parents: HashMap<&PropertyKey, &PropertyKey> = HashMap::new();
    let mut queue: VecDeque<&PropertyKey> = VecDeque::from([start]);

    while let Some(node) = queue.pop_front() {
        for child in dependencies.get(node).into_iter().flatten() {
            if child == start {
                let mut path = Vec::new();
                let mut cursor = node;
                while cursor != start {
                    path.push(cursor.clone());
                    cursor = parents.get(cursor).copied()?;
                }
                path.reverse();

                let mut chain = Vec::with_capacity(path.len() + 2);
                chain.push(start.clone());
                chain.extend(path);
                chain.push(start.clone());
                return Some(chain);
            }
            if !parents.contains_key(child) {
                parents.insert(child, node);
                queue.push_back(child);
            }
        }
    }
    None
}

/// Builds the `CIRCULAR_DEPENDENCY` error for a chain from [`find_cycle`].
#[must_use]
pub fn circular_dependency_error(chain: Vec<PropertyKey>) -> ExpressionError {
    ExpressionError::circular_dependency(chain)
}
