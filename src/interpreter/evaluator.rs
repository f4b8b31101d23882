/// Binary operator evaluation logic.
///
/// Handles short-circuiting of `&&` and `||`, arithmetic, ordering and
/// equality.
pub mod binary;

/// Unary operator evaluation logic.
///
/// Implements arithmetic negation and logical NOT.
pub mod unary;

/// Core evaluation logic and context management.
///
/// Contains the evaluation context, the node dispatcher and the depth guard.
pub mod core;

/// The adapters that supply properties of entities other than `self`, in
/// synchronous and asynchronous form.
pub mod resolver;

/// Evaluation against an asynchronous resolver.
///
/// Fetches what the expression reads, then evaluates synchronously over the
/// fetched values, repeating when evaluation discovers further lookups.
pub mod prefetch;

/// Property path evaluation.
///
/// Reads the first segment from the context or the resolver, then follows
/// records, entity links, `[n]` indexing and `[*]` mapping.
pub mod reference;

/// Utility functions for evaluation.
///
/// Function call dispatch, the lazy `IF`, and diagnostics for bare
/// identifiers.
pub mod utils;

/// Function registry and built-in functions.
///
/// Handles lookup, arity checking and invocation, plus the aggregation,
/// conditional, string, math and date families.
pub mod function;
