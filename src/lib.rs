//! # computed-props
//!
//! computed-props is an engine for computed entity properties written in
//! Rust. A computed property is defined by a small expression such as
//! `SUM(@self.lines[*].amount) * (1 + #tax_rate)`; the engine parses it,
//! reports which properties it reads, evaluates it against entity data, and
//! propagates staleness through the dependency graph when an input changes.

#![warn(
    clippy::redundant_clone,
    clippy::needless_pass_by_value,
    clippy::similar_names,
    clippy::large_enum_variant,
    clippy::string_lit_as_bytes,
    clippy::match_same_arms,
    clippy::cargo,
    clippy::nursery,
    clippy::perf,
    clippy::style,
    clippy::suspicious,
    clippy::correctness,
    clippy::complexity,
    clippy::pedantic,
    //missing_docs,
)]
#![allow(clippy::missing_errors_doc)]

use crate::interpreter::{
    evaluator::{
        core::{Context, EvalResult},
        resolver::AsyncEntityResolver,
    },
    parser::core::parse_source,
    validate::{ValidationReport, validate_source},
};

/// Defines the structure of parsed expressions.
///
/// This module declares the `Expr` enum and related types that represent the
/// syntactic structure of an expression as a tree. The AST is built by the
/// parser, walked by the dependency extractor and evaluated by the
/// evaluator.
///
/// # Responsibilities
/// - Defines the closed set of node kinds and property path segments.
/// - Attaches source spans to every node for error reporting.
/// - Prints an expression back to canonical source.
pub mod ast;
/// Engine limits loaded from TOML.
pub mod config;
/// Structural analysis of which properties, entities and functions an
/// expression uses.
///
/// # Responsibilities
/// - Collects distinct property references in first-occurrence order.
/// - Maps each reference to the dependency-graph key it starts from.
/// - Reports referenced entity ids and called function names.
pub mod dependencies;
/// Provides the unified error type for parsing and evaluation.
///
/// Every failure, from a stray character to a dependency cycle, is an
/// `ExpressionError` with a stable code, a message, an optional source range
/// and suggestions.
pub mod error;
/// Orchestrates tokenizing, parsing, validation and evaluation.
///
/// # Responsibilities
/// - Coordinates the lexer, parser, validator and evaluator.
/// - Defines runtime values and the function registry.
pub mod interpreter;
/// Property keys and the identifier types they are built from.
pub mod key;
/// Staleness propagation through the property dependency graph.
pub mod staleness;
/// General utilities for numeric conversion and name suggestions.
///
/// # Responsibilities
/// - Safely convert between `f64` and integer types without silent data
///   loss.
/// - Rank candidate names by similarity for "did you mean" hints.
pub mod util;

pub use crate::{
    ast::Expression,
    error::{ErrorCode, ExpressionError},
    interpreter::value::core::{PropertyMap, Value},
    key::{EntityId, PropertyKey, TenantId},
};

/// Outcome of [`try_parse`].
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    Parsed(Expression),
    Failed(ExpressionError),
}

impl ParseOutcome {
    #[must_use]
    pub const fn is_parsed(&self) -> bool {
        matches!(self, Self::Parsed(_))
    }

    #[must_use]
    pub fn into_result(self) -> Result<Expression, ExpressionError> {
        match self {
            Self::Parsed(expression) => Ok(expression),
            Self::Failed(error) => Err(error),
        }
    }
}

/// Parses an expression.
///
/// # Errors
/// The first lexical or syntax error, with its position.
///
/// # Examples
/// ```
/// use computed_props::{ErrorCode, parse};
///
/// let expression = parse("#price * #quantity").unwrap();
/// assert_eq!(expression.to_string(), "@self.price * @self.quantity");
///
/// let err = parse("#price *").unwrap_err();
/// assert_eq!(err.code, ErrorCode::UnexpectedEnd);
/// ```
pub fn parse(source: &str) -> Result<Expression, ExpressionError> {
    parse_source(source)
}

/// Parses an expression, reporting failure as a value.
///
/// # Examples
/// ```
/// use computed_props::{ParseOutcome, try_parse};
///
/// assert!(try_parse("1 + 2").is_parsed());
/// assert!(matches!(try_parse("1 +* 2"), ParseOutcome::Failed(_)));
/// ```
#[must_use]
pub fn try_parse(source: &str) -> ParseOutcome {
    match parse_source(source) {
        Ok(expression) => ParseOutcome::Parsed(expression),
        Err(error) => ParseOutcome::Failed(error),
    }
}

/// Parses an expression and checks it against the standard function
/// registry, collecting every problem found.
///
/// # Examples
/// ```
/// use computed_props::validate;
///
/// assert!(validate("ROUND(#total, 2)").is_valid());
/// assert_eq!(validate("ROUND() + SUMM(#a)").errors.len(), 2);
/// ```
#[must_use]
pub fn validate(source: &str) -> ValidationReport {
    validate_source(source, interpreter::evaluator::function::core::FunctionRegistry::standard())
}

/// Evaluates a parsed expression in `context`.
///
/// # Errors
/// Any evaluation error.
pub fn evaluate(expression: &Expression, context: &Context<'_>) -> EvalResult<Value> {
    context.eval(expression)
}

/// Evaluates a parsed expression in `context`, reading other entities
/// through an asynchronous resolver.
///
/// # Errors
/// Any evaluation error.
pub async fn evaluate_async(expression: &Expression,
                            context: &Context<'_>,
                            resolver: &dyn AsyncEntityResolver)
                            -> EvalResult<Value> {
    context.eval_async(expression, resolver).await
}

/// Parses `source` and evaluates it against `properties` with the standard
/// function registry.
///
/// # Errors
/// The first parse or evaluation error.
///
/// # Examples
/// ```
/// use std::collections::HashMap;
///
/// use computed_props::{ErrorCode, Value, evaluate_simple};
///
/// let properties = HashMap::from([("price".to_string(), Value::from(10)),
///                                 ("quantity".to_string(), Value::from(3))]);
///
/// let total = evaluate_simple("#price * #quantity", properties.clone()).unwrap();
/// assert_eq!(total, Value::Number(30.0));
///
/// let err = evaluate_simple("#prise", properties).unwrap_err();
/// assert_eq!(err.code, ErrorCode::PropertyNotFound);
/// assert!(err.suggestions.contains(&"price".to_string()));
/// ```
pub fn evaluate_simple(source: &str, properties: PropertyMap) -> EvalResult<Value> {
    let expression = parse(source)?;
    create_context(properties).eval(&expression)
}

/// Builds a context over `properties` with the standard registry and
/// default limits.
#[must_use]
pub fn create_context(properties: PropertyMap) -> Context<'static> {
    Context::new(properties)
}
