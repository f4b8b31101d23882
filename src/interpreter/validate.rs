use serde::Serialize;

use crate::{
    ast::{Expr, Expression},
    error::ExpressionError,
    interpreter::{
        evaluator::function::core::{FunctionCategory, FunctionRegistry},
        parser::core::parse_source,
    },
};

/// Every problem found in one expression, in source order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<ExpressionError>,
}

impl ValidationReport {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// The first problem, if any.
    ///
    /// # Errors
    /// The earliest error in the report.
    pub fn into_result(self) -> Result<(), ExpressionError> {
        self.errors.into_iter().next().map_or(Ok(()), Err)
    }
}

/// Parses `source` and checks it against `registry`.
///
/// A syntax error stops validation, so the report then holds exactly that
/// error. Otherwise the report lists every semantic problem.
///
/// # Example
/// ```
/// use computed_props::{
///     error::ErrorCode,
///     interpreter::{evaluator::function::core::FunctionRegistry, validate::validate_source},
/// };
///
/// let registry = FunctionRegistry::standard();
/// assert!(validate_source("SUM(@self.lines[*].amount) + 1", registry).is_valid());
///
/// let report = validate_source("SUMM(#a) + ROUND() + #lines[*].amount", registry);
/// let codes: Vec<ErrorCode> = report.errors.iter().map(|e| e.code).collect();
/// assert_eq!(codes,
///            vec![ErrorCode::InvalidFunction,
///                 ErrorCode::InvalidArgumentCount,
///                 ErrorCode::CollectionWithoutAggregation]);
/// ```
#[must_use]
pub fn validate_source(source: &str, registry: &FunctionRegistry) -> ValidationReport {
    match parse_source(source) {
        Ok(expression) => validate_expression(&expression, registry),
        Err(error) => ValidationReport { errors: vec![error] },
    }
}

/// Checks an already parsed expression against `registry`.
///
/// Reported problems:
/// - calls to unknown functions (`INVALID_FUNCTION`, with suggestions),
/// - calls with the wrong number of arguments (`INVALID_ARGUMENT_COUNT`),
/// - bare identifiers (`UNKNOWN_IDENTIFIER`),
/// - `[*]` references outside an aggregation call
///   (`COLLECTION_WITHOUT_AGGREGATION`).
#[must_use]
pub fn validate_expression(expression: &Expression, registry: &FunctionRegistry) -> ValidationReport {
    let mut errors = Vec::new();
    check(&expression.body, registry, false, &mut errors);
    ValidationReport { errors }
}

fn check(expr: &Expr, registry: &FunctionRegistry, in_aggregate: bool, errors: &mut Vec<ExpressionError>) {
    match expr {
        Expr::Literal { .. } => {},
        Expr::Identifier { name, span } => {
            let suggestion = if registry.contains(name) {
                format!("{}()", name.to_uppercase())
            } else {
                format!("#{name}")
            };
            errors.push(ExpressionError::unknown_identifier(name, vec![suggestion], *span));
        },
        Expr::Unary { operand, .. } => check(operand, registry, in_aggregate, errors),
        Expr::Binary { left, right, .. } => {
            check(left, registry, in_aggregate, errors);
            check(right, registry, in_aggregate, errors);
        },
        Expr::Call { name,
                     arguments,
                     span, } => {
            let aggregate = match registry.check_call(name, arguments.len(), *span) {
                Ok(definition) => definition.category == FunctionCategory::Aggregation,
                Err(error) => {
                    errors.push(error);
                    registry.is_aggregation(name)
                },
            };
            for argument in arguments {
                check(argument, registry, aggregate, errors);
            }
        },
        Expr::PropertyReference(reference) => {
            if !in_aggregate && let Some(segment) = reference.collection_segment() {
                errors.push(ExpressionError::collection_without_aggregation(&segment.property,
                                                                            reference.span)
                                .with_suggestions(vec![format!("SUM({reference})")]));
            }
        },
    }
}
