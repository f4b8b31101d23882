use crate::{
    ast::Span,
    error::ExpressionError,
    interpreter::{
        evaluator::{core::EvalResult, function::args::flatten},
        value::core::Value,
    },
    util::num::usize_to_f64,
};

fn numbers(name: &str, args: &[Value], span: Span) -> EvalResult<Vec<f64>> {
    flatten(args).into_iter()
                 .map(|value| {
                     value.as_number().ok_or_else(|| {
                         let details = format!("{name} expects numbers, found {}", value.type_name());
                         ExpressionError::type_mismatch(details, span)
                     })
                 })
                 .collect()
}

/// Adds every number among the arguments. `SUM` of nothing is `0`.
///
/// # Example
/// ```
/// use computed_props::{
///     ast::Span,
///     interpreter::{evaluator::function::aggregate::sum, value::core::Value},
/// };
///
/// let lines = Value::from(vec![Value::from(1), Value::Null, Value::from(2)]);
/// assert_eq!(sum(&[lines, Value::from(4)], Span::default()).unwrap(), Value::Number(7.0));
/// assert_eq!(sum(&[Value::from(Vec::new())], Span::default()).unwrap(), Value::Number(0.0));
/// ```
///
/// # Errors
/// `TYPE_MISMATCH` when a non-null element is not a number.
pub fn sum(args: &[Value], span: Span) -> EvalResult<Value> {
    Ok(Value::Number(numbers("SUM", args, span)?.into_iter().sum()))
}

/// Counts the non-null elements, of any type.
///
/// # Errors
/// Never fails.
pub fn count(args: &[Value], _span: Span) -> EvalResult<Value> {
    Ok(Value::Number(usize_to_f64(flatten(args).len())))
}

/// Mean of the numbers among the arguments; `null` when there are none.
///
/// # Errors
/// `TYPE_MISMATCH` when a non-null element is not a number.
pub fn avg(args: &[Value], span: Span) -> EvalResult<Value> {
    let values = numbers("AVG", args, span)?;
    if values.is_empty() {
        return Ok(Value::Null);
    }
    Ok(Value::Number(values.iter().sum::<f64>() / usize_to_f64(values.len())))
}

/// Smallest element; `null` when there are none.
///
/// Elements must be mutually comparable: all numbers, all strings or all
/// dates.
///
/// # Errors
/// `TYPE_MISMATCH` for incomparable elements.
pub fn min(args: &[Value], span: Span) -> EvalResult<Value> {
    extreme("MIN", args, span, std::cmp::Ordering::Less)
}

/// Largest element; `null` when there are none.
///
/// # Errors
/// `TYPE_MISMATCH` for incomparable elements.
pub fn max(args: &[Value], span: Span) -> EvalResult<Value> {
    extreme("MAX", args, span, std::cmp::Ordering::Greater)
}

fn extreme(name: &str, args: &[Value], span: Span, keep: std::cmp::Ordering) -> EvalResult<Value> {
    let mut best: Option<&Value> = None;
    for value in flatten(args) {
        if matches!(value, Value::Bool(_) | Value::List(_) | Value::Record(_) | Value::Entity(_)) {
            return Err(ExpressionError::type_mismatch(format!("{name} cannot order {}",
                                                              value.type_name()),
                                                      span));
        }
        best = match best {
            None => Some(value),
            Some(current) => match value.compare(current) {
                Some(ordering) if ordering == keep => Some(value),
                Some(_) => Some(current),
                None => {
                    return Err(ExpressionError::type_mismatch(format!("{name} cannot compare \
                                                                       {} with {}",
                                                                      value.type_name(),
                                                                      current.type_name()),
                                                              span));
                },
            },
        };
    }
    Ok(best.cloned().unwrap_or(Value::Null))
}
