use chrono::{DateTime, Utc};

use crate::{
    ast::Span,
    error::ExpressionError,
    interpreter::{evaluator::core::EvalResult, value::core::Value},
    util::num::f64_to_i64_checked,
};

fn argument<'v>(args: &'v [Value], index: usize) -> &'v Value {
    args.get(index).unwrap_or(&Value::Null)
}

fn wrong_type(name: &str, index: usize, expected: &str, found: &Value, span: Span) -> ExpressionError {
    ExpressionError::type_mismatch(format!("{name} expects {expected} as argument {}, found {}",
                                           index + 1,
                                           found.type_name()),
                                   span)
}

/// Reads argument `index` as a number; a missing argument or `null` reads as
/// `None`.
///
/// # Errors
/// `TYPE_MISMATCH` for any other type.
pub fn number(name: &str, args: &[Value], index: usize, span: Span) -> EvalResult<Option<f64>> {
    match argument(args, index) {
        Value::Null => Ok(None),
        Value::Number(n) => Ok(Some(*n)),
        other => Err(wrong_type(name, index, "a number", other, span)),
    }
}

/// Reads argument `index` as a whole number.
///
/// # Errors
/// `TYPE_MISMATCH` for non-numbers, `INVALID_ARGUMENT` for fractions and
/// non-finite values.
pub fn integer(name: &str, args: &[Value], index: usize, span: Span) -> EvalResult<Option<i64>> {
    let Some(n) = number(name, args, index, span)? else {
        return Ok(None);
    };
    f64_to_i64_checked(n).map(Some).ok_or_else(|| {
        ExpressionError::invalid_argument(name,
                                          &format!("argument {} must be a whole number, found {n}",
                                                   index + 1),
                                          span)
    })
}

/// Reads argument `index` as a string.
///
/// # Errors
/// `TYPE_MISMATCH` for non-strings.
pub fn text<'v>(name: &str, args: &'v [Value], index: usize, span: Span) -> EvalResult<Option<&'v str>> {
    match argument(args, index) {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        other => Err(wrong_type(name, index, "a string", other, span)),
    }
}

/// Reads argument `index` as a date. Strings are parsed with
/// [`Value::as_date`].
///
/// # Errors
/// `INVALID_ARGUMENT` for a string that is not a date, `TYPE_MISMATCH` for
/// any other non-date.
pub fn date(name: &str,
            args: &[Value],
            index: usize,
            span: Span)
            -> EvalResult<Option<DateTime<Utc>>> {
    match argument(args, index) {
        Value::Null => Ok(None),
        Value::Date(d) => Ok(Some(*d)),
        value @ Value::String(s) => value.as_date().map(Some).ok_or_else(|| {
            ExpressionError::invalid_argument(name,
                                              &format!("'{s}' is not a date (expected \
                                                        YYYY-MM-DD or RFC 3339)"),
                                              span)
        }),
        other => Err(wrong_type(name, index, "a date", other, span)),
    }
}

/// Reads an optional unit argument, lower-cased, falling back to `default`.
///
/// # Errors
/// `TYPE_MISMATCH` when the argument is present but not a string.
pub fn unit(name: &str,
            args: &[Value],
            index: usize,
            default: &str,
            span: Span)
            -> EvalResult<String> {
    Ok(text(name, args, index, span)?.map_or_else(|| default.to_string(),
                                                  |unit| unit.trim().to_lowercase()))
}

/// Every non-null value among `args`, with lists flattened recursively.
///
/// ## Example
/// ```
/// use computed_props::interpreter::{evaluator::function::args::flatten, value::core::Value};
///
/// let args = [Value::from(vec![Value::from(1), Value::Null, Value::from(vec![Value::from(2)])]),
///             Value::from(3)];
/// let flat: Vec<&Value> = flatten(&args);
/// assert_eq!(flat, vec![&Value::from(1), &Value::from(2), &Value::from(3)]);
/// ```
#[must_use]
pub fn flatten(args: &[Value]) -> Vec<&Value> {
    fn push<'v>(value: &'v Value, out: &mut Vec<&'v Value>) {
        match value {
            Value::Null => {},
            Value::List(items) => items.iter().for_each(|item| push(item, out)),
            other => out.push(other),
        }
    }

    let mut out = Vec::new();
    for arg in args {
        push(arg, &mut out);
    }
    out
}
