use crate::{
    ast::Span,
    error::ExpressionError,
    interpreter::{
        evaluator::{core::EvalResult, function::args},
        value::core::Value,
    },
    util::num::usize_to_f64,
};

/// Joins the display form of every argument. Nulls contribute nothing.
///
/// # Example
/// ```
/// use computed_props::{
///     ast::Span,
///     interpreter::{evaluator::function::text::concat, value::core::Value},
/// };
///
/// let args = [Value::from("Order #"), Value::from(42), Value::Null, Value::from("!")];
/// assert_eq!(concat(&args, Span::default()).unwrap(), Value::from("Order #42!"));
/// ```
///
/// # Errors
/// Never fails.
pub fn concat(args: &[Value], _span: Span) -> EvalResult<Value> {
    Ok(Value::String(args.iter()
                         .filter(|value| !value.is_null())
                         .map(ToString::to_string)
                         .collect()))
}

fn map_text(name: &str, args: &[Value], span: Span, f: impl FnOnce(&str) -> Value) -> EvalResult<Value> {
    Ok(args::text(name, args, 0, span)?.map_or(Value::Null, f))
}

/// # Errors
/// `TYPE_MISMATCH` for a non-string argument.
pub fn upper(args: &[Value], span: Span) -> EvalResult<Value> {
    map_text("UPPER", args, span, |s| Value::String(s.to_uppercase()))
}

/// # Errors
/// `TYPE_MISMATCH` for a non-string argument.
pub fn lower(args: &[Value], span: Span) -> EvalResult<Value> {
    map_text("LOWER", args, span, |s| Value::String(s.to_lowercase()))
}

/// # Errors
/// `TYPE_MISMATCH` for a non-string argument.
pub fn trim(args: &[Value], span: Span) -> EvalResult<Value> {
    map_text("TRIM", args, span, |s| Value::String(s.trim().to_string()))
}

/// Length in characters. Also counts the elements of a list.
///
/// # Errors
/// `TYPE_MISMATCH` for anything but a string, a list or null.
pub fn len(args: &[Value], span: Span) -> EvalResult<Value> {
    match args.first() {
        Some(Value::List(items)) => Ok(Value::Number(usize_to_f64(items.len()))),
        _ => map_text("LEN", args, span, |s| Value::Number(usize_to_f64(s.chars().count()))),
    }
}

fn count_argument(name: &str, args: &[Value], span: Span) -> EvalResult<Option<usize>> {
    let Some(n) = args::integer(name, args, 1, span)? else {
        return Ok(None);
    };
    usize::try_from(n).map(Some).map_err(|_| {
        ExpressionError::invalid_argument(name, &format!("length must not be negative, found {n}"), span)
    })
}

/// The first `n` characters of a string.
///
/// # Example
/// ```
/// use computed_props::{
///     ast::Span,
///     interpreter::{evaluator::function::text::left, value::core::Value},
/// };
///
/// let args = [Value::from("Widget"), Value::from(3)];
/// assert_eq!(left(&args, Span::default()).unwrap(), Value::from("Wid"));
/// ```
///
/// # Errors
/// `TYPE_MISMATCH` for wrongly typed arguments, `INVALID_ARGUMENT` for a
/// negative or fractional length.
pub fn left(args: &[Value], span: Span) -> EvalResult<Value> {
    let count = count_argument("LEFT", args, span)?;
    let (Some(s), Some(count)) = (args::text("LEFT", args, 0, span)?, count) else {
        return Ok(Value::Null);
    };
    Ok(Value::String(s.chars().take(count).collect()))
}

/// The last `n` characters of a string.
///
/// # Errors
/// Same as `LEFT`.
pub fn right(args: &[Value], span: Span) -> EvalResult<Value> {
    let count = count_argument("RIGHT", args, span)?;
    let (Some(s), Some(count)) = (args::text("RIGHT", args, 0, span)?, count) else {
        return Ok(Value::Null);
    };
    let skip = s.chars().count().saturating_sub(count);
    Ok(Value::String(s.chars().skip(skip).collect()))
}

/// Case-sensitive substring test. A null haystack contains nothing.
///
/// # Errors
/// `TYPE_MISMATCH` for non-string arguments.
pub fn contains(args: &[Value], span: Span) -> EvalResult<Value> {
    let haystack = args::text("CONTAINS", args, 0, span)?;
    let needle = args::text("CONTAINS", args, 1, span)?;
    Ok(match (haystack, needle) {
        (Some(haystack), Some(needle)) => Value::Bool(haystack.contains(needle)),
        _ => Value::Bool(false),
    })
}
