use crate::{
    ast::Span,
    error::ExpressionError,
    interpreter::{
        evaluator::{core::EvalResult, function::args},
        value::core::Value,
    },
};

/// Largest number of decimal places `ROUND` accepts.
const MAX_ROUND_DIGITS: i64 = 15;

fn map_number(name: &str, args: &[Value], span: Span, f: fn(f64) -> f64) -> EvalResult<Value> {
    Ok(args::number(name, args, 0, span)?.map_or(Value::Null, |n| Value::Number(f(n))))
}

/// # Errors
/// `TYPE_MISMATCH` for a non-number.
pub fn abs(args: &[Value], span: Span) -> EvalResult<Value> {
    map_number("ABS", args, span, f64::abs)
}

/// # Errors
/// `TYPE_MISMATCH` for a non-number.
pub fn floor(args: &[Value], span: Span) -> EvalResult<Value> {
    map_number("FLOOR", args, span, f64::floor)
}

/// # Errors
/// `TYPE_MISMATCH` for a non-number.
pub fn ceil(args: &[Value], span: Span) -> EvalResult<Value> {
    map_number("CEIL", args, span, f64::ceil)
}

/// Rounds half away from zero to `digits` decimal places (default `0`).
/// Negative `digits` round to tens, hundreds, and so on.
///
/// # Example
/// ```
/// use computed_props::{
///     ast::Span,
///     interpreter::{evaluator::function::math::round, value::core::Value},
/// };
///
/// let span = Span::default();
/// assert_eq!(round(&[Value::from(2.5)], span).unwrap(), Value::Number(3.0));
/// assert_eq!(round(&[Value::from(3.14159), Value::from(2)], span).unwrap(),
///            Value::Number(3.14));
/// assert_eq!(round(&[Value::from(1234.0), Value::from(-2)], span).unwrap(),
///            Value::Number(1200.0));
/// ```
///
/// # Errors
/// `TYPE_MISMATCH` for non-numbers; `INVALID_ARGUMENT` when `digits` is
/// fractional or beyond 15 places either way.
pub fn round(args: &[Value], span: Span) -> EvalResult<Value> {
    let digits = args::integer("ROUND", args, 1, span)?.unwrap_or(0);
    if digits.abs() > MAX_ROUND_DIGITS {
        let details = format!("digits must be between -{MAX_ROUND_DIGITS} and \
                               {MAX_ROUND_DIGITS}, found {digits}");
        return Err(ExpressionError::invalid_argument("ROUND", &details, span));
    }
    let Some(x) = args::number("ROUND", args, 0, span)? else {
        return Ok(Value::Null);
    };
    let factor = 10f64.powi(i32::try_from(digits.abs()).unwrap_or(0));
    if digits >= 0 {
        Ok(Value::Number((x * factor).round() / factor))
    } else {
        Ok(Value::Number((x / factor).round() * factor))
    }
}

/// # Errors
/// `TYPE_MISMATCH` for a non-number, `INVALID_ARGUMENT` for a negative one.
pub fn sqrt(args: &[Value], span: Span) -> EvalResult<Value> {
    match args::number("SQRT", args, 0, span)? {
        None => Ok(Value::Null),
        Some(x) if x < 0.0 => {
            Err(ExpressionError::invalid_argument("SQRT",
                                                  &format!("cannot take the square root of {x}"),
                                                  span))
        },
        Some(x) => Ok(Value::Number(x.sqrt())),
    }
}

/// `base` raised to `exponent`.
///
/// # Errors
/// `TYPE_MISMATCH` for non-numbers, `INVALID_ARGUMENT` when the result is
/// not a finite number (for example `POW(-8, 0.5)`).
pub fn pow(args: &[Value], span: Span) -> EvalResult<Value> {
    let base = args::number("POW", args, 0, span)?;
    let exponent = args::number("POW", args, 1, span)?;
    let (Some(base), Some(exponent)) = (base, exponent) else {
        return Ok(Value::Null);
    };
    let result = base.powf(exponent);
    if !result.is_finite() {
        return Err(ExpressionError::invalid_argument("POW",
                                                     &format!("{base} to the power of {exponent} \
                                                               is not a finite number"),
                                                     span));
    }
    Ok(Value::Number(result))
}
