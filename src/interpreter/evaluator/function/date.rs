use chrono::{DateTime, Datelike, Months, NaiveTime, TimeDelta, Utc};

use crate::{
    ast::Span,
    error::ExpressionError,
    interpreter::{
        evaluator::{core::EvalResult, function::args},
        value::core::Value,
    },
};

/// Units accepted by `DATE_DIFF`.
pub const DIFF_UNITS: &[&str] = &["seconds", "minutes", "hours", "days", "weeks"];
/// Units accepted by `DATE_ADD`.
pub const ADD_UNITS: &[&str] = &["seconds", "minutes", "hours", "days", "weeks", "months", "years"];

/// Accepts singular spellings (`day`) as well as plural ones.
fn normalize_unit(unit: &str) -> String {
    if unit.ends_with('s') {
        unit.to_string()
    } else {
        format!("{unit}s")
    }
}

fn unknown_unit(name: &str, unit: &str, accepted: &[&str], span: Span) -> ExpressionError {
    ExpressionError::invalid_argument(name,
                                      &format!("unknown unit '{unit}', expected one of {}",
                                               accepted.join(", ")),
                                      span)
}

#[allow(clippy::cast_precision_loss)]
fn whole(n: i64) -> Value {
    Value::Number(n as f64)
}

/// The current instant.
///
/// # Errors
/// Never fails.
pub fn now(_args: &[Value], _span: Span) -> EvalResult<Value> {
    Ok(Value::Date(Utc::now()))
}

/// Midnight UTC of the current day.
///
/// # Errors
/// Never fails.
pub fn today(_args: &[Value], _span: Span) -> EvalResult<Value> {
    Ok(Value::Date(Utc::now().date_naive().and_time(NaiveTime::MIN).and_utc()))
}

fn map_date(name: &str, args: &[Value], span: Span, f: fn(&DateTime<Utc>) -> f64) -> EvalResult<Value> {
    Ok(args::date(name, args, 0, span)?.map_or(Value::Null, |d| Value::Number(f(&d))))
}

/// # Errors
/// `TYPE_MISMATCH` or `INVALID_ARGUMENT` when the argument is not a date.
pub fn year(args: &[Value], span: Span) -> EvalResult<Value> {
    map_date("YEAR", args, span, |d| f64::from(d.year()))
}

/// Month of the year, `1..=12`.
///
/// # Errors
/// `TYPE_MISMATCH` or `INVALID_ARGUMENT` when the argument is not a date.
pub fn month(args: &[Value], span: Span) -> EvalResult<Value> {
    map_date("MONTH", args, span, |d| f64::from(d.month()))
}

/// Day of the month, `1..=31`.
///
/// # Errors
/// `TYPE_MISMATCH` or `INVALID_ARGUMENT` when the argument is not a date.
pub fn day(args: &[Value], span: Span) -> EvalResult<Value> {
    map_date("DAY", args, span, |d| f64::from(d.day()))
}

/// `DATE_DIFF(start, end, unit?)`: whole units from `start` to `end`,
/// truncated toward zero. Negative when `end` is earlier. The unit defaults
/// to `days`.
///
/// # Example
/// ```
/// use computed_props::{
///     ast::Span,
///     interpreter::{evaluator::function::date::date_diff, value::core::Value},
/// };
///
/// let span = Span::default();
/// let args = [Value::from("2024-01-01"), Value::from("2024-03-01")];
/// assert_eq!(date_diff(&args, span).unwrap(), Value::Number(60.0));
///
/// let args = [Value::from("2024-01-01"), Value::from("2024-01-02"), Value::from("hours")];
/// assert_eq!(date_diff(&args, span).unwrap(), Value::Number(24.0));
/// ```
///
/// # Errors
/// `INVALID_ARGUMENT` for an unknown unit or an unparsable date string.
pub fn date_diff(args: &[Value], span: Span) -> EvalResult<Value> {
    let unit = normalize_unit(&args::unit("DATE_DIFF", args, 2, "days", span)?);
    if !DIFF_UNITS.contains(&unit.as_str()) {
        return Err(unknown_unit("DATE_DIFF", &unit, DIFF_UNITS, span));
    }
    let start = args::date("DATE_DIFF", args, 0, span)?;
    let end = args::date("DATE_DIFF", args, 1, span)?;
    let (Some(start), Some(end)) = (start, end) else {
        return Ok(Value::Null);
    };

    let delta = end - start;
    Ok(whole(match unit.as_str() {
                 "seconds" => delta.num_seconds(),
                 "minutes" => delta.num_minutes(),
                 "hours" => delta.num_hours(),
                 "weeks" => delta.num_weeks(),
                 _ => delta.num_days(),
             }))
}

/// `DATE_ADD(date, amount, unit?)`: shifts a date by a whole number of
/// units (default `days`). Month and year arithmetic clamps to the end of a
/// shorter month, so `2024-01-31` plus one month is `2024-02-29`.
///
/// # Errors
/// `INVALID_ARGUMENT` for an unknown unit, a fractional amount or a result
/// outside the representable range.
pub fn date_add(args: &[Value], span: Span) -> EvalResult<Value> {
    let unit = normalize_unit(&args::unit("DATE_ADD", args, 2, "days", span)?);
    if !ADD_UNITS.contains(&unit.as_str()) {
        return Err(unknown_unit("DATE_ADD", &unit, ADD_UNITS, span));
    }
    let date = args::date("DATE_ADD", args, 0, span)?;
    let amount = args::integer("DATE_ADD", args, 1, span)?;
    let (Some(date), Some(amount)) = (date, amount) else {
        return Ok(Value::Null);
    };

    let shifted = match unit.as_str() {
        "months" | "years" => {
            let months = if unit == "years" { amount.checked_mul(12) } else { Some(amount) };
            months.and_then(|months| shift_months(date, months))
        },
        _ => {
            let delta = match unit.as_str() {
                "seconds" => TimeDelta::try_seconds(amount),
                "minutes" => TimeDelta::try_minutes(amount),
                "hours" => TimeDelta::try_hours(amount),
                "weeks" => TimeDelta::try_weeks(amount),
                _ => TimeDelta::try_days(amount),
            };
            delta.and_then(|delta| date.checked_add_signed(delta))
        },
    };

    shifted.map(Value::Date).ok_or_else(|| {
        ExpressionError::invalid_argument("DATE_ADD",
                                          &format!("adding {amount} {unit} to {} is out of range",
                                                   date.to_rfc3339()),
                                          span)
    })
}

fn shift_months(date: DateTime<Utc>, months: i64) -> Option<DateTime<Utc>> {
    let magnitude = Months::new(u32::try_from(months.unsigned_abs()).ok()?);
    if months >= 0 {
        date.checked_add_months(magnitude)
    } else {
        date.checked_sub_months(magnitude)
    }
}
