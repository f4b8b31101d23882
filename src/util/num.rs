/// Largest integer value exactly representable as an `f64` (`2^53 - 1`).
pub const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Converts an `f64` to `usize` if the value is finite, non-negative,
/// integral and exactly representable.
///
/// ## Example
/// ```
/// use computed_props::util::num::f64_to_usize_checked;
///
/// assert_eq!(f64_to_usize_checked(7.0), Some(7));
/// assert_eq!(f64_to_usize_checked(-1.0), None);
/// assert_eq!(f64_to_usize_checked(1.5), None);
/// assert_eq!(f64_to_usize_checked(f64::NAN), None);
/// ```
#[must_use]
#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_sign_loss)]
pub fn f64_to_usize_checked(value: f64) -> Option<usize> {
    if !value.is_finite() || value < 0.0 || value > MAX_SAFE_INTEGER || value.fract() != 0.0 {
        return None;
    }
    usize::try_from(value as u64).ok()
}

/// Converts an `f64` to `i64` if the value is finite, integral and exactly
/// representable.
///
/// ## Example
/// ```
/// use computed_props::util::num::f64_to_i64_checked;
///
/// assert_eq!(f64_to_i64_checked(-3.0), Some(-3));
/// assert_eq!(f64_to_i64_checked(0.25), None);
/// assert_eq!(f64_to_i64_checked(1e300), None);
/// ```
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn f64_to_i64_checked(value: f64) -> Option<i64> {
    if !value.is_finite() || value.abs() > MAX_SAFE_INTEGER || value.fract() != 0.0 {
        return None;
    }
    Some(value as i64)
}

/// Converts a count or length to `f64`.
///
/// Collections and strings never come close to `2^53` elements, so the
/// conversion is exact in practice.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub const fn usize_to_f64(value: usize) -> f64 {
    value as f64
}

/// Formats a number the way it is written in expressions.
///
/// Integral values print without a fractional part and negative zero prints
/// as `0`, so the output always lexes back to the same value.
///
/// ## Example
/// ```
/// use computed_props::util::num::format_number;
///
/// assert_eq!(format_number(3.0), "3");
/// assert_eq!(format_number(-0.0), "0");
/// assert_eq!(format_number(0.125), "0.125");
/// ```
#[must_use]
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    value.to_string()
}
