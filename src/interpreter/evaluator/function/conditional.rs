use crate::{
    ast::Span,
    error::ExpressionError,
    interpreter::{evaluator::core::EvalResult, value::core::Value},
};

/// `IF(condition, then, else?)` over evaluated arguments.
///
/// The evaluator never calls this for `IF` written in an expression, because
/// it evaluates only the chosen branch itself. It serves direct
/// [`invoke`](crate::interpreter::evaluator::function::core::FunctionRegistry::invoke)
/// calls.
///
/// # Errors
/// `TYPE_MISMATCH` when the condition is neither boolean nor null.
pub fn if_fn(args: &[Value], span: Span) -> EvalResult<Value> {
    let condition = args.first().unwrap_or(&Value::Null);
    let Some(chosen) = condition.as_condition() else {
        let details = format!("IF condition must be a boolean, found {}", condition.type_name());
        return Err(ExpressionError::type_mismatch(details, span));
    };
    let branch = if chosen { args.get(1) } else { args.get(2) };
    Ok(branch.cloned().unwrap_or(Value::Null))
}

/// The first non-null argument, or `null`.
///
/// # Example
/// ```
/// use computed_props::{
///     ast::Span,
///     interpreter::{evaluator::function::conditional::coalesce, value::core::Value},
/// };
///
/// let args = [Value::Null, Value::from("fallback"), Value::from("unused")];
/// assert_eq!(coalesce(&args, Span::default()).unwrap(), Value::from("fallback"));
/// ```
///
/// # Errors
/// Never fails.
pub fn coalesce(args: &[Value], _span: Span) -> EvalResult<Value> {
    Ok(args.iter().find(|value| !value.is_null()).cloned().unwrap_or(Value::Null))
}

/// # Errors
/// Never fails.
pub fn is_null(args: &[Value], _span: Span) -> EvalResult<Value> {
    Ok(Value::Bool(args.first().is_none_or(Value::is_null)))
}
