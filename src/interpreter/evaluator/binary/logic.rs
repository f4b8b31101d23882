use crate::{
    ast::{BinaryOperator, Span},
    error::ExpressionError,
    interpreter::{
        evaluator::core::{Context, EvalResult},
        value::core::Value,
    },
};

impl Context<'_> {
    /// Evaluates a logical operation between two already evaluated values.
    ///
    /// Operands must be booleans; null counts as `false`. The tree evaluator
    /// short-circuits before reaching this point, so this form is for callers
    /// that combine values directly.
    ///
    /// # Example
    /// ```
    /// use computed_props::{
    ///     ast::{BinaryOperator, Span},
    ///     interpreter::{evaluator::core::Context, value::core::Value},
    /// };
    ///
    /// let result = Context::eval_logic(BinaryOperator::Or,
    ///                                  &Value::Null,
    ///                                  &Value::Bool(true),
    ///                                  Span::default());
    /// assert_eq!(result.unwrap(), Value::Bool(true));
    /// ```
    ///
    /// # Errors
    /// `TYPE_MISMATCH` when an operand has no truth value.
    pub fn eval_logic(op: BinaryOperator,
                      left: &Value,
                      right: &Value,
                      span: Span)
                      -> EvalResult<Value> {
        let left = Self::logic_operand(op, left, span)?;
        let right = Self::logic_operand(op, right, span)?;
        Ok(Value::Bool(match op {
                           BinaryOperator::And => left && right,
                           _ => left || right,
                       }))
    }

    /// Reads one operand of `op` as a boolean.
    pub(crate) fn logic_operand(op: BinaryOperator, value: &Value, span: Span) -> EvalResult<bool> {
        value.as_condition().ok_or_else(|| {
                                ExpressionError::type_mismatch(format!("Operator `{op}` expects \
                                                                        booleans, found {}",
                                                                       value.type_name()),
                                                               span)
                            })
    }
}
