use crate::{
    ast::{Expr, Span, UnaryOperator},
    error::ExpressionError,
    interpreter::{
        evaluator::core::{Context, EvalResult, Scope},
        value::core::Value,
    },
};

impl Context<'_> {
    pub(crate) fn eval_unary_op(&self,
                                op: UnaryOperator,
                                operand: &Expr,
                                span: Span,
                                scope: Scope)
                                -> EvalResult<Value> {
        let value = self.eval_in(operand, scope)?;
        Self::eval_unary(op, &value, span)
    }

    /// Evaluates a unary operation on a value.
    ///
    /// - `Negate` accepts numbers only.
    /// - `Not` accepts booleans; `null` is falsy, so `!null` is `true`.
    ///
    /// # Example
    /// ```
    /// use computed_props::{
    ///     ast::{Span, UnaryOperator},
    ///     interpreter::{evaluator::core::Context, value::core::Value},
    /// };
    ///
    /// let span = Span::default();
    /// let v = Context::eval_unary(UnaryOperator::Negate, &Value::Number(5.0), span).unwrap();
    /// assert_eq!(v, Value::Number(-5.0));
    ///
    /// let v = Context::eval_unary(UnaryOperator::Not, &Value::Null, span).unwrap();
    /// assert_eq!(v, Value::Bool(true));
    ///
    /// assert!(Context::eval_unary(UnaryOperator::Not, &Value::from("yes"), span).is_err());
    /// ```
    ///
    /// # Errors
    /// `TYPE_MISMATCH` when the operand has the wrong type.
    pub fn eval_unary(op: UnaryOperator, value: &Value, span: Span) -> EvalResult<Value> {
        match op {
            UnaryOperator::Negate => match value {
                Value::Number(n) => Ok(Value::Number(-n)),
                _ => Err(ExpressionError::type_mismatch(format!("Cannot negate {}",
                                                                value.type_name()),
                                                        span)),
            },
            UnaryOperator::Not => match value.as_condition() {
                Some(b) => Ok(Value::Bool(!b)),
                None => Err(ExpressionError::type_mismatch(format!("Operator `!` expects a \
                                                                    boolean, found {}",
                                                                   value.type_name()),
                                                           span)),
            },
        }
    }
}
