use crate::{
    ast::{BinaryOperator, Span},
    error::ExpressionError,
    interpreter::{
        evaluator::core::{Context, EvalResult},
        value::core::Value,
    },
};

impl Context<'_> {
    /// Evaluates `+ - * / %` on two numbers.
    ///
    /// There is no implicit conversion: strings, booleans, dates and null are
    /// all rejected. Use `CONCAT` to join strings and `COALESCE` to default a
    /// null.
    ///
    /// # Example
    /// ```
    /// use computed_props::{
    ///     ast::{BinaryOperator, Span},
    ///     error::ErrorCode,
    ///     interpreter::{evaluator::core::Context, value::core::Value},
    /// };
    ///
    /// let span = Span::default();
    /// let ok = Context::eval_arithmetic(BinaryOperator::Mod,
    ///                                   &Value::Number(7.0),
    ///                                   &Value::Number(4.0),
    ///                                   span);
    /// assert_eq!(ok.unwrap(), Value::Number(3.0));
    ///
    /// let err = Context::eval_arithmetic(BinaryOperator::Div,
    ///                                    &Value::Number(1.0),
    ///                                    &Value::Number(0.0),
    ///                                    span).unwrap_err();
    /// assert_eq!(err.code, ErrorCode::DivisionByZero);
    /// ```
    ///
    /// # Errors
    /// `TYPE_MISMATCH` when either operand is not a number;
    /// `DIVISION_BY_ZERO` for `/` or `%` with a zero right operand.
    pub fn eval_arithmetic(op: BinaryOperator,
                           left: &Value,
                           right: &Value,
                           span: Span)
                           -> EvalResult<Value> {
        use BinaryOperator::{Add, Div, Mod, Mul, Sub};

        let (Value::Number(a), Value::Number(b)) = (left, right) else {
            return Err(ExpressionError::type_mismatch(format!("Operator `{op}` expects two \
                                                               numbers, found {} and {}",
                                                              left.type_name(),
                                                              right.type_name()),
                                                      span));
        };

        let result = match op {
            Add => a + b,
            Sub => a - b,
            Mul => a * b,
            Div | Mod if *b == 0.0 => return Err(ExpressionError::division_by_zero(span)),
            Div => a / b,
            Mod => a % b,
            _ => {
                return Err(ExpressionError::type_mismatch(format!("`{op}` is not an arithmetic \
                                                                   operator"),
                                                          span));
            },
        };
        Ok(Value::Number(result))
    }
}
