use std::cmp::Ordering;

use crate::{
    ast::{BinaryOperator, Span},
    error::ExpressionError,
    interpreter::{
        evaluator::core::{Context, EvalResult},
        value::core::Value,
    },
};

impl Context<'_> {
    /// Evaluates a comparison of the form `Value <Operator> Value`.
    ///
    /// `==` and `!=` use structural equality and never convert between types,
    /// so `1 == "1"` is `false`. Ordering operators accept two numbers, two
    /// strings or two dates (a string that reads as a date also compares with
    /// a date).
    ///
    /// # Example
    /// ```
    /// use computed_props::{
    ///     ast::{BinaryOperator, Span},
    ///     interpreter::{evaluator::core::Context, value::core::Value},
    /// };
    ///
    /// let span = Span::default();
    /// let less = Context::eval_comparison(BinaryOperator::Less,
    ///                                     &Value::Number(3.0),
    ///                                     &Value::Number(5.0),
    ///                                     span);
    /// assert_eq!(less.unwrap(), Value::Bool(true));
    ///
    /// let mixed = Context::eval_comparison(BinaryOperator::Equal,
    ///                                      &Value::Number(1.0),
    ///                                      &Value::from("1"),
    ///                                      span);
    /// assert_eq!(mixed.unwrap(), Value::Bool(false));
    /// ```
    ///
    /// # Errors
    /// `TYPE_MISMATCH` when an ordering operator gets incomparable operands.
    pub fn eval_comparison(op: BinaryOperator,
                           left: &Value,
                           right: &Value,
                           span: Span)
                           -> EvalResult<Value> {
        use BinaryOperator::{Equal, Greater, GreaterEqual, Less, LessEqual, NotEqual};

        if matches!(op, Equal | NotEqual) {
            return Ok(Value::Bool((left == right) == (op == Equal)));
        }

        let ordering = left.compare(right).ok_or_else(|| {
                           ExpressionError::type_mismatch(format!("Cannot compare {} with {} \
                                                                   using `{op}`",
                                                                  left.type_name(),
                                                                  right.type_name()),
                                                          span)
                       })?;
        Ok(Value::Bool(match op {
                           Less => ordering == Ordering::Less,
                           LessEqual => ordering != Ordering::Greater,
                           Greater => ordering == Ordering::Greater,
                           GreaterEqual => ordering != Ordering::Less,
                           _ => false,
                       }))
    }
}
