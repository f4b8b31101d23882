use crate::{
    ast::{BinaryOperator, Expr, Span},
    interpreter::{
        evaluator::core::{Context, EvalResult, Scope},
        value::core::Value,
    },
};

impl Context<'_> {
    /// Evaluates a binary node.
    ///
    /// `&&` and `||` evaluate the right operand only when the left one does
    /// not decide the result, so `false && (1 / 0)` is `false`. Every other
    /// operator evaluates both operands, left first.
    pub(crate) fn eval_binary_op(&self,
                                 left: &Expr,
                                 op: BinaryOperator,
                                 right: &Expr,
                                 span: Span,
                                 scope: Scope)
                                 -> EvalResult<Value> {
        if op.is_logical() {
            let lhs = self.eval_in(left, scope)?;
            let decided = Self::logic_operand(op, &lhs, left.span())?;
            if decided == (op == BinaryOperator::Or) {
                return Ok(Value::Bool(decided));
            }
            let rhs = self.eval_in(right, scope)?;
            return Ok(Value::Bool(Self::logic_operand(op, &rhs, right.span())?));
        }

        let lhs = self.eval_in(left, scope)?;
        let rhs = self.eval_in(right, scope)?;
        Self::eval_binary(op, &lhs, &rhs, span)
    }

    /// Evaluates a binary operation between two values.
    ///
    /// Arithmetic operators go to `eval_arithmetic`, comparisons to
    /// `eval_comparison` and logical operators to `eval_logic`.
    ///
    /// # Example
    /// ```
    /// use computed_props::{
    ///     ast::{BinaryOperator, Span},
    ///     interpreter::{evaluator::core::Context, value::core::Value},
    /// };
    ///
    /// let span = Span::new(0, 5);
    /// let result = Context::eval_binary(BinaryOperator::Add,
    ///                                   &Value::Number(3.0),
    ///                                   &Value::Number(4.0),
    ///                                   span);
    /// assert_eq!(result.unwrap(), Value::Number(7.0));
    /// ```
    ///
    /// # Errors
    /// `TYPE_MISMATCH` for unsupported operand types, `DIVISION_BY_ZERO` for
    /// a zero divisor.
    pub fn eval_binary(op: BinaryOperator,
                       left: &Value,
                       right: &Value,
                       span: Span)
                       -> EvalResult<Value> {
        use BinaryOperator::{
            Add, And, Div, Equal, Greater, GreaterEqual, Less, LessEqual, Mod, Mul, NotEqual, Or,
            Sub,
        };

        match op {
            Add | Sub | Mul | Div | Mod => Self::eval_arithmetic(op, left, right, span),
            Equal | NotEqual | Less | LessEqual | Greater | GreaterEqual => {
                Self::eval_comparison(op, left, right, span)
            },
            And | Or => Self::eval_logic(op, left, right, span),
        }
    }
}
