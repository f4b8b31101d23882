use crate::{
    ast::{Expr, Expression, LiteralValue},
    config::EngineConfig,
    error::ExpressionError,
    interpreter::{
        evaluator::{function::core::FunctionRegistry, resolver::EntityResolver},
        value::core::{PropertyMap, Value},
    },
    key::EntityId,
};

/// Result type used by the evaluator.
///
/// All evaluation functions return either a value of type `T` or an
/// `ExpressionError` describing the failure.
pub type EvalResult<T> = Result<T, ExpressionError>;

/// Default bound on resolver hops within one evaluation, counted across
/// nested evaluations started by resolvers.
pub const DEFAULT_MAX_DEPTH: usize = 64;
/// Default number of "did you mean" suggestions attached to an error.
pub const DEFAULT_MAX_SUGGESTIONS: usize = 3;

/// Stores the runtime evaluation context.
///
/// A context describes one evaluation: the entity that owns the expression
/// (`self`), its property values, how to reach other entities, which
/// functions exist and how deep evaluation may nest.
///
/// ## Usage
///
/// Contexts are cheap to build and are never mutated by evaluation, so the
/// same context may evaluate many expressions, from many threads.
///
/// ```
/// use std::collections::HashMap;
///
/// use computed_props::{interpreter::{evaluator::core::Context, value::core::Value}, parse};
///
/// let properties = HashMap::from([("price".to_string(), Value::from(4)),
///                                 ("quantity".to_string(), Value::from(3))]);
/// let context = Context::new(properties);
///
/// let expression = parse("#price * #quantity").unwrap();
/// assert_eq!(context.eval(&expression).unwrap(), Value::Number(12.0));
/// ```
#[derive(Clone)]
pub struct Context<'a> {
    /// Id of the entity the expression belongs to; required to read `self`
    /// properties through the resolver.
    pub self_id:         Option<EntityId>,
    /// Property values of `self`, consulted before the resolver.
    pub properties:      PropertyMap,
    /// Reaches entities other than `self`.
    pub resolver:        Option<&'a dyn EntityResolver>,
    /// Functions callable from the expression.
    pub registry:        &'a FunctionRegistry,
    /// Resolver hops already taken by enclosing evaluations; non-zero for
    /// nested resolution.
    pub depth:           usize,
    /// A resolver hop past this depth fails with `MAX_DEPTH_EXCEEDED`.
    pub max_depth:       usize,
    /// Upper bound on suggestions for unknown property names.
    pub max_suggestions: usize,
}

/// Per-node evaluation state threaded down the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Scope {
    /// Whether the node sits inside the arguments of an aggregation call.
    pub in_aggregate: bool,
}

impl Context<'static> {
    /// Creates a context over `properties` using the standard function
    /// registry, no resolver and the default limits.
    #[must_use]
    pub fn new(properties: PropertyMap) -> Self {
        Self { self_id: None,
               properties,
               resolver: None,
               registry: FunctionRegistry::standard(),
               depth: 0,
               max_depth: DEFAULT_MAX_DEPTH,
               max_suggestions: DEFAULT_MAX_SUGGESTIONS }
    }
}

impl<'a> Context<'a> {
    #[must_use]
    pub fn with_self_id(mut self, self_id: EntityId) -> Self {
        self.self_id = Some(self_id);
        self
    }

    /// Supplies the resolver used for `@{uuid}` references, entity links and
    /// `self` properties missing from the property map.
    #[must_use]
    pub fn with_resolver<'b>(self, resolver: &'b dyn EntityResolver) -> Context<'b>
        where 'a: 'b
    {
        Context { resolver: Some(resolver),
                  ..self }
    }

    /// Replaces the function registry.
    #[must_use]
    pub fn with_registry<'b>(self, registry: &'b FunctionRegistry) -> Context<'b>
        where 'a: 'b
    {
        Context { registry, ..self }
    }

    /// Starts evaluation `depth` hops deep; used by resolvers that evaluate
    /// other computed properties on behalf of an outer evaluation.
    #[must_use]
    pub fn with_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: &EngineConfig) -> Self {
        self.max_depth = config.max_depth;
        self.max_suggestions = config.max_suggestions;
        self
    }

    /// Evaluates a parsed expression.
    ///
    /// # Errors
    /// Any evaluation error, such as `TYPE_MISMATCH`, `DIVISION_BY_ZERO`,
    /// `PROPERTY_NOT_FOUND` or, when resolvers keep evaluating each other,
    /// `MAX_DEPTH_EXCEEDED`.
    pub fn eval(&self, expression: &Expression) -> EvalResult<Value> {
        self.eval_expr(&expression.body)
    }

    /// Evaluates a single node as the root of an evaluation.
    ///
    /// # Errors
    /// Same as [`Context::eval`].
    pub fn eval_expr(&self, expr: &Expr) -> EvalResult<Value> {
        self.eval_in(expr, Scope { in_aggregate: false })
    }

    /// Evaluates `expr` within `scope`.
    ///
    /// This is the dispatcher every node kind goes through. Syntactic nesting
    /// is bounded by the parser; only resolver hops count towards
    /// `max_depth`.
    pub(crate) fn eval_in(&self, expr: &Expr, scope: Scope) -> EvalResult<Value> {
        match expr {
            Expr::Literal { value, .. } => Ok(Self::eval_literal(value)),
            Expr::Identifier { name, span } => Err(self.unknown_identifier(name, *span)),
            Expr::Unary { op, operand, span } => self.eval_unary_op(*op, operand, *span, scope),
            Expr::Binary { left,
                           op,
                           right,
                           span, } => self.eval_binary_op(left, *op, right, *span, scope),
            Expr::Call { name,
                         arguments,
                         span, } => self.eval_call(name, arguments, *span),
            Expr::PropertyReference(reference) => self.eval_reference(reference, scope),
        }
    }

    /// Converts a literal into a value. Literals never fail.
    ///
    /// # Example
    /// ```
    /// use computed_props::{
    ///     ast::LiteralValue,
    ///     interpreter::{evaluator::core::Context, value::core::Value},
    /// };
    ///
    /// assert_eq!(Context::eval_literal(&LiteralValue::Number(7.0)), Value::Number(7.0));
    /// assert_eq!(Context::eval_literal(&LiteralValue::Null), Value::Null);
    /// ```
    #[must_use]
    pub fn eval_literal(value: &LiteralValue) -> Value {
        match value {
            LiteralValue::Number(n) => Value::Number(*n),
            LiteralValue::String(s) => Value::String(s.clone()),
            LiteralValue::Bool(b) => Value::Bool(*b),
            LiteralValue::Null => Value::Null,
        }
    }
}
