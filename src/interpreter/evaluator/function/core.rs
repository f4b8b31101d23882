use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::Serialize;

use crate::{
    ast::Span,
    error::ExpressionError,
    interpreter::{
        evaluator::{
            core::{Context, DEFAULT_MAX_SUGGESTIONS, EvalResult},
            function::{aggregate, conditional, date, math, text},
        },
        value::core::{PropertyMap, Value, ValueType},
    },
    util::similarity,
};

/// Signature of a function implementation.
///
/// An implementation receives its evaluated arguments and the span of the
/// call, which it attaches to any error it raises.
pub type FunctionImpl = fn(&[Value], Span) -> EvalResult<Value>;

/// Signature of an implementation that reads entity properties while it
/// runs, through [`Context::read_property`].
pub type ReadingFunctionImpl = fn(&[Value], &Context<'_>, Span) -> EvalResult<Value>;

/// How a function computes its result.
#[derive(Debug, Clone, Copy)]
pub enum Implementation {
    /// Depends on the evaluated arguments only. Every builtin is pure.
    Pure(FunctionImpl),
    /// May read properties through the calling context's resolver. Under
    /// [`Context::eval_async`] those reads are answered by the async
    /// resolver.
    Reading(ReadingFunctionImpl),
}

/// The family a function belongs to.
///
/// Only `Aggregation` changes evaluation: references with `[*]` are allowed
/// among its arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FunctionCategory {
    Aggregation,
    Conditional,
    String,
    Math,
    Date,
}

/// Specifies the allowed number of arguments for a builtin.
///
/// - `Exact(n)` means the builtin must receive exactly `n` arguments.
/// - `Range(min, max)` accepts any count within `min..=max`.
/// - `AtLeast(min)` is for variadic functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    Range(usize, usize),
    AtLeast(usize),
}

impl Arity {
    /// The bounds as `(min_args, max_args)`; `None` means unbounded.
    #[must_use]
    pub const fn bounds(self) -> (usize, Option<usize>) {
        match self {
            Self::Exact(n) => (n, Some(n)),
            Self::Range(min, max) => (min, Some(max)),
            Self::AtLeast(min) => (min, None),
        }
    }
}

/// A callable function: its name, arity, result type, family and
/// implementation.
#[derive(Debug, Clone)]
pub struct FunctionDefinition {
    /// Upper-cased name the function is looked up by.
    pub name:           String,
    pub min_args:       usize,
    /// `None` for variadic functions.
    pub max_args:       Option<usize>,
    /// Declared result type; [`ValueType::Any`] when it depends on the input.
    pub return_type:    ValueType,
    pub category:       FunctionCategory,
    pub implementation: Implementation,
}

impl FunctionDefinition {
    /// Creates a definition. The name is stored upper-cased.
    ///
    /// # Example
    /// ```
    /// use computed_props::{
    ///     ast::Span,
    ///     interpreter::{
    ///         evaluator::function::core::{Arity, FunctionCategory, FunctionDefinition},
    ///         value::core::{Value, ValueType},
    ///     },
    /// };
    ///
    /// fn double(args: &[Value], _span: Span) -> Result<Value, computed_props::ExpressionError> {
    ///     Ok(Value::Number(args[0].as_number().unwrap_or(0.0) * 2.0))
    /// }
    ///
    /// let def = FunctionDefinition::new("double",
    ///                                   Arity::Exact(1),
    ///                                   ValueType::Number,
    ///                                   FunctionCategory::Math,
    ///                                   double);
    /// assert_eq!(def.name, "DOUBLE");
    /// assert!(def.accepts(1));
    /// assert!(!def.accepts(2));
    /// ```
    #[must_use]
    pub fn new(name: &str,
               arity: Arity,
               return_type: ValueType,
               category: FunctionCategory,
               implementation: FunctionImpl)
               -> Self {
        Self::with_implementation(name,
                                  arity,
                                  return_type,
                                  category,
                                  Implementation::Pure(implementation))
    }

    /// Creates a definition whose implementation reads entity properties.
    #[must_use]
    pub fn reading(name: &str,
                   arity: Arity,
                   return_type: ValueType,
                   category: FunctionCategory,
                   implementation: ReadingFunctionImpl)
                   -> Self {
        Self::with_implementation(name,
                                  arity,
                                  return_type,
                                  category,
                                  Implementation::Reading(implementation))
    }

    fn with_implementation(name: &str,
                           arity: Arity,
                           return_type: ValueType,
                           category: FunctionCategory,
                           implementation: Implementation)
                           -> Self {
        let (min_args, max_args) = arity.bounds();
        Self { name: name.to_uppercase(),
               min_args,
               max_args,
               return_type,
               category,
               implementation }
    }

    /// Tests whether `count` arguments satisfy the arity.
    #[must_use]
    pub fn accepts(&self, count: usize) -> bool {
        count >= self.min_args && self.max_args.is_none_or(|max| count <= max)
    }

    /// Runs the implementation. Arity is not checked here.
    ///
    /// # Errors
    /// Whatever the implementation raises.
    pub fn call(&self, args: &[Value], context: &Context<'_>, span: Span) -> EvalResult<Value> {
        match self.implementation {
            Implementation::Pure(function) => function(args, span),
            Implementation::Reading(function) => function(args, context, span),
        }
    }
}

/// Defines builtin functions by generating a definition table and a name
/// list.
///
/// Each entry provides:
/// - a name,
/// - a category,
/// - an arity specification,
/// - the declared return type,
/// - a function pointer implementing the builtin.
///
/// The macro produces `builtin_definitions()` and `BUILTIN_FUNCTIONS` (the
/// public list of builtin names).
macro_rules! builtin_functions {
    (
        $(
            $name:literal => {
                category: $category:ident,
                arity: $arity:expr,
                returns: $returns:ident,
                func: $func:expr $(,)?
            }
        ),* $(,)?
    ) => {
        fn builtin_definitions() -> Vec<FunctionDefinition> {
            vec![
                $(
                    FunctionDefinition::new($name,
                                            $arity,
                                            ValueType::$returns,
                                            FunctionCategory::$category,
                                            $func),
                )*
            ]
        }

        /// Names of every builtin function, in table order.
        pub const BUILTIN_FUNCTIONS: &[&str] = &[
            $($name,)*
        ];
    };
}

builtin_functions! {
    "SUM"       => { category: Aggregation, arity: Arity::AtLeast(0),   returns: Number,  func: aggregate::sum },
    "COUNT"     => { category: Aggregation, arity: Arity::AtLeast(0),   returns: Number,  func: aggregate::count },
    "AVG"       => { category: Aggregation, arity: Arity::AtLeast(1),   returns: Number,  func: aggregate::avg },
    "AVERAGE"   => { category: Aggregation, arity: Arity::AtLeast(1),   returns: Number,  func: aggregate::avg },
    "MIN"       => { category: Aggregation, arity: Arity::AtLeast(1),   returns: Any,     func: aggregate::min },
    "MAX"       => { category: Aggregation, arity: Arity::AtLeast(1),   returns: Any,     func: aggregate::max },
    "IF"        => { category: Conditional, arity: Arity::Range(2, 3),  returns: Any,     func: conditional::if_fn },
    "COALESCE"  => { category: Conditional, arity: Arity::AtLeast(1),   returns: Any,     func: conditional::coalesce },
    "ISNULL"    => { category: Conditional, arity: Arity::Exact(1),     returns: Boolean, func: conditional::is_null },
    "CONCAT"    => { category: String,      arity: Arity::AtLeast(1),   returns: String,  func: text::concat },
    "UPPER"     => { category: String,      arity: Arity::Exact(1),     returns: String,  func: text::upper },
    "LOWER"     => { category: String,      arity: Arity::Exact(1),     returns: String,  func: text::lower },
    "TRIM"      => { category: String,      arity: Arity::Exact(1),     returns: String,  func: text::trim },
    "LEN"       => { category: String,      arity: Arity::Exact(1),     returns: Number,  func: text::len },
    "LEFT"      => { category: String,      arity: Arity::Exact(2),     returns: String,  func: text::left },
    "RIGHT"     => { category: String,      arity: Arity::Exact(2),     returns: String,  func: text::right },
    "CONTAINS"  => { category: String,      arity: Arity::Exact(2),     returns: Boolean, func: text::contains },
    "ABS"       => { category: Math,        arity: Arity::Exact(1),     returns: Number,  func: math::abs },
    "ROUND"     => { category: Math,        arity: Arity::Range(1, 2),  returns: Number,  func: math::round },
    "FLOOR"     => { category: Math,        arity: Arity::Exact(1),     returns: Number,  func: math::floor },
    "CEIL"      => { category: Math,        arity: Arity::Exact(1),     returns: Number,  func: math::ceil },
    "SQRT"      => { category: Math,        arity: Arity::Exact(1),     returns: Number,  func: math::sqrt },
    "POW"       => { category: Math,        arity: Arity::Exact(2),     returns: Number,  func: math::pow },
    "NOW"       => { category: Date,        arity: Arity::Exact(0),     returns: Date,    func: date::now },
    "TODAY"     => { category: Date,        arity: Arity::Exact(0),     returns: Date,    func: date::today },
    "YEAR"      => { category: Date,        arity: Arity::Exact(1),     returns: Number,  func: date::year },
    "MONTH"     => { category: Date,        arity: Arity::Exact(1),     returns: Number,  func: date::month },
    "DAY"       => { category: Date,        arity: Arity::Exact(1),     returns: Number,  func: date::day },
    "DATE_DIFF" => { category: Date,        arity: Arity::Range(2, 3),  returns: Number,  func: date::date_diff },
    "DATE_ADD"  => { category: Date,        arity: Arity::Range(2, 3),  returns: Date,    func: date::date_add },
}

static STANDARD: Lazy<FunctionRegistry> = Lazy::new(FunctionRegistry::with_builtins);

/// Maps upper-cased function names to their definitions.
///
/// A registry is an ordinary value: build one with [`FunctionRegistry::new`]
/// or [`FunctionRegistry::with_builtins`], register extra functions, and hand
/// it to a context with `Context::with_registry`. Evaluation only reads it.
///
/// ## Example
/// ```
/// use computed_props::{
///     ast::Span,
///     error::ErrorCode,
///     interpreter::{evaluator::function::core::FunctionRegistry, value::core::Value},
/// };
///
/// let registry = FunctionRegistry::standard();
/// let total = registry.invoke("sum", &[Value::from(1), Value::from(2)], Span::default());
/// assert_eq!(total.unwrap(), Value::Number(3.0));
///
/// let err = registry.invoke("SUMM", &[], Span::default()).unwrap_err();
/// assert_eq!(err.code, ErrorCode::InvalidFunction);
/// assert!(err.suggestions.contains(&"SUM".to_string()));
/// ```
#[derive(Debug, Clone)]
pub struct FunctionRegistry {
    functions:       HashMap<String, FunctionDefinition>,
    max_suggestions: usize,
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl FunctionRegistry {
    /// Creates a registry with no functions.
    #[must_use]
    pub fn new() -> Self {
        Self { functions:       HashMap::new(),
               max_suggestions: DEFAULT_MAX_SUGGESTIONS, }
    }

    /// Creates a registry holding every builtin function.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for definition in builtin_definitions() {
            registry.register(definition);
        }
        registry
    }

    /// The shared, read-only registry of builtin functions, built on first
    /// use.
    #[must_use]
    pub fn standard() -> &'static Self {
        &STANDARD
    }

    /// Caps the number of suggestions attached to `INVALID_FUNCTION`.
    #[must_use]
    pub const fn with_suggestion_limit(mut self, limit: usize) -> Self {
        self.max_suggestions = limit;
        self
    }

    /// Adds a function, returning the definition it replaces, if any.
    pub fn register(&mut self, mut definition: FunctionDefinition) -> Option<FunctionDefinition> {
        definition.name = definition.name.to_uppercase();
        self.functions.insert(definition.name.clone(), definition)
    }

    /// Looks up a function by name, ignoring case.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FunctionDefinition> {
        self.functions.get(&name.to_uppercase())
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    #[must_use]
    pub fn is_aggregation(&self, name: &str) -> bool {
        self.get(name)
            .is_some_and(|definition| definition.category == FunctionCategory::Aggregation)
    }

    /// Names similar to `name`, most similar first.
    #[must_use]
    pub fn suggest(&self, name: &str) -> Vec<String> {
        similarity::suggest(name,
                            self.functions.keys().map(String::as_str),
                            self.max_suggestions)
    }

    /// Resolves `name` and checks that it accepts `count` arguments.
    ///
    /// # Errors
    /// `INVALID_FUNCTION` with suggestions for an unknown name;
    /// `INVALID_ARGUMENT_COUNT` stating the accepted range otherwise.
    pub fn check_call(&self,
                      name: &str,
                      count: usize,
                      span: Span)
                      -> EvalResult<&FunctionDefinition> {
        let definition =
            self.get(name)
                .ok_or_else(|| ExpressionError::invalid_function(name, self.suggest(name), span))?;
        if !definition.accepts(count) {
            return Err(ExpressionError::invalid_argument_count(&definition.name,
                                                               definition.min_args,
                                                               definition.max_args,
                                                               count,
                                                               span));
        }
        Ok(definition)
    }

    /// Calls a function with already evaluated arguments.
    ///
    /// Reading functions run against an empty context with no resolver; use
    /// [`FunctionRegistry::invoke_in`] to give them one.
    ///
    /// # Errors
    /// The errors of [`FunctionRegistry::check_call`], then whatever the
    /// implementation raises.
    pub fn invoke(&self, name: &str, args: &[Value], span: Span) -> EvalResult<Value> {
        let context = Context::new(PropertyMap::new()).with_registry(self);
        self.invoke_in(&context, name, args, span)
    }

    /// Calls a function with already evaluated arguments, letting reading
    /// functions reach entities through `context`.
    ///
    /// # Errors
    /// Same as [`FunctionRegistry::invoke`].
    pub fn invoke_in(&self,
                     context: &Context<'_>,
                     name: &str,
                     args: &[Value],
                     span: Span)
                     -> EvalResult<Value> {
        self.check_call(name, args.len(), span)?.call(args, context, span)
    }
}
