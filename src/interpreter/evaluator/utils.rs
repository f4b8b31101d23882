use crate::{
    ast::{Expr, Span},
    error::ExpressionError,
    interpreter::{
        evaluator::{
            core::{Context, EvalResult, Scope},
            function::core::FunctionCategory,
        },
        value::core::Value,
    },
    util::similarity,
};

impl Context<'_> {
    /// Evaluates a function call.
    ///
    /// The name and argument count are checked against the registry before
    /// any argument is evaluated. `IF` evaluates only the branch it picks;
    /// every other function receives all of its arguments evaluated, left to
    /// right. Arguments of an aggregation function may contain `[*]`.
    pub(crate) fn eval_call(&self,
                            name: &str,
                            arguments: &[Expr],
                            span: Span)
                            -> EvalResult<Value> {
        let definition = self.registry.check_call(name, arguments.len(), span)?;
        let scope = Scope { in_aggregate: definition.category == FunctionCategory::Aggregation };

        if definition.category == FunctionCategory::Conditional && definition.name == "IF" {
            return self.eval_if(arguments, span, scope);
        }

        let values = arguments.iter()
                              .map(|argument| self.eval_in(argument, scope))
                              .collect::<EvalResult<Vec<_>>>()?;
        definition.call(&values, self, span)
    }

    /// `IF(condition, then, else?)`. A missing else branch yields `null`.
    fn eval_if(&self, arguments: &[Expr], span: Span, scope: Scope) -> EvalResult<Value> {
        let Some(condition) = arguments.first() else {
            return Err(ExpressionError::invalid_argument_count("IF", 2, Some(3), 0, span));
        };
        let value = self.eval_in(condition, scope)?;
        let Some(chosen) = value.as_condition() else {
            let details = format!("IF condition must be a boolean, found {}", value.type_name());
            return Err(ExpressionError::type_mismatch(details, condition.span()));
        };
        let branch = if chosen { arguments.get(1) } else { arguments.get(2) };
        branch.map_or(Ok(Value::Null), |expr| self.eval_in(expr, scope))
    }

    /// Builds the error for a bare identifier.
    ///
    /// Suggests `#name` when `self` has a property of that name and `NAME()`
    /// when a function is registered under it; otherwise falls back to
    /// similarly named properties.
    pub(crate) fn unknown_identifier(&self, name: &str, span: Span) -> ExpressionError {
        let mut suggestions = Vec::new();
        if self.properties.contains_key(name) {
            suggestions.push(format!("#{name}"));
        }
        if self.registry.contains(name) {
            suggestions.push(format!("{}()", name.to_uppercase()));
        }
        if suggestions.is_empty() {
            suggestions = self.suggest_names(name, self.properties.keys().map(String::as_str))
                              .into_iter()
                              .map(|property| format!("#{property}"))
                              .collect();
        }
        ExpressionError::unknown_identifier(name, suggestions, span)
    }

    /// Ranks `candidates` by similarity to `name`, keeping at most
    /// `max_suggestions`.
    pub(crate) fn suggest_names<'n>(&self,
                                    name: &str,
                                    candidates: impl IntoIterator<Item = &'n str>)
                                    -> Vec<String> {
        similarity::suggest(name, candidates, self.max_suggestions)
    }
}
