/// The evaluator module computes the value of an expression.
///
/// The evaluator walks the AST against a [`Context`](evaluator::core::Context)
/// that supplies the owning entity's properties, an optional resolver for
/// other entities, the function registry and a depth limit.
///
/// # Responsibilities
/// - Evaluates every node kind, short-circuiting `&&`, `||` and `IF`.
/// - Follows property paths, including `[n]` and `[*]` traversals.
/// - Hosts the function registry and the built-in function families.
/// - Reports typed errors such as division by zero or null references.
pub mod evaluator;
/// The lexer module tokenizes expression source.
///
/// # Responsibilities
/// - Converts the input into tokens carrying kind, text and byte range.
/// - Decodes string escapes and parses numbers and entity ids.
/// - Reports lexical errors for malformed literals and stray characters.
pub mod lexer;
/// The parser module builds the abstract syntax tree (AST) from tokens.
///
/// # Responsibilities
/// - Converts tokens into [`Expr`](crate::ast::Expr) nodes using precedence
///   climbing.
/// - Reports the first syntax error with its location.
pub mod parser;
/// Semantic checks that run without evaluating anything.
///
/// Collects every unknown function, wrong argument count, bare identifier and
/// unaggregated `[*]` traversal in one pass.
pub mod validate;
/// The value module defines the runtime data types for evaluation.
///
/// # Responsibilities
/// - Defines the `Value` enum and its type names.
/// - Converts between values and JSON, and coerces strings to dates.
pub mod value;
