/// Parser entry points.
///
/// Defines `ParseResult`, the top-level `parse_expression` rule and the
/// functions that turn a whole token stream or source string into an
/// [`Expression`](crate::ast::Expression).
pub mod core;

/// Binary operator parsing.
///
/// One function per precedence level, from `||` (loosest) down to
/// `* / %` (tightest). Every level is left-associative.
pub mod binary;

/// Prefix operators and primary expressions.
///
/// Handles `!` and `-`, literals, parenthesized groups, function calls and
/// bare identifiers. Property references are delegated to [`path`].
pub mod unary;

/// Property reference parsing.
///
/// Parses `@self.a.b`, `@{uuid}.a` and `#a` forms together with their
/// `[n]` and `[*]` traversals.
pub mod path;

/// Utility functions for the parser.
///
/// Token expectations, error construction for unexpected tokens and
/// comma-separated list parsing.
pub mod utils;
