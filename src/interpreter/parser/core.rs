use std::iter::Peekable;

use crate::{
    ast::{Expr, Expression, Span},
    error::ExpressionError,
    interpreter::{
        lexer::{Token, TokenKind, tokenize},
        parser::binary::parse_logical_or,
    },
};

pub type ParseResult<T> = Result<T, ExpressionError>;

/// How deeply groups, prefix operators and call arguments may nest.
pub const MAX_NESTING: usize = 64;

/// Tallest tree the parser returns. Operator chains such as `1 + 1 + ...`
/// grow the tree without nesting, so they are bounded separately.
pub const MAX_HEIGHT: usize = 512;

/// Parses a full expression.
///
/// This is the entry point for expression parsing.
/// It begins at the lowest-precedence level, logical OR, and recursively
/// descends through the precedence hierarchy.
///
/// Grammar: `expression := logical_or`
///
/// # Parameters
/// - `tokens`: Token iterator positioned at the start of an expression.
/// - `depth`: How many groups, prefix operators and call argument lists
///   enclose this expression.
///
/// # Returns
/// The parsed expression node.
pub fn parse_expression<'a, I>(tokens: &mut Peekable<I>, depth: usize) -> ParseResult<Expr>
    where I: Iterator<Item = &'a Token> + Clone
{
    parse_logical_or(tokens, depth)
}

/// Parses a complete token stream, as produced by
/// [`tokenize`](crate::interpreter::lexer::tokenize), into an [`Expression`].
///
/// The stream must contain exactly one expression followed by
/// [`TokenKind::Eof`].
///
/// # Errors
/// - `UNEXPECTED_TOKEN` when tokens remain after a complete expression.
/// - `MAX_DEPTH_EXCEEDED` past [`MAX_NESTING`] or [`MAX_HEIGHT`].
/// - Any error raised by the precedence rules.
pub fn parse_tokens(tokens: &[Token], source_len: usize) -> ParseResult<Expression> {
    let mut iter = tokens.iter().peekable();
    let body = parse_expression(&mut iter, 0)?;
    if body.height() > MAX_HEIGHT {
        return Err(ExpressionError::nesting_too_deep(MAX_HEIGHT, body.span()));
    }

    match iter.peek() {
        Some(token) if token.kind != TokenKind::Eof => {
            Err(ExpressionError::unexpected_token("end of expression",
                                                  &token.kind.describe(&token.text),
                                                  token.span))
        },
        _ => Ok(Expression { body,
                             span: Span::new(0, source_len) }),
    }
}

/// Tokenizes and parses `source`.
///
/// # Errors
/// Returns the first lexical or syntactic error.
///
/// # Example
/// ```
/// use computed_props::interpreter::parser::core::parse_source;
///
/// let expression = parse_source("1 + 2 * 3").unwrap();
/// assert_eq!(expression.to_string(), "1 + 2 * 3");
///
/// let grouped = parse_source("(1 + 2) * 3").unwrap();
/// assert_eq!(grouped.to_string(), "(1 + 2) * 3");
/// ```
pub fn parse_source(source: &str) -> ParseResult<Expression> {
    let tokens = tokenize(source)?;
    parse_tokens(&tokens, source.len())
}
