use std::iter::Peekable;

use crate::{
    error::{ErrorCode, ExpressionError},
    interpreter::{
        lexer::{Token, TokenKind},
        parser::core::ParseResult,
    },
};

/// Builds the error for finding `token` where `expected` was required.
///
/// Running into [`TokenKind::Eof`] is reported as `UNEXPECTED_END`, anything
/// else as `UNEXPECTED_TOKEN`.
pub(in crate::interpreter::parser) fn unexpected(token: &Token, expected: &str) -> ExpressionError {
    if token.kind == TokenKind::Eof {
        ExpressionError::unexpected_end(expected, token.span.start)
    } else {
        ExpressionError::unexpected_token(expected, &token.kind.describe(&token.text), token.span)
    }
}

/// Consumes and returns the next token.
///
/// Token streams always end with `Eof`, so running out of tokens means the
/// caller consumed `Eof` itself; that is still reported as `UNEXPECTED_END`.
pub(in crate::interpreter::parser) fn next_token<'a, I>(tokens: &mut Peekable<I>,
                                                        expected: &str)
                                                        -> ParseResult<&'a Token>
    where I: Iterator<Item = &'a Token> + Clone
{
    tokens.next().ok_or_else(|| {
                     ExpressionError::new(ErrorCode::UnexpectedEnd,
                                          format!("Unexpected end of input: expected {expected}"))
                 })
}

/// Consumes the next token and checks that it is `kind`.
pub(in crate::interpreter::parser) fn expect<'a, I>(tokens: &mut Peekable<I>,
                                                    kind: &TokenKind,
                                                    expected: &str)
                                                    -> ParseResult<&'a Token>
    where I: Iterator<Item = &'a Token> + Clone
{
    let token = next_token(tokens, expected)?;
    if &token.kind == kind { Ok(token) } else { Err(unexpected(token, expected)) }
}

/// Whether the next token is `kind`, without consuming it.
pub(in crate::interpreter::parser) fn peek_is<'a, I>(tokens: &mut Peekable<I>,
                                                     kind: &TokenKind)
                                                     -> bool
    where I: Iterator<Item = &'a Token> + Clone
{
    tokens.peek().is_some_and(|token| &token.kind == kind)
}

/// Parses a comma-separated list of items until a closing token.
///
/// An immediately encountered closing token produces an empty list. Returns
/// the items together with the closing token so callers can compute spans.
///
/// Grammar (simplified): `list := (item ("," item)*)? closing`
///
/// # Errors
/// Returns an error if an item fails to parse, or if something other than a
/// comma or the closing token follows an item.
pub(in crate::interpreter::parser) fn parse_comma_separated<'a, I, T>(
    tokens: &mut Peekable<I>,
    parse_item: impl Fn(&mut Peekable<I>) -> ParseResult<T>,
    closing: &TokenKind,
    closing_text: &str)
    -> ParseResult<(Vec<T>, &'a Token)>
    where I: Iterator<Item = &'a Token> + Clone
{
    let mut items = Vec::new();
    if peek_is(tokens, closing) {
        let close = next_token(tokens, closing_text)?;
        return Ok((items, close));
    }
    loop {
        items.push(parse_item(tokens)?);
        let token = next_token(tokens, closing_text)?;
        match &token.kind {
            TokenKind::Comma => {},
            kind if kind == closing => return Ok((items, token)),
            _ => return Err(unexpected(token, &format!("`,` or {closing_text}"))),
        }
    }
}
