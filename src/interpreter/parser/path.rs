use std::iter::Peekable;

use crate::{
    ast::{Expr, PathSegment, PropertyReference, ReferenceBase, Span, Traversal},
    error::ExpressionError,
    interpreter::{
        lexer::{Token, TokenKind},
        parser::{
            core::ParseResult,
            utils::{expect, next_token, peek_is, unexpected},
        },
    },
    util::num::f64_to_usize_checked,
};

/// Parses the path that follows a reference base.
///
/// The rule is:
/// ```text
/// reference := ("@self" | "@{" UUID "}") segment+
///            | "#" NAME traversal? segment*
/// segment   := "." NAME traversal?
/// traversal := "[" INTEGER "]" | "[*]"
/// ```
///
/// `start` is the base token. For `#name`, `shorthand` holds the name, which
/// becomes the first segment.
///
/// # Errors
/// - `UNEXPECTED_TOKEN`/`UNEXPECTED_END` when a `.` or a property name is
///   missing.
/// - `INVALID_INDEX` for an index that is not a non-negative integer literal.
pub fn parse_reference<'a, I>(tokens: &mut Peekable<I>,
                              base: ReferenceBase,
                              start: &Token,
                              shorthand: Option<&String>)
                              -> ParseResult<Expr>
    where I: Iterator<Item = &'a Token> + Clone
{
    let mut path = Vec::new();

    if let Some(name) = shorthand {
        path.push(parse_segment_tail(tokens, name.clone(), start.span)?);
    } else {
        let dot = expect(tokens, &TokenKind::Dot, &format!("`.` after `{}`", start.text))?;
        path.push(parse_segment(tokens, dot.span)?);
    }

    while peek_is(tokens, &TokenKind::Dot) {
        let dot = next_token(tokens, "`.`")?;
        path.push(parse_segment(tokens, dot.span)?);
    }

    let end = path.last().map_or(start.span, |segment| segment.span);
    Ok(Expr::PropertyReference(PropertyReference { base,
                                                   path,
                                                   span: start.span.to(end) }))
}

/// Parses `NAME traversal?` after a consumed `.`.
fn parse_segment<'a, I>(tokens: &mut Peekable<I>, dot: Span) -> ParseResult<PathSegment>
    where I: Iterator<Item = &'a Token> + Clone
{
    let token = next_token(tokens, "property name")?;
    let TokenKind::Identifier(name) = &token.kind else {
        return Err(unexpected(token, "property name after `.`"));
    };
    parse_segment_tail(tokens, name.clone(), dot.to(token.span))
}

/// Finishes a segment whose name is known by reading an optional traversal.
fn parse_segment_tail<'a, I>(tokens: &mut Peekable<I>,
                             property: String,
                             span: Span)
                             -> ParseResult<PathSegment>
    where I: Iterator<Item = &'a Token> + Clone
{
    let (traversal, span) = match parse_traversal(tokens)? {
        Some((traversal, traversal_span)) => (Some(traversal), span.to(traversal_span)),
        None => (None, span),
    };
    Ok(PathSegment { property,
                     traversal,
                     span })
}

/// Parses `[n]`, `[*]` or `[ * ]` if one comes next.
fn parse_traversal<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Option<(Traversal, Span)>>
    where I: Iterator<Item = &'a Token> + Clone
{
    let Some(&open) = tokens.peek() else {
        return Ok(None);
    };
    match open.kind {
        TokenKind::LBracketStar => {
            tokens.next();
            Ok(Some((Traversal::All, open.span)))
        },
        TokenKind::LBracket => {
            tokens.next();
            let index = next_token(tokens, "index or `*`")?;
            let traversal = match &index.kind {
                TokenKind::Star => Traversal::All,
                TokenKind::Number(n) => {
                    let value = f64_to_usize_checked(*n).ok_or_else(|| {
                                    ExpressionError::invalid_index(&index.text, index.span)
                                })?;
                    Traversal::Index(value)
                },
                TokenKind::Minus => {
                    let (text, span) = match tokens.peek() {
                        Some(&next) if matches!(next.kind, TokenKind::Number(_)) => {
                            tokens.next();
                            (format!("-{}", next.text), index.span.to(next.span))
                        },
                        _ => ("-".to_string(), index.span),
                    };
                    return Err(ExpressionError::invalid_index(&text, span));
                },
                TokenKind::Eof => return Err(unexpected(index, "index or `*`")),
                _ => return Err(ExpressionError::invalid_index(&index.text, index.span)),
            };
            let close = expect(tokens, &TokenKind::RBracket, "`]`")?;
            Ok(Some((traversal, open.span.to(close.span))))
        },
        _ => Ok(None),
    }
}
