use std::iter::Peekable;

use crate::{
    ast::{Expr, LiteralValue, ReferenceBase, Span, UnaryOperator},
    error::ExpressionError,
    interpreter::{
        lexer::{Token, TokenKind},
        parser::{
            core::{MAX_NESTING, ParseResult, parse_expression},
            path::parse_reference,
            utils::{expect, next_token, parse_comma_separated, peek_is, unexpected},
        },
    },
};

/// Parses prefix operators.
///
/// The rule is: `unary := ("!" | "-") unary | primary`
///
/// Prefix operators nest, so `!!x` and `- -x` are both accepted. Every
/// nested group or operand passes through here, so this is where
/// [`MAX_NESTING`] is enforced.
///
/// # Errors
/// `MAX_DEPTH_EXCEEDED` when `depth` is past [`MAX_NESTING`].
pub fn parse_unary<'a, I>(tokens: &mut Peekable<I>, depth: usize) -> ParseResult<Expr>
    where I: Iterator<Item = &'a Token> + Clone
{
    if depth > MAX_NESTING {
        let span = tokens.peek().map_or_else(Span::default, |token| token.span);
        return Err(ExpressionError::nesting_too_deep(MAX_NESTING, span));
    }
    if let Some(&token) = tokens.peek()
       && let Some(op) = match token.kind {
           TokenKind::Bang => Some(UnaryOperator::Not),
           TokenKind::Minus => Some(UnaryOperator::Negate),
           _ => None,
       }
    {
        tokens.next();
        let operand = parse_unary(tokens, depth + 1)?;
        let span = token.span.to(operand.span());
        return Ok(Expr::Unary { op,
                                operand: Box::new(operand),
                                span });
    }
    parse_primary(tokens, depth)
}

/// Parses a primary expression.
///
/// The rule is:
/// ```text
/// primary := NUMBER | STRING | "true" | "false" | "null"
///          | "(" expression ")"
///          | IDENTIFIER "(" (expression ("," expression)*)? ")"
///          | IDENTIFIER
///          | reference
/// ```
///
/// # Errors
/// `UNEXPECTED_TOKEN` or `UNEXPECTED_END` when no primary can start here.
pub fn parse_primary<'a, I>(tokens: &mut Peekable<I>, depth: usize) -> ParseResult<Expr>
    where I: Iterator<Item = &'a Token> + Clone
{
    let token = next_token(tokens, "expression")?;
    let span = token.span;

    match &token.kind {
        TokenKind::Number(n) => Ok(Expr::Literal { value: LiteralValue::Number(*n),
                                                   span }),
        TokenKind::String(s) => Ok(Expr::Literal { value: LiteralValue::String(s.clone()),
                                                   span }),
        TokenKind::Bool(b) => Ok(Expr::Literal { value: LiteralValue::Bool(*b),
                                                 span }),
        TokenKind::Null => Ok(Expr::Literal { value: LiteralValue::Null,
                                              span }),
        TokenKind::LParen => {
            let inner = parse_expression(tokens, depth + 1)?;
            expect(tokens, &TokenKind::RParen, "`)`")?;
            Ok(inner)
        },
        TokenKind::SelfRef => parse_reference(tokens, ReferenceBase::SelfEntity, token, None),
        TokenKind::EntityRef(id) => parse_reference(tokens, ReferenceBase::Entity(*id), token, None),
        TokenKind::Shorthand(name) => {
            parse_reference(tokens, ReferenceBase::SelfEntity, token, Some(name))
        },
        TokenKind::Identifier(name) => {
            if peek_is(tokens, &TokenKind::LParen) {
                tokens.next();
                let (arguments, close) =
                    parse_comma_separated(tokens,
                                          |tokens| parse_expression(tokens, depth + 1),
                                          &TokenKind::RParen,
                                          "`)`")?;
                return Ok(Expr::Call { name: name.clone(),
                                       arguments,
                                       span: span.to(close.span) });
            }
            Ok(Expr::Identifier { name: name.clone(),
                                  span })
        },
        _ => Err(unexpected(token, "expression")),
    }
}
