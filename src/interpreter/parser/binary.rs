use std::iter::Peekable;

use crate::{
    ast::{BinaryOperator, Expr},
    interpreter::{
        lexer::{Token, TokenKind},
        parser::{core::ParseResult, unary::parse_unary},
    },
};

/// Parses logical OR expressions.
///
/// The rule is: `logical_or := logical_and ("||" logical_and)*`
pub fn parse_logical_or<'a, I>(tokens: &mut Peekable<I>, depth: usize) -> ParseResult<Expr>
    where I: Iterator<Item = &'a Token> + Clone
{
    parse_left_associative(tokens, depth, parse_logical_and, |op| op == BinaryOperator::Or)
}

/// Parses logical AND expressions.
///
/// The rule is: `logical_and := equality ("&&" equality)*`
pub fn parse_logical_and<'a, I>(tokens: &mut Peekable<I>, depth: usize) -> ParseResult<Expr>
    where I: Iterator<Item = &'a Token> + Clone
{
    parse_left_associative(tokens, depth, parse_equality, |op| op == BinaryOperator::And)
}

/// Parses equality comparisons.
///
/// The rule is: `equality := relational (("==" | "!=") relational)*`
pub fn parse_equality<'a, I>(tokens: &mut Peekable<I>, depth: usize) -> ParseResult<Expr>
    where I: Iterator<Item = &'a Token> + Clone
{
    parse_left_associative(tokens, depth, parse_relational, |op| {
        matches!(op, BinaryOperator::Equal | BinaryOperator::NotEqual)
    })
}

/// Parses ordering comparisons.
///
/// The rule is: `relational := additive (("<" | "<=" | ">" | ">=") additive)*`
pub fn parse_relational<'a, I>(tokens: &mut Peekable<I>, depth: usize) -> ParseResult<Expr>
    where I: Iterator<Item = &'a Token> + Clone
{
    parse_left_associative(tokens, depth, parse_additive, |op| {
        matches!(op,
                 BinaryOperator::Less
                 | BinaryOperator::LessEqual
                 | BinaryOperator::Greater
                 | BinaryOperator::GreaterEqual)
    })
}

/// Parses addition and subtraction expressions.
///
/// The rule is: `additive := multiplicative (("+" | "-") multiplicative)*`
pub fn parse_additive<'a, I>(tokens: &mut Peekable<I>, depth: usize) -> ParseResult<Expr>
    where I: Iterator<Item = &'a Token> + Clone
{
    parse_left_associative(tokens, depth, parse_multiplicative, |op| {
        matches!(op, BinaryOperator::Add | BinaryOperator::Sub)
    })
}

/// Parses multiplication-level expressions.
///
/// The rule is: `multiplicative := unary (("*" | "/" | "%") unary)*`
pub fn parse_multiplicative<'a, I>(tokens: &mut Peekable<I>, depth: usize) -> ParseResult<Expr>
    where I: Iterator<Item = &'a Token> + Clone
{
    parse_left_associative(tokens, depth, parse_unary, |op| {
        matches!(op, BinaryOperator::Mul | BinaryOperator::Div | BinaryOperator::Mod)
    })
}

/// Shared loop for one precedence level: parses `operand`, then folds every
/// following `op operand` pair whose operator `accepts` into a
/// left-leaning tree.
fn parse_left_associative<'a, I>(tokens: &mut Peekable<I>,
                                 depth: usize,
                                 operand: impl Fn(&mut Peekable<I>, usize) -> ParseResult<Expr>,
                                 accepts: impl Fn(BinaryOperator) -> bool)
                                 -> ParseResult<Expr>
    where I: Iterator<Item = &'a Token> + Clone
{
    let mut left = operand(tokens, depth)?;
    while let Some(&token) = tokens.peek()
          && let Some(op) = token_to_binary_operator(&token.kind)
          && accepts(op)
    {
        tokens.next();
        let right = operand(tokens, depth)?;
        let span = left.span().to(right.span());
        left = Expr::Binary { left: Box::new(left),
                              op,
                              right: Box::new(right),
                              span };
    }
    Ok(left)
}

/// Maps a token to its binary operator, if it is one.
///
/// # Example
/// ```
/// use computed_props::{
///     ast::BinaryOperator,
///     interpreter::{lexer::TokenKind, parser::binary::token_to_binary_operator},
/// };
///
/// assert_eq!(token_to_binary_operator(&TokenKind::AmpAmp), Some(BinaryOperator::And));
/// assert_eq!(token_to_binary_operator(&TokenKind::Comma), None);
/// ```
#[must_use]
pub const fn token_to_binary_operator(kind: &TokenKind) -> Option<BinaryOperator> {
    match kind {
        TokenKind::PipePipe => Some(BinaryOperator::Or),
        TokenKind::AmpAmp => Some(BinaryOperator::And),
        TokenKind::EqualEqual => Some(BinaryOperator::Equal),
        TokenKind::BangEqual => Some(BinaryOperator::NotEqual),
        TokenKind::Less => Some(BinaryOperator::Less),
        TokenKind::LessEqual => Some(BinaryOperator::LessEqual),
        TokenKind::Greater => Some(BinaryOperator::Greater),
        TokenKind::GreaterEqual => Some(BinaryOperator::GreaterEqual),
        TokenKind::Plus => Some(BinaryOperator::Add),
        TokenKind::Minus => Some(BinaryOperator::Sub),
        TokenKind::Star => Some(BinaryOperator::Mul),
        TokenKind::Slash => Some(BinaryOperator::Div),
        TokenKind::Percent => Some(BinaryOperator::Mod),
        _ => None,
    }
}
