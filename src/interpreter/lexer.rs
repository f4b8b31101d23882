use logos::Logos;
use uuid::Uuid;

use crate::{
    ast::Span,
    error::ExpressionError,
    key::EntityId,
};

/// Represents the kind of a lexical token.
///
/// Whitespace and `//` or `/* */` comments are skipped. Anything that matches
/// no variant is reported as an unexpected character.
#[derive(Logos, Debug, PartialEq, Clone)]
#[logos(error = LexError)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum TokenKind {
    /// Numeric literal tokens, such as `42`, `3.14`, `.5` or `2.1e-10`.
    #[regex(r"[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?", parse_number)]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?", parse_number)]
    #[regex(r"[0-9]+\.", reject_number)]
    #[regex(r"[0-9]+(\.[0-9]+)?[eE][+-]?", reject_number)]
    Number(f64),
    /// String literal tokens in single or double quotes, escapes decoded.
    #[regex(r#""([^"\\]|\\[\s\S])*""#, decode_string)]
    #[regex(r#"'([^'\\]|\\[\s\S])*'"#, decode_string)]
    #[regex(r#""([^"\\]|\\[\s\S])*\\?"#, reject_string, allow_greedy = true)]
    #[regex(r#"'([^'\\]|\\[\s\S])*\\?"#, reject_string, allow_greedy = true)]
    String(String),
    /// `true` or `false`.
    #[token("true", |_| true)]
    #[token("false", |_| false)]
    Bool(bool),
    /// `null`
    #[token("null")]
    Null,
    /// `@self`
    #[token("@self")]
    SelfRef,
    /// `@{uuid}`
    #[regex(r"@\{[^}\n]*\}", parse_entity)]
    EntityRef(EntityId),
    /// `#name`, shorthand for `@self.name`.
    #[regex(r"#[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice()[1..].to_string())]
    Shorthand(String),
    /// Identifier tokens; function names or bare words such as `SUM`.
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Identifier(String),
    /// `// Comments.`
    #[regex(r"//[^\n\r]*", logos::skip, allow_greedy = true)]
    Comment,
    /// `/* Multi line comments. */`
    #[regex(r"/\*([^*]|\*+[^*/])*\*+/", logos::skip)]
    MultiLineComment,
    /// `||`
    #[token("||")]
    PipePipe,
    /// `&&`
    #[token("&&")]
    AmpAmp,
    /// `==`
    #[token("==")]
    EqualEqual,
    /// `!=`
    #[token("!=")]
    BangEqual,
    /// `<=`
    #[token("<=")]
    LessEqual,
    /// `>=`
    #[token(">=")]
    GreaterEqual,
    /// `<`
    #[token("<")]
    Less,
    /// `>`
    #[token(">")]
    Greater,
    /// `!`
    #[token("!")]
    Bang,
    /// `+`
    #[token("+")]
    Plus,
    /// `-`
    #[token("-")]
    Minus,
    /// `*`
    #[token("*")]
    Star,
    /// `/`
    #[token("/")]
    Slash,
    /// `%`
    #[token("%")]
    Percent,
    /// `.`
    #[token(".")]
    Dot,
    /// `,`
    #[token(",")]
    Comma,
    /// `(`
    #[token("(")]
    LParen,
    /// `)`
    #[token(")")]
    RParen,
    /// `[*]`
    #[token("[*]")]
    LBracketStar,
    /// `[`
    #[token("[")]
    LBracket,
    /// `]`
    #[token("]")]
    RBracket,
    /// End of input. Never produced by logos; appended by [`tokenize`].
    Eof,
}

impl TokenKind {
    /// Short description used in "expected X, found Y" messages.
    #[must_use]
    pub fn describe(&self, text: &str) -> String {
        match self {
            Self::Number(_) => format!("number `{text}`"),
            Self::String(_) => format!("string {text}"),
            Self::Identifier(_) => format!("identifier `{text}`"),
            Self::Shorthand(_) | Self::SelfRef | Self::EntityRef(_) => {
                format!("reference `{text}`")
            },
            Self::Eof => "end of input".to_string(),
            _ => format!("`{text}`"),
        }
    }
}

/// A token together with its source text and byte range.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// What was recognised.
    pub kind: TokenKind,
    /// The exact source slice.
    pub text: String,
    /// The byte range of `text` in the source.
    pub span: Span,
}

/// Failure raised from inside a token callback.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LexError {
    /// Nothing matched at this position.
    #[default]
    UnexpectedCharacter,
    /// The string literal has no closing quote.
    UnterminatedString,
    /// A backslash escape at `offset` (relative to the token) is unknown.
    InvalidEscape {
        /// The escape text, including the backslash.
        sequence: String,
        /// Byte offset of the backslash within the token.
        offset:   usize,
    },
    /// The number literal is malformed.
    InvalidNumber,
    /// `@{...}` does not hold a UUID.
    InvalidEntityReference,
}

impl LexError {
    fn into_expression_error(self, slice: &str, span: Span) -> ExpressionError {
        match self {
            Self::UnexpectedCharacter => ExpressionError::unexpected_character(slice, span),
            Self::UnterminatedString => ExpressionError::unterminated_string(span.start, span.end),
            Self::InvalidEscape { sequence, offset } => {
                let start = span.start + offset;
                ExpressionError::invalid_escape(&sequence, Span::new(start, start + sequence.len()))
            },
            Self::InvalidNumber => ExpressionError::invalid_number(slice, span),
            Self::InvalidEntityReference => ExpressionError::invalid_entity_reference(slice, span),
        }
    }
}

/// Splits `source` into tokens, ending with a single [`TokenKind::Eof`].
///
/// # Errors
/// Returns the first lexical error: `UNTERMINATED_STRING`, `INVALID_ESCAPE`,
/// `INVALID_NUMBER`, `INVALID_ENTITY_REFERENCE`, or `UNEXPECTED_TOKEN` for a
/// character that starts no token.
///
/// # Example
/// ```
/// use computed_props::interpreter::lexer::{TokenKind, tokenize};
///
/// let tokens = tokenize("#price * 2").unwrap();
/// let kinds: Vec<_> = tokens.iter().map(|t| t.kind.clone()).collect();
///
/// assert_eq!(kinds,
///            vec![TokenKind::Shorthand("price".into()),
///                 TokenKind::Star,
///                 TokenKind::Number(2.0),
///                 TokenKind::Eof]);
/// assert_eq!(tokens[2].span.start, 9);
/// ```
pub fn tokenize(source: &str) -> Result<Vec<Token>, ExpressionError> {
    let mut lexer = TokenKind::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        let span = Span::from(lexer.span());
        match result {
            Ok(kind) => tokens.push(Token { kind,
                                            text: lexer.slice().to_string(),
                                            span }),
            Err(error) => return Err(error.into_expression_error(lexer.slice(), span)),
        }
    }

    tokens.push(Token { kind: TokenKind::Eof,
                        text: String::new(),
                        span: Span::new(source.len(), source.len()) });
    Ok(tokens)
}

fn parse_number(lex: &logos::Lexer<TokenKind>) -> Result<f64, LexError> {
    lex.slice()
       .parse::<f64>()
       .ok()
       .filter(|n| n.is_finite())
       .ok_or(LexError::InvalidNumber)
}

const fn reject_number(_: &logos::Lexer<TokenKind>) -> Result<f64, LexError> {
    Err(LexError::InvalidNumber)
}

const fn reject_string(_: &logos::Lexer<TokenKind>) -> Result<String, LexError> {
    Err(LexError::UnterminatedString)
}

fn parse_entity(lex: &logos::Lexer<TokenKind>) -> Result<EntityId, LexError> {
    let slice = lex.slice();
    let inner = &slice[2..slice.len() - 1];
    Uuid::parse_str(inner.trim()).map_err(|_| LexError::InvalidEntityReference)
}

/// Strips the quotes and decodes `\n \t \r \0 \\ \" \'` and `\uXXXX`.
fn decode_string(lex: &logos::Lexer<TokenKind>) -> Result<String, LexError> {
    let slice = lex.slice();
    let inner = &slice[1..slice.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.char_indices();

    while let Some((i, c)) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let invalid = |len: usize| LexError::InvalidEscape { sequence: inner[i..i + len].to_string(),
                                                             offset:   i + 1 };
        let Some((_, escaped)) = chars.next() else {
            return Err(invalid(1));
        };
        match escaped {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            '0' => out.push('\0'),
            '\\' | '"' | '\'' => out.push(escaped),
            'u' => {
                let hex: String = chars.clone().take(4).map(|(_, h)| h).collect();
                let decoded = (hex.len() == 4 && hex.chars().all(|h| h.is_ascii_hexdigit()))
                              .then(|| u32::from_str_radix(&hex, 16).ok())
                              .flatten()
                              .and_then(char::from_u32);
                let Some(decoded) = decoded else {
                    return Err(invalid(2 + hex.len()));
                };
                for _ in 0..4 {
                    chars.next();
                }
                out.push(decoded);
            },
            other => return Err(invalid(1 + other.len_utf8())),
        }
    }
    Ok(out)
}
