use std::fmt::Write as _;

use serde::Serialize;

use crate::{ast::Span, error::ErrorCode, key::PropertyKey};

/// An error raised while tokenizing, parsing, validating or evaluating an
/// expression, or while ordering computed properties.
///
/// `position` and `end_position` are byte offsets into the expression source
/// and are present whenever the failure can be tied to a location.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[serde(rename_all = "camelCase")]
#[error("{code}: {message}")]
pub struct ExpressionError {
    /// The stable error code.
    pub code:         ErrorCode,
    /// Human-readable description.
    pub message:      String,
    /// Start offset of the offending source range.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position:     Option<usize>,
    /// End offset (exclusive) of the offending source range.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_position: Option<usize>,
    /// "Did you mean" candidates, best first.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions:  Vec<String>,
    /// For `CIRCULAR_DEPENDENCY`: the cycle, first key repeated at the end.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub chain:        Vec<PropertyKey>,
}

impl ExpressionError {
    /// Creates an error with no location.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self { code,
               message: message.into(),
               position: None,
               end_position: None,
               suggestions: Vec::new(),
               chain: Vec::new() }
    }

    /// Attaches a source range.
    #[must_use]
    pub fn at(mut self, span: Span) -> Self {
        self.position = Some(span.start);
        self.end_position = Some(span.end);
        self
    }

    /// Attaches a source range only if the error has none yet.
    ///
    /// Used when an error produced by a resolver or a function body bubbles
    /// up through the node that triggered it.
    #[must_use]
    pub fn or_at(self, span: Span) -> Self {
        if self.position.is_some() { self } else { self.at(span) }
    }

    #[must_use]
    pub fn with_suggestions(mut self, suggestions: Vec<String>) -> Self {
        self.suggestions = suggestions;
        self
    }

    #[must_use]
    pub fn with_chain(mut self, chain: Vec<PropertyKey>) -> Self {
        self.chain = chain;
        self
    }

    /// Whether the error was raised while tokenizing or parsing, as opposed
    /// to validation, evaluation or graph analysis.
    #[must_use]
    pub const fn is_parse_error(&self) -> bool {
        self.code.is_syntax()
    }

    /// The source range, when both ends are known.
    #[must_use]
    pub fn span(&self) -> Option<Span> {
        self.position
            .map(|start| Span::new(start, self.end_position.unwrap_or(start)))
    }

    // Lexical

    #[must_use]
    pub fn unterminated_string(start: usize, end: usize) -> Self {
        Self::new(ErrorCode::UnterminatedString,
                  "Unterminated string literal: missing closing quote").at(Span::new(start, end))
    }

    #[must_use]
    pub fn invalid_escape(sequence: &str, span: Span) -> Self {
        Self::new(ErrorCode::InvalidEscape,
                  format!("Invalid escape sequence `{sequence}` in string literal")).at(span)
    }

    #[must_use]
    pub fn invalid_number(text: &str, span: Span) -> Self {
        Self::new(ErrorCode::InvalidNumber, format!("Invalid number literal `{text}`")).at(span)
    }

    #[must_use]
    pub fn invalid_entity_reference(text: &str, span: Span) -> Self {
        Self::new(ErrorCode::InvalidEntityReference,
                  format!("Invalid entity reference `{text}`: expected `@{{uuid}}`")).at(span)
    }

    /// A character that starts no token.
    #[must_use]
    pub fn unexpected_character(text: &str, span: Span) -> Self {
        Self::new(ErrorCode::UnexpectedToken, format!("Unexpected character `{text}`")).at(span)
    }

    // Syntactic

    #[must_use]
    pub fn unexpected_token(expected: &str, found: &str, span: Span) -> Self {
        Self::new(ErrorCode::UnexpectedToken,
                  format!("Expected {expected}, found {found}")).at(span)
    }

    #[must_use]
    pub fn unexpected_end(expected: &str, position: usize) -> Self {
        Self::new(ErrorCode::UnexpectedEnd,
                  format!("Unexpected end of input: expected {expected}")).at(Span::new(position,
                                                                                      position))
    }

    #[must_use]
    pub fn invalid_index(text: &str, span: Span) -> Self {
        Self::new(ErrorCode::InvalidIndex,
                  format!("Invalid index `{text}`: expected a non-negative integer or `*`")).at(span)
    }

    // Reference

    #[must_use]
    pub fn property_not_found(path: &str, property: &str, suggestions: Vec<String>) -> Self {
        Self::new(ErrorCode::PropertyNotFound,
                  format!("Property '{property}' not found on {path}")).with_suggestions(suggestions)
    }

    #[must_use]
    pub fn entity_not_found(entity: impl std::fmt::Display) -> Self {
        Self::new(ErrorCode::EntityNotFound, format!("Entity '{entity}' not found"))
    }

    /// `relationship` is a path segment the rest of the path goes through.
    #[must_use]
    pub fn relationship_not_found(path: &str, relationship: &str) -> Self {
        Self::new(ErrorCode::RelationshipNotFound,
                  format!("Relationship '{relationship}' not found on {path}"))
    }

    #[must_use]
    pub fn unknown_identifier(name: &str, suggestions: Vec<String>, span: Span) -> Self {
        Self::new(ErrorCode::UnknownIdentifier,
                  format!("Unknown identifier '{name}': use `#{name}` or `@self.{name}` for a \
                           property, or `{name}(...)` for a function")).with_suggestions(suggestions)
                                                                       .at(span)
    }

    // Evaluation

    #[must_use]
    pub fn type_mismatch(details: impl Into<String>, span: Span) -> Self {
        Self::new(ErrorCode::TypeMismatch, details).at(span)
    }

    #[must_use]
    pub fn division_by_zero(span: Span) -> Self {
        Self::new(ErrorCode::DivisionByZero, "Division by zero").at(span)
    }

    /// `path` is the part that evaluated to null, `property` the name that
    /// could not be read from it.
    #[must_use]
    pub fn null_reference(path: &str, property: &str, span: Span) -> Self {
        Self::new(ErrorCode::NullReference,
                  format!("Cannot read '{property}': {path} is null")).at(span)
    }

    #[must_use]
    pub fn index_out_of_bounds(index: usize, len: usize, path: &str, span: Span) -> Self {
        Self::new(ErrorCode::IndexOutOfBounds,
                  format!("Index {index} is out of bounds for {path} with {len} element(s)")).at(span)
    }

    /// Raised for a `[*]` traversal of `relationship` outside an aggregation.
    #[must_use]
    pub fn collection_without_aggregation(relationship: &str, span: Span) -> Self {
        Self::new(ErrorCode::CollectionWithoutAggregation,
                  format!("Collection traversal '{relationship}[*]' must be wrapped in an \
                           aggregation function such as SUM, COUNT, AVG, MIN or MAX")).at(span)
    }

    // Function

    #[must_use]
    pub fn invalid_function(name: &str, suggestions: Vec<String>, span: Span) -> Self {
        Self::new(ErrorCode::InvalidFunction, format!("Unknown function '{name}'"))
            .with_suggestions(suggestions)
            .at(span)
    }

    #[must_use]
    pub fn invalid_argument_count(name: &str,
                                  min: usize,
                                  max: Option<usize>,
                                  found: usize,
                                  span: Span)
                                  -> Self {
        let expected = match max {
            Some(max) if max == min => format!("{min}"),
            Some(max) => format!("{min} to {max}"),
            None => format!("at least {min}"),
        };
        Self::new(ErrorCode::InvalidArgumentCount,
                  format!("{name} expects {expected} argument(s), got {found}")).at(span)
    }

    #[must_use]
    pub fn invalid_argument(name: &str, details: &str, span: Span) -> Self {
        Self::new(ErrorCode::InvalidArgument, format!("{name}: {details}")).at(span)
    }

    // System

    #[must_use]
    pub fn max_depth_exceeded(max_depth: usize, span: Span) -> Self {
        Self::new(ErrorCode::MaxDepthExceeded,
                  format!("Maximum evaluation depth of {max_depth} exceeded")).at(span)
    }

    /// Raised by the parser when groups, prefix operators or call arguments
    /// nest more than `limit` deep, or when the finished tree is more than
    /// `limit` nodes tall.
    #[must_use]
    pub fn nesting_too_deep(limit: usize, span: Span) -> Self {
        Self::new(ErrorCode::MaxDepthExceeded,
                  format!("Expression nests deeper than {limit} levels")).at(span)
    }

    /// Builds the error reported for a dependency cycle. `chain` lists the
    /// keys along the cycle with the first key repeated at the end.
    ///
    /// # Example
    /// ```
    /// use computed_props::{error::ExpressionError, key::PropertyKey};
    /// use uuid::Uuid;
    ///
    /// let a = PropertyKey::new(Uuid::nil(), "a");
    /// let b = PropertyKey::new(Uuid::nil(), "b");
    /// let error = ExpressionError::circular_dependency(vec![a.clone(), b, a]);
    ///
    /// assert_eq!(error.chain.len(), 3);
    /// assert!(error.message.contains(" -> "));
    /// ```
    #[must_use]
    pub fn circular_dependency(chain: Vec<PropertyKey>) -> Self {
        let rendered = chain.iter()
                            .map(ToString::to_string)
                            .collect::<Vec<_>>()
                            .join(" -> ");
        Self::new(ErrorCode::CircularDependency,
                  format!("Circular dependency detected: {rendered}")).with_chain(chain)
    }

    /// Renders the error with the offending source line and a caret marker.
    ///
    /// ```text
    /// error[DIVISION_BY_ZERO]: Division by zero
    ///  --> 1:1
    ///   |
    /// 1 | 10 / 0
    ///   | ^^^^^^
    /// ```
    #[must_use]
    pub fn format_with_source(&self, source: &str) -> String {
        let mut out = format!("error[{}]: {}", self.code, self.message);
        if let Some(start) = self.position {
            let start = floor_char_boundary(source, start);
            let line_start = source[..start].rfind('\n').map_or(0, |i| i + 1);
            let line_end = source[start..].find('\n').map_or(source.len(), |i| start + i);
            let line_number = source[..line_start].matches('\n').count() + 1;
            let column = source[line_start..start].chars().count();
            let end = floor_char_boundary(source, self.end_position.unwrap_or(start))
                          .clamp(start, line_end);
            let width = source[start..end].chars().count().max(1);
            let gutter = " ".repeat(line_number.to_string().len());

            let _ = write!(out,
                           "\n{gutter}--> {line_number}:{}\n{gutter} |\n{line_number} | {}\n{gutter} | \
                            {}{}",
                           column + 1,
                           &source[line_start..line_end],
                           " ".repeat(column),
                           "^".repeat(width));
        }
        if !self.suggestions.is_empty() {
            let _ = write!(out, "\n  = help: did you mean {}?", self.suggestions.join(", "));
        }
        if !self.chain.is_empty() {
            let chain = self.chain
                            .iter()
                            .map(ToString::to_string)
                            .collect::<Vec<_>>()
                            .join(" -> ");
            let _ = write!(out, "\n  = cycle: {chain}");
        }
        out
    }

    /// Plain structured form for transport: code, message and whichever of
    /// the optional fields are present.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|_| {
                                      serde_json::json!({ "code": self.code.as_str(),
                                                          "message": self.message })
                                  })
    }
}

fn floor_char_boundary(source: &str, index: usize) -> usize {
    let mut index = index.min(source.len());
    while !source.is_char_boundary(index) {
        index -= 1;
    }
    index
}
