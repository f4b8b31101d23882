use std::fmt;

use serde::Serialize;

/// Represents every error code the engine can report.
///
/// Codes are grouped by the phase that normally raises them, but nothing
/// prevents a later phase from reusing an earlier code (a resolver may
/// report `PROPERTY_NOT_FOUND` during evaluation, for example).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Lexical
    /// A string literal reached end of input without its closing quote.
    UnterminatedString,
    /// A backslash escape inside a string is not recognised.
    InvalidEscape,
    /// A numeric literal is malformed, such as `1.` or `2e`.
    InvalidNumber,
    /// `@{...}` does not contain a valid UUID.
    InvalidEntityReference,

    // Syntactic
    /// A token appeared where the grammar does not allow it.
    UnexpectedToken,
    /// Input ended while the grammar still expected more.
    UnexpectedEnd,
    /// A `[...]` index is not a non-negative integer literal.
    InvalidIndex,

    // Reference
    /// The named property does not exist on the entity or record.
    PropertyNotFound,
    /// The referenced entity could not be found.
    EntityNotFound,
    /// A relationship in the path could not be followed.
    RelationshipNotFound,
    /// A bare identifier is neither a function call nor a reference.
    UnknownIdentifier,

    // Evaluation
    /// An operator or function received a value of the wrong type.
    TypeMismatch,
    /// Division or modulo by zero.
    DivisionByZero,
    /// A path tried to read a property of a null intermediate value.
    NullReference,
    /// An `[n]` index lies outside the collection.
    IndexOutOfBounds,
    /// A `[*]` traversal was used outside an aggregation call.
    CollectionWithoutAggregation,

    // Function
    /// The called function is not registered.
    InvalidFunction,
    /// The call has too few or too many arguments.
    InvalidArgumentCount,
    /// An argument has the right type but an unusable value.
    InvalidArgument,

    // System
    /// Evaluation nested deeper than the configured limit.
    MaxDepthExceeded,
    /// Computed properties depend on each other in a cycle.
    CircularDependency,
}

impl ErrorCode {
    /// The canonical upper-snake-case spelling of the code.
    ///
    /// # Example
    /// ```
    /// use computed_props::error::ErrorCode;
    ///
    /// assert_eq!(ErrorCode::DivisionByZero.as_str(), "DIVISION_BY_ZERO");
    /// ```
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UnterminatedString => "UNTERMINATED_STRING",
            Self::InvalidEscape => "INVALID_ESCAPE",
            Self::InvalidNumber => "INVALID_NUMBER",
            Self::InvalidEntityReference => "INVALID_ENTITY_REFERENCE",
            Self::UnexpectedToken => "UNEXPECTED_TOKEN",
            Self::UnexpectedEnd => "UNEXPECTED_END",
            Self::InvalidIndex => "INVALID_INDEX",
            Self::PropertyNotFound => "PROPERTY_NOT_FOUND",
            Self::EntityNotFound => "ENTITY_NOT_FOUND",
            Self::RelationshipNotFound => "RELATIONSHIP_NOT_FOUND",
            Self::UnknownIdentifier => "UNKNOWN_IDENTIFIER",
            Self::TypeMismatch => "TYPE_MISMATCH",
            Self::DivisionByZero => "DIVISION_BY_ZERO",
            Self::NullReference => "NULL_REFERENCE",
            Self::IndexOutOfBounds => "INDEX_OUT_OF_BOUNDS",
            Self::CollectionWithoutAggregation => "COLLECTION_WITHOUT_AGGREGATION",
            Self::InvalidFunction => "INVALID_FUNCTION",
            Self::InvalidArgumentCount => "INVALID_ARGUMENT_COUNT",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::MaxDepthExceeded => "MAX_DEPTH_EXCEEDED",
            Self::CircularDependency => "CIRCULAR_DEPENDENCY",
        }
    }

    /// Whether the code is raised before any evaluation happens.
    #[must_use]
    pub const fn is_syntax(self) -> bool {
        matches!(self,
                 Self::UnterminatedString
                 | Self::InvalidEscape
                 | Self::InvalidNumber
                 | Self::InvalidEntityReference
                 | Self::UnexpectedToken
                 | Self::UnexpectedEnd
                 | Self::InvalidIndex)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
