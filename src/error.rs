/// Stable error codes.
///
/// Every failure the engine reports, whether found while tokenizing, parsing,
/// validating or evaluating, carries exactly one of these codes. Codes are
/// part of the public contract and serialize as `SCREAMING_SNAKE_CASE`.
pub mod code;
/// The structured error value.
///
/// Holds the code, a human-readable message, an optional source range,
/// "did you mean" suggestions and, for cycles, the chain of property keys.
/// Also renders the error against its source text and as JSON.
pub mod expression_error;

pub use code::ErrorCode;
pub use expression_error::ExpressionError;
