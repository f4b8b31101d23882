/// The `Value` enum, its type tags and accessors.
pub mod core;
/// Conversions between values and `serde_json` documents.
///
/// Used by the command line to read property maps and print results, and by
/// callers that store property values as JSON.
pub mod json;
