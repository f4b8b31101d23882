/// Numeric conversion and formatting helpers.
///
/// The language has a single `f64` number type, but indices and string
/// positions are `usize`. These helpers convert between the two without
/// silent truncation and print numbers in their shortest round-tripping form.
pub mod num;
/// Name similarity for "did you mean" suggestions.
pub mod similarity;
