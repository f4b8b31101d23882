/// Dispatch for binary operators, including short-circuiting.
pub mod core;

/// Numeric arithmetic: `+ - * / %`.
pub mod arithmetic;

/// Equality and ordering comparisons.
pub mod comparison;

/// Logical `&&` and `||` over already evaluated operands.
pub mod logic;
