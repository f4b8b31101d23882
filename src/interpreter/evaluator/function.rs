/// The function registry, function definitions and the builtin table.
pub mod core;

/// Argument readers shared by the builtin implementations.
///
/// Each reader names the function and the argument position in its errors
/// and maps `null` to `None`.
pub mod args;

/// `SUM`, `COUNT`, `AVG`, `MIN` and `MAX`.
///
/// List arguments are flattened and nulls are skipped.
pub mod aggregate;

/// `IF`, `COALESCE` and `ISNULL`.
pub mod conditional;

/// String functions: `CONCAT`, `UPPER`, `LOWER`, `TRIM`, `LEN`, `LEFT`,
/// `RIGHT` and `CONTAINS`.
pub mod text;

/// `ABS`, `ROUND`, `FLOOR`, `CEIL`, `SQRT` and `POW`.
pub mod math;

/// Date functions: `NOW`, `TODAY`, `YEAR`, `MONTH`, `DAY`, `DATE_DIFF` and
/// `DATE_ADD`.
pub mod date;
