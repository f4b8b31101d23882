use std::fmt;

use crate::key::EntityId;

/// A half-open `[start, end)` range of byte offsets into the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize)]
pub struct Span {
    /// Offset of the first byte covered by the node.
    pub start: usize,
    /// Offset one past the last byte covered by the node.
    pub end:   usize,
}

impl Span {
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// A span starting where `self` starts and ending where `other` ends.
    #[must_use]
    pub const fn to(self, other: Self) -> Self {
        Self { start: self.start,
               end:   other.end, }
    }

    #[must_use]
    pub const fn len(self) -> usize {
        self.end.saturating_sub(self.start)
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.len() == 0
    }
}

impl From<std::ops::Range<usize>> for Span {
    fn from(range: std::ops::Range<usize>) -> Self {
        Self::new(range.start, range.end)
    }
}

/// Represents a literal value in the language.
///
/// Numbers are always 64-bit floats; the language has no separate integer
/// type.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    /// A numeric literal such as `3`, `0.5` or `1e3`.
    Number(f64),
    /// A string literal with escapes already decoded.
    String(String),
    /// `true` or `false`.
    Bool(bool),
    /// `null`.
    Null,
}

impl From<f64> for LiteralValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for LiteralValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for LiteralValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

/// Where a property reference starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceBase {
    /// `@self` or the `#name` shorthand: the entity owning the expression.
    SelfEntity,
    /// `@{uuid}`: an explicitly named entity.
    Entity(EntityId),
}

/// Collection access applied after a path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Traversal {
    /// `[n]`: a single element by zero-based index.
    Index(usize),
    /// `[*]`: every element of the collection.
    All,
}

/// One `.name` step of a property path, with its optional traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegment {
    /// Name of the property or relationship read at this step.
    pub property:  String,
    /// Optional `[n]` or `[*]` applied to the value read at this step.
    pub traversal: Option<Traversal>,
    /// Source range of the name and its traversal.
    pub span:      Span,
}

impl PathSegment {
    #[must_use]
    pub const fn is_collection(&self) -> bool {
        matches!(self.traversal, Some(Traversal::All))
    }

    /// Compares name and traversal, ignoring source positions.
    #[must_use]
    pub fn same_step(&self, other: &Self) -> bool {
        self.property == other.property && self.traversal == other.traversal
    }
}

/// A reference to a property: a base followed by one or more path segments.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyReference {
    /// The entity the path starts from.
    pub base: ReferenceBase,
    /// The path; never empty for references built by the parser.
    pub path: Vec<PathSegment>,
    /// Source range of the whole reference.
    pub span: Span,
}

impl PropertyReference {
    /// Whether any segment of the path uses `[*]`.
    #[must_use]
    pub fn has_collection_traversal(&self) -> bool {
        self.path.iter().any(PathSegment::is_collection)
    }

    /// The first path segment using `[*]`, if any.
    #[must_use]
    pub fn collection_segment(&self) -> Option<&PathSegment> {
        self.path.iter().find(|segment| segment.is_collection())
    }

    /// Name of the property read directly on the base entity.
    #[must_use]
    pub fn root_property(&self) -> Option<&str> {
        self.path.first().map(|segment| segment.property.as_str())
    }

    /// Compares base and path, ignoring source positions.
    #[must_use]
    pub fn same_target(&self, other: &Self) -> bool {
        self.base == other.base
        && self.path.len() == other.path.len()
        && self.path.iter().zip(&other.path).all(|(a, b)| a.same_step(b))
    }
}

/// An abstract syntax tree (AST) node representing an expression.
///
/// The set of node kinds is closed; every consumer matches on all of them.
/// Each variant carries the source range it was parsed from.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A binary operation such as `a + b` or `a && b`.
    Binary {
        /// Left operand.
        left:  Box<Self>,
        /// The operator.
        op:    BinaryOperator,
        /// Right operand.
        right: Box<Self>,
        /// Source range.
        span:  Span,
    },
    /// A prefix operation, `!x` or `-x`.
    Unary {
        /// The operator.
        op:      UnaryOperator,
        /// The operand.
        operand: Box<Self>,
        /// Source range.
        span:    Span,
    },
    /// A function call such as `SUM(a, b)`.
    Call {
        /// Function name as written in the source.
        name:      String,
        /// Argument expressions in order.
        arguments: Vec<Self>,
        /// Source range.
        span:      Span,
    },
    /// A property path such as `@self.lines[*].amount`.
    PropertyReference(PropertyReference),
    /// A literal value.
    Literal {
        /// The constant value.
        value: LiteralValue,
        /// Source range.
        span:  Span,
    },
    /// A bare name that is neither a call nor a reference.
    Identifier {
        /// The name.
        name: String,
        /// Source range.
        span: Span,
    },
}

impl Expr {
    /// Gets the source range of `self`.
    /// ## Example
    /// ```
    /// use computed_props::ast::{Expr, Span};
    ///
    /// let expr = Expr::Identifier { name: "x".to_string(),
    ///                               span: Span::new(4, 5), };
    ///
    /// assert_eq!(expr.span(), Span::new(4, 5));
    /// ```
    #[must_use]
    pub const fn span(&self) -> Span {
        match self {
            Self::Binary { span, .. }
            | Self::Unary { span, .. }
            | Self::Call { span, .. }
            | Self::Literal { span, .. }
            | Self::Identifier { span, .. } => *span,
            Self::PropertyReference(reference) => reference.span,
        }
    }

    /// Visits `self` and every nested node, parents before children and
    /// arguments left to right.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Self)) {
        visit(self);
        match self {
            Self::Binary { left, right, .. } => {
                left.walk(visit);
                right.walk(visit);
            },
            Self::Unary { operand, .. } => operand.walk(visit),
            Self::Call { arguments, .. } => {
                for argument in arguments {
                    argument.walk(visit);
                }
            },
            Self::PropertyReference(_) | Self::Literal { .. } | Self::Identifier { .. } => {},
        }
    }

    /// Number of nodes on the longest path from `self` down to a leaf.
    ///
    /// Computed with an explicit stack, so it is safe to call on trees too
    /// tall to walk recursively.
    ///
    /// # Example
    /// ```
    /// use computed_props::parse;
    ///
    /// assert_eq!(parse("1").unwrap().body.height(), 1);
    /// assert_eq!(parse("1 + 2 + 3").unwrap().body.height(), 3);
    /// assert_eq!(parse("-(1 + 2)").unwrap().body.height(), 3);
    /// ```
    #[must_use]
    pub fn height(&self) -> usize {
        let mut tallest = 0;
        let mut stack = vec![(self, 1)];
        while let Some((node, depth)) = stack.pop() {
            tallest = tallest.max(depth);
            match node {
                Self::Binary { left, right, .. } => {
                    stack.push((left.as_ref(), depth + 1));
                    stack.push((right.as_ref(), depth + 1));
                },
                Self::Unary { operand, .. } => stack.push((operand.as_ref(), depth + 1)),
                Self::Call { arguments, .. } => {
                    stack.extend(arguments.iter().map(|argument| (argument, depth + 1)));
                },
                Self::PropertyReference(_) | Self::Literal { .. } | Self::Identifier { .. } => {},
            }
        }
        tallest
    }

    /// Structural equality that ignores source positions.
    ///
    /// Printing an expression and parsing the output yields a tree that is
    /// structurally equal to the original even though every span moved.
    #[must_use]
    pub fn structurally_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Binary { left: l1, op: o1, right: r1, .. },
             Self::Binary { left: l2, op: o2, right: r2, .. }) => {
                o1 == o2 && l1.structurally_eq(l2) && r1.structurally_eq(r2)
            },
            (Self::Unary { op: o1, operand: a, .. }, Self::Unary { op: o2, operand: b, .. }) => {
                o1 == o2 && a.structurally_eq(b)
            },
            (Self::Call { name: n1, arguments: a1, .. },
             Self::Call { name: n2, arguments: a2, .. }) => {
                n1 == n2
                && a1.len() == a2.len()
                && a1.iter().zip(a2).all(|(a, b)| a.structurally_eq(b))
            },
            (Self::PropertyReference(a), Self::PropertyReference(b)) => a.same_target(b),
            (Self::Literal { value: a, .. }, Self::Literal { value: b, .. }) => a == b,
            (Self::Identifier { name: a, .. }, Self::Identifier { name: b, .. }) => a == b,
            _ => false,
        }
    }
}

/// A parsed expression: the root node plus the range of source it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    /// Root node of the tree.
    pub body: Expr,
    /// Range of the whole source text.
    pub span: Span,
}

/// Represents a binary operator.
///
/// Variants are listed from loosest to tightest binding.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    /// Logical or (`||`)
    Or,
    /// Logical and (`&&`)
    And,
    /// Equal to (`==`)
    Equal,
    /// Not equal to (`!=`)
    NotEqual,
    /// Less than (`<`)
    Less,
    /// Less than or equal (`<=`)
    LessEqual,
    /// Greater than (`>`)
    Greater,
    /// Greater than or equal (`>=`)
    GreaterEqual,
    /// Addition (`+`)
    Add,
    /// Subtraction (`-`)
    Sub,
    /// Multiplication (`*`)
    Mul,
    /// Division (`/`)
    Div,
    /// Modulo (`%`)
    Mod,
}

impl BinaryOperator {
    /// Binding strength; higher binds tighter. All levels are
    /// left-associative.
    #[must_use]
    pub const fn precedence(self) -> u8 {
        match self {
            Self::Or => 1,
            Self::And => 2,
            Self::Equal | Self::NotEqual => 3,
            Self::Less | Self::LessEqual | Self::Greater | Self::GreaterEqual => 4,
            Self::Add | Self::Sub => 5,
            Self::Mul | Self::Div | Self::Mod => 6,
        }
    }

    #[must_use]
    pub const fn is_logical(self) -> bool {
        matches!(self, Self::And | Self::Or)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Or => "||",
            Self::And => "&&",
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::Less => "<",
            Self::LessEqual => "<=",
            Self::Greater => ">",
            Self::GreaterEqual => ">=",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
        }
    }
}

/// Represents a unary operator.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    /// Logical NOT (e.g. `!x`).
    Not,
    /// Arithmetic negation (e.g. `-x`).
    Negate,
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
                        Self::Not => "!",
                        Self::Negate => "-",
                    })
    }
}

impl fmt::Display for ReferenceBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SelfEntity => f.write_str("@self"),
            Self::Entity(id) => write!(f, "@{{{id}}}"),
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ".{}", self.property)?;
        match self.traversal {
            Some(Traversal::Index(index)) => write!(f, "[{index}]"),
            Some(Traversal::All) => f.write_str("[*]"),
            None => Ok(()),
        }
    }
}

impl fmt::Display for PropertyReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base)?;
        self.path.iter().try_for_each(|segment| write!(f, "{segment}"))
    }
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => f.write_str(&crate::util::num::format_number(*n)),
            Self::String(s) => write_quoted(f, s),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Null => f.write_str("null"),
        }
    }
}

fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("\"")?;
    for c in s.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            '\r' => f.write_str("\\r")?,
            '\0' => f.write_str("\\0")?,
            c if c.is_control() => write!(f, "\\u{:04x}", u32::from(c))?,
            c => write!(f, "{c}")?,
        }
    }
    f.write_str("\"")
}

/// Writes `operand`, wrapping it in parentheses when it is a binary node that
/// would otherwise re-associate differently.
fn write_operand(f: &mut fmt::Formatter<'_>, operand: &Expr, needs_parens: bool) -> fmt::Result {
    if needs_parens {
        write!(f, "({operand})")
    } else {
        write!(f, "{operand}")
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal { value, .. } => write!(f, "{value}"),
            Self::Identifier { name, .. } => f.write_str(name),
            Self::PropertyReference(reference) => write!(f, "{reference}"),
            Self::Call { name, arguments, .. } => {
                write!(f, "{name}(")?;
                for (i, argument) in arguments.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{argument}")?;
                }
                f.write_str(")")
            },
            Self::Unary { op, operand, .. } => {
                write!(f, "{op}")?;
                write_operand(f, operand, matches!(**operand, Self::Binary { .. }))
            },
            Self::Binary { left, op, right, .. } => {
                let level = op.precedence();
                let left_parens =
                    matches!(&**left, Self::Binary { op: inner, .. } if inner.precedence() < level);
                let right_parens =
                    matches!(&**right, Self::Binary { op: inner, .. } if inner.precedence() <= level);
                write_operand(f, left, left_parens)?;
                write!(f, " {op} ")?;
                write_operand(f, right, right_parens)
            },
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.body)
    }
}
