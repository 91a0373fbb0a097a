//! Expression AST types.

use crate::types::{PortableType, DOUBLE_PRECISION};

/// A literal value.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Integer literal.
    Integer(i64),
    /// Float literal.
    Float(f64),
    /// String literal.
    String(String),
    /// Boolean literal.
    Boolean(bool),
    /// NULL literal.
    Null,
}

impl Literal {
    /// The type a literal carries on its own; NULL has none.
    #[must_use]
    pub fn declared_type(&self) -> Option<PortableType> {
        match self {
            Self::Integer(_) => Some(PortableType::Integer),
            Self::Float(value) => Some(PortableType::Decimal {
                precision: Some(DOUBLE_PRECISION),
                scale: Some(fraction_digits(*value)),
            }),
            Self::String(_) => Some(PortableType::string()),
            Self::Boolean(_) => Some(PortableType::Boolean),
            Self::Null => None,
        }
    }
}

/// Digits after the decimal point in the shortest exact rendering of
/// `value`, capped at [`DOUBLE_PRECISION`].
fn fraction_digits(value: f64) -> u32 {
    value
        .to_string()
        .split_once('.')
        .map_or(0, |(_, fraction)| {
            u32::try_from(fraction.len()).unwrap_or(DOUBLE_PRECISION)
        })
        .min(DOUBLE_PRECISION)
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,

    // Comparison
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,

    // Logical
    And,
    Or,

    // String
    Concat,
    Like,
}

impl BinaryOp {
    /// Returns the infix SQL spelling of the operator.
    ///
    /// `Mod` has no infix form in this dialect; the compiler renders it as a
    /// function call instead.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Eq => "=",
            Self::NotEq => "<>",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Concat => "||",
            Self::Like => "LIKE",
        }
    }

    /// Returns the precedence of the operator (higher = binds tighter).
    #[must_use]
    pub const fn precedence(&self) -> u8 {
        match self {
            Self::Or => 1,
            Self::And => 2,
            Self::Eq | Self::NotEq | Self::Lt | Self::LtEq | Self::Gt | Self::GtEq => 3,
            Self::Like => 4,
            Self::Add | Self::Sub | Self::Concat => 8,
            Self::Mul | Self::Div | Self::Mod => 9,
        }
    }

    /// Returns whether the operator yields a boolean.
    #[must_use]
    pub const fn is_predicate(&self) -> bool {
        matches!(
            self,
            Self::Eq
                | Self::NotEq
                | Self::Lt
                | Self::LtEq
                | Self::Gt
                | Self::GtEq
                | Self::And
                | Self::Or
                | Self::Like
        )
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Negation (-)
    Neg,
    /// Logical NOT
    Not,
}

impl UnaryOp {
    /// Returns the SQL representation of the operator.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Neg => "-",
            Self::Not => "NOT",
        }
    }
}

/// A function call expression.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    /// The function name.
    pub name: String,
    /// The arguments.
    pub args: Vec<Expr>,
    /// Declared return type, when known.
    pub return_type: Option<PortableType>,
}

/// A `CASE` expression.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseExpr {
    /// Operand of a simple `CASE x WHEN ...`; `None` for a searched `CASE`.
    pub operand: Option<Box<Expr>>,
    /// `(condition, result)` pairs.
    pub whens: Vec<(Expr, Expr)>,
    /// The `ELSE` result.
    pub else_result: Option<Box<Expr>>,
}

impl CaseExpr {
    /// Creates a searched `CASE` with no branches.
    #[must_use]
    pub fn new() -> Self {
        Self {
            operand: None,
            whens: Vec::new(),
            else_result: None,
        }
    }

    /// Creates a simple `CASE <operand>`.
    #[must_use]
    pub fn with_operand(operand: Expr) -> Self {
        Self {
            operand: Some(Box::new(operand)),
            ..Self::new()
        }
    }

    /// Adds a `WHEN ... THEN ...` branch.
    #[must_use]
    pub fn when(mut self, condition: Expr, result: Expr) -> Self {
        self.whens.push((condition, result));
        self
    }

    /// Sets the `ELSE` result.
    #[must_use]
    pub fn otherwise(mut self, result: Expr) -> Self {
        self.else_result = Some(Box::new(result));
        self
    }
}

impl Default for CaseExpr {
    fn default() -> Self {
        Self::new()
    }
}

/// An SQL expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal value, rendered as a bind parameter.
    Literal(Literal),

    /// A column reference (optionally qualified with table name).
    Column {
        /// Table name or alias (optional).
        table: Option<String>,
        /// Column name.
        name: String,
        /// Declared column type, when known.
        ty: Option<PortableType>,
    },

    /// A binary expression.
    Binary {
        /// Left operand.
        left: Box<Expr>,
        /// Operator.
        op: BinaryOp,
        /// Right operand.
        right: Box<Expr>,
    },

    /// A unary expression.
    Unary {
        /// Operator.
        op: UnaryOp,
        /// Operand.
        operand: Box<Expr>,
    },

    /// A function call.
    Function(FunctionCall),

    /// The current timestamp.
    CurrentTimestamp,

    /// The next value of a sequence.
    NextValue {
        /// Schema of the sequence (optional).
        schema: Option<String>,
        /// Sequence name.
        sequence: String,
    },

    /// A `CASE` expression.
    Case(CaseExpr),

    /// `CAST(expr AS type)`.
    Cast {
        /// The expression to convert.
        expr: Box<Expr>,
        /// Target type.
        ty: PortableType,
    },

    /// IS NULL expression.
    IsNull {
        /// The expression to check.
        expr: Box<Expr>,
        /// Whether this is IS NOT NULL.
        negated: bool,
    },

    /// IN expression.
    In {
        /// The expression to check.
        expr: Box<Expr>,
        /// The list of values.
        list: Vec<Expr>,
        /// Whether this is NOT IN.
        negated: bool,
    },

    /// Parenthesized expression.
    Paren(Box<Expr>),
}

impl Expr {
    /// Creates an untyped column reference.
    #[must_use]
    pub fn column(name: impl Into<String>) -> Self {
        Self::Column {
            table: None,
            name: name.into(),
            ty: None,
        }
    }

    /// Creates a column reference with a declared type.
    #[must_use]
    pub fn typed_column(name: impl Into<String>, ty: PortableType) -> Self {
        Self::Column {
            table: None,
            name: name.into(),
            ty: Some(ty),
        }
    }

    /// Creates a table-qualified column reference.
    #[must_use]
    pub fn qualified_column(table: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Column {
            table: Some(table.into()),
            name: name.into(),
            ty: None,
        }
    }

    /// Integer literal.
    #[must_use]
    pub const fn int(value: i64) -> Self {
        Self::Literal(Literal::Integer(value))
    }

    /// Float literal.
    #[must_use]
    pub const fn float(value: f64) -> Self {
        Self::Literal(Literal::Float(value))
    }

    /// String literal.
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::Literal(Literal::String(value.into()))
    }

    /// Boolean literal.
    #[must_use]
    pub const fn boolean(value: bool) -> Self {
        Self::Literal(Literal::Boolean(value))
    }

    /// NULL literal.
    #[must_use]
    pub const fn null() -> Self {
        Self::Literal(Literal::Null)
    }

    /// Next value of a sequence.
    #[must_use]
    pub fn next_value(schema: Option<&str>, sequence: impl Into<String>) -> Self {
        Self::NextValue {
            schema: schema.map(str::to_string),
            sequence: sequence.into(),
        }
    }

    /// Function call with unknown return type.
    #[must_use]
    pub fn function(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Self::Function(FunctionCall {
            name: name.into(),
            args,
            return_type: None,
        })
    }

    /// Builds `self <op> right`.
    #[must_use]
    pub fn binary(self, op: BinaryOp, right: Expr) -> Self {
        Self::Binary {
            left: Box::new(self),
            op,
            right: Box::new(right),
        }
    }

    /// Builds `self = right`.
    #[must_use]
    pub fn eq(self, right: Expr) -> Self {
        self.binary(BinaryOp::Eq, right)
    }

    /// Builds `self > right`.
    #[must_use]
    pub fn gt(self, right: Expr) -> Self {
        self.binary(BinaryOp::Gt, right)
    }

    /// Builds `self AND right`.
    #[must_use]
    pub fn and(self, right: Expr) -> Self {
        self.binary(BinaryOp::And, right)
    }

    /// Builds the remainder of `self` divided by `right`.
    #[must_use]
    pub fn modulo(self, right: Expr) -> Self {
        self.binary(BinaryOp::Mod, right)
    }

    /// Builds `CAST(self AS ty)`.
    #[must_use]
    pub fn cast(self, ty: PortableType) -> Self {
        Self::Cast {
            expr: Box::new(self),
            ty,
        }
    }

    /// Builds `self IS NULL`.
    #[must_use]
    pub fn is_null(self) -> Self {
        Self::IsNull {
            expr: Box::new(self),
            negated: false,
        }
    }

    /// The type this expression is declared to produce, if it can be told
    /// without consulting the database.
    #[must_use]
    pub fn declared_type(&self) -> Option<PortableType> {
        match self {
            Self::Literal(lit) => lit.declared_type(),
            Self::Column { ty, .. } => ty.clone(),
            Self::Binary { left, op, right } => {
                if op.is_predicate() {
                    Some(PortableType::Boolean)
                } else if *op == BinaryOp::Concat {
                    Some(PortableType::string())
                } else {
                    left.declared_type().or_else(|| right.declared_type())
                }
            }
            Self::Unary { op, operand } => match op {
                UnaryOp::Not => Some(PortableType::Boolean),
                UnaryOp::Neg => operand.declared_type(),
            },
            Self::Function(call) => call.return_type.clone(),
            Self::CurrentTimestamp => Some(PortableType::Timestamp),
            Self::NextValue { .. } => Some(PortableType::BigInt),
            Self::Case(case) => case
                .whens
                .iter()
                .map(|(_, result)| result)
                .chain(case.else_result.as_deref())
                .find_map(Expr::declared_type),
            Self::Cast { ty, .. } => Some(ty.clone()),
            Self::IsNull { .. } | Self::In { .. } => Some(PortableType::Boolean),
            Self::Paren(inner) => inner.declared_type(),
        }
    }
}
