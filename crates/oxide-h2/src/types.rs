//! Mapping between H2's native column types and the portable type system.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Decimal-digit precision used for H2's `DOUBLE` columns.
pub const DOUBLE_PRECISION: u32 = 53;

/// Portable column types.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "args", rename_all = "snake_case")]
pub enum PortableType {
    /// 4-byte integer.
    Integer,
    /// 8-byte integer.
    BigInt,
    /// 2-byte integer.
    SmallInt,
    /// Exact numeric with optional precision and scale.
    Decimal {
        /// Total number of digits.
        precision: Option<u32>,
        /// Digits after the decimal point.
        scale: Option<u32>,
    },
    /// Variable-length character string.
    Varchar(Option<u32>),
    /// Fixed-length character string.
    Char(Option<u32>),
    /// Character large object.
    Clob,
    /// Binary large object.
    Blob,
    /// Boolean.
    Boolean,
    /// Calendar date.
    Date,
    /// Time of day.
    Time,
    /// Date and time.
    DateTime,
    /// Timestamp.
    Timestamp,
    /// Fixed-length binary string.
    Binary(Option<u32>),
    /// A native type with no portable counterpart.
    Unknown,
}

impl PortableType {
    /// Generic string type used when an expression has no declared type.
    #[must_use]
    pub const fn string() -> Self {
        Self::Varchar(None)
    }

    /// Returns whether the type is one of the integer kinds.
    #[must_use]
    pub const fn is_integer(&self) -> bool {
        matches!(self, Self::Integer | Self::BigInt | Self::SmallInt)
    }

    /// Returns whether this is the unknown-type sentinel.
    #[must_use]
    pub const fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    /// Returns the H2 spelling of the type, as used in DDL and `CAST`.
    #[must_use]
    pub fn to_sql(&self) -> String {
        fn with_len(name: &str, len: Option<u32>) -> String {
            match len {
                Some(n) => format!("{name}({n})"),
                None => name.to_string(),
            }
        }

        match self {
            Self::Integer => String::from("INTEGER"),
            Self::BigInt => String::from("BIGINT"),
            Self::SmallInt => String::from("SMALLINT"),
            Self::Decimal { precision, scale } => match (precision, scale) {
                (Some(p), Some(s)) => format!("DECIMAL({p}, {s})"),
                (Some(p), None) => format!("DECIMAL({p})"),
                _ => String::from("DECIMAL"),
            },
            Self::Varchar(len) => with_len("VARCHAR", *len),
            Self::Char(len) => with_len("CHAR", *len),
            Self::Clob => String::from("CLOB"),
            Self::Blob => String::from("BLOB"),
            Self::Boolean => String::from("BOOLEAN"),
            Self::Date => String::from("DATE"),
            Self::Time => String::from("TIME"),
            Self::DateTime => String::from("DATETIME"),
            Self::Timestamp => String::from("TIMESTAMP"),
            Self::Binary(len) => with_len("BINARY", *len),
            Self::Unknown => String::from("NULL"),
        }
    }
}

impl fmt::Display for PortableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}

/// How a native type uses the length reported by the catalog.
#[derive(Clone, Copy)]
enum TypeShape {
    /// The representation is fixed; any catalog length is ignored.
    Fixed(fn() -> PortableType),
    /// The catalog's maximum length becomes the type argument.
    Bounded(fn(Option<u32>) -> PortableType),
}

/// Native type names recognized in `INFORMATION_SCHEMA.COLUMNS.TYPE_NAME`.
const NATIVE_TYPES: &[(&str, TypeShape)] = &[
    ("BIGINT", TypeShape::Fixed(|| PortableType::BigInt)),
    ("BINARY", TypeShape::Bounded(PortableType::Binary)),
    ("BLOB", TypeShape::Fixed(|| PortableType::Blob)),
    ("BOOLEAN", TypeShape::Fixed(|| PortableType::Boolean)),
    ("CHAR", TypeShape::Bounded(PortableType::Char)),
    ("CLOB", TypeShape::Fixed(|| PortableType::Clob)),
    ("DATE", TypeShape::Fixed(|| PortableType::Date)),
    ("DATETIME", TypeShape::Fixed(|| PortableType::DateTime)),
    (
        "DECIMAL",
        TypeShape::Bounded(|precision| PortableType::Decimal {
            precision,
            scale: None,
        }),
    ),
    (
        "DOUBLE",
        TypeShape::Fixed(|| PortableType::Decimal {
            precision: Some(DOUBLE_PRECISION),
            scale: None,
        }),
    ),
    ("INT", TypeShape::Fixed(|| PortableType::Integer)),
    ("INTEGER", TypeShape::Fixed(|| PortableType::Integer)),
    ("SMALLINT", TypeShape::Fixed(|| PortableType::SmallInt)),
    ("TIME", TypeShape::Fixed(|| PortableType::Time)),
    ("TIMESTAMP", TypeShape::Fixed(|| PortableType::Timestamp)),
    ("VARCHAR", TypeShape::Bounded(PortableType::Varchar)),
];

/// Non-fatal diagnostic raised when a native type has no portable mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeWarning {
    /// Column whose type was not recognized.
    pub column: String,
    /// The native type name as reported by the catalog.
    pub type_name: String,
}

impl fmt::Display for TypeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Did not recognize type '{}' of column '{}'",
            self.type_name, self.column
        )
    }
}

/// Maps a native type name and the catalog's character length to a portable
/// type.
///
/// Returns `None` when the name is not recognized; the caller decides how to
/// surface that (see [`resolve_column_type`]).
#[must_use]
pub fn to_portable(type_name: &str, char_length: Option<u32>) -> Option<PortableType> {
    let name = type_name.trim();
    NATIVE_TYPES
        .iter()
        .find(|(native, _)| native.eq_ignore_ascii_case(name))
        .map(|(_, shape)| match shape {
            TypeShape::Fixed(make) => make(),
            TypeShape::Bounded(make) => make(char_length.filter(|len| *len > 0)),
        })
}

/// Resolves the type of a reflected column.
///
/// Unrecognized names yield [`PortableType::Unknown`] together with a
/// [`TypeWarning`], which is also logged.
pub fn resolve_column_type(
    column: &str,
    type_name: &str,
    char_length: Option<u32>,
) -> (PortableType, Option<TypeWarning>) {
    if let Some(ty) = to_portable(type_name, char_length) {
        return (ty, None);
    }
    let warning = TypeWarning {
        column: column.to_string(),
        type_name: type_name.to_string(),
    };
    tracing::warn!(column = %column, type_name = %type_name, "{warning}");
    (PortableType::Unknown, Some(warning))
}
