//! The seam between this crate and a database driver.
//!
//! The adapter never talks to the network itself. Everything it needs from a
//! connection goes through [`Executor`]: run SQL text, fetch rows, and drive
//! the local transaction. Drivers (see `oxide-h2-sqlx`) and test doubles
//! implement it.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// A value bound into, or read out of, a statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SqlValue {
    /// SQL NULL.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Floating-point value.
    Float(f64),
    /// Text value.
    Text(String),
    /// Binary value.
    Blob(Vec<u8>),
}

impl SqlValue {
    /// Returns whether the value is NULL.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the text, if this is a text value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Interprets the value as a boolean.
    ///
    /// Catalog views report flags either as booleans or as the text
    /// `TRUE`/`FALSE`/`YES`/`NO`, so both are accepted.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Int(n) => Some(*n != 0),
            Self::Text(s) => match s.trim().to_ascii_uppercase().as_str() {
                "TRUE" | "YES" | "1" => Some(true),
                "FALSE" | "NO" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Interprets the value as an integer.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Returns the SQL representation for inline use (escaped).
    #[must_use]
    pub fn to_sql_inline(&self) -> String {
        match self {
            Self::Null => String::from("NULL"),
            Self::Bool(true) => String::from("TRUE"),
            Self::Bool(false) => String::from("FALSE"),
            Self::Int(n) => format!("{n}"),
            Self::Float(f) => format!("{f}"),
            Self::Text(s) => format!("'{}'", s.replace('\'', "''")),
            Self::Blob(b) => {
                let hex: String = b.iter().map(|byte| format!("{byte:02X}")).collect();
                format!("X'{hex}'")
            }
        }
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// One result row, positional.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Row {
    values: Vec<SqlValue>,
}

impl Row {
    /// Creates a row from its column values.
    #[must_use]
    pub fn new(values: Vec<SqlValue>) -> Self {
        Self { values }
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns whether the row has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at `index`, or `None` past the end.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&SqlValue> {
        self.values.get(index)
    }

    /// Text at `index`; NULL, non-text and missing columns yield `None`.
    #[must_use]
    pub fn text(&self, index: usize) -> Option<&str> {
        self.get(index).and_then(SqlValue::as_str)
    }

    /// All values.
    #[must_use]
    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }
}

impl<V: Into<SqlValue>> FromIterator<V> for Row {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Into::into).collect())
    }
}

/// SQL text plus named bind values (`:name` placeholders).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BoundStatement {
    /// The SQL text.
    pub sql: String,
    /// Bind values, in the order they were added.
    pub params: Vec<(String, SqlValue)>,
}

impl BoundStatement {
    /// Creates a statement with no bind values.
    #[must_use]
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Adds a named bind value.
    #[must_use]
    pub fn bind(mut self, name: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    /// Looks up a bind value by name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&SqlValue> {
        self.params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
    }
}

static SQLCODE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[SQLCode: ?(\d+)\]").expect("valid SQLCode pattern")
});

static H2_CODE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[(\d+)-\d+\]").expect("valid H2 error code pattern")
});

/// Extracts the numeric error code from a driver error message.
///
/// Understands the JDBC bridge form `[SQLCode: 1146]` and H2's native
/// `[42102-214]` suffix (error code, then build number).
#[must_use]
pub fn extract_error_code(message: &str) -> Option<i32> {
    SQLCODE_RE
        .captures(message)
        .or_else(|| H2_CODE_RE.captures(message))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// A failed round-trip, as reported by the driver.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ExecutorError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl ExecutorError {
    /// Creates an error from a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Wraps a driver error, keeping it as the source.
    #[must_use]
    pub fn from_source<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }

    /// The driver's message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The numeric error code embedded in the message, if any.
    #[must_use]
    pub fn error_code(&self) -> Option<i32> {
        extract_error_code(&self.message)
    }
}

/// Runs SQL against one database session.
///
/// Calls block until the round-trip completes. Implementations must not
/// retry; failures are reported as they happen.
pub trait Executor {
    /// Runs a query and returns every row.
    fn fetch_all(&mut self, statement: &BoundStatement) -> Result<Vec<Row>, ExecutorError>;

    /// Runs a statement that returns no rows; yields the affected row count.
    fn execute(&mut self, statement: &BoundStatement) -> Result<u64, ExecutorError>;

    /// Runs a query and returns the first row, if any.
    fn fetch_optional(&mut self, statement: &BoundStatement) -> Result<Option<Row>, ExecutorError> {
        Ok(self.fetch_all(statement)?.into_iter().next())
    }

    /// Runs a query and returns the first column of the first row.
    fn fetch_scalar(&mut self, statement: &BoundStatement) -> Result<SqlValue, ExecutorError> {
        Ok(self
            .fetch_optional(statement)?
            .and_then(|row| row.get(0).cloned())
            .unwrap_or(SqlValue::Null))
    }

    /// Starts a local transaction.
    fn begin(&mut self) -> Result<(), ExecutorError> {
        self.execute(&BoundStatement::new("BEGIN")).map(|_| ())
    }

    /// Commits the local transaction.
    fn commit(&mut self) -> Result<(), ExecutorError> {
        self.execute(&BoundStatement::new("COMMIT")).map(|_| ())
    }

    /// Rolls back the local transaction.
    fn rollback(&mut self) -> Result<(), ExecutorError> {
        self.execute(&BoundStatement::new("ROLLBACK")).map(|_| ())
    }

    /// Releases the local transaction after the database has already
    /// completed it, e.g. with `COMMIT TRANSACTION <xid>`.
    ///
    /// Executors that track an open transaction must clear it here without
    /// rolling back. The default does nothing.
    fn end_transaction(&mut self) -> Result<(), ExecutorError> {
        Ok(())
    }
}

impl<E: Executor + ?Sized> Executor for &mut E {
    fn fetch_all(&mut self, statement: &BoundStatement) -> Result<Vec<Row>, ExecutorError> {
        (**self).fetch_all(statement)
    }

    fn execute(&mut self, statement: &BoundStatement) -> Result<u64, ExecutorError> {
        (**self).execute(statement)
    }

    fn fetch_optional(&mut self, statement: &BoundStatement) -> Result<Option<Row>, ExecutorError> {
        (**self).fetch_optional(statement)
    }

    fn fetch_scalar(&mut self, statement: &BoundStatement) -> Result<SqlValue, ExecutorError> {
        (**self).fetch_scalar(statement)
    }

    fn begin(&mut self) -> Result<(), ExecutorError> {
        (**self).begin()
    }

    fn commit(&mut self) -> Result<(), ExecutorError> {
        (**self).commit()
    }

    fn rollback(&mut self) -> Result<(), ExecutorError> {
        (**self).rollback()
    }

    fn end_transaction(&mut self) -> Result<(), ExecutorError> {
        (**self).end_transaction()
    }
}
