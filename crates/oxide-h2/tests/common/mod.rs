#![allow(dead_code)]

use oxide_h2::executor::{BoundStatement, Executor, ExecutorError, Row, SqlValue};

/// An executor that answers queries from a script and records every
/// statement it receives.
///
/// Responses are matched by substring against the SQL text; the first
/// registered match wins. Unmatched queries return no rows.
#[derive(Debug, Default)]
pub struct ScriptedExecutor {
    responses: Vec<(String, Vec<Row>)>,
    failures: Vec<(String, String)>,
    pub statements: Vec<BoundStatement>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers queries containing `pattern` with `rows`.
    pub fn respond(mut self, pattern: &str, rows: Vec<Row>) -> Self {
        self.responses.push((pattern.to_string(), rows));
        self
    }

    /// Fails statements containing `pattern` with `message`.
    pub fn fail(mut self, pattern: &str, message: &str) -> Self {
        self.failures.push((pattern.to_string(), message.to_string()));
        self
    }

    /// SQL text of every statement received, in order.
    pub fn sql_log(&self) -> Vec<&str> {
        self.statements.iter().map(|s| s.sql.as_str()).collect()
    }

    /// Number of statements whose SQL contains `pattern`.
    pub fn count(&self, pattern: &str) -> usize {
        self.statements
            .iter()
            .filter(|s| s.sql.contains(pattern))
            .count()
    }

    fn record(&mut self, statement: &BoundStatement) -> Result<(), ExecutorError> {
        self.statements.push(statement.clone());
        match self
            .failures
            .iter()
            .find(|(pattern, _)| statement.sql.contains(pattern.as_str()))
        {
            Some((_, message)) => Err(ExecutorError::new(message.clone())),
            None => Ok(()),
        }
    }
}

impl Executor for ScriptedExecutor {
    fn fetch_all(&mut self, statement: &BoundStatement) -> Result<Vec<Row>, ExecutorError> {
        self.record(statement)?;
        Ok(self
            .responses
            .iter()
            .find(|(pattern, _)| statement.sql.contains(pattern.as_str()))
            .map(|(_, rows)| rows.clone())
            .unwrap_or_default())
    }

    fn execute(&mut self, statement: &BoundStatement) -> Result<u64, ExecutorError> {
        self.record(statement)?;
        Ok(0)
    }
}

/// A [`ScriptedExecutor`] that tracks its local transaction the way a
/// connection-holding driver does: `begin` fails while one is open.
#[derive(Debug, Default)]
pub struct SessionExecutor {
    pub inner: ScriptedExecutor,
    pub open: bool,
}

impl SessionExecutor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Executor for SessionExecutor {
    fn fetch_all(&mut self, statement: &BoundStatement) -> Result<Vec<Row>, ExecutorError> {
        self.inner.fetch_all(statement)
    }

    fn execute(&mut self, statement: &BoundStatement) -> Result<u64, ExecutorError> {
        self.inner.execute(statement)
    }

    fn begin(&mut self) -> Result<(), ExecutorError> {
        if self.open {
            return Err(ExecutorError::new("a transaction is already open"));
        }
        self.inner.begin()?;
        self.open = true;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), ExecutorError> {
        self.open = false;
        self.inner.commit()
    }

    fn rollback(&mut self) -> Result<(), ExecutorError> {
        self.open = false;
        self.inner.rollback()
    }

    fn end_transaction(&mut self) -> Result<(), ExecutorError> {
        self.open = false;
        Ok(())
    }
}

pub fn text(value: &str) -> SqlValue {
    SqlValue::from(value)
}

pub fn row(values: Vec<SqlValue>) -> Row {
    Row::new(values)
}

/// A row of `INFORMATION_SCHEMA.COLUMNS` as the reflector selects it.
pub fn column_row(
    name: &str,
    type_name: &str,
    default: Option<&str>,
    nullable: bool,
    autoincrement: bool,
    length: Option<i64>,
) -> Row {
    Row::new(vec![
        text(name),
        text(type_name),
        SqlValue::from(default),
        text(if nullable { "YES" } else { "NO" }),
        SqlValue::Bool(autoincrement),
        SqlValue::from(length),
    ])
}

pub fn index_row(name: &str, non_unique: bool, column: &str, kind: &str) -> Row {
    Row::new(vec![
        text(name),
        SqlValue::Bool(non_unique),
        text(column),
        text(kind),
    ])
}

// Substrings that identify each catalog query.
pub const COLUMNS: &str = "C.COLUMN_NAME";
pub const PK_COLUMNS: &str = "PRIMARY_KEY = 'TRUE'";
pub const PK_NAME: &str = "CONSTRAINT_TYPE = 'PRIMARY_KEY'";
pub const FOREIGN_KEYS: &str = "CONSTRAINT_TYPE = 'REFERENTIAL'";
pub const INDEXES: &str = "INDEX_NAME, NON_UNIQUE";
pub const TABLE_NAMES: &str = "ORDER BY table_name";
pub const HAS_TABLE: &str = "table_name=:table";
pub const VIEWS: &str = "INFORMATION_SCHEMA.VIEWS";
pub const IN_DOUBT: &str = "INFORMATION_SCHEMA.IN_DOUBT";
