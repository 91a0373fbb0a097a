//! Per-session helpers.

use tracing::debug;

use crate::error::{Error, Result};
use crate::executor::{BoundStatement, Executor};
use crate::identifier::format_sequence;

/// Advances a sequence and returns the value it produced.
///
/// Used to pre-execute autoincrement sequences before an INSERT.
pub fn fire_sequence<E: Executor + ?Sized>(
    executor: &mut E,
    schema: Option<&str>,
    sequence: &str,
) -> Result<i64> {
    let sql = format!("SELECT {}.nextval", format_sequence(schema, sequence));
    debug!(sql = %sql, "firing sequence");
    let value = executor.fetch_scalar(&BoundStatement::new(sql))?;
    value.as_i64().ok_or_else(|| Error::UnexpectedRow {
        query: "nextval",
        message: format!("sequence {sequence} returned {value:?}"),
    })
}

/// Returns the identity value generated by the session's last INSERT, if
/// any.
pub fn last_insert_id<E: Executor + ?Sized>(executor: &mut E) -> Result<Option<i64>> {
    let statement = BoundStatement::new("SELECT LAST_INSERT_ID()");
    debug!(sql = %statement.sql, "reading last insert id");
    Ok(executor.fetch_scalar(&statement)?.as_i64())
}
