//! Blocking [`Executor`] over a sqlx PostgreSQL pool.

use std::time::Duration;

use oxide_h2::connect::PoolStrategy;
use oxide_h2::executor::{BoundStatement, Executor, ExecutorError, Row, SqlValue};
use sqlx::postgres::{PgArguments, PgConnectOptions, PgPool, PgPoolOptions, PgRow};
use sqlx::query::Query;
use sqlx::{Column, Postgres, Row as _, Transaction, TypeInfo, ValueRef};
use tokio::runtime::Runtime;
use tracing::{debug, info};

use crate::placeholders::to_positional;

/// Connects to an H2 server through its PostgreSQL listener and runs
/// statements synchronously.
///
/// The executor owns a single-threaded Tokio runtime; every call blocks on
/// it. It must not be used from inside another async runtime.
pub struct SqlxExecutor {
    runtime: Runtime,
    pool: PgPool,
    transaction: Option<Transaction<'static, Postgres>>,
    strategy: PoolStrategy,
}

impl std::fmt::Debug for SqlxExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlxExecutor")
            .field("strategy", &self.strategy)
            .field("in_transaction", &self.transaction.is_some())
            .finish_non_exhaustive()
    }
}

/// Pool options for a connection strategy.
#[must_use]
pub fn pool_options(strategy: PoolStrategy) -> PgPoolOptions {
    match strategy {
        // In-memory databases live only as long as a connection does.
        PoolStrategy::Singleton => PgPoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None),
        PoolStrategy::Unpooled => PgPoolOptions::new()
            .max_connections(1)
            .min_connections(0)
            .idle_timeout(Duration::ZERO)
            .max_lifetime(Duration::ZERO),
    }
}

impl SqlxExecutor {
    /// Connects to `database` on the server at `server_url`.
    ///
    /// `server_url` is a `postgres://` URL pointing at H2's PostgreSQL
    /// listener; `database` is the H2 database name (`mem:test`,
    /// `~/data/app`, ...). The pool strategy follows the database name.
    ///
    /// # Errors
    ///
    /// Fails when the URL is invalid, the runtime cannot start or the first
    /// connection cannot be opened.
    pub fn connect(server_url: &str, database: &str) -> Result<Self, ExecutorError> {
        let mut options: PgConnectOptions =
            server_url.parse().map_err(ExecutorError::from_source)?;
        if !database.trim().is_empty() {
            options = options.database(database);
        }
        let strategy = PoolStrategy::for_database(database);
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(ExecutorError::from_source)?;
        let pool = runtime
            .block_on(pool_options(strategy).connect_with(options))
            .map_err(ExecutorError::from_source)?;
        info!(database, ?strategy, "connected");
        Ok(Self {
            runtime,
            pool,
            transaction: None,
            strategy,
        })
    }

    /// The pool strategy in use.
    #[must_use]
    pub const fn strategy(&self) -> PoolStrategy {
        self.strategy
    }

    /// Returns whether a local transaction is open.
    #[must_use]
    pub const fn in_transaction(&self) -> bool {
        self.transaction.is_some()
    }

    /// Rolls back any open transaction and closes the pool.
    pub fn close(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let Self {
            runtime,
            pool,
            transaction,
            ..
        } = self;
        runtime.block_on(async {
            if let Some(tx) = transaction.take() {
                if let Err(err) = tx.rollback().await {
                    debug!(error = %err, "rollback on close failed");
                }
            }
            pool.close().await;
        });
    }
}

impl Drop for SqlxExecutor {
    fn drop(&mut self) {
        if !self.pool.is_closed() {
            self.shutdown();
        }
    }
}

fn bind_value<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: &SqlValue,
) -> Query<'q, Postgres, PgArguments> {
    match value {
        SqlValue::Null => query.bind(None::<String>),
        SqlValue::Bool(b) => query.bind(*b),
        SqlValue::Int(n) => query.bind(*n),
        SqlValue::Float(f) => query.bind(*f),
        SqlValue::Text(s) => query.bind(s.clone()),
        SqlValue::Blob(b) => query.bind(b.clone()),
    }
}

fn decode_value(row: &PgRow, index: usize) -> Result<SqlValue, sqlx::Error> {
    if row.try_get_raw(index)?.is_null() {
        return Ok(SqlValue::Null);
    }
    let value = match row.column(index).type_info().name() {
        "BOOL" => SqlValue::Bool(row.try_get(index)?),
        "INT2" => SqlValue::Int(i64::from(row.try_get::<i16, _>(index)?)),
        "INT4" => SqlValue::Int(i64::from(row.try_get::<i32, _>(index)?)),
        "INT8" => SqlValue::Int(row.try_get(index)?),
        "FLOAT4" => SqlValue::Float(f64::from(row.try_get::<f32, _>(index)?)),
        "FLOAT8" => SqlValue::Float(row.try_get(index)?),
        "BYTEA" => SqlValue::Blob(row.try_get(index)?),
        _ => SqlValue::Text(row.try_get_unchecked(index)?),
    };
    Ok(value)
}

fn decode_row(row: &PgRow) -> Result<Row, sqlx::Error> {
    (0..row.len())
        .map(|index| decode_value(row, index))
        .collect::<Result<Vec<_>, _>>()
        .map(Row::new)
}

impl Executor for SqlxExecutor {
    fn fetch_all(&mut self, statement: &BoundStatement) -> Result<Vec<Row>, ExecutorError> {
        let positional = to_positional(statement)?;
        debug!(sql = %positional.sql, params = positional.values.len(), "fetch");
        let query = positional
            .values
            .iter()
            .fold(sqlx::query(&positional.sql), bind_value);
        let Self {
            runtime,
            pool,
            transaction,
            ..
        } = self;
        let rows = runtime
            .block_on(async {
                match transaction.as_mut() {
                    Some(tx) => query.fetch_all(&mut **tx).await,
                    None => query.fetch_all(&*pool).await,
                }
            })
            .map_err(ExecutorError::from_source)?;
        rows.iter()
            .map(decode_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(ExecutorError::from_source)
    }

    fn execute(&mut self, statement: &BoundStatement) -> Result<u64, ExecutorError> {
        let positional = to_positional(statement)?;
        debug!(sql = %positional.sql, params = positional.values.len(), "execute");
        let query = positional
            .values
            .iter()
            .fold(sqlx::query(&positional.sql), bind_value);
        let Self {
            runtime,
            pool,
            transaction,
            ..
        } = self;
        let result = runtime
            .block_on(async {
                match transaction.as_mut() {
                    Some(tx) => query.execute(&mut **tx).await,
                    None => query.execute(&*pool).await,
                }
            })
            .map_err(ExecutorError::from_source)?;
        Ok(result.rows_affected())
    }

    fn begin(&mut self) -> Result<(), ExecutorError> {
        if self.transaction.is_some() {
            return Err(ExecutorError::new("a transaction is already open"));
        }
        let tx = self
            .runtime
            .block_on(self.pool.begin())
            .map_err(ExecutorError::from_source)?;
        debug!("transaction started");
        self.transaction = Some(tx);
        Ok(())
    }

    fn commit(&mut self) -> Result<(), ExecutorError> {
        match self.transaction.take() {
            Some(tx) => {
                self.runtime
                    .block_on(tx.commit())
                    .map_err(ExecutorError::from_source)?;
                debug!("transaction committed");
            }
            None => debug!("commit without an open transaction"),
        }
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), ExecutorError> {
        match self.transaction.take() {
            Some(tx) => {
                self.runtime
                    .block_on(tx.rollback())
                    .map_err(ExecutorError::from_source)?;
                debug!("transaction rolled back");
            }
            None => debug!("rollback without an open transaction"),
        }
        Ok(())
    }

    // The session has nothing pending once the database completed the
    // transaction, so closing the handle with COMMIT changes no data and
    // returns the connection to the pool.
    fn end_transaction(&mut self) -> Result<(), ExecutorError> {
        if let Some(tx) = self.transaction.take() {
            self.runtime
                .block_on(tx.commit())
                .map_err(ExecutorError::from_source)?;
            debug!("transaction handle released");
        }
        Ok(())
    }
}
