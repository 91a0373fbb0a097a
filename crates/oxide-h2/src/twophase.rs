//! Two-phase commit.
//!
//! H2 implements the protocol with three commands:
//!
//! - `PREPARE COMMIT <xid>` ends phase one.
//! - `COMMIT TRANSACTION <xid>` completes a prepared transaction.
//! - `ROLLBACK TRANSACTION <xid>` abandons a prepared transaction.
//!
//! Prepared transactions that survive a crash are listed in
//! `INFORMATION_SCHEMA.IN_DOUBT`.
//!
//! Phase ordering is not enforced here: committing an unprepared id with
//! `is_prepared = true` is passed straight to the database.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::config::DialectConfig;
use crate::error::{Error, Result};
use crate::executor::{BoundStatement, Executor, SqlValue};
use crate::reflect::queries;

static TRANSACTION_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("valid transaction id pattern"));

/// Checks that `xid` can be embedded in a protocol command.
pub fn validate_xid(xid: &str) -> Result<()> {
    if TRANSACTION_ID.is_match(xid) {
        Ok(())
    } else {
        Err(Error::InvalidTransactionId(xid.to_string()))
    }
}

/// Issues two-phase-commit commands over an executor.
#[derive(Debug, Clone, Copy)]
pub struct TransactionCoordinator<'a> {
    config: &'a DialectConfig,
}

impl<'a> TransactionCoordinator<'a> {
    /// Creates a coordinator.
    #[must_use]
    pub const fn new(config: &'a DialectConfig) -> Self {
        Self { config }
    }

    fn run<E: Executor + ?Sized>(executor: &mut E, sql: String) -> Result<()> {
        debug!(sql = %sql, "two-phase command");
        executor.execute(&BoundStatement::new(sql))?;
        Ok(())
    }

    /// Starts the local transaction that will later be prepared.
    ///
    /// H2 does not take the id at this point; it is only validated.
    pub fn begin_twophase<E: Executor + ?Sized>(&self, executor: &mut E, xid: &str) -> Result<()> {
        validate_xid(xid)?;
        executor.begin()?;
        Ok(())
    }

    /// Prepares the current transaction under `xid`.
    pub fn prepare<E: Executor + ?Sized>(&self, executor: &mut E, xid: &str) -> Result<()> {
        validate_xid(xid)?;
        Self::run(executor, format!("PREPARE COMMIT {xid}"))
    }

    /// Commits a transaction.
    ///
    /// A prepared transaction is committed by id, after which the executor
    /// releases its local transaction handle. An unprepared one is committed
    /// locally.
    pub fn commit_twophase<E: Executor + ?Sized>(
        &self,
        executor: &mut E,
        xid: &str,
        is_prepared: bool,
        recover: bool,
    ) -> Result<()> {
        validate_xid(xid)?;
        if !is_prepared {
            executor.commit()?;
            return Ok(());
        }
        Self::run(executor, format!("COMMIT TRANSACTION {xid}"))?;
        info!(xid, recover, "committed prepared transaction");
        if self.config.legacy_twophase_rollback {
            warn!(
                xid,
                "legacy_twophase_rollback is enabled: rolling back the local session after a prepared commit"
            );
            executor.rollback()?;
        } else {
            executor.end_transaction()?;
        }
        Ok(())
    }

    /// Rolls back a transaction.
    ///
    /// A prepared transaction is rolled back by id and then locally. An
    /// unprepared one is rolled back locally.
    pub fn rollback_twophase<E: Executor + ?Sized>(
        &self,
        executor: &mut E,
        xid: &str,
        is_prepared: bool,
        recover: bool,
    ) -> Result<()> {
        validate_xid(xid)?;
        if is_prepared {
            Self::run(executor, format!("ROLLBACK TRANSACTION {xid}"))?;
            info!(xid, recover, "rolled back prepared transaction");
        }
        executor.rollback()?;
        Ok(())
    }

    /// Lists the ids of prepared transactions awaiting resolution.
    pub fn recover_in_doubt<E: Executor + ?Sized>(&self, executor: &mut E) -> Result<Vec<String>> {
        let statement = BoundStatement::new(queries::IN_DOUBT);
        debug!(sql = %statement.sql, "catalog query");
        executor
            .fetch_all(&statement)?
            .iter()
            .map(|row| match row.get(0) {
                Some(SqlValue::Text(xid)) => Ok(xid.clone()),
                Some(SqlValue::Int(xid)) => Ok(xid.to_string()),
                _ => Err(Error::UnexpectedRow {
                    query: "IN_DOUBT",
                    message: String::from("first column is not a transaction id"),
                }),
            })
            .collect()
    }
}
