//! Two-phase commit command sequences.

mod common;

use common::{row, text, ScriptedExecutor, SessionExecutor, IN_DOUBT};
use oxide_h2::config::DialectConfig;
use oxide_h2::executor::{BoundStatement, Executor, SqlValue};
use oxide_h2::twophase::TransactionCoordinator;
use oxide_h2::Error;
use pretty_assertions::assert_eq;

#[test]
fn prepared_commit_sequence() {
    let config = DialectConfig::default();
    let coordinator = TransactionCoordinator::new(&config);
    let mut db = ScriptedExecutor::new();

    coordinator.begin_twophase(&mut db, "tx_1").unwrap();
    db.execute(&BoundStatement::new("INSERT INTO t (a) VALUES (1)"))
        .unwrap();
    coordinator.prepare(&mut db, "tx_1").unwrap();
    coordinator.commit_twophase(&mut db, "tx_1", true, false).unwrap();

    assert_eq!(
        db.sql_log(),
        vec![
            "BEGIN",
            "INSERT INTO t (a) VALUES (1)",
            "PREPARE COMMIT tx_1",
            "COMMIT TRANSACTION tx_1",
        ]
    );
}

#[test]
fn prepared_commit_releases_local_transaction() {
    let config = DialectConfig::default();
    let coordinator = TransactionCoordinator::new(&config);
    let mut db = SessionExecutor::new();

    coordinator.begin_twophase(&mut db, "tx_1").unwrap();
    coordinator.prepare(&mut db, "tx_1").unwrap();
    coordinator.commit_twophase(&mut db, "tx_1", true, false).unwrap();
    assert!(!db.open);

    coordinator.begin_twophase(&mut db, "tx_2").unwrap();
    coordinator.prepare(&mut db, "tx_2").unwrap();
    coordinator.commit_twophase(&mut db, "tx_2", true, false).unwrap();

    assert_eq!(
        db.inner.sql_log(),
        vec![
            "BEGIN",
            "PREPARE COMMIT tx_1",
            "COMMIT TRANSACTION tx_1",
            "BEGIN",
            "PREPARE COMMIT tx_2",
            "COMMIT TRANSACTION tx_2",
        ]
    );
}

#[test]
fn session_executor_refuses_nested_begin() {
    let mut db = SessionExecutor::new();
    db.begin().unwrap();
    assert_eq!(
        db.begin().unwrap_err().message(),
        "a transaction is already open"
    );
}

#[test]
fn legacy_flag_rolls_back_after_prepared_commit() {
    let config = DialectConfig::default().with_legacy_twophase_rollback(true);
    let coordinator = TransactionCoordinator::new(&config);
    let mut db = ScriptedExecutor::new();

    coordinator.commit_twophase(&mut db, "tx_1", true, false).unwrap();

    assert_eq!(db.sql_log(), vec!["COMMIT TRANSACTION tx_1", "ROLLBACK"]);
}

#[test]
fn unprepared_commit_is_local() {
    let config = DialectConfig::default().with_legacy_twophase_rollback(true);
    let coordinator = TransactionCoordinator::new(&config);
    let mut db = ScriptedExecutor::new();

    coordinator.commit_twophase(&mut db, "tx_1", false, false).unwrap();

    assert_eq!(db.sql_log(), vec!["COMMIT"]);
}

#[test]
fn prepared_rollback_is_by_id_then_local() {
    let config = DialectConfig::default();
    let coordinator = TransactionCoordinator::new(&config);
    let mut db = ScriptedExecutor::new();

    coordinator.rollback_twophase(&mut db, "tx_9", true, true).unwrap();
    coordinator.rollback_twophase(&mut db, "tx_10", false, false).unwrap();

    assert_eq!(
        db.sql_log(),
        vec!["ROLLBACK TRANSACTION tx_9", "ROLLBACK", "ROLLBACK"]
    );
}

#[test]
fn invalid_xid_sends_nothing() {
    let config = DialectConfig::default();
    let coordinator = TransactionCoordinator::new(&config);
    let mut db = ScriptedExecutor::new();

    let err = coordinator
        .prepare(&mut db, "tx1; DROP TABLE users")
        .unwrap_err();
    assert!(matches!(err, Error::InvalidTransactionId(ref xid) if xid == "tx1; DROP TABLE users"));
    assert!(coordinator.begin_twophase(&mut db, "").is_err());
    assert!(coordinator.commit_twophase(&mut db, "a b", true, false).is_err());
    assert!(db.statements.is_empty());
}

#[test]
fn database_failure_is_propagated() {
    let config = DialectConfig::default();
    let coordinator = TransactionCoordinator::new(&config);
    let mut db = ScriptedExecutor::new().fail(
        "COMMIT TRANSACTION",
        "Transaction \"TX_2\" not found [90129-214]",
    );

    let err = coordinator
        .commit_twophase(&mut db, "tx_2", true, false)
        .unwrap_err();
    assert_eq!(err.error_code(), Some(90129));
}

#[test]
fn recover_lists_in_doubt_ids() {
    let config = DialectConfig::default();
    let coordinator = TransactionCoordinator::new(&config);
    let mut db = ScriptedExecutor::new().respond(
        IN_DOUBT,
        vec![
            row(vec![text("tx_1"), text("IN_DOUBT")]),
            row(vec![SqlValue::Int(42), text("IN_DOUBT")]),
        ],
    );

    assert_eq!(
        coordinator.recover_in_doubt(&mut db).unwrap(),
        vec!["tx_1".to_string(), "42".to_string()]
    );
}

#[test]
fn recover_rejects_null_ids() {
    let config = DialectConfig::default();
    let coordinator = TransactionCoordinator::new(&config);
    let mut db = ScriptedExecutor::new().respond(IN_DOUBT, vec![row(vec![SqlValue::Null])]);

    assert!(matches!(
        coordinator.recover_in_doubt(&mut db),
        Err(Error::UnexpectedRow { query: "IN_DOUBT", .. })
    ));
}
