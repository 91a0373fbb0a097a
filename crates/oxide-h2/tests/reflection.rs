//! Catalog reflection against a scripted executor.

mod common;

use common::{
    column_row, index_row, row, text, ScriptedExecutor, COLUMNS, FOREIGN_KEYS, HAS_TABLE,
    INDEXES, PK_COLUMNS, PK_NAME, TABLE_NAMES, VIEWS,
};
use oxide_h2::config::DialectConfig;
use oxide_h2::executor::SqlValue;
use oxide_h2::reflect::{
    ColumnDescriptor, ForeignKeyConstraint, IndexDescriptor, PrimaryKeyConstraint,
    ReflectionCache, Reflector,
};
use oxide_h2::{Error, PortableType};
use pretty_assertions::assert_eq;

const CHILD_FK: &str = "ALTER TABLE PUBLIC.CHILD ADD CONSTRAINT PUBLIC.FK_1 \
     FOREIGN KEY(PARENT_ID) INDEX PUBLIC.FK_1_INDEX_3 REFERENCES PUBLIC.PARENT(ID) NOCHECK";

const AUDIT_FK: &str = "ALTER TABLE PUBLIC.CHILD ADD CONSTRAINT PUBLIC.FK_AUDIT \
     FOREIGN KEY(AUDIT_ID, AUDIT_REV) REFERENCES AUDIT.\"EntryLog\"(ID, REV)";

fn child_table() -> ScriptedExecutor {
    ScriptedExecutor::new()
        .respond(
            COLUMNS,
            vec![
                column_row(
                    "ID",
                    "INTEGER",
                    Some("(NEXT VALUE FOR PUBLIC.SYSTEM_SEQUENCE_A1B2)"),
                    false,
                    false,
                    Some(10),
                ),
                column_row("PARENT_ID", "INTEGER", None, true, false, Some(10)),
                column_row("TITLE", "VARCHAR", Some("'untitled'"), true, false, Some(255)),
                column_row("LOCATION", "GEOMETRY", None, true, false, None),
            ],
        )
        .respond(PK_COLUMNS, vec![row(vec![text("ID")])])
        .respond(PK_NAME, vec![row(vec![text("CONSTRAINT_8")])])
        .respond(
            FOREIGN_KEYS,
            vec![
                row(vec![text("FK_1"), text(CHILD_FK)]),
                row(vec![text("FK_AUDIT"), text(AUDIT_FK)]),
            ],
        )
        .respond(
            INDEXES,
            vec![
                index_row("PRIMARY_KEY_8", false, "ID", "PRIMARY KEY"),
                index_row("IX_TITLE_PARENT", true, "TITLE", "INDEX"),
                index_row("IX_TITLE_PARENT", true, "PARENT_ID", "INDEX"),
            ],
        )
}

#[test]
fn get_columns_maps_types_and_identity() {
    let config = DialectConfig::default();
    let mut db = child_table();
    let reflection = Reflector::new(&config)
        .get_columns(&mut db, "child", None)
        .unwrap();

    assert_eq!(
        reflection.columns,
        vec![
            ColumnDescriptor {
                name: "id".into(),
                ty: PortableType::Integer,
                nullable: false,
                default: None,
                autoincrement: true,
            },
            ColumnDescriptor {
                name: "parent_id".into(),
                ty: PortableType::Integer,
                nullable: true,
                default: None,
                autoincrement: false,
            },
            ColumnDescriptor {
                name: "title".into(),
                ty: PortableType::Varchar(Some(255)),
                nullable: true,
                default: Some("'untitled'".into()),
                autoincrement: false,
            },
            ColumnDescriptor {
                name: "location".into(),
                ty: PortableType::Unknown,
                nullable: true,
                default: None,
                autoincrement: false,
            },
        ]
    );
    assert_eq!(reflection.warnings.len(), 1);
    assert_eq!(reflection.warnings[0].column, "location");
    assert_eq!(reflection.warnings[0].type_name, "GEOMETRY");
}

#[test]
fn plain_defaults_keep_catalog_autoincrement() {
    let config = DialectConfig::default();
    let mut db = ScriptedExecutor::new().respond(
        COLUMNS,
        vec![
            column_row("CODE", "VARCHAR", Some("'abc'"), false, true, Some(8)),
            column_row("QTY", "INTEGER", Some("0"), true, false, Some(10)),
            column_row("RATIO", "DOUBLE", Some("1.5"), true, false, None),
        ],
    );
    let reflection = Reflector::new(&config)
        .get_columns(&mut db, "stock", None)
        .unwrap();

    assert_eq!(
        reflection.columns,
        vec![
            ColumnDescriptor {
                name: "code".into(),
                ty: PortableType::Varchar(Some(8)),
                nullable: false,
                default: Some("'abc'".into()),
                autoincrement: true,
            },
            ColumnDescriptor {
                name: "qty".into(),
                ty: PortableType::Integer,
                nullable: true,
                default: Some("0".into()),
                autoincrement: false,
            },
            ColumnDescriptor {
                name: "ratio".into(),
                ty: PortableType::Decimal {
                    precision: Some(53),
                    scale: None,
                },
                nullable: true,
                default: Some("1.5".into()),
                autoincrement: false,
            },
        ]
    );
    assert!(reflection.warnings.is_empty());
}

#[test]
fn catalog_binds_are_denormalized() {
    let config = DialectConfig::default();
    let mut db = child_table();
    Reflector::new(&config)
        .get_columns(&mut db, "child", Some("sales"))
        .unwrap();

    let statement = &db.statements[0];
    assert_eq!(statement.param("table"), Some(&SqlValue::from("CHILD")));
    assert_eq!(statement.param("schema"), Some(&SqlValue::from("SALES")));
}

#[test]
fn mixed_case_names_are_bound_verbatim() {
    let config = DialectConfig::default();
    let mut db = ScriptedExecutor::new();
    Reflector::new(&config)
        .get_columns(&mut db, "MixedCase", None)
        .unwrap();

    assert_eq!(
        db.statements[0].param("table"),
        Some(&SqlValue::from("MixedCase"))
    );
}

#[test]
fn missing_table_reflects_empty() {
    let config = DialectConfig::default();
    let mut db = ScriptedExecutor::new();
    let reflector = Reflector::new(&config);

    assert!(reflector.get_columns(&mut db, "ghost", None).unwrap().columns.is_empty());
    assert_eq!(
        reflector.get_pk_constraint(&mut db, "ghost", None).unwrap(),
        PrimaryKeyConstraint::default()
    );
    assert!(reflector.get_foreign_keys(&mut db, "ghost", None).unwrap().is_empty());
    assert!(reflector.get_indexes(&mut db, "ghost", None, false).unwrap().is_empty());
    assert!(!reflector.table_exists(&mut db, "ghost", None).unwrap());
}

#[test]
fn get_pk_constraint_reads_name_and_columns() {
    let config = DialectConfig::default();
    let mut db = child_table();
    let pk = Reflector::new(&config)
        .get_pk_constraint(&mut db, "child", None)
        .unwrap();

    assert_eq!(
        pk,
        PrimaryKeyConstraint {
            name: Some("constraint_8".into()),
            constrained_columns: vec!["id".into()],
        }
    );
}

#[test]
fn get_foreign_keys_resolves_referred_schema() {
    let config = DialectConfig::default();
    let mut db = child_table();
    let fks = Reflector::new(&config)
        .get_foreign_keys(&mut db, "child", None)
        .unwrap();

    assert_eq!(
        fks,
        vec![
            ForeignKeyConstraint {
                name: "fk_1".into(),
                constrained_columns: vec!["parent_id".into()],
                referred_schema: None,
                referred_table: "parent".into(),
                referred_columns: vec!["id".into()],
            },
            ForeignKeyConstraint {
                name: "fk_audit".into(),
                constrained_columns: vec!["audit_id".into(), "audit_rev".into()],
                referred_schema: Some("audit".into()),
                referred_table: "EntryLog".into(),
                referred_columns: vec!["id".into(), "rev".into()],
            },
        ]
    );
}

#[test]
fn unqualified_reference_uses_the_table_schema() {
    let config = DialectConfig::default();
    let mut db = ScriptedExecutor::new().respond(
        FOREIGN_KEYS,
        vec![row(vec![
            text("FK_ORDERS"),
            text("ALTER TABLE SALES.LINES ADD CONSTRAINT FK_ORDERS FOREIGN KEY(ORDER_ID) REFERENCES ORDERS(ID)"),
        ])],
    );
    let fks = Reflector::new(&config)
        .get_foreign_keys(&mut db, "lines", Some("sales"))
        .unwrap();

    assert_eq!(fks[0].referred_schema.as_deref(), Some("sales"));
    assert_eq!(fks[0].referred_table, "orders");
}

#[test]
fn malformed_foreign_key_is_an_error() {
    let config = DialectConfig::default();
    let mut db = ScriptedExecutor::new().respond(
        FOREIGN_KEYS,
        vec![
            row(vec![text("FK_1"), text(CHILD_FK)]),
            row(vec![
                text("FK_BROKEN"),
                text("ALTER TABLE CHILD ADD CONSTRAINT FK_BROKEN FOREIGN KEY PARENT_ID REFERENCES PARENT(ID)"),
            ]),
        ],
    );
    let err = Reflector::new(&config)
        .get_foreign_keys(&mut db, "child", None)
        .unwrap_err();

    match err {
        Error::MalformedConstraint { constraint, source } => {
            assert_eq!(constraint, "FK_BROKEN");
            assert!(source.message.contains("Unexpected token"));
        }
        other => panic!("Expected MalformedConstraint, got {other:?}"),
    }
}

#[test]
fn get_indexes_skips_primary_key_by_default() {
    let config = DialectConfig::default();
    let mut db = child_table();
    let reflector = Reflector::new(&config);

    assert_eq!(
        reflector.get_indexes(&mut db, "child", None, false).unwrap(),
        vec![IndexDescriptor {
            name: "ix_title_parent".into(),
            column_names: vec!["title".into(), "parent_id".into()],
            unique: false,
        }]
    );

    let all = reflector.get_indexes(&mut db, "child", None, true).unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].name, "primary_key_8");
    assert!(all[0].unique);
}

#[test]
fn listings_are_normalized() {
    let config = DialectConfig::default();
    let mut db = ScriptedExecutor::new()
        .respond(
            TABLE_NAMES,
            vec![row(vec![text("ORDERS")]), row(vec![text("Order_Lines")])],
        )
        .respond(HAS_TABLE, vec![row(vec![text("ORDERS")])])
        .respond(VIEWS, vec![row(vec![text("ACTIVE_ORDERS")])]);
    let reflector = Reflector::new(&config);

    assert_eq!(
        reflector.list_tables(&mut db, None).unwrap(),
        vec!["orders".to_string(), "Order_Lines".to_string()]
    );
    assert!(reflector.table_exists(&mut db, "orders", None).unwrap());
    assert_eq!(
        reflector.list_views(&mut db, Some("reporting")).unwrap(),
        vec!["active_orders".to_string()]
    );

    let views_query = db.statements.last().unwrap();
    assert!(views_query.sql.contains("TABLE_SCHEMA=:schema"));
    assert_eq!(views_query.param("schema"), Some(&SqlValue::from("REPORTING")));
}

#[test]
fn view_definition_is_returned_verbatim() {
    let config = DialectConfig::default();
    let mut db = ScriptedExecutor::new().respond(
        VIEWS,
        vec![row(vec![text("SELECT ID FROM PUBLIC.ORDERS WHERE ACTIVE")])],
    );
    let definition = Reflector::new(&config)
        .view_definition(&mut db, "active_orders", None)
        .unwrap();

    assert_eq!(
        definition.as_deref(),
        Some("SELECT ID FROM PUBLIC.ORDERS WHERE ACTIVE")
    );
    assert_eq!(
        db.statements[0].param("view"),
        Some(&SqlValue::from("ACTIVE_ORDERS"))
    );
}

#[test]
fn reflect_table_assembles_everything() {
    let config = DialectConfig::default();
    let mut db = child_table();
    let table = Reflector::new(&config)
        .reflect_table(&mut db, "child", None)
        .unwrap();

    assert_eq!(table.name, "child");
    assert_eq!(table.schema, None);
    assert_eq!(table.columns.len(), 4);
    assert_eq!(table.warnings.len(), 1);
    assert_eq!(table.primary_key.constrained_columns, vec!["id".to_string()]);
    assert_eq!(table.foreign_keys.len(), 2);
    assert_eq!(table.indexes.len(), 1);

    let json = serde_json::to_value(&table).unwrap();
    assert_eq!(json["columns"][0]["type"]["kind"], "integer");
    assert_eq!(json["columns"][3]["type"]["kind"], "unknown");
}

#[test]
fn reflect_table_keeps_non_default_schema() {
    let config = DialectConfig::default();
    let mut db = child_table();
    let table = Reflector::new(&config)
        .reflect_table(&mut db, "child", Some("archive"))
        .unwrap();

    assert_eq!(table.schema.as_deref(), Some("archive"));
}

#[test]
fn cache_answers_repeat_lookups() {
    let config = DialectConfig::default();
    let cache = ReflectionCache::new();
    let mut db = child_table();
    let reflector = Reflector::new(&config).with_cache(&cache);

    let first = reflector.get_columns(&mut db, "child", None).unwrap();
    let second = reflector.get_columns(&mut db, "child", None).unwrap();

    assert_eq!(first, second);
    assert_eq!(db.count(COLUMNS), 1);
    let stats = cache.stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);

    cache.invalidate_table("child", Some("public"));
    reflector.get_columns(&mut db, "child", None).unwrap();
    assert_eq!(db.count(COLUMNS), 2);
}

#[test]
fn cache_keeps_index_variants_apart() {
    let config = DialectConfig::default();
    let cache = ReflectionCache::new();
    let mut db = child_table();
    let reflector = Reflector::new(&config).with_cache(&cache);

    let without = reflector.get_indexes(&mut db, "child", None, false).unwrap();
    let with = reflector.get_indexes(&mut db, "child", None, true).unwrap();

    assert_eq!(without.len(), 1);
    assert_eq!(with.len(), 2);
    assert_eq!(db.count(INDEXES), 2);
}

#[test]
fn cache_disabled_by_config() {
    let config = DialectConfig::default().with_cache_reflection(false);
    let cache = ReflectionCache::new();
    let mut db = child_table();
    let reflector = Reflector::new(&config).with_cache(&cache);

    reflector.get_columns(&mut db, "child", None).unwrap();
    reflector.get_columns(&mut db, "child", None).unwrap();

    assert_eq!(db.count(COLUMNS), 2);
    assert!(cache.is_empty());
}

#[test]
fn failed_lookup_is_not_cached() {
    let config = DialectConfig::default();
    let cache = ReflectionCache::new();
    let mut db = ScriptedExecutor::new().fail(COLUMNS, "connection lost [90067-214]");
    let reflector = Reflector::new(&config).with_cache(&cache);

    let err = reflector.get_columns(&mut db, "child", None).unwrap_err();
    assert_eq!(err.error_code(), Some(90067));
    assert!(cache.is_empty());
}

#[test]
fn ascii_only_binds_reject_unicode_names() {
    let config = DialectConfig::default().with_unicode_binds(false);
    let mut db = ScriptedExecutor::new();
    let err = Reflector::new(&config)
        .get_columns(&mut db, "bücher", None)
        .unwrap_err();

    assert!(matches!(err, Error::Config(_)));
    assert!(db.statements.is_empty());
}

#[test]
fn configured_default_schema_is_used() {
    let config = DialectConfig::default().with_default_schema("APP");
    let mut db = ScriptedExecutor::new();
    Reflector::new(&config).list_tables(&mut db, None).unwrap();

    assert_eq!(db.statements[0].param("schema"), Some(&SqlValue::from("APP")));
}
