//! DDL compiler.
//!
//! Renders [`DdlStatement`] trees into H2 DDL text. Column specifications
//! follow `<name> <type> [DEFAULT <expr>] [NOT NULL] [AUTO_INCREMENT]`, where
//! `AUTO_INCREMENT` goes only on the table's auto-increment primary-key
//! column (see [`CreateTable::autoincrement_column`]).

use crate::ast::{
    AutoIncrement, ColumnDef, ColumnDefault, CreateIndex, CreateTable, DdlStatement,
    ForeignKeyDef,
};
use crate::identifier::{format_identifier, format_sequence, format_table};
use crate::reflect::TableReflection;

/// Compiles DDL trees to H2 SQL.
#[derive(Debug, Default, Clone, Copy)]
pub struct DdlCompiler;

impl DdlCompiler {
    /// Creates a DDL compiler.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Generates SQL for any DDL statement.
    #[must_use]
    pub fn generate_sql(&self, statement: &DdlStatement) -> String {
        match statement {
            DdlStatement::CreateTable(table) => self.create_table(table),
            DdlStatement::DropTable {
                schema,
                name,
                if_exists,
            } => {
                let mut sql = String::from("DROP TABLE ");
                if *if_exists {
                    sql.push_str("IF EXISTS ");
                }
                sql.push_str(&format_table(schema.as_deref(), name));
                sql
            }
            DdlStatement::CreateIndex(index) => self.create_index(index),
            DdlStatement::DropIndex { schema, name } => {
                format!("DROP INDEX {}", format_table(schema.as_deref(), name))
            }
            DdlStatement::CreateSequence {
                schema,
                name,
                start,
                increment,
            } => {
                let mut sql = format!("CREATE SEQUENCE {}", format_sequence(schema.as_deref(), name));
                if let Some(start) = start {
                    sql.push_str(&format!(" START WITH {start}"));
                }
                if let Some(increment) = increment {
                    sql.push_str(&format!(" INCREMENT BY {increment}"));
                }
                sql
            }
            DdlStatement::DropSequence { schema, name } => {
                format!("DROP SEQUENCE {}", format_sequence(schema.as_deref(), name))
            }
            DdlStatement::AddForeignKey {
                schema,
                table,
                foreign_key,
            } => format!(
                "ALTER TABLE {} ADD {}",
                format_table(schema.as_deref(), table),
                self.foreign_key_clause(foreign_key)
            ),
            DdlStatement::DropConstraint {
                schema,
                table,
                name,
            } => format!(
                "ALTER TABLE {} DROP CONSTRAINT {}",
                format_table(schema.as_deref(), table),
                format_identifier(name)
            ),
        }
    }

    /// Generates SQL for CREATE TABLE.
    #[must_use]
    pub fn create_table(&self, table: &CreateTable) -> String {
        let mut sql = String::from("CREATE TABLE ");
        if table.if_not_exists {
            sql.push_str("IF NOT EXISTS ");
        }
        sql.push_str(&format_table(table.schema.as_deref(), &table.name));
        sql.push_str(" (\n");

        let autoincrement = table.autoincrement_column().map(|c| c.name.as_str());
        let mut parts: Vec<String> = table
            .columns
            .iter()
            .map(|c| self.column_specification(c, autoincrement == Some(c.name.as_str())))
            .collect();

        let pk: Vec<&str> = table.primary_key_columns().map(|c| c.name.as_str()).collect();
        if !pk.is_empty() {
            parts.push(format!("PRIMARY KEY ({})", column_list(pk)));
        }
        for column in table.columns.iter().filter(|c| c.unique) {
            parts.push(format!("UNIQUE ({})", format_identifier(&column.name)));
        }
        for columns in &table.unique_constraints {
            parts.push(format!(
                "UNIQUE ({})",
                column_list(columns.iter().map(String::as_str))
            ));
        }
        for fk in &table.foreign_keys {
            parts.push(self.foreign_key_clause(fk));
        }

        let body: Vec<String> = parts.into_iter().map(|p| format!("    {p}")).collect();
        sql.push_str(&body.join(",\n"));
        sql.push_str("\n)");
        sql
    }

    /// Renders one column specification.
    #[must_use]
    pub fn column_specification(&self, column: &ColumnDef, autoincrement: bool) -> String {
        let mut sql = format!("{} {}", format_identifier(&column.name), column.ty.to_sql());
        if let Some(ref default) = column.default {
            sql.push_str(" DEFAULT ");
            sql.push_str(&default.to_sql());
        }
        if !column.nullable {
            sql.push_str(" NOT NULL");
        }
        if autoincrement {
            sql.push_str(" AUTO_INCREMENT");
        }
        sql
    }

    /// Generates SQL for CREATE INDEX.
    #[must_use]
    pub fn create_index(&self, index: &CreateIndex) -> String {
        let mut sql = String::from("CREATE ");
        if index.unique {
            sql.push_str("UNIQUE ");
        }
        sql.push_str("INDEX ");
        sql.push_str(&format_identifier(&index.name));
        sql.push_str(" ON ");
        sql.push_str(&format_table(index.schema.as_deref(), &index.table));
        sql.push_str(" (");
        sql.push_str(&column_list(index.columns.iter().map(String::as_str)));
        sql.push(')');
        sql
    }

    fn foreign_key_clause(&self, fk: &ForeignKeyDef) -> String {
        let mut sql = String::new();
        if let Some(ref name) = fk.name {
            sql.push_str(&format!("CONSTRAINT {} ", format_identifier(name)));
        }
        sql.push_str(&format!(
            "FOREIGN KEY ({}) REFERENCES {} ({})",
            column_list(fk.columns.iter().map(String::as_str)),
            format_table(fk.referred_schema.as_deref(), &fk.referred_table),
            column_list(fk.referred_columns.iter().map(String::as_str)),
        ));
        if let Some(action) = fk.on_delete {
            sql.push_str(" ON DELETE ");
            sql.push_str(action.as_sql());
        }
        if let Some(action) = fk.on_update {
            sql.push_str(" ON UPDATE ");
            sql.push_str(action.as_sql());
        }
        sql
    }
}

/// Rebuilds the statements that recreate a reflected table: the CREATE TABLE
/// followed by one CREATE INDEX per reflected index.
///
/// Reflected defaults are carried over verbatim. Columns of unknown type
/// keep their `NULL` type spelling.
#[must_use]
pub fn recreate_table(table: &TableReflection) -> Vec<DdlStatement> {
    let pk = &table.primary_key.constrained_columns;
    let mut create = CreateTable::new(table.name.clone());
    create.schema.clone_from(&table.schema);

    for column in &table.columns {
        let mut def = ColumnDef::new(column.name.clone(), column.ty.clone());
        if pk.contains(&column.name) {
            def = def.primary_key();
        } else if !column.nullable {
            def = def.not_null();
        }
        if let Some(ref default) = column.default {
            def = def.default_value(ColumnDefault::Expression(default.clone()));
        }
        def = def.autoincrement(if column.autoincrement {
            AutoIncrement::Yes
        } else {
            AutoIncrement::No
        });
        create = create.column(def);
    }

    for fk in &table.foreign_keys {
        create = create.foreign_key(ForeignKeyDef {
            name: Some(fk.name.clone()),
            columns: fk.constrained_columns.clone(),
            referred_schema: fk.referred_schema.clone(),
            referred_table: fk.referred_table.clone(),
            referred_columns: fk.referred_columns.clone(),
            on_delete: None,
            on_update: None,
        });
    }

    let mut statements = vec![DdlStatement::CreateTable(create)];
    statements.extend(table.indexes.iter().map(|index| {
        DdlStatement::CreateIndex(CreateIndex {
            name: index.name.clone(),
            schema: table.schema.clone(),
            table: table.name.clone(),
            columns: index.column_names.clone(),
            unique: index.unique,
        })
    }));
    statements
}

fn column_list<'a>(columns: impl IntoIterator<Item = &'a str>) -> String {
    columns
        .into_iter()
        .map(format_identifier)
        .collect::<Vec<_>>()
        .join(", ")
}
