//! Catalog reflection.
//!
//! [`Reflector`] reads H2's `INFORMATION_SCHEMA` views and returns normalized
//! descriptors. Each operation resolves the schema first (falling back to
//! [`DialectConfig::default_schema`]), issues its queries one after another
//! and assembles results in the order the database returns them.
//!
//! Names passed in are in normalized form and are denormalized before being
//! bound; names coming back are normalized. Missing tables produce empty
//! results, not errors.

mod cache;
pub mod constraint;
mod descriptors;
pub(crate) mod queries;

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

pub use cache::{CacheKey, CacheStats, Cacheable, CachedValue, ReflectionCache};
pub use constraint::{parse_foreign_key, ConstraintParseError, ParsedForeignKey};
pub use descriptors::{
    ColumnDescriptor, ColumnReflection, ForeignKeyConstraint, IndexDescriptor,
    PrimaryKeyConstraint, TableReflection,
};

use crate::config::DialectConfig;
use crate::error::{Error, Result};
use crate::executor::{BoundStatement, Executor, Row};
use crate::identifier::{denormalize_name, normalize_name};
use crate::types::resolve_column_type;

/// Default expression H2 gives identity columns.
static SYSTEM_SEQUENCE_DEFAULT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"NEXT VALUE FOR .*\.SYSTEM_SEQUENCE_.*").expect("valid system sequence pattern")
});

/// Returns whether a column default is H2's generated identity sequence.
#[must_use]
pub fn is_system_sequence_default(default: &str) -> bool {
    SYSTEM_SEQUENCE_DEFAULT.is_match(default)
}

/// Reads schema metadata from an H2 catalog.
#[derive(Debug, Clone, Copy)]
pub struct Reflector<'a> {
    config: &'a DialectConfig,
    cache: Option<&'a ReflectionCache>,
}

impl<'a> Reflector<'a> {
    /// Creates a reflector without a cache.
    #[must_use]
    pub const fn new(config: &'a DialectConfig) -> Self {
        Self {
            config,
            cache: None,
        }
    }

    /// Memoizes results in `cache` (when the configuration allows it).
    #[must_use]
    pub const fn with_cache(mut self, cache: &'a ReflectionCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Same as [`with_cache`](Self::with_cache), for an optional handle.
    #[must_use]
    pub const fn with_optional_cache(mut self, cache: Option<&'a ReflectionCache>) -> Self {
        self.cache = cache;
        self
    }

    /// The configuration in use.
    #[must_use]
    pub const fn config(&self) -> &DialectConfig {
        self.config
    }

    /// Resolves an optional schema to its normalized name.
    #[must_use]
    pub fn resolve_schema(&self, schema: Option<&str>) -> String {
        schema.map_or_else(|| self.config.normalized_default_schema(), str::to_string)
    }

    fn cached<T, F>(&self, key: CacheKey, compute: F) -> Result<T>
    where
        T: Cacheable + Clone,
        F: FnOnce() -> Result<T>,
    {
        match self.cache {
            Some(cache) if self.config.cache_reflection => cache.get_or_try_insert_with(key, compute),
            _ => compute(),
        }
    }

    /// Adds a bind value for a normalized name.
    fn bind_name(&self, statement: BoundStatement, param: &str, name: &str) -> Result<BoundStatement> {
        let raw = denormalize_name(name);
        self.config.check_bind_text(&raw)?;
        Ok(statement.bind(param, raw))
    }

    fn table_query(&self, sql: &str, table: &str, schema: &str) -> Result<BoundStatement> {
        let statement = self.bind_name(BoundStatement::new(sql), "table", table)?;
        self.bind_name(statement, "schema", schema)
    }

    fn fetch<E: Executor + ?Sized>(executor: &mut E, statement: &BoundStatement) -> Result<Vec<Row>> {
        debug!(sql = %statement.sql, "catalog query");
        Ok(executor.fetch_all(statement)?)
    }

    fn name_column(rows: Vec<Row>, query: &'static str) -> Result<Vec<String>> {
        rows.iter()
            .map(|row| required_text(row, 0, query).map(normalize_name))
            .collect()
    }

    /// Lists every schema, in catalog order.
    pub fn list_schemas<E: Executor + ?Sized>(&self, executor: &mut E) -> Result<Vec<String>> {
        self.cached(CacheKey::listing("list_schemas", ""), || {
            let rows = Self::fetch(executor, &BoundStatement::new(queries::SCHEMA_NAMES))?;
            Self::name_column(rows, "SCHEMATA")
        })
    }

    /// Returns whether a base table exists.
    pub fn table_exists<E: Executor + ?Sized>(
        &self,
        executor: &mut E,
        table: &str,
        schema: Option<&str>,
    ) -> Result<bool> {
        let schema = self.resolve_schema(schema);
        self.cached(CacheKey::object("table_exists", &schema, table), || {
            let statement = self.table_query(queries::HAS_TABLE, table, &schema)?;
            debug!(sql = %statement.sql, "catalog query");
            Ok(executor.fetch_optional(&statement)?.is_some())
        })
    }

    /// Returns whether a sequence exists.
    pub fn sequence_exists<E: Executor + ?Sized>(
        &self,
        executor: &mut E,
        sequence: &str,
        schema: Option<&str>,
    ) -> Result<bool> {
        let schema = self.resolve_schema(schema);
        self.cached(CacheKey::object("sequence_exists", &schema, sequence), || {
            let statement = self.bind_name(BoundStatement::new(queries::HAS_SEQUENCE), "schema", &schema)?;
            let statement = self.bind_name(statement, "sequence", sequence)?;
            debug!(sql = %statement.sql, "catalog query");
            Ok(executor.fetch_optional(&statement)?.is_some())
        })
    }

    /// Lists base tables of a schema, sorted by name.
    pub fn list_tables<E: Executor + ?Sized>(
        &self,
        executor: &mut E,
        schema: Option<&str>,
    ) -> Result<Vec<String>> {
        let schema = self.resolve_schema(schema);
        self.cached(CacheKey::listing("list_tables", &schema), || {
            let statement = self.bind_name(BoundStatement::new(queries::TABLE_NAMES), "schema", &schema)?;
            let rows = Self::fetch(executor, &statement)?;
            Self::name_column(rows, "TABLES")
        })
    }

    /// Lists views of a schema.
    pub fn list_views<E: Executor + ?Sized>(
        &self,
        executor: &mut E,
        schema: Option<&str>,
    ) -> Result<Vec<String>> {
        let schema = self.resolve_schema(schema);
        self.cached(CacheKey::listing("list_views", &schema), || {
            let statement = self.bind_name(BoundStatement::new(queries::VIEW_NAMES), "schema", &schema)?;
            let rows = Self::fetch(executor, &statement)?;
            Self::name_column(rows, "VIEWS")
        })
    }

    /// Returns the SQL that defines a view, or `None` if there is no such
    /// view.
    pub fn view_definition<E: Executor + ?Sized>(
        &self,
        executor: &mut E,
        view: &str,
        schema: Option<&str>,
    ) -> Result<Option<String>> {
        let schema = self.resolve_schema(schema);
        self.cached(CacheKey::object("view_definition", &schema, view), || {
            let statement = self.bind_name(BoundStatement::new(queries::VIEW_DEFINITION), "view", view)?;
            let statement = self.bind_name(statement, "schema", &schema)?;
            let rows = Self::fetch(executor, &statement)?;
            Ok(rows.first().and_then(|row| row.text(0)).map(str::to_string))
        })
    }

    /// Reflects the columns of a table, in catalog order.
    ///
    /// Columns with unrecognized native types are returned with
    /// [`PortableType::Unknown`](crate::types::PortableType::Unknown) and a
    /// matching entry in [`ColumnReflection::warnings`].
    pub fn get_columns<E: Executor + ?Sized>(
        &self,
        executor: &mut E,
        table: &str,
        schema: Option<&str>,
    ) -> Result<ColumnReflection> {
        let schema = self.resolve_schema(schema);
        self.cached(CacheKey::object("get_columns", &schema, table), || {
            let statement = self.table_query(queries::COLUMNS, table, &schema)?;
            let rows = Self::fetch(executor, &statement)?;
            let mut reflection = ColumnReflection::default();
            for row in &rows {
                let (column, warning) = column_from_row(row)?;
                reflection.columns.push(column);
                reflection.warnings.extend(warning);
            }
            Ok(reflection)
        })
    }

    /// Returns the primary-key columns of a table, in key order.
    pub fn primary_key_columns<E: Executor + ?Sized>(
        &self,
        executor: &mut E,
        table: &str,
        schema: Option<&str>,
    ) -> Result<Vec<String>> {
        let schema = self.resolve_schema(schema);
        self.cached(CacheKey::object("get_primary_keys", &schema, table), || {
            let statement = self.table_query(queries::PRIMARY_KEY_COLUMNS, table, &schema)?;
            let rows = Self::fetch(executor, &statement)?;
            Self::name_column(rows, "INDEXES")
        })
    }

    /// Returns the primary-key constraint of a table.
    ///
    /// A table without a primary key yields no columns and no name.
    pub fn get_pk_constraint<E: Executor + ?Sized>(
        &self,
        executor: &mut E,
        table: &str,
        schema: Option<&str>,
    ) -> Result<PrimaryKeyConstraint> {
        let schema = self.resolve_schema(schema);
        let constrained_columns = self.primary_key_columns(executor, table, Some(&schema))?;
        self.cached(CacheKey::object("get_pk_constraint", &schema, table), || {
            let statement = self.table_query(queries::PRIMARY_KEY_NAME, table, &schema)?;
            debug!(sql = %statement.sql, "catalog query");
            let name = executor
                .fetch_optional(&statement)?
                .and_then(|row| row.text(0).map(normalize_name));
            Ok(PrimaryKeyConstraint {
                name,
                constrained_columns,
            })
        })
    }

    /// Returns the foreign keys of a table.
    ///
    /// # Errors
    ///
    /// [`Error::MalformedConstraint`] when a definition cannot be parsed; no
    /// partial result is returned.
    pub fn get_foreign_keys<E: Executor + ?Sized>(
        &self,
        executor: &mut E,
        table: &str,
        schema: Option<&str>,
    ) -> Result<Vec<ForeignKeyConstraint>> {
        let schema = self.resolve_schema(schema);
        let default_schema = self.config.normalized_default_schema();
        self.cached(CacheKey::object("get_foreign_keys", &schema, table), || {
            let statement = self.table_query(queries::FOREIGN_KEYS, table, &schema)?;
            let rows = Self::fetch(executor, &statement)?;
            rows.iter()
                .map(|row| {
                    let name = required_text(row, 0, "CONSTRAINTS")?;
                    let definition = required_text(row, 1, "CONSTRAINTS")?;
                    let parsed =
                        parse_foreign_key(definition).map_err(|source| Error::MalformedConstraint {
                            constraint: name.to_string(),
                            source,
                        })?;
                    let referred_schema = parsed
                        .referred_schema
                        .as_deref()
                        .map_or_else(|| schema.clone(), normalize_name);
                    Ok(ForeignKeyConstraint {
                        name: normalize_name(name),
                        constrained_columns: normalize_all(&parsed.constrained_columns),
                        referred_schema: (referred_schema != default_schema)
                            .then_some(referred_schema),
                        referred_table: normalize_name(&parsed.referred_table),
                        referred_columns: normalize_all(&parsed.referred_columns),
                    })
                })
                .collect()
        })
    }

    /// Returns the indexes of a table.
    ///
    /// Rows are grouped by index name; column order follows row order. The
    /// index backing the primary key is skipped unless
    /// `include_auto_indexes` is set.
    pub fn get_indexes<E: Executor + ?Sized>(
        &self,
        executor: &mut E,
        table: &str,
        schema: Option<&str>,
        include_auto_indexes: bool,
    ) -> Result<Vec<IndexDescriptor>> {
        let schema = self.resolve_schema(schema);
        let key = CacheKey::object("get_indexes", &schema, table)
            .with_flags(u8::from(include_auto_indexes));
        self.cached(key, || {
            let statement = self.table_query(queries::INDEXES, table, &schema)?;
            let rows = Self::fetch(executor, &statement)?;
            group_indexes(&rows, include_auto_indexes)
        })
    }

    /// Reflects everything about one table.
    pub fn reflect_table<E: Executor + ?Sized>(
        &self,
        executor: &mut E,
        table: &str,
        schema: Option<&str>,
    ) -> Result<TableReflection> {
        let resolved = self.resolve_schema(schema);
        let ColumnReflection { columns, warnings } =
            self.get_columns(executor, table, Some(&resolved))?;
        let primary_key = self.get_pk_constraint(executor, table, Some(&resolved))?;
        let foreign_keys = self.get_foreign_keys(executor, table, Some(&resolved))?;
        let indexes = self.get_indexes(executor, table, Some(&resolved), false)?;
        info!(
            table,
            schema = %resolved,
            columns = columns.len(),
            foreign_keys = foreign_keys.len(),
            indexes = indexes.len(),
            "reflected table"
        );
        let schema = (resolved != self.config.normalized_default_schema()).then_some(resolved);
        Ok(TableReflection {
            name: table.to_string(),
            schema,
            columns,
            warnings,
            primary_key,
            foreign_keys,
            indexes,
        })
    }
}

fn normalize_all(names: &[String]) -> Vec<String> {
    names.iter().map(|n| normalize_name(n)).collect()
}

fn required_text<'r>(row: &'r Row, index: usize, query: &'static str) -> Result<&'r str> {
    row.text(index).ok_or_else(|| Error::UnexpectedRow {
        query,
        message: format!("column {index} is missing or not text"),
    })
}

fn column_from_row(row: &Row) -> Result<(ColumnDescriptor, Option<crate::types::TypeWarning>)> {
    let raw_name = required_text(row, 0, "COLUMNS")?;
    let type_name = required_text(row, 1, "COLUMNS")?;
    let mut default = row.text(2).map(str::to_string);
    let nullable = row.text(3) == Some("YES");
    let mut autoincrement = row.get(4).and_then(|v| v.as_bool()).unwrap_or(false);
    let char_length = row
        .get(5)
        .and_then(|v| v.as_i64())
        .and_then(|n| u32::try_from(n).ok());

    if default.as_deref().is_some_and(is_system_sequence_default) {
        default = None;
        autoincrement = true;
    }

    let name = normalize_name(raw_name);
    let (ty, warning) = resolve_column_type(&name, type_name, char_length);
    Ok((
        ColumnDescriptor {
            name,
            ty,
            nullable,
            default,
            autoincrement,
        },
        warning,
    ))
}

fn group_indexes(rows: &[Row], include_auto_indexes: bool) -> Result<Vec<IndexDescriptor>> {
    let mut indexes: Vec<IndexDescriptor> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for row in rows {
        let index_type = row.text(3);
        if !include_auto_indexes && index_type == Some(queries::PRIMARY_KEY_INDEX_TYPE) {
            continue;
        }
        let name = normalize_name(required_text(row, 0, "INDEXES")?);
        let non_unique = row
            .get(1)
            .and_then(|v| v.as_bool())
            .ok_or_else(|| Error::UnexpectedRow {
                query: "INDEXES",
                message: format!("NON_UNIQUE is not a boolean for index {name}"),
            })?;
        let column = normalize_name(required_text(row, 2, "INDEXES")?);

        let position = *positions.entry(name.clone()).or_insert_with(|| {
            indexes.push(IndexDescriptor {
                name,
                column_names: Vec::new(),
                unique: !non_unique,
            });
            indexes.len() - 1
        });
        let index = &mut indexes[position];
        index.column_names.push(column);
        index.unique = !non_unique;
    }
    Ok(indexes)
}
