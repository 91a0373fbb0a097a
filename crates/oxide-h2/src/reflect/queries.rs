//! Information-schema queries.
//!
//! Bind parameters use `:name` placeholders and always carry denormalized
//! text.

pub(crate) const SCHEMA_NAMES: &str = "SELECT SCHEMA_NAME FROM INFORMATION_SCHEMA.SCHEMATA";

pub(crate) const TABLE_NAMES: &str = "SELECT table_name FROM information_schema.tables \
     WHERE table_type='TABLE' AND table_schema=:schema \
     ORDER BY table_name";

pub(crate) const HAS_TABLE: &str = "SELECT table_name FROM information_schema.tables \
     WHERE table_type='TABLE' AND table_schema=:schema \
     AND table_name=:table";

pub(crate) const HAS_SEQUENCE: &str = "SELECT sequence_name FROM information_schema.sequences \
     WHERE sequence_schema=:schema \
     AND sequence_name=:sequence";

pub(crate) const VIEW_NAMES: &str = "SELECT TABLE_NAME FROM INFORMATION_SCHEMA.VIEWS \
     WHERE TABLE_SCHEMA=:schema";

pub(crate) const VIEW_DEFINITION: &str = "SELECT VIEW_DEFINITION FROM INFORMATION_SCHEMA.VIEWS \
     WHERE TABLE_NAME=:view AND TABLE_SCHEMA=:schema";

/// Columns joined with `TYPE_INFO` to learn whether the type can
/// auto-increment.
pub(crate) const COLUMNS: &str = "SELECT C.COLUMN_NAME, C.TYPE_NAME, C.COLUMN_DEFAULT, C.IS_NULLABLE, \
     (SELECT T.AUTO_INCREMENT FROM INFORMATION_SCHEMA.TYPE_INFO T \
     WHERE T.DATA_TYPE = C.DATA_TYPE AND T.TYPE_NAME = C.TYPE_NAME) AS AUTO_INCREMENT, \
     C.CHARACTER_MAXIMUM_LENGTH \
     FROM INFORMATION_SCHEMA.COLUMNS C \
     WHERE TABLE_NAME=:table AND TABLE_SCHEMA=:schema";

pub(crate) const PRIMARY_KEY_COLUMNS: &str = "SELECT COLUMN_NAME FROM INFORMATION_SCHEMA.INDEXES \
     WHERE PRIMARY_KEY = 'TRUE' AND TABLE_NAME=:table AND TABLE_SCHEMA=:schema";

pub(crate) const PRIMARY_KEY_NAME: &str = "SELECT CONSTRAINT_NAME FROM INFORMATION_SCHEMA.CONSTRAINTS \
     WHERE TABLE_NAME=:table AND TABLE_SCHEMA=:schema \
     AND CONSTRAINT_TYPE = 'PRIMARY_KEY'";

pub(crate) const FOREIGN_KEYS: &str = "SELECT CONSTRAINT_NAME, SQL AS condef FROM INFORMATION_SCHEMA.CONSTRAINTS \
     WHERE TABLE_NAME=:table AND TABLE_SCHEMA=:schema \
     AND CONSTRAINT_TYPE = 'REFERENTIAL'";

pub(crate) const INDEXES: &str = "SELECT INDEX_NAME, NON_UNIQUE, COLUMN_NAME, INDEX_TYPE_NAME \
     FROM INFORMATION_SCHEMA.INDEXES \
     WHERE TABLE_NAME=:table AND TABLE_SCHEMA=:schema";

pub(crate) const IN_DOUBT: &str = "SELECT * FROM INFORMATION_SCHEMA.IN_DOUBT";

/// Index-type label H2 gives the index backing a primary key.
pub(crate) const PRIMARY_KEY_INDEX_TYPE: &str = "PRIMARY KEY";
