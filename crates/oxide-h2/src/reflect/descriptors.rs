//! Reflected catalog descriptors.
//!
//! All names in these types are in normalized (caller-facing) form.

use serde::{Deserialize, Serialize};

use crate::types::{PortableType, TypeWarning};

/// A reflected column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Column name.
    pub name: String,
    /// Portable type; [`PortableType::Unknown`] for unrecognized native types.
    #[serde(rename = "type")]
    pub ty: PortableType,
    /// Whether NULL is allowed.
    pub nullable: bool,
    /// Default expression text, as the catalog reports it.
    pub default: Option<String>,
    /// Whether values are generated by the database.
    pub autoincrement: bool,
}

/// A table's primary key.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PrimaryKeyConstraint {
    /// Constraint name, when the table has one.
    pub name: Option<String>,
    /// Key columns, in key order. Empty when the table has no primary key.
    pub constrained_columns: Vec<String>,
}

/// A foreign key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyConstraint {
    /// Constraint name.
    pub name: String,
    /// Local columns, in order.
    pub constrained_columns: Vec<String>,
    /// Schema of the referenced table; `None` when it is the default schema.
    pub referred_schema: Option<String>,
    /// Referenced table.
    pub referred_table: String,
    /// Referenced columns, in order.
    pub referred_columns: Vec<String>,
}

/// An index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDescriptor {
    /// Index name.
    pub name: String,
    /// Indexed columns in index order.
    pub column_names: Vec<String>,
    /// Whether the index enforces uniqueness.
    pub unique: bool,
}

/// Columns of a table plus the diagnostics raised while mapping their types.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ColumnReflection {
    /// Columns in catalog order.
    pub columns: Vec<ColumnDescriptor>,
    /// One entry per column whose native type was not recognized.
    pub warnings: Vec<TypeWarning>,
}

/// Everything reflected about one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableReflection {
    /// Table name.
    pub name: String,
    /// Schema, `None` for the default schema.
    pub schema: Option<String>,
    /// Columns in catalog order.
    pub columns: Vec<ColumnDescriptor>,
    /// Unrecognized-type diagnostics.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<TypeWarning>,
    /// Primary key.
    pub primary_key: PrimaryKeyConstraint,
    /// Foreign keys.
    pub foreign_keys: Vec<ForeignKeyConstraint>,
    /// Indexes, excluding the primary key's backing index.
    pub indexes: Vec<IndexDescriptor>,
}
