//! DDL construct trees.

use crate::types::PortableType;

/// Referential action for foreign keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferentialAction {
    /// No action.
    NoAction,
    /// Restrict deletion/update.
    Restrict,
    /// Cascade the operation.
    Cascade,
    /// Set to NULL.
    SetNull,
    /// Set to default value.
    SetDefault,
}

impl ReferentialAction {
    /// Returns the SQL representation of the action.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::NoAction => "NO ACTION",
            Self::Restrict => "RESTRICT",
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
            Self::SetDefault => "SET DEFAULT",
        }
    }
}

/// A column's server-side default.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnDefault {
    /// NULL default.
    Null,
    /// Boolean default.
    Boolean(bool),
    /// Integer default.
    Integer(i64),
    /// String default, rendered as a quoted literal.
    String(String),
    /// Raw SQL expression, rendered verbatim.
    Expression(String),
}

impl ColumnDefault {
    /// Returns the SQL text of the default.
    #[must_use]
    pub fn to_sql(&self) -> String {
        match self {
            Self::Null => String::from("NULL"),
            Self::Boolean(true) => String::from("TRUE"),
            Self::Boolean(false) => String::from("FALSE"),
            Self::Integer(i) => i.to_string(),
            Self::String(s) => format!("'{}'", s.replace('\'', "''")),
            Self::Expression(expr) => expr.clone(),
        }
    }
}

/// Whether a column should be generated by the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AutoIncrement {
    /// Decide from the column shape: a lone integer primary key with no
    /// default.
    #[default]
    Auto,
    /// Always generate.
    Yes,
    /// Never generate.
    No,
}

/// A column in a CREATE TABLE.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    /// Column name.
    pub name: String,
    /// Column type.
    pub ty: PortableType,
    /// Whether NULL is allowed.
    pub nullable: bool,
    /// Server default.
    pub default: Option<ColumnDefault>,
    /// Whether the column is part of the primary key.
    pub primary_key: bool,
    /// Whether the column carries its own UNIQUE constraint.
    pub unique: bool,
    /// Auto-increment designation.
    pub autoincrement: AutoIncrement,
}

impl ColumnDef {
    /// Creates a nullable column.
    #[must_use]
    pub fn new(name: impl Into<String>, ty: PortableType) -> Self {
        Self {
            name: name.into(),
            ty,
            nullable: true,
            default: None,
            primary_key: false,
            unique: false,
            autoincrement: AutoIncrement::Auto,
        }
    }

    /// Marks the column NOT NULL.
    #[must_use]
    pub const fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Marks the column as (part of) the primary key; implies NOT NULL.
    #[must_use]
    pub const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    /// Adds a UNIQUE constraint.
    #[must_use]
    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Sets the server default.
    #[must_use]
    pub fn default_value(mut self, default: ColumnDefault) -> Self {
        self.default = Some(default);
        self
    }

    /// Sets the auto-increment designation.
    #[must_use]
    pub const fn autoincrement(mut self, value: AutoIncrement) -> Self {
        self.autoincrement = value;
        self
    }
}

/// A FOREIGN KEY clause.
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKeyDef {
    /// Constraint name.
    pub name: Option<String>,
    /// Local columns.
    pub columns: Vec<String>,
    /// Referenced schema.
    pub referred_schema: Option<String>,
    /// Referenced table.
    pub referred_table: String,
    /// Referenced columns.
    pub referred_columns: Vec<String>,
    /// ON DELETE action.
    pub on_delete: Option<ReferentialAction>,
    /// ON UPDATE action.
    pub on_update: Option<ReferentialAction>,
}

impl ForeignKeyDef {
    /// Creates an unnamed foreign key.
    #[must_use]
    pub fn new(columns: &[&str], referred_table: impl Into<String>, referred_columns: &[&str]) -> Self {
        Self {
            name: None,
            columns: columns.iter().map(|c| (*c).to_string()).collect(),
            referred_schema: None,
            referred_table: referred_table.into(),
            referred_columns: referred_columns.iter().map(|c| (*c).to_string()).collect(),
            on_delete: None,
            on_update: None,
        }
    }

    /// Names the constraint.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the referenced schema.
    #[must_use]
    pub fn referred_schema(mut self, schema: impl Into<String>) -> Self {
        self.referred_schema = Some(schema.into());
        self
    }

    /// Sets the ON DELETE action.
    #[must_use]
    pub const fn on_delete(mut self, action: ReferentialAction) -> Self {
        self.on_delete = Some(action);
        self
    }

    /// Sets the ON UPDATE action.
    #[must_use]
    pub const fn on_update(mut self, action: ReferentialAction) -> Self {
        self.on_update = Some(action);
        self
    }
}

/// A CREATE TABLE.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CreateTable {
    /// Schema name.
    pub schema: Option<String>,
    /// Table name.
    pub name: String,
    /// Columns in declaration order.
    pub columns: Vec<ColumnDef>,
    /// Foreign keys.
    pub foreign_keys: Vec<ForeignKeyDef>,
    /// Multi-column UNIQUE constraints.
    pub unique_constraints: Vec<Vec<String>>,
    /// Whether to add IF NOT EXISTS.
    pub if_not_exists: bool,
}

impl CreateTable {
    /// Creates an empty table definition.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets the schema.
    #[must_use]
    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Adds a column.
    #[must_use]
    pub fn column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    /// Adds a foreign key.
    #[must_use]
    pub fn foreign_key(mut self, fk: ForeignKeyDef) -> Self {
        self.foreign_keys.push(fk);
        self
    }

    /// Adds a multi-column UNIQUE constraint.
    #[must_use]
    pub fn unique(mut self, columns: &[&str]) -> Self {
        self.unique_constraints
            .push(columns.iter().map(|c| (*c).to_string()).collect());
        self
    }

    /// Adds IF NOT EXISTS.
    #[must_use]
    pub const fn if_not_exists(mut self) -> Self {
        self.if_not_exists = true;
        self
    }

    /// Primary-key columns in declaration order.
    pub fn primary_key_columns(&self) -> impl Iterator<Item = &ColumnDef> {
        self.columns.iter().filter(|c| c.primary_key)
    }

    /// The column that receives `AUTO_INCREMENT`, if any.
    ///
    /// Only a table with a single-column primary key has one. That column
    /// qualifies when it is explicitly `Yes`, or `Auto` with an integer type
    /// and no default.
    #[must_use]
    pub fn autoincrement_column(&self) -> Option<&ColumnDef> {
        let mut pk = self.primary_key_columns();
        let column = pk.next()?;
        if pk.next().is_some() {
            return None;
        }
        match column.autoincrement {
            AutoIncrement::Yes => Some(column),
            AutoIncrement::Auto if column.ty.is_integer() && column.default.is_none() => {
                Some(column)
            }
            _ => None,
        }
    }
}

/// A CREATE INDEX.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateIndex {
    /// Index name.
    pub name: String,
    /// Schema of the table.
    pub schema: Option<String>,
    /// Indexed table.
    pub table: String,
    /// Indexed columns in order.
    pub columns: Vec<String>,
    /// Whether this is a UNIQUE index.
    pub unique: bool,
}

/// A DDL statement.
#[derive(Debug, Clone, PartialEq)]
pub enum DdlStatement {
    /// CREATE TABLE.
    CreateTable(CreateTable),
    /// DROP TABLE.
    DropTable {
        /// Schema.
        schema: Option<String>,
        /// Table name.
        name: String,
        /// Whether to add IF EXISTS.
        if_exists: bool,
    },
    /// CREATE INDEX.
    CreateIndex(CreateIndex),
    /// DROP INDEX.
    DropIndex {
        /// Schema.
        schema: Option<String>,
        /// Index name.
        name: String,
    },
    /// CREATE SEQUENCE.
    CreateSequence {
        /// Schema.
        schema: Option<String>,
        /// Sequence name.
        name: String,
        /// START WITH value.
        start: Option<i64>,
        /// INCREMENT BY value.
        increment: Option<i64>,
    },
    /// DROP SEQUENCE.
    DropSequence {
        /// Schema.
        schema: Option<String>,
        /// Sequence name.
        name: String,
    },
    /// ALTER TABLE ... ADD CONSTRAINT ... FOREIGN KEY.
    AddForeignKey {
        /// Schema of the constrained table.
        schema: Option<String>,
        /// Constrained table.
        table: String,
        /// The foreign key.
        foreign_key: ForeignKeyDef,
    },
    /// ALTER TABLE ... DROP CONSTRAINT.
    DropConstraint {
        /// Schema.
        schema: Option<String>,
        /// Table.
        table: String,
        /// Constraint name.
        name: String,
    },
}

impl From<CreateTable> for DdlStatement {
    fn from(table: CreateTable) -> Self {
        Self::CreateTable(table)
    }
}

impl From<CreateIndex> for DdlStatement {
    fn from(index: CreateIndex) -> Self {
        Self::CreateIndex(index)
    }
}
