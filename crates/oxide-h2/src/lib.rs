//! H2 dialect adapter.
//!
//! `oxide-h2` sits between a generic query layer and an H2 database. It
//! does not open connections; everything that talks to the database goes
//! through the [`Executor`](executor::Executor) trait, which drivers such as
//! `oxide-h2-sqlx` implement.
//!
//! # Components
//!
//! - **Identifier normalizer** ([`identifier`]) - converts between H2's
//!   upper-case folding and lower-case portable names, and quotes
//!   identifiers that need it.
//! - **Type mapper** ([`types`]) - maps native type names to [`PortableType`].
//! - **Statement compiler** ([`compiler`], [`ddl`]) - renders [`ast`] trees
//!   into H2 SQL.
//! - **Catalog reflector** ([`reflect`]) - reads `INFORMATION_SCHEMA` into
//!   normalized descriptors.
//! - **Transaction coordinator** ([`twophase`]) - drives two-phase commit.
//!
//! # Example
//!
//! ```rust
//! use oxide_h2::prelude::*;
//!
//! let select = SelectStatement::new()
//!     .columns(&["id", "name"])
//!     .from(TableRef::table("users"))
//!     .offset(20);
//!
//! let compiled = SqlCompiler::new().compile_select(&select);
//! assert_eq!(compiled.sql, "SELECT id, name FROM users LIMIT NULL OFFSET 20");
//!
//! assert_eq!(normalize_name("USERS"), "users");
//! assert_eq!(denormalize_name("users"), "USERS");
//! ```

pub mod ast;
pub mod compiler;
pub mod config;
pub mod connect;
pub mod ddl;
pub mod dialect;
pub mod error;
pub mod executor;
pub mod identifier;
pub mod reflect;
pub mod session;
pub mod twophase;
pub mod types;

pub use error::{Error, Result};
pub use types::PortableType;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::ast::{
        AutoIncrement, BinaryOp, CaseExpr, ColumnDef, ColumnDefault, CreateIndex, CreateTable,
        DdlStatement, DeleteStatement, Expr, ForeignKeyDef, InsertStatement, JoinType,
        OrderDirection, ReferentialAction, SelectStatement, Statement, TableRef,
        UpdateStatement,
    };
    pub use crate::compiler::{CompiledStatement, SqlCompiler};
    pub use crate::config::DialectConfig;
    pub use crate::connect::{jdbc_url, PoolStrategy};
    pub use crate::ddl::DdlCompiler;
    pub use crate::dialect::{Dialect, H2Dialect};
    pub use crate::error::{Error, Result};
    pub use crate::executor::{BoundStatement, Executor, ExecutorError, Row, SqlValue};
    pub use crate::identifier::{denormalize_name, normalize_name, Identifier};
    pub use crate::reflect::{
        ColumnDescriptor, ForeignKeyConstraint, IndexDescriptor, PrimaryKeyConstraint,
        ReflectionCache, Reflector, TableReflection,
    };
    pub use crate::session::{fire_sequence, last_insert_id};
    pub use crate::twophase::TransactionCoordinator;
    pub use crate::types::{PortableType, TypeWarning};
}
