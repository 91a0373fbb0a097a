//! Portable query and DDL construct trees.
//!
//! These are the inputs to [`crate::compiler::SqlCompiler`] and
//! [`crate::ddl::DdlCompiler`].

mod ddl;
mod expression;
mod statement;

pub use ddl::{
    AutoIncrement, ColumnDef, ColumnDefault, CreateIndex, CreateTable, DdlStatement,
    ForeignKeyDef, ReferentialAction,
};
pub use expression::{BinaryOp, CaseExpr, Expr, FunctionCall, Literal, UnaryOp};
pub use statement::{
    DeleteStatement, InsertStatement, JoinClause, JoinType, OrderBy, OrderDirection,
    SelectColumn, SelectStatement, Statement, TableRef, UpdateStatement,
};
