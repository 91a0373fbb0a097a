//! Statement compiler.
//!
//! Renders [`crate::ast`] query trees into H2 SQL text. Literal values become
//! `?` bind parameters, collected in the order they appear in the text.
//! Output is deterministic: the same tree always yields the same text and
//! parameters.
//!
//! H2-specific rendering:
//!
//! - `LIMIT NULL OFFSET n` when only an offset is given.
//! - Every `CASE` result is wrapped in `CAST(... AS <type>)`, using
//!   `VARCHAR` when the result has no declared type.
//! - Row-lock requests (`FOR UPDATE`) render as nothing.
//! - Modulo renders as `mod(a, b)`.
//! - The current timestamp renders as `CURRENT_TIMESTAMP`.
//! - Sequence access renders as `<sequence>.nextval`.

use crate::ast::{
    BinaryOp, CaseExpr, DeleteStatement, Expr, InsertStatement, JoinClause, Literal,
    SelectColumn, SelectStatement, Statement, TableRef, UnaryOp, UpdateStatement,
};
use crate::dialect::{Dialect, H2Dialect};
use crate::executor::{BoundStatement, SqlValue};
use crate::types::PortableType;

/// SQL text with positional (`?`) bind values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompiledStatement {
    /// The SQL text.
    pub sql: String,
    /// Bind values in placeholder order.
    pub params: Vec<SqlValue>,
}

impl CompiledStatement {
    /// Converts into an executor statement. Positional parameters are named
    /// by their 1-based index.
    #[must_use]
    pub fn into_bound(self) -> BoundStatement {
        let params = self
            .params
            .into_iter()
            .enumerate()
            .map(|(i, value)| ((i + 1).to_string(), value))
            .collect();
        BoundStatement {
            sql: self.sql,
            params,
        }
    }
}

/// Accumulates SQL text and bind values.
#[derive(Default)]
struct SqlWriter {
    sql: String,
    params: Vec<SqlValue>,
}

impl SqlWriter {
    fn push(&mut self, text: &str) {
        self.sql.push_str(text);
    }

    fn bind(&mut self, value: SqlValue) {
        self.sql.push('?');
        self.params.push(value);
    }

    fn finish(self) -> CompiledStatement {
        CompiledStatement {
            sql: self.sql,
            params: self.params,
        }
    }
}

/// Compiles DML trees for a dialect.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqlCompiler<D: Dialect = H2Dialect> {
    dialect: D,
}

impl SqlCompiler<H2Dialect> {
    /// Creates a compiler for H2.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            dialect: H2Dialect::new(),
        }
    }
}

impl<D: Dialect> SqlCompiler<D> {
    /// Creates a compiler for another dialect.
    #[must_use]
    pub const fn with_dialect(dialect: D) -> Self {
        Self { dialect }
    }

    /// The dialect this compiler renders for.
    #[must_use]
    pub const fn dialect(&self) -> &D {
        &self.dialect
    }

    /// Compiles any DML statement.
    #[must_use]
    pub fn compile(&self, statement: &Statement) -> CompiledStatement {
        match statement {
            Statement::Select(s) => self.compile_select(s),
            Statement::Insert(s) => self.compile_insert(s),
            Statement::Update(s) => self.compile_update(s),
            Statement::Delete(s) => self.compile_delete(s),
        }
    }

    /// Compiles a standalone expression.
    #[must_use]
    pub fn compile_expr(&self, expr: &Expr) -> CompiledStatement {
        let mut w = SqlWriter::default();
        self.write_expr(&mut w, expr);
        w.finish()
    }

    /// Renders the LIMIT/OFFSET clause.
    #[must_use]
    pub fn limit_clause(&self, limit: Option<u64>, offset: Option<u64>) -> String {
        self.dialect.limit_clause(limit, offset)
    }

    /// Compiles a SELECT.
    #[must_use]
    pub fn compile_select(&self, select: &SelectStatement) -> CompiledStatement {
        let mut w = SqlWriter::default();
        w.push("SELECT ");
        if select.distinct {
            w.push("DISTINCT ");
        }

        if select.columns.is_empty() {
            w.push("*");
        }
        for (i, column) in select.columns.iter().enumerate() {
            if i > 0 {
                w.push(", ");
            }
            match column {
                SelectColumn::Wildcard => w.push("*"),
                SelectColumn::Expr { expr, alias } => {
                    self.write_expr(&mut w, expr);
                    if let Some(alias) = alias {
                        w.push(" AS ");
                        w.push(&self.dialect.format_identifier(alias));
                    }
                }
            }
        }

        if !select.from.is_empty() {
            w.push(" FROM ");
            let tables: Vec<String> = select.from.iter().map(|t| self.table_ref(t)).collect();
            w.push(&tables.join(", "));
        }
        for join in &select.joins {
            self.write_join(&mut w, join);
        }

        if let Some(ref filter) = select.where_clause {
            w.push(" WHERE ");
            self.write_expr(&mut w, filter);
        }

        if !select.group_by.is_empty() {
            w.push(" GROUP BY ");
            self.write_list(&mut w, &select.group_by);
        }

        if let Some(ref having) = select.having {
            w.push(" HAVING ");
            self.write_expr(&mut w, having);
        }

        if !select.order_by.is_empty() {
            w.push(" ORDER BY ");
            for (i, order) in select.order_by.iter().enumerate() {
                if i > 0 {
                    w.push(", ");
                }
                self.write_expr(&mut w, &order.expr);
                w.push(" ");
                w.push(order.direction.as_str());
            }
        }

        let limit = self.limit_clause(select.limit, select.offset);
        if !limit.is_empty() {
            w.push(" ");
            w.push(&limit);
        }

        if select.for_update {
            let lock = self.dialect.for_update_clause();
            if !lock.is_empty() {
                w.push(" ");
                w.push(lock);
            }
        }

        w.finish()
    }

    /// Compiles an INSERT. No columns (or no rows) yields `DEFAULT VALUES`.
    #[must_use]
    pub fn compile_insert(&self, insert: &InsertStatement) -> CompiledStatement {
        let mut w = SqlWriter::default();
        w.push("INSERT INTO ");
        w.push(&self.table_ref(&insert.table));

        if insert.columns.is_empty() || insert.rows.is_empty() {
            w.push(" DEFAULT VALUES");
            return w.finish();
        }

        let columns: Vec<String> = insert
            .columns
            .iter()
            .map(|c| self.dialect.format_identifier(c))
            .collect();
        w.push(" (");
        w.push(&columns.join(", "));
        w.push(") VALUES ");
        for (i, row) in insert.rows.iter().enumerate() {
            if i > 0 {
                w.push(", ");
            }
            w.push("(");
            self.write_list(&mut w, row);
            w.push(")");
        }
        w.finish()
    }

    /// Compiles an UPDATE.
    #[must_use]
    pub fn compile_update(&self, update: &UpdateStatement) -> CompiledStatement {
        let mut w = SqlWriter::default();
        w.push("UPDATE ");
        w.push(&self.table_ref(&update.table));
        w.push(" SET ");
        for (i, (column, value)) in update.assignments.iter().enumerate() {
            if i > 0 {
                w.push(", ");
            }
            w.push(&self.dialect.format_identifier(column));
            w.push(" = ");
            self.write_expr(&mut w, value);
        }
        if let Some(ref filter) = update.where_clause {
            w.push(" WHERE ");
            self.write_expr(&mut w, filter);
        }
        w.finish()
    }

    /// Compiles a DELETE.
    #[must_use]
    pub fn compile_delete(&self, delete: &DeleteStatement) -> CompiledStatement {
        let mut w = SqlWriter::default();
        w.push("DELETE FROM ");
        w.push(&self.table_ref(&delete.table));
        if let Some(ref filter) = delete.where_clause {
            w.push(" WHERE ");
            self.write_expr(&mut w, filter);
        }
        w.finish()
    }

    fn table_ref(&self, table: &TableRef) -> String {
        let name = self.dialect.format_table(table.schema.as_deref(), &table.name);
        match table.alias {
            Some(ref alias) => format!("{name} AS {}", self.dialect.format_identifier(alias)),
            None => name,
        }
    }

    fn write_join(&self, w: &mut SqlWriter, join: &JoinClause) {
        w.push(" ");
        w.push(join.join_type.as_str());
        w.push(" ");
        w.push(&self.table_ref(&join.table));
        if let Some(ref on) = join.on {
            w.push(" ON ");
            self.write_expr(w, on);
        }
    }

    fn write_list(&self, w: &mut SqlWriter, exprs: &[Expr]) {
        for (i, expr) in exprs.iter().enumerate() {
            if i > 0 {
                w.push(", ");
            }
            self.write_expr(w, expr);
        }
    }

    fn write_expr(&self, w: &mut SqlWriter, expr: &Expr) {
        match expr {
            Expr::Literal(lit) => Self::write_literal(w, lit),
            Expr::Column { table, name, .. } => {
                if let Some(table) = table {
                    w.push(&self.dialect.format_identifier(table));
                    w.push(".");
                }
                w.push(&self.dialect.format_identifier(name));
            }
            Expr::Binary { left, op, right } => self.write_binary(w, left, *op, right),
            Expr::Unary { op, operand } => {
                w.push(op.as_str());
                if *op == UnaryOp::Not {
                    w.push(" ");
                }
                self.write_operand(w, operand, u8::MAX, false);
            }
            Expr::Function(call) => {
                w.push(&call.name);
                w.push("(");
                self.write_list(w, &call.args);
                w.push(")");
            }
            Expr::CurrentTimestamp => w.push("CURRENT_TIMESTAMP"),
            Expr::NextValue { schema, sequence } => {
                w.push(&self.dialect.format_sequence(schema.as_deref(), sequence));
                w.push(".nextval");
            }
            Expr::Case(case) => self.write_case(w, case),
            Expr::Cast { expr, ty } => self.write_cast(w, expr, ty),
            Expr::IsNull { expr, negated } => {
                self.write_expr(w, expr);
                w.push(if *negated { " IS NOT NULL" } else { " IS NULL" });
            }
            Expr::In {
                expr,
                list,
                negated,
            } => {
                if list.is_empty() {
                    // Nothing can be a member of an empty list.
                    w.push(if *negated { "1 = 1" } else { "1 <> 1" });
                    return;
                }
                self.write_expr(w, expr);
                w.push(if *negated { " NOT IN (" } else { " IN (" });
                self.write_list(w, list);
                w.push(")");
            }
            Expr::Paren(inner) => {
                w.push("(");
                self.write_expr(w, inner);
                w.push(")");
            }
        }
    }

    fn write_literal(w: &mut SqlWriter, lit: &Literal) {
        match lit {
            Literal::Null => w.push("NULL"),
            Literal::Integer(n) => w.bind(SqlValue::Int(*n)),
            Literal::Float(f) => w.bind(SqlValue::Float(*f)),
            Literal::String(s) => w.bind(SqlValue::Text(s.clone())),
            Literal::Boolean(b) => w.bind(SqlValue::Bool(*b)),
        }
    }

    fn write_binary(&self, w: &mut SqlWriter, left: &Expr, op: BinaryOp, right: &Expr) {
        if op == BinaryOp::Mod {
            w.push("mod(");
            self.write_expr(w, left);
            w.push(", ");
            self.write_expr(w, right);
            w.push(")");
            return;
        }
        let precedence = op.precedence();
        self.write_operand(w, left, precedence, false);
        w.push(" ");
        w.push(op.as_str());
        w.push(" ");
        self.write_operand(w, right, precedence, true);
    }

    /// Writes an operand, parenthesizing a nested infix expression that binds
    /// looser than its parent (or equally, on the right).
    fn write_operand(&self, w: &mut SqlWriter, operand: &Expr, parent: u8, right: bool) {
        let needs_parens = match operand {
            Expr::Binary { op, .. } if *op != BinaryOp::Mod => {
                op.precedence() < parent || (right && op.precedence() == parent)
            }
            _ => false,
        };
        if needs_parens {
            w.push("(");
            self.write_expr(w, operand);
            w.push(")");
        } else {
            self.write_expr(w, operand);
        }
    }

    fn write_case(&self, w: &mut SqlWriter, case: &CaseExpr) {
        w.push("CASE");
        if let Some(ref operand) = case.operand {
            w.push(" ");
            self.write_expr(w, operand);
        }
        for (condition, result) in &case.whens {
            w.push(" WHEN ");
            self.write_expr(w, condition);
            w.push(" THEN ");
            self.write_cast(w, result, &Self::branch_type(result));
        }
        if let Some(ref result) = case.else_result {
            w.push(" ELSE ");
            self.write_cast(w, result, &Self::branch_type(result));
        }
        w.push(" END");
    }

    /// The cast target for a CASE branch: its declared type, or a generic
    /// string when it has none.
    fn branch_type(result: &Expr) -> PortableType {
        result
            .declared_type()
            .filter(|ty| !ty.is_unknown())
            .unwrap_or_else(PortableType::string)
    }

    fn write_cast(&self, w: &mut SqlWriter, expr: &Expr, ty: &PortableType) {
        w.push("CAST(");
        self.write_expr(w, expr);
        w.push(" AS ");
        w.push(&ty.to_sql());
        w.push(")");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{JoinType, OrderDirection};

    fn sql(expr: &Expr) -> String {
        SqlCompiler::new().compile_expr(expr).sql
    }

    #[test]
    fn test_limit_offset_combinations() {
        let c = SqlCompiler::new();
        assert_eq!(c.limit_clause(Some(5), None), "LIMIT 5");
        assert_eq!(c.limit_clause(None, Some(10)), "LIMIT NULL OFFSET 10");
        assert_eq!(c.limit_clause(Some(5), Some(10)), "LIMIT 5 OFFSET 10");
        assert_eq!(c.limit_clause(None, None), "");
    }

    #[test]
    fn test_select_offset_only() {
        let select = SelectStatement::new()
            .columns(&["id"])
            .from(TableRef::table("users"))
            .offset(10);
        assert_eq!(
            SqlCompiler::new().compile_select(&select).sql,
            "SELECT id FROM users LIMIT NULL OFFSET 10"
        );
    }

    #[test]
    fn test_for_update_renders_nothing() {
        let select = SelectStatement::new()
            .all()
            .from(TableRef::table("accounts"))
            .limit(1)
            .for_update();
        assert_eq!(
            SqlCompiler::new().compile_select(&select).sql,
            "SELECT * FROM accounts LIMIT 1"
        );
    }

    #[test]
    fn test_modulo_is_function() {
        let expr = Expr::column("a").modulo(Expr::column("b"));
        assert_eq!(sql(&expr), "mod(a, b)");
    }

    #[test]
    fn test_current_timestamp_and_nextval() {
        assert_eq!(sql(&Expr::CurrentTimestamp), "CURRENT_TIMESTAMP");
        assert_eq!(sql(&Expr::next_value(None, "order_seq")), "order_seq.nextval");
        assert_eq!(
            sql(&Expr::next_value(Some("sales"), "Seq")),
            "sales.\"Seq\".nextval"
        );
    }

    #[test]
    fn test_case_branches_are_cast() {
        let expr = Expr::Case(
            CaseExpr::new()
                .when(
                    Expr::column("x").gt(Expr::int(0)),
                    Expr::typed_column("amount", PortableType::Integer),
                )
                .when(Expr::column("x").is_null(), Expr::null())
                .otherwise(Expr::column("label")),
        );
        assert_eq!(
            sql(&expr),
            "CASE WHEN x > ? THEN CAST(amount AS INTEGER) \
             WHEN x IS NULL THEN CAST(NULL AS VARCHAR) \
             ELSE CAST(label AS VARCHAR) END"
        );
    }

    #[test]
    fn test_float_branch_cast_keeps_scale() {
        let expr = Expr::Case(
            CaseExpr::new()
                .when(Expr::column("vip"), Expr::float(0.25))
                .otherwise(Expr::float(1.5)),
        );
        let compiled = SqlCompiler::new().compile_expr(&expr);
        assert_eq!(
            compiled.sql,
            "CASE WHEN vip THEN CAST(? AS DECIMAL(53, 2)) ELSE CAST(? AS DECIMAL(53, 1)) END"
        );
        assert_eq!(
            compiled.params,
            vec![SqlValue::Float(0.25), SqlValue::Float(1.5)]
        );
    }

    #[test]
    fn test_simple_case_operand() {
        let expr = Expr::Case(
            CaseExpr::with_operand(Expr::column("status"))
                .when(Expr::string("a"), Expr::int(1))
                .otherwise(Expr::int(0)),
        );
        let compiled = SqlCompiler::new().compile_expr(&expr);
        assert_eq!(
            compiled.sql,
            "CASE status WHEN ? THEN CAST(? AS INTEGER) ELSE CAST(? AS INTEGER) END"
        );
        assert_eq!(
            compiled.params,
            vec![SqlValue::from("a"), SqlValue::Int(1), SqlValue::Int(0)]
        );
    }

    #[test]
    fn test_reserved_and_mixed_case_quoted() {
        let select = SelectStatement::new()
            .columns(&["order", "Name", "id"])
            .from(TableRef::table("MyTable"));
        assert_eq!(
            SqlCompiler::new().compile_select(&select).sql,
            "SELECT \"order\", \"Name\", id FROM \"MyTable\""
        );
    }

    #[test]
    fn test_other_dialect_quotes_qualified_names() {
        #[derive(Debug, Default, Clone, Copy)]
        struct AlwaysQuote;

        impl Dialect for AlwaysQuote {
            fn name(&self) -> &'static str {
                "always-quote"
            }

            fn format_identifier(&self, name: &str) -> String {
                format!("\"{name}\"")
            }
        }

        let compiler = SqlCompiler::with_dialect(AlwaysQuote);
        let select = SelectStatement::new()
            .column(Expr::next_value(Some("sales"), "order_seq"))
            .from(TableRef::with_schema("sales", "orders"));
        assert_eq!(
            compiler.compile_select(&select).sql,
            "SELECT \"sales\".\"order_seq\".nextval FROM \"sales\".\"orders\""
        );
    }

    #[test]
    fn test_precedence_parens() {
        let expr = Expr::column("a")
            .binary(BinaryOp::Add, Expr::column("b"))
            .binary(BinaryOp::Mul, Expr::column("c"));
        assert_eq!(sql(&expr), "(a + b) * c");

        let flat = Expr::column("a")
            .eq(Expr::int(1))
            .and(Expr::column("b").eq(Expr::int(2)));
        assert_eq!(sql(&flat), "a = ? AND b = ?");
    }

    #[test]
    fn test_full_select() {
        let select = SelectStatement::new()
            .distinct()
            .column(Expr::qualified_column("u", "id"))
            .column_as(Expr::function("count", vec![Expr::qualified_column("o", "id")]), "n")
            .from(TableRef::table("users").alias("u"))
            .join(
                JoinType::Left,
                TableRef::table("orders").alias("o"),
                Some(Expr::qualified_column("o", "user_id").eq(Expr::qualified_column("u", "id"))),
            )
            .where_clause(Expr::qualified_column("u", "active").eq(Expr::boolean(true)))
            .group_by(Expr::qualified_column("u", "id"))
            .order_by(Expr::qualified_column("u", "id"), OrderDirection::Desc)
            .limit(5)
            .offset(10);
        let compiled = SqlCompiler::new().compile_select(&select);
        assert_eq!(
            compiled.sql,
            "SELECT DISTINCT u.id, count(o.id) AS n FROM users AS u \
             LEFT OUTER JOIN orders AS o ON o.user_id = u.id \
             WHERE u.active = ? GROUP BY u.id ORDER BY u.id DESC LIMIT 5 OFFSET 10"
        );
        assert_eq!(compiled.params, vec![SqlValue::Bool(true)]);
    }

    #[test]
    fn test_insert() {
        let insert = InsertStatement::into_table(TableRef::with_schema("sales", "orders"))
            .columns(&["id", "note"])
            .values(vec![Expr::int(1), Expr::string("first")])
            .values(vec![Expr::int(2), Expr::null()]);
        let compiled = SqlCompiler::new().compile_insert(&insert);
        assert_eq!(
            compiled.sql,
            "INSERT INTO sales.orders (id, note) VALUES (?, ?), (?, NULL)"
        );
        assert_eq!(compiled.params.len(), 3);
    }

    #[test]
    fn test_insert_default_values() {
        let insert = InsertStatement::into_table(TableRef::table("counters"));
        assert_eq!(
            SqlCompiler::new().compile_insert(&insert).sql,
            "INSERT INTO counters DEFAULT VALUES"
        );
    }

    #[test]
    fn test_update_and_delete() {
        let update = UpdateStatement::table(TableRef::table("users"))
            .set("name", Expr::string("bob"))
            .set("updated", Expr::CurrentTimestamp)
            .where_clause(Expr::column("id").eq(Expr::int(3)));
        let compiled = SqlCompiler::new().compile(&update.into());
        assert_eq!(
            compiled.sql,
            "UPDATE users SET name = ?, updated = CURRENT_TIMESTAMP WHERE id = ?"
        );
        assert_eq!(compiled.params, vec![SqlValue::from("bob"), SqlValue::Int(3)]);

        let delete = DeleteStatement::from(TableRef::table("users"))
            .where_clause(Expr::column("id").modulo(Expr::int(2)).eq(Expr::int(0)));
        assert_eq!(
            SqlCompiler::new().compile_delete(&delete).sql,
            "DELETE FROM users WHERE mod(id, ?) = ?"
        );
    }

    #[test]
    fn test_in_list() {
        let expr = Expr::In {
            expr: Box::new(Expr::column("id")),
            list: vec![Expr::int(1), Expr::int(2)],
            negated: true,
        };
        assert_eq!(sql(&expr), "id NOT IN (?, ?)");

        let empty = Expr::In {
            expr: Box::new(Expr::column("id")),
            list: vec![],
            negated: false,
        };
        assert_eq!(sql(&empty), "1 <> 1");
    }

    #[test]
    fn test_deterministic() {
        let select = SelectStatement::new()
            .columns(&["a"])
            .from(TableRef::table("t"))
            .where_clause(Expr::column("a").eq(Expr::string("x")));
        let c = SqlCompiler::new();
        assert_eq!(c.compile_select(&select), c.compile_select(&select));
    }

    #[test]
    fn test_into_bound_names_positions() {
        let compiled = CompiledStatement {
            sql: "SELECT ?, ?".into(),
            params: vec![SqlValue::Int(1), SqlValue::Int(2)],
        };
        let bound = compiled.into_bound();
        assert_eq!(bound.param("1"), Some(&SqlValue::Int(1)));
        assert_eq!(bound.param("2"), Some(&SqlValue::Int(2)));
    }
}
