//! Dialect capability description.
//!
//! The [`Dialect`] trait describes what a database accepts. Its default
//! methods describe ANSI behavior; [`H2Dialect`] overrides the places where
//! H2 differs.

use crate::identifier;

/// Trait for SQL dialect-specific behavior.
pub trait Dialect {
    /// Returns the name of the dialect.
    fn name(&self) -> &'static str;

    /// Returns the identifier quote character.
    fn identifier_quote(&self) -> char {
        '"'
    }

    /// Returns the escaped form of a quote inside a string literal.
    fn string_escape(&self) -> &'static str {
        "''"
    }

    /// Returns the parameter placeholder.
    fn parameter_placeholder(&self) -> &'static str {
        "?"
    }

    /// Whether ALTER TABLE is supported.
    fn supports_alter(&self) -> bool {
        true
    }

    /// Whether sequences are supported.
    fn supports_sequences(&self) -> bool {
        false
    }

    /// Whether sequences may be omitted for generated keys.
    fn sequences_optional(&self) -> bool {
        false
    }

    /// Whether autoincrement sequences are fired before an INSERT.
    fn preexecute_autoincrement_sequences(&self) -> bool {
        false
    }

    /// Whether BOOLEAN is a native column type.
    fn supports_native_boolean(&self) -> bool {
        false
    }

    /// Whether `INSERT ... DEFAULT VALUES` is accepted.
    fn supports_default_values(&self) -> bool {
        true
    }

    /// Whether `INSERT INTO t () VALUES ()` is accepted.
    fn supports_empty_insert(&self) -> bool {
        false
    }

    /// Whether `CAST(x AS type)` is accepted.
    fn supports_cast(&self) -> bool {
        true
    }

    /// Whether `SELECT ... FOR UPDATE` takes row locks.
    fn supports_for_update(&self) -> bool {
        true
    }

    /// Whether reflected names go through case normalization.
    fn requires_name_normalize(&self) -> bool {
        false
    }

    /// Maximum identifier length, when enforced.
    fn max_identifier_length(&self) -> Option<usize> {
        None
    }

    /// Renders the row-count clause for a SELECT.
    fn limit_clause(&self, limit: Option<u64>, offset: Option<u64>) -> String {
        match (limit, offset) {
            (Some(l), Some(o)) => format!("LIMIT {l} OFFSET {o}"),
            (Some(l), None) => format!("LIMIT {l}"),
            (None, Some(o)) => format!("OFFSET {o}"),
            (None, None) => String::new(),
        }
    }

    /// Renders the row-locking clause.
    fn for_update_clause(&self) -> &'static str {
        if self.supports_for_update() {
            "FOR UPDATE"
        } else {
            ""
        }
    }

    /// Quotes an identifier if necessary.
    fn format_identifier(&self, name: &str) -> String {
        identifier::format_identifier(name)
    }

    /// Renders an optionally schema-qualified object name.
    fn format_qualified(&self, schema: Option<&str>, name: &str) -> String {
        match schema {
            Some(schema) => format!(
                "{}.{}",
                self.format_identifier(schema),
                self.format_identifier(name)
            ),
            None => self.format_identifier(name),
        }
    }

    /// Renders a table name, qualified with its schema when one is given.
    fn format_table(&self, schema: Option<&str>, table: &str) -> String {
        self.format_qualified(schema, table)
    }

    /// Renders a sequence name, qualified with its schema when one is given.
    fn format_sequence(&self, schema: Option<&str>, sequence: &str) -> String {
        self.format_qualified(schema, sequence)
    }
}

/// The H2 dialect.
#[derive(Debug, Default, Clone, Copy)]
pub struct H2Dialect;

impl H2Dialect {
    /// Creates a new H2 dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for H2Dialect {
    fn name(&self) -> &'static str {
        "h2"
    }

    fn supports_sequences(&self) -> bool {
        true
    }

    fn sequences_optional(&self) -> bool {
        true
    }

    fn preexecute_autoincrement_sequences(&self) -> bool {
        true
    }

    fn supports_native_boolean(&self) -> bool {
        true
    }

    fn supports_for_update(&self) -> bool {
        false
    }

    fn requires_name_normalize(&self) -> bool {
        true
    }

    // H2 has no bare OFFSET; an offset without a limit needs a NULL limit.
    fn limit_clause(&self, limit: Option<u64>, offset: Option<u64>) -> String {
        match (limit, offset) {
            (Some(l), Some(o)) => format!("LIMIT {l} OFFSET {o}"),
            (Some(l), None) => format!("LIMIT {l}"),
            (None, Some(o)) => format!("LIMIT NULL OFFSET {o}"),
            (None, None) => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_h2_dialect() {
        let dialect = H2Dialect::new();
        assert_eq!(dialect.name(), "h2");
        assert_eq!(dialect.identifier_quote(), '"');
        assert_eq!(dialect.parameter_placeholder(), "?");
        assert!(dialect.supports_alter());
        assert!(dialect.supports_sequences());
        assert!(dialect.sequences_optional());
        assert!(dialect.preexecute_autoincrement_sequences());
        assert!(dialect.supports_native_boolean());
        assert!(dialect.supports_default_values());
        assert!(dialect.supports_cast());
        assert!(!dialect.supports_empty_insert());
        assert!(!dialect.supports_for_update());
        assert!(dialect.requires_name_normalize());
        assert_eq!(dialect.max_identifier_length(), None);
    }

    #[test]
    fn test_limit_clause() {
        let d = H2Dialect::new();
        assert_eq!(d.limit_clause(Some(5), None), "LIMIT 5");
        assert_eq!(d.limit_clause(None, Some(10)), "LIMIT NULL OFFSET 10");
        assert_eq!(d.limit_clause(Some(5), Some(10)), "LIMIT 5 OFFSET 10");
        assert_eq!(d.limit_clause(None, None), "");
    }

    #[test]
    fn test_for_update_suppressed() {
        assert_eq!(H2Dialect::new().for_update_clause(), "");
    }

    #[test]
    fn test_format_identifier() {
        let d = H2Dialect::new();
        assert_eq!(d.format_identifier("users"), "users");
        assert_eq!(d.format_identifier("Users"), "\"Users\"");
        assert_eq!(d.format_table(Some("sales"), "order"), "sales.\"order\"");
        assert_eq!(d.format_sequence(None, "OrderSeq"), "\"OrderSeq\"");
    }
}
