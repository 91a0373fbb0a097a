//! Identifier normalization and quoting.
//!
//! H2 folds unquoted identifiers to upper case. Callers of this crate work
//! with the portable convention instead: case-insensitive names appear in
//! lower case, while names that were created quoted (mixed case, reserved
//! words, special characters) keep their exact spelling.
//!
//! [`normalize_name`] converts a name reported by the catalog into the
//! portable form and [`denormalize_name`] converts a caller-supplied name back
//! into the form the catalog stores. Both leave empty and whitespace-only
//! names untouched; the database rejects those on its own.

use serde::{Deserialize, Serialize};

/// The identifier quote character.
pub const QUOTE: char = '"';

/// Words that must be quoted when used as identifiers.
///
/// Matching is case-insensitive; entries are lower case.
pub const RESERVED_WORDS: &[&str] = &[
    "add", "after", "all", "alter", "analyze", "and", "as", "asc", "attach", "autoincrement",
    "before", "begin", "between", "by", "cascade", "case", "cast", "check", "collate", "column",
    "commit", "conflict", "constraint", "create", "cross", "current_date", "current_time",
    "current_timestamp", "database", "default", "deferrable", "deferred", "delete", "desc",
    "detach", "distinct", "drop", "each", "else", "end", "escape", "except", "exclusive",
    "exists", "explain", "fail", "false", "for", "foreign", "from", "full", "glob", "group",
    "having", "if", "ignore", "immediate", "in", "index", "indexed", "initially", "inner",
    "insert", "instead", "intersect", "into", "is", "isnull", "join", "key", "left", "like",
    "limit", "match", "minus", "natural", "not", "notnull", "null", "of", "offset", "on", "or",
    "order", "outer", "plan", "pragma", "primary", "query", "raise", "references", "reindex",
    "rename", "replace", "restrict", "right", "rollback", "row", "rownum", "select", "set",
    "sysdate", "systime", "systimestamp", "table", "temp", "temporary", "then", "to", "today",
    "transaction", "trigger", "true", "union", "unique", "update", "using", "vacuum", "values",
    "view", "virtual", "when", "where",
];

/// Returns whether `word` is reserved, ignoring case.
#[must_use]
pub fn is_reserved(word: &str) -> bool {
    let lower = word.to_lowercase();
    RESERVED_WORDS.binary_search(&lower.as_str()).is_ok()
}

fn is_legal_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

fn is_illegal_initial(c: char) -> bool {
    c.is_ascii_digit() || c == '$'
}

/// Returns whether `name` must be quoted to be read back with exactly this
/// spelling.
///
/// A name needs quotes when it is a reserved word, starts with a digit or
/// `$`, contains anything other than ASCII letters, digits, `_` and `$`, or
/// contains upper-case letters.
#[must_use]
pub fn requires_quotes(name: &str) -> bool {
    let Some(first) = name.chars().next() else {
        return true;
    };
    is_reserved(name)
        || is_illegal_initial(first)
        || !name.chars().all(is_legal_char)
        || name.to_lowercase() != name
}

/// Wraps `name` in double quotes, doubling any embedded quote.
#[must_use]
pub fn quote_identifier(name: &str) -> String {
    let escaped = name.replace(QUOTE, "\"\"");
    format!("{QUOTE}{escaped}{QUOTE}")
}

/// Renders `name` for SQL text, quoting only when required.
#[must_use]
pub fn format_identifier(name: &str) -> String {
    if requires_quotes(name) {
        quote_identifier(name)
    } else {
        name.to_string()
    }
}

/// Renders an optionally schema-qualified object name.
#[must_use]
pub fn format_qualified(schema: Option<&str>, name: &str) -> String {
    match schema {
        Some(schema) => format!("{}.{}", format_identifier(schema), format_identifier(name)),
        None => format_identifier(name),
    }
}

/// Renders a table name, qualified with its schema when one is given.
#[must_use]
pub fn format_table(schema: Option<&str>, table: &str) -> String {
    format_qualified(schema, table)
}

/// Renders a sequence name, qualified with its schema when one is given.
#[must_use]
pub fn format_sequence(schema: Option<&str>, sequence: &str) -> String {
    format_qualified(schema, sequence)
}

/// Removes surrounding quotes from an identifier as it appears in SQL text
/// and collapses doubled quotes.
#[must_use]
pub fn unquote_identifier(raw: &str) -> String {
    let trimmed = raw.trim();
    let inner = trimmed
        .strip_prefix(QUOTE)
        .and_then(|s| s.strip_suffix(QUOTE))
        .unwrap_or(trimmed);
    inner.replace("\"\"", "\"")
}

fn is_blank(name: &str) -> bool {
    name.trim().is_empty()
}

/// Converts a catalog name into its portable form.
///
/// An all-upper-case name that would not need quoting once lower-cased is
/// returned in lower case; anything else is returned as is.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    if is_blank(name) {
        return name.to_string();
    }
    let lower = name.to_lowercase();
    if name.to_uppercase() == name && !requires_quotes(&lower) {
        lower
    } else {
        name.to_string()
    }
}

/// Converts a portable name into the form the catalog stores.
///
/// An all-lower-case name that does not need quoting is upper-cased; mixed
/// case and names that need quoting pass through.
#[must_use]
pub fn denormalize_name(name: &str) -> String {
    if is_blank(name) {
        return name.to_string();
    }
    if name.to_lowercase() == name && !requires_quotes(name) {
        name.to_uppercase()
    } else {
        name.to_string()
    }
}

/// [`normalize_name`] for values that may be SQL NULL.
#[must_use]
pub fn normalize_opt(name: Option<&str>) -> Option<String> {
    name.map(normalize_name)
}

/// [`denormalize_name`] for values that may be absent.
#[must_use]
pub fn denormalize_opt(name: Option<&str>) -> Option<String> {
    name.map(denormalize_name)
}

/// Whether an [`Identifier`] holds the database spelling or the portable one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NameState {
    /// Spelled as the database stores it.
    Raw,
    /// Spelled in the portable, caller-facing convention.
    Normalized,
}

/// A name tagged with its normalization state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identifier {
    value: String,
    state: NameState,
}

impl Identifier {
    /// Wraps a name exactly as the database reported it.
    #[must_use]
    pub fn raw(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            state: NameState::Raw,
        }
    }

    /// Normalizes a database name.
    #[must_use]
    pub fn normalize(value: &str) -> Self {
        Self {
            value: normalize_name(value),
            state: NameState::Normalized,
        }
    }

    /// Wraps a name that is already in portable form.
    #[must_use]
    pub fn normalized(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            state: NameState::Normalized,
        }
    }

    /// The name as stored in this identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// The normalization state.
    #[must_use]
    pub const fn state(&self) -> NameState {
        self.state
    }

    /// Returns the portable spelling.
    #[must_use]
    pub fn to_normalized(&self) -> Self {
        match self.state {
            NameState::Normalized => self.clone(),
            NameState::Raw => Self::normalize(&self.value),
        }
    }

    /// Returns the spelling to embed in SQL sent to the database.
    #[must_use]
    pub fn denormalize(&self) -> String {
        match self.state {
            NameState::Raw => self.value.clone(),
            NameState::Normalized => denormalize_name(&self.value),
        }
    }

    /// Consumes the identifier and returns the inner string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.value
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_words_sorted() {
        let mut sorted = RESERVED_WORDS.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, RESERVED_WORDS);
        assert_eq!(RESERVED_WORDS.len(), 123);
    }

    #[test]
    fn test_is_reserved_case_insensitive() {
        assert!(is_reserved("select"));
        assert!(is_reserved("SELECT"));
        assert!(is_reserved("Current_Timestamp"));
        assert!(!is_reserved("users"));
    }

    #[test]
    fn test_requires_quotes() {
        assert!(!requires_quotes("users"));
        assert!(!requires_quotes("user_id2"));
        assert!(requires_quotes("Users"));
        assert!(requires_quotes("order"));
        assert!(requires_quotes("1abc"));
        assert!(requires_quotes("$x"));
        assert!(requires_quotes("first name"));
        assert!(requires_quotes(""));
    }

    #[test]
    fn test_normalize_upper_case() {
        assert_eq!(normalize_name("USERS"), "users");
        assert_eq!(normalize_name("USER_ID"), "user_id");
    }

    #[test]
    fn test_normalize_preserves_mixed_and_reserved() {
        assert_eq!(normalize_name("MyTable"), "MyTable");
        assert_eq!(normalize_name("ORDER"), "ORDER");
        assert_eq!(normalize_name("FIRST NAME"), "FIRST NAME");
        assert_eq!(normalize_name("1ST"), "1ST");
        assert_eq!(normalize_name("lower"), "lower");
    }

    #[test]
    fn test_denormalize() {
        assert_eq!(denormalize_name("users"), "USERS");
        assert_eq!(denormalize_name("MyTable"), "MyTable");
        assert_eq!(denormalize_name("order"), "order");
        assert_eq!(denormalize_name("first name"), "first name");
    }

    #[test]
    fn test_round_trip_upper_case() {
        for name in ["USERS", "ORDER_ITEMS", "A1", "X$Y"] {
            assert_eq!(denormalize_name(&normalize_name(name)), name);
            assert_eq!(normalize_name(name), name.to_lowercase());
        }
    }

    #[test]
    fn test_blank_names_pass_through() {
        assert_eq!(normalize_name(""), "");
        assert_eq!(normalize_name("   "), "   ");
        assert_eq!(denormalize_name(""), "");
        assert_eq!(denormalize_name(" \t"), " \t");
    }

    #[test]
    fn test_optional_names() {
        assert_eq!(normalize_opt(None), None);
        assert_eq!(normalize_opt(Some("PK_1")), Some("pk_1".to_string()));
        assert_eq!(denormalize_opt(Some("pk_1")), Some("PK_1".to_string()));
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("users"), "\"users\"");
        assert_eq!(quote_identifier("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn test_format_identifier() {
        assert_eq!(format_identifier("users"), "users");
        assert_eq!(format_identifier("select"), "\"select\"");
        assert_eq!(format_identifier("MyTable"), "\"MyTable\"");
        assert_eq!(
            format_qualified(Some("sales"), "Order"),
            "sales.\"Order\""
        );
        assert_eq!(format_table(None, "users"), "users");
        assert_eq!(format_sequence(Some("public"), "seq_1"), "public.seq_1");
    }

    #[test]
    fn test_unquote_identifier() {
        assert_eq!(unquote_identifier("\"MyTable\""), "MyTable");
        assert_eq!(unquote_identifier("  ID "), "ID");
        assert_eq!(unquote_identifier("\"a\"\"b\""), "a\"b");
    }

    #[test]
    fn test_identifier_states() {
        let raw = Identifier::raw("CUSTOMERS");
        assert_eq!(raw.state(), NameState::Raw);
        assert_eq!(raw.denormalize(), "CUSTOMERS");

        let normalized = raw.to_normalized();
        assert_eq!(normalized.as_str(), "customers");
        assert_eq!(normalized.state(), NameState::Normalized);
        assert_eq!(normalized.denormalize(), "CUSTOMERS");
        assert_eq!(normalized.to_string(), "customers");
    }
}
