//! Placeholder rewriting.
//!
//! Statements reach the executor with either `?` placeholders (compiled
//! statements) or `:name` placeholders (catalog queries). The PostgreSQL wire
//! protocol spoken by H2's server mode only understands `$n`, so both are
//! rewritten and the bind values reordered to match.

use oxide_h2::executor::{BoundStatement, ExecutorError, SqlValue};

/// SQL text with `$n` placeholders and the values to bind, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionalStatement {
    /// The rewritten SQL text.
    pub sql: String,
    /// Values for `$1`, `$2`, ...
    pub values: Vec<SqlValue>,
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Rewrites `?` and `:name` placeholders to `$n`.
///
/// Placeholders inside string literals and quoted identifiers are left
/// alone, as are `::` casts. A name used twice binds to the same `$n`.
///
/// # Errors
///
/// Fails when a placeholder has no matching bind value.
pub fn to_positional(statement: &BoundStatement) -> Result<PositionalStatement, ExecutorError> {
    let source = statement.sql.as_str();
    let mut sql = String::with_capacity(source.len());
    let mut values: Vec<SqlValue> = Vec::new();
    let mut named: Vec<(&str, usize)> = Vec::new();
    let mut positional = statement.params.iter();
    let mut chars = source.char_indices().peekable();
    let mut quote: Option<char> = None;
    let mut prev: Option<char> = None;

    while let Some((i, c)) = chars.next() {
        if let Some(q) = quote {
            sql.push(c);
            if c == q {
                quote = None;
            }
            prev = Some(c);
            continue;
        }

        let name_follows = chars.peek().is_some_and(|&(_, n)| is_name_start(n));
        match c {
            '\'' | '"' => {
                quote = Some(c);
                sql.push(c);
            }
            '?' => {
                let (_, value) = positional.next().ok_or_else(|| {
                    ExecutorError::new(format!(
                        "placeholder {} has no bind value",
                        values.len() + 1
                    ))
                })?;
                values.push(value.clone());
                sql.push_str(&format!("${}", values.len()));
            }
            ':' if name_follows && prev != Some(':') => {
                let start = i + 1;
                let mut end = start;
                while let Some(&(j, n)) = chars.peek() {
                    if !is_name_char(n) {
                        break;
                    }
                    end = j + n.len_utf8();
                    chars.next();
                }
                let name = &source[start..end];
                let number = if let Some(&(_, number)) = named.iter().find(|(n, _)| *n == name) {
                    number
                } else {
                    let value = statement
                        .param(name)
                        .ok_or_else(|| ExecutorError::new(format!("no value bound for :{name}")))?;
                    values.push(value.clone());
                    named.push((name, values.len()));
                    values.len()
                };
                sql.push_str(&format!("${number}"));
            }
            _ => sql.push(c),
        }
        prev = Some(c);
    }

    Ok(PositionalStatement { sql, values })
}
