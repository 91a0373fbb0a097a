//! Connection helpers.

use serde::{Deserialize, Serialize};

/// Builds the JDBC URL for an H2 database in PostgreSQL compatibility mode.
///
/// `database` is anything H2 accepts after `jdbc:h2:`: `mem:name`,
/// `file:/path`, `tcp://host/path` or a bare path.
#[must_use]
pub fn jdbc_url(database: &str) -> String {
    format!("jdbc:h2:{database};MODE=PostgreSQL")
}

/// How connections to a database should be pooled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolStrategy {
    /// One shared connection. In-memory databases vanish when their last
    /// connection closes, so the connection is never released.
    Singleton,
    /// A fresh connection per use; nothing is retained between uses.
    Unpooled,
}

impl PoolStrategy {
    /// Picks the strategy for a database name.
    #[must_use]
    pub fn for_database(database: &str) -> Self {
        let database = database.trim();
        if database.is_empty() || database.starts_with("mem:") {
            Self::Singleton
        } else {
            Self::Unpooled
        }
    }
}
