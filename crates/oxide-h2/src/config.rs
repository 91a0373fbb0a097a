//! Dialect configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::identifier::normalize_name;

/// Schema H2 places objects in when none is given.
pub const DEFAULT_SCHEMA: &str = "PUBLIC";

/// Settings that shape how the dialect talks to a database.
///
/// Loadable from TOML or JSON; every field has a default so partial files
/// are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialectConfig {
    /// Schema used when an operation is called without one, as the database
    /// spells it.
    pub default_schema: String,
    /// Whether names may be sent to the database as arbitrary Unicode text.
    ///
    /// When disabled, names bound into catalog queries must be ASCII.
    pub unicode_binds: bool,
    /// Roll back the local session after a prepared two-phase commit.
    ///
    /// Older H2 integrations did this unconditionally; it is kept behind a
    /// flag for callers that depend on the session reset.
    pub legacy_twophase_rollback: bool,
    /// Whether [`Reflector`](crate::reflect::Reflector) uses its cache when
    /// one is supplied.
    pub cache_reflection: bool,
}

impl Default for DialectConfig {
    fn default() -> Self {
        Self {
            default_schema: DEFAULT_SCHEMA.to_string(),
            unicode_binds: true,
            legacy_twophase_rollback: false,
            cache_reflection: true,
        }
    }
}

impl DialectConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default schema.
    #[must_use]
    pub fn with_default_schema(mut self, schema: impl Into<String>) -> Self {
        self.default_schema = schema.into();
        self
    }

    /// Enables or disables Unicode bind values.
    #[must_use]
    pub const fn with_unicode_binds(mut self, enabled: bool) -> Self {
        self.unicode_binds = enabled;
        self
    }

    /// Enables or disables the legacy rollback after prepared commits.
    #[must_use]
    pub const fn with_legacy_twophase_rollback(mut self, enabled: bool) -> Self {
        self.legacy_twophase_rollback = enabled;
        self
    }

    /// Enables or disables reflection caching.
    #[must_use]
    pub const fn with_cache_reflection(mut self, enabled: bool) -> Self {
        self.cache_reflection = enabled;
        self
    }

    /// The default schema in caller-facing (normalized) form.
    #[must_use]
    pub fn normalized_default_schema(&self) -> String {
        normalize_name(&self.default_schema)
    }

    /// Checks that a name can be bound under the configured encoding.
    pub fn check_bind_text(&self, text: &str) -> Result<()> {
        if !self.unicode_binds && !text.is_ascii() {
            return Err(Error::Config(format!(
                "non-ASCII name {text:?} cannot be bound with unicode_binds disabled"
            )));
        }
        Ok(())
    }
}
