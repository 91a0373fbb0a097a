//! Memoization of reflection results.
//!
//! A [`ReflectionCache`] is owned by the caller and handed to each
//! [`Reflector`](super::Reflector) call. Its lifetime is the caller's
//! decision: keep one per reflection session, and call
//! [`invalidate_table`](ReflectionCache::invalidate_table) or
//! [`clear`](ReflectionCache::clear) after changing the schema.
//!
//! The map is concurrent, so several threads may reflect through the same
//! cache. Two threads missing on the same key at once both go to the
//! database; the later insert wins.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

use super::descriptors::{
    ColumnReflection, ForeignKeyConstraint, IndexDescriptor, PrimaryKeyConstraint,
};

/// Identifies one reflection call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Operation name, e.g. `get_columns`.
    pub operation: &'static str,
    /// Resolved schema, normalized.
    pub schema: String,
    /// Object name the call is about; `None` for schema-wide listings.
    pub name: Option<String>,
    /// Operation-specific flags (e.g. whether auto-indexes were requested).
    pub flags: u8,
}

impl CacheKey {
    /// Creates a key for a call about one object.
    #[must_use]
    pub fn object(operation: &'static str, schema: &str, name: &str) -> Self {
        Self {
            operation,
            schema: schema.to_string(),
            name: Some(name.to_string()),
            flags: 0,
        }
    }

    /// Creates a key for a schema-wide listing.
    #[must_use]
    pub fn listing(operation: &'static str, schema: &str) -> Self {
        Self {
            operation,
            schema: schema.to_string(),
            name: None,
            flags: 0,
        }
    }

    /// Sets the flags.
    #[must_use]
    pub const fn with_flags(mut self, flags: u8) -> Self {
        self.flags = flags;
        self
    }
}

/// A cached reflection result.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedValue {
    /// Existence check.
    Flag(bool),
    /// Name listing.
    Names(Vec<String>),
    /// Optional text (e.g. a view definition).
    Text(Option<String>),
    /// Columns and type warnings.
    Columns(ColumnReflection),
    /// Primary key.
    PrimaryKey(PrimaryKeyConstraint),
    /// Foreign keys.
    ForeignKeys(Vec<ForeignKeyConstraint>),
    /// Indexes.
    Indexes(Vec<IndexDescriptor>),
}

/// Values that can be stored in a [`ReflectionCache`].
pub trait Cacheable: Sized {
    /// Wraps the value.
    fn into_cached(self) -> CachedValue;

    /// Unwraps a value of this kind; `None` if the entry holds another kind.
    fn from_cached(value: &CachedValue) -> Option<Self>;
}

macro_rules! impl_cacheable {
    ($ty:ty, $variant:ident) => {
        impl Cacheable for $ty {
            fn into_cached(self) -> CachedValue {
                CachedValue::$variant(self)
            }

            fn from_cached(value: &CachedValue) -> Option<Self> {
                match value {
                    CachedValue::$variant(v) => Some(v.clone()),
                    _ => None,
                }
            }
        }
    };
}

impl_cacheable!(bool, Flag);
impl_cacheable!(Vec<String>, Names);
impl_cacheable!(Option<String>, Text);
impl_cacheable!(ColumnReflection, Columns);
impl_cacheable!(PrimaryKeyConstraint, PrimaryKey);
impl_cacheable!(Vec<ForeignKeyConstraint>, ForeignKeys);
impl_cacheable!(Vec<IndexDescriptor>, Indexes);

/// Hit/miss counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    /// Number of stored entries.
    pub entries: usize,
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that went to the database.
    pub misses: u64,
}

/// Thread-safe reflection cache.
#[derive(Debug, Default)]
pub struct ReflectionCache {
    entries: DashMap<CacheKey, CachedValue>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ReflectionCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a value, counting the hit or miss.
    pub fn get<T: Cacheable>(&self, key: &CacheKey) -> Option<T> {
        let found = self.entries.get(key).and_then(|entry| T::from_cached(&entry));
        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(operation = key.operation, name = ?key.name, "reflection cache hit");
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        found
    }

    /// Stores a value.
    pub fn insert<T: Cacheable>(&self, key: CacheKey, value: T) {
        self.entries.insert(key, value.into_cached());
    }

    /// Returns the cached value for `key`, or computes and stores it.
    ///
    /// Errors from `compute` are returned and nothing is stored.
    pub fn get_or_try_insert_with<T, E, F>(&self, key: CacheKey, compute: F) -> Result<T, E>
    where
        T: Cacheable + Clone,
        F: FnOnce() -> Result<T, E>,
    {
        if let Some(value) = self.get::<T>(&key) {
            return Ok(value);
        }
        let value = compute()?;
        self.insert(key, value.clone());
        Ok(value)
    }

    /// Drops every entry about `table`, plus the schema-wide listings of its
    /// schema. With no schema, matching entries in every schema are dropped.
    pub fn invalidate_table(&self, table: &str, schema: Option<&str>) {
        let before = self.entries.len();
        self.entries.retain(|key, _| {
            let same_schema = schema.map_or(true, |s| key.schema == s);
            let about_table = match key.name {
                Some(ref name) => name == table,
                None => true,
            };
            !(same_schema && about_table)
        });
        tracing::debug!(
            table,
            removed = before.saturating_sub(self.entries.len()),
            "invalidated reflection cache entries"
        );
    }

    /// Drops every entry and resets the counters.
    pub fn clear(&self) {
        self.entries.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the cache holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}
