//! Signature (mixin) resolution.
//!
//! A signature is a description used only as a field source. It is compiled
//! once per database through [`Database::define_field_source`] and the
//! result is shared by every table that lists it.
//!
//! # Examples
//!
//! ```rust
//! use tablewright_build::{MemoryDatabase, SignatureCache};
//! use tablewright_schema::{Field, TableDescription};
//!
//! let db = MemoryDatabase::new();
//! let created = TableDescription::builder("sign_created")
//!     .field("created", Field::new("datetime"))
//!     .build();
//!
//! let cache = SignatureCache::new();
//! let first = cache.resolve(&db, &created).unwrap();
//! let second = cache.resolve(&db, &created).unwrap();
//! assert!(std::sync::Arc::ptr_eq(&first, &second));
//! assert_eq!(db.field_source_count(), 1);
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use smol_str::SmolStr;
use tablewright_schema::{
    Database, DatabaseToken, DescriptionId, FieldDefinition, TableDefinition, TableDescription,
};
use tracing::debug;

use crate::classify::classify;
use crate::error::BuildResult;

/// The compiled field list of a signature.
#[derive(Debug, Clone)]
pub struct CompiledSignature {
    name: SmolStr,
    fields: Vec<FieldDefinition>,
}

impl CompiledSignature {
    /// Get the signature name.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Get the fields, in the order tables receive them.
    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    /// Get the field names, in order.
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(FieldDefinition::name).collect()
    }
}

/// Statistics for the signature cache.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Number of signatures currently cached.
    pub cached_count: usize,
}

impl CacheStats {
    /// Get the cache hit rate.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

type CacheKey = (DatabaseToken, DescriptionId);

/// A cache of compiled signatures keyed by `(database, description)`.
#[derive(Debug, Default)]
pub struct SignatureCache {
    cache: RwLock<HashMap<CacheKey, Arc<CompiledSignature>>>,
    stats: RwLock<CacheStats>,
}

impl SignatureCache {
    /// Create a new empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the compiled signature, compiling it on first use for this database.
    ///
    /// Nested signatures are expanded after the signature's own fields.
    pub fn resolve(
        &self,
        db: &dyn Database,
        signature: &TableDescription,
    ) -> BuildResult<Arc<CompiledSignature>> {
        let key = (db.token(), signature.id());

        {
            let cache = self.cache.read();
            if let Some(compiled) = cache.get(&key) {
                self.stats.write().hits += 1;
                return Ok(Arc::clone(compiled));
            }
        }

        debug!(signature = signature.name(), "Compiling signature");
        let classification = classify(signature.name(), signature, db)?;
        if !classification.is_fields_only() {
            debug!(
                signature = signature.name(),
                "Ignoring non-field members of signature"
            );
        }

        let mut fields = classification.fields;
        for nested in signature.mixins() {
            let compiled = self.resolve(db, nested)?;
            fields.extend(compiled.fields.iter().cloned());
        }

        let fields = db.define_field_source(TableDefinition::new(signature.name(), fields))?;
        let compiled = Arc::new(CompiledSignature {
            name: signature.name().into(),
            fields,
        });

        {
            let mut cache = self.cache.write();
            cache.insert(key, Arc::clone(&compiled));
        }

        {
            let mut stats = self.stats.write();
            stats.misses += 1;
            stats.cached_count = self.cache.read().len();
        }

        Ok(compiled)
    }

    /// Check if a signature is compiled for a database.
    pub fn contains(&self, db: DatabaseToken, signature: DescriptionId) -> bool {
        self.cache.read().contains_key(&(db, signature))
    }

    /// Drop every signature compiled for a database.
    ///
    /// Hit and miss counts are kept; they total every lookup since the
    /// cache was created or last cleared.
    pub fn evict_database(&self, db: DatabaseToken) {
        self.cache.write().retain(|(token, _), _| *token != db);
        self.stats.write().cached_count = self.cache.read().len();
    }

    /// Clear the cache and reset its statistics.
    pub fn clear(&self) {
        self.cache.write().clear();
        *self.stats.write() = CacheStats::default();
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.read().clone();
        stats.cached_count = self.cache.read().len();
        stats
    }

    /// Get the number of cached signatures.
    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }
}
