//! Persisted index state and the store-backed migrator.

use indexmap::IndexMap;
use parking_lot::RwLock;
use smol_str::SmolStr;
use tablewright_schema::TableHandle;
use tracing::{debug, info};

use crate::diff::{IndexDiff, IndexDiffer, IndexInfo};
use crate::error::{MigrateResult, MigrationError};
use crate::plan::{IndexMigrator, IndexPlanEntry, validate_plan};

/// Persisted index state, keyed by physical table name.
pub trait IndexStore: Send + Sync {
    /// Get the indexes currently persisted for a table.
    fn indexes(&self, table_name: &str) -> MigrateResult<Vec<IndexInfo>>;

    /// Persist a new index.
    fn create_index(&self, index: IndexInfo) -> MigrateResult<()>;

    /// Remove a persisted index.
    fn drop_index(&self, table_name: &str, index_name: &str) -> MigrateResult<()>;
}

/// An index store kept in memory.
#[derive(Debug, Default)]
pub struct MemoryIndexStore {
    tables: RwLock<IndexMap<SmolStr, Vec<IndexInfo>>>,
}

impl MemoryIndexStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of the indexes persisted for a table, in creation order.
    pub fn index_names(&self, table_name: &str) -> Vec<SmolStr> {
        self.tables
            .read()
            .get(table_name)
            .map(|indexes| indexes.iter().map(|i| i.name.clone()).collect())
            .unwrap_or_default()
    }
}

impl IndexStore for MemoryIndexStore {
    fn indexes(&self, table_name: &str) -> MigrateResult<Vec<IndexInfo>> {
        Ok(self
            .tables
            .read()
            .get(table_name)
            .cloned()
            .unwrap_or_default())
    }

    fn create_index(&self, index: IndexInfo) -> MigrateResult<()> {
        let mut tables = self.tables.write();
        let indexes = tables.entry(index.table_name.clone()).or_default();
        if indexes.iter().any(|i| i.name == index.name) {
            return Err(MigrationError::store(format!(
                "index `{}` already exists on `{}`",
                index.name, index.table_name
            )));
        }
        indexes.push(index);
        Ok(())
    }

    fn drop_index(&self, table_name: &str, index_name: &str) -> MigrateResult<()> {
        let mut tables = self.tables.write();
        let indexes = tables
            .get_mut(table_name)
            .ok_or_else(|| MigrationError::store(format!("no indexes on `{table_name}`")))?;
        let before = indexes.len();
        indexes.retain(|i| i.name != index_name);
        if indexes.len() == before {
            return Err(MigrationError::store(format!(
                "index `{index_name}` does not exist on `{table_name}`"
            )));
        }
        Ok(())
    }
}

/// An [`IndexMigrator`] that reconciles plans against an [`IndexStore`].
///
/// Indexes are keyed by the table's physical name.
pub struct StoreMigrator<S: IndexStore> {
    store: S,
    differ: IndexDiffer,
}

impl<S: IndexStore> StoreMigrator<S> {
    /// Create a migrator over a store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            differ: IndexDiffer::new(),
        }
    }

    /// Use a custom differ.
    pub fn with_differ(mut self, differ: IndexDiffer) -> Self {
        self.differ = differ;
        self
    }

    /// Get the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Compute the diff for a table without applying it.
    pub fn plan(&self, table: &dyn TableHandle, plan: &[IndexPlanEntry]) -> MigrateResult<IndexDiff> {
        let table_name = table.physical_name();
        validate_plan(table_name, plan)?;
        let existing = self.store.indexes(table_name)?;
        Ok(self.differ.diff(table_name, &existing, plan))
    }

    /// Apply a previously computed diff.
    pub fn apply(&self, diff: &IndexDiff) -> MigrateResult<()> {
        for name in &diff.drop_indexes {
            debug!(table = %diff.table_name, index = %name, "Dropping index");
            self.store.drop_index(&diff.table_name, name)?;
        }
        for entry in &diff.create_indexes {
            debug!(table = %diff.table_name, index = %entry.name, "Creating index");
            self.store
                .create_index(IndexInfo::from_plan(diff.table_name.clone(), entry))?;
        }
        Ok(())
    }
}

impl<S: IndexStore> IndexMigrator for StoreMigrator<S> {
    fn migrate(&self, table: &dyn TableHandle, plan: &[IndexPlanEntry]) -> MigrateResult<()> {
        let diff = self.plan(table, plan)?;
        if diff.is_empty() {
            debug!(table = %diff.table_name, "Indexes up to date");
            return Ok(());
        }
        info!(table = %diff.table_name, summary = %diff.summary(), "Migrating indexes");
        self.apply(&diff)
    }
}

impl<S: IndexStore + std::fmt::Debug> std::fmt::Debug for StoreMigrator<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreMigrator")
            .field("store", &self.store)
            .field("differ", &self.differ)
            .finish()
    }
}
