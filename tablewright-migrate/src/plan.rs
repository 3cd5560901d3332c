//! Index plans and the migrator interface.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use tablewright_schema::{TableHandle, Value};

use crate::error::{MigrateResult, MigrationError};

/// One normalized index of a table: `(name, columns, options)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexPlanEntry {
    /// Index name.
    pub name: SmolStr,
    /// Resolved column names, in order.
    pub columns: Vec<SmolStr>,
    /// Index options; always carries `unique`.
    pub options: IndexMap<SmolStr, Value>,
}

impl IndexPlanEntry {
    /// Create a plan entry.
    pub fn new(
        name: impl Into<SmolStr>,
        columns: impl IntoIterator<Item = impl Into<SmolStr>>,
        options: IndexMap<SmolStr, Value>,
    ) -> Self {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            options,
        }
    }

    /// Check whether the index is unique.
    pub fn is_unique(&self) -> bool {
        self.options
            .get("unique")
            .and_then(Value::as_bool)
            .unwrap_or(true)
    }

    /// Check the entry is well formed for a table.
    pub fn validate(&self, table: &str) -> MigrateResult<()> {
        if self.name.is_empty() {
            return Err(MigrationError::invalid_index(table, "", "index name is empty"));
        }
        if self.columns.is_empty() {
            return Err(MigrationError::invalid_index(
                table,
                self.name.as_str(),
                "index has no columns",
            ));
        }
        Ok(())
    }

    /// Express the entry as the `(name, columns, options)` triple.
    pub fn as_triple(&self) -> (&str, Vec<&str>, &IndexMap<SmolStr, Value>) {
        (
            self.name.as_str(),
            self.columns.iter().map(SmolStr::as_str).collect(),
            &self.options,
        )
    }
}

/// Reconciles a table's declared indexes with whatever index state is persisted.
///
/// Closures with the same signature implement this trait.
pub trait IndexMigrator: Send + Sync {
    /// Bring the table's indexes in line with `plan`.
    fn migrate(&self, table: &dyn TableHandle, plan: &[IndexPlanEntry]) -> MigrateResult<()>;
}

impl<F> IndexMigrator for F
where
    F: Fn(&dyn TableHandle, &[IndexPlanEntry]) -> MigrateResult<()> + Send + Sync,
{
    fn migrate(&self, table: &dyn TableHandle, plan: &[IndexPlanEntry]) -> MigrateResult<()> {
        self(table, plan)
    }
}

/// Check that a plan is well formed and has no duplicate names.
pub fn validate_plan(table: &str, plan: &[IndexPlanEntry]) -> MigrateResult<()> {
    let mut seen = std::collections::HashSet::new();
    for entry in plan {
        entry.validate(table)?;
        if !seen.insert(entry.name.as_str()) {
            return Err(MigrationError::DuplicateIndex {
                table: table.to_string(),
                index: entry.name.to_string(),
            });
        }
    }
    Ok(())
}
