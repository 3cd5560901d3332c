//! Index diffing between a declared plan and persisted index state.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use tablewright_schema::Value;

use crate::plan::IndexPlanEntry;

/// An index as currently persisted for a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexInfo {
    /// Index name.
    pub name: SmolStr,
    /// Physical table name.
    pub table_name: SmolStr,
    /// Columns in the index.
    pub columns: Vec<SmolStr>,
    /// Index options.
    pub options: IndexMap<SmolStr, Value>,
}

impl IndexInfo {
    /// Build the persisted form of a plan entry.
    pub fn from_plan(table_name: impl Into<SmolStr>, entry: &IndexPlanEntry) -> Self {
        Self {
            name: entry.name.clone(),
            table_name: table_name.into(),
            columns: entry.columns.clone(),
            options: entry.options.clone(),
        }
    }

    /// Check whether this index matches a plan entry.
    pub fn matches(&self, entry: &IndexPlanEntry) -> bool {
        self.columns == entry.columns && self.options == entry.options
    }
}

/// The changes needed to bring one table's indexes in line with its plan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexDiff {
    /// Physical table name.
    pub table_name: SmolStr,
    /// Indexes to create, in plan order.
    pub create_indexes: Vec<IndexPlanEntry>,
    /// Indexes to drop.
    pub drop_indexes: Vec<SmolStr>,
    /// Indexes already up to date.
    pub unchanged: Vec<SmolStr>,
}

impl IndexDiff {
    /// Check if there are any differences.
    pub fn is_empty(&self) -> bool {
        self.create_indexes.is_empty() && self.drop_indexes.is_empty()
    }

    /// Get a human-readable summary of the diff.
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();

        if !self.create_indexes.is_empty() {
            parts.push(format!("Create {} indexes", self.create_indexes.len()));
        }
        if !self.drop_indexes.is_empty() {
            parts.push(format!("Drop {} indexes", self.drop_indexes.len()));
        }

        if parts.is_empty() {
            "No changes".to_string()
        } else {
            parts.join(", ")
        }
    }
}

/// Computes [`IndexDiff`]s.
///
/// An index whose columns or options changed is dropped and recreated.
#[derive(Debug, Clone, Default)]
pub struct IndexDiffer {
    keep_unknown: bool,
}

impl IndexDiffer {
    /// Create a differ that drops persisted indexes missing from the plan.
    pub fn new() -> Self {
        Self::default()
    }

    /// Leave persisted indexes that are not in the plan alone.
    pub fn keep_unknown(mut self, keep: bool) -> Self {
        self.keep_unknown = keep;
        self
    }

    /// Diff a plan against the persisted indexes of one table.
    pub fn diff(
        &self,
        table_name: &str,
        existing: &[IndexInfo],
        plan: &[IndexPlanEntry],
    ) -> IndexDiff {
        let mut diff = IndexDiff {
            table_name: table_name.into(),
            ..IndexDiff::default()
        };

        let current: IndexMap<&str, &IndexInfo> =
            existing.iter().map(|i| (i.name.as_str(), i)).collect();

        for entry in plan {
            match current.get(entry.name.as_str()) {
                Some(info) if info.matches(entry) => diff.unchanged.push(entry.name.clone()),
                Some(_) => {
                    diff.drop_indexes.push(entry.name.clone());
                    diff.create_indexes.push(entry.clone());
                }
                None => diff.create_indexes.push(entry.clone()),
            }
        }

        if !self.keep_unknown {
            for info in existing {
                if !plan.iter().any(|e| e.name == info.name) {
                    diff.drop_indexes.push(info.name.clone());
                }
            }
        }

        diff
    }
}
