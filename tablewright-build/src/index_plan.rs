//! Turns declared indexes into an index plan.

use indexmap::IndexMap;
use smol_str::SmolStr;
use tablewright_migrate::IndexPlanEntry;
use tablewright_schema::{ColumnRef, Index};

use crate::error::{BuildError, BuildResult};

/// Extract the index plan of a table, in declaration order.
///
/// [`ColumnRef::Field`] references must name one of `field_names`; literal
/// column names are passed through unchecked.
pub fn extract_plan(
    table: &str,
    indexes: &IndexMap<SmolStr, Index>,
    field_names: &[SmolStr],
) -> BuildResult<Vec<IndexPlanEntry>> {
    indexes
        .iter()
        .map(|(name, index)| {
            let unknown = index.columns.iter().find_map(|column| match column {
                ColumnRef::Field(field) if !field_names.contains(field) => Some(field),
                _ => None,
            });
            if let Some(field) = unknown {
                return Err(BuildError::UnknownIndexColumn {
                    table: table.to_string(),
                    index: name.to_string(),
                    column: field.to_string(),
                });
            }
            Ok(IndexPlanEntry::new(
                name.clone(),
                index.column_names(),
                index.options.clone(),
            ))
        })
        .collect()
}
