//! Primary-key and naming policies.

use indexmap::IndexMap;
use smol_str::SmolStr;
use tablewright_schema::{ID_FIELD, Value};

use crate::error::{BuildError, BuildResult};

/// Table option holding an explicit primary key.
pub const PRIMARY_KEY_OPTION: &str = "primarykey";

/// Table option holding an explicit physical name.
pub const RNAME_OPTION: &str = "rname";

/// Decide the primary key of a table.
///
/// Returns `["id"]` only when `auto_pk` is on, a field is named `id`, no field
/// has the `id` type tag, and no explicit key was given. Otherwise the
/// explicit key is returned as is. `None` leaves the key to the layer.
pub fn primary_key(
    has_id_name: bool,
    has_id_type: bool,
    auto_pk: bool,
    explicit: Option<Vec<SmolStr>>,
) -> Option<Vec<SmolStr>> {
    match explicit {
        Some(key) => Some(key),
        None if auto_pk && has_id_name && !has_id_type => Some(vec![SmolStr::new(ID_FIELD)]),
        None => None,
    }
}

/// Compute the physical name of a table.
pub fn physical_name(prefix: Option<&str>, name: &str) -> SmolStr {
    match prefix {
        Some(prefix) if !prefix.is_empty() => SmolStr::new(format!("{prefix}{name}")),
        _ => SmolStr::new(name),
    }
}

/// Take the explicit primary key out of a table's options.
///
/// A null value counts as absent. A single name is accepted as a one-column key.
pub(crate) fn take_primary_key(
    table: &str,
    options: &mut IndexMap<SmolStr, Value>,
) -> BuildResult<Option<Vec<SmolStr>>> {
    let Some(value) = options.shift_remove(PRIMARY_KEY_OPTION) else {
        return Ok(None);
    };

    match value {
        Value::Null => Ok(None),
        Value::String(name) => Ok(Some(vec![SmolStr::new(name)])),
        Value::Array(items) if !items.is_empty() => items
            .into_iter()
            .map(|item| match item {
                Value::String(name) => Ok(SmolStr::new(name)),
                other => Err(BuildError::invalid_option(
                    table,
                    PRIMARY_KEY_OPTION,
                    format!("expected a column name, found `{other}`"),
                )),
            })
            .collect::<BuildResult<Vec<_>>>()
            .map(Some),
        other => Err(BuildError::invalid_option(
            table,
            PRIMARY_KEY_OPTION,
            format!("expected a list of column names, found `{other}`"),
        )),
    }
}

/// Take the explicit physical name out of a table's options.
pub(crate) fn take_rname(
    table: &str,
    options: &mut IndexMap<SmolStr, Value>,
) -> BuildResult<Option<SmolStr>> {
    match options.shift_remove(RNAME_OPTION) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(name)) => Ok(Some(SmolStr::new(name))),
        Some(other) => Err(BuildError::invalid_option(
            table,
            RNAME_OPTION,
            format!("expected a table name, found `{other}`"),
        )),
    }
}
