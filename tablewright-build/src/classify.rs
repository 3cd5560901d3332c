//! Member classification.
//!
//! Every declared member of a description is sorted into exactly one
//! bucket. Rules are tried in order and the first match wins:
//!
//! 1. A member named after a lifecycle phase is a hook.
//! 2. A virtual member is a computed field.
//! 3. A table method is the post-definition callback when named
//!    [`ON_DEFINE`], otherwise a table method.
//! 4. A field is a stored field. Its deferred validators are resolved
//!    against the database and its name is stamped in.
//! 5. An index is an index.
//! 6. A row method is a method field.
//! 7. Anything else is an opaque table option.
//!
//! Members whose name starts with [`RESERVED_PREFIX`] are metadata and are
//! skipped.

use indexmap::IndexMap;
use smol_str::SmolStr;
use tablewright_schema::{
    Database, FieldDefinition, Hook, ID_FIELD, Index, Member, ON_DEFINE, Phase, RESERVED_PREFIX,
    SchemaError, TableDescription, TableMethod, Value, validator::resolve_all,
};
use tracing::trace;

use crate::error::{BuildError, BuildResult};

/// The classified members of one description.
#[derive(Debug, Default)]
pub struct Classification {
    /// Field-like members in declaration order.
    pub fields: Vec<FieldDefinition>,
    /// Hooks keyed by phase.
    pub hooks: IndexMap<Phase, Hook>,
    /// Table methods keyed by name.
    pub table_methods: IndexMap<SmolStr, TableMethod>,
    /// Index declarations keyed by name.
    pub indexes: IndexMap<SmolStr, Index>,
    /// Opaque keyword options keyed by name.
    pub options: IndexMap<SmolStr, Value>,
    /// The post-definition callback, if declared.
    pub on_define: Option<TableMethod>,
    /// Whether a stored field is literally named `id`.
    pub has_id_name: bool,
    /// Whether a stored field's first type argument is the `id` tag.
    pub has_id_type: bool,
}

impl Classification {
    /// Check if nothing but fields were declared.
    pub fn is_fields_only(&self) -> bool {
        self.hooks.is_empty()
            && self.table_methods.is_empty()
            && self.indexes.is_empty()
            && self.options.is_empty()
            && self.on_define.is_none()
    }
}

/// Classify the members of a description.
///
/// `table` names the table in errors; it may differ from the description
/// name when a group registers the description under another name.
pub fn classify(
    table: &str,
    description: &TableDescription,
    db: &dyn Database,
) -> BuildResult<Classification> {
    let mut out = Classification::default();

    for (name, member) in description.members() {
        if name.starts_with(RESERVED_PREFIX) {
            trace!(table, member = name, "Skipping reserved member");
            continue;
        }

        if let Some(phase) = Phase::from_str(name) {
            match member {
                Member::Hook(hook) => {
                    trace!(table, member = name, "Classified as hook");
                    out.hooks.insert(phase, hook.clone());
                    continue;
                }
                other => {
                    return Err(SchemaError::invalid_hook(table, name, other.kind().as_str()).into());
                }
            }
        }

        trace!(table, member = name, kind = %member.kind(), "Classified member");

        match member {
            Member::Virtual(getter) => {
                out.fields
                    .push(FieldDefinition::virtual_field(name, getter.clone()));
            }
            Member::TableMethod(method) if name == ON_DEFINE => {
                out.on_define = Some(method.clone());
            }
            Member::TableMethod(method) => {
                out.table_methods.insert(name.into(), method.clone());
            }
            Member::Field(field) => {
                let mut field = field.clone();
                field.stamp(name);
                let validators =
                    resolve_all(&field.requires, db).map_err(|source| BuildError::Validator {
                        table: table.to_string(),
                        field: name.to_string(),
                        source,
                    })?;

                out.has_id_name |= name == ID_FIELD;
                out.has_id_type |= field.has_id_type();
                out.fields.push(FieldDefinition::plain(
                    name,
                    field.type_args,
                    field.options,
                    validators,
                ));
            }
            Member::Index(index) => {
                out.indexes.insert(name.into(), index.clone());
            }
            Member::Method(method) => {
                out.fields.push(FieldDefinition::method(name, method.clone()));
            }
            Member::Option(value) => {
                out.options.insert(name.into(), value.clone());
            }
            Member::Hook(_) => {
                return Err(SchemaError::invalid_member(
                    table,
                    name,
                    "hooks must be declared under a lifecycle phase name",
                )
                .into());
            }
        }
    }

    Ok(out)
}
