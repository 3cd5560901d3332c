//! Fields declared on table descriptions.

use indexmap::IndexMap;
use smol_str::SmolStr;

use super::Value;
use crate::validator::{DeferredValidator, Requirement, Validator};

/// Type tag that marks a field as the layer's own surrogate key.
pub const ID_TYPE: &str = "id";

/// Name of the field the primary-key policy looks for.
pub const ID_FIELD: &str = "id";

/// A stored field declared on a table description.
///
/// The field name is not part of the declaration: it is taken from the member name
/// the field is declared under and stamped in during classification.
#[derive(Debug, Clone, Default)]
pub struct Field {
    /// Name stamped at classification time.
    pub name: Option<SmolStr>,
    /// Type arguments; the first one is the type tag.
    pub type_args: Vec<SmolStr>,
    /// Keyword options.
    pub options: IndexMap<SmolStr, Value>,
    /// Validators, possibly deferred.
    pub requires: Vec<Requirement>,
}

impl Field {
    /// Create a field with a type tag, e.g. `"string"` or `"reference person"`.
    pub fn new(field_type: impl Into<SmolStr>) -> Self {
        Self {
            type_args: vec![field_type.into()],
            ..Self::default()
        }
    }

    /// Create a field without a type; the layer applies its default type.
    pub fn untyped() -> Self {
        Self::default()
    }

    /// Append an extra positional type argument.
    pub fn arg(mut self, arg: impl Into<SmolStr>) -> Self {
        self.type_args.push(arg.into());
        self
    }

    /// Set a keyword option.
    pub fn option(mut self, key: impl Into<SmolStr>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Mark the field as required.
    pub fn required(self) -> Self {
        self.option("required", true)
    }

    /// Mark the field as unique.
    pub fn unique(self) -> Self {
        self.option("unique", true)
    }

    /// Mark the field as not nullable.
    pub fn notnull(self) -> Self {
        self.option("notnull", true)
    }

    /// Set the default value.
    pub fn default_value(self, value: impl Into<Value>) -> Self {
        self.option("default", value)
    }

    /// Set the column length.
    pub fn length(self, length: u32) -> Self {
        self.option("length", length)
    }

    /// Set the display label.
    pub fn label(self, label: impl Into<String>) -> Self {
        self.option("label", label.into())
    }

    /// Add a validator.
    pub fn requires<V: Validator + 'static>(mut self, validator: V) -> Self {
        self.requires.push(Requirement::ready(validator));
        self
    }

    /// Add a validator that is built once the database is known.
    pub fn requires_deferred(mut self, validator: DeferredValidator) -> Self {
        self.requires.push(Requirement::Deferred(validator));
        self
    }

    /// Get the stamped name.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Get the type tag, if one was declared.
    pub fn field_type(&self) -> Option<&str> {
        self.type_args.first().map(SmolStr::as_str)
    }

    /// Check whether the first type argument is the literal `id` tag.
    pub fn has_id_type(&self) -> bool {
        self.field_type() == Some(ID_TYPE)
    }

    /// Check whether any validator still needs the database.
    pub fn has_deferred_requirements(&self) -> bool {
        self.requires.iter().any(Requirement::is_deferred)
    }

    /// Stamp the declaring member name into the field.
    pub fn stamp(&mut self, name: impl Into<SmolStr>) {
        self.name = Some(name.into());
    }
}
