//! Table descriptions and their builder.

use std::sync::Arc;
use std::sync::atomic::AtomicU64;

use indexmap::IndexMap;
use smol_str::SmolStr;

use super::member::{EXTRA, ON_DEFINE};
use super::{
    CallbackResult, Field, Hook, HookArgs, HookFlow, Index, Member, Phase, Row, RowMethod,
    TableMethod, Value, VirtualGetter, next_id,
};
use crate::layer::TableHandle;

static DESCRIPTION_IDS: AtomicU64 = AtomicU64::new(1);

/// Stable identity of a table description, used to memoise signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DescriptionId(u64);

impl DescriptionId {
    fn next() -> Self {
        Self(next_id(&DESCRIPTION_IDS))
    }

    /// Get the raw id value.
    pub fn get(&self) -> u64 {
        self.0
    }
}

/// The declared shape of one table, prior to compilation.
///
/// A description used as a mixin of other descriptions is a *signature*:
/// its fields are appended to every table that lists it.
#[derive(Debug)]
pub struct TableDescription {
    id: DescriptionId,
    name: SmolStr,
    members: IndexMap<SmolStr, Member>,
    mixins: Vec<Arc<TableDescription>>,
}

impl TableDescription {
    /// Start building a description.
    pub fn builder(name: impl Into<SmolStr>) -> TableDescriptionBuilder {
        TableDescriptionBuilder {
            name: name.into(),
            members: IndexMap::new(),
            mixins: vec![],
        }
    }

    /// Get the description id.
    pub fn id(&self) -> DescriptionId {
        self.id
    }

    /// Get the description name.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Iterate over members in declaration order.
    pub fn members(&self) -> impl Iterator<Item = (&str, &Member)> {
        self.members.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Get a member by name.
    pub fn member(&self, name: &str) -> Option<&Member> {
        self.members.get(name)
    }

    /// Number of declared members.
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Mixins, in listed order.
    pub fn mixins(&self) -> &[Arc<TableDescription>] {
        &self.mixins
    }

    /// Free-form metadata declared under [`EXTRA`].
    pub fn extra(&self) -> Option<&Value> {
        match self.members.get(EXTRA) {
            Some(Member::Option(value)) => Some(value),
            _ => None,
        }
    }
}

/// Builder for [`TableDescription`].
///
/// Members are kept in call order. Declaring a name twice replaces the
/// earlier member in place, so a description never holds duplicate names.
#[derive(Debug)]
pub struct TableDescriptionBuilder {
    name: SmolStr,
    members: IndexMap<SmolStr, Member>,
    mixins: Vec<Arc<TableDescription>>,
}

impl TableDescriptionBuilder {
    /// Declare a member of any kind.
    pub fn member(mut self, name: impl Into<SmolStr>, member: impl Into<Member>) -> Self {
        self.members.insert(name.into(), member.into());
        self
    }

    /// Declare a stored field.
    pub fn field(self, name: impl Into<SmolStr>, field: Field) -> Self {
        self.member(name, Member::Field(field))
    }

    /// Declare a computed field.
    pub fn virtual_field<F>(self, name: impl Into<SmolStr>, getter: F) -> Self
    where
        F: Fn(&Row) -> Value + Send + Sync + 'static,
    {
        self.member(name, Member::Virtual(VirtualGetter::new(getter)))
    }

    /// Declare a row-level method.
    pub fn method<F>(self, name: impl Into<SmolStr>, method: F) -> Self
    where
        F: Fn(&Row, &[Value]) -> CallbackResult<Value> + Send + Sync + 'static,
    {
        self.member(name, Member::Method(RowMethod::new(method)))
    }

    /// Declare a lifecycle hook under its phase name.
    pub fn hook<F>(self, phase: Phase, hook: F) -> Self
    where
        F: Fn(&HookArgs) -> CallbackResult<HookFlow> + Send + Sync + 'static,
    {
        self.member(phase.as_str(), Member::Hook(Hook::new(hook)))
    }

    /// Declare a table-level method.
    pub fn table_method<F>(self, name: impl Into<SmolStr>, method: F) -> Self
    where
        F: Fn(&dyn TableHandle, &[Value]) -> CallbackResult<Value> + Send + Sync + 'static,
    {
        self.member(name, Member::TableMethod(TableMethod::new(method)))
    }

    /// Declare the post-definition callback, run once the table is finished.
    pub fn on_define<F>(self, callback: F) -> Self
    where
        F: Fn(&dyn TableHandle) -> CallbackResult<()> + Send + Sync + 'static,
    {
        self.table_method(ON_DEFINE, move |table, _| {
            callback(table)?;
            Ok(Value::Null)
        })
    }

    /// Declare an index.
    pub fn index(self, name: impl Into<SmolStr>, index: Index) -> Self {
        self.member(name, Member::Index(index))
    }

    /// Declare an opaque table option.
    pub fn option(self, name: impl Into<SmolStr>, value: impl Into<Value>) -> Self {
        self.member(name, Member::Option(value.into()))
    }

    /// Attach free-form metadata for the group driver.
    pub fn extra(self, value: impl Into<Value>) -> Self {
        self.option(EXTRA, value)
    }

    /// Add a mixin. Mixin fields follow own fields, in the order mixins are added.
    pub fn mixin(mut self, signature: Arc<TableDescription>) -> Self {
        self.mixins.push(signature);
        self
    }

    /// Finish the description.
    pub fn build(self) -> Arc<TableDescription> {
        Arc::new(TableDescription {
            id: DescriptionId::next(),
            name: self.name,
            members: self.members,
            mixins: self.mixins,
        })
    }
}
