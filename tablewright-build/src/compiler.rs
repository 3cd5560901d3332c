//! The table compiler.
//!
//! [`compile`] turns one description into a finished table. The steps run
//! in a fixed order, because post-definition callbacks may rely on hooks
//! and methods already being attached:
//!
//! 1. classify the members
//! 2. append signature fields, in mixin order
//! 3. apply the primary-key and naming policies
//! 4. define or open the table in the layer
//! 5. attach the table's own hooks
//! 6. attach the common hook at all six phases
//! 7. register table methods
//! 8. run the table's `_on_define` callback
//! 9. run the group's post-definition-table callback
//! 10. migrate indexes, if requested
//! 11. return the table
//!
//! When indexes are migrated, the migrator and the index plan are checked
//! before step 4, so neither a missing migrator nor a bad index reference
//! leaves a half-built table behind. Indexes are not inspected otherwise.

use std::sync::Arc;

use smol_str::SmolStr;
use tablewright_migrate::IndexMigrator;
use tablewright_schema::{
    CallbackResult, CommonHook, Database, GroupConfig, Phase, TableDefinition, TableDescription,
    TableHandle,
};
use tracing::{debug, debug_span};

use crate::classify::classify;
use crate::error::{BuildError, BuildResult, CallbackStage};
use crate::index_plan::extract_plan;
use crate::policy::{physical_name, primary_key, take_primary_key, take_rname};
use crate::signature::SignatureCache;

/// Callback run with each finished table of a group.
pub type OnDefineTable =
    Arc<dyn Fn(&TableDescription, &dyn TableHandle) -> CallbackResult<()> + Send + Sync>;

/// Build-time settings for one table.
#[derive(Clone, Default)]
pub struct CompileOptions {
    /// Logical name override. Defaults to the description name.
    pub name: Option<SmolStr>,
    /// Physical name prefix.
    pub prefix: Option<String>,
    /// Synthesize `["id"]` primary keys.
    pub auto_pk: bool,
    /// Hook attached at every phase.
    pub common_hook: Option<CommonHook>,
    /// Callback run once the table is finished.
    pub on_define_table: Option<OnDefineTable>,
    /// Whether to migrate this table's indexes.
    pub migrate_indexes: bool,
    /// Index migrator; required when `migrate_indexes` is set.
    pub index_migrator: Option<Arc<dyn IndexMigrator>>,
}

impl CompileOptions {
    /// Create default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create options from a group's configuration.
    pub fn from_group(config: &GroupConfig) -> Self {
        Self {
            prefix: config.prefix().map(String::from),
            auto_pk: config.auto_pk,
            ..Self::default()
        }
    }

    /// Set the logical name.
    pub fn name(mut self, name: impl Into<SmolStr>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the physical name prefix.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Enable or disable automatic primary keys.
    pub fn auto_pk(mut self, enabled: bool) -> Self {
        self.auto_pk = enabled;
        self
    }

    /// Set the common hook.
    pub fn common_hook(mut self, hook: CommonHook) -> Self {
        self.common_hook = Some(hook);
        self
    }

    /// Set the post-definition-table callback.
    pub fn on_define_table<F>(mut self, callback: F) -> Self
    where
        F: Fn(&TableDescription, &dyn TableHandle) -> CallbackResult<()> + Send + Sync + 'static,
    {
        self.on_define_table = Some(Arc::new(callback));
        self
    }

    /// Request index migration.
    pub fn migrate_indexes(mut self, migrate: bool) -> Self {
        self.migrate_indexes = migrate;
        self
    }

    /// Set the index migrator.
    pub fn index_migrator(mut self, migrator: Arc<dyn IndexMigrator>) -> Self {
        self.index_migrator = Some(migrator);
        self
    }
}

impl std::fmt::Debug for CompileOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompileOptions")
            .field("name", &self.name)
            .field("prefix", &self.prefix)
            .field("auto_pk", &self.auto_pk)
            .field("common_hook", &self.common_hook.is_some())
            .field("on_define_table", &self.on_define_table.is_some())
            .field("migrate_indexes", &self.migrate_indexes)
            .field("index_migrator", &self.index_migrator.is_some())
            .finish()
    }
}

/// Compile one description into a table.
pub fn compile(
    db: &dyn Database,
    description: &TableDescription,
    options: &CompileOptions,
    signatures: &SignatureCache,
) -> BuildResult<Arc<dyn TableHandle>> {
    let name = options
        .name
        .clone()
        .unwrap_or_else(|| SmolStr::new(description.name()));
    let span = debug_span!("compile_table", table = %name);
    let _enter = span.enter();

    let mut classification = classify(&name, description, db)?;

    for mixin in description.mixins() {
        let signature = signatures.resolve(db, mixin)?;
        classification
            .fields
            .extend(signature.fields().iter().cloned());
    }

    let explicit_key = take_primary_key(&name, &mut classification.options)?;
    let primary_key = primary_key(
        classification.has_id_name,
        classification.has_id_type,
        options.auto_pk,
        explicit_key,
    );
    let explicit_rname = take_rname(&name, &mut classification.options)?;
    let physical = match options.prefix.as_deref() {
        Some(prefix) if !prefix.is_empty() => Some(physical_name(Some(prefix), &name)),
        _ => explicit_rname,
    };

    let migration = if options.migrate_indexes {
        let migrator = options
            .index_migrator
            .as_ref()
            .ok_or_else(|| BuildError::MissingIndexMigrator {
                table: name.to_string(),
            })?;
        let field_names: Vec<SmolStr> = classification
            .fields
            .iter()
            .map(|f| SmolStr::new(f.name()))
            .collect();
        let plan = extract_plan(&name, &classification.indexes, &field_names)?;
        Some((migrator, plan))
    } else {
        None
    };

    let definition = TableDefinition {
        name: name.clone(),
        fields: classification.fields,
        physical_name: physical,
        primary_key,
        options: classification.options,
    };
    debug!(
        physical_name = definition.physical_name(),
        fields = definition.fields.len(),
        primary_key = ?definition.primary_key,
        "Defining table"
    );
    let table = db.define_table(definition)?;

    let hook_count = classification.hooks.len();
    for (phase, hook) in classification.hooks {
        table.add_hook(phase, hook);
    }

    if let Some(common) = &options.common_hook {
        for phase in Phase::ALL {
            table.add_hook(phase, common.bind(Arc::downgrade(&table), phase));
        }
    }

    let method_count = classification.table_methods.len();
    for (method_name, method) in classification.table_methods {
        table.register_method(&method_name, method);
    }

    if let Some(on_define) = &classification.on_define {
        on_define
            .call(table.as_ref(), &[])
            .map_err(|e| BuildError::callback(name.as_str(), CallbackStage::OnDefine, e))?;
    }

    if let Some(on_define_table) = &options.on_define_table {
        on_define_table(description, table.as_ref())
            .map_err(|e| BuildError::callback(name.as_str(), CallbackStage::OnDefineTable, e))?;
    }

    if let Some((migrator, plan)) = migration {
        debug!(indexes = plan.len(), "Migrating indexes");
        migrator
            .migrate(table.as_ref(), &plan)
            .map_err(|source| BuildError::Migration {
                table: name.to_string(),
                source,
            })?;
    }

    debug!(
        hooks = hook_count,
        common_hook = options.common_hook.is_some(),
        methods = method_count,
        "Compiled table"
    );
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryDatabase, MemoryTable};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Mutex;
    use tablewright_migrate::{IndexPlanEntry, MigrateResult};
    use tablewright_schema::{CallbackError, Field, HookFlow, Index, Row, Value};

    fn compile_memory(
        db: &MemoryDatabase,
        description: &TableDescription,
        options: &CompileOptions,
    ) -> BuildResult<Arc<dyn TableHandle>> {
        compile(db, description, options, &SignatureCache::new())
    }

    fn memory(table: &Arc<dyn TableHandle>) -> &MemoryTable {
        table.as_any().downcast_ref::<MemoryTable>().unwrap()
    }

    #[test]
    fn test_compile_plain_table() {
        let db = MemoryDatabase::new();
        let desc = TableDescription::builder("person")
            .field("name", Field::new("string").required())
            .build();

        let table = compile_memory(&db, &desc, &CompileOptions::new()).unwrap();
        assert_eq!(table.name(), "person");
        assert_eq!(table.physical_name(), "person");
        assert_eq!(table.field_names(), vec![SmolStr::new("name")]);
        assert_eq!(table.primary_key(), None);
    }

    #[test]
    fn test_prefix_and_name_override() {
        let db = MemoryDatabase::new();
        let desc = TableDescription::builder("Thing")
            .field("name", Field::new("string"))
            .build();

        let options = CompileOptions::new().name("thing").prefix("test_");
        let table = compile_memory(&db, &desc, &options).unwrap();
        assert_eq!(table.name(), "thing");
        assert_eq!(table.physical_name(), "test_thing");
        assert!(db.table("thing").is_some());
        assert!(db.table("test_thing").is_none());
    }

    #[test]
    fn test_explicit_rname_without_prefix() {
        let db = MemoryDatabase::new();
        let desc = TableDescription::builder("thing")
            .field("name", Field::new("string"))
            .option("rname", "legacy_thing")
            .build();

        let table = compile_memory(&db, &desc, &CompileOptions::new()).unwrap();
        assert_eq!(table.physical_name(), "legacy_thing");

        let db = MemoryDatabase::new();
        let table = compile_memory(&db, &desc, &CompileOptions::new().prefix("test_")).unwrap();
        assert_eq!(table.physical_name(), "test_thing");
    }

    #[test]
    fn test_auto_pk_policy() {
        let db = MemoryDatabase::new();
        let options = CompileOptions::new().auto_pk(true);

        let color = TableDescription::builder("color")
            .field("id", Field::new("integer"))
            .field("name", Field::new("string"))
            .build();
        let table = compile_memory(&db, &color, &options).unwrap();
        assert_eq!(table.primary_key(), Some(vec![SmolStr::new("id")]));

        let serial = TableDescription::builder("serial_color")
            .field("id", Field::new("id"))
            .build();
        let table = compile_memory(&db, &serial, &options).unwrap();
        assert_eq!(table.primary_key(), None);

        let explicit = TableDescription::builder("coded_color")
            .field("id", Field::new("integer"))
            .field("code", Field::new("string"))
            .option("primarykey", json!(["code"]))
            .build();
        let table = compile_memory(&db, &explicit, &options).unwrap();
        assert_eq!(table.primary_key(), Some(vec![SmolStr::new("code")]));
    }

    #[test]
    fn test_mixin_fields_follow_own_fields() {
        let db = MemoryDatabase::new();
        let created = TableDescription::builder("sign_created")
            .field("created_on", Field::new("datetime"))
            .build();
        let updated = TableDescription::builder("sign_updated")
            .field("updated_on", Field::new("datetime"))
            .build();
        let thing = TableDescription::builder("thing")
            .field("name", Field::new("string"))
            .mixin(created)
            .mixin(updated)
            .field("owner", Field::new("integer"))
            .build();

        let table = compile_memory(&db, &thing, &CompileOptions::new()).unwrap();
        let names: Vec<_> = table.field_names().iter().map(|n| n.to_string()).collect();
        assert_eq!(names, vec!["name", "owner", "created_on", "updated_on"]);
    }

    #[test]
    fn test_hooks_then_common_hook() {
        let db = MemoryDatabase::new();
        let log = Arc::new(Mutex::new(Vec::<String>::new()));

        let specific = Arc::clone(&log);
        let desc = TableDescription::builder("thing")
            .field("name", Field::new("string"))
            .hook(Phase::BeforeInsert, move |_| {
                specific.lock().unwrap().push("before_insert".into());
                Ok(HookFlow::Continue)
            })
            .build();

        let common = Arc::clone(&log);
        let options = CompileOptions::new().common_hook(CommonHook::new(move |table, phase, _| {
            let rows = table
                .as_any()
                .downcast_ref::<MemoryTable>()
                .map_or(0, MemoryTable::len);
            common
                .lock()
                .unwrap()
                .push(format!("common:{}:{phase}:{rows}", table.name()));
            Ok(HookFlow::Continue)
        }));

        let table = compile_memory(&db, &desc, &options).unwrap();
        for phase in Phase::ALL {
            let expected = if phase == Phase::BeforeInsert { 2 } else { 1 };
            assert_eq!(table.hooks(phase).len(), expected, "{phase}");
        }

        memory(&table)
            .insert(Row::new().with("name", "widget"))
            .unwrap();
        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "before_insert".to_string(),
                "common:thing:before_insert:0".to_string(),
                "common:thing:after_insert:1".to_string(),
            ]
        );
    }

    #[test]
    fn test_callbacks_see_hooks_and_methods() {
        let db = MemoryDatabase::new();
        let seen = Arc::new(Mutex::new(Vec::<String>::new()));

        let own = Arc::clone(&seen);
        let desc = TableDescription::builder("thing")
            .field("name", Field::new("string"))
            .hook(Phase::AfterDelete, |_| Ok(HookFlow::Continue))
            .table_method("label", |table, _| Ok(json!(table.name())))
            .on_define(move |table| {
                own.lock().unwrap().push(format!(
                    "_on_define:{}:{}",
                    table.hooks(Phase::AfterDelete).len(),
                    table.call_method("label", &[])?
                ));
                Ok(())
            })
            .build();

        let group = Arc::clone(&seen);
        let options = CompileOptions::new().on_define_table(move |description, table| {
            group.lock().unwrap().push(format!(
                "on_define_table:{}:{}",
                description.name(),
                table.method_names().len()
            ));
            Ok(())
        });

        compile_memory(&db, &desc, &options).unwrap();
        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                "_on_define:1:\"thing\"".to_string(),
                "on_define_table:thing:1".to_string(),
            ]
        );
    }

    #[test]
    fn test_on_define_failure() {
        let db = MemoryDatabase::new();
        let desc = TableDescription::builder("thing")
            .on_define(|_| Err(CallbackError::new("not ready")))
            .build();

        let err = compile_memory(&db, &desc, &CompileOptions::new()).unwrap_err();
        assert!(matches!(
            err,
            BuildError::Callback {
                stage: CallbackStage::OnDefine,
                ..
            }
        ));
    }

    #[test]
    fn test_index_migration() {
        let db = MemoryDatabase::new();
        let calls = Arc::new(Mutex::new(Vec::new()));
        let recorder = Arc::clone(&calls);
        let migrator = move |table: &dyn TableHandle, plan: &[IndexPlanEntry]| -> MigrateResult<()> {
            recorder
                .lock()
                .unwrap()
                .push((table.name().to_string(), plan.to_vec()));
            Ok(())
        };

        let desc = TableDescription::builder("thing")
            .field("col_1", Field::new("string"))
            .field("col_2", Field::new("string"))
            .index("foo_idx", Index::new(["col_1", "col_2"]).unique(true))
            .build();
        let options = CompileOptions::new()
            .migrate_indexes(true)
            .index_migrator(Arc::new(migrator));

        compile_memory(&db, &desc, &options).unwrap();

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let (table, plan) = &calls[0];
        assert_eq!(table, "thing");
        assert_eq!(plan.len(), 1);
        let (name, columns, options) = plan[0].as_triple();
        assert_eq!(name, "foo_idx");
        assert_eq!(columns, vec!["col_1", "col_2"]);
        assert_eq!(options.len(), 1);
        assert_eq!(options.get("unique"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_missing_migrator_fails_before_define() {
        let db = MemoryDatabase::new();
        let desc = TableDescription::builder("thing")
            .field("col_1", Field::new("string"))
            .index("foo_idx", Index::new(["col_1"]))
            .build();

        let err = compile_memory(&db, &desc, &CompileOptions::new().migrate_indexes(true))
            .unwrap_err();
        assert!(matches!(err, BuildError::MissingIndexMigrator { ref table } if table == "thing"));
        assert!(err.is_config_error());
        assert_eq!(db.define_count(), 0);
        assert!(db.table("thing").is_none());
    }

    #[test]
    fn test_unknown_index_field_fails_before_define() {
        let db = MemoryDatabase::new();
        let desc = TableDescription::builder("thing")
            .field("name", Field::new("string"))
            .index(
                "owner_idx",
                Index::new([tablewright_schema::ColumnRef::field("owner")]),
            )
            .build();
        let migrator = |_: &dyn TableHandle, _: &[IndexPlanEntry]| -> MigrateResult<()> { Ok(()) };
        let options = CompileOptions::new()
            .migrate_indexes(true)
            .index_migrator(Arc::new(migrator));

        let Err(err) = compile_memory(&db, &desc, &options) else {
            panic!("unknown index field accepted");
        };
        assert!(matches!(err, BuildError::UnknownIndexColumn { .. }));
        assert_eq!(db.define_count(), 0);
    }

    #[test]
    fn test_indexes_ignored_without_migration() {
        let db = MemoryDatabase::new();
        let desc = TableDescription::builder("thing")
            .field("name", Field::new("string"))
            .index(
                "owner_idx",
                Index::new([tablewright_schema::ColumnRef::field("owner")]),
            )
            .build();

        let table = compile_memory(&db, &desc, &CompileOptions::new()).unwrap();
        assert_eq!(table.name(), "thing");
    }

    #[test]
    fn test_recompile_opens_existing_table() {
        let db = MemoryDatabase::new();
        let cache = SignatureCache::new();
        let desc = TableDescription::builder("person")
            .field("name", Field::new("string"))
            .hook(Phase::BeforeInsert, |_| Ok(HookFlow::Continue))
            .table_method("count", |_, _| Ok(json!(0)))
            .build();
        let options =
            CompileOptions::new().common_hook(CommonHook::new(|_, _, _| Ok(HookFlow::Continue)));

        let first = compile(&db, &desc, &options, &cache).unwrap();
        memory(&first)
            .insert(Row::new().with("name", "ada"))
            .unwrap();
        let second = compile(&db, &desc, &options, &cache).unwrap();

        assert_eq!(first.field_names(), second.field_names());
        assert_eq!(first.method_names(), second.method_names());
        for phase in Phase::ALL {
            assert_eq!(first.hooks(phase).len(), second.hooks(phase).len(), "{phase}");
        }
        assert_eq!(second.hooks(Phase::BeforeInsert).len(), 2);
        assert_eq!(memory(&second).len(), 1);
        assert_eq!(db.define_count(), 2);
        assert_eq!(db.table_count(), 1);
    }

    #[test]
    fn test_layer_error_propagates() {
        let db = MemoryDatabase::new();
        let v1 = TableDescription::builder("person")
            .field("name", Field::new("string"))
            .build();
        let v2 = TableDescription::builder("person")
            .field("name", Field::new("text"))
            .build();

        compile_memory(&db, &v1, &CompileOptions::new()).unwrap();
        let err = compile_memory(&db, &v2, &CompileOptions::new()).unwrap_err();
        assert!(matches!(err, BuildError::Layer(_)));
    }
}
