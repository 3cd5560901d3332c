//! Model groups and the group driver.
//!
//! A [`ModelGroup`] is an ordered set of table descriptions that share a
//! [`GroupConfig`] and group-level callbacks. [`ModelBuilder`] compiles the
//! tables of one or more groups into a database.
//!
//! # Examples
//!
//! ```rust
//! use tablewright_build::{MemoryDatabase, ModelBuilder, ModelGroup};
//! use tablewright_schema::{Field, GroupConfig, TableDescription, TableHandle};
//!
//! let db = MemoryDatabase::new();
//! let group = ModelGroup::new("app")
//!     .with_config(GroupConfig::new(Some("test_"), true))
//!     .table(
//!         TableDescription::builder("person")
//!             .field("name", Field::new("string").required())
//!             .build(),
//!     );
//!
//! let tables = ModelBuilder::new(&db).build(&group).unwrap();
//! assert_eq!(tables["person"].physical_name(), "test_person");
//! ```

use std::sync::Arc;

use indexmap::IndexMap;
use smol_str::SmolStr;
use tablewright_migrate::IndexMigrator;
use tablewright_schema::{
    CallbackResult, CommonHook, Database, GroupConfig, HookArgs, HookFlow, IndexConfig,
    MigrateSetting, Phase, TableDescription, TableHandle, TablewrightConfig, Value,
};
use tracing::{debug, info};

use crate::compiler::{CompileOptions, OnDefineTable, compile};
use crate::error::{BuildError, BuildResult, CallbackStage};
use crate::signature::SignatureCache;

/// Callback run once every table of a group is compiled.
///
/// Receives the database and the `__extra__` metadata of each table that
/// declared some, keyed by logical table name.
pub type OnDefineModel =
    Arc<dyn Fn(&dyn Database, &IndexMap<SmolStr, Value>) -> CallbackResult<()> + Send + Sync>;

/// Compiled tables keyed by logical name.
pub type TableMap = IndexMap<SmolStr, Arc<dyn TableHandle>>;

/// Which tables get their indexes migrated.
#[derive(Clone)]
pub enum MigrateIndexes {
    /// Every table, or none.
    All(bool),
    /// Tables for which the predicate holds.
    Predicate(Arc<dyn Fn(&str) -> bool + Send + Sync>),
}

impl Default for MigrateIndexes {
    fn default() -> Self {
        Self::All(false)
    }
}

impl MigrateIndexes {
    /// Migrate tables accepted by a predicate over the logical name.
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Self::Predicate(Arc::new(f))
    }

    /// Migrate only the listed tables.
    pub fn tables<I, S>(tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SmolStr>,
    {
        let tables: Vec<SmolStr> = tables.into_iter().map(Into::into).collect();
        Self::predicate(move |name| tables.iter().any(|t| t == name))
    }

    /// Check whether a table's indexes should be migrated.
    pub fn applies_to(&self, table: &str) -> bool {
        match self {
            Self::All(flag) => *flag,
            Self::Predicate(f) => f(table),
        }
    }
}

impl From<bool> for MigrateIndexes {
    fn from(flag: bool) -> Self {
        Self::All(flag)
    }
}

impl From<&MigrateSetting> for MigrateIndexes {
    fn from(setting: &MigrateSetting) -> Self {
        match setting {
            MigrateSetting::Flag(flag) => Self::All(*flag),
            MigrateSetting::Tables(tables) => Self::tables(tables.iter().map(String::as_str)),
        }
    }
}

impl From<&IndexConfig> for MigrateIndexes {
    fn from(config: &IndexConfig) -> Self {
        Self::from(&config.migrate)
    }
}

impl std::fmt::Debug for MigrateIndexes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All(flag) => f.debug_tuple("All").field(flag).finish(),
            Self::Predicate(_) => f.debug_tuple("Predicate").finish_non_exhaustive(),
        }
    }
}

/// An ordered set of table descriptions compiled together.
#[derive(Clone, Default)]
pub struct ModelGroup {
    name: SmolStr,
    tables: IndexMap<SmolStr, Arc<TableDescription>>,
    config: GroupConfig,
    on_action: Option<CommonHook>,
    on_define_table: Option<OnDefineTable>,
    on_define_model: Option<OnDefineModel>,
}

impl ModelGroup {
    /// Create an empty group.
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Create a group configured from its `[groups.<name>]` section.
    pub fn from_config(name: impl Into<SmolStr>, config: &TablewrightConfig) -> Self {
        let name = name.into();
        let group = config.group(&name);
        Self::new(name).with_config(group)
    }

    /// Set the group configuration.
    pub fn with_config(mut self, config: GroupConfig) -> Self {
        self.config = config;
        self
    }

    /// Add a table under its description name.
    pub fn table(self, description: Arc<TableDescription>) -> Self {
        let name = SmolStr::new(description.name());
        self.table_as(name, description)
    }

    /// Add a table under an explicit logical name.
    ///
    /// Adding a second table under the same name replaces the first in place.
    pub fn table_as(mut self, name: impl Into<SmolStr>, description: Arc<TableDescription>) -> Self {
        self.tables.insert(name.into(), description);
        self
    }

    /// Set the hook invoked for every phase of every table.
    pub fn on_action<F>(mut self, hook: F) -> Self
    where
        F: Fn(&dyn TableHandle, Phase, &HookArgs) -> CallbackResult<HookFlow>
            + Send
            + Sync
            + 'static,
    {
        self.on_action = Some(CommonHook::new(hook));
        self
    }

    /// Set the callback run with each finished table.
    pub fn on_define_table<F>(mut self, callback: F) -> Self
    where
        F: Fn(&TableDescription, &dyn TableHandle) -> CallbackResult<()> + Send + Sync + 'static,
    {
        self.on_define_table = Some(Arc::new(callback));
        self
    }

    /// Set the callback run once all tables are compiled.
    pub fn on_define_model<F>(mut self, callback: F) -> Self
    where
        F: Fn(&dyn Database, &IndexMap<SmolStr, Value>) -> CallbackResult<()>
            + Send
            + Sync
            + 'static,
    {
        self.on_define_model = Some(Arc::new(callback));
        self
    }

    /// Get the group name.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Get the group configuration.
    pub fn config(&self) -> &GroupConfig {
        &self.config
    }

    /// Logical table names, in order.
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.keys().map(SmolStr::as_str).collect()
    }

    /// Number of tables.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Check if the group has no tables.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    fn compile_options(&self, name: &SmolStr) -> CompileOptions {
        CompileOptions {
            name: Some(name.clone()),
            common_hook: self.on_action.clone(),
            on_define_table: self.on_define_table.clone(),
            ..CompileOptions::from_group(&self.config)
        }
    }
}

impl std::fmt::Debug for ModelGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelGroup")
            .field("name", &self.name)
            .field("tables", &self.table_names())
            .field("config", &self.config)
            .field("on_action", &self.on_action.is_some())
            .field("on_define_table", &self.on_define_table.is_some())
            .field("on_define_model", &self.on_define_model.is_some())
            .finish()
    }
}

/// Compiles model groups into a database.
///
/// Signatures are compiled once per database and shared by every group
/// built through the same builder.
pub struct ModelBuilder<'db> {
    db: &'db dyn Database,
    migrate_indexes: MigrateIndexes,
    index_migrator: Option<Arc<dyn IndexMigrator>>,
    signatures: SignatureCache,
}

impl<'db> ModelBuilder<'db> {
    /// Create a builder over a database.
    pub fn new(db: &'db dyn Database) -> Self {
        Self {
            db,
            migrate_indexes: MigrateIndexes::default(),
            index_migrator: None,
            signatures: SignatureCache::new(),
        }
    }

    /// Create a builder with index migration taken from configuration.
    pub fn from_config(db: &'db dyn Database, config: &TablewrightConfig) -> Self {
        Self::new(db).migrate_indexes(MigrateIndexes::from(&config.indexes))
    }

    /// Choose which tables get their indexes migrated.
    pub fn migrate_indexes(mut self, migrate: impl Into<MigrateIndexes>) -> Self {
        self.migrate_indexes = migrate.into();
        self
    }

    /// Set the index migrator.
    pub fn index_migrator<M: IndexMigrator + 'static>(mut self, migrator: M) -> Self {
        self.index_migrator = Some(Arc::new(migrator));
        self
    }

    /// Set a shared index migrator.
    pub fn shared_index_migrator(mut self, migrator: Arc<dyn IndexMigrator>) -> Self {
        self.index_migrator = Some(migrator);
        self
    }

    /// Get the signature cache.
    pub fn signatures(&self) -> &SignatureCache {
        &self.signatures
    }

    /// Compile every table of a group, in order.
    ///
    /// Stops at the first failing table. Tables compiled before the failure
    /// stay defined.
    pub fn build(&self, group: &ModelGroup) -> BuildResult<TableMap> {
        info!(group = group.name(), tables = group.len(), "Building model group");

        let mut tables = TableMap::new();
        let mut extras = IndexMap::new();

        for (name, description) in &group.tables {
            let mut options = group.compile_options(name);
            options.migrate_indexes = self.migrate_indexes.applies_to(name);
            options.index_migrator = self.index_migrator.clone();

            let table = compile(self.db, description, &options, &self.signatures)?;

            if let Some(extra) = description.extra().filter(|v| is_truthy(v)) {
                extras.insert(name.clone(), extra.clone());
            }
            tables.insert(name.clone(), table);
        }

        if let Some(on_define_model) = &group.on_define_model {
            debug!(group = group.name(), extras = extras.len(), "Running on_define_model");
            on_define_model(self.db, &extras).map_err(|e| {
                BuildError::callback(group.name(), CallbackStage::OnDefineModel, e)
            })?;
        }

        Ok(tables)
    }

    /// Compile several groups in order, collecting all their tables.
    pub fn build_all<'g, I>(&self, groups: I) -> BuildResult<TableMap>
    where
        I: IntoIterator<Item = &'g ModelGroup>,
    {
        let mut tables = TableMap::new();
        for group in groups {
            tables.extend(self.build(group)?);
        }
        Ok(tables)
    }
}

impl std::fmt::Debug for ModelBuilder<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelBuilder")
            .field("database", &self.db.token())
            .field("migrate_indexes", &self.migrate_indexes)
            .field("index_migrator", &self.index_migrator.is_some())
            .field("signatures", &self.signatures.len())
            .finish()
    }
}

/// Whether extra metadata counts as declared.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
