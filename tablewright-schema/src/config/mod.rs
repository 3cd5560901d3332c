//! Configuration file parsing for `tablewright.toml`.

use std::collections::HashMap;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{SchemaError, SchemaResult};

/// Main configuration structure for `tablewright.toml`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TablewrightConfig {
    /// Per-group build settings, keyed by group name.
    #[serde(default)]
    pub groups: IndexMap<String, GroupConfig>,

    /// Index migration settings.
    #[serde(default)]
    pub indexes: IndexConfig,

    /// Debug/logging settings.
    #[serde(default)]
    pub debug: DebugConfig,

    /// Environment-specific overrides.
    #[serde(default)]
    pub environments: HashMap<String, EnvironmentOverride>,
}

impl TablewrightConfig {
    /// Default configuration file name.
    pub const FILE_NAME: &'static str = "tablewright.toml";

    /// Load configuration from a file path.
    pub fn from_file(path: impl AsRef<Path>) -> SchemaResult<Self> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "Loading configuration");
        let content = std::fs::read_to_string(path).map_err(|e| SchemaError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> SchemaResult<Self> {
        let expanded = expand_env_vars(content);
        toml::from_str(&expanded).map_err(|e| SchemaError::TomlError { source: e })
    }

    /// Get the settings of a group, falling back to defaults.
    pub fn group(&self, name: &str) -> GroupConfig {
        self.groups.get(name).cloned().unwrap_or_default()
    }

    /// Get the settings of a group that must be configured.
    pub fn require_group(&self, name: &str) -> SchemaResult<&GroupConfig> {
        self.groups
            .get(name)
            .ok_or_else(|| SchemaError::config(format!("unknown group `{name}`")))
    }

    /// Apply environment-specific overrides.
    pub fn with_environment(mut self, env: &str) -> Self {
        if let Some(overrides) = self.environments.remove(env) {
            for (name, group) in overrides.groups {
                let target = self.groups.entry(name).or_default();
                if let Some(prefix) = group.prefix {
                    target.prefix = Some(prefix);
                }
                if let Some(auto_pk) = group.auto_pk {
                    target.auto_pk = auto_pk;
                }
            }
            if let Some(indexes) = overrides.indexes {
                self.indexes = indexes;
            }
            if let Some(debug) = overrides.debug {
                if let Some(level) = debug.log_level {
                    self.debug.log_level = Some(level);
                }
                if let Some(format) = debug.log_format {
                    self.debug.log_format = Some(format);
                }
            }
        }
        self
    }
}

/// Build settings shared by every table of a group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GroupConfig {
    /// Prefix prepended to every physical table name.
    #[serde(default)]
    pub prefix: Option<String>,

    /// Synthesize `primarykey = ["id"]` for tables with a non-`id`-typed `id` field.
    #[serde(default)]
    pub auto_pk: bool,
}

impl GroupConfig {
    /// Create a group configuration.
    pub fn new(prefix: Option<&str>, auto_pk: bool) -> Self {
        Self {
            prefix: prefix.map(String::from),
            auto_pk,
        }
    }

    /// Get the prefix, treating an empty prefix as none.
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref().filter(|p| !p.is_empty())
    }
}

/// Which tables get their indexes migrated.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum MigrateSetting {
    /// All tables or none.
    Flag(bool),
    /// Only the listed tables.
    Tables(Vec<String>),
}

impl Default for MigrateSetting {
    fn default() -> Self {
        Self::Flag(false)
    }
}

impl MigrateSetting {
    /// Check whether a table's indexes should be migrated.
    pub fn applies_to(&self, table: &str) -> bool {
        match self {
            Self::Flag(flag) => *flag,
            Self::Tables(tables) => tables.iter().any(|t| t == table),
        }
    }
}

/// Index migration configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IndexConfig {
    /// Tables whose indexes are migrated after definition.
    #[serde(default)]
    pub migrate: MigrateSetting,
}

/// Debug/logging configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DebugConfig {
    /// Log level (`trace`, `debug`, `info`, `warn`, `error`).
    #[serde(default)]
    pub log_level: Option<String>,

    /// Log format (`json`, `pretty`, `compact`).
    #[serde(default)]
    pub log_format: Option<String>,
}

/// Environment-specific configuration overrides.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentOverride {
    /// Group overrides.
    #[serde(default)]
    pub groups: IndexMap<String, GroupOverride>,

    /// Index migration override.
    pub indexes: Option<IndexConfig>,

    /// Debug overrides.
    pub debug: Option<DebugConfig>,
}

/// Group configuration overrides.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GroupOverride {
    /// Override the prefix.
    pub prefix: Option<String>,

    /// Override auto primary keys.
    pub auto_pk: Option<bool>,
}

/// Expand environment variables in the format `${VAR_NAME}`.
fn expand_env_vars(content: &str) -> String {
    let re = match regex_lite::Regex::new(r"\$\{([^}]+)\}") {
        Ok(re) => re,
        Err(_) => return content.to_string(),
    };

    let mut result = content.to_string();
    for cap in re.captures_iter(content) {
        let var_name = &cap[1];
        let full_match = &cap[0];

        if let Ok(value) = std::env::var(var_name) {
            result = result.replace(full_match, &value);
        }
    }

    result
}
