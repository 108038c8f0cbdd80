//! Configuration loading for Vigil.
//!
//! `vigil.toml` selects the environment and per-model enforcement options, and
//! may point each model at a schema descriptor file:
//!
//! ```toml
//! environment = "development"
//!
//! [defaults]
//! immutable = true
//! flush = "sync"
//!
//! [models.user]
//! flush = "deferred"
//! schema = "schemas/user.toml"
//! ```
//!
//! The file is found through `VIGIL_CONFIG`, else `~/.vigil/config.toml`. A
//! missing file is not an error. Relative schema paths resolve against the
//! directory holding the config file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use vigil_core::{Environment, FlushMode, ModelOptions, parse_schema};
use vigil_types::{Schema, ValidationError};

/// Environment variable overriding the config file location.
pub const CONFIG_ENV_VAR: &str = "VIGIL_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("failed to parse {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("unsupported value in {}: {reason}", .path.display())]
    Convert { path: PathBuf, reason: String },
    #[error("bad schema in {}: {source}", .path.display())]
    Schema {
        path: PathBuf,
        source: ValidationError,
    },
}

impl ConfigError {
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. }
            | ConfigError::Parse { path, .. }
            | ConfigError::Json { path, .. }
            | ConfigError::Convert { path, .. }
            | ConfigError::Schema { path, .. } => path,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct VigilConfig {
    pub environment: Option<Environment>,
    pub defaults: Option<ModelConfig>,
    #[serde(default)]
    pub models: HashMap<String, ModelConfig>,
    /// Directory the config was loaded from; schema paths resolve against it.
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

/// Enforcement options for one model, or the defaults for all of them.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ModelConfig {
    pub immutable: Option<bool>,
    pub flush: Option<FlushMode>,
    pub schema: Option<PathBuf>,
}

impl VigilConfig {
    /// Load from the configured location. `Ok(None)` when there is no file.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        let Some(path) = config_path() else {
            return Ok(None);
        };
        if !path.exists() {
            return Ok(None);
        }
        Self::load_from(&path).map(Some)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = read(path)?;
        let mut config: Self = match toml::from_str(&content) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, err);
                return Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };
        config.base_dir = path.parent().map(Path::to_path_buf);
        tracing::debug!(path = %path.display(), models = config.models.len(), "config loaded");
        Ok(config)
    }

    /// Apply the configured environment unless `VIGIL_ENV` already decides it.
    pub fn apply_environment(&self) {
        if let Some(env) = self.environment
            && !Environment::env_var_is_set()
        {
            Environment::set_current(env);
        }
    }

    /// Options for the model named `name`: its own entry over `[defaults]`.
    #[must_use]
    pub fn model_options(&self, name: &str) -> ModelOptions {
        let own = self.models.get(name);
        let defaults = self.defaults.as_ref();
        let immutable = own
            .and_then(|m| m.immutable)
            .or_else(|| defaults.and_then(|d| d.immutable))
            .unwrap_or(true);
        let flush = own
            .and_then(|m| m.flush)
            .or_else(|| defaults.and_then(|d| d.flush))
            .unwrap_or_default();
        ModelOptions::default().immutable(immutable).flush(flush)
    }

    /// Schema configured for the model named `name`, if any.
    pub fn model_schema(&self, name: &str) -> Result<Option<Schema>, ConfigError> {
        let Some(file) = self.models.get(name).and_then(|m| m.schema.as_ref()) else {
            return Ok(None);
        };
        let path = match &self.base_dir {
            Some(base) if file.is_relative() => base.join(file),
            _ => file.clone(),
        };
        load_schema(&path).map(Some)
    }
}

/// Location of the config file.
#[must_use]
pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_ENV_VAR) {
        return Some(PathBuf::from(path));
    }
    dirs::home_dir().map(|home| home.join(".vigil").join("config.toml"))
}

/// Read a JSON or TOML file (by extension) into a JSON value.
pub fn load_data(path: &Path) -> Result<Value, ConfigError> {
    let content = read(path)?;
    let is_toml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    if is_toml {
        let table: toml::Table = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        toml_to_json(toml::Value::Table(table), path)
    } else {
        serde_json::from_str(&content).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Read a schema descriptor file and resolve it against the type registry.
pub fn load_schema(path: &Path) -> Result<Schema, ConfigError> {
    let descriptor = load_data(path)?;
    parse_schema(&descriptor).map_err(|source| ConfigError::Schema {
        path: path.to_path_buf(),
        source,
    })
}

fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|err| {
        tracing::warn!("Failed to read {:?}: {}", path, err);
        ConfigError::Read {
            path: path.to_path_buf(),
            source: err,
        }
    })
}

/// TOML values map onto JSON one to one, except datetimes (kept as strings)
/// and non-finite floats (rejected).
fn toml_to_json(value: toml::Value, path: &Path) -> Result<Value, ConfigError> {
    Ok(match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .ok_or_else(|| ConfigError::Convert {
                path: path.to_path_buf(),
                reason: format!("{f} has no JSON representation"),
            })?,
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => items
            .into_iter()
            .map(|item| toml_to_json(item, path))
            .collect::<Result<Value, ConfigError>>()?,
        toml::Value::Table(table) => table
            .into_iter()
            .map(|(key, item)| Ok((key, toml_to_json(item, path)?)))
            .collect::<Result<serde_json::Map<_, _>, ConfigError>>()
            .map(Value::Object)?,
    })
}
