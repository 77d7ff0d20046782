//! Layered value lookup backing placeholder resolution.
//!
//! Values come from three places, checked in this order:
//!
//! 1. an environment overlay: `a.b.c` is overridden by `A_B_C`
//! 2. the `tmpl_config` file (nested tables addressed by dotted path)
//! 3. an environment variable named exactly like the dotted key
//!
//! The settings file is read once at startup and the environment is
//! snapshotted at the same time, so a [`Settings`] never changes after it is
//! built and can be shared freely between worker threads.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use figment::providers::{Format, Json, Toml, Yaml};
use figment::Figment;
use serde_json::Value;
use tracing::{debug, trace};

use crate::error::SettingsError;
use crate::token::denormalize;

/// Base name of the settings file, without extension
pub const CONFIG_NAME: &str = "tmpl_config";

/// Extensions tried in each search directory, in order
const CONFIG_EXTENSIONS: &[&str] = &["json", "toml", "yaml", "yml"];

/// Lookup service consumed by the file processor
pub trait Resolve: Sync {
    /// Value for a normalized (dotted) variable name; empty values count as missing
    fn resolve(&self, name: &str) -> Option<String>;
}

/// Settings file format, detected from the extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
    Yaml,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        match ext.to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "toml" => Some(Self::Toml),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }

    fn figment(self, path: &Path) -> Figment {
        match self {
            Self::Json => Figment::from(Json::file(path)),
            Self::Toml => Figment::from(Toml::file(path)),
            Self::Yaml => Figment::from(Yaml::file(path)),
        }
    }
}

/// Default search directories: `/etc/tmpl`, `$HOME/.tmpl`, `config`, `.`
pub fn default_search_dirs() -> Vec<PathBuf> {
    let mut search = vec![PathBuf::from("/etc/tmpl")];
    if let Some(home) = dirs::home_dir() {
        search.push(home.join(".tmpl"));
    }
    search.push(PathBuf::from("config"));
    search.push(PathBuf::from("."));
    search
}

/// First `tmpl_config.<ext>` found in `search_dirs`
pub fn find_config_file(search_dirs: &[PathBuf]) -> Option<PathBuf> {
    search_dirs.iter().find_map(|dir| {
        CONFIG_EXTENSIONS
            .iter()
            .map(|ext| dir.join(format!("{CONFIG_NAME}.{ext}")))
            .find(|candidate| candidate.is_file())
    })
}

/// Immutable settings store
#[derive(Debug, Clone, Default)]
pub struct Settings {
    /// Lower-cased dotted key -> scalar value
    values: HashMap<String, String>,
    /// Environment captured at load time
    env: HashMap<String, String>,
    /// File the values were read from, if any
    source: Option<PathBuf>,
}

impl Settings {
    /// Build from already-flattened values and an environment snapshot
    pub fn from_parts(values: HashMap<String, String>, env: HashMap<String, String>) -> Self {
        let values = values
            .into_iter()
            .map(|(k, v)| (k.to_lowercase(), v))
            .collect();
        Self {
            values,
            env,
            source: None,
        }
    }

    /// Load the settings file and snapshot the process environment.
    ///
    /// An explicit `config_file` must exist. Otherwise `search_dirs` are searched
    /// and a missing file just means environment-only resolution.
    pub fn load(
        config_file: Option<&Path>,
        search_dirs: &[PathBuf],
    ) -> Result<Self, SettingsError> {
        let path = match config_file {
            Some(path) if !path.is_file() => {
                return Err(SettingsError::NotFound {
                    path: path.to_path_buf(),
                });
            }
            Some(path) => Some(path.to_path_buf()),
            None => find_config_file(search_dirs),
        };

        let values = match &path {
            Some(path) => {
                debug!("Loading settings from {}", path.display());
                read_config_file(path)?
            }
            None => {
                debug!("No {CONFIG_NAME} file found, using environment only");
                HashMap::new()
            }
        };

        let mut settings = Self::from_parts(values, env_snapshot());
        settings.source = path;
        Ok(settings)
    }

    /// Path of the loaded settings file
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Number of addressable values in the settings file
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn env_value(&self, key: &str) -> Option<String> {
        self.env.get(key).filter(|v| !v.is_empty()).cloned()
    }
}

impl Resolve for Settings {
    fn resolve(&self, name: &str) -> Option<String> {
        let overlay = denormalize(name).to_uppercase();
        if let Some(value) = self.env_value(&overlay) {
            trace!("{name} resolved from environment overlay {overlay}");
            return Some(value);
        }

        if let Some(value) = self
            .values
            .get(&name.to_lowercase())
            .filter(|v| !v.is_empty())
        {
            trace!("{name} resolved from settings file");
            return Some(value.clone());
        }

        self.env_value(name)
    }
}

/// Parse a settings file into flattened dotted keys
pub fn read_config_file(path: &Path) -> Result<HashMap<String, String>, SettingsError> {
    let format = ConfigFormat::from_path(path).ok_or_else(|| SettingsError::UnsupportedFormat {
        path: path.to_path_buf(),
    })?;

    let tree: HashMap<String, Value> =
        format
            .figment(path)
            .extract()
            .map_err(|e| SettingsError::Parse {
                path: path.to_path_buf(),
                source: Box::new(e),
            })?;

    let mut values = HashMap::new();
    for (key, value) in &tree {
        flatten_into(key, value, &mut values);
    }
    Ok(values)
}

/// Flatten nested tables into `a.b.c` keys; arrays and nulls are skipped
fn flatten_into(prefix: &str, value: &Value, out: &mut HashMap<String, String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                flatten_into(&format!("{prefix}.{key}"), child, out);
            }
        }
        Value::String(s) => {
            out.insert(prefix.to_lowercase(), s.clone());
        }
        Value::Number(n) => {
            out.insert(prefix.to_lowercase(), n.to_string());
        }
        Value::Bool(b) => {
            out.insert(prefix.to_lowercase(), b.to_string());
        }
        Value::Array(_) | Value::Null => {
            trace!("Skipping non-scalar settings key {prefix}");
        }
    }
}

fn env_snapshot() -> HashMap<String, String> {
    std::env::vars_os()
        .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
        .collect()
}
