//! Config file resolution, fallback, and the in-process registry.
//!
//! Responsibilities:
//! - Resolve a logical config name to `<config_dir>/<name>.yaml`.
//! - Seed a missing config file from its `<name>.yaml.default` template,
//!   falling back to reading the template directly if the copy fails.
//! - Load plain or encrypted YAML and normalize mapping keys.
//! - Own the name -> data registry and hand out deep copies on every read.
//!
//! Does NOT handle:
//! - Cryptographic primitives or the envelope format (see `encryption.rs`).
//! - Writing config files beyond the one-time default-copy bootstrap.
//!
//! Invariants / Assumptions:
//! - A successful `load` registers exactly one entry; a failed `load` leaves
//!   the registry untouched.
//! - Registered data is never handed out by reference, only as a clone.
//! - The `.default` template is never mutated at runtime.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use secrecy::SecretString;
use serde::de::DeserializeOwned;
use serde_yaml::{Mapping, Value};
use thiserror::Error;

use crate::constants::{CONFIG_EXTENSION, DEFAULT_SUFFIX, ENCRYPTION_PASSWORD_ENV};
use crate::encryption::{EncryptionError, Envelope};

/// Parsed configuration tree. Cloning one is a full structural deep copy.
pub type ConfigData = Value;

/// Errors that can occur during configuration loading and reading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config '{name}' not found: neither {path} nor {default_path} exists")]
    FileNotFound {
        name: String,
        path: PathBuf,
        default_path: PathBuf,
    },

    #[error("Failed to read config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to decrypt config file at {path}: {source}")]
    Decryption {
        path: PathBuf,
        source: EncryptionError,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("Config '{0}' has not been loaded")]
    NotLoaded(String),

    #[error("Config '{name}' did not match the requested type: {source}")]
    Deserialize {
        name: String,
        source: serde_yaml::Error,
    },
}

/// Read an environment variable, returning None if unset, empty, or whitespace-only.
pub fn env_var_or_none(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.trim().is_empty())
}

/// Loads named YAML config files and serves deep copies of the parsed data.
///
/// One instance is constructed at the application's composition root with the
/// directory holding `<name>.yaml` / `<name>.yaml.default` pairs, and shared
/// by reference. Loads are serialized internally, so `&Configurator` can be
/// used from any number of threads.
pub struct Configurator {
    config_dir: PathBuf,
    registry: Mutex<HashMap<String, ConfigData>>,
}

impl Configurator {
    /// Creates a configurator reading from `config_dir`.
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
            registry: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the directory config files are resolved against.
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Loads the config named `name`, registering it for later [`get`] calls.
    ///
    /// If `<name>.yaml` is missing, it is seeded by copying
    /// `<name>.yaml.default`; if that copy fails for any reason the failure is
    /// logged and the template is read directly instead. The source file is
    /// re-read (and re-decrypted) on every call, overwriting any previous
    /// entry for the same name.
    ///
    /// With `encrypted = true`, the file must be an [`Envelope`] and the
    /// password is taken from `PROPERTIES_ENCRYPTION_PASSWORD`.
    ///
    /// Returns an independent copy of the registered data.
    ///
    /// [`get`]: Configurator::get
    pub fn load(&self, name: &str, encrypted: bool) -> Result<ConfigData, ConfigError> {
        // Held for the whole load so a racing copy-from-default for the same
        // name cannot interleave with the read or the registry insert.
        let mut registry = self.registry.lock().expect("config registry lock poisoned");

        let path = self.config_dir.join(format!("{name}.{CONFIG_EXTENSION}"));
        let default_path = self
            .config_dir
            .join(format!("{name}.{CONFIG_EXTENSION}.{DEFAULT_SUFFIX}"));

        let resolved = if path.exists() {
            path.as_path()
        } else {
            match std::fs::copy(&default_path, &path) {
                Ok(_) => path.as_path(),
                Err(e) => {
                    tracing::warn!(
                        default_path = %default_path.display(),
                        path = %path.display(),
                        error = %e,
                        "Could not seed config file from default template, reading template directly"
                    );
                    default_path.as_path()
                }
            }
        };

        if !resolved.exists() {
            return Err(ConfigError::FileNotFound {
                name: name.to_string(),
                path: path.clone(),
                default_path: default_path.clone(),
            });
        }

        let data = if encrypted {
            self.load_encrypted(resolved)?
        } else {
            self.load_plain(resolved)?
        };
        let data = normalize_keys(data);

        registry.insert(name.to_string(), data.clone());

        tracing::debug!(
            name = %name,
            path = %resolved.display(),
            encrypted = %encrypted,
            "Config loaded"
        );

        Ok(data)
    }

    /// Returns a deep copy of the registered data for `name`.
    pub fn get(&self, name: &str) -> Result<ConfigData, ConfigError> {
        let registry = self.registry.lock().expect("config registry lock poisoned");
        registry
            .get(name)
            .cloned()
            .ok_or_else(|| ConfigError::NotLoaded(name.to_string()))
    }

    /// Deserializes the registered data for `name` into a caller-supplied type.
    pub fn get_as<T: DeserializeOwned>(&self, name: &str) -> Result<T, ConfigError> {
        let data = self.get(name)?;
        serde_yaml::from_value(data).map_err(|e| ConfigError::Deserialize {
            name: name.to_string(),
            source: e,
        })
    }

    /// Whether `load` has succeeded for `name`.
    pub fn is_loaded(&self, name: &str) -> bool {
        let registry = self.registry.lock().expect("config registry lock poisoned");
        registry.contains_key(name)
    }

    fn load_plain(&self, path: &Path) -> Result<ConfigData, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    fn load_encrypted(&self, path: &Path) -> Result<ConfigData, ConfigError> {
        let password = env_var_or_none(ENCRYPTION_PASSWORD_ENV)
            .map(|p| SecretString::new(p.into()))
            .ok_or_else(|| ConfigError::Decryption {
                path: path.to_path_buf(),
                source: EncryptionError::PasswordMissing(ENCRYPTION_PASSWORD_ENV.to_string()),
            })?;

        let bytes = std::fs::read(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let plaintext = Envelope::from_yaml(&bytes)
            .and_then(|envelope| envelope.open(&password))
            .map_err(|e| ConfigError::Decryption {
                path: path.to_path_buf(),
                source: e,
            })?;

        serde_yaml::from_slice(&plaintext).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

/// Rewrites every scalar mapping key in the tree to a string key.
///
/// YAML permits non-string mapping keys (`5432: x`, `true: y`); after
/// normalization all scalar keys are `Value::String`, so lookups use one
/// convention regardless of how the source file typed its keys. Key casing is
/// preserved. Composite keys (sequences or mappings used as keys) are left
/// structural, with their own contents normalized.
pub fn normalize_keys(value: Value) -> Value {
    match value {
        Value::Mapping(map) => {
            let mut normalized = Mapping::with_capacity(map.len());
            for (key, val) in map {
                let key = match key {
                    Value::String(s) => Value::String(s),
                    Value::Bool(b) => Value::String(b.to_string()),
                    Value::Number(n) => Value::String(n.to_string()),
                    other => normalize_keys(other),
                };
                normalized.insert(key, normalize_keys(val));
            }
            Value::Mapping(normalized)
        }
        Value::Sequence(seq) => Value::Sequence(seq.into_iter().map(normalize_keys).collect()),
        Value::Tagged(tagged) => Value::Tagged(Box::new(serde_yaml::value::TaggedValue {
            tag: tagged.tag,
            value: normalize_keys(tagged.value),
        })),
        other => other,
    }
}
