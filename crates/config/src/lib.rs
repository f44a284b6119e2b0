//! Process-wide YAML configuration loading with encrypted-file support.
//!
//! This crate provides the [`Configurator`], which resolves a logical config
//! name to a YAML file on disk, seeds a missing file from its bundled
//! `.default` template, optionally decrypts the file contents with a password
//! taken from `PROPERTIES_ENCRYPTION_PASSWORD`, and registers the parsed tree
//! in an in-process registry. Every read hands out an independent deep copy,
//! so no caller can mutate shared state.

mod constants;
pub mod encryption;
mod loader;

pub use constants::{CONFIG_EXTENSION, DEFAULT_SUFFIX, ENCRYPTION_PASSWORD_ENV};
pub use encryption::{EncryptionError, Encryptor, Envelope};
pub use loader::{ConfigData, ConfigError, Configurator, env_var_or_none, normalize_keys};
