//! Centralized constants for the props-config crate.

/// Environment variable holding the password for encrypted config files.
///
/// Read only when a config is loaded with `encrypted = true`; absence at
/// that point is a decryption error, not a startup error.
pub const ENCRYPTION_PASSWORD_ENV: &str = "PROPERTIES_ENCRYPTION_PASSWORD";

/// File extension for config files (`<name>.yaml`).
pub const CONFIG_EXTENSION: &str = "yaml";

/// Suffix appended to a config filename to locate its bundled template
/// (`<name>.yaml.default`).
pub const DEFAULT_SUFFIX: &str = "default";

/// Current version of the encrypted envelope format.
pub const ENVELOPE_VERSION: u32 = 1;
