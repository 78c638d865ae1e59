//! Configuration loading for procwire-gen.
//!
//! `source_root` and `output_dir` are required; everything else has a default.
//! Relative paths are resolved against the directory holding the config file.
//!
//! ```toml
//! source_root = "src"
//! output_dir = "src/mappers"
//! type_root = "crate"           # optional
//! parameter_prefix = "p_"        # optional
//! skip_suffixes = ["View", "Dto"]
//! core_crate = "procwire_core"
//! ```

use crate::error::ConfigError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Root of the crate sources to scan (the directory holding `lib.rs`).
    pub source_root: PathBuf,
    /// Directory the generated module is written to.
    pub output_dir: PathBuf,
    /// Path that scanned modules are imported under in generated code.
    #[serde(default = "default_type_root")]
    pub type_root: String,
    /// Prefix prepended to every bound parameter name.
    #[serde(default)]
    pub parameter_prefix: String,
    /// Parameter fields whose type name ends with one of these are not bound.
    #[serde(default = "default_skip_suffixes")]
    pub skip_suffixes: Vec<String>,
    /// Path of the core crate as seen from the generated code.
    #[serde(default = "default_core_crate")]
    pub core_crate: String,
}

fn default_type_root() -> String {
    "crate".to_string()
}

fn default_skip_suffixes() -> Vec<String> {
    vec!["View".to_string(), "Dto".to_string()]
}

fn default_core_crate() -> String {
    "procwire_core".to_string()
}

impl GeneratorConfig {
    /// Configuration with defaults for everything but the two paths.
    pub fn new(source_root: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_root: source_root.into(),
            output_dir: output_dir.into(),
            type_root: default_type_root(),
            parameter_prefix: String::new(),
            skip_suffixes: default_skip_suffixes(),
            core_crate: default_core_crate(),
        }
    }

    /// Load from `--config <path>` or `PROCWIRE_GEN_CONFIG`, then validate.
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path_from_args().or_else(config_path_from_env);
        let path = path.ok_or(ConfigError::MissingConfigPath)?;
        let config = Self::from_path(&path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: GeneratorConfig = toml::from_str(&contents)?;
        if let Some(base) = path.parent() {
            config.source_root = base.join(&config.source_root);
            config.output_dir = base.join(&config.output_dir);
        }
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source_root.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "source_root",
                reason: "must not be empty".to_string(),
            });
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "output_dir",
                reason: "must not be empty".to_string(),
            });
        }
        if !is_rust_path(&self.type_root) {
            return Err(ConfigError::InvalidValue {
                field: "type_root",
                reason: format!("'{}' is not a Rust path", self.type_root),
            });
        }
        if !is_rust_path(&self.core_crate) {
            return Err(ConfigError::InvalidValue {
                field: "core_crate",
                reason: format!("'{}' is not a Rust path", self.core_crate),
            });
        }
        if !self
            .parameter_prefix
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(ConfigError::InvalidValue {
                field: "parameter_prefix",
                reason: "may only contain ASCII letters, digits or '_'".to_string(),
            });
        }
        if self.skip_suffixes.iter().any(|s| s.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "skip_suffixes",
                reason: "entries must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

fn is_rust_path(path: &str) -> bool {
    !path.is_empty()
        && path.split("::").all(|segment| {
            let mut chars = segment.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}

fn config_path_from_env() -> Option<PathBuf> {
    std::env::var("PROCWIRE_GEN_CONFIG").ok().map(PathBuf::from)
}

fn config_path_from_args() -> Option<PathBuf> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next().map(PathBuf::from);
        }
    }
    None
}
