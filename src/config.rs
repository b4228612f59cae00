//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Config file: `$XDG_CONFIG_HOME/let-me-in/config.toml`, or the file given with `--config`
//! 3. Environment variables: `LMI_*` prefix (e.g. `LMI_IDENT_URL`)
//! 4. Command line flags (applied when building [`RunConfig`])

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;

/// Environment variable prefix for overrides.
pub const ENV_PREFIX: &str = "LMI";

/// Default public IP echo endpoint.
pub const DEFAULT_IDENT_URL: &str = "http://v4.ident.me/";

/// Defaults for a run, before command line flags are applied.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Ingress protocol (default: tcp)
    pub protocol: String,
    /// Ingress port (default: 22)
    pub port: u16,
    /// Filter key used to match group identifiers (default: group-name)
    pub filter: String,
    /// Endpoint returning the caller's public IP as plain text
    pub ident_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            protocol: "tcp".into(),
            port: 22,
            filter: "group-name".into(),
            ident_url: DEFAULT_IDENT_URL.into(),
        }
    }
}

/// Get the XDG config directory for let-me-in.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "let-me-in").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

impl Settings {
    /// Load settings with layered precedence.
    ///
    /// An explicit `config_file` must exist; the global file is optional.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ApplicationError> {
        match config_file {
            Some(path) => Self::load_layered(Some((path, true)), ENV_PREFIX),
            None => {
                let global = global_config_path();
                Self::load_layered(global.as_deref().map(|p| (p, false)), ENV_PREFIX)
            }
        }
    }

    /// Build settings from defaults, an optional file and prefixed env vars.
    ///
    /// `file` is `(path, required)`.
    pub fn load_layered(file: Option<(&Path, bool)>, env_prefix: &str) -> Result<Self, ApplicationError> {
        let defaults = Settings::default();
        let mut builder = Config::builder()
            .set_default("protocol", defaults.protocol)
            .map_err(config_err)?
            .set_default("port", i64::from(defaults.port))
            .map_err(config_err)?
            .set_default("filter", defaults.filter)
            .map_err(config_err)?
            .set_default("ident_url", defaults.ident_url)
            .map_err(config_err)?;

        if let Some((path, required)) = file {
            builder = builder.add_source(File::from(path).required(required));
        }

        // `__` keeps single underscores inside keys, so LMI_IDENT_URL -> ident_url
        builder = builder.add_source(
            Environment::with_prefix(env_prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().map_err(config_err)?;
        config.try_deserialize().map_err(config_err)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

/// What a run does to the target groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Add the rule, and when a command is given, run it and revoke afterwards.
    Authorize,
    /// Remove the rule.
    Revoke,
    /// Print existing rules.
    List,
    /// Remove every existing ingress rule.
    Clean,
}

/// Immutable description of one invocation.
///
/// Built once from settings and flags, then passed by reference to the steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub mode: Mode,
    pub protocol: String,
    pub port: u16,
    /// Explicit CIDR; the echo service is used when absent
    pub cidr: Option<String>,
    pub filter: String,
    pub ident_url: String,
    /// Group identifiers, matched with `filter`
    pub groups: Vec<String>,
    /// Command to run while the rule is open; may be empty
    pub command: Vec<String>,
}
