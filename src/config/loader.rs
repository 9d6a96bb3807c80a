//! Configuration loading from disk and the environment.

use std::fs;
use std::path::{Path, PathBuf};

use clap::builder::BoolishValueParser;
use clap::Args;
use thiserror::Error;

use crate::config::schema::ServerConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Startup overrides, read from flags or the environment.
///
/// Precedence is flag > environment > file > defaults.
#[derive(Debug, Clone, Default, Args)]
pub struct Overrides {
    /// Listening port.
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Interface to bind.
    #[arg(long, env = "HOST")]
    pub host: Option<String>,

    /// Application root directory.
    #[arg(long, env = "APP_ROOT")]
    pub app_root: Option<PathBuf>,

    /// Dataset directory.
    #[arg(long, env = "DATASET_DIR")]
    pub dataset_dir: Option<PathBuf>,

    /// Take client addresses from X-Forwarded-For.
    #[arg(long, env = "TRUST_PROXY", value_parser = BoolishValueParser::new())]
    pub trust_proxy: Option<bool>,

    /// Send the CSP as report-only.
    #[arg(long, env = "CSP_REPORT_ONLY", value_parser = BoolishValueParser::new())]
    pub csp_report_only: Option<bool>,
}

impl Overrides {
    /// Apply every override that is set.
    pub fn apply(&self, config: &mut ServerConfig) {
        if let Some(port) = self.port {
            config.listener.port = port;
        }
        if let Some(host) = &self.host {
            config.listener.host = host.clone();
        }
        if let Some(root) = &self.app_root {
            config.paths.app_root = root.clone();
        }
        if let Some(dir) = &self.dataset_dir {
            config.paths.dataset_dir = Some(dir.clone());
        }
        if let Some(trust) = self.trust_proxy {
            config.security.trust_proxy = trust;
        }
        if let Some(report_only) = self.csp_report_only {
            config.security.csp_report_only = report_only;
        }
    }
}

/// Parse a TOML configuration file without validating it.
pub fn read_config(path: &Path) -> Result<ServerConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

/// Build the startup configuration: file (or defaults), then overrides,
/// then validation.
pub fn load_config(path: Option<&Path>, overrides: &Overrides) -> Result<ServerConfig, ConfigError> {
    let mut config = match path {
        Some(path) => read_config(path)?,
        None => ServerConfig::default(),
    };
    overrides.apply(&mut config);

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}
