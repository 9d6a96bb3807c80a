//! Startup checks and errors.
//!
//! Any error here is fatal; the supervisor restarts the process.

use std::path::Path;
use thiserror::Error;

use crate::config::schema::ServerConfig;
use crate::config::ConfigError;
use crate::routing::ChainError;
use crate::security::SecurityHeadersError;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid security headers: {0}")]
    SecurityHeaders(#[from] SecurityHeadersError),

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error("invalid service worker pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

/// Log where each mount points and warn about roots that do not exist yet.
/// Missing dataset or image directories are not fatal; their requests fall
/// through to the next stage.
pub fn report_layout(config: &ServerConfig) {
    let paths = &config.paths;
    let dataset_dir = paths.resolved_dataset_dir();

    tracing::info!(
        app_root = %paths.app_root.display(),
        dataset_dir = %dataset_dir.display(),
        dataset_prefix = %paths.dataset_prefix,
        aliases = paths.dataset_aliases.len(),
        "Serving static content"
    );

    warn_if_missing("dataset_dir", &dataset_dir);
    for alias in &paths.dataset_aliases {
        if let Some(subdir) = &alias.subdir {
            warn_if_missing("dataset alias", &dataset_dir.join(subdir));
        }
    }
    if let Some(image_dir) = &paths.image_dir {
        warn_if_missing("image_dir", image_dir);
    }
    if !paths.index_path().is_file() {
        tracing::warn!(
            index = %paths.index_path().display(),
            "Entry document missing; client-side routes will 404"
        );
    }
}

fn warn_if_missing(what: &'static str, dir: &Path) {
    if !dir.is_dir() {
        tracing::warn!(what, dir = %dir.display(), "Directory does not exist");
    }
}
