//! Configuration validation.
//!
//! Serde handles syntax; this module checks semantics. Validation is a pure
//! function of the config plus filesystem existence checks, and it returns
//! every error rather than stopping at the first.

use std::path::{Component, Path};

use axum::http::HeaderValue;
use thiserror::Error;

use crate::config::schema::ServerConfig;
use crate::security::csp::ContentSecurityPolicy;

/// Fixed routes the service worker script may not take over.
const RESERVED_ROUTES: &[&str] = &["/healthz", "/__csp", "/__ls"];

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("application root {0} is not a directory")]
    MissingAppRoot(String),

    #[error("{field}: prefix {prefix:?} must start with '/' and not end with '/'")]
    BadPrefix { field: &'static str, prefix: String },

    #[error("{field}: {value:?} must be a plain relative path")]
    BadRelativePath { field: &'static str, value: String },

    #[error("csp: {0}")]
    Csp(String),

    #[error("{field}: {value:?} is not a valid header value")]
    BadHeaderValue { field: &'static str, value: String },

    #[error("service_worker.cache_name must not be empty")]
    EmptyCacheName,

    #[error("service_worker.path {0:?} must be a root-level path")]
    BadServiceWorkerPath(String),
}

/// Validate a configuration before it is accepted.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let paths = &config.paths;

    if !paths.app_root.is_dir() {
        errors.push(ValidationError::MissingAppRoot(
            paths.app_root.display().to_string(),
        ));
    }

    check_prefix(&mut errors, "paths.dataset_prefix", &paths.dataset_prefix);
    check_prefix(&mut errors, "paths.image_prefix", &paths.image_prefix);
    for alias in &paths.dataset_aliases {
        check_prefix(&mut errors, "paths.dataset_aliases.prefix", &alias.prefix);
        if let Some(subdir) = &alias.subdir {
            check_relative(&mut errors, "paths.dataset_aliases.subdir", subdir);
        }
    }
    check_relative(&mut errors, "paths.index_file", &paths.index_file);

    let security = &config.security;
    if let Err(e) = ContentSecurityPolicy::from_config(&security.csp) {
        errors.push(ValidationError::Csp(e.to_string()));
    }
    check_header_value(
        &mut errors,
        "security.cross_origin_opener_policy",
        &security.cross_origin_opener_policy,
    );
    check_header_value(
        &mut errors,
        "security.cross_origin_resource_policy",
        &security.cross_origin_resource_policy,
    );
    check_header_value(&mut errors, "security.referrer_policy", &security.referrer_policy);
    for alias in &paths.dataset_aliases {
        if let Some(cache_control) = &alias.cache_control {
            check_header_value(&mut errors, "paths.dataset_aliases.cache_control", cache_control);
        }
    }

    let sw = &config.service_worker;
    if sw.cache_name.trim().is_empty() {
        errors.push(ValidationError::EmptyCacheName);
    }
    if !sw.path.starts_with('/')
        || sw.path.len() < 2
        || sw.path[1..].contains('/')
        || RESERVED_ROUTES.contains(&sw.path.as_str())
    {
        errors.push(ValidationError::BadServiceWorkerPath(sw.path.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_prefix(errors: &mut Vec<ValidationError>, field: &'static str, prefix: &str) {
    if !prefix.starts_with('/') || prefix.len() < 2 || prefix.ends_with('/') {
        errors.push(ValidationError::BadPrefix {
            field,
            prefix: prefix.to_string(),
        });
    }
}

fn check_header_value(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if HeaderValue::from_str(value).is_err() {
        errors.push(ValidationError::BadHeaderValue {
            field,
            value: value.to_string(),
        });
    }
}

fn check_relative(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    let plain = !value.is_empty()
        && Path::new(value)
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
    if !plain {
        errors.push(ValidationError::BadRelativePath {
            field,
            value: value.to_string(),
        });
    }
}
