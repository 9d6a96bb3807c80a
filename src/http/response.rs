//! Header policy for served static files.
//!
//! # Responsibilities
//! - Pin the content type of the dataset formats (GeoJSON, CSV, JSON)
//! - Pick Cache-Control from the served path and the mount it came from
//!
//! # Design Decisions
//! - Pure function of (path, from_dataset, override); no request state
//! - Extension comparison is ASCII case-insensitive
//! - A mount's explicit override replaces the computed Cache-Control

use axum::http::{header, HeaderValue};
use axum::response::Response;
use std::path::Path;

/// Dataset files: fresh for 10 minutes, then revalidated in the background
/// for up to 2 more.
pub const DATASET_CACHE_CONTROL: &str = "public, max-age=600, stale-while-revalidate=120";

/// Fingerprinted assets: 7 days.
pub const IMMUTABLE_CACHE_CONTROL: &str = "public, max-age=604800, immutable";

/// HTML and everything else: always revalidate.
pub const NO_CACHE: &str = "no-cache";

const DATASET_EXTENSIONS: &[&str] = &["csv", "geojson", "json"];

const IMMUTABLE_EXTENSIONS: &[&str] = &[
    "js", "css", "png", "jpg", "jpeg", "webp", "svg", "ico", "woff", "woff2", "ttf",
];

/// Headers to set on one served file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderPolicy {
    pub content_type: Option<&'static str>,
    pub cache_control: HeaderValue,
}

impl HeaderPolicy {
    /// Compute the policy for a served path.
    pub fn for_path(path: &str, from_dataset: bool) -> Self {
        let extension = extension_of(path).map(|e| e.to_ascii_lowercase());
        let extension = extension.as_deref();

        let content_type = match extension {
            Some("geojson") => Some("application/geo+json; charset=utf-8"),
            Some("csv") => Some("text/csv; charset=utf-8"),
            Some("json") => Some("application/json; charset=utf-8"),
            _ => None,
        };

        let is_dataset = extension.is_some_and(|e| DATASET_EXTENSIONS.contains(&e));
        let is_immutable = extension.is_some_and(|e| IMMUTABLE_EXTENSIONS.contains(&e));

        let cache_control = if from_dataset || is_dataset {
            DATASET_CACHE_CONTROL
        } else if is_immutable {
            IMMUTABLE_CACHE_CONTROL
        } else {
            NO_CACHE
        };

        Self {
            content_type,
            cache_control: HeaderValue::from_static(cache_control),
        }
    }

    /// Replace the computed Cache-Control.
    pub fn with_cache_control(mut self, value: Option<&HeaderValue>) -> Self {
        if let Some(value) = value {
            self.cache_control = value.clone();
        }
        self
    }

    pub fn apply(&self, response: &mut Response) {
        let headers = response.headers_mut();
        if let Some(content_type) = self.content_type {
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        }
        headers.insert(header::CACHE_CONTROL, self.cache_control.clone());
    }
}

/// Extension of the last path segment, as `path.extname` would see it:
/// `/a.b/c` and `/.hidden` have none.
pub fn extension_of(path: &str) -> Option<&str> {
    Path::new(path).extension().and_then(|e| e.to_str())
}
