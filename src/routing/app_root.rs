//! The application root stage.

use async_trait::async_trait;
use axum::http::request::Parts;
use axum::response::Response;
use std::path::Path;
use tower_http::services::ServeDir;

use crate::http::response::{extension_of, HeaderPolicy};
use crate::routing::chain::Stage;
use crate::routing::files::{is_servable_method, serve_from_dir, sub_request};
use crate::routing::matcher::{has_dotfile_segment, PathPrefixMatcher};

/// Serves the SPA's own files. Directories serve their `index.html`, and an
/// extensionless miss is retried as `<path>.html`. Files under the dataset
/// prefix get the dataset cache policy even when served from here.
#[derive(Debug, Clone)]
pub struct AppRoot {
    service: ServeDir,
    dataset: PathPrefixMatcher,
}

impl AppRoot {
    pub fn new(root: impl AsRef<Path>, dataset_prefix: &str) -> Self {
        Self {
            service: ServeDir::new(root.as_ref()),
            dataset: PathPrefixMatcher::new(dataset_prefix),
        }
    }

    async fn serve(&self, request: &Parts, path: &str) -> Option<Response> {
        let mut response = serve_from_dir(&self.service, sub_request(request, path)?).await?;
        let from_dataset = self.dataset.strip(path).is_some();
        HeaderPolicy::for_path(path, from_dataset).apply(&mut response);
        Some(response)
    }
}

#[async_trait]
impl Stage for AppRoot {
    fn name(&self) -> &'static str {
        "app_root"
    }

    async fn attempt(&self, request: &Parts) -> Option<Response> {
        if !is_servable_method(&request.method) {
            return None;
        }
        let path = request.uri.path();
        if has_dotfile_segment(path) {
            return None;
        }

        if let Some(response) = self.serve(request, path).await {
            return Some(response);
        }

        if path.ends_with('/') || extension_of(path).is_some() {
            return None;
        }
        self.serve(request, &format!("{path}.html")).await
    }
}
