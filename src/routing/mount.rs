//! Prefix-mounted static directories (dataset, aliases, images).

use async_trait::async_trait;
use axum::http::{request::Parts, HeaderValue};
use axum::response::Response;
use std::path::Path;
use tower_http::services::ServeDir;

use crate::http::response::HeaderPolicy;
use crate::routing::chain::Stage;
use crate::routing::files::{is_servable_method, serve_from_dir, sub_request};
use crate::routing::matcher::{has_dotfile_segment, PathPrefixMatcher};

/// Serves `root` under a URL prefix. Directories are not indexed.
#[derive(Debug, Clone)]
pub struct StaticMount {
    name: &'static str,
    matcher: PathPrefixMatcher,
    service: ServeDir,
    from_dataset: bool,
    cache_control: Option<HeaderValue>,
}

impl StaticMount {
    pub fn new(name: &'static str, prefix: &str, root: impl AsRef<Path>) -> Self {
        Self {
            name,
            matcher: PathPrefixMatcher::new(prefix),
            service: ServeDir::new(root.as_ref()).append_index_html_on_directories(false),
            from_dataset: false,
            cache_control: None,
        }
    }

    /// Files from this mount get the dataset cache policy.
    pub fn from_dataset(mut self, from_dataset: bool) -> Self {
        self.from_dataset = from_dataset;
        self
    }

    /// Replace the computed Cache-Control for this mount.
    pub fn cache_control(mut self, value: Option<HeaderValue>) -> Self {
        self.cache_control = value;
        self
    }
}

#[async_trait]
impl Stage for StaticMount {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn attempt(&self, request: &Parts) -> Option<Response> {
        if !is_servable_method(&request.method) {
            return None;
        }
        let rest = self.matcher.strip(request.uri.path())?;
        if has_dotfile_segment(rest) {
            return None;
        }

        let mut response = serve_from_dir(&self.service, sub_request(request, rest)?).await?;
        HeaderPolicy::for_path(rest, self.from_dataset)
            .with_cache_control(self.cache_control.as_ref())
            .apply(&mut response);
        Some(response)
    }
}
