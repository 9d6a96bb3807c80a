//! SPA fallback: client-side routes get the entry document.

use async_trait::async_trait;
use axum::http::{request::Parts, Method};
use axum::response::Response;
use std::path::PathBuf;

use crate::http::response::{extension_of, HeaderPolicy};
use crate::routing::chain::Stage;
use crate::routing::files::{serve_file, sub_request};

/// Last stage of the chain. Extensionless paths are client-side routes and
/// get the entry document whatever the method; paths with an extension are
/// missing assets and pass on to the 404.
#[derive(Debug, Clone)]
pub struct SpaFallback {
    index: PathBuf,
}

impl SpaFallback {
    pub fn new(index: impl Into<PathBuf>) -> Self {
        Self { index: index.into() }
    }
}

#[async_trait]
impl Stage for SpaFallback {
    fn name(&self) -> &'static str {
        "spa_fallback"
    }

    async fn attempt(&self, request: &Parts) -> Option<Response> {
        if extension_of(request.uri.path()).is_some() {
            return None;
        }

        // Any method gets the shell; the file service itself only reads.
        let mut sub = sub_request(request, "/")?;
        if request.method != Method::HEAD {
            *sub.method_mut() = Method::GET;
        }
        let mut response = serve_file(&self.index, sub).await?;
        HeaderPolicy::for_path("/index.html", false).apply(&mut response);
        Some(response)
    }
}
