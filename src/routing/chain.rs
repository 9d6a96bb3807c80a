//! The ordered handler chain.
//!
//! Every stage implements [`Stage`]. The chain asks each stage in order and
//! returns the first response; if none answers the result is a bare 404.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{request::Parts, HeaderValue, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::config::schema::PathsConfig;
use crate::observability::metrics;
use crate::routing::app_root::AppRoot;
use crate::routing::fallback::SpaFallback;
use crate::routing::mount::StaticMount;

/// One step of the chain.
#[async_trait]
pub trait Stage: Send + Sync + fmt::Debug {
    /// Label used in logs and metrics.
    fn name(&self) -> &'static str;

    /// Produce a response, or `None` to pass the request on.
    async fn attempt(&self, request: &Parts) -> Option<Response>;
}

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("mount {prefix}: invalid cache_control {value:?}")]
    InvalidCacheControl { prefix: String, value: String },
}

#[derive(Debug)]
pub struct HandlerChain {
    stages: Vec<Box<dyn Stage>>,
}

impl HandlerChain {
    pub fn new(stages: Vec<Box<dyn Stage>>) -> Self {
        Self { stages }
    }

    /// Build the standard chain: dataset mount, dataset aliases, image mount,
    /// application root, SPA fallback.
    pub fn from_config(paths: &PathsConfig) -> Result<Self, ChainError> {
        let dataset_dir = paths.resolved_dataset_dir();
        let mut stages: Vec<Box<dyn Stage>> = Vec::new();

        stages.push(Box::new(
            StaticMount::new("dataset", &paths.dataset_prefix, &dataset_dir).from_dataset(true),
        ));

        for alias in &paths.dataset_aliases {
            let root: PathBuf = match &alias.subdir {
                Some(subdir) => dataset_dir.join(subdir),
                None => dataset_dir.clone(),
            };
            let cache_control = alias
                .cache_control
                .as_deref()
                .map(|value| {
                    HeaderValue::from_str(value).map_err(|_| ChainError::InvalidCacheControl {
                        prefix: alias.prefix.clone(),
                        value: value.to_string(),
                    })
                })
                .transpose()?;

            stages.push(Box::new(
                StaticMount::new("dataset_alias", &alias.prefix, root)
                    .from_dataset(true)
                    .cache_control(cache_control),
            ));
        }

        if let Some(image_dir) = &paths.image_dir {
            stages.push(Box::new(StaticMount::new("images", &paths.image_prefix, image_dir)));
        }

        stages.push(Box::new(AppRoot::new(&paths.app_root, &paths.dataset_prefix)));
        stages.push(Box::new(SpaFallback::new(paths.index_path())));

        Ok(Self::new(stages))
    }

    /// Stage names in evaluation order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    pub async fn handle(&self, request: Request<Body>) -> Response {
        let (parts, _body) = request.into_parts();

        for stage in &self.stages {
            if let Some(response) = stage.attempt(&parts).await {
                tracing::debug!(
                    stage = stage.name(),
                    path = %parts.uri.path(),
                    status = %response.status(),
                    "Request resolved"
                );
                metrics::record_resolved(stage.name(), response.status().as_u16());
                return response;
            }
        }

        tracing::debug!(path = %parts.uri.path(), "No stage matched");
        metrics::record_resolved("none", StatusCode::NOT_FOUND.as_u16());
        StatusCode::NOT_FOUND.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::AliasConfig;

    #[derive(Debug)]
    struct Fixed(&'static str, Option<StatusCode>);

    #[async_trait]
    impl Stage for Fixed {
        fn name(&self) -> &'static str {
            self.0
        }

        async fn attempt(&self, _request: &Parts) -> Option<Response> {
            self.1.map(|status| (status, self.0).into_response())
        }
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_first_answer_wins() {
        let chain = HandlerChain::new(vec![
            Box::new(Fixed("skip", None)),
            Box::new(Fixed("first", Some(StatusCode::OK))),
            Box::new(Fixed("second", Some(StatusCode::ACCEPTED))),
        ]);

        let response = chain.handle(get("/x")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"first");
    }

    #[tokio::test]
    async fn test_exhausted_chain_is_bare_404() {
        let chain = HandlerChain::new(vec![Box::new(Fixed("skip", None))]);

        let response = chain.handle(get("/x.png")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert!(body.is_empty());
    }

    #[test]
    fn test_standard_order() {
        let mut paths = PathsConfig {
            image_dir: Some(PathBuf::from("img")),
            ..Default::default()
        };
        paths.dataset_aliases.push(AliasConfig {
            prefix: "/dados".into(),
            subdir: Some("sad".into()),
            cache_control: Some("no-cache".into()),
        });

        let chain = HandlerChain::from_config(&paths).unwrap();
        assert_eq!(
            chain.stage_names(),
            ["dataset", "dataset_alias", "dataset_alias", "images", "app_root", "spa_fallback"]
        );
    }

    #[test]
    fn test_invalid_cache_control() {
        let mut paths = PathsConfig::default();
        paths.dataset_aliases[0].cache_control = Some("no-cache\n".into());
        assert!(matches!(
            HandlerChain::from_config(&paths),
            Err(ChainError::InvalidCacheControl { .. })
        ));
    }
}
