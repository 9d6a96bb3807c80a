//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber (pretty or JSON)
//! - Build the per-request span: method, URI, request id, client address
//!
//! # Design Decisions
//! - `RUST_LOG` wins over the configured default filter
//! - The client address comes from `X-Forwarded-For` only when the proxy in
//!   front is trusted

use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, Request};
use std::net::{IpAddr, SocketAddr};
use tracing::Span;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::schema::{LogFormat, ObservabilityConfig};

/// Install the global subscriber. Later calls are ignored.
pub fn init_tracing(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let registry = tracing_subscriber::registry().with(filter);
    let result = match config.log_format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
    };
    if result.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}

/// Address of the client that sent the request.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>, trust_proxy: bool) -> Option<IpAddr> {
    if trust_proxy {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .and_then(|v| v.trim().parse::<IpAddr>().ok());
        if forwarded.is_some() {
            return forwarded;
        }
    }
    peer.map(|addr| addr.ip())
}

/// Span factory for `TraceLayer::make_span_with`.
#[derive(Debug, Clone, Copy)]
pub struct RequestSpan {
    pub trust_proxy: bool,
}

impl<B> tower_http::trace::MakeSpan<B> for RequestSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        let peer = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        let client = client_ip(request.headers(), peer, self.trust_proxy)
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| "-".to_string());
        let request_id = request
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");

        tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id,
            client = %client,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn forwarded(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_untrusted_proxy_uses_peer() {
        let peer: SocketAddr = "10.0.0.5:41000".parse().unwrap();
        let ip = client_ip(&forwarded("203.0.113.7"), Some(peer), false);
        assert_eq!(ip, Some("10.0.0.5".parse().unwrap()));
    }

    #[test]
    fn test_trusted_proxy_uses_leftmost_forwarded() {
        let peer: SocketAddr = "10.0.0.5:41000".parse().unwrap();
        let ip = client_ip(&forwarded("203.0.113.7, 10.0.0.1"), Some(peer), true);
        assert_eq!(ip, Some("203.0.113.7".parse().unwrap()));
    }

    #[test]
    fn test_trusted_proxy_with_garbage_header() {
        let peer: SocketAddr = "10.0.0.5:41000".parse().unwrap();
        let ip = client_ip(&forwarded("unknown"), Some(peer), true);
        assert_eq!(ip, Some("10.0.0.5".parse().unwrap()));
        assert_eq!(client_ip(&HeaderMap::new(), None, true), None);
    }
}
