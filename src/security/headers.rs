//! Security response headers.
//!
//! # Responsibilities
//! - Attach the CSP (enforcing or report-only) to every response
//! - Attach cross-origin, referrer and hardening headers
//! - Never send Cross-Origin-Embedder-Policy; the map widgets load
//!   cross-origin tiles without CORP headers

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use thiserror::Error;

use crate::config::schema::SecurityConfig;
use crate::security::csp::{ContentSecurityPolicy, CspError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SecurityHeadersError {
    #[error(transparent)]
    Csp(#[from] CspError),

    #[error("{header}: invalid header value {value:?}")]
    InvalidValue { header: &'static str, value: String },
}

/// The fixed header set computed at startup.
#[derive(Debug, Clone)]
pub struct SecurityHeaders {
    csp: ContentSecurityPolicy,
    csp_header: HeaderName,
    headers: Vec<(HeaderName, HeaderValue)>,
}

impl SecurityHeaders {
    pub fn from_config(config: &SecurityConfig) -> Result<Self, SecurityHeadersError> {
        let csp = ContentSecurityPolicy::from_config(&config.csp)?;
        let csp_header = ContentSecurityPolicy::header_name(config.csp_report_only);

        let mut headers = vec![
            (csp_header.clone(), csp.header_value()),
            (
                HeaderName::from_static("cross-origin-opener-policy"),
                header_value(
                    "cross-origin-opener-policy",
                    &config.cross_origin_opener_policy,
                )?,
            ),
            (
                HeaderName::from_static("cross-origin-resource-policy"),
                header_value(
                    "cross-origin-resource-policy",
                    &config.cross_origin_resource_policy,
                )?,
            ),
            (
                HeaderName::from_static("origin-agent-cluster"),
                HeaderValue::from_static("?1"),
            ),
            (
                header::REFERRER_POLICY,
                header_value("referrer-policy", &config.referrer_policy)?,
            ),
            (header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")),
            (header::X_DNS_PREFETCH_CONTROL, HeaderValue::from_static("off")),
            (
                HeaderName::from_static("x-download-options"),
                HeaderValue::from_static("noopen"),
            ),
            (header::X_FRAME_OPTIONS, HeaderValue::from_static("SAMEORIGIN")),
            (
                HeaderName::from_static("x-permitted-cross-domain-policies"),
                HeaderValue::from_static("none"),
            ),
            (header::X_XSS_PROTECTION, HeaderValue::from_static("0")),
        ];
        if config.hsts {
            headers.push((
                header::STRICT_TRANSPORT_SECURITY,
                HeaderValue::from_static("max-age=31536000; includeSubDomains"),
            ));
        }

        Ok(Self {
            csp,
            csp_header,
            headers,
        })
    }

    pub fn csp(&self) -> &ContentSecurityPolicy {
        &self.csp
    }

    /// `content-security-policy` or `content-security-policy-report-only`.
    pub fn csp_header(&self) -> &HeaderName {
        &self.csp_header
    }

    /// Insert every header, replacing values a handler may have set.
    pub fn apply(&self, response: &mut Response) {
        let target = response.headers_mut();
        for (name, value) in &self.headers {
            target.insert(name.clone(), value.clone());
        }
        target.remove("cross-origin-embedder-policy");
    }
}

fn header_value(header: &'static str, value: &str) -> Result<HeaderValue, SecurityHeadersError> {
    HeaderValue::from_str(value).map_err(|_| SecurityHeadersError::InvalidValue {
        header,
        value: value.to_string(),
    })
}

/// Middleware attaching the security header set to every response.
pub async fn security_headers_middleware(
    State(headers): State<Arc<SecurityHeaders>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    headers.apply(&mut response);
    response
}
