//! Content-Security-Policy assembly.
//!
//! The policy is built once from the directive table and rendered into a
//! single header value. Directive names are lowercase tokens; sources may not
//! contain the `;` or `,` separators, or whitespace.

use axum::http::{HeaderName, HeaderValue};
use thiserror::Error;

use crate::config::schema::CspConfig;

/// Directives the header middleware adds unless the table names them.
const BASELINE: &[(&str, &[&str])] = &[
    ("base-uri", &["'self'"]),
    ("form-action", &["'self'"]),
    ("script-src-attr", &["'none'"]),
    ("upgrade-insecure-requests", &[]),
];

/// Directives that take no source list.
const VALUELESS: &[&str] = &["upgrade-insecure-requests", "block-all-mixed-content"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CspError {
    #[error("invalid directive name {0:?}")]
    InvalidName(String),

    #[error("directive {0} appears more than once")]
    Duplicate(String),

    #[error("directive {0} has no sources")]
    EmptySources(String),

    #[error("directive {0} takes no sources")]
    UnexpectedSources(String),

    #[error("directive {directive} has invalid source {value:?}")]
    InvalidSource { directive: String, value: String },
}

/// A validated, rendered policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentSecurityPolicy {
    directives: Vec<(String, Vec<String>)>,
    rendered: String,
}

impl ContentSecurityPolicy {
    /// Validate the directive table and render it.
    pub fn from_config(config: &CspConfig) -> Result<Self, CspError> {
        let mut directives: Vec<(String, Vec<String>)> = Vec::new();

        for directive in &config.directives {
            let name = directive.name.trim().to_ascii_lowercase();
            if !is_valid_name(&name) {
                return Err(CspError::InvalidName(directive.name.clone()));
            }
            if directives.iter().any(|(existing, _)| *existing == name) {
                return Err(CspError::Duplicate(name));
            }

            let valueless = VALUELESS.contains(&name.as_str());
            if valueless && !directive.sources.is_empty() {
                return Err(CspError::UnexpectedSources(name));
            }
            if !valueless && directive.sources.is_empty() {
                return Err(CspError::EmptySources(name));
            }
            for source in &directive.sources {
                if !is_valid_source(source) {
                    return Err(CspError::InvalidSource {
                        directive: name,
                        value: source.clone(),
                    });
                }
            }

            directives.push((name, directive.sources.clone()));
        }

        if config.use_defaults {
            for (name, sources) in BASELINE {
                if !directives.iter().any(|(existing, _)| existing == name) {
                    directives.push((
                        name.to_string(),
                        sources.iter().map(|s| s.to_string()).collect(),
                    ));
                }
            }
        }

        let rendered = directives
            .iter()
            .map(|(name, sources)| {
                if sources.is_empty() {
                    name.clone()
                } else {
                    format!("{} {}", name, sources.join(" "))
                }
            })
            .collect::<Vec<_>>()
            .join(";");

        Ok(Self { directives, rendered })
    }

    /// Header carrying the policy: enforcing or report-only.
    pub fn header_name(report_only: bool) -> HeaderName {
        if report_only {
            HeaderName::from_static("content-security-policy-report-only")
        } else {
            HeaderName::from_static("content-security-policy")
        }
    }

    /// The rendered header value.
    pub fn as_str(&self) -> &str {
        &self.rendered
    }

    /// Sources of one directive, if present.
    pub fn sources(&self, name: &str) -> Option<&[String]> {
        self.directives
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, sources)| sources.as_slice())
    }

    pub fn header_value(&self) -> HeaderValue {
        // Validation restricts every character to visible ASCII.
        HeaderValue::from_str(&self.rendered).unwrap_or_else(|_| HeaderValue::from_static(""))
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

fn is_valid_source(source: &str) -> bool {
    !source.is_empty()
        && source
            .chars()
            .all(|c| c.is_ascii_graphic() && c != ';' && c != ',')
}
