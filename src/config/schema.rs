//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files, and
//! every section has defaults so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Root configuration for the dashboard server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (host, port).
    pub listener: ListenerConfig,

    /// Filesystem roots and the URL prefixes they are mounted on.
    pub paths: PathsConfig,

    /// Security headers and CSP.
    pub security: SecurityConfig,

    /// Response compression.
    pub compression: CompressionConfig,

    /// Service worker script served at `/sw.js`.
    pub service_worker: ServiceWorkerConfig,

    /// Debug endpoints (`/__csp`, `/__ls`).
    pub debug: DebugConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind (e.g., "0.0.0.0").
    pub host: String,

    /// TCP port. `0` asks the OS for an ephemeral port.
    pub port: u16,
}

impl ListenerConfig {
    /// The `host:port` string handed to the TCP listener.
    pub fn bind_address(&self) -> String {
        match self.host.parse::<std::net::IpAddr>() {
            Ok(ip) => SocketAddr::new(ip, self.port).to_string(),
            Err(_) => format!("{}:{}", self.host, self.port),
        }
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

/// Where files are served from.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Application root: the SPA, its scripts and styles.
    pub app_root: PathBuf,

    /// Entry document served for client-side routes, relative to `app_root`.
    pub index_file: String,

    /// Dataset directory. Defaults to `<app_root>/dataset`.
    pub dataset_dir: Option<PathBuf>,

    /// URL prefix the dataset directory is mounted on.
    pub dataset_prefix: String,

    /// Additional mounts that resolve against the dataset directory.
    pub dataset_aliases: Vec<AliasConfig>,

    /// Optional image directory mounted on `image_prefix`.
    pub image_dir: Option<PathBuf>,

    /// URL prefix for `image_dir`.
    pub image_prefix: String,
}

impl PathsConfig {
    /// The dataset directory after applying the `<app_root>/dataset` default.
    pub fn resolved_dataset_dir(&self) -> PathBuf {
        self.dataset_dir
            .clone()
            .unwrap_or_else(|| self.app_root.join("dataset"))
    }

    /// Absolute-or-relative path of the SPA entry document.
    pub fn index_path(&self) -> PathBuf {
        self.app_root.join(&self.index_file)
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            app_root: PathBuf::from("."),
            index_file: "index.html".to_string(),
            dataset_dir: None,
            dataset_prefix: "/dataset".to_string(),
            dataset_aliases: vec![AliasConfig::default()],
            image_dir: None,
            image_prefix: "/img".to_string(),
        }
    }
}

/// A secondary mount onto the dataset directory.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AliasConfig {
    /// URL prefix (e.g., "/dataset/sad").
    pub prefix: String,

    /// Subdirectory of the dataset directory to serve. `None` serves the
    /// dataset root itself.
    #[serde(default)]
    pub subdir: Option<String>,

    /// Cache-Control value replacing the computed policy for this mount.
    #[serde(default)]
    pub cache_control: Option<String>,
}

impl Default for AliasConfig {
    fn default() -> Self {
        Self {
            prefix: "/dataset/sad".to_string(),
            subdir: None,
            cache_control: None,
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Send `Content-Security-Policy-Report-Only` instead of enforcing.
    pub csp_report_only: bool,

    /// Take the client address from `X-Forwarded-For`.
    pub trust_proxy: bool,

    /// Value of `Cross-Origin-Opener-Policy`.
    pub cross_origin_opener_policy: String,

    /// Value of `Cross-Origin-Resource-Policy`.
    pub cross_origin_resource_policy: String,

    /// Value of `Referrer-Policy`.
    pub referrer_policy: String,

    /// Send `Strict-Transport-Security`.
    pub hsts: bool,

    /// CSP directive table.
    pub csp: CspConfig,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            csp_report_only: false,
            trust_proxy: false,
            cross_origin_opener_policy: "same-origin-allow-popups".to_string(),
            cross_origin_resource_policy: "cross-origin".to_string(),
            referrer_policy: "no-referrer-when-downgrade".to_string(),
            hsts: true,
            csp: CspConfig::default(),
        }
    }
}

/// CSP directive table.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CspConfig {
    /// Append the baseline directives (`base-uri`, `form-action`,
    /// `script-src-attr`, `upgrade-insecure-requests`) not named in
    /// `directives`.
    pub use_defaults: bool,

    /// Directives in emission order.
    pub directives: Vec<DirectiveConfig>,
}

impl Default for CspConfig {
    fn default() -> Self {
        Self {
            use_defaults: true,
            directives: default_directives(),
        }
    }
}

/// One CSP directive with its source list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DirectiveConfig {
    pub name: String,
    #[serde(default)]
    pub sources: Vec<String>,
}

impl DirectiveConfig {
    pub fn new(name: &str, sources: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            sources: sources.iter().map(|s| s.to_string()).collect(),
        }
    }
}

const SELF: &str = "'self'";

/// Remote origins the map and table widgets load images and data from.
const REMOTE_MEDIA: &[&str] = &[
    "https://*.tile.openstreetmap.org",
    "https://*.basemaps.cartocdn.com",
    "https://unpkg.com",
    "https://cdn.jsdelivr.net",
    "https://cdnjs.cloudflare.com",
    "https://cdn.datatables.net",
    "https://imazongeo3-web.s3.sa-east-1.amazonaws.com",
];

fn concat(head: &[&'static str], tail: &[&'static str]) -> Vec<&'static str> {
    head.iter().chain(tail).copied().collect()
}

fn default_directives() -> Vec<DirectiveConfig> {
    vec![
        DirectiveConfig::new("default-src", &[SELF]),
        DirectiveConfig::new(
            "script-src",
            &[
                SELF,
                "'unsafe-inline'",
                "'unsafe-eval'",
                "https://code.jquery.com",
                "https://cdn.jsdelivr.net",
                "https://unpkg.com",
                "https://cdnjs.cloudflare.com",
                "https://cdn.datatables.net",
                "https://d3js.org",
            ],
        ),
        DirectiveConfig::new(
            "style-src",
            &[
                SELF,
                "'unsafe-inline'",
                "https://fonts.googleapis.com",
                "https://cdn.jsdelivr.net",
                "https://cdnjs.cloudflare.com",
                "https://cdn.datatables.net",
                "https://unpkg.com",
            ],
        ),
        DirectiveConfig::new(
            "font-src",
            &[
                SELF,
                "https://fonts.gstatic.com",
                "https://cdn.jsdelivr.net",
                "https://cdnjs.cloudflare.com",
            ],
        ),
        DirectiveConfig::new("img-src", &concat(&[SELF, "data:", "blob:"], REMOTE_MEDIA)),
        DirectiveConfig::new("connect-src", &concat(&[SELF], REMOTE_MEDIA)),
        DirectiveConfig::new("worker-src", &[SELF, "blob:"]),
        DirectiveConfig::new("object-src", &["'none'"]),
        DirectiveConfig::new("frame-ancestors", &[SELF]),
    ]
}

/// Response compression configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CompressionConfig {
    /// Enable compression.
    pub enabled: bool,

    /// Bodies smaller than this many bytes are sent uncompressed.
    pub threshold_bytes: u16,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold_bytes: 1024,
        }
    }
}

/// Service worker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceWorkerConfig {
    /// Serve the generated script.
    pub enabled: bool,

    /// URL path of the script. Must be at the root for scope `/`.
    pub path: String,

    /// Versioned cache name; changing it invalidates browser caches.
    pub cache_name: String,
}

impl Default for ServiceWorkerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "/sw.js".to_string(),
            cache_name: "gpx-sad-v1".to_string(),
        }
    }
}

/// Debug endpoints.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DebugConfig {
    pub enabled: bool,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default filter when `RUST_LOG` is unset.
    pub log_level: String,

    /// Pretty for terminals, JSON for log shippers.
    pub log_format: LogFormat,

    /// Enable Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "dashboard_server=info,tower_http=info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
