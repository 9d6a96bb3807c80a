//! Dashboard static server.
//!
//! Serves a single-page dashboard, its GPX/SAD dataset files and the
//! service worker that keeps those files available offline.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ─────────────▶ request id → trace span → security headers → compression
//!                                                                     │
//!                          ┌──────────────────────────────────────────┤
//!                          ▼                                          ▼
//!                   fixed routes                             routing::HandlerChain
//!            /healthz /__csp /__ls /sw.js              dataset → aliases → /img
//!                                                         → app root → SPA fallback
//!                                                         → 404
//! ```
//!
//! Configuration is loaded once at startup (`config`), then every stage,
//! header value and the service worker script are built up front
//! (`http::HttpServer::new`). Requests only read shared state.

// Core subsystems
pub mod config;
pub mod http;
pub mod routing;

// Cross-cutting concerns
pub mod health;
pub mod lifecycle;
pub mod observability;
pub mod security;

// Client-side cache model and script
pub mod service_worker;

pub use config::schema::ServerConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
