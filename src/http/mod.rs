//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!         → /healthz, /__csp, /__ls, /sw.js (fixed routes)
//!         → everything else: routing::HandlerChain
//!     → response.rs (content type and cache policy per served path)
//!     → security headers, compression
//!     → Send to client
//! ```

pub mod debug;
pub mod response;
pub mod server;

pub use server::{AppState, HttpServer};
