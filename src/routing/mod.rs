//! Static resolution subsystem.
//!
//! # Data Flow
//! ```text
//! Request (method, path, headers)
//!     → chain.rs (try each Stage in order)
//!         → mount.rs   /dataset, aliases, /img
//!         → app_root.rs  application root (+ .html inference)
//!         → fallback.rs  SPA entry document for extensionless paths
//!     → first Some(response) wins; otherwise 404
//! ```
//!
//! # Design Decisions
//! - Stages are built once at startup and never change
//! - A stage that misses returns None instead of a 404 response
//! - File serving, range and date-conditional requests are tower-http's
//!   `ServeDir`; conditional.rs adds weak ETags and `If-None-Match`

pub mod app_root;
pub mod chain;
pub mod conditional;
pub mod fallback;
pub mod files;
pub mod matcher;
pub mod mount;

pub use chain::{ChainError, HandlerChain, Stage};
