//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Request path:
//!     → logging.rs (request span: method, uri, request id, client)
//!     → metrics.rs (requests by stage and status)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Prometheus scrape endpoint (optional)
//! ```

pub mod logging;
pub mod metrics;
