//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     CspConfig → csp.rs (validate + render)
//!     SecurityConfig → headers.rs (fixed header set)
//!
//! Every response:
//!     → headers.rs middleware inserts the header set
//! ```
//!
//! # Design Decisions
//! - Header values are computed once; requests only clone them
//! - A malformed CSP table or header value is fatal at startup, never at
//!   request time

pub mod csp;
pub mod headers;

pub use csp::{ContentSecurityPolicy, CspError};
pub use headers::{security_headers_middleware, SecurityHeaders, SecurityHeadersError};
