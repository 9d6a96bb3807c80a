//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Build chain and headers → Bind → Serve
//!
//! Shutdown (shutdown.rs, signals.rs):
//!     SIGINT/SIGTERM → broadcast → stop accepting → drain → exit
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - No reload signal; configuration changes need a restart

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::StartupError;
