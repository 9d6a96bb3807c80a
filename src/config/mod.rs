//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults
//!     → loader.rs (optional TOML file)
//!     → loader.rs (flag / environment overrides)
//!     → validation.rs (semantic checks)
//!     → ServerConfig (validated, immutable)
//!     → shared via Arc with the handler chain
//! ```
//!
//! # Design Decisions
//! - Config is read once at startup; there is no reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError, Overrides};
pub use schema::{
    AliasConfig, CompressionConfig, CspConfig, DirectiveConfig, ListenerConfig, LogFormat,
    PathsConfig, SecurityConfig, ServerConfig,
};
