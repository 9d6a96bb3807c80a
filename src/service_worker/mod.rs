//! Client-side cache strategy.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     dataset prefix → patterns.rs (SwrPatterns)
//!     cache name + patterns → script.rs → served at /sw.js
//!
//! Browser (and strategy.rs, which models it):
//!     fetch event → GET? tracked URL? → cached entry or network
//!                                     → refresh cache in background
//! ```

pub mod patterns;
pub mod script;
pub mod strategy;

pub use patterns::SwrPatterns;
pub use strategy::{
    CacheStorage, CacheStore, CachedResponse, Fetch, FetchError, Handled, Interception, Refresh,
    ResponseSource, StaleWhileRevalidate, SwRequest,
};
