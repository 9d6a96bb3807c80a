//! Liveness endpoint for load balancers and process supervisors.
//!
//! `/healthz` answers 200 `ok` unconditionally. It is a fixed route, so it
//! never touches the filesystem and a file named `healthz` cannot shadow it.

/// `GET /healthz`.
pub async fn liveness() -> &'static str {
    "ok"
}
