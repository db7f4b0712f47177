//! Shared SBI (HTTP/JSON) plumbing.
//!
//! - [`problem`] - `application/problem+json` error bodies and the axum
//!   response mapping for [`crate::Error`]
//! - [`client`] - reqwest wrapper with the crate's retry/backoff policy and
//!   correlation-id propagation
//! - [`server`] - graceful server runner shared by the NF binaries
//! - [`nrf`] - registration/heartbeat/discovery client toward the NRF

pub mod client;
pub mod nrf;
pub mod problem;
pub mod server;

/// Trace correlation header every endpoint accepts and emits.
pub const CORRELATION_HEADER: &str = "3gpp-Sbi-Correlation-Id";
