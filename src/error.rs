//! Crate-wide error taxonomy.
//!
//! Every fallible operation in the core returns [`Error`]. The variants map
//! one-to-one onto the HTTP statuses the SBI surface emits; packet-level
//! protocol errors never reach HTTP and are only counted.

use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Malformed request body, parameter, or fixed-size crypto input.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Profile, context, session, or subscriber does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// Duplicate identifier where the contract forbids replacement.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Operation requires an established security context.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Auth context or subscription past its validity deadline.
    #[error("expired: {0}")]
    Expired(String),

    /// Outbound call exceeded its deadline after exhausting the retry budget.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// Peer unreachable after retries.
    #[error("peer unavailable: {0}")]
    Unavailable(String),

    /// UPF rejected or never answered a PFCP request.
    #[error("PFCP failure: {0}")]
    PfcpFailure(String),

    /// IP or TEID pool has no free entries.
    #[error("{0} pool exhausted")]
    PoolExhausted(&'static str),

    /// Malformed PFCP or GTP-U packet. Handled at packet level, never HTTP.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Invariant violation. Always a bug.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// HTTP status the SBI layer surfaces for this error.
    pub fn status(&self) -> u16 {
        match self {
            Error::InvalidInput(_) => 400,
            Error::Unauthorized(_) => 403,
            Error::NotFound(_) | Error::Expired(_) => 404,
            Error::Conflict(_) => 409,
            Error::Unavailable(_) => 503,
            Error::Timeout(_) => 504,
            Error::PfcpFailure(_)
            | Error::PoolExhausted(_)
            | Error::Protocol(_)
            | Error::Internal(_) => 500,
        }
    }

    /// Short machine-readable title for problem+json bodies.
    pub fn title(&self) -> &'static str {
        match self {
            Error::InvalidInput(_) => "Invalid input",
            Error::NotFound(_) => "Not found",
            Error::Conflict(_) => "Conflict",
            Error::Unauthorized(_) => "Unauthorized",
            Error::Expired(_) => "Expired",
            Error::Timeout(_) => "Timeout",
            Error::Unavailable(_) => "Unavailable",
            Error::PfcpFailure(_) => "PFCP failure",
            Error::PoolExhausted(_) => "Pool exhausted",
            Error::Protocol(_) => "Protocol error",
            Error::Internal(_) => "Internal error",
        }
    }

    pub fn invalid_length(what: &str, expected: usize, actual: usize) -> Self {
        Error::InvalidInput(format!(
            "invalid {what} length: expected {expected} bytes, got {actual}"
        ))
    }
}
