//! Error types for the analysis controller
//!
//! Three kinds of failure reach the user:
//! - validation failures detected locally, before any request is made
//! - semantic failures, where the backend answered with an `error` payload
//! - transport failures, where no usable answer came back at all

/// Failure talking to the analysis service
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Connection refused, DNS failure, timeout
    #[error("request failed: {0}")]
    Unreachable(String),

    /// Non-2xx status without a parseable error body
    #[error("unexpected status {0}")]
    Status(u16),

    /// 2xx status whose body could not be understood
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        TransportError::Unreachable(err.to_string())
    }
}

/// Errors returned by controller operations
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    /// Precondition failed locally; nothing was sent
    #[error("{0}")]
    Validation(String),

    /// Backend reached, returned an error payload
    #[error("{0}")]
    Semantic(String),

    /// Backend unreachable or reply unusable
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The same flow already has a request in flight
    #[error("{0} already in progress")]
    Busy(&'static str),
}
