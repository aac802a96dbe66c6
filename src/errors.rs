//! Internal error types.
//!
//! None of these ever reach a caller of `LicenseGate::verify`: the verifier
//! folds them into an [`Outcome`](crate::outcome::Outcome) at its boundary.
//! They surface only from configuration loading and custom transports.

/// Faults raised while talking to the validation server or loading config.
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// Failure reported by a non-reqwest transport.
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("server responded with HTTP status {0}")]
    HttpStatus(u16),

    #[error("malformed response body: {0}")]
    MalformedBody(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

pub type VerifyResult<T> = Result<T, VerifyError>;
