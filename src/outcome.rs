//! Verification outcomes.
//!
//! Every call to `LicenseGate::verify` ends in exactly one of these values.
//! The validation server names them in the `result` field of its reply using
//! the SCREAMING_SNAKE_CASE wire names below.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of verification results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    /// License exists, is active and in scope
    Valid,
    /// No license with this key exists for the account
    NotFound,
    /// License exists but has not been activated
    NotActive,
    /// License has expired
    Expired,
    /// License does not cover the requested scope
    LicenseScopeFailed,
    /// Too many distinct IPs have used this license
    IpLimitExceeded,
    /// Server throttled the request
    RateLimitExceeded,
    /// Signed challenge was missing or did not verify
    FailedChallenge,
    /// Server reported an error or replied with something unusable
    ServerError,
    /// The round trip itself failed
    ConnectionError,
}

impl Outcome {
    /// Every outcome, in wire-table order.
    pub const ALL: [Outcome; 10] = [
        Outcome::Valid,
        Outcome::NotFound,
        Outcome::NotActive,
        Outcome::Expired,
        Outcome::LicenseScopeFailed,
        Outcome::IpLimitExceeded,
        Outcome::RateLimitExceeded,
        Outcome::FailedChallenge,
        Outcome::ServerError,
        Outcome::ConnectionError,
    ];

    /// Wire name used by the validation server.
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Valid => "VALID",
            Outcome::NotFound => "NOT_FOUND",
            Outcome::NotActive => "NOT_ACTIVE",
            Outcome::Expired => "EXPIRED",
            Outcome::LicenseScopeFailed => "LICENSE_SCOPE_FAILED",
            Outcome::IpLimitExceeded => "IP_LIMIT_EXCEEDED",
            Outcome::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            Outcome::FailedChallenge => "FAILED_CHALLENGE",
            Outcome::ServerError => "SERVER_ERROR",
            Outcome::ConnectionError => "CONNECTION_ERROR",
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Outcome::Valid)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `result` string that names no known outcome.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown outcome code '{0}'")]
pub struct UnknownOutcome(pub String);

impl FromStr for Outcome {
    type Err = UnknownOutcome;

    /// Case-sensitive lookup by wire name. No fallback guessing.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "VALID" => Ok(Outcome::Valid),
            "NOT_FOUND" => Ok(Outcome::NotFound),
            "NOT_ACTIVE" => Ok(Outcome::NotActive),
            "EXPIRED" => Ok(Outcome::Expired),
            "LICENSE_SCOPE_FAILED" => Ok(Outcome::LicenseScopeFailed),
            "IP_LIMIT_EXCEEDED" => Ok(Outcome::IpLimitExceeded),
            "RATE_LIMIT_EXCEEDED" => Ok(Outcome::RateLimitExceeded),
            "FAILED_CHALLENGE" => Ok(Outcome::FailedChallenge),
            "SERVER_ERROR" => Ok(Outcome::ServerError),
            "CONNECTION_ERROR" => Ok(Outcome::ConnectionError),
            other => Err(UnknownOutcome(other.to_string())),
        }
    }
}
