//! Maps a server reply onto exactly one [`Outcome`].
//!
//! Rules are evaluated in order and the first match wins:
//!
//! 1. `error` present, or no `result` → `SERVER_ERROR`
//! 2. `valid == false` → the named outcome (`VALID` here is a contradiction
//!    and becomes `SERVER_ERROR`)
//! 3. challenge mode: missing or unverifiable signature → `FAILED_CHALLENGE`
//! 4. otherwise the named outcome, as-is
//!
//! A `result` that names no known outcome is `SERVER_ERROR` wherever it is
//! read.

use std::fmt;

use crate::client::responses::ServerResponse;
use crate::client::signature::{check_signature, SignatureError};
use crate::outcome::Outcome;

/// Challenge state for one verification attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeContext<'a> {
    Disabled,
    Enabled {
        /// Nonce sent with this request.
        nonce: &'a str,
        /// Key the signature must verify under. `None` always fails.
        public_key: Option<&'a str>,
    },
}

/// Which rule produced the outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    /// Server set `error`.
    ServerReported(String),
    /// No usable `result` field.
    MissingResult,
    /// `result` names no known outcome.
    UnknownResult(String),
    /// Server said `valid: false` but named `VALID`.
    ContradictoryRejection,
    /// Server said `valid: false` and named the reason.
    Rejected,
    /// Challenge mode is on but the server returned no signature.
    MissingSignature,
    /// Signature did not verify against the nonce.
    BadSignature(SignatureError),
    /// Every check passed; `result` returned as-is.
    Accepted,
}

impl Rule {
    /// True when the server reply was taken at face value.
    pub fn is_accepting(&self) -> bool {
        matches!(self, Rule::Accepted | Rule::Rejected)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::ServerReported(msg) => write!(f, "server reported error: {msg}"),
            Rule::MissingResult => f.write_str("response has no result"),
            Rule::UnknownResult(code) => write!(f, "unknown result code '{code}'"),
            Rule::ContradictoryRejection => f.write_str("invalid response names VALID"),
            Rule::Rejected => f.write_str("server rejected license"),
            Rule::MissingSignature => f.write_str("no challenge result"),
            Rule::BadSignature(reason) => write!(f, "challenge verification failed: {reason}"),
            Rule::Accepted => f.write_str("accepted"),
        }
    }
}

/// Result of classifying one response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub outcome: Outcome,
    pub rule: Rule,
}

impl Classification {
    fn new(outcome: Outcome, rule: Rule) -> Self {
        Self { outcome, rule }
    }
}

/// Classify a server response. Pure; the same inputs give the same result.
pub fn classify(response: &ServerResponse, challenge: &ChallengeContext<'_>) -> Classification {
    if let Some(error) = &response.error {
        return Classification::new(Outcome::ServerError, Rule::ServerReported(error.clone()));
    }

    let Some(result) = response.result.as_deref() else {
        return Classification::new(Outcome::ServerError, Rule::MissingResult);
    };

    if response.valid == Some(false) {
        return match result.parse::<Outcome>() {
            Ok(Outcome::Valid) => {
                Classification::new(Outcome::ServerError, Rule::ContradictoryRejection)
            }
            Ok(outcome) => Classification::new(outcome, Rule::Rejected),
            Err(_) => unknown_result(result),
        };
    }

    if let ChallengeContext::Enabled { nonce, public_key } = *challenge {
        let Some(signature) = response.signed_challenge.as_deref() else {
            return Classification::new(Outcome::FailedChallenge, Rule::MissingSignature);
        };

        let checked = public_key
            .ok_or(SignatureError::MissingKey)
            .and_then(|key| check_signature(nonce, signature, key));

        if let Err(reason) = checked {
            return Classification::new(Outcome::FailedChallenge, Rule::BadSignature(reason));
        }
    }

    match result.parse::<Outcome>() {
        Ok(outcome) => Classification::new(outcome, Rule::Accepted),
        Err(_) => unknown_result(result),
    }
}

fn unknown_result(code: &str) -> Classification {
    Classification::new(Outcome::ServerError, Rule::UnknownResult(code.to_string()))
}
