//! Debug side channel for verification.
//!
//! The verifier reports what it sends and receives through a [`DebugSink`].
//! Sinks only observe; they cannot change the outcome.

use tracing::{debug, info, warn};

use crate::client::classifier::Rule;
use crate::errors::VerifyError;
use crate::outcome::Outcome;

/// Something worth reporting during a verification call.
#[derive(Debug)]
pub enum DebugEvent<'a> {
    /// About to send the request.
    Request { url: &'a str },
    /// Server replied.
    Response { status: u16, body: &'a str },
    /// The round trip failed; the call resolves to `CONNECTION_ERROR`.
    TransportFailure { error: &'a VerifyError },
    /// Final classification.
    Classified { outcome: Outcome, rule: &'a Rule },
}

pub trait DebugSink: Send + Sync {
    fn emit(&self, event: &DebugEvent<'_>);
}

/// Discards everything. Used when debug mode is off.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl DebugSink for NoopSink {
    fn emit(&self, _event: &DebugEvent<'_>) {}
}

/// Forwards events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DebugSink for TracingSink {
    fn emit(&self, event: &DebugEvent<'_>) {
        match event {
            DebugEvent::Request { url } => {
                debug!(url = %url, "Sending license verification request");
            }
            DebugEvent::Response { status, body } => {
                debug!(status = %status, body = %body, "Received verification response");
            }
            DebugEvent::TransportFailure { error } => {
                warn!(error = %error, "Verification request failed");
            }
            DebugEvent::Classified { outcome, rule } => {
                if rule.is_accepting() {
                    info!(outcome = %outcome, "License verification finished");
                } else {
                    warn!(outcome = %outcome, reason = %rule, "License verification failed");
                }
            }
        }
    }
}
