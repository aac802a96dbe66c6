//! HTTP transport used to reach the validation server.
//!
//! The verifier only needs "send a GET, get back a status and a body", so
//! that is all the [`Transport`] trait asks for. [`ReqwestTransport`] is the
//! default implementation; tests and embedders can plug in their own.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::errors::{VerifyError, VerifyResult};

/// Default request timeout for [`ReqwestTransport`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Raw HTTP reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue a GET request and return the status and body.
    ///
    /// Network-level failures are returned as errors; non-2xx statuses are
    /// not errors at this layer.
    async fn get(&self, url: &str, headers: &[(&str, &str)]) -> VerifyResult<HttpResponse>;
}

/// `reqwest`-backed transport.
///
/// A fresh client is built per request, so nothing is pooled between
/// verification calls.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    timeout: Duration,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &str, headers: &[(&str, &str)]) -> VerifyResult<HttpResponse> {
        let client = Client::builder().timeout(self.timeout).build()?;

        let mut request = client.get(url);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let resp = request.send().await?; // → VerifyError::Network
        let status = resp.status().as_u16();
        let body = resp.text().await?;

        Ok(HttpResponse { status, body })
    }
}

/// Wrap an arbitrary error from a custom transport.
pub fn transport_error(err: impl std::fmt::Display) -> VerifyError {
    VerifyError::Transport(err.to_string())
}
