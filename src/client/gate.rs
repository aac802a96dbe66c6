//! License verification client.
//!
//! [`LicenseGate`] ties the pieces together: it builds the request URL,
//! attaches a fresh challenge when challenge mode is on, performs a single
//! GET through its [`Transport`], and classifies the reply.
//!
//! ```rust,no_run
//! use licensegate::client::gate::LicenseGate;
//! use licensegate::outcome::Outcome;
//!
//! # async fn run() -> std::io::Result<()> {
//! let gate = LicenseGate::new("my-account")
//!     .with_public_key(std::fs::read_to_string("licensegate_public.pem")?);
//!
//! match gate.verify("ABCD-EFGH", Some("pro"), None).await {
//!     Outcome::Valid => println!("licensed"),
//!     other => println!("not licensed: {other}"),
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use tracing::{info_span, Instrument};

use crate::client::challenge::generate_challenge;
use crate::client::classifier::{classify, ChallengeContext};
use crate::client::diagnostics::{DebugEvent, DebugSink, NoopSink, TracingSink};
use crate::client::responses::ServerResponse;
use crate::client::transport::{ReqwestTransport, Transport, DEFAULT_TIMEOUT};
use crate::client::url::VerificationRequest;
use crate::config::{ClientConfig, DEFAULT_SERVER_URL};
use crate::errors::{VerifyError, VerifyResult};
use crate::outcome::Outcome;

/// User agent sent with every verification request.
pub const USER_AGENT: &str = "Mozilla/5.0";

/// Verification client for one account.
///
/// Configure with the builder methods, then share freely: `verify` takes
/// `&self` and calls are independent of each other.
#[derive(Clone)]
pub struct LicenseGate {
    account_id: String,
    public_key: Option<String>,
    server_url: String,
    use_challenges: bool,
    debug: bool,
    timeout: Duration,
    /// Custom transport; `None` means a `ReqwestTransport` built per call.
    transport: Option<Arc<dyn Transport>>,
    sink: Arc<dyn DebugSink>,
}

impl std::fmt::Debug for LicenseGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LicenseGate")
            .field("account_id", &self.account_id)
            .field("has_public_key", &self.public_key.is_some())
            .field("server_url", &self.server_url)
            .field("use_challenges", &self.use_challenges)
            .field("debug", &self.debug)
            .field("timeout", &self.timeout)
            .field("custom_transport", &self.transport.is_some())
            .finish()
    }
}

impl LicenseGate {
    pub fn new(account_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            public_key: None,
            server_url: DEFAULT_SERVER_URL.to_string(),
            use_challenges: false,
            debug: false,
            timeout: DEFAULT_TIMEOUT,
            transport: None,
            sink: Arc::new(NoopSink),
        }
    }

    /// Set the public key used to check signed challenges. Enables challenge mode.
    pub fn with_public_key(mut self, public_key_pem: impl Into<String>) -> Self {
        self.public_key = Some(public_key_pem.into());
        self.use_challenges = true;
        self
    }

    /// Point at a different validation server.
    pub fn with_validation_server(mut self, server_url: impl Into<String>) -> Self {
        self.server_url = server_url.into();
        self
    }

    /// Require signed challenges.
    pub fn use_challenges(mut self) -> Self {
        self.use_challenges = true;
        self
    }

    /// Emit request/response diagnostics through `tracing`.
    pub fn debug(mut self) -> Self {
        self.debug = true;
        self.sink = Arc::new(TracingSink);
        self
    }

    /// Emit diagnostics to a custom sink. Enables debug mode.
    pub fn with_debug_sink(mut self, sink: Arc<dyn DebugSink>) -> Self {
        self.debug = true;
        self.sink = sink;
        self
    }

    /// Replace the HTTP transport. The timeout setting does not apply to it.
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Request timeout for the default transport.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build a client from loaded configuration.
    ///
    /// Fails only if a configured key file cannot be read.
    pub fn from_config(config: &ClientConfig) -> VerifyResult<Self> {
        let mut gate = LicenseGate::new(config.account_id.clone())
            .with_validation_server(config.server_url.clone())
            .with_timeout(Duration::from_secs(config.timeout_secs));

        if let Some(key) = config.resolve_public_key()? {
            gate = gate.with_public_key(key);
        }
        if config.use_challenges {
            gate = gate.use_challenges();
        }
        if config.debug {
            gate = gate.debug();
        }

        Ok(gate)
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub fn public_key(&self) -> Option<&str> {
        self.public_key.as_deref()
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    pub fn challenges_enabled(&self) -> bool {
        self.use_challenges
    }

    pub fn debug_enabled(&self) -> bool {
        self.debug
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Verify a license key against the validation server.
    ///
    /// Performs exactly one request. Every failure mode is folded into the
    /// returned [`Outcome`]; this never errors or panics on bad input.
    pub async fn verify(
        &self,
        license_key: &str,
        scope: Option<&str>,
        metadata: Option<&str>,
    ) -> Outcome {
        let span = info_span!(
            "licensegate_verify",
            account_id = %self.account_id,
            challenge = self.use_challenges,
        );

        async move {
            let request = VerificationRequest {
                license_key,
                scope,
                metadata,
                challenge: self.use_challenges.then(generate_challenge),
            };

            let response = match self.request_server(&request).await {
                Ok(response) => response,
                Err(error) => {
                    self.sink.emit(&DebugEvent::TransportFailure { error: &error });
                    return Outcome::ConnectionError;
                }
            };

            let context = match request.challenge.as_deref() {
                Some(nonce) => ChallengeContext::Enabled {
                    nonce,
                    public_key: self.public_key.as_deref(),
                },
                None => ChallengeContext::Disabled,
            };

            let classification = classify(&response, &context);
            self.sink.emit(&DebugEvent::Classified {
                outcome: classification.outcome,
                rule: &classification.rule,
            });

            classification.outcome
        }
        .instrument(span)
        .await
    }

    /// `true` iff [`verify`](Self::verify) returns [`Outcome::Valid`].
    pub async fn verify_simple(
        &self,
        license_key: &str,
        scope: Option<&str>,
        metadata: Option<&str>,
    ) -> bool {
        self.verify(license_key, scope, metadata).await.is_valid()
    }

    async fn request_server(&self, request: &VerificationRequest<'_>) -> VerifyResult<ServerResponse> {
        let url = request.url(&self.server_url, &self.account_id);
        self.sink.emit(&DebugEvent::Request { url: &url });

        let headers = [("User-Agent", USER_AGENT)];
        let resp = match &self.transport {
            Some(transport) => transport.get(&url, &headers).await?,
            None => ReqwestTransport::new(self.timeout).get(&url, &headers).await?,
        };

        self.sink.emit(&DebugEvent::Response {
            status: resp.status,
            body: &resp.body,
        });

        if !resp.is_success() {
            return Err(VerifyError::HttpStatus(resp.status));
        }

        Ok(ServerResponse::from_body(&resp.body)?) // → VerifyError::MalformedBody
    }
}
