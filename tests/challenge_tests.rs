//! End-to-end challenge handshakes against an in-process signing server.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use ring::rand::SystemRandom;
use ring::signature::{RsaKeyPair, RSA_PKCS1_SHA256};
use serde_json::json;

use licensegate::client::transport::{HttpResponse, Transport};
use licensegate::errors::VerifyResult;
use licensegate::{LicenseGate, Outcome};

const TRUSTED_PRIVATE: &str = include_str!("fixtures/trusted_private.pem");
const TRUSTED_PUBLIC: &str = include_str!("fixtures/trusted_public.pem");
const TRUSTED_PUBLIC_PKCS1: &str = include_str!("fixtures/trusted_public_pkcs1.pem");
const OTHER_PUBLIC: &str = include_str!("fixtures/other_public.pem");

fn load_key_pair(pem: &str) -> RsaKeyPair {
    let body: String = pem
        .lines()
        .filter(|line| !line.starts_with("-----"))
        .collect();
    let der = B64.decode(body).expect("fixture is base64");
    RsaKeyPair::from_pkcs8(&der).expect("fixture is a PKCS#8 RSA key")
}

fn sign(key: &RsaKeyPair, message: &str) -> String {
    let mut signature = vec![0u8; key.public().modulus_len()];
    key.sign(
        &RSA_PKCS1_SHA256,
        &SystemRandom::new(),
        message.as_bytes(),
        &mut signature,
    )
    .expect("signing succeeds");
    B64.encode(signature)
}

fn query_param<'a>(url: &'a str, name: &str) -> Option<&'a str> {
    let query = url.split_once('?')?.1;
    query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        (key == name).then_some(value)
    })
}

/// Simulated validation server that signs whatever challenge it receives.
struct SigningServer {
    key: RsaKeyPair,
    result: &'static str,
    valid: Option<bool>,
    /// Sign this instead of the received challenge.
    sign_override: Option<&'static str>,
    challenges: Mutex<Vec<String>>,
}

impl SigningServer {
    fn new(result: &'static str) -> Self {
        Self {
            key: load_key_pair(TRUSTED_PRIVATE),
            result,
            valid: Some(true),
            sign_override: None,
            challenges: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Transport for SigningServer {
    async fn get(&self, url: &str, _headers: &[(&str, &str)]) -> VerifyResult<HttpResponse> {
        let mut body = json!({ "result": self.result });
        if let Some(valid) = self.valid {
            body["valid"] = json!(valid);
        }

        if let Some(challenge) = query_param(url, "challenge") {
            self.challenges.lock().unwrap().push(challenge.to_string());
            let message = self.sign_override.unwrap_or(challenge);
            body["signedChallenge"] = json!(sign(&self.key, message));
        }

        Ok(HttpResponse {
            status: 200,
            body: body.to_string(),
        })
    }
}

fn gate(server: Arc<SigningServer>, public_key: &str) -> LicenseGate {
    LicenseGate::new("acct-1")
        .with_public_key(public_key)
        .with_transport(server)
}

#[tokio::test]
async fn signed_challenge_verifies() {
    let server = Arc::new(SigningServer::new("VALID"));
    let gate = gate(server.clone(), TRUSTED_PUBLIC);

    assert_eq!(gate.verify("KEY-1", None, None).await, Outcome::Valid);
    assert!(gate.verify_simple("KEY-1", None, None).await);
    assert_eq!(server.challenges.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn signed_challenge_verifies_with_pkcs1_key() {
    let server = Arc::new(SigningServer::new("VALID"));
    let gate = gate(server, TRUSTED_PUBLIC_PKCS1);

    assert_eq!(gate.verify("KEY-1", None, None).await, Outcome::Valid);
}

#[tokio::test]
async fn signed_challenge_verifies_with_bare_key() {
    let bare: String = TRUSTED_PUBLIC
        .lines()
        .filter(|line| !line.starts_with("-----"))
        .collect();
    let server = Arc::new(SigningServer::new("VALID"));

    assert_eq!(
        gate(server, &bare).verify("KEY-1", None, None).await,
        Outcome::Valid
    );
}

#[tokio::test]
async fn accepted_result_is_returned_as_is() {
    let server = Arc::new(SigningServer::new("RATE_LIMIT_EXCEEDED"));
    let gate = gate(server, TRUSTED_PUBLIC);

    assert_eq!(
        gate.verify("KEY-1", None, None).await,
        Outcome::RateLimitExceeded
    );
}

#[tokio::test]
async fn signature_from_untrusted_key_fails() {
    let server = Arc::new(SigningServer::new("VALID"));
    let gate = gate(server, OTHER_PUBLIC);

    assert_eq!(gate.verify("KEY-1", None, None).await, Outcome::FailedChallenge);
}

#[tokio::test]
async fn signature_over_wrong_nonce_fails() {
    let server = Arc::new(SigningServer {
        sign_override: Some("1"),
        ..SigningServer::new("VALID")
    });
    let gate = gate(server, TRUSTED_PUBLIC);

    assert_eq!(gate.verify("KEY-1", None, None).await, Outcome::FailedChallenge);
}

#[tokio::test]
async fn rejection_does_not_need_signature() {
    let server = Arc::new(SigningServer {
        valid: Some(false),
        sign_override: Some("not the nonce"),
        ..SigningServer::new("LICENSE_SCOPE_FAILED")
    });
    let gate = gate(server, TRUSTED_PUBLIC);

    assert_eq!(
        gate.verify("KEY-1", Some("enterprise"), None).await,
        Outcome::LicenseScopeFailed
    );
}

#[tokio::test]
async fn each_call_sends_a_new_challenge() {
    let server = Arc::new(SigningServer::new("VALID"));
    let gate = gate(server.clone(), TRUSTED_PUBLIC);

    for _ in 0..5 {
        assert_eq!(gate.verify("KEY-1", None, None).await, Outcome::Valid);
    }

    let challenges = server.challenges.lock().unwrap();
    let mut unique = challenges.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), 5);
}

#[tokio::test]
async fn concurrent_calls_share_one_gate() {
    let server = Arc::new(SigningServer::new("VALID"));
    let gate = Arc::new(gate(server.clone(), TRUSTED_PUBLIC));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let gate = gate.clone();
            tokio::spawn(async move { gate.verify(&format!("KEY-{i}"), None, None).await })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap(), Outcome::Valid);
    }
    assert_eq!(server.challenges.lock().unwrap().len(), 8);
}
