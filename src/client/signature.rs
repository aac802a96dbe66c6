//! RSA signature verification for signed challenges.
//!
//! The validation server signs the challenge nonce with its private key using
//! RSASSA-PKCS1-v1_5 over SHA-256. We verify that signature against the public
//! key the application was configured with.
//!
//! Public keys are accepted as:
//! - SubjectPublicKeyInfo (`-----BEGIN PUBLIC KEY-----`), armored or bare base64
//! - PKCS#1 RSAPublicKey (`-----BEGIN RSA PUBLIC KEY-----`), armored or bare base64
//!
//! Armor lines, newlines and other whitespace are ignored.

use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use ring::signature::{UnparsedPublicKey, RSA_PKCS1_2048_8192_SHA256};
use spki::der::Decode;
use spki::{ObjectIdentifier, SubjectPublicKeyInfoRef};

/// `rsaEncryption` from PKCS#1.
const RSA_ENCRYPTION: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");

/// Why a signature check failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("no public key configured")]
    MissingKey,

    #[error("public key is malformed: {0}")]
    MalformedKey(String),

    #[error("public key algorithm {0} is not RSA")]
    UnsupportedAlgorithm(String),

    #[error("signature is not valid base64: {0}")]
    MalformedSignature(String),

    #[error("signature does not match")]
    Mismatch,
}

/// Check `signature_b64` against `message` under `public_key_pem`.
///
/// Returns `false` for any malformed input rather than failing.
pub fn verify_signature(message: &str, signature_b64: &str, public_key_pem: &str) -> bool {
    check_signature(message, signature_b64, public_key_pem).is_ok()
}

/// Fallible form of [`verify_signature`] that reports why a check failed.
pub fn check_signature(
    message: &str,
    signature_b64: &str,
    public_key_pem: &str,
) -> Result<(), SignatureError> {
    let key_der = decode_public_key(public_key_pem)?;
    let rsa_key = rsa_public_key(&key_der)?;

    let signature = B64
        .decode(strip_whitespace(signature_b64))
        .map_err(|e| SignatureError::MalformedSignature(e.to_string()))?;

    UnparsedPublicKey::new(&RSA_PKCS1_2048_8192_SHA256, &rsa_key)
        .verify(message.as_bytes(), &signature)
        .map_err(|_| SignatureError::Mismatch)
}

/// Strip PEM armor and whitespace from a key and decode the base64 body.
pub fn decode_public_key(public_key_pem: &str) -> Result<Vec<u8>, SignatureError> {
    // Keys pasted into env vars often carry literal "\n" sequences.
    let unescaped = public_key_pem.replace("\\n", "\n");

    let body: String = unescaped
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with("-----"))
        .collect::<Vec<_>>()
        .concat();
    let body = strip_whitespace(&body);

    if body.is_empty() {
        return Err(SignatureError::MissingKey);
    }

    B64.decode(body)
        .map_err(|e| SignatureError::MalformedKey(format!("base64 decode failed: {e}")))
}

/// Extract the PKCS#1 RSAPublicKey bytes that `ring` expects.
///
/// SPKI input is unwrapped; anything that does not parse as SPKI is handed
/// to `ring` as PKCS#1 unchanged.
fn rsa_public_key(der: &[u8]) -> Result<Vec<u8>, SignatureError> {
    let info = match SubjectPublicKeyInfoRef::from_der(der) {
        Ok(info) => info,
        Err(_) => return Ok(der.to_vec()),
    };

    if info.algorithm.oid != RSA_ENCRYPTION {
        return Err(SignatureError::UnsupportedAlgorithm(
            info.algorithm.oid.to_string(),
        ));
    }

    info.subject_public_key
        .as_bytes()
        .map(<[u8]>::to_vec)
        .ok_or_else(|| {
            SignatureError::MalformedKey("public key bit string has unused bits".to_string())
        })
}

fn strip_whitespace(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRUSTED_PUBLIC: &str = include_str!("../../tests/fixtures/trusted_public.pem");
    const TRUSTED_PUBLIC_PKCS1: &str = include_str!("../../tests/fixtures/trusted_public_pkcs1.pem");
    const OTHER_PUBLIC: &str = include_str!("../../tests/fixtures/other_public.pem");
    const TRUSTED_SIG: &str = include_str!("../../tests/fixtures/trusted_sig_1700000000000.b64");
    const TRUSTED_SIG_NEXT: &str =
        include_str!("../../tests/fixtures/trusted_sig_1700000000001.b64");
    const OTHER_SIG: &str = include_str!("../../tests/fixtures/other_sig_1700000000000.b64");

    const NONCE: &str = "1700000000000";

    fn bare(pem: &str) -> String {
        pem.lines()
            .filter(|line| !line.starts_with("-----"))
            .collect::<String>()
    }

    #[test]
    fn accepts_signature_with_armored_spki_key() {
        assert!(verify_signature(NONCE, TRUSTED_SIG, TRUSTED_PUBLIC));
    }

    #[test]
    fn accepts_signature_with_bare_spki_key() {
        assert!(verify_signature(NONCE, TRUSTED_SIG, &bare(TRUSTED_PUBLIC)));
    }

    #[test]
    fn accepts_signature_with_pkcs1_key() {
        assert!(verify_signature(NONCE, TRUSTED_SIG, TRUSTED_PUBLIC_PKCS1));
        assert!(verify_signature(
            NONCE,
            TRUSTED_SIG,
            &bare(TRUSTED_PUBLIC_PKCS1)
        ));
    }

    #[test]
    fn accepts_key_with_escaped_newlines() {
        let escaped = TRUSTED_PUBLIC.trim().replace('\n', "\\n");
        assert!(verify_signature(NONCE, TRUSTED_SIG, &escaped));
    }

    #[test]
    fn rejects_signature_over_different_nonce() {
        assert_eq!(
            check_signature(NONCE, TRUSTED_SIG_NEXT, TRUSTED_PUBLIC),
            Err(SignatureError::Mismatch)
        );
        assert!(verify_signature("1700000000001", TRUSTED_SIG_NEXT, TRUSTED_PUBLIC));
    }

    #[test]
    fn rejects_signature_from_other_key() {
        assert!(!verify_signature(NONCE, OTHER_SIG, TRUSTED_PUBLIC));
        assert!(verify_signature(NONCE, OTHER_SIG, OTHER_PUBLIC));
    }

    #[test]
    fn malformed_signature_is_rejected() {
        assert!(matches!(
            check_signature(NONCE, "not base64!!", TRUSTED_PUBLIC),
            Err(SignatureError::MalformedSignature(_))
        ));
        assert_eq!(
            check_signature(NONCE, "AAAA", TRUSTED_PUBLIC),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn malformed_key_is_rejected() {
        assert!(matches!(
            check_signature(NONCE, TRUSTED_SIG, "%%% not a key %%%"),
            Err(SignatureError::MalformedKey(_))
        ));
        assert!(!verify_signature(NONCE, TRUSTED_SIG, "AAAA"));
        assert_eq!(
            check_signature(NONCE, TRUSTED_SIG, "-----BEGIN PUBLIC KEY-----\n-----END PUBLIC KEY-----"),
            Err(SignatureError::MissingKey)
        );
    }

    #[test]
    fn non_rsa_spki_is_unsupported() {
        // Ed25519 SubjectPublicKeyInfo.
        let ed25519 = "MCowBQYDK2VwAyEAGb9ECWmEzf6FQbrBZ9w7lshQhqowtrbLDFw4rXAxZuE=";
        assert!(matches!(
            check_signature(NONCE, TRUSTED_SIG, ed25519),
            Err(SignatureError::UnsupportedAlgorithm(_))
        ));
    }
}
