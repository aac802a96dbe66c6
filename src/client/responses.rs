//! Response shape returned by the validation server.
//!
//! The server gives no guarantees about which fields are present or what
//! types they carry, so deserialization here never fails on a field: a value
//! of the wrong type is dropped and the field reads as absent.

use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of a `/license/{account}/{key}/verify` reply.
///
/// ```json
/// {
///   "valid": true,
///   "result": "VALID",
///   "signedChallenge": "kZx0...=="
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerResponse {
    /// Server-side error message. Any truthy non-string value is kept as its
    /// JSON text.
    #[serde(default, deserialize_with = "error_message")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Outcome wire name, e.g. `"EXPIRED"`.
    #[serde(default, deserialize_with = "non_empty_string")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,

    /// An explicit `null` reads as `false`; only a missing field is absent.
    #[serde(default, deserialize_with = "validity")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid: Option<bool>,

    /// Base64 RSA signature of the challenge nonce.
    #[serde(default, deserialize_with = "non_empty_string")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signed_challenge: Option<String>,
}

impl ServerResponse {
    /// Parse a raw response body.
    pub fn from_body(body: &str) -> serde_json::Result<Self> {
        serde_json::from_str(body)
    }
}

/// Keep the value only if it has the expected type.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

fn non_empty_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = lenient(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}

fn validity<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => Some(false),
        Some(Value::Bool(valid)) => Some(valid),
        Some(_) => None,
    })
}

fn error_message<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => None,
        Some(Value::String(s)) if s.is_empty() => None,
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => None,
        Some(other) => Some(other.to_string()),
    })
}
