//! Validation request URL construction.

/// Build the verification URL:
///
/// `{base}/license/{account_id}/{license_key}/verify[?metadata=..][&scope=..][&challenge=..]`
///
/// Query parameters always appear in the order metadata, scope, challenge.
/// Absent or empty values are left out. Every component is percent-encoded.
pub fn build_url(
    base: &str,
    account_id: &str,
    license_key: &str,
    scope: Option<&str>,
    metadata: Option<&str>,
    challenge: Option<&str>,
) -> String {
    let mut url = format!(
        "{}/license/{}/{}/verify",
        base.trim_end_matches('/'),
        urlencoding::encode(account_id),
        urlencoding::encode(license_key),
    );

    let params = [
        ("metadata", metadata),
        ("scope", scope),
        ("challenge", challenge),
    ];

    let mut separator = '?';
    for (name, value) in params {
        let Some(value) = value.filter(|v| !v.is_empty()) else {
            continue;
        };
        url.push(separator);
        url.push_str(name);
        url.push('=');
        url.push_str(&urlencoding::encode(value));
        separator = '&';
    }

    url
}

/// One verification attempt's inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationRequest<'a> {
    pub license_key: &'a str,
    pub scope: Option<&'a str>,
    pub metadata: Option<&'a str>,
    /// Present iff challenge mode is on.
    pub challenge: Option<String>,
}

impl VerificationRequest<'_> {
    pub fn url(&self, base: &str, account_id: &str) -> String {
        build_url(
            base,
            account_id,
            self.license_key,
            self.scope,
            self.metadata,
            self.challenge.as_deref(),
        )
    }
}
