//! Ephemeral relay credential issuance and verification.
//!
//! Implements the TURN REST API credential mechanism: the username encodes
//! a unix expiry (optionally scoped to a client), and the credential is the
//! base64 HMAC-SHA1 of that username keyed by the shared secret. Any party
//! holding the secret can verify a credential offline, so the relay never
//! needs a round-trip to this service.

use std::time::Duration;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha1::Sha1;

use crate::{
    error::{CoreError, Result, VerifyError},
    secret::SharedSecret,
};

type HmacSha1 = Hmac<Sha1>;

/// Longest accepted client identifier.
const MAX_CLIENT_ID_LEN: usize = 64;

/// URI schemes a relay URL may use.
const RELAY_SCHEMES: [&str; 4] = ["turn:", "turns:", "stun:", "stuns:"];

/// Immutable relay configuration, validated once at startup.
///
/// Construction is the single place where the "secret must be present"
/// rule is enforced; issuance assumes a well-formed config and therefore
/// cannot return a partially-populated credential.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    shared_secret: SharedSecret,
    urls: Vec<String>,
    credential_ttl: Duration,
}

impl RelayConfig {
    /// Builds a validated relay configuration.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Configuration` when the secret is empty, no
    /// relay URLs are given, a URL has an unknown scheme, or the TTL is
    /// zero.
    pub fn new(
        shared_secret: SharedSecret,
        urls: Vec<String>,
        credential_ttl: Duration,
    ) -> Result<Self> {
        if shared_secret.is_empty() {
            return Err(CoreError::Configuration("shared secret must not be empty".into()));
        }
        if urls.is_empty() {
            return Err(CoreError::Configuration("at least one relay URL is required".into()));
        }
        for url in &urls {
            if !RELAY_SCHEMES.iter().any(|scheme| url.starts_with(scheme)) {
                return Err(CoreError::Configuration(format!(
                    "relay URL {url:?} must use one of the turn:/turns:/stun:/stuns: schemes"
                )));
            }
        }
        if credential_ttl.is_zero() {
            return Err(CoreError::Configuration("credential TTL must be greater than zero".into()));
        }

        Ok(Self { shared_secret, urls, credential_ttl })
    }

    /// Relay URLs handed out with every credential.
    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    /// Credential lifetime.
    pub fn credential_ttl(&self) -> Duration {
        self.credential_ttl
    }

    /// Shared secret, for relay-side verification.
    pub fn shared_secret(&self) -> &SharedSecret {
        &self.shared_secret
    }
}

/// Time-bounded credential set returned to a client.
///
/// Constructed fresh per request, never persisted. Becomes useless for
/// authentication once the relay-side clock passes the expiry encoded in
/// `username`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssuedCredential {
    /// Relay URIs the client may connect to, in configured order.
    pub urls: Vec<String>,
    /// Expiry timestamp, optionally suffixed with `:<client_id>`.
    pub username: String,
    /// Base64 HMAC-SHA1 over `username`, keyed by the shared secret.
    pub credential: String,
    /// Credential lifetime in seconds, echoed for client convenience.
    pub ttl: u64,
}

/// Issues a credential valid until `now + config.credential_ttl`.
///
/// Deterministic for identical inputs: no randomness, no stored state, and
/// `config` is never mutated. When `client_id` is present it scopes the
/// username so the relay can attribute sessions.
///
/// # Errors
///
/// `CoreError::InvalidInput` for a malformed `client_id`;
/// `CoreError::Configuration` only if the HMAC key is rejected, which a
/// validated [`RelayConfig`] rules out.
pub fn issue(
    now: DateTime<Utc>,
    config: &RelayConfig,
    client_id: Option<&str>,
) -> Result<IssuedCredential> {
    if let Some(id) = client_id {
        validate_client_id(id)?;
    }

    let ttl_secs = config.credential_ttl.as_secs();
    let expiry = now.timestamp().saturating_add(i64::try_from(ttl_secs).unwrap_or(i64::MAX));

    let username = match client_id {
        Some(id) => format!("{expiry}:{id}"),
        None => expiry.to_string(),
    };
    let credential = sign_username(&username, config.shared_secret())?;

    Ok(IssuedCredential { urls: config.urls().to_vec(), username, credential, ttl: ttl_secs })
}

/// Verifies a presented credential the way a relay holding the secret
/// would: recompute the digest, compare constant-time, then check expiry.
///
/// The digest is checked before expiry so a forged-and-expired credential
/// reports `Mismatch`, never leaking whether the expiry was plausible.
///
/// # Errors
///
/// `VerifyError::MalformedUsername` when no expiry can be parsed,
/// `VerifyError::MalformedCredential` for invalid base64,
/// `VerifyError::Mismatch` for a wrong digest, and `VerifyError::Expired`
/// for an authentic credential past its expiry.
pub fn verify(
    username: &str,
    credential: &str,
    secret: &SharedSecret,
    now: DateTime<Utc>,
) -> std::result::Result<(), VerifyError> {
    let expiry_part = username.split(':').next().unwrap_or(username);
    let expiry: i64 = expiry_part
        .parse()
        .map_err(|_| VerifyError::MalformedUsername(username.to_string()))?;

    let presented = BASE64.decode(credential).map_err(|_| VerifyError::MalformedCredential)?;
    let expected = hmac_digest(username, secret).map_err(|_| VerifyError::Mismatch)?;

    if !constant_time_eq(&presented, &expected) {
        return Err(VerifyError::Mismatch);
    }
    if now.timestamp() > expiry {
        return Err(VerifyError::Expired { expiry });
    }

    Ok(())
}

/// Computes the base64 credential for a username.
fn sign_username(username: &str, secret: &SharedSecret) -> Result<String> {
    let digest = hmac_digest(username, secret)?;
    Ok(BASE64.encode(digest))
}

fn hmac_digest(username: &str, secret: &SharedSecret) -> Result<Vec<u8>> {
    let mut mac = HmacSha1::new_from_slice(secret.as_bytes())
        .map_err(|_| CoreError::Configuration("shared secret is not a usable HMAC key".into()))?;
    mac.update(username.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Accepts `[A-Za-z0-9._-]{1,64}`. The `:` separator is reserved for the
/// expiry prefix, so it can never appear in a client id.
fn validate_client_id(client_id: &str) -> Result<()> {
    if client_id.is_empty() {
        return Err(CoreError::InvalidInput("client_id must not be empty".into()));
    }
    if client_id.len() > MAX_CLIENT_ID_LEN {
        return Err(CoreError::InvalidInput(format!(
            "client_id exceeds {MAX_CLIENT_ID_LEN} characters"
        )));
    }
    if !client_id.bytes().all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-')) {
        return Err(CoreError::InvalidInput(
            "client_id may only contain ASCII letters, digits, '.', '_' and '-'".into(),
        ));
    }
    Ok(())
}

/// Constant-time digest comparison to avoid leaking match prefixes.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
