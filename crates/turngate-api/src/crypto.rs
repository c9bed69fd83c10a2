//! Webhook signature verification.
//!
//! Implements the Stripe signing scheme: the `Stripe-Signature` header
//! carries `t=<unix>,v1=<hex>` where the hex value is HMAC-SHA256 over
//! `"<t>.<body>"`. Multiple `v1` entries may be present during secret
//! rotation; any match accepts. Timestamps outside the tolerance window
//! are rejected before any digest work to bound replay exposure.

use std::{fmt, time::Duration};

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use turngate_core::SharedSecret;

type HmacSha256 = Hmac<Sha256>;

/// Signature verification failures, surfaced to callers as HTTP 400.
///
/// Messages are stable and free of internal detail, so they are safe to
/// embed in error response bodies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureError {
    /// Signature header required but absent.
    MissingHeader,
    /// Header does not parse as `t=<unix>,v1=<hex>`.
    Malformed(String),
    /// Timestamp outside the tolerance window (stale or from the future).
    StaleTimestamp {
        /// Timestamp carried in the header.
        timestamp: i64,
    },
    /// No `v1` entry matches the recomputed digest.
    Mismatch,
}

impl fmt::Display for SignatureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingHeader => write!(f, "signature header missing"),
            Self::Malformed(reason) => write!(f, "malformed signature header: {reason}"),
            Self::StaleTimestamp { timestamp } => {
                write!(f, "signature timestamp {timestamp} outside tolerance window")
            },
            Self::Mismatch => write!(f, "signature mismatch"),
        }
    }
}

impl std::error::Error for SignatureError {}

/// Verifies webhook payloads against a configured signing secret.
///
/// When no secret is configured every payload is accepted; the handler
/// logs that mode loudly. Immutable after construction.
#[derive(Debug, Clone)]
pub struct WebhookVerifier {
    secret: Option<SharedSecret>,
    tolerance: Duration,
}

impl WebhookVerifier {
    /// Creates a verifier. `secret: None` disables verification.
    pub fn new(secret: Option<SharedSecret>, tolerance: Duration) -> Self {
        Self { secret, tolerance }
    }

    /// Whether incoming payloads must carry a valid signature.
    pub fn requires_signature(&self) -> bool {
        self.secret.is_some()
    }

    /// Checks `header` against `body` at time `now`.
    ///
    /// # Errors
    ///
    /// Returns a [`SignatureError`] when the header is missing, does not
    /// parse, carries a timestamp outside the tolerance window, or no
    /// digest matches. Always `Ok` when no secret is configured.
    pub fn verify(
        &self,
        body: &[u8],
        header: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<(), SignatureError> {
        let Some(secret) = &self.secret else { return Ok(()) };
        let header = header.ok_or(SignatureError::MissingHeader)?;

        let parsed = parse_signature_header(header)?;

        let tolerance = i64::try_from(self.tolerance.as_secs()).unwrap_or(i64::MAX);
        if (now.timestamp() - parsed.timestamp).abs() > tolerance {
            return Err(SignatureError::StaleTimestamp { timestamp: parsed.timestamp });
        }

        let expected = signed_payload_digest(secret, parsed.timestamp, body)?;
        for candidate in &parsed.signatures {
            if let Ok(bytes) = hex::decode(candidate) {
                if timing_safe_eq(&bytes, &expected) {
                    return Ok(());
                }
            }
        }

        Err(SignatureError::Mismatch)
    }
}

/// Parsed `t=<unix>,v1=<hex>` header.
struct ParsedSignature {
    timestamp: i64,
    signatures: Vec<String>,
}

fn parse_signature_header(header: &str) -> Result<ParsedSignature, SignatureError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for element in header.split(',') {
        let Some((key, value)) = element.trim().split_once('=') else {
            return Err(SignatureError::Malformed(format!("element {:?} is not key=value", element.trim())));
        };
        match key {
            "t" => {
                let parsed = value
                    .parse::<i64>()
                    .map_err(|_| SignatureError::Malformed("timestamp is not an integer".into()))?;
                timestamp = Some(parsed);
            },
            "v1" => signatures.push(value.to_string()),
            // Unknown schemes (e.g. v0) are ignored, per the provider contract.
            _ => {},
        }
    }

    let timestamp =
        timestamp.ok_or_else(|| SignatureError::Malformed("missing t= element".into()))?;
    if signatures.is_empty() {
        return Err(SignatureError::Malformed("missing v1= element".into()));
    }

    Ok(ParsedSignature { timestamp, signatures })
}

/// HMAC-SHA256 over `"<timestamp>.<body>"`.
fn signed_payload_digest(
    secret: &SharedSecret,
    timestamp: i64,
    body: &[u8],
) -> Result<Vec<u8>, SignatureError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| SignatureError::Malformed("signing secret rejected by HMAC".into()))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(body);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Constant-time comparison to prevent digest recovery through timing.
fn timing_safe_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
