//! Reference signing fixtures.
//!
//! Deliberately independent re-implementations of the two signing schemes,
//! built straight on the digest crates. Tests compare production output
//! against these so a bug cannot hide on both sides of a round-trip.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::Sha256;

/// Computes the relay credential for `username` the way a TURN server
/// holding `secret` would: base64 of HMAC-SHA1.
pub fn reference_turn_credential(secret: &str, username: &str) -> String {
    let mut mac =
        Hmac::<Sha1>::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(username.as_bytes());
    BASE64.encode(mac.finalize().into_bytes())
}

/// Builds a provider-style `t=<unix>,v1=<hex>` signature header for a
/// webhook body.
pub fn sign_stripe_payload(secret: &str, timestamp: i64, body: &[u8]) -> String {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(body);
    format!("t={timestamp},v1={}", hex::encode(mac.finalize().into_bytes()))
}
