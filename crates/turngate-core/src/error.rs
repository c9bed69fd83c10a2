//! Error types for credential issuance and verification.
//!
//! Two caller-facing categories: configuration problems (fatal at startup,
//! HTTP 500 if they ever surface per-request) and input problems (HTTP 400,
//! rejected without side effects). Verification has its own taxonomy since
//! it runs relay-side and is never mapped to an HTTP response here.

use thiserror::Error;

/// Result type alias using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors from building configuration or issuing credentials.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Required configuration is missing or malformed.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Caller-supplied input is malformed.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Errors from verifying a presented credential.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VerifyError {
    /// Username does not encode a parseable expiry timestamp.
    #[error("malformed username: {0}")]
    MalformedUsername(String),

    /// Credential is not valid base64.
    #[error("malformed credential encoding")]
    MalformedCredential,

    /// Recomputed digest does not match the presented credential.
    #[error("credential digest mismatch")]
    Mismatch,

    /// Digest is authentic but the encoded expiry has passed.
    #[error("credential expired at {expiry}")]
    Expired {
        /// Unix timestamp encoded in the username.
        expiry: i64,
    },
}
