//! Shared-secret wrapper that cannot leak through logs or serialization.

use std::fmt;

use serde::{de, Deserialize, Deserializer};

/// Opaque shared secret used to key credential HMACs.
///
/// `Debug` and `Display` render a redacted placeholder, and the type
/// deliberately does not implement `Serialize`, so the key material cannot
/// end up in log output or response bodies. The raw bytes are only
/// reachable through [`SharedSecret::as_bytes`].
#[derive(Clone, PartialEq, Eq)]
pub struct SharedSecret(Vec<u8>);

impl SharedSecret {
    /// Wraps raw secret bytes.
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self(secret.into())
    }

    /// Raw key material, for HMAC construction only.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// True when no key material is present.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for SharedSecret {
    fn from(secret: &str) -> Self {
        Self(secret.as_bytes().to_vec())
    }
}

impl From<String> for SharedSecret {
    fn from(secret: String) -> Self {
        Self(secret.into_bytes())
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedSecret(***)")
    }
}

impl fmt::Display for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

impl<'de> Deserialize<'de> for SharedSecret {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        if raw.is_empty() {
            return Err(de::Error::custom("shared secret must not be empty"));
        }
        Ok(Self::from(raw))
    }
}
