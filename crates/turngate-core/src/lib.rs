//! Core domain types for ephemeral relay credential issuance.
//!
//! Provides the shared-secret wrapper, relay configuration, credential
//! issuance and verification, and the clock abstraction used by the HTTP
//! layer. Issuance is a pure function of its inputs: no I/O, no stored
//! state, no randomness.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod credential;
pub mod error;
pub mod secret;
pub mod time;

pub use credential::{issue, verify, IssuedCredential, RelayConfig};
pub use error::{CoreError, Result, VerifyError};
pub use secret::SharedSecret;
pub use time::{Clock, SystemClock, TestClock};
