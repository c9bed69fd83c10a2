//! Configuration loading for the turngate service.
//!
//! Sources merge in priority order: built-in defaults, then `config.toml`
//! if present, then environment variables on top. The shared secret is
//! the one value with no default — issuing credentials against a
//! guessable secret is worse than refusing to start, so a missing or
//! empty `TURN_SHARED_SECRET` fails the process before it binds a port.

use std::{net::SocketAddr, str::FromStr, time::Duration};

use anyhow::{bail, Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use turngate_core::{RelayConfig, SharedSecret};

use crate::crypto::WebhookVerifier;

const CONFIG_FILE: &str = "config.toml";

/// Raw, serde-facing service configuration.
///
/// Handlers never see this type: the conversion methods produce the
/// validated domain forms ([`RelayConfig`], [`WebhookVerifier`]) and
/// those are what goes into application state. Keeping the secret as a
/// plain `Option<String>` here is deliberate — the redacting wrapper
/// takes over at the conversion boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Relay
    /// Comma-separated relay URIs handed out with credentials (env: `TURN_URLS`).
    #[serde(default = "default_turn_urls", alias = "TURN_URLS")]
    pub turn_urls: String,
    /// Secret keying credential HMACs; required, no default
    /// (env: `TURN_SHARED_SECRET`).
    #[serde(default, alias = "TURN_SHARED_SECRET")]
    pub turn_shared_secret: Option<String>,
    /// Credential lifetime in seconds (env: `TURN_CREDENTIAL_TTL_SECONDS`).
    #[serde(default = "default_credential_ttl", alias = "TURN_CREDENTIAL_TTL_SECONDS")]
    pub turn_credential_ttl_seconds: u64,

    // Webhooks
    /// Signing secret for incoming payment webhooks; unset disables
    /// verification, for development only (env: `STRIPE_WEBHOOK_SECRET`).
    #[serde(default, alias = "STRIPE_WEBHOOK_SECRET")]
    pub stripe_webhook_secret: Option<String>,
    /// Accepted clock skew for webhook signature timestamps, in seconds
    /// (env: `WEBHOOK_TOLERANCE_SECONDS`).
    #[serde(default = "default_webhook_tolerance", alias = "WEBHOOK_TOLERANCE_SECONDS")]
    pub webhook_tolerance_seconds: u64,

    // Server
    /// Bind address (env: `HOST`).
    #[serde(default = "default_host", alias = "HOST")]
    pub host: String,
    /// Bind port (env: `PORT`).
    #[serde(default = "default_port", alias = "PORT")]
    pub port: u16,
    /// Per-request timeout in seconds (env: `REQUEST_TIMEOUT`).
    #[serde(default = "default_request_timeout", alias = "REQUEST_TIMEOUT")]
    pub request_timeout: u64,

    // Logging
    /// Log filter (env: `RUST_LOG`).
    #[serde(default = "default_log_level", alias = "RUST_LOG")]
    pub rust_log: String,
}

impl Config {
    /// Merges defaults, `config.toml`, and environment overrides, then
    /// validates the result.
    ///
    /// # Errors
    ///
    /// Fails when a source does not parse or validation rejects the
    /// merged result — most commonly a missing `TURN_SHARED_SECRET`.
    pub fn load() -> Result<Self> {
        let merged = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed(""));

        let config: Self = merged.extract().context("failed to load configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Converts to the validated relay configuration used for issuance.
    ///
    /// # Errors
    ///
    /// Fails when the secret is absent or empty, or when the URL list
    /// does not pass domain validation.
    pub fn relay_config(&self) -> Result<RelayConfig> {
        let secret = self
            .turn_shared_secret
            .as_deref()
            .filter(|s| !s.is_empty())
            .context("TURN_SHARED_SECRET must be set to a non-empty value")?;

        let urls: Vec<String> = self
            .turn_urls
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();

        let relay = RelayConfig::new(
            SharedSecret::from(secret),
            urls,
            Duration::from_secs(self.turn_credential_ttl_seconds),
        )?;
        Ok(relay)
    }

    /// Converts to the webhook signature policy.
    ///
    /// # Errors
    ///
    /// Rejects an empty `STRIPE_WEBHOOK_SECRET`: that is almost always a
    /// broken deployment, not a request to disable verification.
    pub fn webhook_verifier(&self) -> Result<WebhookVerifier> {
        let tolerance = Duration::from_secs(self.webhook_tolerance_seconds);

        match self.stripe_webhook_secret.as_deref() {
            None => Ok(WebhookVerifier::new(None, tolerance)),
            Some("") => bail!("STRIPE_WEBHOOK_SECRET must not be empty when set"),
            Some(secret) => Ok(WebhookVerifier::new(Some(SharedSecret::from(secret)), tolerance)),
        }
    }

    /// Socket address assembled from host and port.
    ///
    /// # Errors
    ///
    /// Fails when host and port do not form a valid socket address.
    pub fn parse_server_addr(&self) -> Result<SocketAddr> {
        let addr = format!("{}:{}", self.host, self.port);
        SocketAddr::from_str(&addr).context("invalid server address")
    }

    fn validate(&self) -> Result<()> {
        if self.port == 0 {
            bail!("port must be greater than 0");
        }
        if self.request_timeout == 0 {
            bail!("request_timeout must be greater than 0");
        }
        if self.webhook_tolerance_seconds == 0 {
            bail!("webhook_tolerance_seconds must be greater than 0");
        }

        // Runs the domain-level checks too: secret presence, URL schemes,
        // non-zero TTL.
        self.relay_config()?;
        self.webhook_verifier()?;

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            turn_urls: default_turn_urls(),
            turn_shared_secret: None,
            turn_credential_ttl_seconds: default_credential_ttl(),
            stripe_webhook_secret: None,
            webhook_tolerance_seconds: default_webhook_tolerance(),
            host: default_host(),
            port: default_port(),
            request_timeout: default_request_timeout(),
            rust_log: default_log_level(),
        }
    }
}

fn default_turn_urls() -> String {
    "turn:localhost:3478".to_string()
}

fn default_credential_ttl() -> u64 {
    86_400
}

fn default_webhook_tolerance() -> u64 {
    300
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, env, sync::Mutex};

    use super::*;

    // Process environment is global; serialize every test that touches it.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    struct EnvGuard {
        _lock: std::sync::MutexGuard<'static, ()>,
        touched: Vec<String>,
        originals: HashMap<String, Option<String>>,
    }

    impl EnvGuard {
        fn new() -> Self {
            let lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            Self { _lock: lock, touched: Vec::new(), originals: HashMap::new() }
        }

        fn remember(&mut self, key: &str) {
            if !self.touched.contains(&key.to_string()) {
                self.originals.insert(key.to_string(), env::var(key).ok());
                self.touched.push(key.to_string());
            }
        }

        fn set(&mut self, key: &str, value: &str) {
            self.remember(key);
            env::set_var(key, value);
        }

        fn unset(&mut self, key: &str) {
            self.remember(key);
            env::remove_var(key);
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for key in &self.touched {
                match self.originals.get(key) {
                    Some(Some(value)) => env::set_var(key, value),
                    Some(None) => env::remove_var(key),
                    None => {},
                }
            }
        }
    }

    /// Unsets every variable the loader reads so a test starts from
    /// defaults regardless of the surrounding environment.
    fn clean_environment(guard: &mut EnvGuard) {
        for key in [
            "TURN_URLS",
            "TURN_SHARED_SECRET",
            "TURN_CREDENTIAL_TTL_SECONDS",
            "STRIPE_WEBHOOK_SECRET",
            "WEBHOOK_TOLERANCE_SECONDS",
            "HOST",
            "PORT",
            "REQUEST_TIMEOUT",
        ] {
            guard.unset(key);
        }
    }

    #[test]
    fn missing_shared_secret_is_a_hard_failure() {
        let mut guard = EnvGuard::new();
        clean_environment(&mut guard);

        let err = Config::load().unwrap_err();
        assert!(err.to_string().contains("TURN_SHARED_SECRET"));
    }

    #[test]
    fn defaults_apply_when_only_the_secret_is_set() {
        let mut guard = EnvGuard::new();
        clean_environment(&mut guard);
        guard.set("TURN_SHARED_SECRET", "test-secret");

        let config = Config::load().expect("config should load");

        assert_eq!(config.turn_urls, "turn:localhost:3478");
        assert_eq!(config.turn_credential_ttl_seconds, 86_400);
        assert_eq!(config.webhook_tolerance_seconds, 300);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.request_timeout, 30);
        assert!(config.stripe_webhook_secret.is_none());
    }

    #[test]
    fn environment_overrides_are_applied() {
        let mut guard = EnvGuard::new();
        clean_environment(&mut guard);
        guard.set("TURN_SHARED_SECRET", "env-secret");
        guard.set("TURN_URLS", "turn:relay.example.com:3478,turns:relay.example.com:5349");
        guard.set("TURN_CREDENTIAL_TTL_SECONDS", "600");
        guard.set("STRIPE_WEBHOOK_SECRET", "whsec_env");
        guard.set("HOST", "0.0.0.0");
        guard.set("PORT", "9090");

        let config = Config::load().expect("config should load with env overrides");

        assert_eq!(config.turn_credential_ttl_seconds, 600);
        assert_eq!(config.port, 9090);
        assert_eq!(config.stripe_webhook_secret.as_deref(), Some("whsec_env"));

        let relay = config.relay_config().expect("relay config converts");
        assert_eq!(
            relay.urls(),
            ["turn:relay.example.com:3478".to_string(), "turns:relay.example.com:5349".to_string()]
        );
        assert_eq!(relay.credential_ttl(), Duration::from_secs(600));
    }

    #[test]
    fn url_list_tolerates_whitespace_and_trailing_commas() {
        let mut guard = EnvGuard::new();
        clean_environment(&mut guard);
        guard.set("TURN_SHARED_SECRET", "test-secret");
        guard.set("TURN_URLS", " turn:a.example.com:3478 , turns:b.example.com:5349 ,");

        let config = Config::load().expect("config should load");
        let relay = config.relay_config().expect("relay config converts");

        assert_eq!(
            relay.urls(),
            ["turn:a.example.com:3478".to_string(), "turns:b.example.com:5349".to_string()]
        );
    }

    #[test]
    fn zero_credential_ttl_is_rejected() {
        let mut guard = EnvGuard::new();
        clean_environment(&mut guard);
        guard.set("TURN_SHARED_SECRET", "test-secret");
        guard.set("TURN_CREDENTIAL_TTL_SECONDS", "0");

        assert!(Config::load().is_err());
    }

    #[test]
    fn unknown_relay_scheme_is_rejected() {
        let mut guard = EnvGuard::new();
        clean_environment(&mut guard);
        guard.set("TURN_SHARED_SECRET", "test-secret");
        guard.set("TURN_URLS", "https://not-a-relay.example.com");

        assert!(Config::load().is_err());
    }

    #[test]
    fn empty_webhook_secret_is_rejected() {
        let mut guard = EnvGuard::new();
        clean_environment(&mut guard);
        guard.set("TURN_SHARED_SECRET", "test-secret");
        guard.set("STRIPE_WEBHOOK_SECRET", "");

        assert!(Config::load().is_err());
    }

    #[test]
    fn socket_address_parsing() {
        let mut config = Config::default();
        config.host = "127.0.0.1".to_string();
        config.port = 9000;

        let addr = config.parse_server_addr().expect("should parse socket address");

        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 9000);
    }

    #[test]
    fn invalid_values_fail_validation() {
        let mut config = Config::default();
        config.turn_shared_secret = Some("test-secret".to_string());
        assert!(config.validate().is_ok());

        config.port = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.turn_shared_secret = Some("test-secret".to_string());
        config.webhook_tolerance_seconds = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.turn_shared_secret = Some(String::new());
        assert!(config.validate().is_err());
    }
}
