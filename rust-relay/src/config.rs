//! Configuration module for environment variable parsing.
//!
//! All values are read once at startup. The downstream URL is only validated
//! when a delivery needs it, so a bad value never prevents the server from
//! answering verification probes.

use std::env;
use std::time::Duration;

use tracing::warn;
use url::Url;

use crate::error::RelayError;

/// Header the upstream platform uses to carry its body signature.
pub const DEFAULT_SIGNATURE_HEADER: &str = "x-line-signature";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the web server to listen on
    pub port: u16,

    /// Collector endpoint that receives relayed webhooks
    pub downstream_url: Option<String>,

    /// Name of the signature header copied to the collector
    pub signature_header: String,

    /// Redirect hops followed after the first call
    pub max_redirects: u32,

    /// Timeout applied to each individual hop in milliseconds
    pub hop_timeout_ms: u64,

    /// Largest inbound body accepted for relaying
    pub max_body_bytes: usize,

    /// How long shutdown waits for in-flight deliveries in milliseconds
    pub shutdown_grace_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 8080,
            downstream_url: None,
            signature_header: DEFAULT_SIGNATURE_HEADER.to_string(),
            max_redirects: 4,
            hop_timeout_ms: 5000,
            max_body_bytes: 1024 * 1024,
            shutdown_grace_ms: 10_000,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Config::default();

        Config {
            port: parse_number("PORT", defaults.port),

            downstream_url: env::var("DOWNSTREAM_URL")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),

            signature_header: env::var("SIGNATURE_HEADER")
                .ok()
                .map(|v| v.trim().to_ascii_lowercase())
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.signature_header),

            max_redirects: parse_number("MAX_REDIRECTS", defaults.max_redirects),

            hop_timeout_ms: parse_number("HOP_TIMEOUT_MS", defaults.hop_timeout_ms),

            max_body_bytes: parse_number("MAX_BODY_BYTES", defaults.max_body_bytes),

            shutdown_grace_ms: parse_number("SHUTDOWN_GRACE_MS", defaults.shutdown_grace_ms),
        }
    }

    /// Resolve the collector URL for a delivery.
    ///
    /// Fails with [`RelayError::MissingConfiguration`] when unset and with
    /// [`RelayError::InvalidConfiguration`] when the value is not an absolute
    /// http(s) URL.
    pub fn downstream_url(&self) -> Result<Url, RelayError> {
        let raw = self
            .downstream_url
            .as_deref()
            .ok_or(RelayError::MissingConfiguration)?;

        let url = Url::parse(raw)
            .map_err(|e| RelayError::InvalidConfiguration(format!("DOWNSTREAM_URL: {e}")))?;

        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(RelayError::InvalidConfiguration(format!(
                "DOWNSTREAM_URL: unsupported scheme {other}"
            ))),
        }
    }

    pub fn hop_timeout(&self) -> Duration {
        Duration::from_millis(self.hop_timeout_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

/// Parse a numeric environment variable, falling back on absence or garbage.
fn parse_number<T>(name: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    let raw = match env::var(name) {
        Ok(v) => v,
        Err(_) => return default,
    };

    match raw.trim().parse::<T>() {
        Ok(v) => v,
        Err(_) => {
            warn!(env_var = name, value = %raw, "Invalid number, using default");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number_valid() {
        env::set_var("TEST_RELAY_NUMBER", " 42 ");
        assert_eq!(parse_number("TEST_RELAY_NUMBER", 7u32), 42);
        env::remove_var("TEST_RELAY_NUMBER");
    }

    #[test]
    fn test_parse_number_invalid_falls_back() {
        env::set_var("TEST_RELAY_NUMBER_BAD", "lots");
        assert_eq!(parse_number("TEST_RELAY_NUMBER_BAD", 7u64), 7);
        env::remove_var("TEST_RELAY_NUMBER_BAD");
    }

    #[test]
    fn test_parse_number_default() {
        assert_eq!(parse_number("NONEXISTENT_RELAY_VAR", 4u32), 4);
    }

    #[test]
    fn test_downstream_url_missing() {
        let config = Config::default();
        assert!(matches!(
            config.downstream_url(),
            Err(RelayError::MissingConfiguration)
        ));
    }

    #[test]
    fn test_downstream_url_relative_rejected() {
        let config = Config {
            downstream_url: Some("/exec".to_string()),
            ..Config::default()
        };
        assert!(matches!(
            config.downstream_url(),
            Err(RelayError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_downstream_url_scheme_rejected() {
        let config = Config {
            downstream_url: Some("ftp://backend.example/exec".to_string()),
            ..Config::default()
        };
        assert!(matches!(
            config.downstream_url(),
            Err(RelayError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_downstream_url_valid() {
        let config = Config {
            downstream_url: Some("https://backend.example/exec".to_string()),
            ..Config::default()
        };
        let url = config.downstream_url().unwrap();
        assert_eq!(url.as_str(), "https://backend.example/exec");
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.max_redirects, 4);
        assert_eq!(config.signature_header, "x-line-signature");
        assert_eq!(config.hop_timeout(), Duration::from_secs(5));
    }
}
