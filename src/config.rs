// src/config.rs
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};

pub const ENV_BASE_URL: &str = "NITTER_BASE_URL";
pub const ENV_INTERVAL_MS: &str = "RELAY_INTERVAL_MS";
pub const ENV_METRICS_ADDR: &str = "RELAY_METRICS_ADDR";

pub const DEFAULT_INTERVAL_MS: u64 = 60_000;

/// Environment-driven settings for the binary. The subscriptions file
/// has its own resolution in `subscriptions::FileStore::from_env`.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Nitter instance the feeds are read from, trailing slashes
    /// stripped.
    pub base_url: String,
    /// Steady-state poll period. Unset or non-numeric falls back to one
    /// minute.
    pub interval: Duration,
    /// Where to serve /metrics and /health; unset disables the server.
    pub metrics_addr: Option<SocketAddr>,
}

impl RelayConfig {
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var(ENV_BASE_URL)
            .with_context(|| format!("{ENV_BASE_URL} is required"))?
            .trim_end_matches('/')
            .to_string();

        let metrics_addr = match std::env::var(ENV_METRICS_ADDR) {
            Ok(v) => Some(
                v.parse()
                    .with_context(|| format!("{ENV_METRICS_ADDR} is not a socket address: {v}"))?,
            ),
            Err(_) => None,
        };

        Ok(Self {
            base_url,
            interval: interval_from_env(),
            metrics_addr,
        })
    }
}

/// `RELAY_INTERVAL_MS` in milliseconds; unset or non-numeric means
/// 60_000.
pub fn interval_from_env() -> Duration {
    let ms: u64 = std::env::var(ENV_INTERVAL_MS)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_INTERVAL_MS);
    Duration::from_millis(ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[serial_test::serial]
    #[test]
    fn interval_defaults_when_unset_or_garbage() {
        env::remove_var(ENV_INTERVAL_MS);
        assert_eq!(interval_from_env(), Duration::from_millis(60_000));

        env::set_var(ENV_INTERVAL_MS, "not-a-number");
        assert_eq!(interval_from_env(), Duration::from_millis(60_000));

        env::set_var(ENV_INTERVAL_MS, "1500");
        assert_eq!(interval_from_env(), Duration::from_millis(1_500));
        env::remove_var(ENV_INTERVAL_MS);
    }

    #[serial_test::serial]
    #[test]
    fn base_url_is_required_and_trimmed() {
        env::remove_var(ENV_BASE_URL);
        env::remove_var(ENV_METRICS_ADDR);
        assert!(RelayConfig::from_env().is_err());

        env::set_var(ENV_BASE_URL, "https://nitter.example//");
        let cfg = RelayConfig::from_env().unwrap();
        assert_eq!(cfg.base_url, "https://nitter.example");
        assert!(cfg.metrics_addr.is_none());
        env::remove_var(ENV_BASE_URL);
    }
}
