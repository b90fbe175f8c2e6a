//! HTTP client construction.

use crate::{Config, FaviconError};
use rand::seq::SliceRandom;
use reqwest::{Client, Proxy};
use std::time::Duration;
use tracing::debug;

pub const TCP_KEEPALIVE: Duration = Duration::from_secs(30);
pub const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);
pub const POOL_MAX_IDLE_PER_HOST: usize = 10;

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:120.0) Gecko/20100101 Firefox/120.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.0.0",
];

/// Picks one desktop browser User-Agent, used for the whole run.
pub fn random_user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(USER_AGENTS[0])
}

/// Builds the client shared by every worker.
///
/// Certificates and hostnames are not verified.
pub fn build_client(config: &Config, user_agent: &str) -> Result<Client, FaviconError> {
    let mut builder = Client::builder()
        .user_agent(user_agent)
        .timeout(config.timeout)
        .connect_timeout(config.timeout)
        .tcp_keepalive(TCP_KEEPALIVE)
        .pool_idle_timeout(POOL_IDLE_TIMEOUT)
        .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
        .danger_accept_invalid_certs(true);

    if let Some(proxy) = &config.proxy {
        let proxy = Proxy::all(proxy.as_str())
            .map_err(|e| FaviconError::Configuration(format!("invalid proxy {proxy}: {e}")))?;
        builder = builder.proxy(proxy);
        debug!("Using proxy {:?}", config.proxy);
    }

    builder
        .build()
        .map_err(|e| FaviconError::Configuration(format!("failed to build HTTP client: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_user_agent() {
        let ua = random_user_agent();
        assert!(ua.starts_with("Mozilla/5.0"));
        assert!(USER_AGENTS.contains(&ua));
    }

    #[test]
    fn test_build_client() {
        let config = Config::default();
        assert!(build_client(&config, random_user_agent()).is_ok());
    }

    #[test]
    fn test_build_client_with_proxy() {
        let config = Config {
            proxy: Some("http://127.0.0.1:8080".to_string()),
            ..Default::default()
        };
        assert!(build_client(&config, "favirecon-test").is_ok());
    }
}
