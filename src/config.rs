//! Configuration management with serde serialization/deserialization
//!
//! Everything the scan pipeline consumes lives in [`Config`]. Values can come
//! from a JSON file and are then overridden by command-line flags.

use crate::FaviconError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_CONCURRENCY: usize = 100;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Main configuration structure for a favicon scan
///
/// # Examples
///
/// ```rust
/// use favirecon::Config;
///
/// let config = Config {
///     concurrency: 20,
///     rate_limit: 50,
///     hashes: vec!["116323821".to_string()],
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Number of concurrent workers, also the capacity of the target queue
    /// (default: 100)
    pub concurrency: usize,

    /// Per-request timeout covering connect, TLS handshake and body (default: 10 seconds)
    pub timeout: Duration,

    /// Maximum requests per second across all workers, 0 for unlimited
    pub rate_limit: u32,

    /// Proxy URL used for every request, e.g. `http://127.0.0.1:8080`
    pub proxy: Option<String>,

    /// Only report favicons whose hash is one of these (default: report all)
    pub hashes: Vec<String>,

    /// User-Agent header for requests (default: a random desktop browser UA)
    pub user_agent: Option<String>,

    /// File that results are also appended to; truncated at start
    pub output_file: Option<PathBuf>,

    /// Emit results as JSON lines instead of plain text
    pub json: bool,

    /// Debug logging, and error-level logs for hash misses
    pub verbose: bool,

    /// Print results only
    pub silent: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            rate_limit: 0,
            proxy: None,
            hashes: Vec::new(),
            user_agent: None,
            output_file: None,
            json: false,
            verbose: false,
            silent: false,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), FaviconError> {
        if self.silent && self.verbose {
            return Err(FaviconError::Configuration(
                "incompatible flags specified: silent and verbose".to_string(),
            ));
        }

        if self.concurrency == 0 {
            return Err(FaviconError::Configuration(
                "concurrency must be greater than 0".to_string(),
            ));
        }

        if self.timeout.is_zero() {
            return Err(FaviconError::Configuration(
                "timeout must be greater than 0".to_string(),
            ));
        }

        if let Some(proxy) = &self.proxy {
            url::Url::parse(proxy)
                .map_err(|e| FaviconError::Configuration(format!("invalid proxy {proxy}: {e}")))?;
        }

        Ok(())
    }

    /// The hash filter as a set; empty means every known hash is reported.
    pub fn hash_filter(&self) -> HashSet<String> {
        self.hashes
            .iter()
            .map(|h| h.trim())
            .filter(|h| !h.is_empty())
            .map(str::to_string)
            .collect()
    }
}
