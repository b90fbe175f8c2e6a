//! # favirecon
//!
//! Favicon based technology fingerprinting for the recon phase. Every target
//! has its favicon fetched, hashed the way Shodan does (MurmurHash3 over the
//! MIME base64 encoding of the raw bytes) and matched against an embedded
//! database of known hashes.
//!
//! ## Pipeline
//!
//! ```text
//! stdin / list / url ──► producer ──► bounded queue ──► workers (N)
//!                                                         │ normalize
//!                                                         │ rate limit
//!                                                         │ fetch or HTML fallback
//!                                                         │ hash + lookup
//!                                                         ▼
//!                          stdout / file ◄── dedup ◄── result queue
//! ```
//!
//! When `/favicon.ico` is missing or empty the resolver downloads the target
//! page and follows the first `<link rel="...icon...">` it finds, including
//! inline `data:image/...;base64,` icons.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use favirecon::{Config, OutputSink, ScanRunner, SignatureDb, TargetProducer, TargetSource};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config {
//!         concurrency: 20,
//!         rate_limit: 50,
//!         ..Default::default()
//!     };
//!     let runner = ScanRunner::new(config, SignatureDb::embedded()?)?;
//!     let sink = OutputSink::new(true, None).await?;
//!
//!     let targets = vec![TargetSource::Literal("https://example.com".to_string())];
//!     runner.run(TargetProducer::new(targets, false), &sink).await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## CLI Usage
//!
//! ```bash
//! favirecon -u https://www.example.com -j
//! cat targets.txt | favirecon -c 50 -r 100 -o results.txt
//! favirecon -l ranges.txt --cidr --hash 81586312,116323821
//! ```

/// Configuration and settings for a scan
pub mod config;

/// Error types and error handling utilities
pub mod error;

/// Favicon URL normalization
pub mod normalize;

/// Favicon hash computation
pub mod hash;

/// Embedded hash → technology database
pub mod signatures;

/// Shared HTTP client construction
pub mod http;

/// Favicon fetching with HTML fallback
pub mod resolver;

/// Global request rate limiting
pub mod rate_limit;

/// Worker processes for concurrent favicon resolution
pub mod worker;

/// Target input sources
pub mod input;

/// Result formatting, dedup and output
pub mod output;

/// Scan orchestration
pub mod runner;

/// Command-line interface implementation
pub mod cli;


pub use cli::*;
pub use config::*;
pub use error::*;
pub use hash::*;
pub use http::*;
pub use input::*;
pub use normalize::*;
pub use output::*;
pub use rate_limit::*;
pub use resolver::*;
pub use runner::*;
pub use signatures::*;
pub use worker::*;
