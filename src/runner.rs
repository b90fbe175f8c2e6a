//! Scan orchestration
//!
//! Wires the input producer, the worker pool and the output sink together:
//! producer → bounded target queue → workers → result queue → single
//! consumer → dedup → sink.

use crate::{
    build_client, random_user_agent, Config, FaviconError, FaviconResolver, OutputSink,
    RateLimiter, SignatureDb, TargetProducer, WorkerContext, WorkerPool,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Counters for a finished scan.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanSummary {
    pub targets: usize,
    pub processed: usize,
    pub matched: usize,
    pub written: usize,
    pub duplicates: usize,
    pub errors: usize,
    pub elapsed: Duration,
}

/// Runs the fetch-hash-match pipeline over a set of targets.
///
/// # Examples
///
/// ```rust,no_run
/// use favirecon::{Config, OutputSink, ScanRunner, SignatureDb, TargetProducer, TargetSource};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let runner = ScanRunner::new(Config::default(), SignatureDb::embedded()?)?;
///     let sink = OutputSink::new(false, None).await?;
///     let producer = TargetProducer::new(vec![TargetSource::Literal("example.com".into())], false);
///
///     let summary = runner.run(producer, &sink).await?;
///     println!("{} matches", summary.written);
///     Ok(())
/// }
/// ```
pub struct ScanRunner {
    config: Config,
    signatures: Arc<SignatureDb>,
    resolver: FaviconResolver,
    limiter: Arc<RateLimiter>,
    user_agent: String,
}

impl ScanRunner {
    pub fn new(config: Config, signatures: SignatureDb) -> Result<Self, FaviconError> {
        config.validate()?;

        let user_agent = config
            .user_agent
            .clone()
            .unwrap_or_else(|| random_user_agent().to_string());
        let client = build_client(&config, &user_agent)?;
        let limiter = Arc::new(RateLimiter::new(config.rate_limit));

        Ok(Self {
            config,
            signatures: Arc::new(signatures),
            resolver: FaviconResolver::new(client),
            limiter,
            user_agent,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    fn worker_context(&self) -> WorkerContext {
        WorkerContext {
            resolver: self.resolver.clone(),
            signatures: self.signatures.clone(),
            limiter: self.limiter.clone(),
            hash_filter: Arc::new(self.config.hash_filter()),
            verbose: self.config.verbose,
        }
    }

    /// Scans every target `producer` yields and writes matches to `sink`.
    ///
    /// Per-target failures are logged and skipped. A failing write to the
    /// sink aborts the scan, and a closed stdout ends it early.
    pub async fn run(&self, producer: TargetProducer, sink: &OutputSink) -> Result<ScanSummary, FaviconError> {
        let start = Instant::now();
        debug!(
            "Scanning with {} workers, timeout {:?}, rate limit {}",
            self.config.concurrency, self.config.timeout, self.config.rate_limit
        );

        let mut pool = WorkerPool::new(self.config.concurrency, self.worker_context());
        let targets = pool
            .target_sender()
            .ok_or_else(|| FaviconError::Configuration("worker pool is closed".to_string()))?;
        pool.close();

        let producer_handle = tokio::spawn(producer.run(targets));

        while let Some(found) = pool.get_result().await {
            sink.emit(&found).await?;

            if sink.is_closed() {
                info!("Output closed, stopping scan");
                producer_handle.abort();
                pool.abort();
                break;
            }
        }

        pool.join().await;

        let enqueued = match producer_handle.await {
            Ok(Ok(count)) => count,
            Ok(Err(e)) => {
                error!("Failed to read input: {}", e);
                pool.total_processed()
            }
            Err(e) if e.is_cancelled() => pool.total_processed(),
            Err(e) => {
                error!("Input task failed: {}", e);
                pool.total_processed()
            }
        };

        sink.flush().await?;

        let summary = ScanSummary {
            targets: enqueued,
            processed: pool.total_processed(),
            matched: pool.total_found(),
            written: sink.written(),
            duplicates: sink.duplicates(),
            errors: pool.total_errors(),
            elapsed: start.elapsed(),
        };

        info!(
            "Scan completed. Targets: {}, Matches: {}, Errors: {}, Duration: {:?}",
            summary.processed, summary.written, summary.errors, summary.elapsed
        );

        Ok(summary)
    }
}
