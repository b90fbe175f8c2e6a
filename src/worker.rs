use crate::{
    normalize, ErrorSeverity, FaviconError, FaviconResolver, Found, RateLimiter, SignatureDb,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// State every worker reads but never mutates.
#[derive(Debug, Clone)]
pub struct WorkerContext {
    pub resolver: FaviconResolver,
    pub signatures: Arc<SignatureDb>,
    pub limiter: Arc<RateLimiter>,
    pub hash_filter: Arc<HashSet<String>>,
    pub verbose: bool,
}

pub struct FaviconWorker {
    id: usize,
    context: WorkerContext,
    is_running: Arc<AtomicBool>,
    processed_count: Arc<AtomicUsize>,
    found_count: Arc<AtomicUsize>,
    error_count: Arc<AtomicUsize>,
}

impl FaviconWorker {
    pub fn new(id: usize, context: WorkerContext) -> Self {
        Self {
            id,
            context,
            is_running: Arc::new(AtomicBool::new(false)),
            processed_count: Arc::new(AtomicUsize::new(0)),
            found_count: Arc::new(AtomicUsize::new(0)),
            error_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Pulls targets until the queue is closed and drained.
    pub async fn run_with_shared_receiver(
        &self,
        targets: Arc<Mutex<mpsc::Receiver<String>>>,
        results: mpsc::Sender<Found>,
    ) {
        debug!("Starting favicon worker {}", self.id);
        self.is_running.store(true, Ordering::Relaxed);

        loop {
            let target = {
                let mut receiver = targets.lock().await;
                receiver.recv().await
            };

            let Some(target) = target else { break };

            self.processed_count.fetch_add(1, Ordering::Relaxed);

            match self.process_target(&target).await {
                Ok(found) => {
                    self.found_count.fetch_add(1, Ordering::Relaxed);
                    debug!("Worker {} matched {} as {}", self.id, found.url, found.name);

                    if let Err(e) = results.send(found).await {
                        error!("Worker {} failed to send result: {}", self.id, e);
                        break;
                    }
                }
                Err(e) => {
                    self.error_count.fetch_add(1, Ordering::Relaxed);
                    self.log_failure(&target, &e);
                }
            }
        }

        self.is_running.store(false, Ordering::Relaxed);
        debug!("Favicon worker {} stopped", self.id);
    }

    /// Normalize, throttle, resolve, then look the hash up.
    pub async fn process_target(&self, target: &str) -> Result<Found, FaviconError> {
        let favicon_url = normalize(target)?;

        self.context.limiter.take().await;

        let resolution = self.context.resolver.resolve(target, &favicon_url).await?;
        debug!(
            "Worker {} hashed {} ({:?}) for {}: {}",
            self.id, resolution.favicon_url, resolution.source, target, resolution.hash
        );

        let name = self.context.signatures.lookup(
            &resolution.hash,
            &self.context.hash_filter,
            Some(&resolution.favicon_url),
        )?;

        Ok(Found {
            url: target.to_string(),
            hash: resolution.hash,
            name: name.to_string(),
        })
    }

    fn log_failure(&self, target: &str, err: &FaviconError) {
        match err {
            FaviconError::HashNotFound { .. } | FaviconError::HashNotMatching { .. } => {
                if self.context.verbose {
                    error!("{}", err);
                } else {
                    debug!("{}", err);
                }
            }
            _ if err.is_expected() => {
                debug!("Favicon not found for {}: {}", target, err);
            }
            _ => match err.severity() {
                ErrorSeverity::Low => debug!("{}: {}", target, err),
                ErrorSeverity::Medium => warn!("{}: {}", target, err),
                ErrorSeverity::High | ErrorSeverity::Critical => error!("{}: {}", target, err),
            },
        }
    }

    pub fn get_stats(&self) -> WorkerStats {
        WorkerStats {
            id: self.id,
            is_running: self.is_running(),
            processed_count: self.processed_count(),
            found_count: self.found_count(),
            error_count: self.error_count(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::Relaxed)
    }

    pub fn processed_count(&self) -> usize {
        self.processed_count.load(Ordering::Relaxed)
    }

    pub fn found_count(&self) -> usize {
        self.found_count.load(Ordering::Relaxed)
    }

    pub fn error_count(&self) -> usize {
        self.error_count.load(Ordering::Relaxed)
    }
}

impl Clone for FaviconWorker {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            context: self.context.clone(),
            is_running: self.is_running.clone(),
            processed_count: self.processed_count.clone(),
            found_count: self.found_count.clone(),
            error_count: self.error_count.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WorkerStats {
    pub id: usize,
    pub is_running: bool,
    pub processed_count: usize,
    pub found_count: usize,
    pub error_count: usize,
}

/// Fixed set of workers sharing one target queue and one result queue.
///
/// The target queue holds at most `worker_count` entries, so producers wait
/// once every worker is busy. The result queue closes by itself when the last
/// worker exits.
pub struct WorkerPool {
    workers: Vec<FaviconWorker>,
    target_sender: Option<mpsc::Sender<String>>,
    result_receiver: mpsc::Receiver<Found>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub fn new(worker_count: usize, context: WorkerContext) -> Self {
        let capacity = worker_count.max(1);
        let (target_sender, target_receiver) = mpsc::channel(capacity);
        let (result_sender, result_receiver) = mpsc::channel(capacity);

        let workers: Vec<FaviconWorker> = (0..worker_count)
            .map(|i| FaviconWorker::new(i, context.clone()))
            .collect();

        let shared_receiver = Arc::new(Mutex::new(target_receiver));

        let handles = workers
            .iter()
            .map(|worker| {
                let worker = worker.clone();
                let rx = shared_receiver.clone();
                let tx = result_sender.clone();

                tokio::spawn(async move {
                    worker.run_with_shared_receiver(rx, tx).await;
                })
            })
            .collect();

        info!("Started {} favicon workers", worker_count);

        Self {
            workers,
            target_sender: Some(target_sender),
            result_receiver,
            handles,
        }
    }

    /// A sender for the target queue. The queue closes once every clone and
    /// the pool's own sender (see [`WorkerPool::close`]) are dropped.
    pub fn target_sender(&self) -> Option<mpsc::Sender<String>> {
        self.target_sender.clone()
    }

    pub async fn submit_target(&self, target: String) -> Result<(), FaviconError> {
        let sender = self
            .target_sender
            .as_ref()
            .ok_or_else(|| FaviconError::Configuration("worker pool is closed".to_string()))?;

        sender
            .send(target)
            .await
            .map_err(|e| FaviconError::Configuration(format!("worker pool stopped: {e}")))
    }

    /// Drops the pool's own target sender.
    pub fn close(&mut self) {
        self.target_sender.take();
    }

    pub async fn get_result(&mut self) -> Option<Found> {
        self.result_receiver.recv().await
    }

    /// Cancels every worker at its next suspension point.
    pub fn abort(&self) {
        for handle in &self.handles {
            handle.abort();
        }
    }

    /// Waits for every worker task to exit.
    pub async fn join(&mut self) {
        for result in futures::future::join_all(self.handles.drain(..)).await {
            match result {
                Err(e) if e.is_cancelled() => {}
                Err(e) => error!("Favicon worker task failed: {}", e),
                Ok(()) => {}
            }
        }
    }

    pub fn get_worker_stats(&self) -> Vec<WorkerStats> {
        self.workers.iter().map(|w| w.get_stats()).collect()
    }

    pub fn total_processed(&self) -> usize {
        self.workers.iter().map(|w| w.processed_count()).sum()
    }

    pub fn total_found(&self) -> usize {
        self.workers.iter().map(|w| w.found_count()).sum()
    }

    pub fn total_errors(&self) -> usize {
        self.workers.iter().map(|w| w.error_count()).sum()
    }

    pub fn active_workers(&self) -> usize {
        self.workers.iter().filter(|w| w.is_running()).count()
    }
}
