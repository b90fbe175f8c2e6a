//! Result records and the deduplicating output sink.

use crate::FaviconError;
use dashmap::DashSet;
use serde::{Deserialize, Serialize};
use std::io::{ErrorKind, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

/// A target whose favicon matched a known signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Found {
    /// The target as it was given, not the favicon URL
    pub url: String,
    pub hash: String,
    /// Signature label
    pub name: String,
}

impl Found {
    /// `[<hash>] [<name>] <url>`
    pub fn format(&self) -> String {
        format!("[{}] [{}] {}", self.hash, self.name, self.url)
    }

    pub fn format_json(&self) -> Result<String, FaviconError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Set of target URLs already reported.
#[derive(Debug, Default)]
pub struct Dedup {
    seen: DashSet<String>,
}

impl Dedup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `url` and reports whether this was its first sighting.
    ///
    /// Check and insert happen as one atomic step, so concurrent callers with
    /// the same URL get `true` exactly once.
    pub fn first_seen(&self, url: &str) -> bool {
        self.seen.insert(url.to_string())
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Writes each unique [`Found`] to stdout and, optionally, a file.
///
/// Console and file writes for one record happen under a single lock so two
/// records never interleave.
pub struct OutputSink {
    json: bool,
    console: bool,
    console_closed: AtomicBool,
    file: Mutex<Option<File>>,
    dedup: Dedup,
    written: AtomicUsize,
    duplicates: AtomicUsize,
}

impl OutputSink {
    /// Creates the sink, truncating `output_file` if it already exists.
    pub async fn new(json: bool, output_file: Option<&Path>) -> Result<Self, FaviconError> {
        let file = match output_file {
            Some(path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .write(true)
                    .truncate(true)
                    .open(path)
                    .await
                    .map_err(|e| FaviconError::Io(format!("{}: {}", path.display(), e)))?;
                debug!("Writing results to {}", path.display());
                Some(file)
            }
            None => None,
        };

        Ok(Self {
            json,
            console: true,
            console_closed: AtomicBool::new(false),
            file: Mutex::new(file),
            dedup: Dedup::new(),
            written: AtomicUsize::new(0),
            duplicates: AtomicUsize::new(0),
        })
    }

    /// Disables printing to stdout; the file, if any, is still written.
    pub fn without_console(mut self) -> Self {
        self.console = false;
        self
    }

    /// Writes `found` unless its URL was already reported. Returns whether
    /// anything was written.
    pub async fn emit(&self, found: &Found) -> Result<bool, FaviconError> {
        if !self.dedup.first_seen(&found.url) {
            self.duplicates.fetch_add(1, Ordering::Relaxed);
            debug!("Skipping duplicate result for {}", found.url);
            return Ok(false);
        }

        let line = if self.json {
            found.format_json()?
        } else {
            found.format()
        };

        let mut file = self.file.lock().await;
        if let Some(file) = file.as_mut() {
            file.write_all(format!("{line}\n").as_bytes()).await?;
        }

        if self.console && !self.is_closed() {
            let result = write_line(&mut std::io::stdout().lock(), &line);
            self.record_console_write(result)?;
        }

        self.written.fetch_add(1, Ordering::Relaxed);
        Ok(true)
    }

    /// A closed stdout (reader went away) stops console output without
    /// failing the scan. Any other write error is returned.
    fn record_console_write(&self, result: std::io::Result<()>) -> Result<(), FaviconError> {
        match result {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::BrokenPipe => {
                debug!("stdout closed, no further results will be printed");
                self.console_closed.store(true, Ordering::Relaxed);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// True once stdout has gone away.
    pub fn is_closed(&self) -> bool {
        self.console_closed.load(Ordering::Relaxed)
    }

    pub async fn flush(&self) -> Result<(), FaviconError> {
        if let Some(file) = self.file.lock().await.as_mut() {
            file.flush().await?;
        }
        Ok(())
    }

    pub fn written(&self) -> usize {
        self.written.load(Ordering::Relaxed)
    }

    pub fn duplicates(&self) -> usize {
        self.duplicates.load(Ordering::Relaxed)
    }
}

fn write_line(out: &mut impl Write, line: &str) -> std::io::Result<()> {
    writeln!(out, "{line}")?;
    out.flush()
}
