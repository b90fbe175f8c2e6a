//! Target input: stdin, list files, a single literal, and CIDR expansion.

use crate::FaviconError;
use ipnetwork::IpNetwork;
use std::collections::HashSet;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, error};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSource {
    /// Newline separated targets piped on stdin
    Stdin,
    /// File with one target per line
    File(PathBuf),
    Literal(String),
}

/// True when stdin is a pipe or file rather than an interactive terminal.
pub fn stdin_is_piped() -> bool {
    !std::io::stdin().is_terminal()
}

/// Expands a CIDR block such as `192.168.1.0/30` into its addresses.
pub fn expand_cidr(entry: &str) -> Result<impl Iterator<Item = String>, FaviconError> {
    let entry = entry.trim();
    if !entry.contains('/') {
        return Err(FaviconError::CidrBadFormat(entry.to_string()));
    }

    let network: IpNetwork = entry
        .parse()
        .map_err(|_| FaviconError::CidrBadFormat(entry.to_string()))?;

    Ok(network.iter().map(|ip| ip.to_string()))
}

/// Decodes one raw input line; lines that are not valid UTF-8 are skipped.
fn decode_line(raw: Vec<u8>) -> Option<String> {
    match String::from_utf8(raw) {
        Ok(line) => Some(line),
        Err(e) => {
            debug!("Skipping input line that is not valid UTF-8: {}", e);
            None
        }
    }
}

/// Reads targets from a list file.
///
/// Blank lines and `#` comments are skipped and duplicates removed, keeping
/// the first occurrence's position. Lines that are not valid UTF-8 are
/// dropped without affecting the rest of the file.
pub async fn read_target_file(path: &Path) -> Result<Vec<String>, FaviconError> {
    let content = fs::read(path)
        .await
        .map_err(|e| FaviconError::Io(format!("{}: {}", path.display(), e)))?;

    let mut seen = HashSet::new();
    let targets = content
        .split(|&b| b == b'\n')
        .filter_map(|raw| decode_line(raw.to_vec()))
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter(|line| seen.insert(line.clone()))
        .collect();

    Ok(targets)
}

/// Feeds targets from every configured source into the pipeline.
#[derive(Debug, Clone)]
pub struct TargetProducer {
    sources: Vec<TargetSource>,
    cidr: bool,
}

impl TargetProducer {
    pub fn new(sources: Vec<TargetSource>, cidr: bool) -> Self {
        Self { sources, cidr }
    }

    pub fn sources(&self) -> &[TargetSource] {
        &self.sources
    }

    /// Sends every target into `targets`, waiting whenever the queue is full.
    ///
    /// A source that cannot be read is logged and the next one is tried. The
    /// sender is dropped on return, which closes the queue for the workers.
    /// Returns how many targets were enqueued.
    pub async fn run(self, targets: mpsc::Sender<String>) -> Result<usize, FaviconError> {
        let mut enqueued = 0;

        for source in &self.sources {
            match self.feed(source, &targets).await {
                Ok(Some(count)) => enqueued += count,
                Ok(None) => return Ok(enqueued),
                Err((count, e)) => {
                    enqueued += count;
                    error!("Failed to read input {:?}: {}", source, e);
                }
            }
        }

        debug!("Input exhausted after {} targets", enqueued);
        Ok(enqueued)
    }

    /// Enqueues everything one source yields. `Ok(None)` means the workers
    /// have gone away; on error the count enqueued so far is returned too.
    async fn feed(
        &self,
        source: &TargetSource,
        targets: &mpsc::Sender<String>,
    ) -> Result<Option<usize>, (usize, FaviconError)> {
        let mut enqueued = 0;

        match source {
            TargetSource::Stdin => {
                let mut lines = BufReader::new(tokio::io::stdin()).split(b'\n');
                loop {
                    let raw = match lines.next_segment().await {
                        Ok(Some(raw)) => raw,
                        Ok(None) => break,
                        Err(e) => return Err((enqueued, e.into())),
                    };
                    let Some(line) = decode_line(raw) else { continue };
                    match self.push(line, targets).await {
                        Some(count) => enqueued += count,
                        None => return Ok(None),
                    }
                }
            }
            TargetSource::File(path) => {
                let lines = read_target_file(path).await.map_err(|e| (0, e))?;
                for line in lines {
                    match self.push(line, targets).await {
                        Some(count) => enqueued += count,
                        None => return Ok(None),
                    }
                }
            }
            TargetSource::Literal(target) => match self.push(target.clone(), targets).await {
                Some(count) => enqueued += count,
                None => return Ok(None),
            },
        }

        Ok(Some(enqueued))
    }

    /// Enqueues one input entry, expanding it first in CIDR mode. Returns
    /// `None` once the workers have gone away.
    async fn push(&self, entry: String, targets: &mpsc::Sender<String>) -> Option<usize> {
        let entry = entry.trim().to_string();
        if entry.is_empty() {
            return Some(0);
        }

        if !self.cidr {
            return targets.send(entry).await.ok().map(|_| 1);
        }

        let addresses = match expand_cidr(&entry) {
            Ok(addresses) => addresses,
            Err(e) => {
                error!("{}", e);
                return Some(0);
            }
        };

        let mut count = 0;
        for address in addresses {
            targets.send(address).await.ok()?;
            count += 1;
        }
        Some(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_cidr() {
        let ips: Vec<String> = expand_cidr("192.168.1.0/30").unwrap().collect();
        assert_eq!(
            ips,
            vec!["192.168.1.0", "192.168.1.1", "192.168.1.2", "192.168.1.3"]
        );
    }

    #[test]
    fn test_expand_cidr_rejects_bad_input() {
        assert!(matches!(expand_cidr("192.168.1.1"), Err(FaviconError::CidrBadFormat(_))));
        assert!(matches!(expand_cidr("example.com/24"), Err(FaviconError::CidrBadFormat(_))));
        assert!(matches!(expand_cidr("10.0.0.0/33"), Err(FaviconError::CidrBadFormat(_))));
    }

    #[tokio::test]
    async fn test_read_target_file_dedups() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(
            file.path(),
            "example.com\n\n# staging hosts\nexample.org\nexample.com\n  example.net  \n",
        )
        .unwrap();

        let targets = read_target_file(file.path()).await.unwrap();
        assert_eq!(targets, vec!["example.com", "example.org", "example.net"]);
    }

    #[tokio::test]
    async fn test_read_target_file_missing() {
        let result = read_target_file(Path::new("/nonexistent/targets.txt")).await;
        assert!(matches!(result, Err(FaviconError::Io(_))));
    }

    #[tokio::test]
    async fn test_read_target_file_skips_invalid_utf8() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), b"a.example.com\n\xff\xfe.example.com\nb.example.com\n").unwrap();

        let targets = read_target_file(file.path()).await.unwrap();
        assert_eq!(targets, vec!["a.example.com", "b.example.com"]);
    }

    #[tokio::test]
    async fn test_producer_survives_bad_bytes_and_missing_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), b"a.example.com\r\n\xff\xfe.example.com\nb.example.com\n").unwrap();

        let (tx, mut rx) = mpsc::channel(8);
        let producer = TargetProducer::new(
            vec![
                TargetSource::File(file.path().to_path_buf()),
                TargetSource::File(PathBuf::from("/nonexistent/targets.txt")),
                TargetSource::Literal("c.example.com".to_string()),
            ],
            false,
        );
        let enqueued = producer.run(tx).await.unwrap();
        assert_eq!(enqueued, 3);

        let mut received = Vec::new();
        while let Some(target) = rx.recv().await {
            received.push(target);
        }
        assert_eq!(received, vec!["a.example.com", "b.example.com", "c.example.com"]);
    }

    #[tokio::test]
    async fn test_producer_expands_cidr_and_closes_queue() {
        let (tx, mut rx) = mpsc::channel(2);
        let producer = TargetProducer::new(
            vec![
                TargetSource::Literal("10.0.0.0/31".to_string()),
                TargetSource::Literal("not-a-cidr".to_string()),
            ],
            true,
        );

        let handle = tokio::spawn(producer.run(tx));

        let mut received = Vec::new();
        while let Some(target) = rx.recv().await {
            received.push(target);
        }

        assert_eq!(received, vec!["10.0.0.0", "10.0.0.1"]);
        assert_eq!(handle.await.unwrap().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_producer_file_then_literal() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "a.example.com\nb.example.com\na.example.com\n").unwrap();

        let (tx, mut rx) = mpsc::channel(8);
        let producer = TargetProducer::new(
            vec![
                TargetSource::File(file.path().to_path_buf()),
                TargetSource::Literal("c.example.com".to_string()),
            ],
            false,
        );
        let enqueued = producer.run(tx).await.unwrap();
        assert_eq!(enqueued, 3);

        let mut received = Vec::new();
        while let Some(target) = rx.recv().await {
            received.push(target);
        }
        assert_eq!(received, vec!["a.example.com", "b.example.com", "c.example.com"]);
    }
}
