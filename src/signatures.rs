//! Favicon signature database.
//!
//! Maps a favicon hash to the product, panel or service it identifies. The
//! dataset is compiled into the binary and never changes after load.

use crate::FaviconError;
use std::collections::{HashMap, HashSet};
use tracing::debug;

const EMBEDDED_SIGNATURES: &str = include_str!("../data/signatures.json");

/// Read-only hash-to-label lookup table.
///
/// # Examples
///
/// ```rust
/// use favirecon::SignatureDb;
/// use std::collections::HashSet;
///
/// let db = SignatureDb::embedded()?;
/// assert_eq!(db.lookup("81586312", &HashSet::new(), None)?, "Jenkins");
/// # Ok::<(), favirecon::FaviconError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct SignatureDb {
    entries: HashMap<String, String>,
}

impl SignatureDb {
    /// Loads the dataset shipped with the binary.
    pub fn embedded() -> Result<Self, FaviconError> {
        Self::from_json(EMBEDDED_SIGNATURES)
    }

    /// Parses a JSON object of `"hash": "label"` pairs.
    pub fn from_json(json: &str) -> Result<Self, FaviconError> {
        let entries: HashMap<String, String> = serde_json::from_str(json)?;
        debug!("Loaded {} favicon signatures", entries.len());

        Ok(Self { entries })
    }

    /// Finds the label for `hash`.
    ///
    /// When `allowed` is non-empty the hash must also be one of its members.
    /// `source` (usually the favicon URL) is only used to give errors context.
    pub fn lookup(
        &self,
        hash: &str,
        allowed: &HashSet<String>,
        source: Option<&str>,
    ) -> Result<&str, FaviconError> {
        let label = self.entries.get(hash).ok_or_else(|| FaviconError::HashNotFound {
            hash: hash.to_string(),
            url: source.map(str::to_string),
        })?;

        if !allowed.is_empty() && !allowed.contains(hash) {
            return Err(FaviconError::HashNotMatching {
                hash: hash.to_string(),
                url: source.map(str::to_string),
            });
        }

        Ok(label)
    }

    pub fn contains(&self, hash: &str) -> bool {
        self.entries.contains_key(hash)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, String)> for SignatureDb {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_dataset_loads() {
        let db = SignatureDb::embedded().unwrap();
        assert!(!db.is_empty());
        assert!(db.contains("116323821"));
    }

    #[test]
    fn test_lookup_without_filter() {
        let db = SignatureDb::embedded().unwrap();
        assert_eq!(db.lookup("81586312", &HashSet::new(), None).unwrap(), "Jenkins");
    }

    #[test]
    fn test_lookup_with_filter() {
        let db = SignatureDb::embedded().unwrap();

        let allowed: HashSet<String> = ["81586312".to_string()].into_iter().collect();
        assert_eq!(db.lookup("81586312", &allowed, None).unwrap(), "Jenkins");

        let others: HashSet<String> = ["116323821".to_string()].into_iter().collect();
        let err = db
            .lookup("81586312", &others, Some("http://ci.example.com/favicon.ico"))
            .unwrap_err();
        assert!(matches!(err, FaviconError::HashNotMatching { .. }));
    }

    #[test]
    fn test_lookup_missing_hash() {
        let db = SignatureDb::embedded().unwrap();
        let err = db.lookup("-1541278541", &HashSet::new(), None).unwrap_err();
        assert!(matches!(err, FaviconError::HashNotFound { ref url, .. } if url.is_none()));
    }

    #[test]
    fn test_malformed_dataset_is_rejected() {
        assert!(matches!(
            SignatureDb::from_json("[\"not\", \"a map\"]"),
            Err(FaviconError::Serialization(_))
        ));
    }
}
