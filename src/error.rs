use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum FaviconError {
    #[error("malformed input URL: {0}")]
    MalformedInput(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Network error: {0}")]
    Transport(String),

    #[error("favicon not found")]
    FaviconNotFound,

    #[error("favicon response body is empty")]
    EmptyBody,

    #[error("failed to fetch HTML (status {0})")]
    HtmlNotFetched(u16),

    #[error("no favicon link tag found")]
    FaviconLinkTagNotFound,

    #[error("invalid data URI: {0}")]
    InvalidDataUri(String),

    #[error("{}hash not found", lookup_context(.hash, .url.as_deref()))]
    HashNotFound {
        hash: String,
        url: Option<String>,
    },

    #[error("{}hash not matching hash provided", lookup_context(.hash, .url.as_deref()))]
    HashNotMatching {
        hash: String,
        url: Option<String>,
    },

    #[error("malformed input CIDR: {0}")]
    CidrBadFormat(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

fn lookup_context(hash: &str, url: Option<&str>) -> String {
    match url {
        Some(url) => format!("[{hash}] {url} "),
        None => String::new(),
    }
}

impl FaviconError {
    /// Outcomes that are part of normal scanning rather than faults.
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            FaviconError::FaviconNotFound
                | FaviconError::EmptyBody
                | FaviconError::HtmlNotFetched(_)
                | FaviconError::FaviconLinkTagNotFound
                | FaviconError::HashNotFound { .. }
                | FaviconError::HashNotMatching { .. }
        )
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            FaviconError::FaviconNotFound
            | FaviconError::EmptyBody
            | FaviconError::HtmlNotFetched(_)
            | FaviconError::FaviconLinkTagNotFound
            | FaviconError::HashNotFound { .. }
            | FaviconError::HashNotMatching { .. } => ErrorSeverity::Low,
            FaviconError::Configuration(_) | FaviconError::Serialization(_) => ErrorSeverity::High,
            FaviconError::Io(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::Medium,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl From<std::io::Error> for FaviconError {
    fn from(err: std::io::Error) -> Self {
        FaviconError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for FaviconError {
    fn from(err: serde_json::Error) -> Self {
        FaviconError::Serialization(err.to_string())
    }
}

impl From<url::ParseError> for FaviconError {
    fn from(err: url::ParseError) -> Self {
        FaviconError::InvalidUrl(err.to_string())
    }
}

impl From<reqwest::Error> for FaviconError {
    fn from(err: reqwest::Error) -> Self {
        FaviconError::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_messages() {
        let plain = FaviconError::HashNotFound {
            hash: "123".to_string(),
            url: None,
        };
        assert_eq!(plain.to_string(), "hash not found");

        let sourced = FaviconError::HashNotMatching {
            hash: "123".to_string(),
            url: Some("http://example.com/favicon.ico".to_string()),
        };
        assert_eq!(
            sourced.to_string(),
            "[123] http://example.com/favicon.ico hash not matching hash provided"
        );
    }

    #[test]
    fn test_expected_outcomes() {
        assert!(FaviconError::FaviconNotFound.is_expected());
        assert!(FaviconError::EmptyBody.is_expected());
        assert!(!FaviconError::Transport("reset".to_string()).is_expected());
        assert!(!FaviconError::InvalidDataUri("x".to_string()).is_expected());
    }
}
