//! Favicon discovery for a single target
//!
//! Resolution always tries the conventional favicon URL first. Only when that
//! yields nothing usable does the resolver fetch the target page itself and
//! follow the first icon `<link>` it declares, which may be an inline data URI.

use crate::normalize::{page_url, resolve_reference};
use crate::{favicon_hash, FaviconError};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::{Client, StatusCode};
use scraper::{Html, Selector};
use tracing::{debug, warn};

/// Outcome of retrieving one resource.
#[derive(Debug)]
pub enum FetchResult {
    /// Status 200 with a non-empty body
    Success(Vec<u8>),
    /// Any status other than 200
    NotFound(StatusCode),
    /// Status 200 but nothing in the body
    EmptyBody,
    TransportError(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionSource {
    Direct,
    LinkTag,
    DataUri,
}

/// A favicon that was found and hashed.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// Where the icon came from; the raw `data:` URI for inline icons
    pub favicon_url: String,
    pub hash: String,
    pub source: ResolutionSource,
}

#[derive(Debug, Clone)]
pub struct FaviconResolver {
    client: Client,
}

impl FaviconResolver {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// GETs `url` and classifies the response.
    pub async fn fetch(&self, url: &str) -> FetchResult {
        debug!("Checking favicon for {}", url);

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => return FetchResult::TransportError(e.to_string()),
        };

        let status = response.status();
        if status != StatusCode::OK {
            return FetchResult::NotFound(status);
        }

        match response.bytes().await {
            Ok(body) if body.is_empty() => FetchResult::EmptyBody,
            Ok(body) => FetchResult::Success(body.to_vec()),
            Err(e) => FetchResult::TransportError(e.to_string()),
        }
    }

    /// Finds and hashes the favicon of `target`.
    ///
    /// `favicon_url` is the normalized form of `target`. If it cannot be
    /// fetched the HTML of `target` is parsed for an icon link instead.
    pub async fn resolve(&self, target: &str, favicon_url: &str) -> Result<Resolution, FaviconError> {
        match self.fetch(favicon_url).await {
            FetchResult::Success(body) => {
                return Ok(Resolution {
                    favicon_url: favicon_url.to_string(),
                    hash: favicon_hash(&body),
                    source: ResolutionSource::Direct,
                });
            }
            FetchResult::NotFound(status) => {
                debug!("favicon not found for url {} (status {})", favicon_url, status);
            }
            FetchResult::EmptyBody => {
                debug!("empty favicon body for url {}", favicon_url);
            }
            FetchResult::TransportError(e) => {
                warn!("Failed to fetch {}: {}", favicon_url, e);
            }
        }

        debug!("Fallback to HTML parsing for {}", target);
        self.resolve_from_html(target).await
    }

    async fn resolve_from_html(&self, target: &str) -> Result<Resolution, FaviconError> {
        let page = page_url(target)?;

        let response = self.client.get(page.clone()).send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(FaviconError::HtmlNotFetched(status.as_u16()));
        }

        let html = response.text().await?;
        let href = find_icon_href(&html).ok_or(FaviconError::FaviconLinkTagNotFound)?;

        if href.starts_with("data:image") {
            let icon = decode_data_uri(&href)?;
            return Ok(Resolution {
                hash: favicon_hash(&icon),
                favicon_url: href,
                source: ResolutionSource::DataUri,
            });
        }

        let icon_url = resolve_reference(&page, &href);
        match self.fetch(&icon_url).await {
            FetchResult::Success(body) => Ok(Resolution {
                hash: favicon_hash(&body),
                favicon_url: icon_url,
                source: ResolutionSource::LinkTag,
            }),
            FetchResult::NotFound(_) => Err(FaviconError::FaviconNotFound),
            FetchResult::EmptyBody => Err(FaviconError::EmptyBody),
            FetchResult::TransportError(e) => Err(FaviconError::Transport(e)),
        }
    }
}

/// Returns the `href` of the first `<link>` whose `rel` mentions "icon".
///
/// Matching is case-insensitive, so `Shortcut Icon`, `icon` and
/// `apple-touch-icon` all qualify. Links without an `href` are skipped.
pub fn find_icon_href(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("link").ok()?;

    document.select(&selector).find_map(|link| {
        let rel = link.value().attr("rel")?;
        let href = link.value().attr("href")?.trim();

        (rel.to_ascii_lowercase().contains("icon") && !href.is_empty()).then(|| href.to_string())
    })
}

/// Decodes the Base64 payload of a `data:image/...;base64,<payload>` URI.
pub fn decode_data_uri(uri: &str) -> Result<Vec<u8>, FaviconError> {
    let (_, payload) = uri
        .split_once(',')
        .ok_or_else(|| FaviconError::InvalidDataUri("missing ',' separator".to_string()))?;

    let payload: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();

    STANDARD
        .decode(payload)
        .map_err(|e| FaviconError::InvalidDataUri(e.to_string()))
}
