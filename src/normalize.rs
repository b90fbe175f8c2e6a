//! Target normalization and favicon URL handling.

use crate::FaviconError;
use url::Url;

/// Targets shorter than this cannot name a usable host.
pub const MIN_URL_LENGTH: usize = 4;

/// Icon file appended to paths that do not already point at one.
pub const DEFAULT_FAVICON: &str = "favicon.ico";

const DEFAULT_SCHEME_PREFIX: &str = "http://";

/// Prefixes `http://` when the target carries no scheme separator.
pub fn with_scheme(raw: &str) -> String {
    if raw.contains("://") {
        raw.to_string()
    } else {
        format!("{DEFAULT_SCHEME_PREFIX}{raw}")
    }
}

/// Turns a raw target into the URL of its conventional favicon.
///
/// Query strings and fragments are dropped. A path already ending in `.ico`
/// is kept as is, so normalizing twice is a no-op.
///
/// # Examples
///
/// ```rust
/// use favirecon::normalize;
///
/// assert_eq!(normalize("example.com").unwrap(), "http://example.com/favicon.ico");
/// assert_eq!(
///     normalize("https://example.com/app?x=1").unwrap(),
///     "https://example.com/app/favicon.ico"
/// );
/// ```
pub fn normalize(raw: &str) -> Result<String, FaviconError> {
    if raw.len() < MIN_URL_LENGTH {
        return Err(FaviconError::MalformedInput(raw.to_string()));
    }

    let parsed = Url::parse(&with_scheme(raw))?;

    let mut path = parsed.path().to_string();
    if !path.ends_with(".ico") {
        if !path.ends_with('/') {
            path.push('/');
        }
        path.push_str(DEFAULT_FAVICON);
    }

    let host = parsed
        .host_str()
        .ok_or_else(|| FaviconError::MalformedInput(raw.to_string()))?;

    Ok(match parsed.port() {
        Some(port) => format!("{}://{}:{}{}", parsed.scheme(), host, port, path),
        None => format!("{}://{}{}", parsed.scheme(), host, path),
    })
}

/// URL of the page fetched when the direct favicon lookup fails.
pub fn page_url(raw: &str) -> Result<Url, FaviconError> {
    Ok(Url::parse(&with_scheme(raw))?)
}

/// Resolves an `href` against the page it was found on.
///
/// Relative references inherit scheme, host and path from `base`; absolute
/// ones replace it entirely. An unresolvable reference is returned unchanged.
pub fn resolve_reference(base: &Url, href: &str) -> String {
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_rejects_short_input() {
        assert!(matches!(normalize(""), Err(FaviconError::MalformedInput(_))));
        assert!(matches!(normalize("a.b"), Err(FaviconError::MalformedInput(_))));
    }

    #[test]
    fn test_normalize_bare_host() {
        assert_eq!(normalize("example.com").unwrap(), "http://example.com/favicon.ico");
        assert_eq!(normalize("example.com/").unwrap(), "http://example.com/favicon.ico");
    }

    #[test]
    fn test_normalize_paths() {
        assert_eq!(
            normalize("http://example.com/test").unwrap(),
            "http://example.com/test/favicon.ico"
        );
        assert_eq!(
            normalize("http://example.com/test/").unwrap(),
            "http://example.com/test/favicon.ico"
        );
        assert_eq!(
            normalize("http://example.com/test/favicon.ico").unwrap(),
            "http://example.com/test/favicon.ico"
        );
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = normalize("https://example.com:8443/panel/").unwrap();
        assert_eq!(once, "https://example.com:8443/panel/favicon.ico");
        assert_eq!(normalize(&once).unwrap(), once);
    }

    #[test]
    fn test_normalize_drops_query_and_fragment() {
        assert_eq!(
            normalize("https://example.com/login?next=/admin#top").unwrap(),
            "https://example.com/login/favicon.ico"
        );
    }

    #[test]
    fn test_normalize_ip_target() {
        assert_eq!(normalize("10.0.0.1").unwrap(), "http://10.0.0.1/favicon.ico");
    }

    #[test]
    fn test_normalize_parse_error() {
        assert!(matches!(normalize("http://exa mple.com"), Err(FaviconError::InvalidUrl(_))));
    }

    #[test]
    fn test_resolve_reference() {
        let base = page_url("https://example.com/app/index.html").unwrap();
        assert_eq!(resolve_reference(&base, "/i.png"), "https://example.com/i.png");
        assert_eq!(resolve_reference(&base, "img/i.png"), "https://example.com/app/img/i.png");
        assert_eq!(
            resolve_reference(&base, "https://cdn.example.net/i.ico"),
            "https://cdn.example.net/i.ico"
        );
        assert_eq!(
            resolve_reference(&base, "//cdn.example.net/i.ico"),
            "https://cdn.example.net/i.ico"
        );
    }

    #[test]
    fn test_page_url_adds_scheme() {
        assert_eq!(page_url("example.com").unwrap().as_str(), "http://example.com/");
    }
}
