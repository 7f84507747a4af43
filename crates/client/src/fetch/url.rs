//! URL parsing and reference resolution.
//!
//! URLs are deliberately not normalized: the page cache key is the digest
//! of the URL text, so rewriting it would orphan cached pages.

/// Error type for URL parsing failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl From<UrlError> for savor_core::Error {
    fn from(err: UrlError) -> Self {
        savor_core::Error::InvalidUrl(err.to_string())
    }
}

/// Parse an absolute http(s) URL after trimming surrounding whitespace.
pub fn parse_url(input: &str) -> Result<url::Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let parsed = url::Url::parse(trimmed).map_err(|e| UrlError::InvalidUrl(format!("{trimmed}: {e}")))?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }
}

/// Resolve `reference` (absolute or relative) against `base`.
pub fn resolve(base: &url::Url, reference: &str) -> Result<url::Url, UrlError> {
    let reference = reference.trim();
    if reference.is_empty() {
        return Err(UrlError::Empty);
    }

    let joined = base
        .join(reference)
        .map_err(|e| UrlError::InvalidUrl(format!("{reference}: {e}")))?;

    match joined.scheme() {
        "http" | "https" => Ok(joined),
        scheme => Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic() {
        let url = parse_url("https://tabelog.com/en/rstLst/1/").unwrap();
        assert_eq!(url.scheme(), "https");
        assert_eq!(url.host_str(), Some("tabelog.com"));
    }

    #[test]
    fn test_parse_trim_whitespace() {
        let url = parse_url("  http://example.com/list  ").unwrap();
        assert_eq!(url.as_str(), "http://example.com/list");
    }

    #[test]
    fn test_parse_keeps_query() {
        let url = parse_url("http://tabelog.com/en/rstLst/1/?lat=35.46&lon=139.61").unwrap();
        assert_eq!(url.query(), Some("lat=35.46&lon=139.61"));
    }

    #[test]
    fn test_parse_requires_scheme() {
        assert!(matches!(parse_url("example.com/list"), Err(UrlError::InvalidUrl(_))));
    }

    #[test]
    fn test_parse_unsupported_scheme() {
        let result = parse_url("file:///etc/passwd");
        assert!(matches!(result, Err(UrlError::UnsupportedScheme(_))));
    }

    #[test]
    fn test_parse_empty() {
        assert!(matches!(parse_url(""), Err(UrlError::Empty)));
        assert!(matches!(parse_url("   "), Err(UrlError::Empty)));
    }

    #[test]
    fn test_resolve_relative() {
        let base = url::Url::parse("https://tabelog.com/en/rstLst/1/").unwrap();
        assert_eq!(resolve(&base, "../2/").unwrap().as_str(), "https://tabelog.com/en/rstLst/2/");
        assert_eq!(resolve(&base, "/en/kanagawa/A1401/").unwrap().as_str(), "https://tabelog.com/en/kanagawa/A1401/");
    }

    #[test]
    fn test_resolve_absolute() {
        let base = url::Url::parse("https://tabelog.com/en/rstLst/1/").unwrap();
        let url = resolve(&base, "https://www.tripadvisor.com/Restaurant_Review-g1").unwrap();
        assert_eq!(url.host_str(), Some("www.tripadvisor.com"));
    }

    #[test]
    fn test_resolve_rejects_javascript() {
        let base = url::Url::parse("https://tabelog.com/").unwrap();
        assert!(matches!(resolve(&base, "javascript:void(0)"), Err(UrlError::UnsupportedScheme(_))));
    }

    #[test]
    fn test_resolve_empty() {
        let base = url::Url::parse("https://tabelog.com/").unwrap();
        assert!(matches!(resolve(&base, "  "), Err(UrlError::Empty)));
    }
}
