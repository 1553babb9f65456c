use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

static DATA_URI_FORMAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^data:image/(\w+)").expect("valid regex"));

static EXTENSION_FORMAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.([a-zA-Z0-9]+)(?:[?#]|$)").expect("valid regex"));

/// Scheme+host+port of a page, used as the base for relative-URL resolution.
pub fn page_origin(page_url: &str) -> Option<String> {
    let parsed = Url::parse(page_url).ok()?;
    let host = parsed.host_str()?;
    let origin = match parsed.port() {
        Some(port) => format!("{}://{}:{}", parsed.scheme(), host, port),
        None => format!("{}://{}", parsed.scheme(), host),
    };
    Some(origin)
}

/// Convert a relative/partial asset reference into an absolute URL.
///
/// The rules are fixed and order-sensitive:
/// - already-absolute `http`/`https` URLs pass through unchanged
/// - `data:` URIs pass through unchanged
/// - protocol-relative `//host/...` gets an `https:` prefix
/// - root-relative `/path` gets the page origin prefixed
/// - anything else gets `origin + "/"` prefixed
///
/// Resolution is idempotent on absolute inputs. Empty input yields `None`.
pub fn resolve_url(raw: &str, origin: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if raw.starts_with("data:") {
        return Some(raw.to_string());
    }
    if raw.starts_with("http://") || raw.starts_with("https://") {
        return Some(raw.to_string());
    }
    if let Some(rest) = raw.strip_prefix("//") {
        return Some(format!("https://{}", rest));
    }
    if raw.starts_with('/') {
        return Some(format!("{}{}", origin, raw));
    }
    Some(format!("{}/{}", origin, raw))
}

/// Infer a declared image format from a resolved source URL.
///
/// Data-URIs report the MIME subtype after `image/`; everything else reports
/// the lower-cased file extension after the last `.`, ignoring query strings
/// and fragments. `"unknown"` when neither pattern matches.
pub fn infer_format(source_url: &str) -> String {
    if source_url.starts_with("data:") {
        return DATA_URI_FORMAT
            .captures(source_url)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_lowercase())
            .unwrap_or_else(|| "unknown".to_string());
    }
    EXTENSION_FORMAT
        .captures(source_url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_lowercase())
        .unwrap_or_else(|| "unknown".to_string())
}

pub fn is_inline_data(source_url: &str) -> bool {
    source_url.starts_with("data:")
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGIN: &str = "https://site.test";

    #[test]
    fn test_absolute_urls_unchanged() {
        let url = "https://cdn.example.com/a.png";
        assert_eq!(resolve_url(url, ORIGIN).unwrap(), url);
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let once = resolve_url("/logo.png", ORIGIN).unwrap();
        let twice = resolve_url(&once, ORIGIN).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_protocol_relative() {
        assert_eq!(
            resolve_url("//cdn.example.com/a.png", ORIGIN).unwrap(),
            "https://cdn.example.com/a.png"
        );
    }

    #[test]
    fn test_root_relative() {
        assert_eq!(
            resolve_url("/logo.png", ORIGIN).unwrap(),
            "https://site.test/logo.png"
        );
    }

    #[test]
    fn test_bare_relative() {
        assert_eq!(
            resolve_url("img/banner.jpg", ORIGIN).unwrap(),
            "https://site.test/img/banner.jpg"
        );
    }

    #[test]
    fn test_data_uri_unchanged() {
        let uri = "data:image/png;base64,AAAA";
        assert_eq!(resolve_url(uri, ORIGIN).unwrap(), uri);
        assert!(is_inline_data(uri));
    }

    #[test]
    fn test_empty_input() {
        assert!(resolve_url("", ORIGIN).is_none());
        assert!(resolve_url("   ", ORIGIN).is_none());
    }

    #[test]
    fn test_format_from_data_uri() {
        assert_eq!(infer_format("data:image/webp;base64,AAAA"), "webp");
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(infer_format("https://x.com/pic.JPG?v=2"), "jpg");
        assert_eq!(infer_format("https://x.com/a/b.svg"), "svg");
    }

    #[test]
    fn test_format_unknown() {
        assert_eq!(infer_format("https://x.com/noext"), "unknown");
    }

    #[test]
    fn test_page_origin() {
        assert_eq!(
            page_origin("https://site.test/some/page?q=1").unwrap(),
            "https://site.test"
        );
        assert_eq!(
            page_origin("http://localhost:8080/x").unwrap(),
            "http://localhost:8080"
        );
        assert!(page_origin("not a url").is_none());
    }
}
