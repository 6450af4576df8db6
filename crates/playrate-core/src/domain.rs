//! Page URL to settings-domain mapping.

use url::Url;

/// Lower-case host of `page_url`, used as the per-site settings key.
///
/// Returns `None` when the URL does not parse or has no host
/// (`about:blank`, `data:` URLs, files).
pub fn domain_of(page_url: &str) -> Option<String> {
    let parsed = Url::parse(page_url).ok()?;
    let host = parsed.host_str()?;
    if host.is_empty() {
        return None;
    }
    Some(host.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn https_host() {
        assert_eq!(
            domain_of("https://www.example.com/watch?v=1").as_deref(),
            Some("www.example.com")
        );
    }

    #[test]
    fn host_is_lowercased() {
        assert_eq!(domain_of("https://Example.COM/").as_deref(), Some("example.com"));
    }

    #[test]
    fn port_is_dropped() {
        assert_eq!(domain_of("http://localhost:8080/a").as_deref(), Some("localhost"));
    }

    #[test]
    fn no_host() {
        assert_eq!(domain_of("about:blank"), None);
        assert_eq!(domain_of("file:///tmp/video.mp4"), None);
    }

    #[test]
    fn unparseable() {
        assert_eq!(domain_of("not a url"), None);
        assert_eq!(domain_of(""), None);
    }
}
