use crate::UrlError;
use url::Url;

/// Normalizes a page URL for comparison
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Require an HTTP or HTTPS scheme and a host
/// 3. Remove the fragment
/// 4. Remove a trailing slash from the path (except for root /)
///
/// Query strings are kept verbatim since listing pages differ only by them.
///
/// # Examples
///
/// ```
/// use forum_crawler::url::normalize_url;
///
/// let url = normalize_url("https://forum.example.com/viewforum/5/#top").unwrap();
/// assert_eq!(url.as_str(), "https://forum.example.com/viewforum/5");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingDomain);
    }

    url.set_fragment(None);

    let path = url.path();
    if path.len() > 1 && path.ends_with('/') {
        let trimmed = path.trim_end_matches('/').to_string();
        url.set_path(if trimmed.is_empty() { "/" } else { &trimmed });
    }

    Ok(url)
}

/// Returns true when both strings address the same page
///
/// Falls back to comparing the raw strings without fragments when either
/// side cannot be parsed.
pub fn same_page(a: &str, b: &str) -> bool {
    match (normalize_url(a), normalize_url(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => strip_fragment(a) == strip_fragment(b),
    }
}

fn strip_fragment(url: &str) -> &str {
    let url = url.trim();
    url.split_once('#').map_or(url, |(head, _)| head)
}
