use crate::UrlError;
use url::{ParseError, Url};

/// Parses a site origin such as `https://forum.example.com`
pub fn parse_origin(origin: &str) -> Result<Url, UrlError> {
    let url = Url::parse(origin.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingDomain);
    }

    Ok(url)
}

/// Resolves an href found in markup against the site origin
///
/// Absolute HTTP(S) URLs are returned unchanged. Returns `None` for empty
/// hrefs and for anything that does not end up as an HTTP(S) URL.
pub fn resolve_from_origin(origin: &Url, href: &str) -> Option<String> {
    resolve(origin, href)
}

/// Resolves an href found on `current`
///
/// Root-relative hrefs go against the origin, other relative hrefs against the
/// current page.
pub fn resolve_from_page(origin: &Url, current: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.starts_with('/') {
        return resolve(origin, href);
    }

    match Url::parse(current) {
        Ok(base) => resolve(&base, href),
        Err(_) => resolve(origin, href),
    }
}

fn resolve(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    match Url::parse(href) {
        Ok(absolute) if is_http(&absolute) => Some(href.to_string()),
        Ok(_) => None,
        Err(ParseError::RelativeUrlWithoutBase) => {
            let joined = base.join(href).ok()?;
            is_http(&joined).then(|| joined.to_string())
        }
        Err(_) => None,
    }
}

fn is_http(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}
