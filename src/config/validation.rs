use crate::config::types::{Config, CrawlConfig, ForumTarget, RequestConfig, SavePaths};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site(config)?;
    validate_request_config(&config.request)?;
    validate_crawl_config(&config.crawl)?;
    validate_save_paths(&config.save_paths)?;
    validate_forums("picture-forums", &config.picture_forums)?;
    validate_forums("novel-forums", &config.novel_forums)?;
    Ok(())
}

/// Validates the site location and path markers
fn validate_site(config: &Config) -> Result<(), ConfigError> {
    if config.site_scheme != "http" && config.site_scheme != "https" {
        return Err(ConfigError::Validation(format!(
            "site-scheme must be 'http' or 'https', got '{}'",
            config.site_scheme
        )));
    }

    let domain = config.effective_domain();
    if domain.is_empty() {
        return Err(ConfigError::Validation(
            "site-domain cannot be empty".to_string(),
        ));
    }

    if domain.contains('/') || domain.chars().any(char::is_whitespace) {
        return Err(ConfigError::Validation(format!(
            "site-domain must be a bare host, got '{}'",
            domain
        )));
    }

    Url::parse(&config.origin())
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid site origin: {}", e)))?;

    if config.topic_path_marker.is_empty() {
        return Err(ConfigError::Validation(
            "topic-path-marker cannot be empty".to_string(),
        ));
    }

    if config.forum_path_marker.is_empty() {
        return Err(ConfigError::Validation(
            "forum-path-marker cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates request configuration
fn validate_request_config(config: &RequestConfig) -> Result<(), ConfigError> {
    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout-secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    for (name, proxy) in [
        ("http-proxy", &config.http_proxy),
        ("https-proxy", &config.https_proxy),
    ] {
        if let Some(proxy) = proxy {
            Url::parse(proxy)
                .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {}: {}", name, e)))?;
        }
    }

    Ok(())
}

/// Validates traversal limits
fn validate_crawl_config(config: &CrawlConfig) -> Result<(), ConfigError> {
    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max-pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if config.retry_times < 1 {
        return Err(ConfigError::Validation(format!(
            "retry-times must be >= 1, got {}",
            config.retry_times
        )));
    }

    Ok(())
}

fn validate_save_paths(paths: &SavePaths) -> Result<(), ConfigError> {
    if paths.picture.as_os_str().is_empty() || paths.novel.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "save-paths entries cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validates forum targets of one list
fn validate_forums(list: &str, forums: &[ForumTarget]) -> Result<(), ConfigError> {
    for forum in forums {
        if forum.id.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "Forum '{}' in {} has an empty id",
                forum.name, list
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;

    fn base_config() -> Config {
        parse_config(
            r#"
site-domain = "forum.example.com"

[[novel-forums]]
id = "40"
name = "Stories"
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_valid_config() {
        assert!(validate(&base_config()).is_ok());
    }

    #[test]
    fn test_rejects_bad_scheme() {
        let mut config = base_config();
        config.site_scheme = "ftp".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_rejects_domain_with_path() {
        let mut config = base_config();
        config.site_domain = "forum.example.com/board".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_rejects_empty_markers() {
        let mut config = base_config();
        config.topic_path_marker.clear();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_rejects_zero_retries() {
        let mut config = base_config();
        config.crawl.retry_times = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_rejects_malformed_proxy() {
        let mut config = base_config();
        config.request.https_proxy = Some("not a url".to_string());
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_rejects_empty_forum_id() {
        let mut config = base_config();
        config.novel_forums[0].id = " ".to_string();
        assert!(validate(&config).is_err());
    }
}
