use chrono::NaiveDate;
use clap::ValueEnum;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Default browser-like user agent sent with every request
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Which kind of content a crawl collects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CrawlMode {
    /// Download images embedded in topics
    Picture,
    /// Save the long-form text body of topics
    Novel,
    /// Run the picture pass, then the novel pass
    #[default]
    All,
}

impl CrawlMode {
    /// Expands the mode into the concrete passes a run performs, in order
    pub fn passes(self) -> Vec<CrawlMode> {
        match self {
            Self::All => vec![Self::Picture, Self::Novel],
            mode => vec![mode],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Picture => "picture",
            Self::Novel => "novel",
            Self::All => "all",
        }
    }
}

impl fmt::Display for CrawlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Mode used when the command line does not override it
    #[serde(default)]
    pub crawl_mode: CrawlMode,

    /// Host (optionally with port) of the forum
    pub site_domain: String,

    /// Mirror hosts; the first entry takes precedence over `site-domain`
    #[serde(default)]
    pub site_domains: Vec<String>,

    /// URL scheme used to build forum and resolved URLs
    #[serde(default = "default_scheme")]
    pub site_scheme: String,

    /// Substring identifying a link as a topic page
    #[serde(default = "default_topic_marker")]
    pub topic_path_marker: String,

    /// Path prefix of forum listing pages, followed by the forum id
    #[serde(default = "default_forum_marker")]
    pub forum_path_marker: String,

    #[serde(default)]
    pub request: RequestConfig,

    #[serde(default)]
    pub crawl: CrawlConfig,

    #[serde(default)]
    pub save_paths: SavePaths,

    #[serde(default)]
    pub picture_forums: Vec<ForumTarget>,

    #[serde(default)]
    pub novel_forums: Vec<ForumTarget>,

    #[serde(default)]
    pub remote_repo: RemoteRepoConfig,
}

impl Config {
    /// The host actually crawled: first mirror if any, else `site-domain`
    pub fn effective_domain(&self) -> &str {
        self.site_domains
            .iter()
            .map(|d| d.trim())
            .find(|d| !d.is_empty())
            .unwrap_or_else(|| self.site_domain.trim())
    }

    /// Scheme plus host, e.g. `https://forum.example.com`
    pub fn origin(&self) -> String {
        format!("{}://{}", self.site_scheme, self.effective_domain())
    }

    /// First listing page of a forum target
    pub fn forum_url(&self, forum: &ForumTarget) -> String {
        format!("{}{}{}", self.origin(), self.forum_path_marker, forum.id)
    }

    /// Forum targets configured for a single crawl pass
    pub fn forums_for(&self, mode: CrawlMode) -> &[ForumTarget] {
        match mode {
            CrawlMode::Picture => &self.picture_forums,
            CrawlMode::Novel => &self.novel_forums,
            CrawlMode::All => &[],
        }
    }
}

fn default_scheme() -> String {
    "https".to_string()
}

fn default_topic_marker() -> String {
    "/viewtopic/".to_string()
}

fn default_forum_marker() -> String {
    "/viewforum/".to_string()
}

/// HTTP request behaviour
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RequestConfig {
    /// Headers sent with every request
    #[serde(default = "default_headers")]
    pub headers: BTreeMap<String, String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Pause after every successful request (milliseconds)
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Ignore proxy settings from the environment
    #[serde(default = "default_true")]
    pub bypass_system_proxy: bool,

    /// Skip TLS certificate verification
    #[serde(default = "default_true")]
    pub accept_invalid_certs: bool,

    /// Explicit proxy for plain HTTP requests
    #[serde(default)]
    pub http_proxy: Option<String>,

    /// Explicit proxy for HTTPS requests
    #[serde(default)]
    pub https_proxy: Option<String>,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            headers: default_headers(),
            timeout_secs: default_timeout_secs(),
            delay_ms: default_delay_ms(),
            bypass_system_proxy: true,
            accept_invalid_certs: true,
            http_proxy: None,
            https_proxy: None,
        }
    }
}

fn default_headers() -> BTreeMap<String, String> {
    BTreeMap::from([("User-Agent".to_string(), DEFAULT_USER_AGENT.to_string())])
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_delay_ms() -> u64 {
    1000
}

fn default_true() -> bool {
    true
}

/// Traversal limits
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CrawlConfig {
    /// Maximum number of listing pages visited per forum
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    /// Attempts per request before giving up
    #[serde(default = "default_retry_times")]
    pub retry_times: u32,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_pages: default_max_pages(),
            retry_times: default_retry_times(),
        }
    }
}

fn default_max_pages() -> u32 {
    5
}

fn default_retry_times() -> u32 {
    3
}

/// Root directories for saved content
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SavePaths {
    pub picture: PathBuf,
    pub novel: PathBuf,
}

impl SavePaths {
    /// Paths for a run; daily runs write below `daily_YYYY-MM-DD`
    pub fn for_run(&self, daily: bool, run_date: NaiveDate) -> SavePaths {
        if !daily {
            return self.clone();
        }

        let prefix = format!("daily_{}", run_date.format("%Y-%m-%d"));
        SavePaths {
            picture: self.picture.join(&prefix),
            novel: self.novel.join(&prefix),
        }
    }

    /// Both roots, picture first
    pub fn roots(&self) -> Vec<PathBuf> {
        vec![self.picture.clone(), self.novel.clone()]
    }
}

impl Default for SavePaths {
    fn default() -> Self {
        Self {
            picture: PathBuf::from("./picture"),
            novel: PathBuf::from("./novel"),
        }
    }
}

/// A forum listing to crawl
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ForumTarget {
    pub id: String,
    pub name: String,
}

/// Optional push of results to a git remote
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RemoteRepoConfig {
    #[serde(default)]
    pub enable: bool,

    #[serde(default)]
    pub url: String,

    #[serde(default = "default_branch")]
    pub branch: String,

    /// Commit author name; identity is left untouched when empty
    #[serde(default)]
    pub username: String,

    /// Commit author email; identity is left untouched when empty
    #[serde(default)]
    pub email: String,
}

impl Default for RemoteRepoConfig {
    fn default() -> Self {
        Self {
            enable: false,
            url: String::new(),
            branch: default_branch(),
            username: String::new(),
            email: String::new(),
        }
    }
}

fn default_branch() -> String {
    "main".to_string()
}
