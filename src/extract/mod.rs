//! HTML extraction for forum pages of unknown layout
//!
//! The [`Extractor`] infers three things from raw markup using ranked
//! fallback heuristics:
//! - the topics listed on a forum page ([`Extractor::extract_topics`])
//! - the body of a topic page ([`Extractor::parse_topic_page`])
//! - the link to the next listing page ([`Extractor::next_page_url`])
//!
//! Extraction never fails: a structural miss falls through to the next rule
//! and finally to an empty result. Documents are parsed per call and never
//! held across an await point.

mod content;
mod pagination;
mod rules;
mod text;
mod topics;

use crate::config::Config;
use crate::UrlResult;
use url::Url;

pub use rules::{RankedRules, SelectorChain, SelectorRule};
pub use text::{block_text, compact_text};

/// Structural selectors for the list items of a forum page
pub const LIST_ITEM_SELECTORS: &[&str] = &[
    ".forumbg li.row",
    ".thread_list li",
    ".topiclist.topics li",
    "#threadslist li",
    ".list_thread li",
    "ul.topics li",
    "table.forum-table tr",
];

/// Containers searched for images in picture mode
pub const PICTURE_CONTAINER_SELECTORS: &[&str] = &[
    ".content",
    ".postbody",
    ".topic-content",
    ".post-content",
    ".thread-content",
    "#post_content",
    ".message-content",
];

/// Containers holding the text body in novel mode
pub const NOVEL_CONTAINER_SELECTORS: &[&str] = &[
    ".postbody",
    ".content",
    ".topic-content",
    ".post-content",
    ".thread-content",
    "#post_content",
    ".message-content",
    ".entry-content",
    ".post-text",
    ".text",
    ".message",
];

/// A discussion thread discovered on a listing page
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Topic {
    pub title: String,
    /// Absolute URL of the topic page
    pub url: String,
}

/// What was extracted from a topic page; only the field for the mode is set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopicContent {
    pub content: String,
    pub images: Vec<String>,
}

impl TopicContent {
    pub fn is_empty(&self) -> bool {
        self.content.is_empty() && self.images.is_empty()
    }
}

/// Heuristic extractor bound to one site
#[derive(Debug)]
pub struct Extractor {
    origin: Url,
    topic_marker: String,
    forum_marker: String,
    list_items: SelectorChain,
    title_anchors: SelectorChain,
    picture_containers: SelectorChain,
    novel_containers: SelectorChain,
    links: SelectorChain,
    images: SelectorChain,
    blocks: SelectorChain,
    pagination: RankedRules<String>,
}

impl Extractor {
    /// Creates an extractor for the site at `origin`
    ///
    /// # Arguments
    ///
    /// * `origin` - Scheme and host used to resolve root-relative links
    /// * `topic_marker` - Substring every topic URL contains
    /// * `forum_marker` - Substring of listing page URLs, used by the pagination fallback
    pub fn new(origin: Url, topic_marker: &str, forum_marker: &str) -> Self {
        let title_anchors = SelectorChain::compile(&[
            "a.topictitle".to_string(),
            "a.threadtitle".to_string(),
            format!("a[href*=\"{}\"]", escape_attr(topic_marker)),
            ".topic-title a".to_string(),
            ".thread-title a".to_string(),
            "h3 a".to_string(),
            "h2 a".to_string(),
        ]);

        Self {
            pagination: pagination::rules(forum_marker),
            origin,
            topic_marker: topic_marker.to_string(),
            forum_marker: forum_marker.to_string(),
            list_items: SelectorChain::compile(LIST_ITEM_SELECTORS),
            title_anchors,
            picture_containers: SelectorChain::compile(PICTURE_CONTAINER_SELECTORS),
            novel_containers: SelectorChain::compile(NOVEL_CONTAINER_SELECTORS),
            links: SelectorChain::compile(&["a[href]"]),
            images: SelectorChain::compile(&["img"]),
            blocks: SelectorChain::compile(&["div, p"]),
        }
    }

    /// Creates an extractor for the configured site
    pub fn from_config(config: &Config) -> UrlResult<Self> {
        let origin = crate::url::parse_origin(&config.origin())?;
        Ok(Self::new(
            origin,
            &config.topic_path_marker,
            &config.forum_path_marker,
        ))
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    pub fn topic_marker(&self) -> &str {
        &self.topic_marker
    }

    pub fn forum_marker(&self) -> &str {
        &self.forum_marker
    }
}

fn escape_attr(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
