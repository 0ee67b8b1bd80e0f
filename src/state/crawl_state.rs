//! Crawl state definitions for one forum traversal
//!
//! A traversal moves PageFetch -> ListExtract -> TopicLoop -> PageAdvance and
//! back to PageFetch until it reaches Done.
use crate::extract::Topic;
use crate::output::CrawlResult;
use crate::url::normalize_url;
use std::collections::HashSet;
use std::fmt;

/// Why the traversal of a forum ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopReason {
    /// The listing page could not be fetched
    FetchFailed,

    /// No topics were found on the listing page
    NoTopics,

    /// Topics were found but none carry today's date tag
    NoDailyTopics,

    /// The listing page has no next page link
    NoNextPage,

    /// The configured page budget is used up
    PageLimit,

    /// The next page link leads to a page already visited
    RepeatedPage,
}

impl StopReason {
    /// Returns true if the traversal ended because of a failure
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::FetchFailed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FetchFailed => "fetch_failed",
            Self::NoTopics => "no_topics",
            Self::NoDailyTopics => "no_daily_topics",
            Self::NoNextPage => "no_next_page",
            Self::PageLimit => "page_limit",
            Self::RepeatedPage => "repeated_page",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current phase of a forum traversal
///
/// Phases after `PageFetch` carry the listing page markup they work on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlPhase {
    /// The current listing page must be fetched
    PageFetch,

    /// Topics must be discovered on the fetched page
    ListExtract { html: String },

    /// Topics are being visited
    TopicLoop { html: String, topics: Vec<Topic> },

    /// The next listing page must be located
    PageAdvance { html: String },

    /// Traversal finished
    Done(StopReason),
}

impl CrawlPhase {
    /// Returns true if no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done(_))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::PageFetch => "page_fetch",
            Self::ListExtract { .. } => "list_extract",
            Self::TopicLoop { .. } => "topic_loop",
            Self::PageAdvance { .. } => "page_advance",
            Self::Done(_) => "done",
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Done(reason) => write!(f, "done ({})", reason),
            phase => f.write_str(phase.name()),
        }
    }
}

/// Current listing page plus the page counter
///
/// The counter starts at 1 and only moves forward; a page whose URL was
/// already visited is never entered again.
#[derive(Debug, Clone)]
pub struct PageCursor {
    url: String,
    page: u32,
    max_pages: u32,
    visited: HashSet<String>,
}

impl PageCursor {
    pub fn new(start_url: impl Into<String>, max_pages: u32) -> Self {
        let url = start_url.into();
        let mut visited = HashSet::new();
        visited.insert(visit_key(&url));

        Self {
            url,
            page: 1,
            max_pages,
            visited,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// 1-based number of the current page
    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn max_pages(&self) -> u32 {
        self.max_pages
    }

    /// Moves to `next`, or explains why the traversal must stop instead
    pub fn advance(&mut self, next: &str) -> Result<(), StopReason> {
        if self.page >= self.max_pages {
            return Err(StopReason::PageLimit);
        }

        if !self.visited.insert(visit_key(next)) {
            return Err(StopReason::RepeatedPage);
        }

        self.url = next.to_string();
        self.page += 1;
        Ok(())
    }
}

fn visit_key(url: &str) -> String {
    normalize_url(url)
        .map(String::from)
        .unwrap_or_else(|_| url.trim().to_string())
}

/// Complete state of one forum traversal
#[derive(Debug, Clone)]
pub struct ForumCrawl {
    pub cursor: PageCursor,
    pub phase: CrawlPhase,
    pub result: CrawlResult,
}

impl ForumCrawl {
    pub fn new(start_url: impl Into<String>, max_pages: u32) -> Self {
        Self {
            cursor: PageCursor::new(start_url, max_pages),
            phase: CrawlPhase::PageFetch,
            result: CrawlResult::default(),
        }
    }

    pub fn is_done(&self) -> bool {
        self.phase.is_terminal()
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        match self.phase {
            CrawlPhase::Done(reason) => Some(reason),
            _ => None,
        }
    }
}
