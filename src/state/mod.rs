//! State module for tracking crawl progress
//!
//! The traversal of one forum is an explicit value threaded through the
//! coordinator loop, so every transition can be exercised without a network.
//!
//! # Components
//!
//! - `CrawlPhase`: Where the traversal of the current listing page is
//! - `PageCursor`: The current listing page and the page budget
//! - `ForumCrawl`: Phase, cursor and counters of one forum traversal

mod crawl_state;

// Re-export main types
pub use crawl_state::{CrawlPhase, ForumCrawl, PageCursor, StopReason};
