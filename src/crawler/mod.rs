//! Crawler module for fetching forum pages and driving the traversal
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retries, backoff and downloads
//! - Restricting topics to the run date in daily mode
//! - Overall crawl coordination

mod coordinator;
mod daily;
mod fetcher;

pub use coordinator::{Coordinator, RunOptions};
pub use daily::DailyFilter;
pub use fetcher::{build_http_client, HttpFetcher, PageFetcher};
