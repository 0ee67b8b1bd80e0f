//! Content sink trait and output errors
//!
//! A sink persists what the extractor produced for one topic. Failures are
//! reported through counts and flags so a bad item never stops the crawl.

use crate::crawler::PageFetcher;
use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Destination for extracted topic content
#[async_trait]
pub trait ContentSink: Send + Sync {
    /// Downloads the images of one topic
    ///
    /// # Arguments
    ///
    /// * `title` - Topic title, used to name the topic directory
    /// * `urls` - Absolute image URLs in page order
    /// * `fetcher` - Fetcher performing the downloads
    ///
    /// # Returns
    ///
    /// The number of images saved; failed downloads are logged and skipped
    async fn save_images(&self, title: &str, urls: &[String], fetcher: &dyn PageFetcher) -> usize;

    /// Writes the text body of one topic, returning true on success
    async fn save_text(&self, title: &str, content: &str) -> bool;
}
