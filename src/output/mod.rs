//! Output module for persisting topic content and reporting results
//!
//! This module handles:
//! - Saving images and text below the configured save roots
//! - Accumulating crawl counters per forum, mode and run
//! - Printing the end-of-run summary

mod files;
pub mod stats;
mod traits;

pub use files::{image_extension, sanitize_file_name, FileSaver};
pub use stats::{print_summary, CrawlResult, ForumReport, ModeReport, RunSummary};
pub use traits::{ContentSink, OutputError, OutputResult};
