//! Crawl counters and the end-of-run summary
//!
//! Counters are accumulated per forum, rolled up per mode and for the whole
//! run, and printed once the run finishes.

use crate::config::CrawlMode;
use crate::state::StopReason;
use chrono::{DateTime, Utc};
use std::ops::AddAssign;

/// Counters for one unit of work
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlResult {
    /// Topics whose page fetch was attempted
    pub topics_processed: u64,

    /// Images or text files written
    pub items_saved: u64,
}

impl AddAssign for CrawlResult {
    fn add_assign(&mut self, other: Self) {
        self.topics_processed += other.topics_processed;
        self.items_saved += other.items_saved;
    }
}

/// Outcome of one forum traversal
#[derive(Debug, Clone)]
pub struct ForumReport {
    pub forum_id: String,
    pub forum_name: String,

    /// Listing pages visited
    pub pages: u32,

    pub result: CrawlResult,

    pub stop_reason: StopReason,
}

/// Outcome of one crawl mode
#[derive(Debug, Clone)]
pub struct ModeReport {
    pub mode: CrawlMode,
    pub forums: Vec<ForumReport>,
}

impl ModeReport {
    pub fn new(mode: CrawlMode) -> Self {
        Self {
            mode,
            forums: Vec::new(),
        }
    }

    /// Counters summed over every forum of the mode
    pub fn total(&self) -> CrawlResult {
        let mut total = CrawlResult::default();
        for forum in &self.forums {
            total += forum.result;
        }
        total
    }
}

/// Everything a run did
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub daily: bool,
    pub modes: Vec<ModeReport>,
}

impl RunSummary {
    pub fn new(daily: bool) -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            daily,
            modes: Vec::new(),
        }
    }

    /// Marks the run as finished
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Counters summed over every mode
    pub fn total(&self) -> CrawlResult {
        let mut total = CrawlResult::default();
        for mode in &self.modes {
            total += mode.total();
        }
        total
    }

    /// Run duration in seconds, if finished
    pub fn duration_seconds(&self) -> Option<i64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_seconds())
    }
}

/// Prints the run summary to stdout in a formatted manner
pub fn print_summary(summary: &RunSummary) {
    println!("=== Crawl Summary ===\n");

    for mode in &summary.modes {
        println!("Mode: {}", mode.mode);
        if mode.forums.is_empty() {
            println!("  (no forums configured)");
        }

        for forum in &mode.forums {
            println!(
                "  {} [{}]: {} topics, {} saved, {} pages ({})",
                forum.forum_name,
                forum.forum_id,
                forum.result.topics_processed,
                forum.result.items_saved,
                forum.pages,
                forum.stop_reason
            );
        }

        let total = mode.total();
        println!(
            "  Total: {} topics, {} saved",
            total.topics_processed, total.items_saved
        );
        println!();
    }

    let total = summary.total();
    println!("Overall:");
    println!("  Daily mode: {}", summary.daily);
    println!("  Topics processed: {}", total.topics_processed);
    println!("  Items saved: {}", total.items_saved);
    if let Some(seconds) = summary.duration_seconds() {
        println!("  Duration: {}s", seconds);
    }
}
