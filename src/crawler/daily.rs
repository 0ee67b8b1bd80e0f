//! Restricting a crawl to topics posted on the run date
//!
//! Daily topics carry a `[MM-DD]` tag in their title. Only the first tag of a
//! title is considered.

use crate::extract::Topic;
use crate::CrawlerError;
use chrono::NaiveDate;
use regex::Regex;

#[derive(Debug, Clone)]
pub struct DailyFilter {
    pattern: Regex,
    today: String,
}

impl DailyFilter {
    pub fn new(run_date: NaiveDate) -> Result<Self, CrawlerError> {
        Ok(Self {
            pattern: Regex::new(r"\[(\d{2}-\d{2})\]")?,
            today: run_date.format("%m-%d").to_string(),
        })
    }

    /// The `MM-DD` tag titles must carry
    pub fn today(&self) -> &str {
        &self.today
    }

    pub fn matches(&self, title: &str) -> bool {
        self.pattern
            .captures(title)
            .and_then(|caps| caps.get(1))
            .is_some_and(|tag| tag.as_str() == self.today)
    }

    /// Keeps the topics tagged with the run date, in order
    pub fn apply(&self, topics: Vec<Topic>) -> Vec<Topic> {
        topics
            .into_iter()
            .filter(|topic| self.matches(&topic.title))
            .collect()
    }
}
