//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop that coordinates:
//! - Walking the listing pages of every configured forum
//! - Visiting each discovered topic and persisting its content
//! - Restricting topics to the run date in daily mode
//! - Accumulating counters into the run summary
//!
//! Each forum traversal is a [`ForumCrawl`] value advanced one phase at a time
//! by [`Coordinator::step`].

use crate::config::{Config, CrawlMode, ForumTarget};
use crate::crawler::daily::DailyFilter;
use crate::crawler::fetcher::PageFetcher;
use crate::extract::{Extractor, Topic};
use crate::output::{ContentSink, CrawlResult, ForumReport, ModeReport, RunSummary};
use crate::state::{CrawlPhase, ForumCrawl, StopReason};
use crate::url::normalize_url;
use crate::CrawlerError;
use chrono::{Local, NaiveDate};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Per-run switches that do not come from the configuration file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Only process topics tagged with the run date
    pub daily: bool,

    pub run_date: NaiveDate,
}

impl RunOptions {
    /// Options for a run dated today in local time
    pub fn today(daily: bool) -> Self {
        Self {
            daily,
            run_date: Local::now().date_naive(),
        }
    }
}

/// Main crawler coordinator structure
pub struct Coordinator<F, S> {
    config: Config,
    extractor: Extractor,
    fetcher: F,
    sink: S,
    daily: Option<DailyFilter>,
    options: RunOptions,
}

impl<F: PageFetcher, S: ContentSink> Coordinator<F, S> {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `fetcher` - Source of listing pages, topic pages and images
    /// * `sink` - Destination for extracted content
    /// * `options` - Daily mode and run date
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(CrawlerError)` - The site origin is not a valid URL
    pub fn new(config: Config, fetcher: F, sink: S, options: RunOptions) -> Result<Self, CrawlerError> {
        let extractor = Extractor::from_config(&config)?;
        let daily = if options.daily {
            Some(DailyFilter::new(options.run_date)?)
        } else {
            None
        };

        Ok(Self {
            config,
            extractor,
            fetcher,
            sink,
            daily,
            options,
        })
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Runs every pass of `mode` and returns the run summary
    pub async fn run(&self, mode: CrawlMode) -> RunSummary {
        info!(
            "Starting crawl: mode={}, daily={}, date={}",
            mode, self.options.daily, self.options.run_date
        );

        let mut summary = RunSummary::new(self.options.daily);
        for pass in mode.passes() {
            summary.modes.push(self.crawl_mode(pass).await);
        }
        summary.finish();

        let total = summary.total();
        info!(
            "Crawl finished: {} topics processed, {} items saved",
            total.topics_processed, total.items_saved
        );
        summary
    }

    /// Crawls every forum configured for a single mode
    pub async fn crawl_mode(&self, mode: CrawlMode) -> ModeReport {
        let mut report = ModeReport::new(mode);
        let forums = self.config.forums_for(mode);

        if forums.is_empty() {
            warn!("No forums configured for {} mode", mode);
            return report;
        }

        info!("===== {} mode: {} forums =====", mode, forums.len());

        // Topics already visited in this mode, by normalized URL
        let mut seen = HashSet::new();
        for forum in forums {
            report.forums.push(self.crawl_forum(mode, forum, &mut seen).await);
        }

        let total = report.total();
        info!(
            "{} mode done: {} topics processed, {} items saved",
            mode, total.topics_processed, total.items_saved
        );
        report
    }

    /// Walks the listing pages of one forum until the traversal is done
    pub async fn crawl_forum(
        &self,
        mode: CrawlMode,
        forum: &ForumTarget,
        seen: &mut HashSet<String>,
    ) -> ForumReport {
        info!("Crawling forum {} ({})", forum.name, forum.id);

        let mut crawl = ForumCrawl::new(self.config.forum_url(forum), self.config.crawl.max_pages);
        while !crawl.is_done() {
            self.step(mode, &mut crawl, seen).await;
        }

        let stop_reason = crawl.stop_reason().unwrap_or(StopReason::NoNextPage);
        if stop_reason.is_failure() {
            warn!("Forum {} stopped early: {}", forum.name, stop_reason);
        }
        info!(
            "Forum {} done after {} pages ({}): {} topics, {} saved",
            forum.name,
            crawl.cursor.page(),
            stop_reason,
            crawl.result.topics_processed,
            crawl.result.items_saved
        );

        ForumReport {
            forum_id: forum.id.clone(),
            forum_name: forum.name.clone(),
            pages: crawl.cursor.page(),
            result: crawl.result,
            stop_reason,
        }
    }

    /// Performs one transition of `crawl`
    pub async fn step(&self, mode: CrawlMode, crawl: &mut ForumCrawl, seen: &mut HashSet<String>) {
        let phase = std::mem::replace(&mut crawl.phase, CrawlPhase::PageFetch);

        crawl.phase = match phase {
            CrawlPhase::PageFetch => {
                info!("Fetching page {}: {}", crawl.cursor.page(), crawl.cursor.url());
                match self.fetch_page(crawl.cursor.url()).await {
                    Some(html) => CrawlPhase::ListExtract { html },
                    None => CrawlPhase::Done(StopReason::FetchFailed),
                }
            }

            CrawlPhase::ListExtract { html } => self.select_topics(html),

            CrawlPhase::TopicLoop { html, topics } => {
                for topic in &topics {
                    if !seen.insert(topic_key(topic)) {
                        debug!("Skipping already visited topic {}", topic.url);
                        continue;
                    }
                    crawl.result += self.process_topic(mode, topic).await;
                }
                CrawlPhase::PageAdvance { html }
            }

            CrawlPhase::PageAdvance { html } => {
                if crawl.cursor.page() >= crawl.cursor.max_pages() {
                    CrawlPhase::Done(StopReason::PageLimit)
                } else {
                    match self.extractor.next_page_url(crawl.cursor.url(), &html) {
                        Some(next) => match crawl.cursor.advance(&next) {
                            Ok(()) => CrawlPhase::PageFetch,
                            Err(reason) => CrawlPhase::Done(reason),
                        },
                        None => CrawlPhase::Done(StopReason::NoNextPage),
                    }
                }
            }

            done @ CrawlPhase::Done(_) => done,
        };

        debug!("Phase -> {}", crawl.phase);
    }

    fn select_topics(&self, html: String) -> CrawlPhase {
        let topics = self.extractor.extract_topics(&html);
        info!("Found {} topics", topics.len());

        if topics.is_empty() {
            return CrawlPhase::Done(StopReason::NoTopics);
        }

        let topics = match &self.daily {
            Some(filter) => {
                let kept = filter.apply(topics);
                info!("{} topics tagged [{}]", kept.len(), filter.today());
                if kept.is_empty() {
                    return CrawlPhase::Done(StopReason::NoDailyTopics);
                }
                kept
            }
            None => topics,
        };

        CrawlPhase::TopicLoop { html, topics }
    }

    /// Fetches, extracts and persists one topic
    async fn process_topic(&self, mode: CrawlMode, topic: &Topic) -> CrawlResult {
        let mut result = CrawlResult {
            topics_processed: 1,
            items_saved: 0,
        };

        info!("Processing topic: {}", topic.title);
        let Some(html) = self.fetch_page(&topic.url).await else {
            warn!("Skipping topic '{}': could not fetch {}", topic.title, topic.url);
            return result;
        };

        let content = self.extractor.parse_topic_page(&html, mode);
        match mode {
            CrawlMode::Picture if content.images.is_empty() => {
                debug!("No images in '{}'", topic.title);
            }
            CrawlMode::Picture => {
                let saved = self
                    .sink
                    .save_images(&topic.title, &content.images, &self.fetcher)
                    .await;
                info!("Saved {}/{} images from '{}'", saved, content.images.len(), topic.title);
                result.items_saved = saved as u64;
            }
            CrawlMode::Novel if content.content.is_empty() => {
                debug!("No text in '{}'", topic.title);
            }
            CrawlMode::Novel => {
                if self.sink.save_text(&topic.title, &content.content).await {
                    result.items_saved = 1;
                }
            }
            CrawlMode::All => {}
        }

        result
    }

    /// Fetches a page, treating an empty body as a failure
    async fn fetch_page(&self, url: &str) -> Option<String> {
        match self.fetcher.get(url).await {
            Some(html) if !html.trim().is_empty() => Some(html),
            Some(_) => {
                warn!("Empty response from {}", url);
                None
            }
            None => None,
        }
    }
}

fn topic_key(topic: &Topic) -> String {
    normalize_url(&topic.url)
        .map(String::from)
        .unwrap_or_else(|_| topic.url.clone())
}
