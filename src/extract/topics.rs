use super::text::compact_text;
use super::{Extractor, Topic};
use crate::url::resolve_from_origin;
use scraper::{ElementRef, Html};
use tracing::debug;

/// Titles of scanned links must be longer than this (in characters)
const MIN_SCANNED_TITLE_CHARS: usize = 5;

impl Extractor {
    /// Discovers the topics listed on a forum page, in document order
    ///
    /// The first structural layout with any list items wins. When no layout
    /// matches, every topic link with a meaningful title is taken instead.
    pub fn extract_topics(&self, html: &str) -> Vec<Topic> {
        let document = Html::parse_document(html);
        let root = document.root_element();

        let Some((rule, items)) = self.list_items.first_group(root) else {
            debug!("No list layout matched, scanning all topic links");
            return self.scan_topic_links(root);
        };

        debug!(
            selector = rule.pattern(),
            items = items.len(),
            "Matched topic list layout"
        );

        items
            .into_iter()
            .filter_map(|item| self.topic_from_item(item))
            .collect()
    }

    fn topic_from_item(&self, item: ElementRef<'_>) -> Option<Topic> {
        let anchor = self.title_anchors.first_in(item)?;
        let title = compact_text(anchor);
        let href = anchor.value().attr("href")?.trim();

        if title.is_empty() || href.is_empty() || !href.contains(&self.topic_marker) {
            return None;
        }

        let url = resolve_from_origin(&self.origin, href)?;
        Some(Topic { title, url })
    }

    fn scan_topic_links(&self, root: ElementRef<'_>) -> Vec<Topic> {
        let Some((_, anchors)) = self.links.first_group(root) else {
            return Vec::new();
        };

        anchors
            .into_iter()
            .filter_map(|anchor| {
                let href = anchor.value().attr("href")?.trim();
                if !href.contains(&self.topic_marker) {
                    return None;
                }

                let title = compact_text(anchor);
                if title.chars().count() <= MIN_SCANNED_TITLE_CHARS {
                    return None;
                }

                let url = resolve_from_origin(&self.origin, href)?;
                Some(Topic { title, url })
            })
            .collect()
    }
}
