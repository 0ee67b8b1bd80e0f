use super::text::{block_text, compact_text};
use super::{Extractor, TopicContent};
use crate::config::CrawlMode;
use crate::url::resolve_from_origin;
use scraper::{ElementRef, Html};
use tracing::debug;

/// Image URLs containing any of these (lowercased) are page decoration
const IMAGE_DENYLIST: &[&str] = &["avatar", "smiley", "icon"];

/// Minimum text length for the largest-block fallback in novel mode
const MIN_FALLBACK_TEXT_CHARS: usize = 100;

impl Extractor {
    /// Extracts the body of a topic page for `mode`
    ///
    /// Picture mode fills `images`, novel mode fills `content`. The run-level
    /// `all` mode is not a content kind and yields an empty result.
    pub fn parse_topic_page(&self, html: &str, mode: CrawlMode) -> TopicContent {
        match mode {
            CrawlMode::Picture => TopicContent {
                images: self.extract_images(html),
                ..Default::default()
            },
            CrawlMode::Novel => TopicContent {
                content: self.extract_text(html),
                ..Default::default()
            },
            CrawlMode::All => {
                debug!("No content kind for mode '{}'", mode);
                TopicContent::default()
            }
        }
    }

    /// Absolute URLs of the content images, in document order
    pub fn extract_images(&self, html: &str) -> Vec<String> {
        let document = Html::parse_document(html);
        let root = document.root_element();

        let region = self.picture_containers.first_in(root).unwrap_or_else(|| {
            debug!("No picture container matched, searching whole document");
            root
        });

        let Some((_, images)) = self.images.first_group(region) else {
            return Vec::new();
        };

        images
            .into_iter()
            .filter_map(|img| self.image_url(img.value().attr("src")?))
            .filter(|url| {
                let lower = url.to_lowercase();
                !IMAGE_DENYLIST.iter().any(|word| lower.contains(word))
            })
            .collect()
    }

    fn image_url(&self, src: &str) -> Option<String> {
        let src = src.trim();
        if src.starts_with("http://") || src.starts_with("https://") {
            Some(src.to_string())
        } else if src.starts_with('/') {
            resolve_from_origin(&self.origin, src)
        } else {
            None
        }
    }

    /// Body text of the topic, or an empty string when nothing is found
    pub fn extract_text(&self, html: &str) -> String {
        let document = Html::parse_document(html);
        let root = document.root_element();

        let container = self
            .novel_containers
            .first_in(root)
            .or_else(|| self.largest_block(root));

        match container {
            Some(container) => block_text(container),
            None => {
                debug!("No text container found");
                String::new()
            }
        }
    }

    /// The `div` or `p` with the most visible text, if it is long enough
    fn largest_block<'a>(&self, root: ElementRef<'a>) -> Option<ElementRef<'a>> {
        let (_, blocks) = self.blocks.first_group(root)?;

        let mut best: Option<(usize, ElementRef<'a>)> = None;
        for block in blocks {
            let len = compact_text(block).chars().count();
            if best.map_or(true, |(best_len, _)| len > best_len) {
                best = Some((len, block));
            }
        }

        best.filter(|(len, _)| *len >= MIN_FALLBACK_TEXT_CHARS)
            .map(|(_, block)| {
                debug!("Using largest text block as container");
                block
            })
    }
}
