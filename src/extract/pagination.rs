use super::rules::{RankedRules, SelectorChain};
use super::text::compact_text;
use super::Extractor;
use crate::url::{resolve_from_page, same_page};
use scraper::{ElementRef, Html};
use tracing::debug;

/// Link texts that mean "next page"
const NEXT_LABELS: &[&str] = &["下一页", "下一頁", "Next", "Next page"];

/// Builds the ranked lookup for the next page href
///
/// Every rule yields the raw href of the first candidate element whose href
/// is non-empty.
pub(super) fn rules(forum_marker: &str) -> RankedRules<String> {
    let mut rules = RankedRules::new();

    let rel_next = SelectorChain::compile(&["a[rel~=next]", "link[rel~=next]"]);
    rules.push("rel-next", move |region| rel_next.find_map(region, href_of));

    let next_class =
        SelectorChain::compile(&[".next a", ".pagination a.next", ".paging a.next"]);
    rules.push("next-class", move |region| next_class.find_map(region, href_of));

    let labelled = SelectorChain::compile(&["a[href]"]);
    rules.push("next-label", move |region| {
        labelled.find_map(region, |anchor| {
            if is_next_label(&compact_text(anchor)) {
                href_of(anchor)
            } else {
                None
            }
        })
    });

    let marker = forum_marker.to_string();
    let paged = SelectorChain::compile(&["a[href]"]);
    rules.push("page-param", move |region| {
        paged.find_map(region, |anchor| {
            href_of(anchor).filter(|href| {
                href.contains(&marker) && (href.contains("start=") || href.contains("page="))
            })
        })
    });

    rules
}

fn href_of(element: ElementRef<'_>) -> Option<String> {
    let href = element.value().attr("href")?.trim();
    (!href.is_empty()).then(|| href.to_string())
}

fn is_next_label(text: &str) -> bool {
    let text = text.trim().to_lowercase();
    NEXT_LABELS.iter().any(|label| label.to_lowercase() == text)
}

impl Extractor {
    /// Absolute URL of the next listing page
    ///
    /// Returns `None` when no rule finds a link, when the link cannot be
    /// resolved, or when it points back at `current_url`.
    pub fn next_page_url(&self, current_url: &str, html: &str) -> Option<String> {
        let href = {
            let document = Html::parse_document(html);
            self.pagination.evaluate(document.root_element())?
        };

        let next = resolve_from_page(&self.origin, current_url, &href)?;
        if same_page(&next, current_url) {
            debug!("Next page link points back to {}", current_url);
            return None;
        }

        Some(next)
    }

    /// True exactly when [`Extractor::next_page_url`] finds a page
    pub fn has_next_page(&self, current_url: &str, html: &str) -> bool {
        self.next_page_url(current_url, html).is_some()
    }
}
