use scraper::{ElementRef, Node};

/// Tags dropped before body text is collected
const STRIPPED_TAGS: &[&str] = &["img", "script", "style"];

/// Classes marking advertisement blocks on `div` and `span`
const AD_CLASSES: &[&str] = &["ad", "advertisement", "ads"];

/// Visible text with every text node trimmed and concatenated
pub fn compact_text(element: ElementRef<'_>) -> String {
    element.text().map(str::trim).collect()
}

/// Body text with noise removed, one trimmed text node per line
pub fn block_text(element: ElementRef<'_>) -> String {
    let mut lines = Vec::new();
    collect_lines(element, &mut lines);
    lines.join("\n")
}

fn collect_lines<'a>(element: ElementRef<'a>, lines: &mut Vec<&'a str>) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let text = text.trim();
                if !text.is_empty() {
                    lines.push(text);
                }
            }
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    if !is_noise(child) {
                        collect_lines(child, lines);
                    }
                }
            }
            _ => {}
        }
    }
}

fn is_noise(element: ElementRef<'_>) -> bool {
    let value = element.value();
    let name = value.name();

    if STRIPPED_TAGS.contains(&name) {
        return true;
    }

    (name == "div" || name == "span") && value.classes().any(|class| AD_CLASSES.contains(&class))
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    fn first<'a>(document: &'a Html, pattern: &str) -> ElementRef<'a> {
        let selector = Selector::parse(pattern).unwrap();
        document.select(&selector).next().unwrap()
    }

    #[test]
    fn test_compact_text() {
        let document = Html::parse_fragment("<a href='#'>  [06-01]\n <b> Chapter 1 </b> </a>");
        assert_eq!(compact_text(first(&document, "a")), "[06-01]Chapter 1");
    }

    #[test]
    fn test_block_text_strips_noise() {
        let document = Html::parse_fragment(
            r#"<div class="postbody">
                <p>First line</p>
                <script>var x = 1;</script>
                <div class="ads">Buy now</div>
                <span class="note ad">Sponsored</span>
                <p>Second <em>line</em></p>
                <img src="/a.png">
                <style>p { color: red }</style>
                <span class="note">kept</span>
            </div>"#,
        );

        assert_eq!(
            block_text(first(&document, ".postbody")),
            "First line\nSecond\nline\nkept"
        );
    }

    #[test]
    fn test_block_text_empty() {
        let document = Html::parse_fragment("<div class='x'>  <script>1</script> </div>");
        assert_eq!(block_text(first(&document, ".x")), "");
    }
}
