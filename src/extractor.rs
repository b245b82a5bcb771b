/// Article text extraction for the content script
///
/// Algorithm:
/// 1. Walk a fixed priority list of selectors (semantic tags first, then
///    well-known article-body class names)
/// 2. For each selector, look at every match in document order
/// 3. Accept the first match whose trimmed inner text is longer than the
///    minimum length (short matches are teasers, bylines, cookie banners...)
/// 4. Otherwise fall back to the body text, gated by the same minimum
/// 5. Otherwise return empty text
///
/// The full serialized markup is always returned alongside the text; the
/// backend pulls metadata (title, author, JSON-LD) out of it.
use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_MIN_CONTENT_CHARS;

pub const ARTICLE_SELECTORS: &[&str] = &[
    "article",
    "[itemprop=\"articleBody\"]",
    "main",
    "[class*=\"article-content\"]",
    "[class*=\"article-body\"]",
    "[class*=\"story-body\"]",
    "[class*=\"story-content\"]",
    "[class*=\"entry-content\"]",
    "[class*=\"post-content\"]",
];

/// Read-only view of a loaded page
pub trait PageDocument {
    /// Inner text of every element matching `selector`, in document order
    fn select_texts(&self, selector: &str) -> Vec<String>;
    fn body_text(&self) -> Option<String>;
    fn outer_html(&self) -> String;
}

/// What the content script hands back for `get_page_content`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageContent {
    pub html: String,
    pub visible_text: String,
}

impl PageContent {
    pub fn is_empty(&self) -> bool {
        self.html.trim().is_empty() && self.visible_text.trim().is_empty()
    }
}

/// Run the selector fallback chain. Never fails; no content means empty fields.
pub fn extract_content<D: PageDocument + ?Sized>(document: &D, min_chars: usize) -> PageContent {
    PageContent {
        html: document.outer_html(),
        visible_text: extract_text(document, min_chars),
    }
}

pub fn extract_text<D: PageDocument + ?Sized>(document: &D, min_chars: usize) -> String {
    let from_selectors = ARTICLE_SELECTORS.iter().find_map(|selector| {
        document
            .select_texts(selector)
            .into_iter()
            .map(|text| text.trim().to_string())
            .find(|text| is_substantial(text, min_chars))
            .inspect(|_| log::debug!("Extracted article text via {}", selector))
    });

    from_selectors
        .or_else(|| {
            document
                .body_text()
                .map(|text| text.trim().to_string())
                .filter(|text| is_substantial(text, min_chars))
                .inspect(|_| log::debug!("Extracted article text from body"))
        })
        .unwrap_or_default()
}

/// Threshold check in characters, not bytes
fn is_substantial(text: &str, min_chars: usize) -> bool {
    text.chars().count() > min_chars
}

/// Default threshold used when no config is at hand
pub fn extract_with_defaults<D: PageDocument + ?Sized>(document: &D) -> PageContent {
    extract_content(document, DEFAULT_MIN_CONTENT_CHARS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FixturePage;

    fn long_text(label: &str) -> String {
        format!("{} {}", label, "lorem ipsum dolor sit amet ".repeat(6))
    }

    #[test]
    fn test_article_tag_wins_over_body() {
        let article = long_text("Article body.");
        let page = FixturePage::new("<html>...</html>")
            .with("article", &format!("\n   {}   \n", article))
            .with_body(&long_text("Whole page including nav and footer."));

        let content = extract_content(&page, 100);

        assert_eq!(content.visible_text, article.trim());
        assert_eq!(content.html, "<html>...</html>");
    }

    #[test]
    fn test_short_body_without_selector_is_empty() {
        let page = FixturePage::new("<html><body>Subscribe now</body></html>")
            .with_body("Subscribe now");

        let content = extract_content(&page, 100);

        assert_eq!(content.visible_text, "");
        assert!(!content.html.is_empty());
    }

    #[test]
    fn test_short_match_falls_through_to_next_selector() {
        let story = long_text("Story body.");
        let page = FixturePage::new("<html/>")
            .with("article", "Related: 5 things to know")
            .with("main", &story);

        assert_eq!(extract_text(&page, 100), story.trim());
    }

    #[test]
    fn test_later_match_of_same_selector_is_considered() {
        let real = long_text("The real article.");
        let page = FixturePage::new("<html/>")
            .with("article", "Teaser card")
            .with("article", &real);

        assert_eq!(extract_text(&page, 100), real.trim());
    }

    #[test]
    fn test_selector_priority_order() {
        let main_text = long_text("Main.");
        let item_prop = long_text("Item prop.");
        let page = FixturePage::new("<html/>")
            .with("main", &main_text)
            .with("[itemprop=\"articleBody\"]", &item_prop);

        assert_eq!(extract_text(&page, 100), item_prop.trim());
    }

    #[test]
    fn test_class_substring_selectors() {
        let body = long_text("Story.");
        let page = FixturePage::new("<html/>").with("[class*=\"story-body\"]", &body);

        assert_eq!(extract_text(&page, 100), body.trim());
    }

    #[test]
    fn test_body_fallback_when_long_enough() {
        let body = long_text("Plain page.");
        let page = FixturePage::new("<html/>").with_body(&body);

        assert_eq!(extract_text(&page, 100), body.trim());
    }

    #[test]
    fn test_exactly_threshold_is_rejected() {
        let page = FixturePage::new("<html/>").with("article", &"x".repeat(100));

        assert_eq!(extract_text(&page, 100), "");
    }

    #[test]
    fn test_threshold_counts_characters() {
        let accented = "é".repeat(60);
        let page = FixturePage::new("<html/>").with("article", &accented);

        // 120 bytes but only 60 characters
        assert_eq!(extract_text(&page, 100), "");
    }

    #[test]
    fn test_page_content_is_empty() {
        assert!(PageContent::default().is_empty());
        assert!(!PageContent { html: "<html/>".to_string(), visible_text: String::new() }.is_empty());
    }
}
