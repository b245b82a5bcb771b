//! Extraction against a real browser DOM
#![cfg(target_arch = "wasm32")]

use echo_escape::browser::WebPage;
use echo_escape::extractor::{extract_content, extract_with_defaults};
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn set_body(html: &str) {
    let body = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.body())
        .expect("test page has a body");
    body.set_inner_html(html);
}

fn long_text(word: &str) -> String {
    vec![word; 40].join(" ")
}

#[wasm_bindgen_test]
fn test_article_text_wins_over_page_text() {
    let article = long_text("article");
    set_body(&format!(
        "<nav>{}</nav><article>  {}  </article>",
        long_text("menu"),
        article
    ));

    let content = extract_with_defaults(&WebPage::current().unwrap());

    assert_eq!(content.visible_text, article);
    assert!(content.html.contains("<nav>"));
}

#[wasm_bindgen_test]
fn test_class_substring_selector() {
    let story = long_text("story");
    set_body(&format!(r#"<div class="main story-body wide">{}</div>"#, story));

    let content = extract_with_defaults(&WebPage::current().unwrap());

    assert_eq!(content.visible_text, story);
}

#[wasm_bindgen_test]
fn test_short_body_yields_nothing() {
    set_body("<p>Cookie banner</p>");

    let content = extract_content(&WebPage::current().unwrap(), 100);

    assert_eq!(content.visible_text, "");
    assert!(!content.html.is_empty());
}
