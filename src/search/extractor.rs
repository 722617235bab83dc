//! Result extraction from the provider's HTML results page

use super::models::SearchHit;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

/// Hits kept per page, bounding the prompt fed to the model
pub const MAX_HITS: usize = 5;

static RESULT_SELECTOR: Lazy<Selector> = Lazy::new(|| selector(".result__body"));
static TITLE_SELECTOR: Lazy<Selector> = Lazy::new(|| selector(".result__title"));
static LINK_SELECTOR: Lazy<Selector> = Lazy::new(|| selector(".result__title a"));
static SNIPPET_SELECTOR: Lazy<Selector> = Lazy::new(|| selector(".result__snippet"));

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector is valid CSS")
}

/// Extract up to [`MAX_HITS`] hits in document order
pub fn extract(html: &str) -> Vec<SearchHit> {
    extract_limited(html, MAX_HITS)
}

/// Extract up to `limit` hits in document order
///
/// Missing titles, links or snippets become empty strings.
pub fn extract_limited(html: &str, limit: usize) -> Vec<SearchHit> {
    let document = Html::parse_document(html);

    document
        .select(&RESULT_SELECTOR)
        .take(limit)
        .map(|container| {
            let title = first_text(container, &TITLE_SELECTOR);
            let link = container
                .select(&LINK_SELECTOR)
                .next()
                .and_then(|a| a.value().attr("href"))
                .map(|h| h.trim().to_string())
                .unwrap_or_default();
            let snippet = first_text(container, &SNIPPET_SELECTOR);

            SearchHit {
                title,
                link,
                snippet,
            }
        })
        .collect()
}

fn first_text(container: ElementRef<'_>, selector: &Selector) -> String {
    container
        .select(selector)
        .next()
        .map(|e| normalize_whitespace(&e.text().collect::<String>()))
        .unwrap_or_default()
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
