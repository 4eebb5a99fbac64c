use crate::textprep;
use html_scraper::{Html, Selector};
use webreply_core::MAX_CONTENT_CHARS;

/// Subtrees removed before any text is read.
pub const BOILERPLATE_SELECTOR: &str =
    "script, style, nav, footer, header, ads, .ad, .advertisement, .sidebar";

/// Content selectors, most specific first. The first one whose text clears
/// `MIN_SELECTOR_CHARS` wins.
pub const CONTENT_SELECTORS: &[&str] = &[
    "article",
    ".content",
    ".post-content",
    ".entry-content",
    ".article-body",
    "main p",
    ".text-content",
    "[role=\"main\"] p",
    ".post-body",
    ".article-content",
];

const MIN_SELECTOR_CHARS: usize = 200;
const MIN_PARAGRAPH_CHARS: usize = 50;
const MAX_FALLBACK_PARAGRAPHS: usize = 5;

/// Pull readable text out of an HTML page.
///
/// Returns `None` when nothing usable survives cleanup.
pub fn extract(html: &str) -> Option<String> {
    let mut doc = Html::parse_document(html);
    strip_boilerplate(&mut doc);
    let raw = select_main_text(&doc).unwrap_or_else(|| paragraph_fallback(&doc));
    let out = textprep::clean_scraped(&raw, MAX_CONTENT_CHARS);
    (!out.is_empty()).then_some(out)
}

fn strip_boilerplate(doc: &mut Html) {
    let Ok(sel) = Selector::parse(BOILERPLATE_SELECTOR) else {
        return;
    };
    let ids: Vec<_> = doc.select(&sel).map(|el| el.id()).collect();
    for id in ids {
        if let Some(mut node) = doc.tree.get_mut(id) {
            node.detach();
        }
    }
}

fn selector_text(doc: &Html, selector: &str) -> Option<String> {
    let sel = Selector::parse(selector).ok()?;
    let parts: Vec<String> = doc
        .select(&sel)
        .map(|el| el.text().collect::<String>())
        .collect();
    if parts.is_empty() {
        return None;
    }
    Some(parts.join(" ").trim().to_string())
}

fn select_main_text(doc: &Html) -> Option<String> {
    CONTENT_SELECTORS.iter().find_map(|s| {
        selector_text(doc, s).filter(|t| t.chars().count() > MIN_SELECTOR_CHARS)
    })
}

fn paragraph_fallback(doc: &Html) -> String {
    let Ok(sel) = Selector::parse("p") else {
        return String::new();
    };
    doc.select(&sel)
        .map(|p| p.text().collect::<String>().trim().to_string())
        .filter(|t| t.chars().count() > MIN_PARAGRAPH_CHARS)
        .take(MAX_FALLBACK_PARAGRAPHS)
        .collect::<Vec<_>>()
        .join(" ")
}
