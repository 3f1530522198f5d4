//! Body HTML sanitization.
//!
//! Removes non-editorial fragments from an article body by structural markers
//! over a parsed document tree: ads, subscription/newsletter call-to-action
//! boxes, social-share widgets, related-post teasers, and page chrome.
//! Paragraph structure, headings, lists, code blocks, inline emphasis, and
//! image tags survive untouched (images are handled by the next stage, not
//! removed here).
//!
//! Sanitization is idempotent: running it on already-clean HTML is a no-op.

use ego_tree::NodeId;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};

/// Selectors for fragments that never belong to article content.
static UNWANTED: Lazy<Vec<Selector>> = Lazy::new(|| {
    [
        "script",
        "style",
        "nav",
        "footer",
        "header",
        ".subscribe",
        ".social-share",
        ".newsletter",
        ".advertisement",
        ".ads",
        ".related",
        ".related-posts",
        "[class*=\"ad-\"]",
        "[class*=\"subscribe\"]",
        "[class*=\"newsletter\"]",
    ]
    .iter()
    .map(|s| Selector::parse(s).unwrap())
    .collect()
});

static PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());
static IMG: Lazy<Selector> = Lazy::new(|| Selector::parse("img").unwrap());

/// Strip unwanted fragments from body HTML, preserving semantic markup.
///
/// Matching elements are detached from the parsed tree along with their
/// subtrees, and paragraphs with no text are pruned unless they contain an
/// `<img>`. The cleaned tree is re-serialized, so the output is well-formed
/// regardless of how mangled the matched fragments were.
pub fn sanitize(body_html: &str) -> String {
    let mut document = Html::parse_fragment(body_html);

    let mut doomed: Vec<NodeId> = Vec::new();
    for selector in UNWANTED.iter() {
        for element in document.select(selector) {
            doomed.push(element.id());
        }
    }
    for paragraph in document.select(&PARAGRAPH) {
        let has_text = paragraph.text().any(|t| !t.trim().is_empty());
        let has_image = paragraph.select(&IMG).next().is_some();
        if !has_text && !has_image {
            doomed.push(paragraph.id());
        }
    }

    for id in doomed {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }

    document.root_element().inner_html()
}

/// Plain text of an HTML fragment with collapsed whitespace.
///
/// Used for excerpts and word counting.
pub fn plain_text(html: &str) -> String {
    let document = Html::parse_fragment(html);
    document
        .root_element()
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
