//! Article field extraction.
//!
//! Turns one article's raw HTML into a [`ParsedArticle`]: title, publication
//! date, author, category, tags, excerpt, canonical URL, and the unmodified
//! body markup. Sanitization and image localization happen in later stages.
//!
//! Extraction is deliberately tolerant. The source site is an untrusted,
//! unversioned HTML surface, so every probe has a fallback and only one
//! condition is a hard failure: an article with neither a title nor readable
//! body text, which indicates the page is not an article at all.

use crate::error::{Result, ScrapeError};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use tracing::{debug, warn};
use url::Url;

/// Author recorded when the page carries no byline.
const DEFAULT_AUTHOR: &str = "Postgres Pro";

/// Category recorded when no known category marker is found.
const DEFAULT_CATEGORY: &str = "PostgreSQL";

/// Maximum length of an excerpt derived from body text.
const EXCERPT_CHARS: usize = 200;

/// Known categories and their Turkish names. Categories outside this map
/// pass through untranslated.
static CATEGORY_MAP: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("PostgreSQL", "PostgreSQL"),
        ("Company Updates", "Şirket Güncellemeleri"),
    ])
});

static H1: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").unwrap());
static TITLE_TAG: Lazy<Selector> = Lazy::new(|| Selector::parse("title").unwrap());
static TIME_TAG: Lazy<Selector> = Lazy::new(|| Selector::parse("time").unwrap());
static DATEISH: Lazy<Selector> =
    Lazy::new(|| Selector::parse("[class*=\"date\"], [class*=\"published\"]").unwrap());
static AUTHORISH: Lazy<Selector> =
    Lazy::new(|| Selector::parse("[class*=\"author\"], [class*=\"byline\"]").unwrap());
static CATEGORYISH: Lazy<Selector> =
    Lazy::new(|| Selector::parse("[class*=\"category\"], [class*=\"tag\"]").unwrap());
static TAGISH: Lazy<Selector> =
    Lazy::new(|| Selector::parse("[class*=\"tag\"], [class*=\"keyword\"]").unwrap());
static BODY_CANDIDATES: Lazy<Vec<Selector>> = Lazy::new(|| {
    ["article", "main", "[class*=\"content\"], [class*=\"post-body\"]", "body"]
        .iter()
        .map(|s| Selector::parse(s).unwrap())
        .collect()
});
static META_OG_DESCRIPTION: Lazy<Selector> =
    Lazy::new(|| Selector::parse("meta[property=\"og:description\"]").unwrap());
static META_DESCRIPTION: Lazy<Selector> =
    Lazy::new(|| Selector::parse("meta[name=\"description\"]").unwrap());
static CANONICAL_LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse("link[rel=\"canonical\"]").unwrap());
static PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());
static IMG: Lazy<Selector> = Lazy::new(|| Selector::parse("img").unwrap());

/// Structured fields extracted from one article page, body still raw.
#[derive(Debug, Clone)]
pub struct ParsedArticle {
    pub title: String,
    /// Epoch default when the page carries no parseable date.
    pub published_at: NaiveDateTime,
    pub author: String,
    pub category: String,
    pub category_tr: String,
    /// De-duplicated, in document order.
    pub tags: Vec<String>,
    pub excerpt: String,
    pub canonical_url: String,
    /// Outer HTML of the main content container, unmodified.
    pub body_html: String,
}

/// Extract structured fields from article HTML.
///
/// # Field probes, in order
///
/// - **title**: first `<h1>`, else the `<title>` tag, else `"Untitled"`.
/// - **date**: first `<time>` (preferring its `datetime` attribute), else the
///   first element whose class mentions `date`/`published`. An unparseable or
///   absent date logs a warning and defaults to the Unix epoch; a fixed
///   default keeps re-runs byte-identical, which a "now" timestamp would not.
/// - **author / category / tags**: class-marker probes with site defaults;
///   absence is never an error.
/// - **excerpt**: `og:description`, else `meta description`, else the first
///   200 characters of the body's first paragraph.
/// - **body**: first `<article>`, else `<main>`, else a `content`/`post-body`
///   container, else `<body>`.
///
/// # Errors
///
/// [`ScrapeError::Parse`] when the page has neither a title nor any body
/// text — the only hard failure; the caller skips the article and continues.
pub fn parse_article(html: &str, source_url: &str) -> Result<ParsedArticle> {
    let document = Html::parse_document(html);

    let title = document
        .select(&H1)
        .next()
        .or_else(|| document.select(&TITLE_TAG).next())
        .map(|el| element_text(&el))
        .unwrap_or_default();

    let body_element = BODY_CANDIDATES
        .iter()
        .find_map(|sel| document.select(sel).next());
    let body_has_content = body_element.is_some_and(|el| {
        el.text().any(|t| !t.trim().is_empty()) || el.select(&IMG).next().is_some()
    });

    if title.is_empty() && !body_has_content {
        return Err(ScrapeError::Parse {
            url: source_url.to_string(),
        });
    }

    let title = if title.is_empty() {
        "Untitled".to_string()
    } else {
        title
    };

    let published_at = extract_date(&document).unwrap_or_else(|| {
        warn!(url = %source_url, "No parseable publication date; defaulting to epoch");
        DateTime::<Utc>::UNIX_EPOCH.naive_utc()
    });

    let author = document
        .select(&AUTHORISH)
        .next()
        .map(|el| element_text(&el))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_AUTHOR.to_string());

    let category = document
        .select(&CATEGORYISH)
        .map(|el| element_text(&el))
        .find(|text| CATEGORY_MAP.contains_key(text.as_str()))
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());
    let category_tr = CATEGORY_MAP
        .get(category.as_str())
        .map(|tr| tr.to_string())
        .unwrap_or_else(|| category.clone());

    let mut tags: Vec<String> = Vec::new();
    for element in document.select(&TAGISH) {
        let text = element_text(&element);
        if !text.is_empty() && !tags.contains(&text) {
            tags.push(text);
        }
    }

    let excerpt = extract_excerpt(&document, body_element);

    let canonical_url = document
        .select(&CANONICAL_LINK)
        .next()
        .and_then(|el| el.value().attr("href"))
        .and_then(|href| Url::parse(source_url).ok()?.join(href).ok())
        .map(|u| u.to_string())
        .unwrap_or_else(|| source_url.to_string());

    let body_html = body_element.map(|el| el.html()).unwrap_or_default();

    debug!(
        url = %source_url,
        title = %title,
        tags = tags.len(),
        body_bytes = body_html.len(),
        "Parsed article fields"
    );

    Ok(ParsedArticle {
        title,
        published_at,
        author,
        category,
        category_tr,
        tags,
        excerpt,
        canonical_url,
        body_html,
    })
}

/// Collapsed whitespace text of an element.
fn element_text(element: &ElementRef) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn extract_date(document: &Html) -> Option<NaiveDateTime> {
    let element = document
        .select(&TIME_TAG)
        .next()
        .or_else(|| document.select(&DATEISH).next())?;
    let raw = element
        .value()
        .attr("datetime")
        .map(|s| s.to_string())
        .unwrap_or_else(|| element_text(&element));
    parse_date(&raw)
}

/// Parse a date string against the formats the source site has used.
///
/// Only the first 19 characters are considered, so an ISO timestamp with a
/// zone suffix still parses as its naive prefix.
fn parse_date(raw: &str) -> Option<NaiveDateTime> {
    let prefix: String = raw.trim().chars().take(19).collect();
    let prefix = prefix.trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(prefix, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt);
    }
    for format in ["%Y-%m-%d", "%B %d, %Y", "%d %B %Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(prefix, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    None
}

fn extract_excerpt(document: &Html, body_element: Option<ElementRef>) -> String {
    let meta = document
        .select(&META_OG_DESCRIPTION)
        .next()
        .or_else(|| document.select(&META_DESCRIPTION).next())
        .and_then(|el| el.value().attr("content"))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    if let Some(excerpt) = meta {
        return excerpt;
    }
    body_element
        .and_then(|body| body.select(&PARAGRAPH).next())
        .map(|p| element_text(&p).chars().take(EXCERPT_CHARS).collect())
        .unwrap_or_default()
}
