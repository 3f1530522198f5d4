//! Article URL discovery from the paginated listing index.
//!
//! Walks the index root, then `{index}?page=N` for increasing N, collecting
//! every article link. The walk stops when a page contributes no new URLs or
//! exposes no next/pagination link, so a listing that loops back on itself
//! still terminates. The resulting sequence is finite, ordered by first
//! appearance, duplicate-free, and re-derivable from scratch on every run.

use crate::error::{Result, ScrapeError};
use crate::fetcher::Fetcher;
use itertools::Itertools;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::collections::HashSet;
use tracing::{debug, info, instrument};
use url::Url;

static ARTICLE_LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href*=\"/blog/\"]").unwrap());
static NEXT_LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[class*=\"next\"], a[class*=\"pagination\"]").unwrap());

/// Discover every article URL reachable from the listing index.
///
/// # Errors
///
/// - [`ScrapeError::Fetch`] if any listing page fails to download; a broken
///   listing aborts the whole run.
/// - [`ScrapeError::Discovery`] if the walk finishes with zero URLs, which
///   signals the site layout no longer matches expectations rather than an
///   empty blog.
#[instrument(level = "info", skip(fetcher))]
pub async fn discover_article_urls<F: Fetcher>(
    fetcher: &mut F,
    index_root: &str,
) -> Result<Vec<String>> {
    let base = Url::parse(index_root).map_err(|_| ScrapeError::InvalidUrl {
        url: index_root.to_string(),
    })?;

    let mut seen: HashSet<String> = HashSet::new();
    let mut urls: Vec<String> = Vec::new();
    let mut page = 1u32;

    loop {
        let page_url = if page == 1 {
            index_root.to_string()
        } else {
            format!("{index_root}?page={page}")
        };
        debug!(%page_url, page, "Fetching listing page");
        let html = fetcher.fetch_text(&page_url).await?;

        let mut found_new = false;
        for link in extract_article_links(&html, &base) {
            if seen.insert(link.clone()) {
                urls.push(link);
                found_new = true;
            }
        }

        if !found_new || !has_next_page(&html) {
            break;
        }
        page += 1;
    }

    if urls.is_empty() {
        return Err(ScrapeError::Discovery {
            index_url: index_root.to_string(),
        });
    }

    info!(count = urls.len(), pages = page, "Discovered article URLs");
    Ok(urls)
}

/// Extract article links from one listing page, resolved absolute.
///
/// Keeps anchors whose resolved URL still points under `/blog/`, drops
/// fragments, and filters out links back to the listing page itself (e.g.
/// pagination anchors). De-duplicates within the page, preserving order.
pub fn extract_article_links(html: &str, base: &Url) -> Vec<String> {
    let document = Html::parse_document(html);
    document
        .select(&ARTICLE_LINK)
        .filter_map(|a| {
            let href = a.value().attr("href")?;
            let mut resolved = base.join(href).ok()?;
            resolved.set_fragment(None);
            if !resolved.scheme().starts_with("http") {
                return None;
            }
            if !resolved.path().contains("/blog/") {
                return None;
            }
            // the listing page itself, or its ?page=N pagination links
            if resolved.path().trim_end_matches('/') == base.path().trim_end_matches('/') {
                return None;
            }
            Some(resolved.to_string())
        })
        .unique()
        .collect()
}

/// Does the listing page advertise a further page?
pub fn has_next_page(html: &str) -> bool {
    let document = Html::parse_document(html);
    document.select(&NEXT_LINK).next().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://postgrespro.com/blog").unwrap()
    }

    #[test]
    fn test_extracts_and_resolves_links() {
        let html = r#"
            <a href="/blog/pgsql/111">One</a>
            <a href="https://postgrespro.com/blog/company/222">Two</a>
            <a href="/docs/manual">Not a blog link</a>
        "#;
        let links = extract_article_links(html, &base());
        assert_eq!(
            links,
            vec![
                "https://postgrespro.com/blog/pgsql/111".to_string(),
                "https://postgrespro.com/blog/company/222".to_string(),
            ]
        );
    }

    #[test]
    fn test_deduplicates_within_page_preserving_order() {
        let html = r#"
            <a href="/blog/pgsql/111">First</a>
            <a href="/blog/pgsql/222">Second</a>
            <a href="/blog/pgsql/111">First again</a>
        "#;
        let links = extract_article_links(html, &base());
        assert_eq!(links.len(), 2);
        assert!(links[0].ends_with("/111"));
        assert!(links[1].ends_with("/222"));
    }

    #[test]
    fn test_filters_listing_self_links_and_fragments() {
        let html = r#"
            <a href="/blog/">Index</a>
            <a href="/blog/?page=2" class="next">Next</a>
            <a href="/blog/pgsql/111#comments">Article</a>
        "#;
        let links = extract_article_links(html, &base());
        assert_eq!(links, vec!["https://postgrespro.com/blog/pgsql/111".to_string()]);
    }

    #[test]
    fn test_same_article_on_two_pages_counts_once() {
        // the cross-page guard lives in discover_article_urls; model it here
        let page1 = r#"<a href="/blog/pgsql/111">A</a>"#;
        let page2 = r#"<a href="/blog/pgsql/111">A</a><a href="/blog/pgsql/222">B</a>"#;
        let mut seen = HashSet::new();
        let mut urls = Vec::new();
        for html in [page1, page2] {
            for link in extract_article_links(html, &base()) {
                if seen.insert(link.clone()) {
                    urls.push(link);
                }
            }
        }
        assert_eq!(urls.len(), 2);
    }

    #[test]
    fn test_has_next_page() {
        assert!(has_next_page(r#"<a class="pagination-next" href="?page=2">Next</a>"#));
        assert!(has_next_page(r#"<a class="next" href="?page=2">Next</a>"#));
        assert!(!has_next_page(r#"<a href="/blog/pgsql/111">Article</a>"#));
    }

    #[test]
    fn test_ignores_non_http_schemes() {
        let html = r#"<a href="mailto:someone@example.com?subject=/blog/">Mail</a>"#;
        assert!(extract_article_links(html, &base()).is_empty());
    }
}
