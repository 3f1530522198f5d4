//! # Blog Mirror
//!
//! A one-shot batch tool that mirrors a blog's publicly listed articles into
//! local JSON documents and image files for a static site tree.
//!
//! ## Features
//!
//! - Discovers every article URL from the paginated listing index
//! - Extracts structured fields (title, date, author, tags, body) per article
//! - Sanitizes body HTML: ads, subscription prompts, and chrome are removed
//! - Downloads referenced images and rewrites references to local paths
//! - Writes one JSON record per article, atomically and idempotently
//!
//! ## Usage
//!
//! ```sh
//! blog_mirror --index-url https://postgrespro.com/blog --output-root wwwroot
//! ```
//!
//! ## Architecture
//!
//! Strictly sequential pipeline, one article at a time:
//! 1. **Discover**: walk listing pages, collect unique article URLs
//! 2. **Fetch & parse**: download each article, extract structured fields
//! 3. **Sanitize & localize**: clean the body, mirror its images locally
//! 4. **Write**: persist the record as `{output_root}/content/blog/{slug}.json`
//!
//! Per-article failures are isolated: one bad article is logged and skipped,
//! never halting the rest of the run. Only a listing/discovery failure aborts.

use clap::Parser;
use std::collections::HashSet;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};
use url::Url;

mod cli;
mod error;
mod fetcher;
mod models;
mod outputs;
mod scrape;
mod utils;

use cli::Cli;
use error::{Result, ScrapeError};
use fetcher::{Fetcher, HttpFetcher};
use models::ArticleRecord;
use utils::ensure_writable_dir;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("blog_mirror starting up");

    let args = Cli::parse();
    info!(index_url = %args.index_url, output_root = %args.output_root, "Parsed CLI arguments");

    let content_dir = PathBuf::from(&args.output_root).join("content").join("blog");
    let images_root = PathBuf::from(&args.output_root).join("blog");

    // Early check: both output trees must be writable before any network work
    for dir in [&content_dir, &images_root] {
        if let Err(e) = ensure_writable_dir(dir).await {
            error!(
                path = %dir.display(),
                error = %e,
                "Output directory is not writable (fix perms or choose a different path)"
            );
            return Err(e.into());
        }
    }

    let mut fetcher = HttpFetcher::new(Duration::from_secs(args.request_delay_secs))?;

    // ---- Discover article URLs ----
    let urls = scrape::listing::discover_article_urls(&mut fetcher, &args.index_url).await?;

    // ---- Process articles, strictly one at a time ----
    let mut succeeded = 0usize;
    let mut failed = 0usize;
    let mut image_failures = 0usize;
    let mut used_slugs: HashSet<String> = HashSet::new();
    for url in &urls {
        match process_article(&mut fetcher, url, &content_dir, &images_root, &mut used_slugs).await
        {
            Ok((slug, img_failed)) => {
                succeeded += 1;
                image_failures += img_failed;
                info!(%url, %slug, "Saved article");
            }
            Err(e) => {
                failed += 1;
                warn!(%url, error = %e, "Article failed; continuing with the rest");
            }
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        total = urls.len(),
        succeeded,
        failed,
        image_failures,
        secs = elapsed.as_secs(),
        "Mirror run complete"
    );

    Ok(())
}

/// Run one article through fetch → parse → sanitize → localize → write.
///
/// Returns the article's slug and its image-failure count on success. Any
/// error here is fatal for this article only; the caller logs it and moves
/// on. `used_slugs` carries the slugs already claimed this run so two
/// articles sharing a title cannot overwrite each other's output.
#[instrument(level = "info", skip_all, fields(%url))]
async fn process_article<F: Fetcher>(
    fetcher: &mut F,
    url: &str,
    content_dir: &Path,
    images_root: &Path,
    used_slugs: &mut HashSet<String>,
) -> Result<(String, usize)> {
    let html = fetcher.fetch_text(url).await?;
    let parsed = scrape::article::parse_article(&html, url)?;

    let base = Url::parse(url).map_err(|_| ScrapeError::InvalidUrl {
        url: url.to_string(),
    })?;

    let mut slug = utils::slugify(&parsed.title);
    if slug.is_empty() {
        slug = utils::slug_from_url(&base);
    }
    let slug = utils::unique_slug(&slug, &base, used_slugs);
    used_slugs.insert(slug.clone());

    let clean = scrape::sanitize::sanitize(&parsed.body_html);
    let localized = scrape::images::localize_images(fetcher, &clean, &base, &slug, images_root).await?;

    let plain = scrape::sanitize::plain_text(&localized.html);
    let reading_time = utils::reading_time_minutes(&plain);

    let record = ArticleRecord {
        title: parsed.title.clone(),
        title_tr: parsed.title,
        slug: slug.clone(),
        date: parsed.published_at,
        author: parsed.author,
        category: parsed.category,
        category_tr: parsed.category_tr,
        tags: parsed.tags.clone(),
        tags_tr: parsed.tags,
        source_url: url.to_string(),
        canonical_url: parsed.canonical_url,
        excerpt: parsed.excerpt.clone(),
        excerpt_tr: parsed.excerpt,
        content: localized.html.clone(),
        content_tr: localized.html,
        reading_time,
        hero_image: localized.hero_image,
        images: localized.images,
        published: true,
    };

    outputs::json::write_record(&record, content_dir).await?;
    Ok((slug, localized.failed))
}
