//! Image localization.
//!
//! Scans sanitized body HTML for image references in document order,
//! downloads each unique remote image through the rate-limited fetcher,
//! writes it under the article's image directory, and rewrites every
//! occurrence of its source reference to the local `/blog/{slug}/{file}`
//! path. The first successfully localized image becomes the hero image.
//!
//! A per-image fetch failure is non-fatal: the reference stays pointing at
//! the remote URL and the failure is counted, but the article still saves.
//! A filesystem write failure, by contrast, is fatal for the article.

use crate::error::{Result, ScrapeError};
use crate::fetcher::Fetcher;
use crate::utils::sanitize_filename;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument, warn};
use url::Url;

static IMG: Lazy<Selector> = Lazy::new(|| Selector::parse("img").unwrap());

/// One unique remote image and every source string it was referenced by.
///
/// Two `<img>` tags can point at the same image through different raw strings
/// (say, a relative and an absolute form); both must be rewritten even though
/// the image downloads once.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRef {
    /// Source attribute values exactly as they appear in the HTML.
    pub raw_srcs: Vec<String>,
    /// The resolved absolute download URL.
    pub resolved: Url,
}

/// Result of localizing one article's images.
#[derive(Debug)]
pub struct LocalizedImages {
    /// Body HTML with localized references rewritten to local paths.
    pub html: String,
    /// Local web paths, in download order. Each one is a file on disk.
    pub images: Vec<String>,
    /// First successfully localized image, if any.
    pub hero_image: Option<String>,
    /// Count of images whose download failed and whose reference was kept
    /// remote.
    pub failed: usize,
}

/// Collect unique image references from HTML in document order.
///
/// Reads `src`, falling back to `data-src` for lazy-loaded images.
/// Protocol-relative (`//host/…`), root-relative (`/…`), and relative
/// references are all resolved against `base`. De-duplicates by resolved URL
/// while accumulating every raw source string that maps to it.
pub fn collect_image_refs(html: &str, base: &Url) -> Vec<ImageRef> {
    let document = Html::parse_fragment(html);
    let mut refs: Vec<ImageRef> = Vec::new();
    let mut index_by_url: HashMap<String, usize> = HashMap::new();

    for img in document.select(&IMG) {
        let Some(src) = img.value().attr("src").or_else(|| img.value().attr("data-src")) else {
            continue;
        };
        let src = src.trim();
        if src.is_empty() {
            continue;
        }
        let Some(resolved) = resolve_image_url(src, base) else {
            continue;
        };
        match index_by_url.get(resolved.as_str()) {
            Some(&i) => {
                let raws = &mut refs[i].raw_srcs;
                if !raws.iter().any(|r| r == src) {
                    raws.push(src.to_string());
                }
            }
            None => {
                index_by_url.insert(resolved.to_string(), refs.len());
                refs.push(ImageRef {
                    raw_srcs: vec![src.to_string()],
                    resolved,
                });
            }
        }
    }
    refs
}

fn resolve_image_url(src: &str, base: &Url) -> Option<Url> {
    if let Some(rest) = src.strip_prefix("//") {
        Url::parse(&format!("https://{rest}")).ok()
    } else if src.starts_with("http://") || src.starts_with("https://") {
        Url::parse(src).ok()
    } else {
        base.join(src).ok()
    }
}

/// Derive a local filename for a downloaded image.
///
/// Uses the sanitized, percent-decoded basename of the URL path (`image` when
/// nothing usable remains), keeps a short alphanumeric extension from the
/// path or defaults to `.jpg`, and appends a numeric suffix on collision with
/// an already-taken name.
pub fn derive_filename(resolved: &Url, taken: &HashSet<String>) -> String {
    let basename = resolved.path().rsplit('/').next().unwrap_or("");
    let decoded = urlencoding::decode(basename)
        .map(|c| c.into_owned())
        .unwrap_or_else(|_| basename.to_string());

    let (stem, ext) = match decoded.rsplit_once('.') {
        Some((stem, ext))
            if !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            (stem.to_string(), format!(".{}", ext.to_lowercase()))
        }
        _ => (decoded.clone(), ".jpg".to_string()),
    };

    let mut stem = sanitize_filename(&stem);
    if stem.is_empty() {
        stem = "image".to_string();
    }

    let mut name = format!("{stem}{ext}");
    let mut n = 2;
    while taken.contains(&name) {
        name = format!("{stem}-{n}{ext}");
        n += 1;
    }
    name
}

/// Rewrite every `src`/`data-src` occurrence of `raw_src` to `local_path`.
///
/// Matches the attribute-escaped form the serializer emits, so references
/// with `&` in their query strings are still caught.
pub fn rewrite_image_src(html: &str, raw_src: &str, local_path: &str) -> String {
    let escaped = attr_escape(raw_src);
    // `data-src="…"` ends with the `src="…"` needle, so one pass covers both.
    html.replace(
        &format!("src=\"{escaped}\""),
        &format!("src=\"{local_path}\""),
    )
}

fn attr_escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('"', "&quot;")
}

/// Download an article's images and rewrite its HTML to local paths.
///
/// Files land in `{images_root}/{slug}/`; recorded paths use the site layout
/// `/blog/{slug}/{filename}`. Every path in the returned `images` list was
/// written to disk before this function returns.
///
/// # Errors
///
/// [`ScrapeError::Write`] if the image directory cannot be created or a
/// fetched image cannot be written; the caller treats that as fatal for the
/// article. Download failures are not errors here — they are counted in
/// [`LocalizedImages::failed`] and the remote reference is left in place.
#[instrument(level = "info", skip_all, fields(%slug))]
pub async fn localize_images<F: Fetcher>(
    fetcher: &mut F,
    clean_html: &str,
    base: &Url,
    slug: &str,
    images_root: &Path,
) -> Result<LocalizedImages> {
    let refs = collect_image_refs(clean_html, base);
    if refs.is_empty() {
        return Ok(LocalizedImages {
            html: clean_html.to_string(),
            images: Vec::new(),
            hero_image: None,
            failed: 0,
        });
    }

    let article_dir = images_root.join(slug);
    fs::create_dir_all(&article_dir)
        .await
        .map_err(|e| ScrapeError::Write {
            path: article_dir.clone(),
            source: e,
        })?;

    let mut html = clean_html.to_string();
    let mut images: Vec<String> = Vec::new();
    let mut taken: HashSet<String> = HashSet::new();
    let mut failed = 0usize;

    for image_ref in &refs {
        match fetcher.fetch_bytes(image_ref.resolved.as_str()).await {
            Ok(bytes) => {
                let filename = derive_filename(&image_ref.resolved, &taken);
                let file_path = article_dir.join(&filename);
                fs::write(&file_path, &bytes)
                    .await
                    .map_err(|e| ScrapeError::Write {
                        path: file_path.clone(),
                        source: e,
                    })?;
                taken.insert(filename.clone());

                let web_path = format!("/blog/{slug}/{filename}");
                for raw in &image_ref.raw_srcs {
                    html = rewrite_image_src(&html, raw, &web_path);
                }
                images.push(web_path);
            }
            Err(e) => {
                warn!(
                    url = %image_ref.resolved,
                    error = %e,
                    "Image download failed; keeping remote reference"
                );
                failed += 1;
            }
        }
    }

    let hero_image = images.first().cloned();
    info!(
        localized = images.len(),
        failed,
        "Localized article images"
    );

    Ok(LocalizedImages {
        html,
        images,
        hero_image,
        failed,
    })
}
