//! Utility functions for slug derivation, filename sanitizing, reading-time
//! estimation, and file system checks.

use crate::error::{Result, ScrapeError};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};
use url::Url;

static NON_SLUG: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9\s-]").unwrap());
static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static HYPHEN_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"-+").unwrap());
static NON_FILENAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s-]").unwrap());
static DASH_OR_SPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-\s]+").unwrap());
static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w+\b").unwrap());

/// Convert an article title to a URL-and-filesystem-safe slug.
///
/// Lowercases the title, transliterates Turkish characters, strips everything
/// outside `[a-z0-9 -]`, collapses whitespace and hyphen runs to a single
/// hyphen, and trims leading/trailing hyphens. Deterministic, so the same
/// title always maps to the same output filename.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(slugify("Şirket Güncellemeleri 2025"), "sirket-guncellemeleri-2025");
/// assert_eq!(slugify("Hello, World!"), "hello-world");
/// ```
pub fn slugify(title: &str) -> String {
    let mut slug = title.to_lowercase();
    for (from, to) in [
        ('ğ', 'g'),
        ('ü', 'u'),
        ('ş', 's'),
        ('ı', 'i'),
        ('ö', 'o'),
        ('ç', 'c'),
    ] {
        slug = slug.replace(from, &to.to_string());
    }
    let slug = NON_SLUG.replace_all(&slug, "");
    let slug = WHITESPACE_RUN.replace_all(&slug, "-");
    let slug = HYPHEN_RUN.replace_all(&slug, "-");
    slug.trim_matches('-').to_string()
}

/// Derive a slug from the last path segment of a source URL.
///
/// Fallback for articles whose title slugifies to an empty string (e.g. a
/// fully non-Latin title). Returns `"article"` when the URL has no usable
/// path segment, so a slug is always produced.
pub fn slug_from_url(url: &Url) -> String {
    let segment = url
        .path()
        .rsplit('/')
        .find(|s| !s.is_empty())
        .unwrap_or("");
    let decoded = urlencoding::decode(segment)
        .map(|c| c.into_owned())
        .unwrap_or_else(|_| segment.to_string());
    let slug = slugify(&decoded);
    if slug.is_empty() {
        "article".to_string()
    } else {
        slug
    }
}

/// Disambiguate a slug against the slugs already used this run.
///
/// Two distinct articles can share a title; without a guard they would map to
/// the same `{slug}.json` and image directory, and the second write would
/// silently replace the first. On collision the source URL's last path
/// segment is appended — deterministic and stable across runs, so the
/// disambiguated slug still overwrites its own file on a re-scrape — with a
/// numeric suffix as a last resort.
pub fn unique_slug(base: &str, source_url: &Url, used: &std::collections::HashSet<String>) -> String {
    if !used.contains(base) {
        return base.to_string();
    }
    let candidate = format!("{base}-{}", slug_from_url(source_url));
    if !used.contains(&candidate) {
        return candidate;
    }
    let mut n = 2;
    loop {
        let numbered = format!("{candidate}-{n}");
        if !used.contains(&numbered) {
            return numbered;
        }
        n += 1;
    }
}

/// Sanitize a filename for the local filesystem.
///
/// Removes everything outside word characters, whitespace, and hyphens, then
/// collapses whitespace/hyphen runs to single hyphens and lowercases.
pub fn sanitize_filename(name: &str) -> String {
    let name = NON_FILENAME.replace_all(name, "");
    let name = DASH_OR_SPACE_RUN.replace_all(&name, "-");
    name.to_lowercase().trim_matches('-').to_string()
}

/// Estimated reading time in minutes at 200 words per minute.
///
/// Words are `\b\w+\b` matches in the plain text. Always at least 1, even for
/// an empty body.
pub fn reading_time_minutes(plain_text: &str) -> u32 {
    let words = WORD.find_iter(plain_text).count();
    std::cmp::max(1, (words + 199) / 200) as u32
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then probes it with a create-and-delete
/// write test. Used at startup so a bad output root fails the run before any
/// network traffic happens.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).await.map_err(|e| ScrapeError::Write {
        path: path.to_path_buf(),
        source: e,
    })?;
    let probe_path = path.join("..__probe_write__");
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(ScrapeError::Write {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("Parallel Query in Postgres!"), "parallel-query-in-postgres");
        assert_eq!(slugify("  Multiple   Spaces  "), "multiple-spaces");
    }

    #[test]
    fn test_slugify_transliterates_turkish() {
        assert_eq!(slugify("Şirket Güncellemeleri"), "sirket-guncellemeleri");
        assert_eq!(slugify("çığ öğüt"), "cig-ogut");
    }

    #[test]
    fn test_slugify_drops_other_non_ascii() {
        assert_eq!(slugify("Résumé — 2025"), "rsum-2025");
        assert_eq!(slugify("Каскадная репликация"), "");
    }

    #[test]
    fn test_slugify_collapses_hyphen_runs() {
        assert_eq!(slugify("a -- b - c"), "a-b-c");
        assert_eq!(slugify("---"), "");
    }

    #[test]
    fn test_slug_from_url_last_segment() {
        let url = Url::parse("https://postgrespro.com/blog/pgsql/5969681").unwrap();
        assert_eq!(slug_from_url(&url), "5969681");
    }

    #[test]
    fn test_slug_from_url_trailing_slash_and_empty() {
        let url = Url::parse("https://postgrespro.com/blog/some-post/").unwrap();
        assert_eq!(slug_from_url(&url), "some-post");
        let root = Url::parse("https://postgrespro.com/").unwrap();
        assert_eq!(slug_from_url(&root), "article");
    }

    #[test]
    fn test_unique_slug_passes_through_when_unused() {
        let used = std::collections::HashSet::new();
        let url = Url::parse("https://postgrespro.com/blog/pgsql/111").unwrap();
        assert_eq!(unique_slug("release-announcement", &url, &used), "release-announcement");
    }

    #[test]
    fn test_unique_slug_disambiguates_same_title_different_articles() {
        let mut used = std::collections::HashSet::new();
        let first = Url::parse("https://postgrespro.com/blog/pgsql/111").unwrap();
        let second = Url::parse("https://postgrespro.com/blog/pgsql/222").unwrap();

        let a = unique_slug("release-announcement", &first, &used);
        used.insert(a.clone());
        let b = unique_slug("release-announcement", &second, &used);

        assert_eq!(a, "release-announcement");
        assert_eq!(b, "release-announcement-222");
        assert_ne!(a, b);
    }

    #[test]
    fn test_unique_slug_numeric_suffix_as_last_resort() {
        let mut used = std::collections::HashSet::new();
        let url = Url::parse("https://postgrespro.com/blog/pgsql/111").unwrap();
        used.insert("post".to_string());
        used.insert("post-111".to_string());
        assert_eq!(unique_slug("post", &url, &used), "post-111-2");
        used.insert("post-111-2".to_string());
        assert_eq!(unique_slug("post", &url, &used), "post-111-3");
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("My Photo (1)"), "my-photo-1");
        assert_eq!(sanitize_filename("diagram_v2"), "diagram_v2");
        assert_eq!(sanitize_filename("***"), "");
    }

    #[test]
    fn test_reading_time_minimum_one() {
        assert_eq!(reading_time_minutes(""), 1);
        assert_eq!(reading_time_minutes("one two three"), 1);
    }

    #[test]
    fn test_reading_time_ceils_at_200_wpm() {
        let text_200 = "word ".repeat(200);
        assert_eq!(reading_time_minutes(&text_200), 1);
        let text_201 = "word ".repeat(201);
        assert_eq!(reading_time_minutes(&text_201), 2);
        let text_450 = "word ".repeat(450);
        assert_eq!(reading_time_minutes(&text_450), 3);
    }

    #[tokio::test]
    async fn test_ensure_writable_dir_creates_missing() {
        let dir = std::env::temp_dir().join(format!("blog_mirror_probe_{}", std::process::id()));
        let _ = stdfs::remove_dir_all(&dir);
        ensure_writable_dir(&dir).await.unwrap();
        assert!(dir.is_dir());
        let _ = stdfs::remove_dir_all(&dir);
    }
}
