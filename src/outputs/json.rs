//! Atomic JSON record writing.
//!
//! This is the pipeline's idempotence point: records serialize with stable,
//! pretty-printed formatting and no run timestamps, and the write goes to a
//! temp file in the target directory followed by a rename. Re-running against
//! unchanged source content overwrites each `{slug}.json` with byte-identical
//! content, and a crash mid-write never leaves a truncated record behind.

use crate::error::{Result, ScrapeError};
use crate::models::ArticleRecord;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

/// Serialize `record` and write it to `{content_dir}/{slug}.json`.
///
/// Creates `content_dir` on demand and overwrites any prior file for the same
/// slug. Returns the final path.
///
/// # Errors
///
/// [`ScrapeError::Write`] on serialization or filesystem failure; fatal for
/// this article only.
#[instrument(level = "info", skip_all, fields(slug = %record.slug))]
pub async fn write_record(record: &ArticleRecord, content_dir: &Path) -> Result<PathBuf> {
    let final_path = content_dir.join(format!("{}.json", record.slug));

    let json = serde_json::to_string_pretty(record).map_err(|e| ScrapeError::Write {
        path: final_path.clone(),
        source: std::io::Error::other(e),
    })?;

    fs::create_dir_all(content_dir)
        .await
        .map_err(|e| ScrapeError::Write {
            path: content_dir.to_path_buf(),
            source: e,
        })?;

    let tmp_path = content_dir.join(format!(".{}.json.tmp", record.slug));
    fs::write(&tmp_path, &json)
        .await
        .map_err(|e| ScrapeError::Write {
            path: tmp_path.clone(),
            source: e,
        })?;
    fs::rename(&tmp_path, &final_path)
        .await
        .map_err(|e| ScrapeError::Write {
            path: final_path.clone(),
            source: e,
        })?;

    info!(path = %final_path.display(), "Wrote article JSON");
    Ok(final_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn record(slug: &str) -> ArticleRecord {
        ArticleRecord {
            title: "A Title".to_string(),
            title_tr: "A Title".to_string(),
            slug: slug.to_string(),
            date: DateTime::<Utc>::UNIX_EPOCH.naive_utc(),
            author: "Postgres Pro".to_string(),
            category: "PostgreSQL".to_string(),
            category_tr: "PostgreSQL".to_string(),
            tags: vec![],
            tags_tr: vec![],
            source_url: "https://postgrespro.com/blog/pgsql/1".to_string(),
            canonical_url: "https://postgrespro.com/blog/pgsql/1".to_string(),
            excerpt: "".to_string(),
            excerpt_tr: "".to_string(),
            content: "<p>x</p>".to_string(),
            content_tr: "<p>x</p>".to_string(),
            reading_time: 1,
            hero_image: None,
            images: vec![],
            published: true,
        }
    }

    fn scratch_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("blog_mirror_{}_{}", name, std::process::id()))
    }

    #[tokio::test]
    async fn test_writes_readable_record() {
        let dir = scratch_dir("write");
        let path = write_record(&record("first-post"), &dir).await.unwrap();
        assert_eq!(path, dir.join("first-post.json"));
        let text = std::fs::read_to_string(&path).unwrap();
        let back: ArticleRecord = serde_json::from_str(&text).unwrap();
        assert_eq!(back.slug, "first-post");
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_rewrite_is_byte_identical_and_leaves_no_temp_file() {
        let dir = scratch_dir("idempotent");
        let rec = record("same-post");
        write_record(&rec, &dir).await.unwrap();
        let first = std::fs::read(dir.join("same-post.json")).unwrap();
        write_record(&rec, &dir).await.unwrap();
        let second = std::fs::read(dir.join("same-post.json")).unwrap();
        assert_eq!(first, second);
        assert!(!dir.join(".same-post.json.tmp").exists());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
