//! Data model for mirrored blog articles.
//!
//! This module defines [`ArticleRecord`], the unit of output: one record per
//! source article, serialized as one JSON file. Field names use camelCase to
//! match the JSON layout consumed by the downstream site, hence the serde
//! `rename_all` attribute.
//!
//! The `*Tr` fields carry a secondary-language (Turkish) variant of their
//! primary field. No machine translation happens here: they are populated by
//! a direct pass-through, except `categoryTr` which comes from a small static
//! category map in the article parser.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A fully extracted blog article, ready to be written as JSON.
///
/// Records are constructed in memory, fully populated, written once, and never
/// mutated afterwards. `slug` doubles as the output filename and is stable
/// across runs for the same `source_url`, so a re-scrape overwrites the same
/// file rather than duplicating it.
///
/// # Invariants
///
/// - Every path in `images` points at an image file that was written to disk
///   before this record was persisted.
/// - `hero_image`, when present, is the first element of `images`.
/// - `content` holds sanitized HTML: no ad/subscription markup, and every
///   localized image reference rewritten to a local `/blog/{slug}/…` path.
/// - `reading_time` is always at least 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleRecord {
    pub title: String,
    pub title_tr: String,
    pub slug: String,
    /// Publication timestamp; serializes as `YYYY-MM-DDTHH:MM:SS`.
    pub date: NaiveDateTime,
    /// May be empty when the article names no author.
    pub author: String,
    pub category: String,
    pub category_tr: String,
    pub tags: Vec<String>,
    pub tags_tr: Vec<String>,
    /// Absolute URL the article was scraped from; the record's unique key.
    pub source_url: String,
    pub canonical_url: String,
    pub excerpt: String,
    pub excerpt_tr: String,
    /// Sanitized body HTML with local image paths.
    pub content: String,
    pub content_tr: String,
    /// Estimated reading time in minutes, `ceil(words / 200)`, minimum 1.
    pub reading_time: u32,
    /// Local path of the lead image, `null` when the article has none.
    pub hero_image: Option<String>,
    pub images: Vec<String>,
    pub published: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_record() -> ArticleRecord {
        ArticleRecord {
            title: "Parallel Query in Postgres".to_string(),
            title_tr: "Parallel Query in Postgres".to_string(),
            slug: "parallel-query-in-postgres".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 5, 6)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            author: "Postgres Pro".to_string(),
            category: "PostgreSQL".to_string(),
            category_tr: "PostgreSQL".to_string(),
            tags: vec!["performance".to_string()],
            tags_tr: vec!["performance".to_string()],
            source_url: "https://postgrespro.com/blog/pgsql/12345".to_string(),
            canonical_url: "https://postgrespro.com/blog/pgsql/12345".to_string(),
            excerpt: "A short excerpt.".to_string(),
            excerpt_tr: "A short excerpt.".to_string(),
            content: "<p>Body</p>".to_string(),
            content_tr: "<p>Body</p>".to_string(),
            reading_time: 1,
            hero_image: None,
            images: vec![],
            published: true,
        }
    }

    #[test]
    fn test_serializes_camel_case_field_names() {
        let json = serde_json::to_string(&sample_record()).unwrap();
        assert!(json.contains("\"titleTr\""));
        assert!(json.contains("\"sourceUrl\""));
        assert!(json.contains("\"canonicalUrl\""));
        assert!(json.contains("\"readingTime\""));
        assert!(json.contains("\"heroImage\""));
        assert!(json.contains("\"categoryTr\""));
        assert!(!json.contains("\"title_tr\""));
    }

    #[test]
    fn test_date_serializes_iso_8601_without_offset() {
        let json = serde_json::to_string(&sample_record()).unwrap();
        assert!(json.contains("\"date\":\"2025-05-06T00:00:00\""));
    }

    #[test]
    fn test_absent_hero_image_serializes_null() {
        let json = serde_json::to_string(&sample_record()).unwrap();
        assert!(json.contains("\"heroImage\":null"));
    }

    #[test]
    fn test_round_trip() {
        let record = sample_record();
        let json = serde_json::to_string_pretty(&record).unwrap();
        let back: ArticleRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
