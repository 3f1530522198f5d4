//! Output generation.
//!
//! One submodule, [`json`], writes each [`crate::models::ArticleRecord`] as a
//! pretty-printed JSON file under `{output_root}/content/blog/{slug}.json`.
//! Image files are written earlier, by the image localizer, so that a record
//! never references a file that does not exist yet.

pub mod json;
