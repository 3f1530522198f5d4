//! The extraction pipeline, stage by stage.
//!
//! Every article flows through the stages strictly in order; one article is
//! fully processed, image downloads included, before the next begins.
//!
//! | Stage | Module | Responsibility |
//! |-------|--------|----------------|
//! | 1. Discover | [`listing`] | Walk the paginated listing index, collect unique article URLs |
//! | 2. Parse | [`article`] | Extract structured fields from one article's HTML |
//! | 3. Sanitize | [`sanitize`] | Strip ads, subscription prompts, and chrome from the body |
//! | 4. Localize | [`images`] | Download referenced images, rewrite references to local paths |
//!
//! Stage 5, writing the JSON record, lives in [`crate::outputs::json`].

pub mod article;
pub mod images;
pub mod listing;
pub mod sanitize;
