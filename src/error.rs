//! Error types for the mirroring pipeline.
//!
//! Each variant corresponds to one failure stage and carries enough context
//! (URL, path) to be actionable in logs. Propagation policy:
//!
//! - [`ScrapeError::Fetch`] on a listing page and [`ScrapeError::Discovery`]
//!   abort the run with a non-zero exit.
//! - [`ScrapeError::Fetch`] on an article page, [`ScrapeError::Parse`], and
//!   [`ScrapeError::Write`] are fatal for that article only; the run continues.
//! - An image fetch failure is not an error at all: the remote reference is
//!   kept and the failure is counted.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Errors that can occur while mirroring a blog.
#[derive(Error, Debug)]
pub enum ScrapeError {
    /// Network or HTTP-status failure fetching a URL.
    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Article HTML yielded neither a title nor a readable body.
    #[error("article at {url} has neither title nor readable body")]
    Parse { url: String },

    /// The listing produced zero article URLs, which signals a layout change
    /// on the source site rather than a transient condition.
    #[error("no article links found under {index_url}; listing layout may have changed")]
    Discovery { index_url: String },

    /// Filesystem write failure for a JSON document or image file.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A URL that could not be parsed or resolved.
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    /// HTTP client construction failure at startup.
    #[error("failed to build HTTP client: {0}")]
    Client(reqwest::Error),
}
