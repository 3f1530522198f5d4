//! Command-line interface definitions.
//!
//! All options have defaults matching the site this tool was built to mirror,
//! so a bare `blog_mirror` invocation performs a full scrape into `wwwroot/`.

use clap::Parser;

/// Command-line arguments for the blog mirroring run.
///
/// # Examples
///
/// ```sh
/// # Full mirror with defaults
/// blog_mirror
///
/// # Mirror a different index into a scratch directory
/// blog_mirror -i https://example.com/blog -o /tmp/site
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Blog index URL to mirror
    #[arg(short, long, default_value = "https://postgrespro.com/blog")]
    pub index_url: String,

    /// Site root; JSON lands under {root}/content/blog, images under {root}/blog
    #[arg(short, long, default_value = "wwwroot")]
    pub output_root: String,

    /// Minimum seconds between consecutive HTTP requests
    #[arg(long, default_value_t = 2)]
    pub request_delay_secs: u64,
}
