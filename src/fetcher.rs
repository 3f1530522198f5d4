//! Rate-limited HTTP fetching.
//!
//! [`HttpFetcher`] owns the `reqwest` client and enforces a fixed minimum
//! delay between consecutive requests, process-wide, including image
//! downloads. This is a simple scheduling discipline to avoid hammering the
//! source server, not a token-bucket limiter, and there are no retries: a
//! failed fetch is reported upward and the caller decides whether to skip or
//! abort.
//!
//! The time of the last request is an explicit field rather than hidden
//! global state, and the pause computation is a pure function
//! ([`remaining_delay`]) so the pacing policy is unit-testable without
//! sleeping.

use crate::error::{Result, ScrapeError};
use reqwest::Client;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, instrument, warn};

/// Browser-like User-Agent sent with every request; some origins reject
/// default library agents.
const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Connect/read timeout for listing and article pages.
const PAGE_TIMEOUT: Duration = Duration::from_secs(30);

/// Tighter per-request timeout for image downloads.
const IMAGE_TIMEOUT: Duration = Duration::from_secs(10);

/// Trait for fetching remote content.
///
/// The pipeline stages take any `Fetcher`, so failure handling can be
/// exercised in tests with canned responses instead of a live network.
/// [`HttpFetcher`] is the production implementation.
pub trait Fetcher {
    /// Fetch a URL and return its body as text.
    async fn fetch_text(&mut self, url: &str) -> Result<String>;

    /// Fetch a URL and return its body as raw bytes. Used for images.
    async fn fetch_bytes(&mut self, url: &str) -> Result<Vec<u8>>;
}

/// A blocking-style sequential HTTP fetcher with a fixed inter-request delay.
pub struct HttpFetcher {
    client: Client,
    min_delay: Duration,
    last_request_at: Option<Instant>,
}

impl HttpFetcher {
    /// Build a fetcher enforcing `min_delay` between consecutive requests.
    pub fn new(min_delay: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(PAGE_TIMEOUT)
            .build()
            .map_err(ScrapeError::Client)?;
        Ok(Self {
            client,
            min_delay,
            last_request_at: None,
        })
    }

    /// Sleep out whatever remains of the inter-request delay.
    async fn pace(&self) {
        if let Some(wait) = remaining_delay(self.last_request_at, Instant::now(), self.min_delay) {
            debug!(?wait, "Pacing before next request");
            sleep(wait).await;
        }
    }
}

impl Fetcher for HttpFetcher {
    /// Non-2xx statuses and transport failures both map to
    /// [`ScrapeError::Fetch`] carrying the URL; partial content is never
    /// silently returned.
    #[instrument(level = "info", skip(self), fields(%url))]
    async fn fetch_text(&mut self, url: &str) -> Result<String> {
        self.pace().await;
        let outcome = get_text(&self.client, url).await;
        self.last_request_at = Some(Instant::now());
        outcome.map_err(|source| ScrapeError::Fetch {
            url: url.to_string(),
            source,
        })
    }

    #[instrument(level = "debug", skip(self), fields(%url))]
    async fn fetch_bytes(&mut self, url: &str) -> Result<Vec<u8>> {
        self.pace().await;
        let outcome = get_bytes(&self.client, url).await;
        self.last_request_at = Some(Instant::now());
        outcome.map_err(|source| ScrapeError::Fetch {
            url: url.to_string(),
            source,
        })
    }
}

impl std::fmt::Debug for HttpFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpFetcher")
            .field("min_delay", &self.min_delay)
            .field("last_request_at", &self.last_request_at)
            .finish()
    }
}

/// How long to pause before the next request, given when the previous one
/// completed. `None` means no pause is needed.
pub(crate) fn remaining_delay(
    last: Option<Instant>,
    now: Instant,
    min_delay: Duration,
) -> Option<Duration> {
    let elapsed = now.saturating_duration_since(last?);
    (elapsed < min_delay).then(|| min_delay - elapsed)
}

async fn get_text(client: &Client, url: &str) -> reqwest::Result<String> {
    let response = client.get(url).send().await?.error_for_status()?;
    response.text().await
}

async fn get_bytes(client: &Client, url: &str) -> reqwest::Result<Vec<u8>> {
    let response = client
        .get(url)
        .timeout(IMAGE_TIMEOUT)
        .send()
        .await
        .inspect_err(|e| warn!(%url, error = %e, "Image request failed"))?
        .error_for_status()?;
    Ok(response.bytes().await?.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_delay_before_first_request() {
        assert_eq!(
            remaining_delay(None, Instant::now(), Duration::from_secs(2)),
            None
        );
    }

    #[test]
    fn test_full_delay_immediately_after_a_request() {
        let now = Instant::now();
        let wait = remaining_delay(Some(now), now, Duration::from_secs(2)).unwrap();
        assert_eq!(wait, Duration::from_secs(2));
    }

    #[test]
    fn test_partial_delay_after_some_elapsed_time() {
        let now = Instant::now();
        let last = now - Duration::from_millis(1500);
        let wait = remaining_delay(Some(last), now, Duration::from_secs(2)).unwrap();
        assert_eq!(wait, Duration::from_millis(500));
    }

    #[test]
    fn test_no_delay_once_enough_time_has_passed() {
        let now = Instant::now();
        let last = now - Duration::from_secs(3);
        assert_eq!(remaining_delay(Some(last), now, Duration::from_secs(2)), None);
    }

    #[test]
    fn test_zero_min_delay_never_pauses() {
        let now = Instant::now();
        assert_eq!(remaining_delay(Some(now), now, Duration::ZERO), None);
    }
}
