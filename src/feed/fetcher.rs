use std::time::Duration;

use futures::stream::{self, StreamExt};
use thiserror::Error;

use crate::store::FeedConfig;

use super::parser::{parse_snapshot, FeedSnapshot};

const MAX_RETRIES: u32 = 3;
const MAX_FEED_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Errors that can occur while turning a configured URL into a feed
/// snapshot: network issues, HTTP errors, and unparseable bodies.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The feed entry in the store has an empty URL, so there is nothing
    /// to request
    #[error("feed has no URL configured")]
    MissingUrl,
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the configured timeout
    #[error("request timed out")]
    Timeout,
    /// Server returned 429 Too Many Requests after max retries
    #[error("rate limited after {0} retries")]
    RateLimited(u32),
    /// Response body exceeded the 10MB size limit
    #[error("response too large")]
    ResponseTooLarge,
    /// Response was incomplete (received fewer bytes than Content-Length)
    #[error("incomplete response: expected {expected} bytes, received {received}")]
    IncompleteResponse { expected: u64, received: usize },
    /// The body arrived intact but is not RSS or Atom
    #[error("not a feed: {0}")]
    NotAFeed(String),
}

impl FetchError {
    /// Distinguishes "the body is not a feed" from transport failures,
    /// which are reported as different fault kinds.
    pub fn is_not_a_feed(&self) -> bool {
        matches!(self, FetchError::NotAFeed(_))
    }
}

/// Fetches every configured feed concurrently, preserving input order.
///
/// Up to `concurrency` requests run at once, but results come back in the
/// same order as `feeds` — reconciliation and the rendered report must
/// mirror the configured feed order exactly, so the buffering here is
/// ordered rather than completion-ordered. Parallelism only hides fetch
/// latency; it never reorders anything observable.
///
/// Each element is the outcome for the feed at the same index. Failures
/// are values, not early returns: one unreachable feed must not stop the
/// sweep.
pub async fn fetch_all(
    client: &reqwest::Client,
    feeds: &[FeedConfig],
    concurrency: usize,
    timeout: Duration,
) -> Vec<Result<FeedSnapshot, FetchError>> {
    if feeds.is_empty() {
        return Vec::new();
    }

    stream::iter(feeds.iter().map(|feed| {
        let client = client.clone();
        let url = feed.url.clone();
        async move { fetch_one(&client, &url, timeout).await }
    }))
    .buffered(concurrency.max(1))
    .collect()
    .await
}

/// Fetches and parses a single feed.
///
/// # Behavior
///
/// - An empty URL short-circuits to [`FetchError::MissingUrl`] without a
///   request.
/// - Each attempt is bounded by `timeout`.
/// - Rate limiting (HTTP 429) and server errors (5xx) trigger exponential
///   backoff with up to 3 retries; 4xx fails immediately.
/// - Response bodies are limited to 10MB, and a body shorter than its
///   Content-Length is retried as an interrupted transfer.
/// - A body that is not RSS/Atom yields [`FetchError::NotAFeed`].
pub async fn fetch_one(
    client: &reqwest::Client,
    url: &str,
    timeout: Duration,
) -> Result<FeedSnapshot, FetchError> {
    if url.trim().is_empty() {
        return Err(FetchError::MissingUrl);
    }

    let mut retry_count = 0;

    let bytes = loop {
        let response = tokio::time::timeout(timeout, client.get(url).send())
            .await
            .map_err(|_| FetchError::Timeout)?
            .map_err(FetchError::Network)?;

        // Handle rate limiting with exponential backoff
        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            if retry_count >= MAX_RETRIES {
                return Err(FetchError::RateLimited(MAX_RETRIES));
            }

            let delay_secs = 2u64.pow(retry_count); // 2s, 4s, 8s
            tracing::warn!(
                feed = %url,
                retry = retry_count,
                delay_secs = delay_secs,
                "Rate limited, backing off"
            );

            tokio::time::sleep(Duration::from_secs(delay_secs)).await;
            retry_count += 1;
            continue;
        }

        // Handle server errors (5xx) with exponential backoff
        if response.status().is_server_error() {
            if retry_count >= MAX_RETRIES {
                return Err(FetchError::HttpStatus(response.status().as_u16()));
            }

            let delay_secs = 2u64.pow(retry_count); // 2s, 4s, 8s
            tracing::warn!(
                feed = %url,
                status = %response.status(),
                retry = retry_count,
                delay_secs = delay_secs,
                "Server error, retrying after delay"
            );

            tokio::time::sleep(Duration::from_secs(delay_secs)).await;
            retry_count += 1;
            continue;
        }

        // Client errors (4xx) fail immediately
        if !response.status().is_success() {
            return Err(FetchError::HttpStatus(response.status().as_u16()));
        }

        // Read response body with size limit and completeness check
        match read_limited_bytes(response, MAX_FEED_SIZE).await {
            Ok(bytes) => break bytes,
            Err(FetchError::IncompleteResponse { expected, received }) => {
                // Interrupted transfer: retry with backoff
                if retry_count >= MAX_RETRIES {
                    return Err(FetchError::IncompleteResponse { expected, received });
                }

                let delay_secs = 2u64.pow(retry_count); // 2s, 4s, 8s
                tracing::debug!(
                    feed = %url,
                    expected = expected,
                    received = received,
                    attempt = retry_count + 1,
                    delay_secs = delay_secs,
                    "Retrying incomplete download"
                );

                tokio::time::sleep(Duration::from_secs(delay_secs)).await;
                retry_count += 1;
                continue;
            }
            Err(e) => return Err(e),
        }
    };

    parse_snapshot(&bytes).map_err(|e| FetchError::NotAFeed(e.to_string()))
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    // Capture Content-Length for completeness check
    let expected_length = response.content_length();

    // Fast path: check Content-Length header
    if let Some(len) = expected_length {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    // A transfer can end early when the connection drops mid-body; callers
    // retry this with backoff.
    if let Some(expected) = expected_length {
        if (bytes.len() as u64) < expected {
            return Err(FetchError::IncompleteResponse {
                expected,
                received: bytes.len(),
            });
        }
    }

    Ok(bytes)
}
