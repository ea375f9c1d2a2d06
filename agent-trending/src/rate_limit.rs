//! Rate limiting utilities for the GitHub search API.
//!
//! Before each search page the remaining quota is checked; when it runs low
//! we sleep until the window resets instead of collecting 403s.

use octocrab::Octocrab;
use std::time::Duration;
use tracing::{info, warn};

/// Maximum time to wait for rate limit reset (1 hour).
const MAX_WAIT_SECS: u64 = 3600;

/// Minimum remaining requests before proactively waiting.
const MIN_REMAINING_THRESHOLD: u32 = 5;

/// Rate limit information for a specific resource.
#[derive(Debug, Clone)]
pub struct RateLimitInfo {
    /// Requests remaining in the current window.
    pub remaining: u32,
    /// Unix timestamp when the rate limit resets.
    pub reset: u64,
    /// Total requests allowed per window.
    pub limit: u32,
}

/// Checks the current rate limit status for search API.
///
/// # Errors
///
/// Returns an error if the rate limit API call fails.
pub async fn check_search_rate_limit(
    octocrab: &Octocrab,
) -> Result<RateLimitInfo, octocrab::Error> {
    let rate_limit = octocrab.ratelimit().get().await?;
    let search = &rate_limit.resources.search;

    Ok(RateLimitInfo {
        remaining: search.remaining as u32,
        reset: search.reset,
        limit: search.limit as u32,
    })
}

/// Seconds to wait before the next request, or `None` if no wait is needed.
fn required_wait(info: &RateLimitInfo, now: u64) -> Option<u64> {
    if info.remaining >= MIN_REMAINING_THRESHOLD || info.reset <= now {
        return None;
    }
    Some(info.reset - now)
}

/// Waits if the rate limit is low, returning true if we waited.
///
/// This function proactively waits when remaining requests fall below
/// `MIN_REMAINING_THRESHOLD` to avoid hitting hard limits.
pub async fn wait_if_needed(info: &RateLimitInfo) -> bool {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    let Some(wait_secs) = required_wait(info, now) else {
        return false;
    };

    if wait_secs > MAX_WAIT_SECS {
        warn!(
            wait_secs,
            max_wait = MAX_WAIT_SECS,
            "Rate limit reset too far in future, capping wait time"
        );
    }

    let actual_wait = wait_secs.min(MAX_WAIT_SECS);
    info!(
        remaining = info.remaining,
        limit = info.limit,
        wait_secs = actual_wait,
        "Search rate limit low, waiting for reset"
    );

    tokio::time::sleep(Duration::from_secs(actual_wait)).await;
    true
}

/// Ensures sufficient rate limit before making search API calls.
///
/// # Errors
///
/// Returns an error if the rate limit check fails.
pub async fn ensure_search_rate_limit(octocrab: &Octocrab) -> Result<(), octocrab::Error> {
    let info = check_search_rate_limit(octocrab).await?;
    wait_if_needed(&info).await;
    Ok(())
}
