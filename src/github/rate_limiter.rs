use crate::github::models::RateLimitStatus;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Outcome of consulting the rate limiter before the next request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// Quota left (or unknown); go ahead immediately
    Open,
    /// Slept until the quota reset
    Waited(Duration),
    /// Cancelled while sleeping
    Cancelled,
}

/// Rate limiter for the GitHub API.
///
/// Clones share state, so every repository synced with the same client
/// sees the quota reported by the most recent response.
#[derive(Clone)]
pub struct RateLimiter {
    state: Arc<RwLock<RateLimitStatus>>,
    margin: Duration,
}

impl RateLimiter {
    /// Create a new rate limiter sleeping `margin` past each reset
    pub fn new(margin: Duration) -> Self {
        Self {
            state: Arc::new(RwLock::new(RateLimitStatus::default())),
            margin,
        }
    }

    /// Record the quota reported by a response. Responses without rate
    /// limit headers leave the previous status in place.
    pub async fn update(&self, status: RateLimitStatus) {
        if status.remaining.is_none() {
            return;
        }

        let mut state = self.state.write().await;
        *state = status;

        debug!(
            "Rate limit updated: {:?}/{:?} (resets at {:?})",
            state.remaining, state.limit, state.reset
        );
    }

    pub async fn status(&self) -> RateLimitStatus {
        *self.state.read().await
    }

    /// How long to hold off before the next request, given `status` at `now`.
    ///
    /// Exhausted quota with no reset time is an error: there is nothing
    /// sensible to wait for.
    pub fn delay_for(&self, status: &RateLimitStatus, now: DateTime<Utc>) -> Result<Option<Duration>> {
        if !status.is_exhausted() {
            return Ok(None);
        }

        let reset_at = status.reset_at().ok_or_else(|| {
            Error::RateLimit("quota exhausted and GitHub reported no reset time".to_string())
        })?;

        let until_reset = (reset_at - now).to_std().unwrap_or(Duration::ZERO);
        Ok(Some(until_reset + self.margin))
    }

    /// Sleep until the quota resets when the last response exhausted it
    pub async fn wait_if_needed(&self, cancel: &CancellationToken) -> Result<Gate> {
        let status = self.status().await;
        let Some(delay) = self.delay_for(&status, Utc::now())? else {
            return Ok(Gate::Open);
        };

        warn!(
            "Rate limit exhausted ({:?} requests), waiting {}s for reset",
            status.limit,
            delay.as_secs()
        );

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = cancel.cancelled() => {
                info!("Rate limit wait cancelled");
                return Ok(Gate::Cancelled);
            }
        }

        // The quota has been refilled; the next response will report it
        let mut state = self.state.write().await;
        if state.reset == status.reset {
            state.remaining = None;
        }

        Ok(Gate::Waited(delay))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exhausted(reset: i64) -> RateLimitStatus {
        RateLimitStatus {
            limit: Some(5000),
            remaining: Some(0),
            reset: Some(reset),
        }
    }

    #[test]
    fn test_no_delay_with_quota_left() {
        let limiter = RateLimiter::new(Duration::from_secs(10));
        let status = RateLimitStatus {
            limit: Some(60),
            remaining: Some(1),
            reset: Some(0),
        };
        assert_eq!(limiter.delay_for(&status, Utc::now()).unwrap(), None);
        assert_eq!(
            limiter.delay_for(&RateLimitStatus::default(), Utc::now()).unwrap(),
            None
        );
    }

    #[test]
    fn test_delay_runs_to_reset_plus_margin() {
        let limiter = RateLimiter::new(Duration::from_secs(10));
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();

        let delay = limiter.delay_for(&exhausted(1_700_000_005), now).unwrap();
        assert_eq!(delay, Some(Duration::from_secs(15)));

        // A reset already in the past still waits out the margin
        let delay = limiter.delay_for(&exhausted(1_699_999_000), now).unwrap();
        assert_eq!(delay, Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_exhausted_without_reset_is_fatal() {
        let limiter = RateLimiter::new(Duration::from_secs(10));
        let status = RateLimitStatus {
            limit: None,
            remaining: Some(0),
            reset: None,
        };
        assert!(matches!(
            limiter.delay_for(&status, Utc::now()),
            Err(Error::RateLimit(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_blocks_until_reset() {
        let limiter = RateLimiter::new(Duration::from_secs(1));
        limiter
            .update(exhausted(Utc::now().timestamp() + 5))
            .await;

        let start = tokio::time::Instant::now();
        let gate = limiter
            .wait_if_needed(&CancellationToken::new())
            .await
            .unwrap();

        assert!(matches!(gate, Gate::Waited(_)));
        // reset is whole seconds, so up to one second of the wait may be lost
        assert!(start.elapsed() >= Duration::from_secs(5));
        assert_eq!(limiter.status().await.remaining, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_wait_with_quota_left() {
        let limiter = RateLimiter::new(Duration::from_secs(1));
        limiter
            .update(RateLimitStatus {
                limit: Some(5000),
                remaining: Some(4999),
                reset: Some(Utc::now().timestamp() + 3600),
            })
            .await;

        let start = tokio::time::Instant::now();
        let gate = limiter
            .wait_if_needed(&CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(gate, Gate::Open);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_interrupts_wait() {
        let limiter = RateLimiter::new(Duration::from_secs(1));
        limiter
            .update(exhausted(Utc::now().timestamp() + 3600))
            .await;

        let cancel = CancellationToken::new();
        cancel.cancel();
        let gate = limiter.wait_if_needed(&cancel).await.unwrap();
        assert_eq!(gate, Gate::Cancelled);
    }

    #[tokio::test]
    async fn test_update_ignores_responses_without_headers() {
        let limiter = RateLimiter::new(Duration::from_secs(1));
        limiter.update(exhausted(42)).await;
        limiter.update(RateLimitStatus::default()).await;
        assert_eq!(limiter.status().await.remaining, Some(0));
    }
}
