/// Rate limiting for contact submissions
///
/// Every submit reaches the content store's write API, so submissions are
/// throttled service-wide. Other endpoints only touch in-process state.
use crate::{
    config::RateLimitConfig,
    error::{PortfolioError, PortfolioResult},
};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter as GovernorLimiter,
};
use std::{num::NonZeroU32, sync::Arc, time::Duration};

/// Submission rate limiter
#[derive(Clone)]
pub struct RateLimiter {
    submissions: Option<Arc<GovernorLimiter<NotKeyed, InMemoryState, DefaultClock>>>,
    per_minute: u32,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        let submissions = NonZeroU32::new(config.submissions_per_minute)
            .filter(|_| config.enabled)
            .map(|per_minute| Arc::new(GovernorLimiter::direct(Quota::per_minute(per_minute))));

        Self {
            submissions,
            per_minute: config.submissions_per_minute,
        }
    }

    /// Check the submission quota, consuming one cell on success
    pub fn check_submission(&self) -> PortfolioResult<()> {
        let Some(limiter) = &self.submissions else {
            return Ok(());
        };

        limiter.check().map_err(|_| {
            tracing::warn!(per_minute = self.per_minute, "contact submission rate limited");
            PortfolioError::RateLimitExceeded {
                retry_after: self.retry_after(),
            }
        })
    }

    /// Time until one more submission cell replenishes
    fn retry_after(&self) -> Duration {
        Duration::from_secs(60 / u64::from(self.per_minute.max(1))).max(Duration::from_secs(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_burst_limit() {
        let limiter = RateLimiter::new(&RateLimitConfig {
            enabled: true,
            submissions_per_minute: 3,
        });

        for _ in 0..3 {
            assert_ok!(limiter.check_submission());
        }

        match limiter.check_submission() {
            Err(PortfolioError::RateLimitExceeded { retry_after }) => {
                assert_eq!(retry_after, Duration::from_secs(20));
            }
            other => panic!("expected rate limit error, got {:?}", other),
        }
    }

    #[test]
    fn test_disabled_limiter_allows_everything() {
        let limiter = RateLimiter::new(&RateLimitConfig {
            enabled: false,
            submissions_per_minute: 1,
        });

        for _ in 0..100 {
            assert_ok!(limiter.check_submission());
        }
    }

    #[test]
    fn test_clones_share_quota() {
        let limiter = RateLimiter::new(&RateLimitConfig {
            enabled: true,
            submissions_per_minute: 1,
        });
        let other = limiter.clone();

        assert_ok!(limiter.check_submission());
        assert_err!(other.check_submission());
    }
}
