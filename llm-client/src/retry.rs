//! Retry policy for provider calls.
//!
//! The default is a fixed delay between a fixed number of attempts; a
//! backoff factor above 1.0 turns it into exponential backoff.

use std::time::Duration;

use crate::error::{LlmError, Result};
use crate::provider::{LlmProvider, LlmRequest, LlmResponse};

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
    pub backoff_factor: f32,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fixed(3, Duration::from_secs(10))
    }
}

impl RetryPolicy {
    /// Same delay before every retry.
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
            backoff_factor: 1.0,
            max_delay: delay,
        }
    }

    /// A single attempt, no retries.
    pub fn none() -> Self {
        Self::fixed(1, Duration::ZERO)
    }

    pub fn with_backoff(mut self, factor: f32, max_delay: Duration) -> Self {
        self.backoff_factor = factor.max(1.0);
        self.max_delay = max_delay.max(self.delay);
        self
    }

    /// Delay before retry number `attempt` (1-based), honouring a server hint.
    pub fn delay_for(&self, attempt: u32, error: &LlmError) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let scaled = self.delay.as_secs_f32() * self.backoff_factor.powi(exponent);
        let planned = Duration::from_secs_f32(scaled.min(self.max_delay.as_secs_f32()));

        match error.retry_after() {
            Some(secs) => planned.max(Duration::from_secs(secs)),
            None => planned,
        }
    }
}

/// Run `request` against `provider`, retrying retryable failures.
pub async fn complete_with_retry(
    provider: &dyn LlmProvider,
    request: &LlmRequest,
    policy: &RetryPolicy,
) -> Result<LlmResponse> {
    let mut attempt = 0;

    loop {
        attempt += 1;

        match provider.complete(request.clone()).await {
            Ok(response) => return Ok(response),
            Err(e) if e.is_retryable() && attempt < policy.max_attempts => {
                let delay = policy.delay_for(attempt, &e);
                log::warn!(
                    "{} request failed (attempt {}/{}): {}; retrying in {:?}",
                    provider.name(),
                    attempt,
                    policy.max_attempts,
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::MockProvider;

    fn overloaded() -> LlmError {
        LlmError::ServerOverloaded {
            message: "busy".to_string(),
        }
    }

    #[test]
    fn test_fixed_delay_is_constant() {
        let policy = RetryPolicy::fixed(5, Duration::from_secs(10));
        let err = overloaded();
        assert_eq!(policy.delay_for(1, &err), Duration::from_secs(10));
        assert_eq!(policy.delay_for(4, &err), Duration::from_secs(10));
    }

    #[test]
    fn test_backoff_is_capped() {
        let policy = RetryPolicy::fixed(5, Duration::from_secs(10))
            .with_backoff(2.0, Duration::from_secs(30));
        let err = overloaded();
        assert_eq!(policy.delay_for(1, &err), Duration::from_secs(10));
        assert_eq!(policy.delay_for(2, &err), Duration::from_secs(20));
        assert_eq!(policy.delay_for(3, &err), Duration::from_secs(30));
    }

    #[test]
    fn test_retry_after_hint_wins_when_longer() {
        let policy = RetryPolicy::fixed(3, Duration::from_secs(1));
        let err = LlmError::RateLimited {
            retry_after: Some(7),
        };
        assert_eq!(policy.delay_for(1, &err), Duration::from_secs(7));
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let provider = MockProvider::fails_then_succeeds(2, overloaded(), "ok");
        let policy = RetryPolicy::fixed(3, Duration::ZERO);

        let response = complete_with_retry(&provider, &LlmRequest::new("hi"), &policy)
            .await
            .unwrap();
        assert_eq!(response.content, "ok");
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let provider = MockProvider::always_fails(LlmError::RateLimited { retry_after: None });
        let policy = RetryPolicy::fixed(3, Duration::ZERO);

        let err = complete_with_retry(&provider, &LlmRequest::new("hi"), &policy)
            .await
            .unwrap_err();
        assert!(err.is_rate_limit());
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_returns_immediately() {
        let provider = MockProvider::always_fails(LlmError::ApiError {
            message: "bad key".to_string(),
            status_code: Some(403),
        });
        let policy = RetryPolicy::fixed(5, Duration::ZERO);

        let err = complete_with_retry(&provider, &LlmRequest::new("hi"), &policy)
            .await
            .unwrap_err();
        assert!(err.is_auth_failure());
        assert_eq!(provider.call_count(), 1);
    }
}
