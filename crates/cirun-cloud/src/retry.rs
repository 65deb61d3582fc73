//! Retry with backoff for eventually consistent provider APIs

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Retry configuration for provider operations
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first one
    pub max_attempts: u32,

    /// Delay before the second attempt
    pub initial_delay: Duration,

    /// Upper bound for the delay between attempts
    pub max_delay: Duration,

    /// Backoff multiplier applied after each failed attempt
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Same delay between every attempt
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay: delay,
            max_delay: delay,
            backoff_multiplier: 1.0,
        }
    }

    fn next_delay(&self, delay: Duration) -> Duration {
        delay
            .mul_f64(self.backoff_multiplier.max(1.0))
            .min(self.max_delay)
    }
}

/// Run `op` until it succeeds or `max_attempts` is reached
///
/// `op` receives the 1-based attempt number. The error of the last attempt
/// is returned when all attempts fail.
pub async fn retry<T, E, F, Fut>(config: &RetryConfig, mut op: F) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let max_attempts = config.max_attempts.max(1);
    let mut delay = config.initial_delay;
    let mut attempt = 1;

    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) if attempt >= max_attempts => return Err(err),
            Err(err) => {
                tracing::debug!(
                    "Attempt {}/{} failed, retrying in {:?}: {}",
                    attempt,
                    max_attempts,
                    delay,
                    err
                );
                tokio::time::sleep(delay).await;
                delay = config.next_delay(delay);
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn quick(max_attempts: u32) -> RetryConfig {
        RetryConfig::fixed(max_attempts, Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_stops_at_first_success() {
        let calls = Cell::new(0);
        let result: Result<u32, String> = retry(&quick(10), |attempt| {
            calls.set(calls.get() + 1);
            async move {
                if attempt < 3 {
                    Err(format!("not yet ({attempt})"))
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;

        assert_eq!(result, Ok(3));
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn test_gives_up_with_last_error() {
        let calls = Cell::new(0);
        let result: Result<(), String> = retry(&quick(4), |attempt| {
            calls.set(calls.get() + 1);
            async move { Err(format!("failure {attempt}")) }
        })
        .await;

        assert_eq!(result, Err("failure 4".to_string()));
        assert_eq!(calls.get(), 4);
    }

    #[tokio::test]
    async fn test_zero_attempts_still_runs_once() {
        let calls = Cell::new(0);
        let _: Result<(), &str> = retry(&quick(0), |_| {
            calls.set(calls.get() + 1);
            async { Err("nope") }
        })
        .await;
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_backoff_is_capped() {
        let config = RetryConfig {
            max_attempts: 5,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(3),
            backoff_multiplier: 2.0,
        };
        assert_eq!(config.next_delay(Duration::from_secs(1)), Duration::from_secs(2));
        assert_eq!(config.next_delay(Duration::from_secs(2)), Duration::from_secs(3));

        let fixed = RetryConfig::fixed(10, Duration::from_secs(3));
        assert_eq!(fixed.next_delay(Duration::from_secs(3)), Duration::from_secs(3));
    }
}
