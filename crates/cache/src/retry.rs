use crate::error::Result;
use std::time::Duration;

/// Default delay step; attempt `n` of `retries` waits `n / retries` of it.
const DEFAULT_STEP: Duration = Duration::from_secs(10);

/// Re-runs a failing async operation a bounded number of times.
///
/// Only errors whose kind [is retryable](crate::error::ErrorKind::is_retryable)
/// are retried. The delay before each retry grows linearly, reaching the full
/// step before the last attempt.
#[derive(Debug, Clone, Copy)]
pub struct Retry {
    retries: u32,
    step: Duration,
}

impl Retry {
    pub fn new(retries: u32) -> Self {
        Self { retries, step: DEFAULT_STEP }
    }

    pub fn with_delay(mut self, step: Duration) -> Self {
        self.step = step;
        self
    }

    /// Delay before retry number `attempt` (1-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        if self.retries == 0 {
            return Duration::ZERO;
        }
        self.step.mul_f64(f64::from(attempt.min(self.retries)) / f64::from(self.retries))
    }

    pub async fn run<T, F, Fut>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) if attempt < self.retries && err.is_retryable() => {
                    attempt += 1;
                    let delay = self.delay(attempt);
                    let kind: &crate::error::ErrorKind = &err;
                    tracing::warn!(error = %kind, attempt, retries = self.retries, ?delay, "retrying");
                    tokio::time::sleep(delay).await;
                },
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use rstest::rstest;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[rstest]
    #[case(4, 1, 2_500)]
    #[case(4, 4, 10_000)]
    #[case(1, 1, 10_000)]
    #[case(0, 1, 0)]
    fn test_delay_is_linear(#[case] retries: u32, #[case] attempt: u32, #[case] millis: u64) {
        assert_eq!(Retry::new(retries).delay(attempt), Duration::from_millis(millis));
    }

    #[rstest]
    #[case(ErrorKind::Download("https://example.com/a.tgz".to_string()), 3, 3)]
    #[case(ErrorKind::Io, 0, 1)]
    #[case(ErrorKind::HttpStatus { url: "https://example.com/a.tgz".to_string(), status: 404 }, 3, 1)]
    #[case(ErrorKind::InvalidManifest, 3, 1)]
    #[tokio::test]
    async fn test_attempts(#[case] kind: ErrorKind, #[case] retries: u32, #[case] expected: u32) {
        let calls = AtomicU32::new(0);
        let calls = &calls;
        // Fails twice before succeeding.
        let result = Retry::new(retries)
            .with_delay(Duration::ZERO)
            .run(|| {
                let kind = kind.clone();
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                        exn::bail!(kind);
                    }
                    Ok::<_, crate::error::Error>(calls.load(Ordering::SeqCst))
                }
            })
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), expected);
        assert_eq!(result.is_ok(), expected == 3);
    }
}
