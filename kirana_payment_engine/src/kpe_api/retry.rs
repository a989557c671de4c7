use std::future::Future;

use log::debug;

/// Bounded retry for a transactional unit of work that can lose optimistic races.
///
/// The policy knows nothing about what it wraps; the caller supplies a classifier that decides which errors are worth
/// another attempt. Terminal errors propagate immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3 }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self { max_attempts: max_attempts.max(1) }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Runs `op` until it succeeds, fails terminally, or the attempt budget runs out. `op` receives the 1-based
    /// attempt number.
    pub async fn run<T, E, P, F, Fut>(&self, is_transient: P, mut op: F) -> Result<T, RetryError<E>>
    where
        P: Fn(&E) -> bool,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut last_error = None;
        for attempt in 1..=self.max_attempts {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if is_transient(&e) => {
                    debug!("Attempt {attempt}/{} lost a transient conflict. Retrying.", self.max_attempts);
                    last_error = Some(e);
                },
                Err(e) => return Err(RetryError::Terminal(e)),
            }
        }
        Err(RetryError::Exhausted { attempts: self.max_attempts, last_error })
    }
}

#[derive(Debug)]
pub enum RetryError<E> {
    /// The operation failed with an error the classifier deemed not worth retrying.
    Terminal(E),
    /// Every attempt lost a transient conflict. `last_error` is the final one, kept for the logs.
    Exhausted { attempts: u32, last_error: Option<E> },
}

#[cfg(test)]
mod test {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[derive(Debug, PartialEq)]
    enum TestError {
        Transient,
        Fatal,
    }

    #[tokio::test]
    async fn first_success_wins() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, _> = RetryPolicy::default()
            .run(
                |e: &TestError| *e == TestError::Transient,
                |attempt| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async move { Ok(attempt) }
                },
            )
            .await;
        assert_eq!(result.unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn transient_errors_are_retried_until_success() {
        let result: Result<u32, _> = RetryPolicy::new(3)
            .run(
                |e: &TestError| *e == TestError::Transient,
                |attempt| async move {
                    if attempt < 3 {
                        Err(TestError::Transient)
                    } else {
                        Ok(attempt)
                    }
                },
            )
            .await;
        assert_eq!(result.unwrap(), 3);
    }

    #[tokio::test]
    async fn terminal_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = RetryPolicy::new(5)
            .run(
                |e: &TestError| *e == TestError::Transient,
                |_| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Err(TestError::Fatal) }
                },
            )
            .await;
        assert!(matches!(result, Err(RetryError::Terminal(TestError::Fatal))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn the_attempt_budget_is_bounded() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = RetryPolicy::new(3)
            .run(
                |e: &TestError| *e == TestError::Transient,
                |_| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Err(TestError::Transient) }
                },
            )
            .await;
        assert!(matches!(result, Err(RetryError::Exhausted { attempts: 3, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
