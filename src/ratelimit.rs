use std::time::Duration;

use crate::slack::{SlackApi, SlackError};

/// Wait used when a rate-limit response carries no usable `Retry-After`.
pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(1);

/// Blocking delay source. Production code sleeps the thread; tests record.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Optional bounds on rate-limit retrying. The default has none, so a call
/// keeps waiting for as long as Slack keeps answering 429.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: Option<u32>,
    pub max_total_wait: Option<Duration>,
}

impl RetryPolicy {
    pub fn unbounded() -> Self {
        Self::default()
    }

    fn allows(&self, retries_so_far: u32, total_wait: Duration) -> bool {
        let retries_ok = self.max_retries.is_none_or(|max| retries_so_far < max);
        let wait_ok = self.max_total_wait.is_none_or(|max| total_wait <= max);
        retries_ok && wait_ok
    }
}

/// Run `op`, retrying it for as long as it fails with `SlackError::RateLimited`.
///
/// Each retry first sleeps for the server's `Retry-After` (or
/// `DEFAULT_RETRY_AFTER`). Every other error is returned on the first attempt.
pub fn call_with_backoff<T, F>(
    policy: &RetryPolicy,
    sleeper: &dyn Sleeper,
    mut op: F,
) -> Result<T, SlackError>
where
    F: FnMut() -> Result<T, SlackError>,
{
    let mut retries = 0u32;
    let mut waited = Duration::ZERO;

    loop {
        match op() {
            Err(SlackError::RateLimited { retry_after }) => {
                let delay = retry_after.unwrap_or(DEFAULT_RETRY_AFTER);
                if !policy.allows(retries, waited + delay) {
                    return Err(SlackError::RateLimitExhausted {
                        attempts: retries + 1,
                        waited,
                    });
                }
                tracing::warn!(
                    "Rate limited. Retrying after {} seconds...",
                    delay.as_secs_f64()
                );
                sleeper.sleep(delay);
                retries += 1;
                waited += delay;
            }
            result => return result,
        }
    }
}

/// A Slack connection bundled with the sleeper and retry policy every call
/// through it should use.
pub struct ApiContext<'a> {
    pub api: &'a dyn SlackApi,
    pub sleeper: &'a dyn Sleeper,
    pub retry: RetryPolicy,
}

impl<'a> ApiContext<'a> {
    pub fn new(api: &'a dyn SlackApi, sleeper: &'a dyn Sleeper, retry: RetryPolicy) -> Self {
        Self {
            api,
            sleeper,
            retry,
        }
    }

    /// Invoke one API operation through `call_with_backoff`.
    pub fn call<T, F>(&self, mut op: F) -> Result<T, SlackError>
    where
        F: FnMut(&dyn SlackApi) -> Result<T, SlackError>,
    {
        call_with_backoff(&self.retry, self.sleeper, || op(self.api))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    #[derive(Default)]
    struct RecordingSleeper {
        slept: RefCell<Vec<Duration>>,
    }

    impl Sleeper for RecordingSleeper {
        fn sleep(&self, duration: Duration) {
            self.slept.borrow_mut().push(duration);
        }
    }

    fn rate_limited(secs: Option<u64>) -> SlackError {
        SlackError::RateLimited {
            retry_after: secs.map(Duration::from_secs),
        }
    }

    #[test]
    fn test_success_returns_without_sleeping() {
        let sleeper = RecordingSleeper::default();
        let result = call_with_backoff(&RetryPolicy::unbounded(), &sleeper, || Ok::<_, SlackError>(7));
        assert_eq!(result.unwrap(), 7);
        assert!(sleeper.slept.borrow().is_empty());
    }

    #[test]
    fn test_rate_limit_then_success_waits_retry_after() {
        let sleeper = RecordingSleeper::default();
        let calls = Cell::new(0);
        let result = call_with_backoff(&RetryPolicy::unbounded(), &sleeper, || {
            calls.set(calls.get() + 1);
            if calls.get() == 1 {
                Err(rate_limited(Some(2)))
            } else {
                Ok("page")
            }
        });
        assert_eq!(result.unwrap(), "page");
        assert_eq!(calls.get(), 2);
        assert_eq!(*sleeper.slept.borrow(), vec![Duration::from_secs(2)]);
    }

    #[test]
    fn test_missing_retry_after_defaults_to_one_second() {
        let sleeper = RecordingSleeper::default();
        let calls = Cell::new(0);
        call_with_backoff(&RetryPolicy::unbounded(), &sleeper, || {
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                Err(rate_limited(None))
            } else {
                Ok(())
            }
        })
        .unwrap();
        assert_eq!(*sleeper.slept.borrow(), vec![DEFAULT_RETRY_AFTER; 2]);
    }

    #[test]
    fn test_unbounded_policy_keeps_retrying() {
        let sleeper = RecordingSleeper::default();
        let calls = Cell::new(0);
        call_with_backoff(&RetryPolicy::unbounded(), &sleeper, || {
            calls.set(calls.get() + 1);
            if calls.get() <= 50 {
                Err(rate_limited(Some(1)))
            } else {
                Ok(())
            }
        })
        .unwrap();
        assert_eq!(calls.get(), 51);
        assert_eq!(sleeper.slept.borrow().len(), 50);
    }

    #[test]
    fn test_other_errors_propagate_immediately() {
        let sleeper = RecordingSleeper::default();
        let calls = Cell::new(0);
        let err = call_with_backoff(&RetryPolicy::unbounded(), &sleeper, || {
            calls.set(calls.get() + 1);
            Err::<(), _>(SlackError::Api {
                method: "conversations.list".to_string(),
                error: "invalid_auth".to_string(),
            })
        })
        .unwrap_err();
        assert!(matches!(err, SlackError::Api { .. }));
        assert_eq!(calls.get(), 1);
        assert!(sleeper.slept.borrow().is_empty());
    }

    #[test]
    fn test_max_retries_escape_hatch() {
        let sleeper = RecordingSleeper::default();
        let calls = Cell::new(0);
        let policy = RetryPolicy {
            max_retries: Some(2),
            max_total_wait: None,
        };
        let err = call_with_backoff(&policy, &sleeper, || {
            calls.set(calls.get() + 1);
            Err::<(), _>(rate_limited(Some(1)))
        })
        .unwrap_err();
        assert_eq!(calls.get(), 3);
        assert_eq!(sleeper.slept.borrow().len(), 2);
        match err {
            SlackError::RateLimitExhausted { attempts, waited } => {
                assert_eq!(attempts, 3);
                assert_eq!(waited, Duration::from_secs(2));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_max_total_wait_escape_hatch() {
        let sleeper = RecordingSleeper::default();
        let policy = RetryPolicy {
            max_retries: None,
            max_total_wait: Some(Duration::from_secs(5)),
        };
        let err = call_with_backoff(&policy, &sleeper, || Err::<(), _>(rate_limited(Some(3))))
            .unwrap_err();
        // 3s fits, a second 3s would exceed the 5s budget
        assert!(matches!(err, SlackError::RateLimitExhausted { attempts: 2, .. }));
        assert_eq!(*sleeper.slept.borrow(), vec![Duration::from_secs(3)]);
    }
}
