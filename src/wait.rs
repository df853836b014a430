//! Wait handlers for asynchronous remote operations.
//!
//! Creating, updating and deleting instances returns before the remote side
//! has finished. [`wait_for`] polls a status check until it reports a terminal
//! state or the configured timeout elapses. Every failure is reported as
//! [`ProviderError::Wait`] so it can be told apart from a failed initiating call.

use std::future::Future;

use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::config::WaitConfig;
use crate::error::{ProviderError, Result};

/// Outcome of a single status poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Poll<T> {
    /// The operation reached its terminal, successful state.
    Done(T),
    /// The operation is still running; carries the observed status.
    Pending(String),
}

/// Poll `check` until it returns [`Poll::Done`], fails, or `config.timeout` elapses.
///
/// `operation` describes what is awaited (e.g. "instance creation") and
/// prefixes every error message.
pub async fn wait_for<T, F, Fut>(operation: &str, config: WaitConfig, mut check: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Poll<T>>>,
{
    let deadline = Instant::now().checked_add(config.timeout).ok_or_else(|| {
        ProviderError::Wait(format!(
            "{}: timeout {:?} is out of range",
            operation, config.timeout
        ))
    })?;
    let mut polls = 0u32;
    loop {
        polls += 1;
        let status = match check().await {
            Ok(Poll::Done(value)) => {
                debug!(operation, polls, "wait finished");
                return Ok(value);
            },
            Ok(Poll::Pending(status)) => status,
            Err(ProviderError::Wait(msg)) => return Err(ProviderError::Wait(msg)),
            Err(err) => {
                return Err(ProviderError::Wait(format!("{}: {}", operation, err)));
            },
        };

        let next_poll = Instant::now().checked_add(config.poll_interval);
        if next_poll.map_or(true, |next| next > deadline) {
            return Err(ProviderError::Wait(format!(
                "{}: timed out after {:?}, last status {:?}",
                operation, config.timeout, status
            )));
        }
        debug!(operation, status = %status, "still waiting");
        sleep(config.poll_interval).await;
    }
}

/// A terminal failure observed while polling.
pub fn failed(operation: &str, status: &str) -> ProviderError {
    ProviderError::Wait(format!("{}: remote operation ended with status {:?}", operation, status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn fast() -> WaitConfig {
        WaitConfig {
            poll_interval: Duration::from_millis(1),
            timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn test_wait_until_done() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result = wait_for("instance creation", fast(), move || {
            let counter = counter.clone();
            async move {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Ok(Poll::Pending("CREATING".to_string()))
                } else {
                    Ok(Poll::Done("ready"))
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(result, "ready");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_wait_times_out() {
        let config = WaitConfig {
            poll_interval: Duration::from_millis(20),
            timeout: Duration::from_millis(50),
        };
        let err = wait_for("instance deletion", config, || async {
            Ok::<Poll<()>, ProviderError>(Poll::Pending("DELETING".into()))
        })
        .await
        .unwrap_err();

        let message = err.to_string();
        assert!(matches!(err, ProviderError::Wait(_)));
        assert!(message.contains("instance deletion"));
        assert!(message.contains("DELETING"));
    }

    #[tokio::test]
    async fn test_unrepresentable_timeout_is_an_error() {
        let config = WaitConfig {
            poll_interval: Duration::from_millis(1),
            timeout: Duration::from_secs(u64::MAX),
        };
        let err = wait_for("instance deletion", config, || async {
            Ok::<Poll<()>, ProviderError>(Poll::Pending("DELETING".into()))
        })
        .await
        .unwrap_err();
        assert!(matches!(err, ProviderError::Wait(_)));
        assert!(err.to_string().contains("out of range"));
    }

    #[tokio::test]
    async fn test_check_errors_become_wait_errors() {
        let err = wait_for("instance update", fast(), || async {
            Err::<Poll<()>, _>(ProviderError::api("reading instance", StatusCode::BAD_GATEWAY, "oops"))
        })
        .await
        .unwrap_err();
        assert!(matches!(err, ProviderError::Wait(_)));
        assert!(err.to_string().contains("HTTP 502"));
    }

    #[tokio::test]
    async fn test_terminal_failure() {
        let err = wait_for("instance creation", fast(), || async {
            Err::<Poll<()>, _>(failed("instance creation", "CREATE_FAILED"))
        })
        .await
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Wait handler error: instance creation: remote operation ended with status \"CREATE_FAILED\""
        );
    }
}
