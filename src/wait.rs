//! Bounded polling.
//!
//! Every wait in the crate (element lookup, the post-click settle window, URL
//! and content assertions) is a probe retried on a fixed interval until it
//! succeeds or a deadline passes. The probe always runs at least once, so a
//! zero timeout degenerates to a single check.

// ============================================================================
// Imports
// ============================================================================

use std::future::Future;
use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::trace;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Default time between probes.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Default wait budget (the default command timeout of a run).
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// Wait
// ============================================================================

/// Timing of a bounded wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wait {
    /// Total budget.
    pub timeout: Duration,
    /// Time between probes.
    pub interval: Duration,
}

impl Default for Wait {
    fn default() -> Self {
        Self::new(DEFAULT_WAIT_TIMEOUT)
    }
}

impl Wait {
    /// Creates a wait with the default interval.
    #[inline]
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Sets the probe interval.
    #[inline]
    #[must_use]
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Timeout in milliseconds, for error reporting.
    #[inline]
    #[must_use]
    pub fn timeout_ms(&self) -> u64 {
        self.timeout.as_millis() as u64
    }
}

// ============================================================================
// Probe / Polled
// ============================================================================

/// Result of a single probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe<T> {
    /// The condition holds.
    Ready(T),
    /// Not yet; carries what was observed, for failure messages.
    Pending(Option<String>),
}

/// Result of a whole wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Polled<T> {
    /// The condition held before the deadline.
    Ready(T),
    /// The deadline passed.
    Expired {
        /// Observation of the last probe.
        last: Option<String>,
    },
}

// ============================================================================
// Functions
// ============================================================================

/// Runs `probe` until it is ready or `wait.timeout` elapses.
///
/// Transient probe errors (see [`Error::is_transient`]) count as pending and
/// the wait continues; any other probe error aborts it immediately.
pub async fn poll<T, F, Fut>(wait: Wait, mut probe: F) -> Result<Polled<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Probe<T>>>,
{
    let deadline = Instant::now() + wait.timeout;
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        let last = match probe().await {
            Ok(Probe::Ready(value)) => return Ok(Polled::Ready(value)),
            Ok(Probe::Pending(observed)) => observed,
            Err(e) if e.is_transient() => {
                trace!(attempts, error = %e, "Transient probe error");
                Some(e.to_string())
            }
            Err(e) => return Err(e),
        };

        let now = Instant::now();
        if now >= deadline {
            trace!(attempts, timeout_ms = wait.timeout_ms(), "Wait expired");
            return Ok(Polled::Expired { last });
        }

        sleep(wait.interval.min(deadline - now)).await;
    }
}

/// Like [`poll`], but an expired wait becomes [`Error::Timeout`].
///
/// # Errors
///
/// - [`Error::Timeout`] naming `operation` if the deadline passes
/// - Any non-transient error returned by `probe`
pub async fn poll_until<T, F, Fut>(operation: &str, wait: Wait, probe: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Probe<T>>>,
{
    match poll(wait, probe).await? {
        Polled::Ready(value) => Ok(value),
        Polled::Expired { .. } => Err(Error::timeout(operation, wait.timeout_ms())),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicU32, Ordering};

    use crate::identifiers::ElementId;

    #[tokio::test(start_paused = true)]
    async fn test_ready_on_first_probe() {
        let calls = AtomicU32::new(0);
        let value = poll_until("probe", Wait::new(Duration::from_secs(1)), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(Probe::Ready(7))
        })
        .await
        .expect("ready");

        assert_eq!(value, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ready_after_retries() {
        let calls = AtomicU32::new(0);
        let value = poll_until("probe", Wait::new(Duration::from_secs(1)), || async {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n < 3 {
                Ok(Probe::Pending(None))
            } else {
                Ok(Probe::Ready(n))
            }
        })
        .await
        .expect("ready");

        assert_eq!(value, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_keeps_last_observation() {
        let calls = AtomicU32::new(0);
        let polled: Polled<()> = poll(Wait::new(Duration::from_millis(350)), || async {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            Ok(Probe::Pending(Some(format!("seen {n}"))))
        })
        .await
        .expect("no probe error");

        let seen = calls.load(Ordering::SeqCst);
        assert!(seen >= 4, "probed {seen} times");
        assert_eq!(
            polled,
            Polled::Expired {
                last: Some(format!("seen {}", seen - 1))
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_timeout_probes_once() {
        let calls = AtomicU32::new(0);
        let err = poll_until::<(), _, _>("settle", Wait::new(Duration::ZERO), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(Probe::Pending(None))
        })
        .await
        .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(err, Error::Timeout { timeout_ms: 0, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_error_aborts() {
        let calls = AtomicU32::new(0);
        let err = poll_until::<(), _, _>("probe", Wait::new(Duration::from_secs(5)), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(Error::ConnectionClosed)
        })
        .await
        .unwrap_err();

        assert!(matches!(err, Error::ConnectionClosed));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_error_keeps_polling() {
        let calls = AtomicU32::new(0);
        let value = poll_until("probe", Wait::new(Duration::from_secs(1)), || async {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            match n {
                1 => Err(Error::stale_element(ElementId::new("el-1"))),
                2 => Err(Error::script_error("document replaced")),
                _ => Ok(Probe::Ready(n)),
            }
        })
        .await
        .expect("ready");

        assert_eq!(value, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_error_until_deadline_expires() {
        let polled: Polled<()> = poll(Wait::new(Duration::from_millis(250)), || async {
            Err(Error::stale_element(ElementId::new("el-1")))
        })
        .await
        .expect("transient errors do not abort");

        match polled {
            Polled::Expired { last: Some(last) } => assert!(last.contains("el-1"), "{last}"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
