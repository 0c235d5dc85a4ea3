//! Bounded condition polling.
//!
//! A [`Waiter`] evaluates a condition, and while it is false and the deadline
//! has not passed, sleeps for the poll interval and tries again. The sleep is
//! clamped to the time left before the deadline, so a wait that times out
//! returns at the deadline (plus the cost of the last evaluation) rather than
//! up to a full interval later. A timeout too large to be represented as an
//! instant means there is no deadline.

pub mod outcome;
pub mod spec;

use chrono::Utc;
use std::convert::Infallible;
use std::time::{Duration, Instant};
use tokio::sync::watch;

use crate::error::WaitError;

pub use outcome::WaitOutcome;
pub use spec::{WaitSpec, DEFAULT_POLL_INTERVAL};

/// Polls `condition` every 500 ms until it returns true or `timeout` elapses.
///
/// The condition is always evaluated at least once; with a zero timeout it is
/// evaluated exactly once and its value returned without sleeping.
pub fn wait_for<F>(condition: F, timeout: Duration) -> bool
where
    F: FnMut() -> bool,
{
    Waiter::with_timeout(timeout).wait_for(condition)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Waiter {
    spec: WaitSpec,
}

enum AsyncEnd {
    Finished(bool),
    Interrupted,
}

impl Waiter {
    pub fn new(spec: WaitSpec) -> Self {
        Self { spec }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new(WaitSpec::new(timeout))
    }

    pub fn spec(&self) -> &WaitSpec {
        &self.spec
    }

    /// Blocks the calling thread until `condition` holds or the timeout elapses.
    pub fn wait_for<F>(&self, condition: F) -> bool
    where
        F: FnMut() -> bool,
    {
        self.wait_for_outcome(condition).satisfied
    }

    /// Like [`Waiter::wait_for`], returning a report of the wait.
    pub fn wait_for_outcome<F>(&self, mut condition: F) -> WaitOutcome
    where
        F: FnMut() -> bool,
    {
        match self.poll_blocking(|| Ok::<_, Infallible>(condition())) {
            Ok(outcome) => outcome,
            Err(never) => match never {},
        }
    }

    /// Polls a fallible condition. The first error is returned unchanged and
    /// the condition is not evaluated again.
    pub fn try_wait_for<F, E>(&self, condition: F) -> Result<bool, E>
    where
        F: FnMut() -> Result<bool, E>,
    {
        self.poll_blocking(condition).map(|outcome| outcome.satisfied)
    }

    /// Fallible variant of [`Waiter::wait_for_outcome`].
    pub fn try_wait_for_outcome<F, E>(&self, condition: F) -> Result<WaitOutcome, E>
    where
        F: FnMut() -> Result<bool, E>,
    {
        self.poll_blocking(condition)
    }

    /// Async variant of [`Waiter::wait_for`]; sleeps without blocking the runtime.
    pub async fn wait_for_async<F>(&self, condition: F) -> bool
    where
        F: FnMut() -> bool,
    {
        match self.poll_async(condition, None).await {
            AsyncEnd::Finished(satisfied) => satisfied,
            AsyncEnd::Interrupted => false,
        }
    }

    /// Async wait that stops with [`WaitError::Interrupted`] as soon as the
    /// shutdown channel turns `true` or its sender is dropped while sleeping.
    pub async fn wait_for_until_shutdown<F>(
        &self,
        condition: F,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<bool, WaitError>
    where
        F: FnMut() -> bool,
    {
        match self.poll_async(condition, Some(&mut shutdown)).await {
            AsyncEnd::Finished(satisfied) => Ok(satisfied),
            AsyncEnd::Interrupted => Err(WaitError::Interrupted),
        }
    }

    fn poll_blocking<F, E>(&self, mut condition: F) -> Result<WaitOutcome, E>
    where
        F: FnMut() -> Result<bool, E>,
    {
        let started_at = Utc::now();
        let start = Instant::now();
        let deadline = start.checked_add(self.spec.timeout());
        let mut evaluations = 0u32;

        loop {
            evaluations = evaluations.saturating_add(1);
            if condition()? {
                log::debug!(
                    "Condition satisfied after {:?} ({evaluations} evaluations)",
                    start.elapsed()
                );
                return Ok(WaitOutcome {
                    satisfied: true,
                    evaluations,
                    elapsed: start.elapsed(),
                    started_at,
                });
            }

            let delay = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        log::debug!(
                            "Timed out after {:?} waiting for condition ({evaluations} evaluations)",
                            self.spec.timeout()
                        );
                        return Ok(WaitOutcome {
                            satisfied: false,
                            evaluations,
                            elapsed: start.elapsed(),
                            started_at,
                        });
                    }
                    self.spec.poll_interval().min(deadline - now)
                }
                None => self.spec.poll_interval(),
            };
            log::trace!("Condition not met, polling again in {delay:?}");
            std::thread::sleep(delay);
        }
    }

    async fn poll_async<F>(
        &self,
        mut condition: F,
        mut shutdown: Option<&mut watch::Receiver<bool>>,
    ) -> AsyncEnd
    where
        F: FnMut() -> bool,
    {
        let start = tokio::time::Instant::now();
        let deadline = start.checked_add(self.spec.timeout());

        loop {
            if condition() {
                log::debug!("Condition satisfied after {:?}", start.elapsed());
                return AsyncEnd::Finished(true);
            }

            let delay = match deadline {
                Some(deadline) => {
                    let now = tokio::time::Instant::now();
                    if now >= deadline {
                        log::debug!(
                            "Timed out after {:?} waiting for condition",
                            self.spec.timeout()
                        );
                        return AsyncEnd::Finished(false);
                    }
                    self.spec.poll_interval().min(deadline - now)
                }
                None => self.spec.poll_interval(),
            };
            let interrupted = async {
                match shutdown.as_deref_mut() {
                    // Err means the sender is gone, which counts as shutdown too.
                    Some(rx) => {
                        let _ = rx.wait_for(|stop| *stop).await;
                    }
                    None => std::future::pending::<()>().await,
                }
            };

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = interrupted => {
                    log::debug!("Wait interrupted after {:?}", start.elapsed());
                    return AsyncEnd::Interrupted;
                }
            }
        }
    }
}
