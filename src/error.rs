use thiserror::Error;

/// Errors raised by the waiter, its probes and its configuration.
///
/// A timeout is not an error: it is reported as `false` (or an unsatisfied
/// [`WaitOutcome`](crate::waiter::WaitOutcome)).
#[derive(Debug, Error)]
pub enum WaitError {
    #[error("Invalid timeout: {0} (must be a finite, non-negative number of seconds)")]
    InvalidTimeout(f64),

    #[error("Invalid poll interval: must be greater than 0")]
    InvalidPollInterval,

    #[error("Invalid probe: {0}")]
    InvalidProbe(String),

    #[error("Probe failed: {0}")]
    Probe(#[from] std::io::Error),

    #[error("Wait interrupted by shutdown signal")]
    Interrupted,
}
