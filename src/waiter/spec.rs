use std::time::Duration;

use crate::error::WaitError;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Timeout and poll interval for a single wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitSpec {
    timeout: Duration,
    poll_interval: Duration,
}

impl WaitSpec {
    /// Spec with the given timeout and the default 500 ms poll interval.
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Build a spec from a timeout expressed in (possibly user-supplied) seconds.
    ///
    /// Negative, non-finite and out-of-range values are rejected.
    pub fn from_secs_f64(timeout_secs: f64) -> Result<Self, WaitError> {
        Duration::try_from_secs_f64(timeout_secs)
            .map(Self::new)
            .map_err(|_| WaitError::InvalidTimeout(timeout_secs))
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Result<Self, WaitError> {
        if poll_interval.is_zero() {
            return Err(WaitError::InvalidPollInterval);
        }
        self.poll_interval = poll_interval;
        Ok(self)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_uses_default_poll_interval() {
        let spec = WaitSpec::new(Duration::from_secs(5));
        assert_eq!(spec.timeout(), Duration::from_secs(5));
        assert_eq!(spec.poll_interval(), Duration::from_millis(500));
    }

    #[test]
    fn test_from_secs_f64() {
        let spec = WaitSpec::from_secs_f64(1.5).unwrap();
        assert_eq!(spec.timeout(), Duration::from_millis(1500));

        let zero = WaitSpec::from_secs_f64(0.0).unwrap();
        assert!(zero.timeout().is_zero());
    }

    #[test]
    fn test_from_secs_f64_rejects_invalid_timeouts() {
        for bad in [
            -0.001,
            -3.0,
            1e20,
            f64::MAX,
            f64::NAN,
            f64::INFINITY,
            f64::NEG_INFINITY,
        ] {
            match WaitSpec::from_secs_f64(bad) {
                Err(WaitError::InvalidTimeout(_)) => {}
                other => panic!("Expected InvalidTimeout for {bad}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_with_poll_interval() {
        let spec = WaitSpec::new(Duration::from_secs(1))
            .with_poll_interval(Duration::from_millis(20))
            .unwrap();
        assert_eq!(spec.poll_interval(), Duration::from_millis(20));

        assert!(matches!(
            WaitSpec::new(Duration::from_secs(1)).with_poll_interval(Duration::ZERO),
            Err(WaitError::InvalidPollInterval)
        ));
    }
}
