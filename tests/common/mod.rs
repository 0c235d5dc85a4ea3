#![allow(dead_code)]

use condwait::{WaitSpec, Waiter};
use std::time::{Duration, Instant};

/// Waiter with a short poll interval so tests do not spend time sleeping.
pub fn fast_waiter(timeout: Duration) -> Waiter {
    Waiter::new(
        WaitSpec::new(timeout)
            .with_poll_interval(Duration::from_millis(20))
            .expect("valid poll interval"),
    )
}

/// Runs `f` and returns its result together with how long it took.
pub fn timed<T>(f: impl FnOnce() -> T) -> (T, Duration) {
    let start = Instant::now();
    let value = f();
    (value, start.elapsed())
}
