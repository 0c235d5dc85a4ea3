pub mod config;
pub mod error;
pub mod probe;
pub mod waiter;

pub use config::{create_sample_config, load_config, WaiterConfig};
pub use error::WaitError;
pub use probe::Probe;
pub use waiter::{wait_for, WaitOutcome, WaitSpec, Waiter, DEFAULT_POLL_INTERVAL};

// Process exit codes for the condwait binary
pub const EXIT_SATISFIED: i32 = 0;
pub const EXIT_TIMED_OUT: i32 = 1;
pub const EXIT_ERROR: i32 = 2;
