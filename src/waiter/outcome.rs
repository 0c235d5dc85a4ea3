use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::time::Duration;

/// Report of a finished wait.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaitOutcome {
    pub satisfied: bool,
    pub evaluations: u32,
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
    pub started_at: DateTime<Utc>,
}

fn serialize_millis<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
}

impl WaitOutcome {
    pub fn timed_out(&self) -> bool {
        !self.satisfied
    }
}
