//! Stopping conditions for benchmark runs

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How long a single sub-workload runs.
///
/// Serialized as `{ duration = "1s" }` or `{ iterations = 10 }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkBudget {
    /// Run until at least this much wall time has elapsed
    Duration(#[serde(with = "humantime_duration")] Duration),
    /// Run exactly this many operations
    Iterations(u64),
}

impl WorkBudget {
    pub fn from_millis(millis: u64) -> Self {
        WorkBudget::Duration(Duration::from_millis(millis))
    }
}

impl Default for WorkBudget {
    fn default() -> Self {
        WorkBudget::Duration(Duration::from_secs(1))
    }
}

mod humantime_duration {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&humantime::format_duration(*duration))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        humantime::parse_duration(&text).map_err(serde::de::Error::custom)
    }
}
