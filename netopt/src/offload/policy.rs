//! Limits applied to background tasks.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// What happens to a background task that outlives its time limit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnOverrun {
    /// Abort the task.
    #[default]
    Cancel,
    /// Let it finish and log a warning.
    Warn,
}

/// Configuration of an [`OffloadManager`](super::OffloadManager).
///
/// ```
/// use std::time::Duration;
/// use netopt::offload::{OffloadConfig, OnOverrun};
///
/// let config = OffloadConfig::default()
///     .time_limit(Duration::from_secs(30))
///     .on_overrun(OnOverrun::Warn);
/// assert!(config.deduplicate_refreshes);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OffloadConfig {
    /// Longest a task may run. `None` lets tasks run to completion.
    #[serde(with = "humantime_serde")]
    pub time_limit: Option<Duration>,
    /// Applied once `time_limit` has elapsed.
    pub on_overrun: OnOverrun,
    /// Skip a refresh of a cache entry while another refresh of the same
    /// entry is still running.
    pub deduplicate_refreshes: bool,
}

impl Default for OffloadConfig {
    fn default() -> Self {
        Self {
            time_limit: None,
            on_overrun: OnOverrun::Cancel,
            deduplicate_refreshes: true,
        }
    }
}

impl OffloadConfig {
    /// Limits how long a task may run.
    pub fn time_limit(self, limit: Duration) -> Self {
        Self {
            time_limit: Some(limit),
            ..self
        }
    }

    /// Sets what happens once the time limit has elapsed.
    pub fn on_overrun(self, on_overrun: OnOverrun) -> Self {
        Self { on_overrun, ..self }
    }

    /// Enables or disables refresh deduplication.
    pub fn deduplicate_refreshes(self, enabled: bool) -> Self {
        Self {
            deduplicate_refreshes: enabled,
            ..self
        }
    }
}
