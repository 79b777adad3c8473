//! Limits applied to background persists.

use std::time::Duration;

/// What happens to a persist that runs longer than allowed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TimeoutPolicy {
    /// Persists run to completion however long they take.
    #[default]
    None,
    /// The persist is aborted once the duration elapses; nothing is written.
    Cancel(Duration),
    /// The persist completes, and a warning is logged if it took longer.
    Warn(Duration),
}

/// Settings of an [`OffloadManager`](super::OffloadManager).
///
/// ```
/// use std::time::Duration;
///
/// use shelter::{OffloadConfig, TimeoutPolicy};
///
/// let config = OffloadConfig::builder()
///     .warn_after(Duration::from_secs(30))
///     .deduplicate(true)
///     .build();
/// assert_eq!(config.timeout_policy, TimeoutPolicy::Warn(Duration::from_secs(30)));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OffloadConfig {
    /// Time limit of one persist.
    pub timeout_policy: TimeoutPolicy,
    /// Abort a running persist when a newer one for the same request key
    /// starts, so the newer response is the one cached.
    ///
    /// Off by default: every completed request is cached in completion order.
    pub deduplicate: bool,
}

impl OffloadConfig {
    /// Starts from the defaults: no time limit, no deduplication.
    pub fn builder() -> OffloadConfigBuilder {
        OffloadConfigBuilder::default()
    }
}

/// Builder for [`OffloadConfig`].
#[derive(Debug, Clone, Default)]
pub struct OffloadConfigBuilder {
    config: OffloadConfig,
}

impl OffloadConfigBuilder {
    /// Sets the time limit policy.
    pub fn timeout_policy(mut self, policy: TimeoutPolicy) -> Self {
        self.config.timeout_policy = policy;
        self
    }

    /// Aborts persists that run longer than `limit`.
    pub fn cancel_after(self, limit: Duration) -> Self {
        self.timeout_policy(TimeoutPolicy::Cancel(limit))
    }

    /// Logs persists that run longer than `limit`.
    pub fn warn_after(self, limit: Duration) -> Self {
        self.timeout_policy(TimeoutPolicy::Warn(limit))
    }

    /// Turns per-key deduplication on or off.
    pub fn deduplicate(mut self, enabled: bool) -> Self {
        self.config.deduplicate = enabled;
        self
    }

    /// Finishes the configuration.
    pub fn build(self) -> OffloadConfig {
        self.config
    }
}
