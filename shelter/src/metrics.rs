//! Metrics declaration and recording helpers.
//!
//! Everything here compiles to no-ops unless the `metrics` feature is on.

use shelter_core::{CacheStatus, Strategy};

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
lazy_static! {
    /// Requests handled by the interceptor, by strategy and cache status.
    pub static ref REQUESTS_TOTAL: &'static str = {
        metrics::describe_counter!(
            "shelter_requests_total",
            "Total number of requests handled by the fetch interceptor."
        );
        "shelter_requests_total"
    };
    /// Transport failures observed by the interceptor.
    pub static ref NETWORK_FAILURES_TOTAL: &'static str = {
        metrics::describe_counter!(
            "shelter_network_failures_total",
            "Total number of transport-level failures."
        );
        "shelter_network_failures_total"
    };
    /// Background persists that could not be written.
    pub static ref PERSIST_FAILURES_TOTAL: &'static str = {
        metrics::describe_counter!(
            "shelter_persist_failures_total",
            "Total number of response copies that could not be persisted."
        );
        "shelter_persist_failures_total"
    };
    /// Namespaces removed on activation.
    pub static ref NAMESPACES_DELETED_TOTAL: &'static str = {
        metrics::describe_counter!(
            "shelter_namespaces_deleted_total",
            "Total number of superseded namespaces deleted on activation."
        );
        "shelter_namespaces_deleted_total"
    };
    /// Install attempts, by result.
    pub static ref INSTALL_TOTAL: &'static str = {
        metrics::describe_counter!(
            "shelter_install_total",
            "Total number of install attempts."
        );
        "shelter_install_total"
    };
    /// Histogram of request duration.
    pub static ref REQUEST_DURATION: &'static str = {
        metrics::describe_histogram!(
            "shelter_request_duration_seconds",
            metrics::Unit::Seconds,
            "Duration of intercepted requests in seconds."
        );
        "shelter_request_duration_seconds"
    };

    // Offload manager metrics

    /// Track number of offload tasks spawned.
    pub static ref OFFLOAD_TASKS_SPAWNED: &'static str = {
        metrics::describe_counter!(
            "shelter_offload_tasks_spawned_total",
            "Total number of offload tasks spawned."
        );
        "shelter_offload_tasks_spawned_total"
    };
    /// Track number of offload tasks completed.
    pub static ref OFFLOAD_TASKS_COMPLETED: &'static str = {
        metrics::describe_counter!(
            "shelter_offload_tasks_completed_total",
            "Total number of offload tasks completed."
        );
        "shelter_offload_tasks_completed_total"
    };
    /// Track number of offload tasks that timed out.
    pub static ref OFFLOAD_TASKS_TIMEOUT: &'static str = {
        metrics::describe_counter!(
            "shelter_offload_tasks_timeout_total",
            "Total number of offload tasks that timed out."
        );
        "shelter_offload_tasks_timeout_total"
    };
    /// Track number of offload tasks aborted in favour of a newer task for the same key.
    pub static ref OFFLOAD_TASKS_DEDUPLICATED: &'static str = {
        metrics::describe_counter!(
            "shelter_offload_tasks_deduplicated_total",
            "Total number of offload tasks aborted because a newer one for the same key started."
        );
        "shelter_offload_tasks_deduplicated_total"
    };
    /// Gauge of currently active offload tasks.
    pub static ref OFFLOAD_TASKS_ACTIVE: &'static str = {
        metrics::describe_gauge!(
            "shelter_offload_tasks_active",
            "Number of currently active offload tasks."
        );
        "shelter_offload_tasks_active"
    };
    /// Histogram of offload task duration.
    pub static ref OFFLOAD_TASK_DURATION: &'static str = {
        metrics::describe_histogram!(
            "shelter_offload_task_duration_seconds",
            metrics::Unit::Seconds,
            "Duration of offload tasks in seconds."
        );
        "shelter_offload_task_duration_seconds"
    };
}

/// Records the outcome of one intercepted request.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_request(strategy: Strategy, status: CacheStatus, duration: std::time::Duration) {
    metrics::counter!(
        *REQUESTS_TOTAL,
        "strategy" => strategy.as_str(),
        "status" => status.as_str()
    )
    .increment(1);
    metrics::histogram!(*REQUEST_DURATION, "strategy" => strategy.as_str())
        .record(duration.as_secs_f64());
}

/// No-op version when metrics feature is disabled.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_request(_strategy: Strategy, _status: CacheStatus, _duration: std::time::Duration) {}

/// Records a transport failure.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_network_failure(strategy: Strategy) {
    metrics::counter!(*NETWORK_FAILURES_TOTAL, "strategy" => strategy.as_str()).increment(1);
}

/// No-op version when metrics feature is disabled.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_network_failure(_strategy: Strategy) {}

/// Records a persist that could not be written.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_persist_failure(backend: &str) {
    metrics::counter!(*PERSIST_FAILURES_TOTAL, "backend" => backend.to_string()).increment(1);
}

/// No-op version when metrics feature is disabled.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_persist_failure(_backend: &str) {}

/// Records namespaces removed during activation.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_namespaces_deleted(count: usize) {
    metrics::counter!(*NAMESPACES_DELETED_TOTAL).increment(count as u64);
}

/// No-op version when metrics feature is disabled.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_namespaces_deleted(_count: usize) {}

/// Records an install attempt.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_install(succeeded: bool) {
    let result = if succeeded { "success" } else { "failure" };
    metrics::counter!(*INSTALL_TOTAL, "result" => result).increment(1);
}

/// No-op version when metrics feature is disabled.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_install(_succeeded: bool) {}
