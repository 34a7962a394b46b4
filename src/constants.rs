//! System-wide default values. Every default here is overridable through
//! [`crate::config::Config`]; these constants are what `Config::default()`
//! falls back to.

use std::time::Duration;

/// Default per-task wall-clock deadline.
pub const DEFAULT_TASK_TIMEOUT: Duration = Duration::from_secs(3600);

/// How often the task tracker's reaper wakes to sweep `timeouts`.
pub const REAPER_INTERVAL: Duration = Duration::from_secs(60);

/// How often the health monitor probes active agents.
pub const HEALTH_CHECK_INTERVAL: Duration = Duration::from_secs(60);

/// Heartbeat staleness before an agent is marked `OFFLINE`.
pub const HEARTBEAT_TIMEOUT: Duration = Duration::from_secs(300);

/// Timeout for a single health-endpoint probe.
pub const HEALTH_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Discovery's health-freshness window — independent of the monitor's
/// heartbeat timeout so discovery can be tuned without touching the probe
/// loop.
pub const DISCOVERY_FRESHNESS_WINDOW: Duration = Duration::from_secs(300);

/// Per-agent call timeout for `Agent::execute`.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Max number of tasks `TaskTracker::list_tasks` will ever return in one call.
pub const MAX_LIST_LIMIT: usize = 1000;
