//! Runtime configuration. Actual configuration *file*
//! loading is out of scope for the core; `Config::load` only reads environment
//! variables, after a best-effort `dotenvy` load. A hosting process may also
//! build a `Config` directly with `Config::default` plus field overrides.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    pub health_freshness_window: Duration,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            health_freshness_window: crate::constants::DISCOVERY_FRESHNESS_WINDOW,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthMonitorConfig {
    pub check_interval: Duration,
    pub heartbeat_timeout: Duration,
    pub probe_timeout: Duration,
}

impl Default for HealthMonitorConfig {
    fn default() -> Self {
        Self {
            check_interval: crate::constants::HEALTH_CHECK_INTERVAL,
            heartbeat_timeout: crate::constants::HEARTBEAT_TIMEOUT,
            probe_timeout: crate::constants::HEALTH_PROBE_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskTrackerConfig {
    pub default_timeout: Duration,
    pub reaper_interval: Duration,
}

impl Default for TaskTrackerConfig {
    fn default() -> Self {
        Self {
            default_timeout: crate::constants::DEFAULT_TASK_TIMEOUT,
            reaper_interval: crate::constants::REAPER_INTERVAL,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    pub call_timeout: Duration,
    /// When true, a missing security agent authorizes low-risk by default
    /// instead of hard-failing.
    pub dev_mode: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            call_timeout: crate::constants::DEFAULT_CALL_TIMEOUT,
            dev_mode: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub discovery: DiscoveryConfig,
    pub health_monitor: HealthMonitorConfig,
    pub task_tracker: TaskTrackerConfig,
    pub orchestrator: OrchestratorConfig,
}

impl Config {
    /// Loads configuration from the environment, falling back to the
    /// defaults above for anything unset. Nothing here is a hard
    /// requirement: the core has no inbound transport of its own, so
    /// credentials (API keys, certificates) arrive as constructor
    /// parameters from the hosting process.
    pub fn load() -> Result<Self> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::info!("loaded .env file from {:?}", path),
            Err(e) => tracing::debug!("no .env file loaded: {}", e),
        }

        let mut config = Config::default();

        if let Some(secs) = parse_env_secs("AGENTFLOW_DISCOVERY_FRESHNESS_SECS")? {
            config.discovery.health_freshness_window = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_env_secs("AGENTFLOW_HEALTH_CHECK_INTERVAL_SECS")? {
            config.health_monitor.check_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_env_secs("AGENTFLOW_HEARTBEAT_TIMEOUT_SECS")? {
            config.health_monitor.heartbeat_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_env_secs("AGENTFLOW_HEALTH_PROBE_TIMEOUT_SECS")? {
            config.health_monitor.probe_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_env_secs("AGENTFLOW_TASK_DEFAULT_TIMEOUT_SECS")? {
            config.task_tracker.default_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_env_secs("AGENTFLOW_TASK_REAPER_INTERVAL_SECS")? {
            config.task_tracker.reaper_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_env_secs("AGENTFLOW_CALL_TIMEOUT_SECS")? {
            config.orchestrator.call_timeout = Duration::from_secs(secs);
        }
        if let Ok(val) = env::var("AGENTFLOW_DEV_MODE") {
            config.orchestrator.dev_mode = matches!(val.as_str(), "1" | "true" | "yes");
        }

        Ok(config)
    }
}

fn parse_env_secs(key: &str) -> Result<Option<u64>> {
    match env::var(key) {
        Ok(raw) => raw
            .parse::<u64>()
            .map(Some)
            .map_err(|e| CoreError::InvalidConfig(format!("{key} must be an integer: {e}"))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests;
