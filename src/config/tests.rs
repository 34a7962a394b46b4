use super::*;
use serial_test::serial;
use std::env;

fn cleanup_test_env() {
    for key in [
        "AGENTFLOW_DISCOVERY_FRESHNESS_SECS",
        "AGENTFLOW_HEALTH_CHECK_INTERVAL_SECS",
        "AGENTFLOW_HEARTBEAT_TIMEOUT_SECS",
        "AGENTFLOW_HEALTH_PROBE_TIMEOUT_SECS",
        "AGENTFLOW_TASK_DEFAULT_TIMEOUT_SECS",
        "AGENTFLOW_TASK_REAPER_INTERVAL_SECS",
        "AGENTFLOW_CALL_TIMEOUT_SECS",
        "AGENTFLOW_DEV_MODE",
    ] {
        env::remove_var(key);
    }
}

#[test]
#[serial]
fn defaults_match_constants() {
    cleanup_test_env();
    let config = Config::load().unwrap();
    assert_eq!(
        config.discovery.health_freshness_window,
        crate::constants::DISCOVERY_FRESHNESS_WINDOW
    );
    assert_eq!(
        config.health_monitor.check_interval,
        crate::constants::HEALTH_CHECK_INTERVAL
    );
    assert!(!config.orchestrator.dev_mode);
    cleanup_test_env();
}

#[test]
#[serial]
fn env_overrides_are_applied() {
    cleanup_test_env();
    env::set_var("AGENTFLOW_HEARTBEAT_TIMEOUT_SECS", "120");
    env::set_var("AGENTFLOW_DEV_MODE", "true");

    let config = Config::load().unwrap();
    assert_eq!(
        config.health_monitor.heartbeat_timeout,
        Duration::from_secs(120)
    );
    assert!(config.orchestrator.dev_mode);

    cleanup_test_env();
}

#[test]
#[serial]
fn invalid_numeric_override_is_rejected() {
    cleanup_test_env();
    env::set_var("AGENTFLOW_CALL_TIMEOUT_SECS", "not-a-number");

    let result = Config::load();
    assert!(matches!(result, Err(CoreError::InvalidConfig(_))));

    cleanup_test_env();
}
