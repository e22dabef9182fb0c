use crate::config::models::AppConfig;
use crate::Duration;

#[test]
fn test_default_config() {
    let config = AppConfig::default();
    assert!(config.validate().is_ok());

    // 验证默认值
    assert_eq!(config.scheduler.max_retries, 3);
    assert_eq!(config.scheduler.retry_base_delay_ms, 1000);
    assert!(config.scheduler.exponential_backoff);
    assert_eq!(config.scheduler.placement_strategy, "least_loaded");
    assert_eq!(config.worker.failure_threshold, 1);
    assert_eq!(config.worker.breaker_timeout_ms, 100);
    assert_eq!(config.monitor.success_rate_threshold, 90.0);
    assert_eq!(config.monitor.distribution_balance_threshold, 50.0);
    assert_eq!(config.observability.alert_level, "all_alerts");
}

#[test]
fn test_config_from_toml() {
    let toml_content = r#"
[scheduler]
max_retries = 5
retry_base_delay_ms = 250
exponential_backoff = false
placement_strategy = "round_robin"

[worker]
local_workers = 4
remote_workers = 0
failure_threshold = 3
breaker_timeout_ms = 500
max_latency_ms = 20

[monitor]
success_rate_threshold = 95.0
failure_rate_threshold = 5.0
average_time_threshold_ms = 200.0
distribution_balance_threshold = 30.0

[observability]
log_level = "debug"
log_format = "json"
alert_level = "verbose"
"#;

    let config = AppConfig::from_toml(toml_content).unwrap();
    assert_eq!(config.scheduler.max_retries, 5);
    assert_eq!(config.scheduler.placement_strategy, "round_robin");
    assert_eq!(config.worker.local_workers, 4);
    assert_eq!(config.worker.remote_workers, 0);
    assert_eq!(config.monitor.failure_rate_threshold, 5.0);
    assert_eq!(config.observability.log_format, "json");
}

#[test]
fn test_partial_toml_uses_defaults() {
    let config = AppConfig::from_toml(
        r#"
[scheduler]
max_retries = 1
"#,
    )
    .unwrap();

    assert_eq!(config.scheduler.max_retries, 1);
    assert_eq!(config.scheduler.retry_base_delay_ms, 1000);
    assert_eq!(config.worker.local_workers, 2);
    assert_eq!(config.observability.log_level, "info");
}

#[test]
fn test_config_toml_roundtrip() {
    let config = AppConfig::default();
    let toml_str = config.to_toml().unwrap();
    let parsed = AppConfig::from_toml(&toml_str).unwrap();
    assert_eq!(config, parsed);
}

#[test]
fn test_derived_policies() {
    let config = AppConfig::from_toml(
        r#"
[scheduler]
max_retries = 4
retry_base_delay_ms = 10
exponential_backoff = true

[worker]
failure_threshold = 2
breaker_timeout_ms = 300
"#,
    )
    .unwrap();

    let policy = config.scheduler.retry_policy();
    assert_eq!(policy.max_retries(), 4);
    assert_eq!(policy.delay(3), Duration::of_millis(40));

    let breaker = config.worker.breaker_config();
    assert_eq!(breaker.failure_threshold, 2);
    assert_eq!(breaker.recovery_timeout, std::time::Duration::from_millis(300));
}
