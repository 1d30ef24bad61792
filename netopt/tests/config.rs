use std::time::Duration;

use netopt::{OptimizerConfig, RetryConfig, RetryLimit, RetryPolicy};
use pretty_assertions::assert_eq;

#[test]
fn parses_full_document() {
    let yaml = r#"
default_ttl: 10m
retry:
  max_retries: 5
  base_delay: 500ms
request_timeout: 30s
stale_retention: 2h
sweep_interval: 1m
"#;

    let config = OptimizerConfig::from_yaml(yaml).unwrap();

    assert_eq!(
        config,
        OptimizerConfig {
            default_ttl: Duration::from_secs(600),
            retry: RetryConfig {
                max_retries: RetryLimit::new(5).unwrap(),
                base_delay: Duration::from_millis(500),
            },
            request_timeout: Duration::from_secs(30),
            stale_retention: Duration::from_secs(7200),
            sweep_interval: Some(Duration::from_secs(60)),
        }
    );
}

#[test]
fn missing_fields_take_defaults() {
    let config = OptimizerConfig::from_yaml("request_timeout: 10s\n").unwrap();

    assert_eq!(
        config,
        OptimizerConfig {
            request_timeout: Duration::from_secs(10),
            ..OptimizerConfig::default()
        }
    );
    assert_eq!(
        RetryPolicy::from(config.retry),
        RetryPolicy::new(3, Duration::from_secs(1))
    );
}

#[test]
fn rejects_out_of_range_retries() {
    let yaml = r#"
retry:
  max_retries: 17
"#;

    assert!(OptimizerConfig::from_yaml(yaml).is_err());
}

#[test]
fn rejects_malformed_durations() {
    assert!(OptimizerConfig::from_yaml("default_ttl: soon\n").is_err());
}

#[test]
fn yaml_round_trip() {
    let config = OptimizerConfig {
        default_ttl: Duration::from_secs(90),
        sweep_interval: Some(Duration::from_secs(300)),
        ..OptimizerConfig::default()
    };

    let yaml = config.to_yaml().unwrap();

    assert_eq!(OptimizerConfig::from_yaml(&yaml).unwrap(), config);
}

#[test]
fn sweeper_is_on_by_default_and_can_be_disabled() {
    assert_eq!(
        OptimizerConfig::default().sweep_interval,
        Some(Duration::from_secs(60 * 60))
    );

    let config = OptimizerConfig::from_yaml("sweep_interval: null\n").unwrap();
    assert_eq!(config.sweep_interval, None);
}
