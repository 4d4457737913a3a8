//! Tests for configuration validation

use serial_invoker::config::{HistogramConfig, InvokerConfig, MAX_BUCKET_COUNT};
use serial_invoker::core::{Invoker, InvokerError, NoopObserver, ResultReceiver, Unit};
use std::sync::Arc;

#[test]
fn test_invoker_config_validation() {
    let valid = InvokerConfig {
        perf_tracking: true,
        slow_unit_threshold_ms: 500,
        histogram: HistogramConfig {
            base_ms: 0,
            bucket_width_ms: 50,
            bucket_count: 10,
        },
        thread_stack_size: Some(2 * 1024 * 1024),
    };
    assert!(valid.validate().is_ok());
}

#[test]
fn test_invoker_config_invalid_bucket_count() {
    let invalid = InvokerConfig::new().with_histogram(HistogramConfig {
        base_ms: 0,
        bucket_width_ms: 50,
        bucket_count: 0,
    });
    assert!(invalid.validate().is_err());
}

#[test]
fn test_invoker_config_bucket_count_upper_bound() {
    let at_limit = InvokerConfig::new().with_histogram(HistogramConfig {
        bucket_count: MAX_BUCKET_COUNT,
        ..HistogramConfig::default()
    });
    assert!(at_limit.validate().is_ok());

    for count in [MAX_BUCKET_COUNT + 1, usize::MAX] {
        let json = format!(r#"{{ "histogram": {{ "bucket_count": {count} }} }}"#);
        let err = InvokerConfig::from_json_str(&json).unwrap_err();
        assert!(err.contains("bucket_count"), "unexpected error: {err}");
    }
}

#[test]
fn test_invoker_config_rejects_overflowing_histogram_range() {
    let json = format!(
        r#"{{ "histogram": {{ "base_ms": {}, "bucket_width_ms": 50, "bucket_count": 10 }} }}"#,
        u64::MAX - 100
    );
    let err = InvokerConfig::from_json_str(&json).unwrap_err();
    assert!(err.contains("overflows"), "unexpected error: {err}");

    let wide = InvokerConfig::new().with_histogram(HistogramConfig {
        base_ms: 0,
        bucket_width_ms: u64::MAX,
        bucket_count: 2,
    });
    assert!(wide.validate().is_err());
}

struct Discard;

impl ResultReceiver for Discard {
    fn post_unit(&self, _unit: Box<dyn Unit>) {}
}

#[test]
fn test_builder_refuses_oversized_histogram() {
    let config = InvokerConfig::new().with_histogram(HistogramConfig {
        bucket_count: usize::MAX,
        ..HistogramConfig::default()
    });
    let result = Invoker::builder("oversized", Arc::new(Discard))
        .config(config)
        .observer(Arc::new(NoopObserver))
        .build();
    assert!(matches!(result, Err(InvokerError::InvalidConfig(_))));
}

#[test]
fn test_invoker_config_invalid_stack_size() {
    let invalid = InvokerConfig::new().with_thread_stack_size(0);
    assert!(invalid.validate().is_err());
}

#[test]
fn test_builder_methods() {
    let cfg = InvokerConfig::new()
        .with_perf_tracking(false)
        .with_slow_unit_threshold_ms(250);
    assert!(!cfg.perf_tracking);
    assert_eq!(cfg.slow_unit_threshold_ms, 250);
}

#[test]
fn test_invoker_config_from_json() {
    let json = r#"{
        "perf_tracking": false,
        "slow_unit_threshold_ms": 1000,
        "histogram": {
            "base_ms": 0,
            "bucket_width_ms": 100,
            "bucket_count": 20
        }
    }"#;

    let config = InvokerConfig::from_json_str(json).unwrap();
    assert!(!config.perf_tracking);
    assert_eq!(config.histogram.bucket_width_ms, 100);
    assert_eq!(config.histogram.bucket_count, 20);
    assert_eq!(config.thread_stack_size, None);
}

#[test]
fn test_invoker_config_partial_json_uses_defaults() {
    let config = InvokerConfig::from_json_str(r#"{ "slow_unit_threshold_ms": 50 }"#).unwrap();
    assert!(config.perf_tracking);
    assert_eq!(config.slow_unit_threshold_ms, 50);
    assert_eq!(config.histogram, HistogramConfig::default());
}

#[test]
fn test_invoker_config_from_json_rejects_invalid() {
    let json = r#"{ "histogram": { "bucket_width_ms": 0 } }"#;
    assert!(InvokerConfig::from_json_str(json).is_err());
    assert!(InvokerConfig::from_json_str("not json").is_err());
}

#[test]
fn test_invoker_config_round_trips_through_serde() {
    let cfg = InvokerConfig::new().with_thread_stack_size(65_536);
    let json = serde_json::to_string(&cfg).unwrap();
    assert_eq!(InvokerConfig::from_json_str(&json).unwrap(), cfg);
}
