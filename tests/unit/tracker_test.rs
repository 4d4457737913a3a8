//! Tests for performance tracking

use std::time::Duration;

use serial_invoker::config::HistogramConfig;
use serial_invoker::core::{Histogram, PerformanceTracker, UnitVariant};

#[test]
fn test_histogram_counts_equal_runs() {
    let mut h = Histogram::new(HistogramConfig::default());
    for _ in 0..1000 {
        h.add_value(Duration::from_millis(10));
    }
    assert_eq!(h.buckets()[0], 1000);
    assert_eq!(h.buckets().iter().skip(1).sum::<u64>(), 0);
    assert_eq!(h.count(), 1000);
}

#[test]
fn test_histogram_serializes_for_reporting() {
    let mut h = Histogram::new(HistogramConfig {
        base_ms: 0,
        bucket_width_ms: 50,
        bucket_count: 2,
    });
    h.add_value(Duration::from_millis(75));
    let json = serde_json::to_value(&h).unwrap();
    assert_eq!(json["buckets"], serde_json::json!([0, 1]));
    assert_eq!(json["overflow"], 0);
}

#[test]
fn test_tracker_threshold_is_exclusive() {
    let mut t = PerformanceTracker::new(
        "tracker-test",
        HistogramConfig::default(),
        Duration::from_millis(100),
    );
    let v = UnitVariant::from("edge");
    assert!(!t.record("at", &v, Duration::from_millis(100)));
    assert!(t.record("over", &v, Duration::from_millis(101)));
}

#[test]
fn test_tracker_summary_lists_variants() {
    let mut t = PerformanceTracker::new(
        "tracker-test",
        HistogramConfig::default(),
        Duration::from_millis(500),
    );
    t.record("a", &UnitVariant::from("zeta"), Duration::from_millis(1));
    t.record("b", &UnitVariant::from("alpha"), Duration::from_millis(1));

    let summary = t.summarize();
    let alpha = summary.find("alpha:").unwrap();
    let zeta = summary.find("zeta:").unwrap();
    assert!(alpha < zeta);
    assert!(t.histogram(&UnitVariant::from("missing")).is_none());
}
