//! Per-variant duration histograms.
//!
//! The tracker lives on the invoker's worker thread and is only reachable
//! from there until the worker stops, when it is handed back by value.

use std::collections::HashMap;
use std::sync::Arc;
use std::fmt::Write as _;
use std::ops::Range;
use std::time::Duration;

use serde::Serialize;
use tracing::warn;

use crate::config::{HistogramConfig, MAX_BUCKET_COUNT};

use super::unit::UnitVariant;

/// Fixed-bucket distribution of durations in milliseconds.
///
/// Bucket `i` covers `[base + i * width, base + (i + 1) * width)`. Values
/// below `base` are counted in bucket 0; values at or beyond the last bucket's
/// upper bound are counted in the overflow bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Histogram {
    base_ms: u64,
    bucket_width_ms: u64,
    buckets: Vec<u64>,
    overflow: u64,
}

impl Histogram {
    /// Create an empty histogram with the given shape.
    ///
    /// The shape is clamped to what validation accepts: width at least 1ms,
    /// between 1 and [`MAX_BUCKET_COUNT`] buckets.
    #[must_use]
    pub fn new(config: HistogramConfig) -> Self {
        Self {
            base_ms: config.base_ms,
            bucket_width_ms: config.bucket_width_ms.max(1),
            buckets: vec![0; config.bucket_count.clamp(1, MAX_BUCKET_COUNT)],
            overflow: 0,
        }
    }

    /// Record one duration.
    pub fn add_value(&mut self, value: Duration) {
        let ms = u64::try_from(value.as_millis()).unwrap_or(u64::MAX);
        let offset = ms.saturating_sub(self.base_ms);
        let index = usize::try_from(offset / self.bucket_width_ms).unwrap_or(usize::MAX);
        match self.buckets.get_mut(index) {
            Some(bucket) => *bucket += 1,
            None => self.overflow += 1,
        }
    }

    /// Counts per regular bucket.
    #[must_use]
    pub fn buckets(&self) -> &[u64] {
        &self.buckets
    }

    /// Count of values past the last regular bucket.
    #[must_use]
    pub const fn overflow(&self) -> u64 {
        self.overflow
    }

    /// Total number of recorded values.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.buckets.iter().sum::<u64>() + self.overflow
    }

    /// Millisecond range covered by bucket `index`, saturating at `u64::MAX`.
    #[must_use]
    pub fn bucket_range(&self, index: usize) -> Range<u64> {
        let index = u64::try_from(index).unwrap_or(u64::MAX);
        let start = self
            .base_ms
            .saturating_add(self.bucket_width_ms.saturating_mul(index));
        start..start.saturating_add(self.bucket_width_ms)
    }

    /// One-line rendering such as `0-50ms: 3, 50-100ms: 1, >=500ms: 0`.
    #[must_use]
    pub fn summarize(&self) -> String {
        let mut out = String::new();
        for (i, count) in self.buckets.iter().enumerate() {
            let range = self.bucket_range(i);
            let _ = write!(out, "{}-{}ms: {count}, ", range.start, range.end);
        }
        let limit = self.bucket_range(self.buckets.len()).start;
        let _ = write!(out, ">={limit}ms: {}", self.overflow);
        out
    }
}

/// Histogram table keyed by unit variant, plus a running unit count.
#[derive(Debug, Clone)]
pub struct PerformanceTracker {
    invoker: Arc<str>,
    shape: HistogramConfig,
    slow_threshold: Duration,
    histograms: HashMap<UnitVariant, Histogram>,
    units_run: u64,
}

impl PerformanceTracker {
    /// Create an empty tracker for the invoker named `invoker`.
    #[must_use]
    pub fn new(
        invoker: impl Into<Arc<str>>,
        shape: HistogramConfig,
        slow_threshold: Duration,
    ) -> Self {
        Self {
            invoker: invoker.into(),
            shape,
            slow_threshold,
            histograms: HashMap::new(),
            units_run: 0,
        }
    }

    /// Record one invocation. Returns true if it exceeded the slow-unit
    /// threshold, in which case a warning has been logged.
    pub fn record(&mut self, name: &str, variant: &UnitVariant, elapsed: Duration) -> bool {
        self.units_run += 1;
        let shape = self.shape;
        self.histograms
            .entry(variant.clone())
            .or_insert_with(|| Histogram::new(shape))
            .add_value(elapsed);

        let slow = elapsed > self.slow_threshold;
        if slow {
            warn!(
                invoker = %self.invoker,
                unit = %name,
                variant = %variant,
                elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
                "Invoker unit ran long"
            );
        }
        slow
    }

    /// Histogram for one variant, if any unit of it has run.
    #[must_use]
    pub fn histogram(&self, variant: &UnitVariant) -> Option<&Histogram> {
        self.histograms.get(variant)
    }

    /// Variants seen so far, sorted.
    #[must_use]
    pub fn variants(&self) -> Vec<&UnitVariant> {
        let mut variants: Vec<_> = self.histograms.keys().collect();
        variants.sort();
        variants
    }

    /// Name of the invoker this tracker belongs to.
    #[must_use]
    pub fn invoker(&self) -> &str {
        &self.invoker
    }

    /// Total invocations recorded.
    #[must_use]
    pub const fn units_run(&self) -> u64 {
        self.units_run
    }

    /// True if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units_run == 0
    }

    /// Multi-line report, one line per variant.
    #[must_use]
    pub fn summarize(&self) -> String {
        let mut out = format!("units run: {}", self.units_run);
        for variant in self.variants() {
            if let Some(histo) = self.histograms.get(variant) {
                let _ = write!(out, "\n{variant}: {}", histo.summarize());
            }
        }
        out
    }
}
