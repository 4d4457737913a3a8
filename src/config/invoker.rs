//! Invoker and histogram configuration structures.

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Environment variable toggling performance tracking (`true`/`false`).
pub const ENV_PERF_TRACK: &str = "SERIAL_INVOKER_PERF_TRACK";
/// Environment variable holding the slow-unit warning threshold in milliseconds.
pub const ENV_SLOW_UNIT_MS: &str = "SERIAL_INVOKER_SLOW_UNIT_MS";
/// Environment variable holding the histogram bucket width in milliseconds.
pub const ENV_BUCKET_WIDTH_MS: &str = "SERIAL_INVOKER_BUCKET_WIDTH_MS";
/// Environment variable holding the histogram bucket count.
pub const ENV_BUCKET_COUNT: &str = "SERIAL_INVOKER_BUCKET_COUNT";
/// Environment variable holding the worker thread stack size in bytes.
pub const ENV_STACK_SIZE: &str = "SERIAL_INVOKER_STACK_SIZE";

/// Upper bound on `HistogramConfig::bucket_count`.
pub const MAX_BUCKET_COUNT: usize = 10_000;

/// Shape of the per-variant duration histogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistogramConfig {
    /// Lower bound of bucket 0, in milliseconds.
    pub base_ms: u64,
    /// Width of each bucket, in milliseconds.
    pub bucket_width_ms: u64,
    /// Number of regular buckets; values past the last one land in overflow.
    pub bucket_count: usize,
}

impl Default for HistogramConfig {
    /// Ten buckets of 50ms covering 0 to 500ms.
    fn default() -> Self {
        Self {
            base_ms: 0,
            bucket_width_ms: 50,
            bucket_count: 10,
        }
    }
}

impl HistogramConfig {
    /// Validate histogram dimensions.
    pub fn validate(&self) -> Result<(), String> {
        if self.bucket_width_ms == 0 {
            return Err("bucket_width_ms must be greater than 0".into());
        }
        if self.bucket_count == 0 {
            return Err("bucket_count must be greater than 0".into());
        }
        if self.bucket_count > MAX_BUCKET_COUNT {
            return Err(format!("bucket_count must be at most {MAX_BUCKET_COUNT}"));
        }
        self.upper_bound_ms()
            .ok_or_else(|| "base_ms + bucket_width_ms * bucket_count overflows u64".to_string())?;
        Ok(())
    }

    /// Upper bound of the last regular bucket, `None` if it does not fit in
    /// a `u64`.
    #[must_use]
    pub fn upper_bound_ms(&self) -> Option<u64> {
        u64::try_from(self.bucket_count)
            .ok()
            .and_then(|count| self.bucket_width_ms.checked_mul(count))
            .and_then(|span| self.base_ms.checked_add(span))
    }
}

/// Configuration for a single [`Invoker`](crate::core::Invoker).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvokerConfig {
    /// Whether unit durations are measured and recorded at all.
    pub perf_tracking: bool,
    /// Units running longer than this are logged as slow.
    pub slow_unit_threshold_ms: u64,
    /// Histogram dimensions used for every variant.
    pub histogram: HistogramConfig,
    /// Optional stack size for the worker thread, in bytes.
    pub thread_stack_size: Option<usize>,
}

impl Default for InvokerConfig {
    fn default() -> Self {
        Self {
            perf_tracking: true,
            slow_unit_threshold_ms: 500,
            histogram: HistogramConfig::default(),
            thread_stack_size: None,
        }
    }
}

impl InvokerConfig {
    /// Create the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable performance tracking.
    #[must_use]
    pub const fn with_perf_tracking(mut self, enabled: bool) -> Self {
        self.perf_tracking = enabled;
        self
    }

    /// Set the slow-unit warning threshold.
    #[must_use]
    pub const fn with_slow_unit_threshold_ms(mut self, ms: u64) -> Self {
        self.slow_unit_threshold_ms = ms;
        self
    }

    /// Replace the histogram dimensions.
    #[must_use]
    pub const fn with_histogram(mut self, histogram: HistogramConfig) -> Self {
        self.histogram = histogram;
        self
    }

    /// Set the worker thread stack size.
    #[must_use]
    pub const fn with_thread_stack_size(mut self, bytes: usize) -> Self {
        self.thread_stack_size = Some(bytes);
        self
    }

    /// Slow-unit threshold as a [`Duration`].
    #[must_use]
    pub const fn slow_unit_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_unit_threshold_ms)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        self.histogram
            .validate()
            .map_err(|e| format!("histogram invalid: {e}"))?;
        if self.thread_stack_size == Some(0) {
            return Err("thread_stack_size must be greater than 0".into());
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build configuration from the process environment.
    ///
    /// A `.env` file is loaded first if present. Unset variables keep their
    /// defaults; malformed ones are reported as errors.
    pub fn from_env() -> Result<Self, String> {
        let _ = dotenvy::dotenv();
        let mut cfg = Self::default();

        if let Some(v) = read_var::<bool>(ENV_PERF_TRACK)? {
            cfg.perf_tracking = v;
        }
        if let Some(v) = read_var::<u64>(ENV_SLOW_UNIT_MS)? {
            cfg.slow_unit_threshold_ms = v;
        }
        if let Some(v) = read_var::<u64>(ENV_BUCKET_WIDTH_MS)? {
            cfg.histogram.bucket_width_ms = v;
        }
        if let Some(v) = read_var::<usize>(ENV_BUCKET_COUNT)? {
            cfg.histogram.bucket_count = v;
        }
        if let Some(v) = read_var::<usize>(ENV_STACK_SIZE)? {
            cfg.thread_stack_size = Some(v);
        }

        cfg.validate()?;
        Ok(cfg)
    }
}

fn read_var<T>(key: &str) -> Result<Option<T>, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| format!("{key}: {e}")),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(format!("{key}: {e}")),
    }
}
