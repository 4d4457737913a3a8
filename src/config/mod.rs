//! Configuration models for invokers and performance tracking.

pub mod invoker;

pub use invoker::{HistogramConfig, InvokerConfig, MAX_BUCKET_COUNT};
