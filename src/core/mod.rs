//! Core invoker abstractions: units, the queue, the worker loop and result
//! dispatch.

pub mod error;
pub mod invoker;
pub mod observer;
pub mod queue;
pub mod receiver;
pub mod tracker;
pub mod unit;
pub mod worker;

pub use error::{AppResult, InvokerError, UnitFailure};
pub use invoker::{Invoker, InvokerBuilder, UNKNOWN_VARIANT};
pub use observer::{NoopObserver, RecordingObserver, UnitObserver, UnitOutcome, UnitReport};
pub use queue::UnitQueue;
pub use receiver::{result_channel, ChannelReceiver, ResultPump, ResultReceiver};
#[cfg(feature = "tokio-runtime")]
pub use receiver::{tokio_result_channel, AsyncResultPump, TokioReceiver};
pub use tracker::{Histogram, PerformanceTracker};
pub use unit::{FnUnit, Unit, UnitVariant, DEFAULT_UNIT_NAME};
pub use worker::{LoopControl, WorkerThread};
