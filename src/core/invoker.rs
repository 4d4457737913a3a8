//! The invoker: a queue, one worker thread, and result dispatch.
//!
//! Units posted to an [`Invoker`] run one at a time, in post order, on the
//! invoker's own thread. A unit whose `invoke` returns `Ok(true)` is then
//! passed to the [`ResultReceiver`] so its `handle_result` can run on the
//! receiver's thread.
//!
//! ```
//! use std::sync::Arc;
//! use serial_invoker::core::{result_channel, FnUnit, Invoker};
//!
//! let (receiver, pump) = result_channel();
//! let invoker = Invoker::new("db", Arc::new(receiver))?;
//!
//! invoker.post(FnUnit::new("count-users", "db.query", || Ok(3_u64))
//!     .then(|n| println!("{n} users")));
//!
//! let tracker = invoker.shutdown_and_join()?;
//! assert_eq!(tracker.units_run(), 1);
//! assert_eq!(pump.run_pending(), 1);
//! # Ok::<(), serial_invoker::core::InvokerError>(())
//! ```
//!
//! # Shutdown
//!
//! [`Invoker::shutdown`] appends a stop marker; everything posted before it
//! runs first. Units posted concurrently with or after `shutdown` may or may
//! not run, so producers must stop posting before they shut an invoker down.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::InvokerConfig;
use crate::util::clock::{Clock, SystemClock};

use super::error::{panic_message, AppResult, InvokerError, UnitFailure};
use super::observer::{NoopObserver, UnitObserver, UnitOutcome, UnitReport};
use super::queue::UnitQueue;
use super::receiver::ResultReceiver;
use super::tracker::PerformanceTracker;
use super::unit::{Unit, UnitVariant, DEFAULT_UNIT_NAME};
use super::worker::{LoopControl, WorkerThread};

/// Variant recorded for a unit whose `variant()` panicked.
pub const UNKNOWN_VARIANT: &str = "unknown";

/// Queue item: a unit to run, or the stop marker appended by `shutdown`.
enum Envelope {
    Run(Box<dyn Unit>),
    Stop,
}

/// State owned by the worker thread for the invoker's whole life.
struct WorkerState {
    invoker: Arc<str>,
    queue: Arc<UnitQueue<Envelope>>,
    receiver: Arc<dyn ResultReceiver>,
    observer: Arc<dyn UnitObserver>,
    clock: Arc<dyn Clock>,
    perf_tracking: bool,
    tracker: PerformanceTracker,
    sequence: u64,
}

impl WorkerState {
    /// One loop iteration: take the next item and run it.
    fn iterate(&mut self) -> LoopControl {
        match self.queue.get() {
            Envelope::Stop => {
                debug!(invoker = %self.invoker, "Stop marker reached");
                LoopControl::Stop
            }
            Envelope::Run(unit) => {
                self.run_unit(unit);
                LoopControl::Continue
            }
        }
    }

    fn run_unit(&mut self, mut unit: Box<dyn Unit>) {
        let (name, variant) = self.identify(unit.as_ref());
        let sequence = self.sequence;
        self.sequence += 1;

        let start = self.perf_tracking.then(|| self.clock.elapsed());
        let result = panic::catch_unwind(AssertUnwindSafe(|| unit.invoke()));
        let elapsed = start.map(|s| self.clock.elapsed().saturating_sub(s));

        let outcome = match result {
            Ok(Ok(forward)) => {
                if forward {
                    self.forward(&name, unit);
                }
                UnitOutcome::Completed { forwarded: forward }
            }
            Ok(Err(err)) => self.failed(&name, &variant, UnitFailure::Error(err)),
            Err(payload) => {
                self.failed(&name, &variant, UnitFailure::from_panic(payload.as_ref()))
            }
        };

        if let Some(elapsed) = elapsed {
            self.tracker.record(&name, &variant, elapsed);
        }

        let report = UnitReport {
            invoker: Arc::clone(&self.invoker),
            sequence,
            name,
            variant,
            outcome,
            elapsed,
        };
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| {
            self.observer.on_report(&report);
        })) {
            warn!(
                invoker = %self.invoker,
                unit = %report.name,
                error = %panic_message(payload.as_ref()),
                "Unit observer panicked"
            );
        }
    }

    /// Read the unit's name and variant, falling back to defaults if either
    /// accessor panics.
    fn identify(&self, unit: &dyn Unit) -> (String, UnitVariant) {
        let name = panic::catch_unwind(AssertUnwindSafe(|| unit.name().to_owned()))
            .unwrap_or_else(|payload| {
                warn!(
                    invoker = %self.invoker,
                    error = %panic_message(payload.as_ref()),
                    "Unit name panicked"
                );
                DEFAULT_UNIT_NAME.to_owned()
            });
        let variant = panic::catch_unwind(AssertUnwindSafe(|| unit.variant()))
            .unwrap_or_else(|payload| {
                warn!(
                    invoker = %self.invoker,
                    unit = %name,
                    error = %panic_message(payload.as_ref()),
                    "Unit variant panicked"
                );
                UnitVariant::from_static(UNKNOWN_VARIANT)
            });
        (name, variant)
    }

    /// Hand a completed unit to the receiver. A panicking receiver drops the
    /// unit.
    fn forward(&self, name: &str, unit: Box<dyn Unit>) {
        if let Err(payload) =
            panic::catch_unwind(AssertUnwindSafe(|| self.receiver.post_unit(unit)))
        {
            warn!(
                invoker = %self.invoker,
                unit = %name,
                error = %panic_message(payload.as_ref()),
                "Result receiver panicked"
            );
        }
    }

    fn failed(&self, name: &str, variant: &UnitVariant, failure: UnitFailure) -> UnitOutcome {
        warn!(
            invoker = %self.invoker,
            unit = %name,
            variant = %variant,
            error = %failure,
            "Invocation unit failed"
        );
        UnitOutcome::Failed(Arc::new(failure))
    }
}

/// Runs posted units sequentially on a dedicated thread.
pub struct Invoker {
    name: Arc<str>,
    id: Uuid,
    queue: Arc<UnitQueue<Envelope>>,
    worker: Option<WorkerThread<WorkerState>>,
    shutdown: AtomicBool,
}

impl Invoker {
    /// Start an invoker with default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`InvokerError::Spawn`] if the worker thread cannot start.
    pub fn new(
        name: impl Into<String>,
        receiver: Arc<dyn ResultReceiver>,
    ) -> Result<Self, InvokerError> {
        Self::builder(name, receiver).build()
    }

    /// Begin configuring an invoker.
    pub fn builder(name: impl Into<String>, receiver: Arc<dyn ResultReceiver>) -> InvokerBuilder {
        InvokerBuilder {
            name: name.into(),
            receiver,
            config: InvokerConfig::default(),
            observer: Arc::new(NoopObserver),
            clock: Arc::new(SystemClock::new()),
        }
    }

    /// Invoker name; also the worker thread's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unique id of this invoker instance.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Queue a unit for execution. Never blocks.
    pub fn post_unit(&self, unit: Box<dyn Unit>) {
        if self.is_shutdown() {
            debug!(
                invoker = %self.name,
                unit = %unit.name(),
                "Unit posted after shutdown; it may not run"
            );
        }
        self.queue.append(Envelope::Run(unit));
    }

    /// Queue a unit for execution. Never blocks.
    pub fn post<U: Unit>(&self, unit: U) {
        self.post_unit(Box::new(unit));
    }

    /// Ask the worker to stop once everything queued so far has run.
    ///
    /// Does not wait; see [`Invoker::join`].
    pub fn shutdown(&self) {
        if !self.shutdown.swap(true, Ordering::AcqRel) {
            info!(invoker = %self.name, pending = self.queue.len(), "Shutting down invoker");
        }
        self.queue.append(Envelope::Stop);
    }

    /// True once `shutdown` has been called.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    /// Items waiting in the queue, not counting the unit in flight.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Wait for the worker to stop and return its performance data.
    ///
    /// Blocks forever unless [`Invoker::shutdown`] has been (or will be)
    /// called.
    ///
    /// # Errors
    ///
    /// Returns [`InvokerError::WorkerPanicked`] if the worker thread died.
    pub fn join(mut self) -> Result<PerformanceTracker, InvokerError> {
        let worker = self
            .worker
            .take()
            .ok_or_else(|| InvokerError::WorkerPanicked("worker already joined".into()))?;
        let state = worker.join()?;
        info!(
            invoker = %self.name,
            units_run = state.sequence,
            "Invoker stopped"
        );
        Ok(state.tracker)
    }

    /// [`Invoker::shutdown`] followed by [`Invoker::join`].
    ///
    /// # Errors
    ///
    /// See [`Invoker::join`].
    pub fn shutdown_and_join(self) -> Result<PerformanceTracker, InvokerError> {
        self.shutdown();
        self.join()
    }
}

impl Drop for Invoker {
    fn drop(&mut self) {
        // Queued work still drains; the thread is detached, not joined.
        if self.worker.is_some() && !self.shutdown.swap(true, Ordering::AcqRel) {
            self.queue.append(Envelope::Stop);
            debug!(invoker = %self.name, "Invoker dropped without shutdown - worker detached");
        }
    }
}

impl std::fmt::Debug for Invoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Invoker")
            .field("name", &self.name)
            .field("id", &self.id)
            .field("pending", &self.queue.len())
            .field("shutdown", &self.is_shutdown())
            .finish_non_exhaustive()
    }
}

/// An invoker can receive results from another invoker: the forwarded unit's
/// `handle_result` then runs on this invoker's thread, in its queue order.
impl ResultReceiver for Invoker {
    fn post_unit(&self, unit: Box<dyn Unit>) {
        self.post(ResultStep(Some(unit)));
    }
}

/// Queue entry running a forwarded unit's secondary action as its primary one.
struct ResultStep(Option<Box<dyn Unit>>);

impl Unit for ResultStep {
    fn name(&self) -> &str {
        self.0
            .as_deref()
            .map_or(DEFAULT_UNIT_NAME, |unit| unit.name())
    }

    fn variant(&self) -> UnitVariant {
        self.0
            .as_deref()
            .map_or_else(|| UnitVariant::from_static("result"), |unit| unit.variant())
    }

    fn invoke(&mut self) -> AppResult<bool> {
        if let Some(unit) = self.0.take() {
            unit.handle_result();
        }
        Ok(false)
    }
}

/// Configures and starts an [`Invoker`].
pub struct InvokerBuilder {
    name: String,
    receiver: Arc<dyn ResultReceiver>,
    config: InvokerConfig,
    observer: Arc<dyn UnitObserver>,
    clock: Arc<dyn Clock>,
}

impl InvokerBuilder {
    /// Use `config` instead of the defaults.
    #[must_use]
    pub fn config(mut self, config: InvokerConfig) -> Self {
        self.config = config;
        self
    }

    /// Report every unit's outcome to `observer`.
    #[must_use]
    pub fn observer(mut self, observer: Arc<dyn UnitObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Measure unit durations with `clock`.
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Validate the configuration and start the worker thread.
    ///
    /// # Errors
    ///
    /// - [`InvokerError::InvalidConfig`] if the configuration is invalid
    /// - [`InvokerError::Spawn`] if the worker thread cannot start
    pub fn build(self) -> Result<Invoker, InvokerError> {
        self.config.validate().map_err(InvokerError::InvalidConfig)?;

        let name: Arc<str> = Arc::from(self.name);
        let id = Uuid::new_v4();
        let queue = Arc::new(UnitQueue::new());

        let state = WorkerState {
            invoker: Arc::clone(&name),
            queue: Arc::clone(&queue),
            receiver: self.receiver,
            observer: self.observer,
            clock: self.clock,
            perf_tracking: self.config.perf_tracking,
            tracker: PerformanceTracker::new(
                Arc::clone(&name),
                self.config.histogram,
                self.config.slow_unit_threshold(),
            ),
            sequence: 0,
        };

        let worker = WorkerThread::spawn(
            name.to_string(),
            self.config.thread_stack_size,
            state,
            WorkerState::iterate,
        )?;

        info!(
            invoker = %name,
            id = %id,
            perf_tracking = self.config.perf_tracking,
            "Invoker started"
        );

        Ok(Invoker {
            name,
            id,
            queue,
            worker: Some(worker),
            shutdown: AtomicBool::new(false),
        })
    }
}

impl std::fmt::Debug for InvokerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvokerBuilder")
            .field("name", &self.name)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
