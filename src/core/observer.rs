//! Per-unit outcome reporting.
//!
//! After every unit the invoker builds a [`UnitReport`] and hands it to its
//! [`UnitObserver`]. Failures are logged by the invoker regardless of the
//! observer, so observers exist for programmatic inspection (tests, metrics,
//! audit trails), not for visibility.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use super::error::UnitFailure;
use super::unit::UnitVariant;

/// How one unit's primary action ended.
#[derive(Debug, Clone)]
pub enum UnitOutcome {
    /// `invoke` returned normally.
    Completed {
        /// Whether the unit was handed to the result receiver.
        forwarded: bool,
    },
    /// `invoke` returned an error or panicked.
    Failed(Arc<UnitFailure>),
}

impl UnitOutcome {
    /// True for [`UnitOutcome::Failed`].
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// True if the unit was forwarded to the receiver.
    #[must_use]
    pub const fn was_forwarded(&self) -> bool {
        matches!(self, Self::Completed { forwarded: true })
    }
}

/// Record of a single pass through the invoker.
#[derive(Debug, Clone)]
pub struct UnitReport {
    /// Name of the invoker that ran the unit.
    pub invoker: Arc<str>,
    /// Position of the unit in the invoker's run order, starting at 0.
    pub sequence: u64,
    /// Unit display name.
    pub name: String,
    /// Unit variant.
    pub variant: UnitVariant,
    /// How `invoke` ended.
    pub outcome: UnitOutcome,
    /// Measured duration; `None` when performance tracking is off.
    pub elapsed: Option<Duration>,
}

/// Receives one report per unit, on the worker thread.
///
/// Implementations must be cheap; they run inline in the invoker's pipeline.
/// A panic in `on_report` is caught and logged, and the worker carries on.
pub trait UnitObserver: Send + Sync + 'static {
    /// Called after each unit's primary action.
    fn on_report(&self, report: &UnitReport);
}

/// Observer that ignores every report.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl UnitObserver for NoopObserver {
    fn on_report(&self, _report: &UnitReport) {}
}

#[derive(Debug, Default)]
struct Recorded {
    reports: VecDeque<UnitReport>,
    total: u64,
}

/// Bounded in-memory observer for tests and diagnostics.
///
/// Keeps the most recent `max_reports` reports and a total count, and lets
/// other threads block until a number of reports have arrived.
#[derive(Debug)]
pub struct RecordingObserver {
    state: Mutex<Recorded>,
    changed: Condvar,
    max_reports: usize,
}

impl RecordingObserver {
    /// Create an observer retaining up to `max_reports` reports.
    #[must_use]
    pub fn new(max_reports: usize) -> Self {
        Self {
            state: Mutex::new(Recorded {
                reports: VecDeque::with_capacity(max_reports.min(1024)),
                total: 0,
            }),
            changed: Condvar::new(),
            max_reports,
        }
    }

    /// Snapshot of retained reports, oldest first.
    #[must_use]
    pub fn reports(&self) -> Vec<UnitReport> {
        self.state.lock().reports.iter().cloned().collect()
    }

    /// Retained reports whose unit failed.
    #[must_use]
    pub fn failures(&self) -> Vec<UnitReport> {
        self.state
            .lock()
            .reports
            .iter()
            .filter(|r| r.outcome.is_failure())
            .cloned()
            .collect()
    }

    /// Number of reports received, including evicted ones.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.state.lock().total
    }

    /// Block until at least `count` reports have been received or `timeout`
    /// elapses. Returns whether the count was reached.
    pub fn wait_for(&self, count: u64, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        while state.total < count {
            if self.changed.wait_until(&mut state, deadline).timed_out() {
                return state.total >= count;
            }
        }
        true
    }
}

impl UnitObserver for RecordingObserver {
    fn on_report(&self, report: &UnitReport) {
        let mut state = self.state.lock();
        if state.reports.len() >= self.max_reports {
            state.reports.pop_front();
        }
        state.reports.push_back(report.clone());
        state.total += 1;
        drop(state);
        self.changed.notify_all();
    }
}
