//! Result receivers: hand units back to the thread that owns their results.
//!
//! The invoker calls [`ResultReceiver::post_unit`] from its worker thread for
//! every unit whose `invoke` returned `Ok(true)`. The receiver must not block
//! for long and is responsible for eventually calling
//! [`Unit::handle_result`] on its own thread.
//!
//! [`result_channel`] gives a crossbeam-backed pair for a plain "main"
//! thread; with the `tokio-runtime` feature, [`tokio_result_channel`] does the
//! same for an async event loop.

use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use tracing::{debug, warn};

use super::error::panic_message;
use super::unit::Unit;

/// Capability supplied by the owner of the "main" thread.
///
/// `post_unit` is called on the invoker's worker thread. If it panics the
/// unit is dropped without its `handle_result` running.
pub trait ResultReceiver: Send + Sync + 'static {
    /// Accept a unit whose `handle_result` must run on the receiver's thread.
    fn post_unit(&self, unit: Box<dyn Unit>);
}

/// Run a unit's secondary action, isolating a panic in it.
fn run_result(unit: Box<dyn Unit>) -> bool {
    let name = unit.name().to_owned();
    let variant = unit.variant();
    match panic::catch_unwind(AssertUnwindSafe(move || unit.handle_result())) {
        Ok(()) => true,
        Err(payload) => {
            warn!(
                unit = %name,
                variant = %variant,
                error = %panic_message(payload.as_ref()),
                "Unit result handler panicked"
            );
            false
        }
    }
}

/// Sending half of a [`result_channel`]; give it to invokers.
#[derive(Debug, Clone)]
pub struct ChannelReceiver {
    tx: Sender<Box<dyn Unit>>,
}

impl ResultReceiver for ChannelReceiver {
    fn post_unit(&self, unit: Box<dyn Unit>) {
        if let Err(err) = self.tx.send(unit) {
            let unit = err.into_inner();
            warn!(
                unit = %unit.name(),
                variant = %unit.variant(),
                "Result pump dropped; discarding unit result"
            );
        }
    }
}

/// Receiving half of a [`result_channel`]; drained by the main thread.
#[derive(Debug)]
pub struct ResultPump {
    rx: Receiver<Box<dyn Unit>>,
}

impl ResultPump {
    /// Run every result handler that is already queued, without blocking.
    /// Returns how many handlers ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        while let Ok(unit) = self.rx.try_recv() {
            run_result(unit);
            ran += 1;
        }
        ran
    }

    /// Wait up to `timeout` for one result and run it.
    /// Returns false if nothing arrived.
    pub fn run_one_timeout(&self, timeout: Duration) -> bool {
        match self.rx.recv_timeout(timeout) {
            Ok(unit) => {
                run_result(unit);
                true
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => false,
        }
    }

    /// Run results as they arrive until every [`ChannelReceiver`] is gone.
    /// Returns how many handlers ran.
    pub fn run_until_closed(&self) -> usize {
        let mut ran = 0;
        for unit in &self.rx {
            run_result(unit);
            ran += 1;
        }
        debug!(ran, "Result pump closed");
        ran
    }

    /// Results queued but not yet run.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.rx.len()
    }
}

/// Create a connected receiver/pump pair backed by an unbounded channel.
#[must_use]
pub fn result_channel() -> (ChannelReceiver, ResultPump) {
    let (tx, rx) = unbounded();
    (ChannelReceiver { tx }, ResultPump { rx })
}

#[cfg(feature = "tokio-runtime")]
pub use self::tokio_pump::{tokio_result_channel, AsyncResultPump, TokioReceiver};

#[cfg(feature = "tokio-runtime")]
mod tokio_pump {
    use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
    use tracing::warn;

    use super::{run_result, ResultReceiver};
    use crate::core::unit::Unit;

    /// Sending half of a [`tokio_result_channel`].
    #[derive(Debug, Clone)]
    pub struct TokioReceiver {
        tx: UnboundedSender<Box<dyn Unit>>,
    }

    impl ResultReceiver for TokioReceiver {
        fn post_unit(&self, unit: Box<dyn Unit>) {
            if let Err(err) = self.tx.send(unit) {
                let unit = err.0;
                warn!(
                    unit = %unit.name(),
                    variant = %unit.variant(),
                    "Async result pump dropped; discarding unit result"
                );
            }
        }
    }

    /// Receiving half of a [`tokio_result_channel`], drained from an async task.
    #[derive(Debug)]
    pub struct AsyncResultPump {
        rx: UnboundedReceiver<Box<dyn Unit>>,
    }

    impl AsyncResultPump {
        /// Wait for the next result and run it on the current task.
        /// Returns false once every sender is gone.
        pub async fn run_next(&mut self) -> bool {
            match self.rx.recv().await {
                Some(unit) => {
                    run_result(unit);
                    true
                }
                None => false,
            }
        }

        /// Run results until every [`TokioReceiver`] is dropped.
        pub async fn run_until_closed(&mut self) -> usize {
            let mut ran = 0;
            while self.run_next().await {
                ran += 1;
            }
            ran
        }

        /// Run already-queued results without waiting.
        pub fn run_pending(&mut self) -> usize {
            let mut ran = 0;
            while let Ok(unit) = self.rx.try_recv() {
                run_result(unit);
                ran += 1;
            }
            ran
        }
    }

    /// Create a receiver/pump pair for an async event loop.
    #[must_use]
    pub fn tokio_result_channel() -> (TokioReceiver, AsyncResultPump) {
        let (tx, rx) = unbounded_channel();
        (TokioReceiver { tx }, AsyncResultPump { rx })
    }
}
