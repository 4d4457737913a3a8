//! Named worker thread driven by a loop body.
//!
//! The thread owns a piece of state, calls the body with it until the body
//! returns [`LoopControl::Stop`], then hands the state back through
//! [`WorkerThread::join`]. State that lives here is touched by exactly one
//! thread and needs no locking.

use std::io;
use std::thread::{self, JoinHandle};

use tracing::{debug, info};

use super::error::{panic_message, InvokerError};

/// What the worker loop does after one iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    /// Run the body again.
    Continue,
    /// Exit the loop; the thread terminates.
    Stop,
}

/// Handle to a running worker thread that yields `S` when it stops.
#[derive(Debug)]
pub struct WorkerThread<S> {
    name: String,
    handle: JoinHandle<S>,
}

impl<S: Send + 'static> WorkerThread<S> {
    /// Spawn a thread named `name` that repeatedly calls `body(&mut state)`.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the thread could not be created.
    pub fn spawn<F>(
        name: impl Into<String>,
        stack_size: Option<usize>,
        mut state: S,
        mut body: F,
    ) -> io::Result<Self>
    where
        F: FnMut(&mut S) -> LoopControl + Send + 'static,
    {
        let name = name.into();
        let thread_name = name.clone();

        let mut builder = thread::Builder::new().name(name.clone());
        if let Some(size) = stack_size {
            builder = builder.stack_size(size);
        }

        let handle = builder.spawn(move || {
            debug!(worker = %thread_name, "Worker thread started");
            let mut iterations: u64 = 0;
            while body(&mut state) == LoopControl::Continue {
                iterations += 1;
            }
            info!(worker = %thread_name, iterations, "Worker thread stopped");
            state
        })?;

        Ok(Self { name, handle })
    }

    /// Thread name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// True once the loop has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the loop to exit and take back its state.
    ///
    /// # Errors
    ///
    /// Returns [`InvokerError::WorkerPanicked`] if the thread panicked.
    pub fn join(self) -> Result<S, InvokerError> {
        self.handle
            .join()
            .map_err(|payload| InvokerError::WorkerPanicked(panic_message(payload.as_ref())))
    }
}
