//! Unbounded blocking FIFO shared between producers and the worker thread.
//!
//! `append` never blocks; `get` parks the caller on a condvar until an item
//! arrives. Items come out in exactly the order they went in. There is no
//! `remove`: once appended, an item will be handed to the consumer.

use std::collections::VecDeque;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

/// Thread-safe FIFO queue with a blocking consumer side.
///
/// Any number of threads may `append`; a single logical consumer is assumed
/// for `get`.
#[derive(Debug)]
pub struct UnitQueue<T> {
    items: Mutex<VecDeque<T>>,
    available: Condvar,
}

impl<T> UnitQueue<T> {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            available: Condvar::new(),
        }
    }

    /// Add an item at the tail and wake the consumer.
    pub fn append(&self, item: T) {
        self.items.lock().push_back(item);
        self.available.notify_one();
    }

    /// Remove and return the head, blocking until one is available.
    pub fn get(&self) -> T {
        let mut items = self.items.lock();
        loop {
            if let Some(item) = items.pop_front() {
                return item;
            }
            self.available.wait(&mut items);
        }
    }

    /// Remove and return the head, waiting at most `timeout`.
    pub fn get_timeout(&self, timeout: Duration) -> Option<T> {
        let mut items = self.items.lock();
        if items.is_empty() {
            let _ = self
                .available
                .wait_while_for(&mut items, |items| items.is_empty(), timeout);
        }
        items.pop_front()
    }

    /// Remove and return the head without blocking.
    pub fn try_get(&self) -> Option<T> {
        self.items.lock().pop_front()
    }

    /// Number of queued items.
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    /// True when nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }
}

impl<T> Default for UnitQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
