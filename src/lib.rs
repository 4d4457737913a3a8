//! # Serial Invoker
//!
//! A sequential task-execution primitive: post self-contained units of work
//! to an [`Invoker`](core::Invoker) and they run one at a time, in post
//! order, on the invoker's dedicated thread. A unit can ask for a follow-up
//! step that runs back on the "main" thread through a
//! [`ResultReceiver`](core::ResultReceiver).
//!
//! This is the tool for services that must block (database queries, file
//! I/O, slow remote calls) but are requested from a thread that must not:
//! an event loop, a UI thread, or another invoker.
//!
//! ## Key Features
//!
//! - **Sequential**: at most one unit in flight per invoker; strict FIFO
//! - **Failure isolation**: an error or panic in one unit is logged and
//!   reported, and the next unit runs normally
//! - **Result hand-off**: `handle_result` runs on the receiver's thread, in
//!   completion order
//! - **Performance tracking**: per-variant duration histograms and slow-unit
//!   warnings, switchable off in configuration
//! - **Graceful shutdown**: a stop marker drains everything posted before it
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use serial_invoker::core::{result_channel, FnUnit, Invoker};
//!
//! let (receiver, pump) = result_channel();
//! let invoker = Invoker::new("queries", Arc::new(receiver))?;
//!
//! invoker.post(
//!     FnUnit::new("lookup", "db.select", || Ok(String::from("row")))
//!         .then(|row| assert_eq!(row, "row")),
//! );
//!
//! invoker.shutdown_and_join()?;
//! // Back on the main thread:
//! pump.run_pending();
//! # Ok::<(), serial_invoker::core::InvokerError>(())
//! ```
//!
//! Multiple invokers are independent: no shared state and no cross-invoker
//! locking. Code running on different invokers must synchronise access to
//! anything it shares.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core invoker abstractions.
pub mod core;
/// Configuration models for invokers and histograms.
pub mod config;
/// Shared utilities.
pub mod util;
