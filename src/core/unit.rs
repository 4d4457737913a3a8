//! Units of work and their variant tags.
//!
//! A [`Unit`] has a primary action (`invoke`) that runs on an invoker's
//! worker thread and an optional secondary action (`handle_result`) that runs
//! on whichever thread drains the [`ResultReceiver`](super::ResultReceiver).
//!
//! Most callers do not implement the trait by hand; [`FnUnit`] pairs a work
//! closure with an optional result handler:
//!
//! ```
//! use serial_invoker::core::{FnUnit, Unit};
//!
//! let mut unit = FnUnit::new("load-user", "db.query", || Ok(42_u32))
//!     .then(|id| println!("loaded user {id}"));
//! assert!(unit.invoke().unwrap());
//! Box::new(unit).handle_result();
//! ```

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::AppResult;

/// Name reported by units that do not supply one.
pub const DEFAULT_UNIT_NAME: &str = "Unknown";

/// Caller-supplied tag grouping units for performance tracking.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitVariant(Cow<'static, str>);

impl UnitVariant {
    /// Create a variant from a static string without allocating.
    #[must_use]
    pub const fn from_static(tag: &'static str) -> Self {
        Self(Cow::Borrowed(tag))
    }

    /// Create a variant from any string.
    pub fn new(tag: impl Into<Cow<'static, str>>) -> Self {
        Self(tag.into())
    }

    /// The tag as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UnitVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for UnitVariant {
    fn from(tag: &'static str) -> Self {
        Self::from_static(tag)
    }
}

impl From<String> for UnitVariant {
    fn from(tag: String) -> Self {
        Self(Cow::Owned(tag))
    }
}

/// One schedulable piece of work.
///
/// The invoker guarantees only *when* and *on which thread* each method runs;
/// side effects are the implementor's responsibility. `name` is used verbatim
/// in diagnostics and should not depend on state mutated by `invoke`.
pub trait Unit: Send + 'static {
    /// Display name used in logs and reports.
    fn name(&self) -> &str {
        DEFAULT_UNIT_NAME
    }

    /// Histogram key for this unit.
    fn variant(&self) -> UnitVariant;

    /// Primary action, run on the invoker's worker thread.
    ///
    /// Returns `Ok(true)` to have [`Unit::handle_result`] scheduled on the
    /// receiver's thread. Errors and panics are isolated by the invoker.
    fn invoke(&mut self) -> AppResult<bool>;

    /// Secondary action, run on the receiver's thread after `invoke`
    /// returned `Ok(true)`.
    fn handle_result(self: Box<Self>) {}
}

type Work<T> = Box<dyn FnOnce() -> AppResult<T> + Send>;
type Handler<T> = Box<dyn FnOnce(T) + Send>;

/// Closure-backed [`Unit`].
///
/// The work closure's output is held until `handle_result`, which passes it
/// to the handler registered with [`FnUnit::then`]. Without a handler the
/// output is dropped and nothing is forwarded.
pub struct FnUnit<T: Send + 'static> {
    name: Cow<'static, str>,
    variant: UnitVariant,
    work: Option<Work<T>>,
    handler: Option<Handler<T>>,
    output: Option<T>,
}

impl<T: Send + 'static> FnUnit<T> {
    /// Create a unit running `work` on the worker thread.
    pub fn new<F>(
        name: impl Into<Cow<'static, str>>,
        variant: impl Into<UnitVariant>,
        work: F,
    ) -> Self
    where
        F: FnOnce() -> AppResult<T> + Send + 'static,
    {
        Self {
            name: name.into(),
            variant: variant.into(),
            work: Some(Box::new(work)),
            handler: None,
            output: None,
        }
    }

    /// Register the result handler run on the receiver's thread.
    #[must_use]
    pub fn then<H>(mut self, handler: H) -> Self
    where
        H: FnOnce(T) + Send + 'static,
    {
        self.handler = Some(Box::new(handler));
        self
    }
}

impl<T: Send + 'static> Unit for FnUnit<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn variant(&self) -> UnitVariant {
        self.variant.clone()
    }

    fn invoke(&mut self) -> AppResult<bool> {
        let work = self
            .work
            .take()
            .ok_or_else(|| anyhow::anyhow!("unit `{}` invoked twice", self.name))?;
        let output = work()?;
        if self.handler.is_some() {
            self.output = Some(output);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn handle_result(self: Box<Self>) {
        let this = *self;
        if let (Some(handler), Some(output)) = (this.handler, this.output) {
            handler(output);
        }
    }
}

impl<T: Send + 'static> fmt::Debug for FnUnit<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnUnit")
            .field("name", &self.name)
            .field("variant", &self.variant)
            .field("invoked", &self.work.is_none())
            .field("has_handler", &self.handler.is_some())
            .finish()
    }
}
