//! Error types for invoker operations.

use thiserror::Error;

/// Errors produced by the invoker infrastructure itself.
///
/// Failures of individual units never surface here; see [`UnitFailure`].
#[derive(Debug, Error)]
pub enum InvokerError {
    /// The worker thread could not be started.
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
    /// The worker thread died outside of unit isolation.
    #[error("worker thread panicked: {0}")]
    WorkerPanicked(String),
    /// Configuration validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Why a unit's `invoke` did not complete normally.
#[derive(Debug, Error)]
pub enum UnitFailure {
    /// `invoke` returned an error.
    #[error("unit returned error: {0:#}")]
    Error(anyhow::Error),
    /// `invoke` panicked; the payload message is preserved.
    #[error("unit panicked: {0}")]
    Panic(String),
}

impl UnitFailure {
    /// Build a failure from a `catch_unwind` payload.
    #[must_use]
    pub fn from_panic(payload: &(dyn std::any::Any + Send)) -> Self {
        Self::Panic(panic_message(payload))
    }
}

/// Extract a readable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Application-facing result using anyhow; this is what unit bodies return.
pub type AppResult<T> = Result<T, anyhow::Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_payloads_are_readable() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");

        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("owned boom"));
        assert_eq!(panic_message(payload.as_ref()), "owned boom");

        let payload: Box<dyn std::any::Any + Send> = Box::new(7_u32);
        assert_eq!(panic_message(payload.as_ref()), "non-string panic payload");
    }

    #[test]
    fn unit_error_keeps_context_chain() {
        let err = anyhow::anyhow!("connection refused").context("loading user 42");
        let failure = UnitFailure::Error(err);
        assert_eq!(
            failure.to_string(),
            "unit returned error: loading user 42: connection refused"
        );
    }
}
