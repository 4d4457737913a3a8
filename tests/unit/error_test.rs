//! Tests for error types

use serial_invoker::core::{InvokerError, UnitFailure};

#[test]
fn test_invalid_config_error() {
    let err = InvokerError::InvalidConfig("bucket_count must be greater than 0".to_string());
    assert_eq!(
        format!("{}", err),
        "invalid configuration: bucket_count must be greater than 0"
    );
}

#[test]
fn test_worker_panicked_error() {
    let err = InvokerError::WorkerPanicked("stack overflow".to_string());
    assert_eq!(format!("{}", err), "worker thread panicked: stack overflow");
}

#[test]
fn test_spawn_error_from_io() {
    let io = std::io::Error::new(std::io::ErrorKind::OutOfMemory, "no threads left");
    let err: InvokerError = io.into();
    assert_eq!(format!("{}", err), "failed to spawn worker thread: no threads left");
}

#[test]
fn test_unit_panic_failure() {
    let err = UnitFailure::Panic("index out of bounds".to_string());
    assert_eq!(format!("{}", err), "unit panicked: index out of bounds");
}

#[test]
fn test_unit_panic_failure_from_payload() {
    let payload: Box<dyn std::any::Any + Send> = Box::new("bad state");
    let err = UnitFailure::from_panic(payload.as_ref());
    assert_eq!(format!("{}", err), "unit panicked: bad state");
}
