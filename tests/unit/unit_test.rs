//! Tests for unit construction

use serial_invoker::core::{FnUnit, Unit, UnitVariant, DEFAULT_UNIT_NAME};

#[test]
fn test_fn_unit_reports_name_and_variant() {
    let unit = FnUnit::new("fetch-profile", "http.get", || Ok(()));
    assert_eq!(unit.name(), "fetch-profile");
    assert_eq!(unit.variant(), UnitVariant::from_static("http.get"));
}

#[test]
fn test_fn_unit_error_propagates_from_invoke() {
    let mut unit = FnUnit::new("broken", "db", || -> anyhow::Result<u8> {
        Err(anyhow::anyhow!("table missing"))
    })
    .then(|_| {});
    let err = unit.invoke().unwrap_err();
    assert_eq!(err.to_string(), "table missing");
}

#[test]
fn test_default_unit_name() {
    assert_eq!(DEFAULT_UNIT_NAME, "Unknown");
}
