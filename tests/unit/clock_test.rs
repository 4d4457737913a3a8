//! Tests for clock implementations

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serial_invoker::util::{Clock, ManualClock, SystemClock};

#[test]
fn test_manual_clock_shared_across_threads() {
    let clock = Arc::new(ManualClock::new());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let clock = Arc::clone(&clock);
            thread::spawn(move || clock.advance(Duration::from_millis(5)))
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(clock.elapsed(), Duration::from_millis(20));
}

#[test]
fn test_system_clock_advances() {
    let clock = SystemClock::default();
    let before = clock.elapsed();
    thread::sleep(Duration::from_millis(5));
    assert!(clock.elapsed() >= before + Duration::from_millis(5));
}
