//! End-to-end runs of the controller on virtual time
//!
//! Every test runs with paused tokio time, so pulse widths, sleeps and the
//! monotonic clock advance deterministically.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use thermo_guard::actors::warning::Actuation;
use tokio::time::Instant;

use crate::helpers::*;

#[tokio::test(start_paused = true)]
async fn test_sustained_hot_readings_raise_alert_after_debounce() {
    let config = create_test_config(HOT_WIDTH, 2000);
    let (coordinator, _sink) = create_test_coordinator(config);

    let started = Instant::now();
    let fired = Arc::new(Mutex::new(Vec::<(Duration, Actuation)>::new()));
    let recorder = fired.clone();
    let coordinator = coordinator.with_actuator(move |actuation: Actuation| {
        recorder
            .lock()
            .unwrap()
            .push((started.elapsed(), actuation))
    });

    let report = coordinator.run().await.unwrap();

    assert_eq!(report.alerts_raised, 1);
    assert!(report.last_median > 70.0);

    let fired = fired.lock().unwrap();
    let (first_at, first) = fired[0];
    assert_eq!(first, Actuation::On);
    assert!(
        first_at >= Duration::from_millis(1000),
        "warning fired before the debounce elapsed: {first_at:?}"
    );

    // blinking: strictly alternating, at least one dwell interval apart
    for pair in fired.windows(2) {
        assert_ne!(pair[0].1, pair[1].1);
        assert!(pair[1].0 - pair[0].0 >= Duration::from_millis(5));
    }
    assert!(fired.len() > 100, "expected steady blinking, got {}", fired.len());
    assert_eq!(
        report.warnings_on + report.warnings_off,
        fired.len() as u64
    );
}

#[tokio::test(start_paused = true)]
async fn test_cold_readings_never_alert() {
    let config = create_test_config(COLD_WIDTH, 3000);
    let (coordinator, sink) = create_test_coordinator(config);
    let (fired, actuator) = create_recording_actuator();

    let report = coordinator.with_actuator(actuator).run().await.unwrap();

    assert!(report.readings_processed > 0);
    assert_eq!(report.alerts_raised, 0);
    assert_eq!(report.warnings_on, 0);
    assert_eq!(report.warnings_off, 0);
    assert!(fired.lock().unwrap().is_empty());
    assert_eq!(sink.count("warning_on"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_window_only_keeps_last_retention_span() {
    // a reading every 50ms (30ms width + 20ms interval)
    let config = create_test_config(COLD_WIDTH, 3000);
    let (coordinator, _sink) = create_test_coordinator(config);

    let report = coordinator.run().await.unwrap();

    assert!(report.readings_processed >= 55);
    assert!(
        (20..=21).contains(&report.window_len),
        "window holds {} readings",
        report.window_len
    );
}

#[tokio::test(start_paused = true)]
async fn test_slow_polling_overwrites_pending_readings() {
    let mut config = create_test_config(10, 1000);
    config.pulse.interval_ms = 10;
    config.polling_interval_ms = 200;
    let (coordinator, _sink) = create_test_coordinator(config);

    let report = coordinator.run().await.unwrap();

    assert!(report.readings_overwritten > 0);
    let accounted = report.readings_processed + report.readings_overwritten;
    assert!(accounted <= report.readings_generated);
    assert!(report.readings_generated - accounted <= 1);
}

#[tokio::test(start_paused = true)]
async fn test_seeded_runs_are_reproducible() {
    let mut config = create_test_config(COLD_WIDTH, 1500);
    config.pulse.width_upper_ms = 80;

    let (first, _) = create_test_coordinator(config.clone());
    let first = first.run().await.unwrap();

    let (second, _) = create_test_coordinator(config);
    let second = second.run().await.unwrap();

    assert_eq!(first.readings_generated, second.readings_generated);
    assert_eq!(first.last_median, second.last_median);
}
