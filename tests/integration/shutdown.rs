//! Shutdown and failure behaviour

use std::time::Duration;

use assert_matches::assert_matches;
use thermo_guard::{actors::warning::Actuation, error::ControllerError};
use tokio::time::Instant;

use crate::helpers::*;

#[tokio::test(start_paused = true)]
async fn test_run_returns_once_duration_elapses() {
    let config = create_test_config(COLD_WIDTH, 500);
    let polling = config.polling_interval();
    let (coordinator, _sink) = create_test_coordinator(config);

    let started = Instant::now();
    coordinator.run().await.unwrap();
    let elapsed = started.elapsed();

    assert!(elapsed >= Duration::from_millis(500));
    assert!(
        elapsed <= Duration::from_millis(500) + polling * 2,
        "workers took {elapsed:?} to stop"
    );
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_run_stops_mid_cycle_without_further_output() {
    // cancelled at 1234ms: the pulse source is inside its 60ms acquisition
    // sleep and the actuator inside its 5ms cycle
    let config = create_test_config(HOT_WIDTH, 5000);
    let (coordinator, sink) = create_test_coordinator(config);
    let shutdown = coordinator.shutdown_token();

    let started = Instant::now();
    let run = tokio::spawn(coordinator.run());

    tokio::time::sleep(Duration::from_millis(1234)).await;
    shutdown.cancel();
    let emitted = sink.len();

    let report = run.await.unwrap().unwrap();

    assert!(started.elapsed() < Duration::from_millis(1240));
    assert_eq!(sink.len(), emitted, "records emitted after shutdown");
    assert_eq!(sink.count("new") as u64, report.readings_generated);
    assert!(report.readings_generated > 0);
}

#[tokio::test(start_paused = true)]
async fn test_zero_polling_interval_is_rejected() {
    let mut config = create_test_config(COLD_WIDTH, 500);
    config.polling_interval_ms = 0;
    let (coordinator, sink) = create_test_coordinator(config);

    let result = coordinator.run().await;

    assert_matches!(result, Err(ControllerError::InvalidConfig(_)));
    assert!(sink.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_empty_width_range_is_rejected() {
    let mut config = create_test_config(COLD_WIDTH, 500);
    config.pulse.width_lower_ms = 90;
    let (coordinator, _sink) = create_test_coordinator(config);

    assert_matches!(
        coordinator.run().await,
        Err(ControllerError::InvalidConfig(_))
    );
}

#[tokio::test(start_paused = true)]
async fn test_zero_warning_interval_is_rejected() {
    let mut config = create_test_config(HOT_WIDTH, 500);
    config.warning.interval_ms = 0;
    let (coordinator, _sink) = create_test_coordinator(config);

    assert_matches!(
        coordinator.run().await,
        Err(ControllerError::InvalidConfig(_))
    );
}

#[tokio::test(start_paused = true)]
async fn test_panicking_actuator_fails_the_run() {
    let config = create_test_config(HOT_WIDTH, 1500);
    let (coordinator, _sink) = create_test_coordinator(config);

    let result = coordinator
        .with_actuator(|_: Actuation| panic!("actuator hardware fault"))
        .run()
        .await;

    assert_matches!(result, Err(ControllerError::WorkerFailed(_)));
}
