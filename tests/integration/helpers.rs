//! Helper functions for integration tests

use std::sync::{Arc, Mutex};

use thermo_guard::{
    actors::{coordinator::Coordinator, warning::Actuation},
    clock::MonotonicClock,
    config::{Config, PulseConfig},
    diagnostics::{Diagnostics, MemorySink},
};

/// Width (ms) whose derived value is above the default threshold of 70
pub const HOT_WIDTH: u16 = 60;

/// Width (ms) whose derived value is well below the default threshold
pub const COLD_WIDTH: u16 = 30;

/// Config with a fixed pulse width, no log file and a fixed seed
pub fn create_test_config(width_ms: u16, run_duration_ms: u64) -> Config {
    let mut config = Config {
        pulse: PulseConfig {
            width_lower_ms: width_ms,
            width_upper_ms: width_ms,
            interval_ms: 20,
            seed: Some(42),
        },
        run_duration_ms,
        ..Config::default()
    };
    config.log.enabled = false;
    config
}

/// Coordinator that records its diagnostics in memory
///
/// Must be called inside a runtime: the clock starts at creation.
pub fn create_test_coordinator(config: Config) -> (Coordinator, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    let coordinator = Coordinator::new(
        config,
        Arc::new(MonotonicClock::new()),
        Diagnostics::new(sink.clone()),
    );
    (coordinator, sink)
}

/// Actuator closure that records every actuation
pub fn create_recording_actuator() -> (
    Arc<Mutex<Vec<Actuation>>>,
    impl FnMut(Actuation) + Send + 'static,
) {
    let fired = Arc::new(Mutex::new(Vec::new()));
    let recorder = fired.clone();

    (fired, move |actuation: Actuation| {
        recorder.lock().unwrap().push(actuation)
    })
}
