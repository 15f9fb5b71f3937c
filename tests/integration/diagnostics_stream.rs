//! Ordering and triggering of the diagnostic stream

use thermo_guard::diagnostics::Diagnostic;

use crate::helpers::*;

#[tokio::test(start_paused = true)]
async fn test_one_record_set_per_cycle() {
    let config = create_test_config(HOT_WIDTH, 1500);
    let (coordinator, sink) = create_test_coordinator(config);

    let report = coordinator.run().await.unwrap();

    assert_eq!(sink.count("new") as u64, report.readings_generated);
    assert_eq!(sink.count("stale") as u64, report.readings_processed);
    assert_eq!(sink.count("list") as u64, report.readings_processed);
    assert_eq!(sink.count("median") as u64, report.readings_processed);
    assert_eq!(sink.count("warning_on") as u64, report.warnings_on);
    assert_eq!(sink.count("warning_off") as u64, report.warnings_off);
}

#[tokio::test(start_paused = true)]
async fn test_coordinator_records_come_in_stale_list_median_order() {
    let config = create_test_config(COLD_WIDTH, 1500);
    let (coordinator, sink) = create_test_coordinator(config);

    coordinator.run().await.unwrap();

    let cycle: Vec<&'static str> = sink
        .records()
        .iter()
        .map(Diagnostic::category)
        .filter(|category| matches!(*category, "stale" | "list" | "median"))
        .collect();

    assert!(!cycle.is_empty());
    for chunk in cycle.chunks(3) {
        assert_eq!(chunk, ["stale", "list", "median"]);
    }
}

#[tokio::test(start_paused = true)]
async fn test_new_precedes_its_evaluation() {
    let config = create_test_config(COLD_WIDTH, 500);
    let (coordinator, sink) = create_test_coordinator(config);

    coordinator.run().await.unwrap();

    let records = sink.records();
    let first_new = records
        .iter()
        .position(|record| matches!(record, Diagnostic::New { .. }))
        .unwrap();
    let first_list = records
        .iter()
        .position(|record| matches!(record, Diagnostic::List { .. }))
        .unwrap();

    assert!(first_new < first_list);
}

#[tokio::test(start_paused = true)]
async fn test_median_reports_alert_duration_only_over_threshold() {
    let config = create_test_config(HOT_WIDTH, 500);
    let (coordinator, sink) = create_test_coordinator(config);
    coordinator.run().await.unwrap();

    let hot_durations: Vec<Option<u64>> = sink
        .records()
        .into_iter()
        .filter_map(|record| match record {
            Diagnostic::Median {
                alert_duration_ms, ..
            } => Some(alert_duration_ms),
            _ => None,
        })
        .collect();
    assert!(!hot_durations.is_empty());
    assert!(hot_durations.iter().all(Option::is_some));
    // durations grow while the excursion lasts
    assert!(hot_durations.windows(2).all(|pair| pair[0] <= pair[1]));

    let config = create_test_config(COLD_WIDTH, 500);
    let (coordinator, sink) = create_test_coordinator(config);
    coordinator.run().await.unwrap();

    assert!(sink.records().iter().all(|record| !matches!(
        record,
        Diagnostic::Median {
            alert_duration_ms: Some(_),
            ..
        }
    )));
}

#[tokio::test(start_paused = true)]
async fn test_stale_batches_report_evicted_values() {
    // readings every 50ms over 2s, retention 1s
    let config = create_test_config(COLD_WIDTH, 2000);
    let (coordinator, sink) = create_test_coordinator(config);
    coordinator.run().await.unwrap();

    let evicted: usize = sink
        .records()
        .iter()
        .map(|record| match record {
            Diagnostic::Stale { values } => values.len(),
            _ => 0,
        })
        .sum();
    let processed = sink.count("list");

    // everything that is not in the final window was evicted exactly once
    assert!(evicted > 0);
    assert!(processed - evicted <= 21);
}
