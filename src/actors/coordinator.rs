//! Coordinator - the main control loop
//!
//! ## Message Flow
//!
//! ```text
//! poll tick → take mailbox → evict stale → insert → median → debounce → set AlertFlag
//!     ↑
//!     └─── stops after `run_duration_ms`, or early on a worker failure or
//!          when the token from `shutdown_token()` is cancelled
//! ```
//!
//! After the loop the coordinator cancels the shutdown token and joins both
//! workers before returning, so no task outlives [`Coordinator::run`].

use std::sync::Arc;

use serde::Serialize;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, trace};

use crate::clock::{Clock, is_timeout};
use crate::config::Config;
use crate::diagnostics::Diagnostics;
use crate::error::{ControllerError, ControllerResult};
use crate::monitors::evaluator::AlertEvaluator;

use super::pulse::{PulseSource, PulseStats};
use super::shared::{AlertFlag, Mailbox};
use super::warning::{Actuator, ActuatorStats, DiagnosticActuator, WarningActuator};

/// Summary of a completed run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunReport {
    /// Readings taken from the mailbox and evaluated
    pub readings_processed: u64,

    /// Readings published by the pulse source
    pub readings_generated: u64,

    /// Readings overwritten before the coordinator took them
    pub readings_overwritten: u64,

    /// Times the shared alert flag went from lowered to raised
    pub alerts_raised: u64,

    pub warnings_on: u64,
    pub warnings_off: u64,

    /// Readings left in the window at shutdown
    pub window_len: usize,

    /// Median computed in the last cycle
    pub last_median: f64,
}

/// State the control loop builds up
#[derive(Debug, Default)]
struct LoopStats {
    readings_processed: u64,
    alerts_raised: u64,
    window_len: usize,
    last_median: f64,
}

pub struct Coordinator<A = DiagnosticActuator> {
    config: Config,
    clock: Arc<dyn Clock>,
    diagnostics: Diagnostics,
    actuator: A,
    shutdown: CancellationToken,
}

impl Coordinator {
    /// Coordinator whose warnings go to the diagnostic stream
    pub fn new(config: Config, clock: Arc<dyn Clock>, diagnostics: Diagnostics) -> Self {
        let actuator = DiagnosticActuator::new(diagnostics.clone());

        Self {
            config,
            clock,
            diagnostics,
            actuator,
            shutdown: CancellationToken::new(),
        }
    }
}

impl<A> Coordinator<A>
where
    A: Actuator + 'static,
{
    /// Replace the warning actuator
    pub fn with_actuator<B>(self, actuator: B) -> Coordinator<B>
    where
        B: Actuator + 'static,
    {
        Coordinator {
            config: self.config,
            clock: self.clock,
            diagnostics: self.diagnostics,
            actuator,
            shutdown: self.shutdown,
        }
    }

    /// Token that stops the run early when cancelled
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Run the controller for the configured duration
    ///
    /// Validates the configuration, spawns the pulse source and warning
    /// actuator, runs the control loop on the calling task, then signals
    /// shutdown and joins both workers.
    #[instrument(skip(self))]
    pub async fn run(self) -> ControllerResult<RunReport> {
        let Coordinator {
            config,
            clock,
            diagnostics,
            actuator,
            shutdown,
        } = self;

        if let Err(e) = config.validate() {
            error!("refusing to start: {e}");
            return Err(e);
        }

        let mailbox = Arc::new(Mailbox::new());
        let flag = Arc::new(AlertFlag::new());

        debug!(
            "starting controller for {}ms, threshold {} (pulse width {}ms)",
            config.run_duration_ms,
            config.alert.threshold,
            config.transform.to_width(config.alert.threshold)
        );

        let pulses = PulseSource::new(
            &config.pulse,
            config.transform,
            mailbox.clone(),
            clock.clone(),
            diagnostics.clone(),
            shutdown.clone(),
        )
        .spawn();

        let warnings = WarningActuator::new(
            &config.warning,
            actuator,
            flag.clone(),
            clock.clone(),
            shutdown.clone(),
        )
        .spawn();

        let outcome = control_loop(
            &config,
            clock.as_ref(),
            &diagnostics,
            &mailbox,
            &flag,
            &shutdown,
        )
        .await;

        trace!("signalling shutdown to workers");
        shutdown.cancel();

        let pulse_result = flatten(pulses.await);
        let warning_result = flatten(warnings.await);

        let loop_stats = match outcome {
            Ok(stats) => stats,
            Err(e) => {
                error!("control loop failed: {e}");
                return Err(e);
            }
        };
        let pulse_stats: PulseStats = pulse_result?;
        let actuator_stats: ActuatorStats = warning_result?;

        let report = RunReport {
            readings_processed: loop_stats.readings_processed,
            readings_generated: pulse_stats.generated,
            readings_overwritten: pulse_stats.overwritten,
            alerts_raised: loop_stats.alerts_raised,
            warnings_on: actuator_stats.turned_on,
            warnings_off: actuator_stats.turned_off,
            window_len: loop_stats.window_len,
            last_median: loop_stats.last_median,
        };

        debug!("controller stopped: {report:?}");
        Ok(report)
    }
}

fn flatten<T>(
    joined: Result<ControllerResult<T>, tokio::task::JoinError>,
) -> ControllerResult<T> {
    joined.map_err(ControllerError::from)?
}

/// Poll the mailbox until the run duration elapses or shutdown is signalled
async fn control_loop(
    config: &Config,
    clock: &dyn Clock,
    diagnostics: &Diagnostics,
    mailbox: &Mailbox,
    flag: &AlertFlag,
    shutdown: &CancellationToken,
) -> ControllerResult<LoopStats> {
    let start_ms = clock.now_ms();
    let mut evaluator = AlertEvaluator::new(&config.alert, start_ms, diagnostics.clone());
    let mut stats = LoopStats::default();

    let mut ticker = interval(config.polling_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    while !is_timeout(clock.now_ms(), start_ms, config.run_duration_ms) {
        ticker.tick().await;

        if shutdown.is_cancelled() {
            info!("shutdown signalled before the run duration elapsed");
            break;
        }

        let Some(reading) = mailbox.take()? else {
            continue;
        };

        let evaluation = evaluator.observe(reading, clock.now_ms());
        stats.readings_processed += 1;
        stats.last_median = evaluation.median;

        let was_raised = flag.set(evaluation.alert)?;
        match (was_raised, evaluation.alert) {
            (false, true) => {
                stats.alerts_raised += 1;
                info!(
                    "alert raised: median {:.1} above {} for {}ms",
                    evaluation.median,
                    evaluator.threshold(),
                    evaluation.over_threshold_ms.unwrap_or_default()
                );
            }
            (true, false) => info!("alert cleared: median {:.1}", evaluation.median),
            _ => {}
        }
    }

    stats.window_len = evaluator.window().len();
    Ok(stats)
}
