//! WarningActuator - blinking warning driven by the alert flag
//!
//! ## State Machine
//!
//! ```text
//!                EVENT_ON / ActuateOn
//!   WARNING_OFF ─────────────────────► WARNING_ON
//!        ▲                                 │
//!        └─────────────────────────────────┘
//!                EVENT_OFF / ActuateOff
//! ```
//!
//! The table lives in [`transition`]; any pair not listed is ignored, so
//! re-affirming the current state never fires a side effect.
//!
//! ## Driving policy
//!
//! - alert flag raised: every cycle, once the dwell time in the current
//!   state has passed, fire the opposite event (the warning blinks)
//! - alert flag lowered: force the machine back to `WARNING_OFF` without a
//!   side effect and clear the dwell timer

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, instrument, trace};

use crate::clock::{Clock, is_timeout};
use crate::config::WarningConfig;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::ControllerResult;

use super::pause;
use super::shared::AlertFlag;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningState {
    On,
    Off,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningEvent {
    On,
    Off,
}

/// Side effect fired when a state is entered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actuation {
    On,
    Off,
}

impl WarningState {
    pub fn name(&self) -> &'static str {
        match self {
            WarningState::On => "WARNING_ON",
            WarningState::Off => "WARNING_OFF",
        }
    }

    /// Event that leaves this state
    fn toggle_event(&self) -> WarningEvent {
        match self {
            WarningState::On => WarningEvent::Off,
            WarningState::Off => WarningEvent::On,
        }
    }
}

/// Transition table: `(state, event) → (next state, side effect)`
pub fn transition(state: WarningState, event: WarningEvent) -> Option<(WarningState, Actuation)> {
    match (state, event) {
        (WarningState::Off, WarningEvent::On) => Some((WarningState::On, Actuation::On)),
        (WarningState::On, WarningEvent::Off) => Some((WarningState::Off, Actuation::Off)),
        _ => None,
    }
}

/// What a single [`WarningMachine::step`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// A transition fired; the caller must perform the actuation
    Actuated(Actuation),

    /// Alert raised but the dwell time has not passed yet
    Dwelling,

    /// Alert lowered while ON; forced back to OFF without a side effect
    ForcedOff,

    /// Alert lowered while already OFF
    Idle,
}

#[derive(Debug, Clone)]
pub struct WarningMachine {
    state: WarningState,
    /// When the current state was entered through a transition.
    /// `None` after a reset, which lets the first transition fire at once.
    entered_at_ms: Option<u64>,
    dwell_ms: u64,
}

impl WarningMachine {
    pub fn new(dwell_ms: u64) -> Self {
        Self {
            state: WarningState::Off,
            entered_at_ms: None,
            dwell_ms,
        }
    }

    pub fn state(&self) -> WarningState {
        self.state
    }

    /// Return to the initial state without firing anything
    ///
    /// Returns whether the state actually changed.
    pub fn reset(&mut self) -> bool {
        let was_on = self.state == WarningState::On;
        self.state = WarningState::Off;
        self.entered_at_ms = None;
        was_on
    }

    /// Feed an event through the transition table
    pub fn fire(&mut self, event: WarningEvent, now_ms: u64) -> Option<Actuation> {
        let (next, actuation) = transition(self.state, event)?;
        trace!("{} -> {}", self.state.name(), next.name());

        self.state = next;
        self.entered_at_ms = Some(now_ms);
        Some(actuation)
    }

    /// Advance one actuator cycle given the current alert flag
    pub fn step(&mut self, alert: bool, now_ms: u64) -> Step {
        if !alert {
            return if self.reset() {
                Step::ForcedOff
            } else {
                Step::Idle
            };
        }

        if let Some(entered_at_ms) = self.entered_at_ms
            && !is_timeout(now_ms, entered_at_ms, self.dwell_ms)
        {
            return Step::Dwelling;
        }

        match self.fire(self.state.toggle_event(), now_ms) {
            Some(actuation) => Step::Actuated(actuation),
            None => Step::Dwelling,
        }
    }
}

/// Performs the physical (or simulated) warning
pub trait Actuator: Send {
    fn actuate(&mut self, actuation: Actuation);
}

impl<F> Actuator for F
where
    F: FnMut(Actuation) + Send,
{
    fn actuate(&mut self, actuation: Actuation) {
        self(actuation)
    }
}

/// Actuator that reports each transition on the diagnostic stream
#[derive(Debug, Clone)]
pub struct DiagnosticActuator {
    diagnostics: Diagnostics,
}

impl DiagnosticActuator {
    pub fn new(diagnostics: Diagnostics) -> Self {
        Self { diagnostics }
    }
}

impl Actuator for DiagnosticActuator {
    fn actuate(&mut self, actuation: Actuation) {
        match actuation {
            Actuation::On => self.diagnostics.emit(Diagnostic::WarningOn),
            Actuation::Off => self.diagnostics.emit(Diagnostic::WarningOff),
        }
    }
}

/// Counters reported by the actuator when it stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActuatorStats {
    pub turned_on: u64,
    pub turned_off: u64,

    /// Times the alert dropped while the warning was ON
    pub forced_resets: u64,
}

pub struct WarningActuator<A> {
    machine: WarningMachine,
    actuator: A,
    flag: Arc<AlertFlag>,
    clock: Arc<dyn Clock>,
    interval: Duration,
    shutdown: CancellationToken,
}

impl<A> WarningActuator<A>
where
    A: Actuator + 'static,
{
    pub fn new(
        config: &WarningConfig,
        actuator: A,
        flag: Arc<AlertFlag>,
        clock: Arc<dyn Clock>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            machine: WarningMachine::new(config.dwell_ms),
            actuator,
            flag,
            clock,
            interval: Duration::from_millis(config.interval_ms),
            shutdown,
        }
    }

    /// Spawn the actuator on the runtime
    ///
    /// A fatal error cancels the shutdown token so the rest of the controller
    /// stops as well.
    pub fn spawn(self) -> JoinHandle<ControllerResult<ActuatorStats>> {
        let shutdown = self.shutdown.clone();

        tokio::spawn(async move {
            let result = self.run().await;
            if let Err(e) = &result {
                error!("warning actuator failed: {e}");
                shutdown.cancel();
            }
            result
        })
    }

    /// Drive the state machine from the alert flag until shutdown
    #[instrument(skip(self), name = "warning_actuator")]
    pub async fn run(mut self) -> ControllerResult<ActuatorStats> {
        debug!("starting warning actuator, cycle {:?}", self.interval);

        let mut stats = ActuatorStats::default();

        loop {
            if self.shutdown.is_cancelled() {
                break;
            }

            let alert = self.flag.get()?;

            match self.machine.step(alert, self.clock.now_ms()) {
                Step::Actuated(actuation) => {
                    match actuation {
                        Actuation::On => stats.turned_on += 1,
                        Actuation::Off => stats.turned_off += 1,
                    }
                    self.actuator.actuate(actuation);
                }
                Step::ForcedOff => {
                    trace!("alert lowered, warning forced off");
                    stats.forced_resets += 1;
                }
                Step::Dwelling | Step::Idle => {}
            }

            if !pause(&self.shutdown, self.interval).await {
                break;
            }
        }

        debug!(
            "warning actuator stopped ({} on, {} off, {} forced resets)",
            stats.turned_on, stats.turned_off, stats.forced_resets
        );

        Ok(stats)
    }
}
