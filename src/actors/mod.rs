//! Concurrent part of the controller
//!
//! Three tasks cooperate through two lock-guarded cells:
//!
//! ```text
//!   ┌─────────────┐   publish    ┌─────────┐    take    ┌──────────────────┐
//!   │ PulseSource │ ───────────► │ Mailbox │ ─────────► │   Coordinator    │
//!   └─────────────┘              └─────────┘            │ window + median  │
//!                                                       │ + debounce       │
//!                                                       └────────┬─────────┘
//!                                                                │ set
//!   ┌──────────────────┐        get        ┌───────────┐         │
//!   │ WarningActuator  │ ◄──────────────── │ AlertFlag │ ◄───────┘
//!   └──────────────────┘                   └───────────┘
//! ```
//!
//! - **PulseSource**: generates readings at random widths and intervals
//! - **Coordinator**: runs the control loop for a fixed duration, then
//!   cancels the shutdown token and joins both workers
//! - **WarningActuator**: blinks the warning while the alert flag is raised
//!
//! ## Shutdown
//!
//! A single [`CancellationToken`] is shared by all tasks. Workers poll it at
//! the top of every cycle and race every sleep against it, so they stop
//! within one cycle and emit nothing after it is cancelled.

pub mod coordinator;
pub mod pulse;
pub mod shared;
pub mod warning;

use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Sleep for `duration` unless shutdown comes first
///
/// Returns `false` if the sleep was cut short by shutdown.
pub(crate) async fn pause(shutdown: &CancellationToken, duration: Duration) -> bool {
    tokio::select! {
        biased;
        _ = shutdown.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}
