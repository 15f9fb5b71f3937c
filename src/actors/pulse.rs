//! PulseSource - simulated sensor front end
//!
//! ## Cycle
//!
//! ```text
//! shutdown? ─yes─► exit
//!    │ no
//! draw width ∈ [lower, upper] → value = (width - offset) * scale
//!    │
//! sleep(width)            acquisition latency
//!    │
//! stamp + publish         overwrites an unconsumed reading
//!    │
//! emit `New:`
//!    │
//! sleep(interval)         inter-arrival delay
//! ```
//!
//! Both sleeps end early on shutdown, so nothing is published or printed
//! once the shutdown token is cancelled.

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, instrument, trace};

use crate::Reading;
use crate::clock::Clock;
use crate::config::{PulseConfig, Transform};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::ControllerResult;

use super::pause;
use super::shared::Mailbox;

/// Counters reported by the pulse source when it stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PulseStats {
    /// Readings published to the mailbox
    pub generated: u64,

    /// Readings that replaced an unconsumed one
    pub overwritten: u64,
}

pub struct PulseSource {
    width_lower_ms: u16,
    width_upper_ms: u16,
    interval: Duration,
    transform: Transform,
    rng: StdRng,
    mailbox: Arc<Mailbox>,
    clock: Arc<dyn Clock>,
    diagnostics: Diagnostics,
    shutdown: CancellationToken,
}

impl PulseSource {
    pub fn new(
        config: &PulseConfig,
        transform: Transform,
        mailbox: Arc<Mailbox>,
        clock: Arc<dyn Clock>,
        diagnostics: Diagnostics,
        shutdown: CancellationToken,
    ) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Self {
            width_lower_ms: config.width_lower_ms,
            width_upper_ms: config.width_upper_ms,
            interval: Duration::from_millis(config.interval_ms),
            transform,
            rng,
            mailbox,
            clock,
            diagnostics,
            shutdown,
        }
    }

    /// Draw a pulse width uniformly from the configured inclusive range
    pub fn generate_width(&mut self) -> u16 {
        self.rng.random_range(self.width_lower_ms..=self.width_upper_ms)
    }

    /// Spawn the source on the runtime
    ///
    /// A fatal error cancels the shutdown token so the rest of the controller
    /// stops as well.
    pub fn spawn(self) -> JoinHandle<ControllerResult<PulseStats>> {
        let shutdown = self.shutdown.clone();

        tokio::spawn(async move {
            let result = self.run().await;
            if let Err(e) = &result {
                error!("pulse source failed: {e}");
                shutdown.cancel();
            }
            result
        })
    }

    /// Generate readings until shutdown is signalled
    #[instrument(skip(self), name = "pulse_source")]
    pub async fn run(mut self) -> ControllerResult<PulseStats> {
        debug!(
            "starting pulse source, widths {}..={}ms every {:?}",
            self.width_lower_ms, self.width_upper_ms, self.interval
        );

        let mut stats = PulseStats::default();

        loop {
            if self.shutdown.is_cancelled() {
                break;
            }

            let width_ms = self.generate_width();
            let value = self.transform.to_value(width_ms);

            // acquisition takes as long as the pulse itself
            if !pause(&self.shutdown, Duration::from_millis(u64::from(width_ms))).await {
                break;
            }

            let reading = Reading {
                width_ms,
                value,
                timestamp_ms: self.clock.now_ms(),
            };

            if let Some(previous) = self.mailbox.publish(reading)? {
                trace!("overwrote unconsumed reading {:.1}", previous.value);
                stats.overwritten += 1;
            }
            stats.generated += 1;

            self.diagnostics.emit(Diagnostic::New { value });

            if !pause(&self.shutdown, self.interval).await {
                break;
            }
        }

        debug!(
            "pulse source stopped after {} readings ({} overwritten)",
            stats.generated, stats.overwritten
        );

        Ok(stats)
    }
}
