//! Lock-guarded state shared between the tasks
//!
//! Two independent lock domains live here:
//!
//! - [`Mailbox`]: written by the pulse source, taken by the coordinator
//! - [`AlertFlag`]: written by the coordinator, read by the warning actuator
//!
//! Each lock is held for a single O(1) read or write and never across an
//! `.await`. The third domain, the print lock, lives in
//! [`ConsoleSink`](crate::diagnostics::ConsoleSink). No code path holds two
//! of them at once.
//!
//! A poisoned lock means a task died while holding it. That is surfaced as
//! [`ControllerError::LockPoisoned`] and ends the run.

use std::sync::{Mutex, MutexGuard};

use crate::Reading;
use crate::error::{ControllerError, ControllerResult};

fn lock<'a, T>(mutex: &'a Mutex<T>, domain: &'static str) -> ControllerResult<MutexGuard<'a, T>> {
    mutex
        .lock()
        .map_err(|_| ControllerError::LockPoisoned(domain))
}

/// Single-slot handoff between the pulse source and the coordinator
///
/// Holds at most one unconsumed reading. Publishing overwrites a pending
/// reading (newest wins, the producer never blocks); taking empties the slot
/// so each reading is consumed exactly once.
#[derive(Debug, Default)]
pub struct Mailbox {
    slot: Mutex<Option<Reading>>,
}

impl Mailbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `reading`, returning the unconsumed reading it replaced
    pub fn publish(&self, reading: Reading) -> ControllerResult<Option<Reading>> {
        let mut slot = lock(&self.slot, "mailbox")?;
        Ok(slot.replace(reading))
    }

    /// Take the pending reading, if any, leaving the slot empty
    pub fn take(&self) -> ControllerResult<Option<Reading>> {
        let mut slot = lock(&self.slot, "mailbox")?;
        Ok(slot.take())
    }

    pub fn is_pending(&self) -> ControllerResult<bool> {
        Ok(lock(&self.slot, "mailbox")?.is_some())
    }
}

/// Debounced alert flag shared with the warning actuator
#[derive(Debug, Default)]
pub struct AlertFlag {
    raised: Mutex<bool>,
}

impl AlertFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the flag, returning its previous value
    pub fn set(&self, raised: bool) -> ControllerResult<bool> {
        let mut flag = lock(&self.raised, "alert flag")?;
        Ok(std::mem::replace(&mut *flag, raised))
    }

    pub fn get(&self) -> ControllerResult<bool> {
        Ok(*lock(&self.raised, "alert flag")?)
    }
}
