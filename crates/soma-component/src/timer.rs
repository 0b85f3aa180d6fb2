//! Cancelable one-shot termination timer.
//!
//! Each timer owns a dedicated thread blocked on a channel with a timeout.
//! A cancel message (or the sender being dropped) wakes the thread before
//! the deadline and the action never runs; a timeout runs the action on
//! the timer thread. Cancellation is best-effort: a timer that has already
//! passed its deadline fires even if `cancel` arrives moments later.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use tracing::debug;

/// Handle to a pending scheduled termination.
///
/// The generation number lets the owner tell this timer apart from a
/// replacement when the fire path and a reschedule race for the timer slot.
#[derive(Debug)]
pub(crate) struct TerminationTimer {
    generation: u64,
    cancel: mpsc::Sender<()>,
}

impl TerminationTimer {
    /// Spawns the timer thread. `on_fire` runs on that thread after `delay`
    /// unless the timer is canceled or dropped first.
    pub(crate) fn spawn<F>(generation: u64, delay: Duration, on_fire: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let (cancel, signal) = mpsc::channel();
        thread::spawn(move || match signal.recv_timeout(delay) {
            Err(RecvTimeoutError::Timeout) => on_fire(),
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                debug!(generation, "termination timer canceled");
            }
        });
        Self { generation, cancel }
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    /// Wakes the timer thread without firing. Dropping the handle has the
    /// same effect; this just makes the intent explicit at call sites.
    pub(crate) fn cancel(self) {
        let _ = self.cancel.send(());
    }
}
