//! Activity gate
//!
//! A two-flag pause/resume signal between the viewer registry and the
//! producer thread:
//!
//! - `watched` is owned by the registry (`open` / `close`)
//! - `held` is owned by the producer (`wait_and_close` / `release`)
//!
//! The gate is available exactly when `watched && !held`, so availability can
//! never accumulate above one unit no matter how often `open` is called.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Observable state of the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    /// No viewers, or the producer is mid-iteration
    Paused,
    /// Viewers present and the producer may start an iteration
    Active,
}

/// Outcome of a bounded wait on the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateWait {
    /// The caller now holds the gate and must `release` it
    Acquired,
    /// The timeout elapsed while the gate was paused
    TimedOut,
    /// The gate was shut down
    Shutdown,
}

#[derive(Debug, Default)]
struct GateFlags {
    watched: bool,
    held: bool,
    shutdown: bool,
}

impl GateFlags {
    fn available(&self) -> bool {
        self.watched && !self.held
    }
}

/// Pause/resume signal for the producer thread
#[derive(Debug, Default)]
pub struct ActivityGate {
    flags: Mutex<GateFlags>,
    cond: Condvar,
}

impl ActivityGate {
    /// Create a paused gate
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, GateFlags> {
        self.flags.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mark the pipeline as watched and wake the producer
    ///
    /// Idempotent.
    pub fn open(&self) {
        let mut flags = self.lock();
        if !flags.watched {
            flags.watched = true;
            tracing::debug!(held = flags.held, "Gate opened");
        }
        drop(flags);
        self.cond.notify_all();
    }

    /// Mark the pipeline as unwatched
    ///
    /// Never blocks. If the producer is mid-iteration the close takes effect
    /// on its next `wait_and_close`.
    pub fn close(&self) {
        let mut flags = self.lock();
        if flags.watched {
            flags.watched = false;
            tracing::debug!(held = flags.held, "Gate closed");
        }
    }

    /// Block until the gate is available, then take it
    ///
    /// Returns `false` if the gate has been shut down.
    pub fn wait_and_close(&self) -> bool {
        let mut flags = self.lock();
        while !flags.shutdown && !flags.available() {
            flags = self
                .cond
                .wait(flags)
                .unwrap_or_else(PoisonError::into_inner);
        }

        if flags.shutdown {
            return false;
        }

        flags.held = true;
        true
    }

    /// Like [`wait_and_close`](Self::wait_and_close), giving up after `timeout`
    pub fn wait_and_close_timeout(&self, timeout: Duration) -> GateWait {
        let deadline = Instant::now() + timeout;
        let mut flags = self.lock();

        loop {
            if flags.shutdown {
                return GateWait::Shutdown;
            }
            if flags.available() {
                flags.held = true;
                return GateWait::Acquired;
            }

            let now = Instant::now();
            if now >= deadline {
                return GateWait::TimedOut;
            }

            flags = self
                .cond
                .wait_timeout(flags, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }

    /// End of a producer iteration: hand the gate back
    pub fn release(&self) {
        let mut flags = self.lock();
        flags.held = false;
        drop(flags);
        self.cond.notify_all();
    }

    /// Sleep for `duration` unless the gate is shut down first
    ///
    /// Returns `false` if the sleep was cut short by `shutdown`.
    pub fn sleep(&self, duration: Duration) -> bool {
        let flags = self.lock();
        let (flags, _) = self
            .cond
            .wait_timeout_while(flags, duration, |flags| !flags.shutdown)
            .unwrap_or_else(PoisonError::into_inner);
        !flags.shutdown
    }

    /// Wake every waiter and refuse all further acquisitions
    pub fn shutdown(&self) {
        self.lock().shutdown = true;
        self.cond.notify_all();
    }

    /// Current state
    pub fn state(&self) -> GateState {
        if self.lock().available() {
            GateState::Active
        } else {
            GateState::Paused
        }
    }

    /// Whether the producer may start an iteration right now
    pub fn is_active(&self) -> bool {
        self.state() == GateState::Active
    }

    /// Whether viewers are present, regardless of producer activity
    pub fn is_watched(&self) -> bool {
        self.lock().watched
    }

    /// Whether the producer is mid-iteration
    pub fn is_held(&self) -> bool {
        self.lock().held
    }

    /// Whether `shutdown` has been called
    pub fn is_shutdown(&self) -> bool {
        self.lock().shutdown
    }
}
