//! Viewer registry
//!
//! Counts connected consumers and drives the activity gate. Every connect and
//! disconnect is a single read-modify-write-notify transaction under the
//! registry lock, so the 0↔1 edge is always computed from the post-mutation
//! count.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tokio::sync::broadcast;

use super::gate::ActivityGate;

/// Payload of the outbound `count_change` event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CountChange {
    /// Viewer count after the change
    pub data: usize,
}

/// Tracks connected viewers
pub struct ViewerRegistry {
    count: Mutex<usize>,
    gate: Arc<ActivityGate>,
    tx: broadcast::Sender<CountChange>,
    next_lease_id: AtomicU64,
}

impl ViewerRegistry {
    /// Create a registry driving `gate`
    pub fn new(gate: Arc<ActivityGate>, event_capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(event_capacity.max(1));

        Self {
            count: Mutex::new(0),
            gate,
            tx,
            next_lease_id: AtomicU64::new(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, usize> {
        self.count.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a new viewer
    ///
    /// Opens the gate on the 0→1 edge and broadcasts the new count.
    pub fn on_connect(&self) -> usize {
        let mut count = self.lock();
        *count += 1;
        let viewers = *count;

        if viewers == 1 {
            self.gate.open();
            tracing::info!(viewers, "First viewer connected, resuming producer");
        } else {
            tracing::debug!(viewers, "Viewer connected");
        }

        // Sent under the lock so subscribers observe counts in mutation order
        let _ = self.tx.send(CountChange { data: viewers });
        viewers
    }

    /// Unregister a viewer
    ///
    /// The count is clamped at zero. Pauses the gate when the count reaches
    /// zero and broadcasts the new count.
    pub fn on_disconnect(&self) -> usize {
        let mut count = self.lock();

        if *count == 0 {
            tracing::warn!("Viewer disconnect with no registered viewers");
        } else {
            *count -= 1;
        }
        let viewers = *count;

        if viewers == 0 {
            self.gate.close();
            tracing::info!(viewers, "Last viewer disconnected, pausing producer");
        } else {
            tracing::debug!(viewers, "Viewer disconnected");
        }

        let _ = self.tx.send(CountChange { data: viewers });
        viewers
    }

    /// Current viewer count
    pub fn count(&self) -> usize {
        *self.lock()
    }

    /// Subscribe to `count_change` notifications
    ///
    /// Subscribing does not count as a viewer.
    pub fn subscribe(&self) -> broadcast::Receiver<CountChange> {
        self.tx.subscribe()
    }

    /// Number of live `count_change` subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Connect a viewer and return a guard that disconnects it on drop
    pub fn lease(self: &Arc<Self>) -> ViewerLease {
        let id = self.next_lease_id.fetch_add(1, Ordering::Relaxed);
        let viewers = self.on_connect();

        tracing::debug!(lease = id, viewers, "Viewer lease acquired");

        ViewerLease {
            id,
            registry: Arc::clone(self),
        }
    }
}

/// RAII registration of one viewer
///
/// Dropping the lease performs exactly one `on_disconnect`.
pub struct ViewerLease {
    id: u64,
    registry: Arc<ViewerRegistry>,
}

impl ViewerLease {
    /// Unique lease id (for logging)
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Drop for ViewerLease {
    fn drop(&mut self) {
        let viewers = self.registry.on_disconnect();
        tracing::debug!(lease = self.id, viewers, "Viewer lease released");
    }
}

impl std::fmt::Debug for ViewerLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewerLease").field("id", &self.id).finish()
    }
}
