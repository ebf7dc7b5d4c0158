//! Viewer-gated frame pipeline
//!
//! The pipeline owns the shared state between the producer thread and the
//! HTTP layer. It is created once by the entry point and handed around as an
//! `Arc<Pipeline>`.
//!
//! # Architecture
//!
//! ```text
//!      connect / disconnect                     Arc<Pipeline>
//!        (/video_feed)                ┌──────────────────────────────┐
//!               │                     │ viewers: ViewerRegistry      │
//!               └────────────────────►│   count ──► gate.open/close  │
//!                                     │   tx: broadcast<CountChange> │
//!                                     │ gate: ActivityGate           │
//!                                     │ cell: FrameCell              │
//!                                     └──────┬───────────────┬───────┘
//!                                            │               │
//!                          wait_and_close()  │               │ snapshot()
//!                                            ▼               ▼
//!                                    [Producer thread]  [StreamEmitter] x N
//!                                    capture ─► detect       encode ─► TCP
//!                                       └──► cell.publish()
//! ```
//!
//! # Locking
//!
//! The viewer count and the frame cell live in separate exclusion domains.
//! The gate's mutex is only ever taken inside the registry lock, and the
//! producer never holds the cell lock while waiting on the gate.

pub mod cell;
pub mod frame;
pub mod gate;
pub mod viewers;

use std::sync::Arc;

pub use cell::{FrameCell, Snapshot};
pub use frame::Frame;
pub use gate::{ActivityGate, GateState, GateWait};
pub use viewers::{CountChange, ViewerLease, ViewerRegistry};

use crate::stats::PipelineStats;

/// Default capacity of the `count_change` broadcast channel
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Shared pipeline context
pub struct Pipeline {
    gate: Arc<ActivityGate>,
    viewers: Arc<ViewerRegistry>,
    cell: FrameCell,
    stats: PipelineStats,
}

impl Pipeline {
    /// Create a pipeline with no viewers, a paused gate and an empty cell
    pub fn new() -> Self {
        Self::with_event_capacity(DEFAULT_EVENT_CAPACITY)
    }

    /// Create a pipeline with a custom `count_change` channel capacity
    pub fn with_event_capacity(capacity: usize) -> Self {
        let gate = Arc::new(ActivityGate::new());
        let viewers = Arc::new(ViewerRegistry::new(Arc::clone(&gate), capacity));

        Self {
            gate,
            viewers,
            cell: FrameCell::new(),
            stats: PipelineStats::new(),
        }
    }

    /// Activity gate shared with the producer
    pub fn gate(&self) -> &Arc<ActivityGate> {
        &self.gate
    }

    /// Viewer registry
    pub fn viewers(&self) -> &Arc<ViewerRegistry> {
        &self.viewers
    }

    /// Latest-frame cell
    pub fn cell(&self) -> &FrameCell {
        &self.cell
    }

    /// Runtime counters
    pub fn stats(&self) -> &PipelineStats {
        &self.stats
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}
