//! Latest-frame cell
//!
//! Single slot, overwrite on publish. Readers get an `Arc` to an immutable
//! frame, so a reader never observes a partially written payload and the
//! lock is held only for a pointer swap.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::frame::Frame;

/// A frame read out of the cell
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Publish sequence number (1 for the first publish)
    pub sequence: u64,
    /// The frame
    pub frame: Arc<Frame>,
}

#[derive(Debug, Default)]
struct Slot {
    sequence: u64,
    frame: Option<Arc<Frame>>,
}

/// Holder of the most recently published frame
#[derive(Debug, Default)]
pub struct FrameCell {
    slot: Mutex<Slot>,
}

impl FrameCell {
    /// Create an empty cell
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the held frame
    ///
    /// Returns the new sequence number.
    pub fn publish(&self, frame: Frame) -> u64 {
        let frame = Arc::new(frame);

        let mut slot = self.lock();
        slot.sequence += 1;
        slot.frame = Some(frame);
        slot.sequence
    }

    /// Copy out the current frame, or `None` if nothing was published yet
    pub fn snapshot(&self) -> Option<Snapshot> {
        let slot = self.lock();
        slot.frame.as_ref().map(|frame| Snapshot {
            sequence: slot.sequence,
            frame: Arc::clone(frame),
        })
    }

    /// Whether nothing has been published yet
    pub fn is_empty(&self) -> bool {
        self.lock().frame.is_none()
    }

    /// Sequence number of the latest publish (0 if none)
    pub fn sequence(&self) -> u64 {
        self.lock().sequence
    }
}
