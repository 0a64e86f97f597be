//! Queue of encoded events awaiting delivery.

use std::collections::VecDeque;

use bytes::Bytes;
use pathway_proto::OutboundEvent;
use tracing::trace;

/// FIFO of encoded [`OutboundEvent`]s.
///
/// Handlers push; the session drains from the front, so events reach the
/// client in the order they were produced.
#[derive(Debug, Default)]
pub struct Outbox {
    frames: VecDeque<Bytes>,
}

impl Outbox {
    /// Create an empty outbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode `event` and append it.
    pub fn push(&mut self, event: OutboundEvent) {
        trace!(event = event.name(), queued = self.frames.len() + 1, "event queued");
        self.frames.push_back(event.encode());
    }

    /// Take the oldest frame.
    pub fn pop(&mut self) -> Option<Bytes> {
        self.frames.pop_front()
    }

    /// Number of queued frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Drop every queued frame, returning how many were discarded.
    pub fn clear(&mut self) -> usize {
        let discarded = self.frames.len();
        self.frames.clear();
        discarded
    }
}
