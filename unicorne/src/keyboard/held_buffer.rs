use heapless::Vec;

use crate::event::{KeyboardEvent, KeyboardEventPos};

pub(crate) const HELD_BUFFER_SIZE: usize = 16;

pub(crate) type HeldEvents = Vec<KeyboardEvent, HELD_BUFFER_SIZE>;

/// Events held back while a tap-hold decision is pending, in arrival order.
#[derive(Debug, Default, Clone)]
pub(crate) struct HeldBuffer {
    events: HeldEvents,
}

impl HeldBuffer {
    pub(crate) fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Push an event, gives it back if the buffer is full
    pub(crate) fn push(&mut self, event: KeyboardEvent) -> Result<(), KeyboardEvent> {
        self.events.push(event)
    }

    /// Whether a press of `pos` is held back
    pub(crate) fn has_press(&self, pos: KeyboardEventPos) -> bool {
        self.events.iter().any(|e| e.pressed && e.pos == pos)
    }

    pub(crate) fn take(&mut self) -> HeldEvents {
        core::mem::take(&mut self.events)
    }

    pub(crate) fn clear(&mut self) {
        self.events.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.events.len()
    }
}
