use embassy_time::Instant;
use heapless::Vec;

use crate::action::{Action, KeyAction};
use crate::event::{KeyboardEvent, KeyboardEventPos};
use crate::keyboard::held_buffer::{HeldBuffer, HeldEvents};

const MAX_DECIDED: usize = 16;

/// A tap-hold key which is pressed but not decided yet
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) struct PendingTapHold {
    pub(crate) pos: KeyboardEventPos,
    pub(crate) tap: Action,
    pub(crate) hold: Action,
    /// The keymap entry, handed to the one-shot predicates
    pub(crate) source: KeyAction,
    pub(crate) deadline: Instant,
}

/// A decided tap-hold key, its release executes the release of `action`
#[derive(Clone, Copy, Debug)]
struct DecidedTapHold {
    pos: KeyboardEventPos,
    action: Action,
    source: KeyAction,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TapHoldDecision {
    Tap,
    Hold,
}

/// State of the tap-hold arbiter.
///
/// At most one key is undecided at a time. Everything arriving while it is undecided
/// is held back, a nested tap-hold press included, and replayed after the decision.
pub(crate) struct TapHoldState {
    pending: Option<PendingTapHold>,
    held: HeldBuffer,
    decided: Vec<DecidedTapHold, MAX_DECIDED>,
}

impl TapHoldState {
    pub(crate) fn new() -> Self {
        Self {
            pending: None,
            held: HeldBuffer::new(),
            decided: Vec::new(),
        }
    }

    pub(crate) fn reset(&mut self) {
        self.pending = None;
        self.held.clear();
        self.decided.clear();
    }

    pub(crate) fn pending(&self) -> Option<&PendingTapHold> {
        self.pending.as_ref()
    }

    pub(crate) fn start(&mut self, pending: PendingTapHold) {
        debug!("Tap-hold pending at {:?}", pending.pos);
        self.pending = Some(pending);
    }

    pub(crate) fn is_expired(&self, now: Instant) -> bool {
        self.pending.as_ref().is_some_and(|p| now >= p.deadline)
    }

    /// Hold an event back until the pending key is decided
    pub(crate) fn hold_back(&mut self, event: KeyboardEvent) -> Result<(), KeyboardEvent> {
        self.held.push(event)
    }

    /// A release of `pos` completes a press-and-release inside the pending period
    pub(crate) fn completes_interleaved_tap(&self, release: &KeyboardEvent) -> bool {
        !release.pressed && self.held.has_press(release.pos)
    }

    /// Decide the pending key. Returns the action to press and the events to replay.
    pub(crate) fn decide(
        &mut self,
        decision: TapHoldDecision,
    ) -> Option<(PendingTapHold, Action, HeldEvents)> {
        let pending = self.pending.take()?;
        let action = match decision {
            TapHoldDecision::Tap => pending.tap,
            TapHoldDecision::Hold => pending.hold,
        };
        debug!("Tap-hold at {:?} decided as {:?}, replaying {} events", pending.pos, decision, self.held.len());
        let decided = DecidedTapHold {
            pos: pending.pos,
            action,
            source: pending.source,
        };
        if self.decided.push(decided).is_err() {
            error!("Too many decided tap-hold keys, release of {:?} is lost", pending.pos);
        }
        Some((pending, action, self.held.take()))
    }

    /// Take the decision of a released tap-hold key
    pub(crate) fn take_decided(&mut self, pos: KeyboardEventPos) -> Option<(Action, KeyAction)> {
        let i = self.decided.iter().position(|d| d.pos == pos)?;
        let d = self.decided.remove(i);
        Some((d.action, d.source))
    }
}
