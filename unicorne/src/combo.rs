use embassy_time::{Duration, Instant};
use heapless::Vec;

use crate::action::KeyAction;
use crate::event::{KeyPos, KeyboardEvent};

// Max number of combos
pub const COMBO_MAX_NUM: usize = 8;
// Max number of keys in a combo
pub const COMBO_MAX_LENGTH: usize = 4;

/// A set of keys which, pressed together, are replaced by `output`.
///
/// Keys are matched by their keymap entry on the layers active when they are pressed.
#[derive(Clone, Debug)]
pub struct Combo {
    pub(crate) actions: Vec<KeyAction, COMBO_MAX_LENGTH>,
    pub(crate) output: KeyAction,
    pub(crate) layer: Option<u8>,
}

impl Combo {
    pub fn new<I: IntoIterator<Item = KeyAction>>(actions: I, output: KeyAction, layer: Option<u8>) -> Self {
        let mut keys = Vec::new();
        for action in actions {
            if keys.push(action).is_err() {
                warn!("Combo has more than {} keys, extra keys are ignored", COMBO_MAX_LENGTH);
                break;
            }
        }
        Self {
            actions: keys,
            output,
            layer,
        }
    }

    pub fn output(&self) -> KeyAction {
        self.output
    }

    pub fn size(&self) -> usize {
        self.actions.len()
    }

    fn available_on(&self, active_layer: u8) -> bool {
        !self.actions.is_empty() && self.layer.is_none_or(|l| l == active_layer)
    }

    fn contains_all<'k>(&self, mut keys: impl Iterator<Item = &'k KeyAction>) -> bool {
        keys.all(|k| self.actions.contains(k))
    }
}

/// A key held back while its combo may still complete
#[derive(Clone, Copy, Debug)]
pub(crate) struct BufferedKey {
    pub(crate) pos: KeyPos,
    pub(crate) action: KeyAction,
    pub(crate) event: KeyboardEvent,
}

/// A fired combo whose member keys are not all released yet
#[derive(Clone, Debug)]
struct ActiveCombo {
    index: u8,
    keys: Vec<KeyPos, COMBO_MAX_LENGTH>,
    output_released: bool,
}

pub(crate) enum ComboPress {
    /// The key is buffered, the decision is pending
    Buffered,
    /// The buffer now exactly matches this combo and nothing larger can complete
    Fire(usize),
    /// The key does not belong to the buffered candidate, the buffer must be resolved first
    Unrelated,
    /// No combo uses this key
    PassThrough,
}

pub(crate) struct ComboRelease {
    pub(crate) index: u8,
    /// First member released, the combo output should be released now
    pub(crate) release_output: bool,
}

/// Buffer and bookkeeping of the combo recognizer
pub(crate) struct ComboState {
    buffer: Vec<BufferedKey, COMBO_MAX_LENGTH>,
    deadline: Option<Instant>,
    active: Vec<ActiveCombo, COMBO_MAX_NUM>,
}

impl ComboState {
    pub(crate) fn new() -> Self {
        Self {
            buffer: Vec::new(),
            deadline: None,
            active: Vec::new(),
        }
    }

    pub(crate) fn reset(&mut self) {
        self.buffer.clear();
        self.deadline = None;
        self.active.clear();
    }

    pub(crate) fn is_buffering(&self) -> bool {
        !self.buffer.is_empty()
    }

    pub(crate) fn is_expired(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|d| now >= d)
    }

    /// Time of the latest buffered press, a fired combo is pressed at this time
    pub(crate) fn last_press_time(&self) -> Option<Instant> {
        self.buffer.last().map(|k| k.event.time)
    }

    pub(crate) fn on_press(
        &mut self,
        combos: &[Combo],
        key: BufferedKey,
        active_layer: u8,
        window: Duration,
    ) -> ComboPress {
        if self.buffer.iter().any(|k| k.action == key.action) {
            return ComboPress::Unrelated;
        }
        let extends = combos
            .iter()
            .filter(|c| c.available_on(active_layer))
            .any(|c| c.contains_all(self.buffer.iter().map(|k| &k.action).chain(core::iter::once(&key.action))));
        if !extends {
            return if self.buffer.is_empty() {
                ComboPress::PassThrough
            } else {
                ComboPress::Unrelated
            };
        }
        // The candidate is a subset of a combo, so it never exceeds the longest combo
        if self.buffer.push(key).is_err() {
            return ComboPress::Unrelated;
        }
        self.deadline = Some(key.event.time + window);

        match self.completed(combos, active_layer) {
            Some(index) if !self.larger_possible(combos, active_layer) => ComboPress::Fire(index),
            _ => ComboPress::Buffered,
        }
    }

    /// The combo matched exactly by the buffer. Several equal-sized matches resolve to the first declared one.
    pub(crate) fn completed(&self, combos: &[Combo], active_layer: u8) -> Option<usize> {
        combos.iter().position(|c| {
            c.available_on(active_layer)
                && c.size() == self.buffer.len()
                && c.contains_all(self.buffer.iter().map(|k| &k.action))
        })
    }

    fn larger_possible(&self, combos: &[Combo], active_layer: u8) -> bool {
        combos.iter().any(|c| {
            c.available_on(active_layer)
                && c.size() > self.buffer.len()
                && c.contains_all(self.buffer.iter().map(|k| &k.action))
        })
    }

    /// Take the buffered keys out in arrival order
    pub(crate) fn drain(&mut self) -> Vec<BufferedKey, COMBO_MAX_LENGTH> {
        self.deadline = None;
        core::mem::take(&mut self.buffer)
    }

    /// Consume the buffer as the given combo, its keys are tracked until they are released
    pub(crate) fn fire(&mut self, index: usize) {
        let keys = self.drain().iter().map(|k| k.pos).collect();
        let active = ActiveCombo {
            index: index as u8,
            keys,
            output_released: false,
        };
        if self.active.push(active).is_err() {
            error!("Too many active combos, combo {} releases will not be tracked", index);
        }
    }

    /// Handle the release of a member of a fired combo. Returns `None` if `pos` belongs to no fired combo.
    pub(crate) fn on_release(&mut self, pos: KeyPos) -> Option<ComboRelease> {
        let slot = self.active.iter().position(|c| c.keys.contains(&pos))?;
        let combo = &mut self.active[slot];
        combo.keys.retain(|k| *k != pos);
        let release_output = !combo.output_released;
        combo.output_released = true;
        let index = combo.index;
        if combo.keys.is_empty() {
            self.active.remove(slot);
        }
        Some(ComboRelease { index, release_output })
    }
}
