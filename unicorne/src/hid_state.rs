use heapless::Vec;

use crate::descriptor::KeyboardReport;
use crate::event::KeyboardEventPos;
use crate::keycode::KeyCode;
use crate::modifier::HidModifiers;

/// Number of keycode slots in a keyboard report
pub const REPORT_KEY_SLOTS: usize = 6;
const MODIFIER_SOURCES: usize = 16;

#[derive(Clone, Copy, Debug)]
struct HeldKeyCode {
    pos: KeyboardEventPos,
    keycode: KeyCode,
}

/// The outbound keyboard state: held keycodes, held modifiers and transient weak modifiers.
///
/// Every entry is keyed by the logical key that registered it, so a release only
/// removes what that key added. Pipeline stages change it only through
/// `press`/`release`, `press_modifiers`/`release_modifiers` and
/// `add_weak_mods`/`clear_weak_mods`.
pub struct HidState {
    // In press order, oldest first
    keys: Vec<HeldKeyCode, REPORT_KEY_SLOTS>,
    modifiers: Vec<(KeyboardEventPos, HidModifiers), MODIFIER_SOURCES>,
    weak_mods: HidModifiers,
    consumer: Option<KeyboardEventPos>,
    pub(crate) last_report: KeyboardReport,
}

impl Default for HidState {
    fn default() -> Self {
        Self::new()
    }
}

impl HidState {
    pub fn new() -> Self {
        Self {
            keys: Vec::new(),
            modifiers: Vec::new(),
            weak_mods: HidModifiers::new(),
            consumer: None,
            last_report: KeyboardReport::default(),
        }
    }

    /// Register a keycode. Returns `true` if the report was full and the oldest keycode was dropped.
    pub fn press(&mut self, pos: KeyboardEventPos, keycode: KeyCode) -> bool {
        self.keys.retain(|k| k.pos != pos && k.keycode != keycode);
        let mut overflow = false;
        if self.keys.is_full() {
            let dropped = self.keys.remove(0);
            warn!("Report full, dropping {:?}", dropped.keycode);
            overflow = true;
        }
        // There is room now
        let _ = self.keys.push(HeldKeyCode { pos, keycode });
        overflow
    }

    /// Unregister the keycode registered by `pos`. Returns `false` if there was none,
    /// e.g. it was dropped by rollover.
    pub fn release(&mut self, pos: KeyboardEventPos) -> bool {
        match self.keys.iter().position(|k| k.pos == pos) {
            Some(i) => {
                self.keys.remove(i);
                true
            }
            None => false,
        }
    }

    pub fn press_modifiers(&mut self, pos: KeyboardEventPos, modifiers: HidModifiers) {
        if let Some((_, m)) = self.modifiers.iter_mut().find(|(p, _)| *p == pos) {
            *m |= modifiers;
            return;
        }
        if self.modifiers.push((pos, modifiers)).is_err() {
            error!("Too many held modifiers, dropping {:?}", modifiers);
        }
    }

    pub fn release_modifiers(&mut self, pos: KeyboardEventPos) {
        self.modifiers.retain(|(p, _)| *p != pos);
    }

    /// Weak modifiers apply until `clear_weak_mods`, which the pipeline calls right after the press report
    pub fn add_weak_mods(&mut self, modifiers: HidModifiers) {
        self.weak_mods |= modifiers;
    }

    pub fn clear_weak_mods(&mut self) {
        self.weak_mods = HidModifiers::new();
    }

    pub fn weak_mods(&self) -> HidModifiers {
        self.weak_mods
    }

    /// Modifiers held by keys, not including weak modifiers
    pub fn held_modifiers(&self) -> HidModifiers {
        self.modifiers
            .iter()
            .fold(HidModifiers::new(), |acc, (_, m)| acc | *m)
    }

    pub(crate) fn press_consumer(&mut self, pos: KeyboardEventPos) {
        self.consumer = Some(pos);
    }

    /// Returns `true` if `pos` is the key currently held in the consumer report
    pub(crate) fn release_consumer(&mut self, pos: KeyboardEventPos) -> bool {
        if self.consumer == Some(pos) {
            self.consumer = None;
            return true;
        }
        false
    }

    pub(crate) fn has_consumer(&self) -> bool {
        self.consumer.is_some()
    }

    /// Compose the keyboard report. `extra` carries modifiers owned outside, i.e. active one-shots.
    pub fn keyboard_report(&self, extra: HidModifiers) -> KeyboardReport {
        let mut keycodes = [0u8; REPORT_KEY_SLOTS];
        for (slot, k) in keycodes.iter_mut().zip(self.keys.iter()) {
            *slot = k.keycode as u8;
        }
        KeyboardReport {
            modifier: (self.held_modifiers() | self.weak_mods | extra).into_bits(),
            reserved: 0,
            leds: 0,
            keycodes,
        }
    }

    /// Drop everything held
    pub fn clear(&mut self) {
        self.keys.clear();
        self.modifiers.clear();
        self.weak_mods = HidModifiers::new();
        self.consumer = None;
    }
}
