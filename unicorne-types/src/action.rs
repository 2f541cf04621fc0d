//! Keyboard actions and behaviors.
//!
//! - [`Action`] - a single operation a key performs when it is pressed or released
//! - [`KeyAction`] - what sits in a keymap slot: nothing, transparent, one action, or a tap-hold pair

use serde::{Deserialize, Serialize};

use crate::keycode::KeyCode;
use crate::modifier::ModifierCombination;

/// A KeyAction is the action at a keyboard position, stored in keymap.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeyAction {
    /// No action. Serialized as 0x0000.
    No,
    /// Transparent action, next layer will be checked.
    Transparent,
    /// A single action, such as triggering a key, or activating a layer.
    Single(Action),
    /// Tap-hold pair: the first action is taken on tap, the second one while held.
    TapHold(Action, Action),
}

impl KeyAction {
    /// Returns `true` if the slot switches layers, either directly or when held
    pub fn is_layer_key(&self) -> bool {
        matches!(
            self,
            KeyAction::Single(Action::LayerOn(_) | Action::DefaultLayer(_)) | KeyAction::TapHold(_, Action::LayerOn(_))
        )
    }

    /// Returns the one-shot modifier this slot triggers, if any
    pub fn one_shot(&self) -> Option<OneShotModifier> {
        match self {
            KeyAction::Single(Action::OneShot(m)) => Some(*m),
            _ => None,
        }
    }
}

/// A single basic action that a keyboard can execute.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Action {
    /// Default action, no action.
    No,
    /// A normal key stroke, uses for all keycodes defined in `KeyCode` enum, including mouse key, consumer/system control, etc.
    Key(KeyCode),
    /// A key stroke sent together with a modifier combination, `(` is `KeyWithModifier(Kc9, LSHIFT)`.
    KeyWithModifier(KeyCode, ModifierCombination),
    /// Modifier Combination, used for tap hold and standalone modifier keys.
    Modifier(ModifierCombination),
    /// Activate a layer while the key is held.
    LayerOn(u8),
    /// Set the base layer.
    DefaultLayer(u8),
    /// One-shot modifier bound to one of the four modifier slots.
    OneShot(OneShotModifier),
    /// Turn caps word on.
    CapsWordOn,
    /// Toggle caps word.
    CapsWordToggle,
    /// Actions handled outside the key pipeline.
    System(SystemAction),
}

impl Action {
    /// Returns the keycode this action registers in a report, if any.
    pub fn keycode(&self) -> Option<KeyCode> {
        match self {
            Action::Key(k) | Action::KeyWithModifier(k, _) => Some(*k),
            _ => None,
        }
    }

    /// Returns the keycode this action puts into the keyboard report. Media keys go to the consumer report.
    pub fn keyboard_keycode(&self) -> Option<KeyCode> {
        self.keycode().filter(|k| k.is_basic() || k.is_modifier())
    }
}

/// The four independent one-shot modifier slots.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OneShotModifier {
    Shift = 0,
    Ctrl = 1,
    Alt = 2,
    Gui = 3,
}

impl OneShotModifier {
    pub const ALL: [OneShotModifier; 4] = [
        OneShotModifier::Shift,
        OneShotModifier::Ctrl,
        OneShotModifier::Alt,
        OneShotModifier::Gui,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// One-shots always register the left-hand modifier
    pub fn to_modifier_combination(self) -> ModifierCombination {
        match self {
            OneShotModifier::Shift => ModifierCombination::LSHIFT,
            OneShotModifier::Ctrl => ModifierCombination::LCTRL,
            OneShotModifier::Alt => ModifierCombination::LALT,
            OneShotModifier::Gui => ModifierCombination::LGUI,
        }
    }
}

/// Actions the pipeline recognizes but hands to the board.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SystemAction {
    /// Reboot into the bootloader
    Bootloader,
    /// Wipe persistent storage
    ClearStorage,
    Rgb(RgbAction),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RgbAction {
    Toggle,
    NextMode,
    HueIncrease,
    ValueIncrease,
}
