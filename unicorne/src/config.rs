use embassy_time::Duration;
use heapless::Vec;

use crate::action::{Action, KeyAction};
use crate::combo::{COMBO_MAX_NUM, Combo};
use crate::keycode::KeyCode;

/// Predicate over a keymap entry, used for the one-shot cancel and ignore sets.
///
/// It receives the entry as written in the keymap, so a layer-tap key is seen as itself even when it was tapped.
pub type KeyPredicate = fn(&KeyAction) -> bool;

/// Predicate deciding what a press does to an active caps word
pub type CapsWordPredicate = fn(&Action) -> CapsWordPress;

/// Configurations for the key pipeline
#[derive(Clone, Debug, Default)]
pub struct BehaviorConfig {
    /// `[A, B, C]`: whenever A and B are both active, C is active too
    pub tri_layer: Option<[u8; 3]>,
    pub tap_hold: TapHoldConfig,
    pub one_shot: OneShotConfig,
    pub combo: CombosConfig,
    pub caps_word: CapsWordConfig,
}

/// Configurations for tap hold behavior
#[derive(Clone, Copy, Debug)]
pub struct TapHoldConfig {
    /// A tap-hold key held at least this long is a hold
    pub tapping_term: Duration,
    /// Decide hold as soon as another key is pressed and released inside the tapping term
    pub permissive_hold: bool,
}

impl Default for TapHoldConfig {
    fn default() -> Self {
        Self {
            tapping_term: Duration::from_millis(200),
            permissive_hold: true,
        }
    }
}

/// What a one-shot trigger does when it is released before any other key was pressed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OneShotReleasePolicy {
    /// Queue the modifier for the next key
    #[default]
    Queue,
    /// Send the bare modifier as a tap, nothing is queued
    Tap,
}

/// Config for one shot behavior
#[derive(Clone, Copy, Debug)]
pub struct OneShotConfig {
    /// A queued one-shot is dropped after this long, `None` keeps it until used
    pub timeout: Option<Duration>,
    /// Pressing a queued trigger again within this window locks the modifier, `None` disables locking
    pub lock_window: Option<Duration>,
    /// Indexed by `OneShotModifier::index()`
    pub release_policy: [OneShotReleasePolicy; 4],
    pub is_cancel: KeyPredicate,
    pub is_ignored: KeyPredicate,
}

impl Default for OneShotConfig {
    fn default() -> Self {
        Self {
            timeout: None,
            lock_window: Some(Duration::from_millis(200)),
            release_policy: [OneShotReleasePolicy::Queue; 4],
            is_cancel: never,
            is_ignored: layer_or_one_shot_key,
        }
    }
}

/// Config for combo behavior
#[derive(Clone, Debug)]
pub struct CombosConfig {
    pub combos: Vec<Combo, COMBO_MAX_NUM>,
    /// Decision window, restarted by every buffered press
    pub timeout: Duration,
}

impl Default for CombosConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(50),
            combos: Vec::new(),
        }
    }
}

/// Result of the caps word predicate for one press
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CapsWordPress {
    /// Send this press shifted and keep caps word on
    Shift,
    /// Send this press as is and keep caps word on
    Continue,
    /// Turn caps word off before this press is sent
    Stop,
}

/// Config for caps word behavior
#[derive(Clone, Copy, Debug)]
pub struct CapsWordConfig {
    /// Caps word turns off after this long without a shifted or continuing press
    pub timeout: Duration,
    pub press: CapsWordPredicate,
}

impl Default for CapsWordConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(5000),
            press: caps_word_press,
        }
    }
}

/// Letters and `-` are shifted, digits, backspace, delete and `_` keep the word going, anything else ends it
pub fn caps_word_press(action: &Action) -> CapsWordPress {
    match action {
        Action::Key(k) if k.is_caps_word_shifted_key() => CapsWordPress::Shift,
        Action::Key(k) if k.is_caps_word_continue_key() => CapsWordPress::Continue,
        Action::KeyWithModifier(KeyCode::Minus, m) if m.shift() => CapsWordPress::Continue,
        _ => CapsWordPress::Stop,
    }
}

pub fn never(_: &KeyAction) -> bool {
    false
}

pub fn layer_or_one_shot_key(key: &KeyAction) -> bool {
    key.is_layer_key() || key.one_shot().is_some()
}
