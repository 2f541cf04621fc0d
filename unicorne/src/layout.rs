//! Default unicorne layout: Qwerty base, symbols, navigation and function layers.
//!
//! The logical matrix is 4x12. Rows 0..3 are the finger rows, both halves side by side,
//! row 3 carries the six thumb keys in columns 3..=8.
//!
//! - F and J together turn caps word on
//! - Left thumb Ctrl and Shift are one-shot
//! - Enter sits on the `;` position, `;` lives on the symbol layer
//! - Tab is a tap of the symbol layer key
//! - The function layer is reached by holding both layer keys

use heapless::Vec;

use crate::action::{Action, KeyAction};
use crate::combo::Combo;
use crate::config::{BehaviorConfig, CombosConfig, OneShotConfig};
use crate::{a, k, layer, lt, mo, osm, rgb, shifted, sys};

pub const QWERTY: u8 = 0;
pub const SYM: u8 = 1;
pub const NAV: u8 = 2;
pub const FUN: u8 = 3;

pub const ROW: usize = 4;
pub const COL: usize = 12;
pub const NUM_LAYER: usize = 4;

pub const LA_SYM: KeyAction = lt!(SYM, Tab);
pub const LA_NAV: KeyAction = mo!(NAV);
pub const OS_SHFT: KeyAction = osm!(Shift);
pub const OS_CTRL: KeyAction = osm!(Ctrl);
pub const OS_ALT: KeyAction = osm!(Alt);
pub const OS_GUI: KeyAction = osm!(Gui);

const ____: KeyAction = a!(Transparent);
const XXXX: KeyAction = a!(No);

#[rustfmt::skip]
pub static KEYMAP: [[[KeyAction; COL]; ROW]; NUM_LAYER] = [
    layer!([
        [XXXX, k!(Q), k!(W), k!(E), k!(R), k!(T), k!(Y), k!(U), k!(I), k!(O), k!(P), XXXX],
        [XXXX, k!(A), k!(S), k!(D), k!(F), k!(G), k!(H), k!(J), k!(K), k!(L), k!(Enter), XXXX],
        [XXXX, k!(Z), k!(X), k!(C), k!(V), k!(B), k!(N), k!(M), k!(Comma), k!(Dot), k!(Slash), XXXX],
        [XXXX, XXXX, XXXX, OS_CTRL, OS_SHFT, LA_NAV, LA_SYM, k!(Space), OS_GUI, XXXX, XXXX, XXXX]
    ]),
    layer!([
        [____, k!(Kc1), k!(Kc2), k!(Kc3), k!(Kc4), k!(Kc5), k!(Kc6), k!(Kc7), k!(Kc8), k!(Kc9), k!(Kc0), ____],
        [____, k!(Grave), shifted!(Kc9), shifted!(Kc0), k!(Quote), k!(Equal), k!(Backslash), k!(Minus), k!(LeftBracket), k!(RightBracket), k!(Semicolon), ____],
        [____, shifted!(Grave), shifted!(Comma), shifted!(Dot), shifted!(Quote), shifted!(Equal), shifted!(Backslash), shifted!(Minus), shifted!(LeftBracket), shifted!(RightBracket), shifted!(Semicolon), ____],
        [____, ____, ____, ____, ____, ____, ____, ____, ____, ____, ____, ____]
    ]),
    layer!([
        [rgb!(ValueIncrease), rgb!(HueIncrease), rgb!(NextMode), rgb!(Toggle), k!(BrightnessUp), k!(BrightnessDown), k!(Home), k!(PageDown), k!(PageUp), k!(End), k!(PrintScreen), ____],
        [____, OS_GUI, OS_ALT, OS_CTRL, OS_SHFT, k!(Escape), k!(Left), k!(Down), k!(Up), k!(Right), k!(Backspace), ____],
        [____, ____, k!(AudioVolDown), k!(AudioMute), k!(AudioVolUp), k!(NumLock), k!(MediaPrevTrack), k!(MediaPlayPause), k!(MediaStop), k!(MediaNextTrack), k!(Delete), ____],
        [____, ____, ____, ____, ____, ____, ____, ____, ____, ____, ____, ____]
    ]),
    layer!([
        [sys!(Bootloader), k!(Kc1), k!(Kc2), k!(Kc3), k!(Kc4), k!(Kc5), k!(Kc6), k!(Kc7), k!(Kc8), k!(Kc9), k!(Kc0), ____],
        [sys!(ClearStorage), OS_GUI, OS_ALT, OS_CTRL, OS_SHFT, k!(F11), k!(F12), OS_SHFT, OS_CTRL, OS_ALT, OS_GUI, ____],
        [____, k!(F1), k!(F2), k!(F3), k!(F4), k!(F5), k!(F6), k!(F7), k!(F8), k!(F9), k!(F10), ____],
        [____, ____, ____, ____, ____, ____, ____, ____, ____, ____, ____, ____]
    ]),
];

/// The Nav layer key clears one-shot modifiers
pub fn is_oneshot_cancel(key: &KeyAction) -> bool {
    *key == LA_NAV
}

/// Layer keys and one-shot triggers don't consume one-shot modifiers.
///
/// A queued one-shot only reaches the report together with the key that consumes it, so the
/// Tab of a tapped `LA_SYM` goes out bare and the modifier stays queued. Firmware that registers
/// a queued modifier right away would send Shift+Tab here instead.
pub fn is_oneshot_ignored(key: &KeyAction) -> bool {
    [LA_NAV, LA_SYM, OS_SHFT, OS_CTRL, OS_ALT, OS_GUI].contains(key)
}

/// `F` + `J` turns caps word on
pub fn caps_word_combo() -> Combo {
    Combo::new([k!(F), k!(J)], KeyAction::Single(Action::CapsWordOn), None)
}

pub fn behavior_config() -> BehaviorConfig {
    let mut combos = Vec::new();
    if combos.push(caps_word_combo()).is_err() {
        error!("Combo list is full");
    }
    BehaviorConfig {
        tri_layer: Some([SYM, NAV, FUN]),
        one_shot: OneShotConfig {
            is_cancel: is_oneshot_cancel,
            is_ignored: is_oneshot_ignored,
            ..Default::default()
        },
        combo: CombosConfig {
            combos,
            ..Default::default()
        },
        ..Default::default()
    }
}
