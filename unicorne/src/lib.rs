//! Key processing pipeline of the unicorne, a 3x6+3 split keyboard.
//!
//! Physical key events enter through [`Keyboard::on_matrix_event`], pass the combo recognizer,
//! the tap-hold arbiter, the layer resolver, caps word and the one-shot modifiers, and leave
//! as HID reports through a [`hid::HidReporter`].

#![cfg_attr(not(test), no_std)]

#[cfg(all(feature = "log", feature = "defmt"))]
compile_error!("You may not enable both `defmt` and `log` features.");

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod combo;
pub mod config;
pub mod descriptor;
pub mod diagnostics;
pub mod event;
pub mod hid;
pub mod hid_state;
pub mod keyboard;
pub mod keymap;
pub mod layout;
pub mod layout_macro;
pub mod system;
pub(crate) mod tap_hold;

pub use keyboard::{CapsWordState, Keyboard, OneShotState};
pub use unicorne_types::{action, keycode, modifier};
