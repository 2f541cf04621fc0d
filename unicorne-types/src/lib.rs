//! # Unicorne Types
//!
//! Plain data shared by the unicorne key pipeline and by anything that builds a keymap for it.
//!
//! - [`keycode`] - HID keyboard usages, consumer-page usages and their classification
//! - [`modifier`] - Modifier combinations and the raw HID modifier byte
//! - [`action`] - What a key does: single actions, tap-hold pairs, layer and one-shot triggers

#![no_std]

pub mod action;
pub mod keycode;
pub mod modifier;
