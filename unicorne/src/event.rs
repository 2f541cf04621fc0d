use embassy_time::Instant;
use serde::{Deserialize, Serialize};

/// A position in the key matrix
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyPos {
    pub row: u8,
    pub col: u8,
}

/// Source of a key event after the combo stage.
///
/// A recognized combo replaces its member keys with a single virtual key, identified by the combo index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeyboardEventPos {
    Key(KeyPos),
    Combo(u8),
}

#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyboardEvent {
    pub pos: KeyboardEventPos,
    pub pressed: bool,
    pub time: Instant,
}

impl KeyboardEvent {
    pub fn key(row: u8, col: u8, pressed: bool, time: Instant) -> Self {
        Self {
            pos: KeyboardEventPos::Key(KeyPos { row, col }),
            pressed,
            time,
        }
    }

    pub fn combo(index: u8, pressed: bool, time: Instant) -> Self {
        Self {
            pos: KeyboardEventPos::Combo(index),
            pressed,
            time,
        }
    }

    /// The matrix position, `None` for virtual combo keys
    pub fn key_pos(&self) -> Option<KeyPos> {
        match self.pos {
            KeyboardEventPos::Key(pos) => Some(pos),
            KeyboardEventPos::Combo(_) => None,
        }
    }
}
