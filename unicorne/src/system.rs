use crate::action::RgbAction;

/// Board-level actions triggered from the keymap.
///
/// The pipeline only recognizes these keys, what they do is up to the board.
pub trait SystemHandler {
    /// Jump to the bootloader, usually does not return
    fn jump_to_bootloader(&mut self) {
        warn!("No bootloader to jump to!");
    }

    /// Erase persistent storage (EEPROM or flash)
    fn clear_storage(&mut self) {
        warn!("No storage to clear!");
    }

    fn rgb(&mut self, action: RgbAction) {
        debug!("RGB action {:?} ignored", action);
    }
}

/// A board without any system integration
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSystem;

impl SystemHandler for NoSystem {}
