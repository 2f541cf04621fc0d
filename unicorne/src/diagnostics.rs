use serde::Serialize;

/// Counters for anomalies the pipeline recovered from.
///
/// Nothing here is an error for the caller, the counters only make misbehaving
/// matrices, clocks or keymaps visible.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Diagnostics {
    /// Releases without a press, and presses of keys already down
    pub stale_releases: u32,
    /// Keycodes dropped from a full report
    pub report_overflows: u32,
    /// Keymap entries that can't be executed: transparent base entries, bad layers, bad positions
    pub unknown_keycodes: u32,
    /// Timestamps going backwards
    pub timer_skews: u32,
}

impl Diagnostics {
    pub(crate) fn stale_release(&mut self) {
        self.stale_releases = self.stale_releases.saturating_add(1);
    }

    pub(crate) fn report_overflow(&mut self) {
        self.report_overflows = self.report_overflows.saturating_add(1);
    }

    pub(crate) fn unknown_keycode(&mut self) {
        self.unknown_keycodes = self.unknown_keycodes.saturating_add(1);
    }

    pub(crate) fn timer_skew(&mut self) {
        self.timer_skews = self.timer_skews.saturating_add(1);
    }

    pub fn total(&self) -> u32 {
        self.stale_releases
            .saturating_add(self.report_overflows)
            .saturating_add(self.unknown_keycodes)
            .saturating_add(self.timer_skews)
    }
}
