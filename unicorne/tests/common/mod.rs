pub mod test_macro;

use embassy_time::Instant;
use unicorne::action::{KeyAction, RgbAction};
use unicorne::config::BehaviorConfig;
use unicorne::descriptor::KeyboardReport;
use unicorne::hid::{HidReporter, Report};
use unicorne::keyboard::Keyboard;
use unicorne::layout::{COL, KEYMAP, NUM_LAYER, ROW, behavior_config};
use unicorne::system::SystemHandler;

// Init logger for tests
pub fn init_log() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init();
}

pub(crate) const KC_LCTRL: u8 = 1 << 0;
pub(crate) const KC_LSHIFT: u8 = 1 << 1;
pub(crate) const KC_LALT: u8 = 1 << 2;
pub(crate) const KC_LGUI: u8 = 1 << 3;

/// Time the simulator keeps ticking after the last key event, longer than the tapping term
pub(crate) const SETTLE_MS: u64 = 300;

/// Collects every report the keyboard sends
#[derive(Debug, Default)]
pub struct RecordingReporter {
    pub reports: Vec<Report>,
}

impl HidReporter for RecordingReporter {
    fn send_report(&mut self, report: Report) {
        self.reports.push(report);
    }
}

impl RecordingReporter {
    pub fn keyboard_reports(&self) -> Vec<KeyboardReport> {
        self.reports
            .iter()
            .filter_map(|r| match r {
                Report::KeyboardReport(report) => Some(*report),
                _ => None,
            })
            .collect()
    }

    /// Usage ids of the consumer reports, copied out of the packed reports
    pub fn media_usages(&self) -> Vec<u16> {
        self.reports
            .iter()
            .filter_map(|r| match r {
                Report::MediaKeyboardReport(report) => Some(report.usage_id),
                _ => None,
            })
            .collect()
    }
}

/// Counts system actions instead of performing them
#[derive(Debug, Default)]
pub struct RecordingSystem {
    pub bootloader: u32,
    pub cleared: u32,
    pub rgb: Vec<RgbAction>,
}

impl SystemHandler for RecordingSystem {
    fn jump_to_bootloader(&mut self) {
        self.bootloader += 1;
    }

    fn clear_storage(&mut self) {
        self.cleared += 1;
    }

    fn rgb(&mut self, action: RgbAction) {
        self.rgb.push(action);
    }
}

pub type TestKeyboard<'a, const R: usize, const C: usize, const L: usize> =
    Keyboard<'a, RecordingReporter, RecordingSystem, R, C, L>;

#[derive(Debug, Clone)]
pub struct TestKeyPress {
    pub row: u8,
    pub col: u8,
    pub pressed: bool,
    pub delay: u64, // Delay before this key event in milliseconds
}

/// Feed a key sequence starting at `start_ms`, ticking the keyboard every millisecond in between.
/// Events with a zero delay land in the same scan as the one before.
///
/// Returns the time of the last key event, its scan is closed with a tick.
pub fn run_key_sequence<const R: usize, const C: usize, const L: usize>(
    keyboard: &mut TestKeyboard<'_, R, C, L>,
    start_ms: u64,
    key_sequence: &[TestKeyPress],
) -> u64 {
    let mut now = start_ms;
    for key in key_sequence {
        for _ in 1..key.delay {
            now += 1;
            keyboard.tick(Instant::from_millis(now));
        }
        if key.delay > 0 {
            now += 1;
        }
        keyboard.on_matrix_event(key.row, key.col, key.pressed, Instant::from_millis(now));
    }
    keyboard.tick(Instant::from_millis(now));
    now
}

/// Keep ticking for `duration_ms` after `from_ms`. Returns the end time.
pub fn settle<const R: usize, const C: usize, const L: usize>(
    keyboard: &mut TestKeyboard<'_, R, C, L>,
    from_ms: u64,
    duration_ms: u64,
) -> u64 {
    for t in from_ms + 1..=from_ms + duration_ms {
        keyboard.tick(Instant::from_millis(t));
    }
    from_ms + duration_ms
}

// run a keyboard test, input is a seq of key events with delays, the keyboard reports are compared with the expected ones
pub fn run_key_sequence_test<const R: usize, const C: usize, const L: usize>(
    keyboard: &mut TestKeyboard<'_, R, C, L>,
    key_sequence: &[TestKeyPress],
    expected_reports: &[KeyboardReport],
) {
    let end = run_key_sequence(keyboard, 0, key_sequence);
    settle(keyboard, end, SETTLE_MS);

    let reports = keyboard.reporter().keyboard_reports();
    for (i, (expected, report)) in expected_reports.iter().zip(reports.iter()).enumerate() {
        assert_eq!(
            expected, report,
            "on #{} reports, expected left but actually right",
            i
        );
    }
    assert_eq!(
        expected_reports.len(),
        reports.len(),
        "expected {} reports, got {:?}",
        expected_reports.len(),
        reports
    );
}

pub fn create_test_keyboard_with_config(config: BehaviorConfig) -> TestKeyboard<'static, ROW, COL, NUM_LAYER> {
    init_log();
    Keyboard::new(&KEYMAP, config, RecordingReporter::default(), RecordingSystem::default())
}

/// The unicorne layout with its own behavior config
pub fn create_test_keyboard() -> TestKeyboard<'static, ROW, COL, NUM_LAYER> {
    create_test_keyboard_with_config(behavior_config())
}

/// A keyboard over a custom keymap
pub fn create_custom_keyboard<const R: usize, const C: usize, const L: usize>(
    keymap: [[[KeyAction; C]; R]; L],
    config: BehaviorConfig,
) -> TestKeyboard<'static, R, C, L> {
    init_log();
    // Box::leak is acceptable in tests
    let keymap = Box::leak(Box::new(keymap));
    Keyboard::new(keymap, config, RecordingReporter::default(), RecordingSystem::default())
}
