pub mod common;

use embassy_time::{Duration, Instant};
use unicorne::action::OneShotModifier;
use unicorne::config::OneShotReleasePolicy;
use unicorne::keyboard::OneShotState;
use unicorne::layout::behavior_config;

use crate::common::{
    KC_LCTRL, KC_LGUI, KC_LSHIFT, create_test_keyboard, create_test_keyboard_with_config, run_key_sequence,
    settle,
};

// Positions on the unicorne layout
// (3, 3) OS_CTRL, (3, 4) OS_SHFT, (3, 5) LA_NAV, (3, 6) LA_SYM, (3, 8) OS_GUI
// (1, 1) A, (2, 5) B, (1, 5) Escape on Nav

mod one_shot_test {
    use super::*;

    #[test]
    fn test_one_shot_shift_then_letter() {
        key_sequence_test! {
            keyboard: create_test_keyboard(),
            sequence: [
                [3, 4, true, 0],   // Press OS_SHFT
                [3, 4, false, 50], // Release OS_SHFT
                [1, 1, true, 50],  // Press A
                [1, 1, false, 50], // Release A
            ],
            expected_reports: [
                [KC_LSHIFT, [kc8!(A), 0, 0, 0, 0, 0]],
                [0, [kc8!(A), 0, 0, 0, 0, 0]],
                [0, [0; 6]],
            ]
        };
    }

    #[test]
    fn test_one_shot_not_consumed_by_layer_key() {
        key_sequence_test! {
            keyboard: create_test_keyboard(),
            sequence: [
                [3, 4, true, 0],
                [3, 4, false, 50],
                [3, 5, true, 50],  // Press LA_NAV
                [3, 5, false, 50], // Release LA_NAV
                [1, 1, true, 50],
                [1, 1, false, 50],
            ],
            expected_reports: [
                [KC_LSHIFT, [kc8!(A), 0, 0, 0, 0, 0]],
                [0, [kc8!(A), 0, 0, 0, 0, 0]],
                [0, [0; 6]],
            ]
        };
    }

    #[test]
    fn test_one_shot_not_consumed_by_tapped_layer_tap_key() {
        key_sequence_test! {
            keyboard: create_test_keyboard(),
            sequence: [
                [3, 4, true, 0],
                [3, 4, false, 50],
                [3, 6, true, 50],  // Tap LA_SYM, sends Tab
                [3, 6, false, 50],
                [1, 1, true, 50],
                [1, 1, false, 50],
            ],
            expected_reports: [
                [0, [kc8!(Tab), 0, 0, 0, 0, 0]],
                [0, [0; 6]],
                [KC_LSHIFT, [kc8!(A), 0, 0, 0, 0, 0]],
                [0, [kc8!(A), 0, 0, 0, 0, 0]],
                [0, [0; 6]],
            ]
        };
    }

    #[test]
    fn test_one_shot_held_acts_as_modifier() {
        key_sequence_test! {
            keyboard: create_test_keyboard(),
            sequence: [
                [3, 3, true, 0],   // Hold OS_CTRL
                [1, 1, true, 50],
                [1, 1, false, 50],
                [3, 3, false, 50],
            ],
            expected_reports: [
                [KC_LCTRL, [kc8!(A), 0, 0, 0, 0, 0]],
                [KC_LCTRL, [0; 6]],
                [0, [0; 6]],
            ]
        };
    }

    #[test]
    fn test_one_shot_queued_state() {
        let mut keyboard = create_test_keyboard();
        let end = run_key_sequence(
            &mut keyboard,
            0,
            &key_sequence![[3, 4, true, 0], [3, 4, false, 50]],
        );
        assert_eq!(
            keyboard.one_shot_state(OneShotModifier::Shift),
            OneShotState::Queued {
                since: Instant::from_millis(50)
            }
        );
        settle(&mut keyboard, end, 1000);
        // No timeout by default
        assert!(matches!(
            keyboard.one_shot_state(OneShotModifier::Shift),
            OneShotState::Queued { .. }
        ));
        assert!(keyboard.reporter().reports.is_empty());
    }

    #[test]
    fn test_one_shot_lock() {
        key_sequence_test! {
            keyboard: create_test_keyboard(),
            sequence: [
                [3, 4, true, 0],    // Tap OS_SHFT
                [3, 4, false, 30],
                [3, 4, true, 70],   // Tap again quickly, locks
                [3, 4, false, 30],
                [1, 1, true, 70],   // A
                [1, 1, false, 50],
                [2, 5, true, 50],   // B
                [2, 5, false, 50],
                [3, 4, true, 100],  // Tap OS_SHFT, unlocks
                [3, 4, false, 30],
            ],
            expected_reports: [
                [KC_LSHIFT, [0; 6]],
                [KC_LSHIFT, [kc8!(A), 0, 0, 0, 0, 0]],
                [KC_LSHIFT, [0; 6]],
                [KC_LSHIFT, [kc8!(B), 0, 0, 0, 0, 0]],
                [KC_LSHIFT, [0; 6]],
                [0, [0; 6]],
            ]
        };
    }

    #[test]
    fn test_slow_double_tap_does_not_lock() {
        let mut keyboard = create_test_keyboard();
        key_sequence_test! {
            keyboard: keyboard,
            sequence: [
                [3, 4, true, 0],
                [3, 4, false, 30],
                [3, 4, true, 400],
                [3, 4, false, 30],
                [1, 1, true, 50],
                [1, 1, false, 50],
            ],
            expected_reports: [
                [KC_LSHIFT, [kc8!(A), 0, 0, 0, 0, 0]],
                [0, [kc8!(A), 0, 0, 0, 0, 0]],
                [0, [0; 6]],
            ]
        };
        assert_eq!(keyboard.one_shot_state(OneShotModifier::Shift), OneShotState::Idle);
    }

    #[test]
    fn test_cancel_key_clears_locked_one_shot() {
        key_sequence_test! {
            keyboard: create_test_keyboard(),
            sequence: [
                [3, 4, true, 0],
                [3, 4, false, 30],
                [3, 4, true, 70],   // Locked
                [3, 4, false, 30],
                [3, 5, true, 50],   // LA_NAV cancels
                [3, 5, false, 50],
                [1, 1, true, 50],
                [1, 1, false, 50],
            ],
            expected_reports: [
                [KC_LSHIFT, [0; 6]],
                [0, [0; 6]],
                [0, [kc8!(A), 0, 0, 0, 0, 0]],
                [0, [0; 6]],
            ]
        };
    }

    #[test]
    fn test_custom_cancel_key_clears_queued_one_shot() {
        let mut config = behavior_config();
        config.one_shot.is_cancel = |key| *key == unicorne::k!(Escape);
        key_sequence_test! {
            keyboard: create_test_keyboard_with_config(config),
            sequence: [
                [3, 4, true, 0],
                [3, 4, false, 50],
                [3, 5, true, 50],   // Hold LA_NAV
                [1, 5, true, 50],   // Escape
                [1, 5, false, 50],
                [3, 5, false, 50],
                [1, 1, true, 50],
                [1, 1, false, 50],
            ],
            expected_reports: [
                [0, [kc8!(Escape), 0, 0, 0, 0, 0]],
                [0, [0; 6]],
                [0, [kc8!(A), 0, 0, 0, 0, 0]],
                [0, [0; 6]],
            ]
        };
    }

    #[test]
    fn test_one_shots_are_additive() {
        key_sequence_test! {
            keyboard: create_test_keyboard(),
            sequence: [
                [3, 4, true, 0],   // OS_SHFT
                [3, 4, false, 30],
                [3, 3, true, 30],  // OS_CTRL
                [3, 3, false, 30],
                [1, 1, true, 30],
                [1, 1, false, 50],
            ],
            expected_reports: [
                [KC_LSHIFT | KC_LCTRL, [kc8!(A), 0, 0, 0, 0, 0]],
                [0, [kc8!(A), 0, 0, 0, 0, 0]],
                [0, [0; 6]],
            ]
        };
    }

    #[test]
    fn test_gui_tap_policy() {
        let mut config = behavior_config();
        config.one_shot.release_policy[OneShotModifier::Gui.index()] = OneShotReleasePolicy::Tap;
        let mut keyboard = create_test_keyboard_with_config(config);
        key_sequence_test! {
            keyboard: keyboard,
            sequence: [
                [3, 8, true, 0],   // Tap OS_GUI
                [3, 8, false, 40],
                [1, 1, true, 50],
                [1, 1, false, 50],
            ],
            expected_reports: [
                [KC_LGUI, [0; 6]],
                [0, [0; 6]],
                [0, [kc8!(A), 0, 0, 0, 0, 0]],
                [0, [0; 6]],
            ]
        };
        assert_eq!(keyboard.one_shot_state(OneShotModifier::Gui), OneShotState::Idle);
    }

    #[test]
    fn test_gui_default_policy_queues() {
        key_sequence_test! {
            keyboard: create_test_keyboard(),
            sequence: [
                [3, 8, true, 0],
                [3, 8, false, 40],
                [1, 1, true, 50],
                [1, 1, false, 50],
            ],
            expected_reports: [
                [KC_LGUI, [kc8!(A), 0, 0, 0, 0, 0]],
                [0, [kc8!(A), 0, 0, 0, 0, 0]],
                [0, [0; 6]],
            ]
        };
    }

    #[test]
    fn test_one_shot_timeout() {
        let mut config = behavior_config();
        config.one_shot.timeout = Some(Duration::from_millis(500));
        let mut keyboard = create_test_keyboard_with_config(config);
        key_sequence_test! {
            keyboard: keyboard,
            sequence: [
                [3, 4, true, 0],
                [3, 4, false, 50],
                [1, 1, true, 650],
                [1, 1, false, 50],
            ],
            expected_reports: [
                [0, [kc8!(A), 0, 0, 0, 0, 0]],
                [0, [0; 6]],
            ]
        };
        assert_eq!(keyboard.one_shot_state(OneShotModifier::Shift), OneShotState::Idle);
    }

    #[test]
    fn test_media_key_does_not_consume_one_shot() {
        let mut keyboard = create_test_keyboard();
        key_sequence_test! {
            keyboard: keyboard,
            sequence: [
                [3, 4, true, 0],   // Tap OS_SHFT
                [3, 4, false, 50],
                [3, 5, true, 50],  // Hold LA_NAV
                [2, 4, true, 50],  // Vol+
                [2, 4, false, 50],
                [3, 5, false, 50],
                [1, 1, true, 50],  // A takes the queued Shift
                [1, 1, false, 50],
            ],
            expected_reports: [
                [KC_LSHIFT, [kc8!(A), 0, 0, 0, 0, 0]],
                [0, [kc8!(A), 0, 0, 0, 0, 0]],
                [0, [0; 6]],
            ]
        };
        assert_eq!(keyboard.reporter().media_usages(), vec![0xE9, 0]);
        assert_eq!(keyboard.one_shot_state(OneShotModifier::Shift), OneShotState::Idle);
    }
}
