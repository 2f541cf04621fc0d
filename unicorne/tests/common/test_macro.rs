extern crate unicorne;

/// Run a key sequence on a keyboard and check the keyboard reports it sent.
///
/// `keyboard` is borrowed mutably, pass a variable to look at its state afterwards.
#[macro_export]
macro_rules! key_sequence_test {
    (keyboard: $keyboard:expr, sequence: [$([$row:expr, $col:expr, $pressed:expr, $delay:expr]),* $(,)?], expected_reports: [$([$modifier:expr, $keys:expr]),* $(,)?]) => {{
        let sequence = $crate::key_sequence![$([$row, $col, $pressed, $delay]),*];
        let expected_reports = $crate::key_report![$([$modifier, $keys]),*];
        $crate::common::run_key_sequence_test(&mut $keyboard, &sequence, &expected_reports);
    }};
}

// a rust macro to map a key name to its hid usage as u8
#[macro_export]
macro_rules! kc8 {
    ($key: ident) => {
        unicorne::keycode::KeyCode::$key as u8
    };
}

// a rust macro to create a key sequence to simulate key presses
#[macro_export]
macro_rules! key_sequence {
    ($([$row:expr, $col:expr, $pressed:expr, $delay:expr]),* $(,)?) => {
        ::std::vec![
            $(
                $crate::common::TestKeyPress {
                    row: $row,
                    col: $col,
                    pressed: $pressed,
                    delay: $delay,
                },
            )*
        ]
    };
}

// a rust macro to create a key report that simulates key status change in hid
#[macro_export]
macro_rules! key_report {
    ($([$modifier:expr, $keys:expr]),* $(,)?) => {
        {
            let reports: ::std::vec::Vec<unicorne::descriptor::KeyboardReport> = ::std::vec![
                $(
                    unicorne::descriptor::KeyboardReport {
                        modifier: $modifier,
                        keycodes: $keys,
                        leds: 0,
                        reserved: 0,
                    },
                )*
            ];
            reports
        }
    };
}
