use embassy_time::{Duration, Instant};

use crate::action::Action;
use crate::config::{CapsWordPredicate, CapsWordPress};
use crate::hid::HidReporter;
use crate::keyboard::Keyboard;
use crate::system::SystemHandler;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CapsWordState {
    #[default]
    Off,
    On {
        deadline: Instant,
    },
}

impl CapsWordState {
    pub fn is_on(&self) -> bool {
        matches!(self, CapsWordState::On { .. })
    }

    /// Turn on, or push the deadline out if already on
    pub(crate) fn activate(&mut self, now: Instant, timeout: Duration) {
        if !self.is_on() {
            debug!("Caps word on");
        }
        *self = CapsWordState::On { deadline: now + timeout };
    }

    pub(crate) fn deactivate(&mut self) {
        if self.is_on() {
            debug!("Caps word off");
        }
        *self = CapsWordState::Off;
    }

    pub(crate) fn expire(&mut self, now: Instant) {
        if let CapsWordState::On { deadline } = *self {
            if now >= deadline {
                debug!("Caps word timed out");
                *self = CapsWordState::Off;
            }
        }
    }

    /// Filter a press. Returns `true` if the press has to be shifted.
    ///
    /// Modifiers, layer keys, one-shot triggers and caps word keys leave the state alone.
    pub(crate) fn on_press(
        &mut self,
        action: &Action,
        now: Instant,
        timeout: Duration,
        predicate: CapsWordPredicate,
    ) -> bool {
        self.expire(now);
        if !self.is_on() {
            return false;
        }
        match action {
            Action::Key(k) if k.is_modifier() => return false,
            Action::No
            | Action::Modifier(_)
            | Action::LayerOn(_)
            | Action::DefaultLayer(_)
            | Action::OneShot(_)
            | Action::CapsWordOn
            | Action::CapsWordToggle
            | Action::System(_) => return false,
            _ => (),
        }
        match predicate(action) {
            CapsWordPress::Shift => {
                self.activate(now, timeout);
                true
            }
            CapsWordPress::Continue => {
                self.activate(now, timeout);
                false
            }
            CapsWordPress::Stop => {
                self.deactivate();
                false
            }
        }
    }
}

impl<'a, H: HidReporter, S: SystemHandler, const ROW: usize, const COL: usize, const NUM_LAYER: usize>
    Keyboard<'a, H, S, ROW, COL, NUM_LAYER>
{
    pub(crate) fn process_caps_word_press(&mut self, action: &Action, now: Instant) -> bool {
        let config = self.behavior.caps_word;
        self.caps_word.on_press(action, now, config.timeout, config.press)
    }

    pub(crate) fn process_caps_word_action(&mut self, action: &Action, now: Instant) {
        let timeout = self.behavior.caps_word.timeout;
        match action {
            Action::CapsWordOn => self.caps_word.activate(now, timeout),
            Action::CapsWordToggle if self.caps_word.is_on() => self.caps_word.deactivate(),
            Action::CapsWordToggle => self.caps_word.activate(now, timeout),
            _ => (),
        }
    }

    pub fn caps_word_active(&self) -> bool {
        self.caps_word.is_on()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::caps_word_press;
    use crate::keycode::KeyCode;

    const TIMEOUT: Duration = Duration::from_millis(5000);

    fn press(state: &mut CapsWordState, k: KeyCode, ms: u64) -> bool {
        state.on_press(&Action::Key(k), Instant::from_millis(ms), TIMEOUT, caps_word_press)
    }

    #[test]
    fn test_off_does_nothing() {
        let mut state = CapsWordState::Off;
        assert!(!press(&mut state, KeyCode::A, 0));
        assert!(!state.is_on());
    }

    #[test]
    fn test_word_until_space() {
        let mut state = CapsWordState::Off;
        state.activate(Instant::from_millis(0), TIMEOUT);
        assert!(press(&mut state, KeyCode::H, 10));
        assert!(!press(&mut state, KeyCode::Kc1, 20));
        assert!(press(&mut state, KeyCode::Minus, 30));
        assert!(!press(&mut state, KeyCode::LShift, 40));
        assert!(state.is_on());
        assert!(!press(&mut state, KeyCode::Space, 50));
        assert!(!state.is_on());
        assert!(!press(&mut state, KeyCode::I, 60));
    }

    #[test]
    fn test_deadline_follows_last_qualifying_press() {
        let mut state = CapsWordState::Off;
        state.activate(Instant::from_millis(0), TIMEOUT);
        assert!(press(&mut state, KeyCode::A, 4000));
        // Layer keys don't refresh the deadline
        assert!(!state.on_press(&Action::LayerOn(1), Instant::from_millis(8000), TIMEOUT, caps_word_press));
        assert!(state.is_on());
        state.expire(Instant::from_millis(8999));
        assert!(state.is_on());
        state.expire(Instant::from_millis(9000));
        assert!(!state.is_on());
    }

    #[test]
    fn test_activation_extends() {
        let mut state = CapsWordState::Off;
        state.activate(Instant::from_millis(0), TIMEOUT);
        state.activate(Instant::from_millis(3000), TIMEOUT);
        assert_eq!(
            state,
            CapsWordState::On {
                deadline: Instant::from_millis(8000)
            }
        );
    }
}
