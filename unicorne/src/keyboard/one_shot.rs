use embassy_time::{Duration, Instant};

use crate::action::{Action, KeyAction, OneShotModifier};
use crate::config::OneShotReleasePolicy;
use crate::hid::HidReporter;
use crate::keyboard::Keyboard;
use crate::modifier::HidModifiers;
use crate::system::SystemHandler;

/// State machine of one one-shot modifier
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OneShotState {
    /// One shot inactive
    #[default]
    Idle,
    /// Trigger is down and no other key was pressed yet
    HeldForNext,
    /// Trigger was tapped, the modifier waits for the next key
    Queued { since: Instant },
    /// Another key was pressed while the trigger is down, behaves as a normal modifier until released
    ActiveWhileHeld,
    /// Double tapped, sticks until the trigger is tapped again
    Locked,
}

impl OneShotState {
    /// Modifier goes into every report while in this state
    fn is_strong(self) -> bool {
        matches!(self, OneShotState::ActiveWhileHeld | OneShotState::Locked)
    }
}

/// How the other one-shots see a press
#[derive(Clone, Copy, Debug)]
pub(crate) struct OtherPress {
    /// Layer keys and triggers, they never consume a one-shot
    pub(crate) ignored: bool,
    pub(crate) cancel: bool,
    /// The press puts a keycode into the keyboard report
    pub(crate) qualifying: bool,
}

/// The four one-shot modifiers, indexed by `OneShotModifier::index()`
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct OneShotModifiers {
    states: [OneShotState; 4],
}

impl OneShotModifiers {
    pub(crate) fn state(&self, m: OneShotModifier) -> OneShotState {
        self.states[m.index()]
    }

    pub(crate) fn reset(&mut self) {
        self.states = [OneShotState::Idle; 4];
    }

    /// Modifiers of held or locked one-shots
    pub(crate) fn strong_modifiers(&self) -> HidModifiers {
        OneShotModifier::ALL
            .iter()
            .filter(|m| self.states[m.index()].is_strong())
            .fold(HidModifiers::new(), |acc, m| acc | m.to_modifier_combination().to_hid_modifiers())
    }

    pub(crate) fn on_trigger_press(&mut self, m: OneShotModifier, now: Instant, lock_window: Option<Duration>) {
        let state = &mut self.states[m.index()];
        *state = match *state {
            OneShotState::Idle => OneShotState::HeldForNext,
            OneShotState::Queued { since } => match lock_window {
                Some(window) if now.saturating_duration_since(since) <= window => OneShotState::Locked,
                _ => OneShotState::HeldForNext,
            },
            OneShotState::Locked => OneShotState::Idle,
            // Another position with the same trigger
            s @ (OneShotState::HeldForNext | OneShotState::ActiveWhileHeld) => s,
        };
        debug!("One-shot {:?} pressed: {:?}", m, *state);
    }

    /// Returns `true` if the modifier should be tapped on its own
    pub(crate) fn on_trigger_release(&mut self, m: OneShotModifier, now: Instant, policy: OneShotReleasePolicy) -> bool {
        let state = &mut self.states[m.index()];
        let mut tap = false;
        *state = match (*state, policy) {
            (OneShotState::HeldForNext, OneShotReleasePolicy::Queue) => OneShotState::Queued { since: now },
            (OneShotState::HeldForNext, OneShotReleasePolicy::Tap) => {
                tap = true;
                OneShotState::Idle
            }
            (OneShotState::ActiveWhileHeld, _) => OneShotState::Idle,
            (s, _) => s,
        };
        debug!("One-shot {:?} released: {:?}", m, *state);
        tap
    }

    /// Update every one-shot except `except` for a press of another key.
    ///
    /// Returns the modifiers consumed by this press, to be sent as weak modifiers.
    pub(crate) fn on_other_press(&mut self, except: Option<OneShotModifier>, press: OtherPress) -> HidModifiers {
        let mut consumed = HidModifiers::new();
        for m in OneShotModifier::ALL {
            if Some(m) == except {
                continue;
            }
            let state = &mut self.states[m.index()];
            *state = match *state {
                OneShotState::Queued { .. } if press.ignored => *state,
                OneShotState::Queued { .. } if press.cancel => OneShotState::Idle,
                OneShotState::Queued { .. } if press.qualifying => {
                    consumed |= m.to_modifier_combination().to_hid_modifiers();
                    OneShotState::Idle
                }
                OneShotState::HeldForNext if !press.ignored && press.qualifying => OneShotState::ActiveWhileHeld,
                OneShotState::ActiveWhileHeld | OneShotState::Locked if press.cancel => OneShotState::Idle,
                s => s,
            };
        }
        consumed
    }

    /// Drop queued one-shots older than `timeout`. Returns `true` if any was dropped.
    pub(crate) fn expire(&mut self, now: Instant, timeout: Duration) -> bool {
        let mut expired = false;
        for state in self.states.iter_mut() {
            if let OneShotState::Queued { since } = *state {
                if now.saturating_duration_since(since) >= timeout {
                    *state = OneShotState::Idle;
                    expired = true;
                }
            }
        }
        expired
    }
}

impl<'a, H: HidReporter, S: SystemHandler, const ROW: usize, const COL: usize, const NUM_LAYER: usize>
    Keyboard<'a, H, S, ROW, COL, NUM_LAYER>
{
    /// One-shot stage of a press. Returns the modifiers this press consumed.
    pub(crate) fn process_one_shot_press(&mut self, action: &Action, source: &KeyAction, now: Instant) -> HidModifiers {
        let config = &self.behavior.one_shot;
        let trigger = match action {
            Action::OneShot(m) => Some(*m),
            _ => None,
        };
        let press = OtherPress {
            ignored: trigger.is_some() || (config.is_ignored)(source),
            cancel: (config.is_cancel)(source),
            qualifying: action.keyboard_keycode().is_some(),
        };
        let lock_window = config.lock_window;

        let consumed = self.one_shot.on_other_press(trigger, press);
        if let Some(m) = trigger {
            self.one_shot.on_trigger_press(m, now, lock_window);
        }
        consumed
    }

    /// One-shot stage of a release, a trigger released alone may tap its modifier
    pub(crate) fn process_one_shot_release(&mut self, action: &Action, now: Instant) {
        let Action::OneShot(m) = action else {
            return;
        };
        let policy = self.behavior.one_shot.release_policy[m.index()];
        if self.one_shot.on_trigger_release(*m, now, policy) {
            self.hid.add_weak_mods(m.to_modifier_combination().to_hid_modifiers());
            self.send_keyboard_report();
            self.hid.clear_weak_mods();
            self.send_keyboard_report();
        }
    }

    /// Current state of a one-shot modifier
    pub fn one_shot_state(&self, m: OneShotModifier) -> OneShotState {
        self.one_shot.state(m)
    }
}
