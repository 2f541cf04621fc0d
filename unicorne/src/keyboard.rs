pub(crate) mod caps_word;
pub(crate) mod held_buffer;
pub(crate) mod one_shot;
pub(crate) mod scan_batch;

use embassy_time::Instant;
use usbd_hid::descriptor::MediaKeyboardReport;

use crate::action::{Action, KeyAction, SystemAction};
use crate::combo::{BufferedKey, Combo, ComboPress, ComboState};
use crate::config::BehaviorConfig;
use crate::diagnostics::Diagnostics;
use crate::event::{KeyPos, KeyboardEvent, KeyboardEventPos};
use crate::hid::{HidReporter, Report};
use crate::hid_state::HidState;
use crate::keyboard::one_shot::OneShotModifiers;
use crate::keyboard::scan_batch::ScanBatch;
use crate::keycode::KeyCode;
use crate::keymap::KeyMap;
use crate::modifier::HidModifiers;
use crate::system::SystemHandler;
use crate::tap_hold::{PendingTapHold, TapHoldDecision, TapHoldState};

pub use self::caps_word::CapsWordState;
pub use self::one_shot::OneShotState;

/// The key processing pipeline.
///
/// Matrix events go through the combo recognizer, the tap-hold arbiter, the layer lookup,
/// caps word and the one-shot modifiers, then change the HID state. Every change of the
/// composite report is sent to `H` right away.
///
/// Nothing here waits: timers are plain deadlines, checked against the timestamp of
/// each event and of each [`Keyboard::tick`].
///
/// Edges reported with the same timestamp are one scan of the matrix. They are collected and
/// processed as a set once time moves on, or on the next [`Keyboard::tick`].
pub struct Keyboard<'a, H: HidReporter, S: SystemHandler, const ROW: usize, const COL: usize, const NUM_LAYER: usize>
{
    pub(crate) keymap: KeyMap<'a, ROW, COL, NUM_LAYER>,
    pub(crate) behavior: BehaviorConfig,
    reporter: H,
    system: S,

    /// Debounced matrix state, used to filter stale edges
    matrix_state: [[bool; COL]; ROW],
    /// Timestamp of the last event or tick
    last_time: Option<Instant>,
    /// Edges of the current scan, not processed yet
    scan: ScanBatch,

    combo: ComboState,
    tap_hold: TapHoldState,
    pub(crate) caps_word: CapsWordState,
    pub(crate) one_shot: OneShotModifiers,
    pub(crate) hid: HidState,
    diagnostics: Diagnostics,
}

impl<'a, H: HidReporter, S: SystemHandler, const ROW: usize, const COL: usize, const NUM_LAYER: usize>
    Keyboard<'a, H, S, ROW, COL, NUM_LAYER>
{
    pub fn new(
        layers: &'a [[[KeyAction; COL]; ROW]; NUM_LAYER],
        behavior: BehaviorConfig,
        reporter: H,
        system: S,
    ) -> Self {
        Self {
            keymap: KeyMap::new(layers, behavior.tri_layer),
            behavior,
            reporter,
            system,
            matrix_state: [[false; COL]; ROW],
            last_time: None,
            scan: ScanBatch::new(),
            combo: ComboState::new(),
            tap_hold: TapHoldState::new(),
            caps_word: CapsWordState::Off,
            one_shot: OneShotModifiers::default(),
            hid: HidState::new(),
            diagnostics: Diagnostics::default(),
        }
    }

    /// Back to the power-on state. Anything still held is released in one report.
    ///
    /// Diagnostic counters are kept.
    pub fn reset(&mut self) {
        info!("Resetting keyboard state");
        self.keymap.reset();
        self.combo.reset();
        self.tap_hold.reset();
        self.caps_word = CapsWordState::Off;
        self.one_shot.reset();
        self.matrix_state = [[false; COL]; ROW];
        self.last_time = None;
        self.scan.clear();
        let had_consumer = self.hid.has_consumer();
        self.hid.clear();
        self.send_keyboard_report();
        if had_consumer {
            self.send_media_report(0);
        }
    }

    /// Report one debounced matrix edge at `now`.
    ///
    /// The edge joins the scan at `now` and is processed together with the other edges of that scan.
    pub fn on_matrix_event(&mut self, row: u8, col: u8, pressed: bool, now: Instant) {
        let now = self.clamp_time(now);
        if self.scan.time().is_some_and(|t| t < now) {
            self.process_scan();
        }
        self.poll_timers(now);

        if row as usize >= ROW || col as usize >= COL {
            warn!("Key ({}, {}) is out of the {}x{} matrix", row, col, ROW, COL);
            self.diagnostics.unknown_keycode();
            return;
        }

        let state = &mut self.matrix_state[row as usize][col as usize];
        if *state == pressed {
            if pressed {
                debug!("Key ({}, {}) is already pressed", row, col);
            } else {
                debug!("Stale release of ({}, {})", row, col);
            }
            self.diagnostics.stale_release();
            return;
        }
        *state = pressed;

        debug!("Key ({}, {}) {} at {}ms", row, col, if pressed { "pressed" } else { "released" }, now.as_millis());
        if self.scan.is_full() {
            warn!("Too many edges in one scan, processing them early");
            self.process_scan();
        }
        if self.scan.push(now, KeyPos { row, col }, pressed).is_err() {
            error!("Edge of ({}, {}) dropped", row, col);
        }
    }

    /// Close the current scan and advance time to `now`, firing every expired timer.
    pub fn tick(&mut self, now: Instant) {
        let now = self.clamp_time(now);
        self.process_scan();
        self.poll_timers(now);
    }

    pub fn keymap(&self) -> &KeyMap<'a, ROW, COL, NUM_LAYER> {
        &self.keymap
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn reporter(&self) -> &H {
        &self.reporter
    }

    pub fn reporter_mut(&mut self) -> &mut H {
        &mut self.reporter
    }

    pub fn system(&self) -> &S {
        &self.system
    }

    /// Whether the tap-hold arbiter is waiting for a decision
    pub fn tap_hold_pending(&self) -> bool {
        self.tap_hold.pending().is_some()
    }

    // Timestamps never go backwards inside the pipeline
    fn clamp_time(&mut self, now: Instant) -> Instant {
        let now = match self.last_time {
            Some(last) if now < last => {
                warn!("Timer skew: {}ms after {}ms", now.as_millis(), last.as_millis());
                self.diagnostics.timer_skew();
                last
            }
            _ => now,
        };
        self.last_time = Some(now);
        now
    }

    fn poll_timers(&mut self, now: Instant) {
        if self.combo.is_expired(now) {
            self.resolve_combo_buffer();
        }

        // A replayed event may start another tap-hold key which has expired as well
        while self.tap_hold.is_expired(now) {
            let Some(deadline) = self.tap_hold.pending().map(|p| p.deadline) else {
                break;
            };
            self.decide_tap_hold(TapHoldDecision::Hold, deadline);
        }

        if let Some(timeout) = self.behavior.one_shot.timeout {
            if self.one_shot.expire(now, timeout) {
                debug!("Queued one-shot expired");
            }
        }

        self.caps_word.expire(now);
    }

    /// Process the edges of the current scan in a fixed order: tap-hold presses, combo presses,
    /// other presses, then releases. Ties are broken by position.
    fn process_scan(&mut self) {
        let Some((time, mut edges)) = self.scan.take() else {
            return;
        };
        let keymap = &self.keymap;
        let combos = &self.behavior.combo.combos;
        edges.sort_unstable_by_key(|e| {
            (
                scan_order(keymap.peek_action(e.pos), e.pressed, combos),
                e.pos.row,
                e.pos.col,
                e.seq,
            )
        });
        for edge in edges {
            self.process_combo(KeyboardEvent::key(edge.pos.row, edge.pos.col, edge.pressed, time));
        }
    }

    /// Combo stage: hold keys that may form a combo, replace a completed combo by its output.
    fn process_combo(&mut self, event: KeyboardEvent) {
        let Some(pos) = event.key_pos() else {
            self.process_tap_hold(event);
            return;
        };

        if event.pressed {
            if self.behavior.combo.combos.is_empty() {
                self.process_tap_hold(event);
                return;
            }
            let key = BufferedKey {
                pos,
                action: self.keymap.peek_action(pos),
                event,
            };
            let active_layer = self.keymap.get_activated_layer();
            let window = self.behavior.combo.timeout;
            match self.combo.on_press(&self.behavior.combo.combos, key, active_layer, window) {
                ComboPress::Buffered => debug!("Combo candidate {:?} buffered", pos),
                ComboPress::Fire(index) => self.fire_combo(index, event.time),
                ComboPress::PassThrough => self.process_tap_hold(event),
                ComboPress::Unrelated => {
                    self.resolve_combo_buffer();
                    self.process_combo(event);
                }
            }
        } else {
            if self.combo.is_buffering() {
                self.resolve_combo_buffer();
            }
            match self.combo.on_release(pos) {
                Some(release) if release.release_output => {
                    self.process_tap_hold(KeyboardEvent::combo(release.index, false, event.time))
                }
                // Remaining members of a fired combo
                Some(_) => (),
                None => self.process_tap_hold(event),
            }
        }
    }

    /// Fire the combo the buffer completes, or flush the buffer as ordinary presses in arrival order
    fn resolve_combo_buffer(&mut self) {
        let active_layer = self.keymap.get_activated_layer();
        let completed = self.combo.completed(&self.behavior.combo.combos, active_layer);
        match (completed, self.combo.last_press_time()) {
            (Some(index), Some(time)) => self.fire_combo(index, time),
            _ => {
                for key in self.combo.drain() {
                    self.process_tap_hold(key.event);
                }
            }
        }
    }

    fn fire_combo(&mut self, index: usize, time: Instant) {
        debug!("Combo {} triggered", index);
        self.combo.fire(index);
        self.process_tap_hold(KeyboardEvent::combo(index as u8, true, time));
    }

    /// Tap-hold stage: while a tap-hold key is undecided everything is held back.
    fn process_tap_hold(&mut self, event: KeyboardEvent) {
        let Some(pending_pos) = self.tap_hold.pending().map(|p| p.pos) else {
            self.process_key_event(event);
            return;
        };

        if event.pos == pending_pos && !event.pressed {
            // Released inside the tapping term, otherwise the timer would have decided already
            self.decide_tap_hold(TapHoldDecision::Tap, event.time);
            self.process_tap_hold(event);
            return;
        }

        if self.behavior.tap_hold.permissive_hold && self.tap_hold.completes_interleaved_tap(&event) {
            match self.tap_hold.hold_back(event) {
                Ok(()) => self.decide_tap_hold(TapHoldDecision::Hold, event.time),
                Err(event) => self.replay_after_hold(event),
            }
            return;
        }

        if let Err(event) = self.tap_hold.hold_back(event) {
            self.replay_after_hold(event);
        }
    }

    // The held buffer is full, decide the pending key as hold to make room
    fn replay_after_hold(&mut self, event: KeyboardEvent) {
        warn!("Held buffer full, deciding pending tap-hold as hold");
        self.decide_tap_hold(TapHoldDecision::Hold, event.time);
        self.process_tap_hold(event);
    }

    fn decide_tap_hold(&mut self, decision: TapHoldDecision, time: Instant) {
        let Some((pending, action, held)) = self.tap_hold.decide(decision) else {
            return;
        };
        let PendingTapHold { pos, source, .. } = pending;
        self.process_action(
            action,
            source,
            KeyboardEvent {
                pos,
                pressed: true,
                time,
            },
        );
        for event in held {
            self.process_tap_hold(event);
        }
    }

    /// Resolve a logical event to an action and run it.
    fn process_key_event(&mut self, event: KeyboardEvent) {
        if !event.pressed {
            if let Some((action, source)) = self.tap_hold.take_decided(event.pos) {
                // Restore the layer cache of the position
                self.resolve_key_action(event);
                self.process_action(action, source, event);
                return;
            }
        }

        let key_action = self.resolve_key_action(event);
        match key_action {
            KeyAction::No => (),
            KeyAction::Transparent => {
                warn!("Transparent entry on the default layer at {:?}", event.pos);
                if event.pressed {
                    self.diagnostics.unknown_keycode();
                }
            }
            KeyAction::Single(action) => self.process_action(action, key_action, event),
            KeyAction::TapHold(tap, hold) => {
                if event.pressed {
                    self.tap_hold.start(PendingTapHold {
                        pos: event.pos,
                        tap,
                        hold,
                        source: key_action,
                        deadline: event.time + self.behavior.tap_hold.tapping_term,
                    });
                }
            }
        }
    }

    fn resolve_key_action(&mut self, event: KeyboardEvent) -> KeyAction {
        match event.pos {
            KeyboardEventPos::Key(pos) => self.keymap.get_action_with_layer_cache(pos, event.pressed),
            KeyboardEventPos::Combo(index) => self
                .behavior
                .combo
                .combos
                .get(index as usize)
                .map_or(KeyAction::No, |c| c.output()),
        }
    }

    /// Caps word, one-shot and execution stages of one action
    pub(crate) fn process_action(&mut self, action: Action, source: KeyAction, event: KeyboardEvent) {
        if event.pressed {
            let mut weak = HidModifiers::new();
            if self.process_caps_word_press(&action, event.time) {
                weak |= HidModifiers::new().with_left_shift(true);
            }
            weak |= self.process_one_shot_press(&action, &source, event.time);

            // Weak modifiers only go out together with a key of the keyboard report
            if action.keyboard_keycode().is_some() {
                self.hid.add_weak_mods(weak);
            }
            self.execute_press(action, event);
            self.send_keyboard_report();
            self.hid.clear_weak_mods();
            self.send_keyboard_report();
        } else {
            self.process_one_shot_release(&action, event.time);
            self.execute_release(action, event);
            self.send_keyboard_report();
        }
    }

    fn execute_press(&mut self, action: Action, event: KeyboardEvent) {
        match action {
            Action::No | Action::OneShot(_) => (),
            Action::Key(key) => self.register_key(key, event),
            Action::KeyWithModifier(key, modifiers) => {
                self.hid.press_modifiers(event.pos, modifiers.to_hid_modifiers());
                self.register_key(key, event);
            }
            Action::Modifier(modifiers) => self.hid.press_modifiers(event.pos, modifiers.to_hid_modifiers()),
            Action::LayerOn(layer_num) => {
                if !self.keymap.activate_layer(layer_num) {
                    self.diagnostics.unknown_keycode();
                }
            }
            Action::DefaultLayer(layer_num) => {
                if !self.keymap.set_default_layer(layer_num) {
                    self.diagnostics.unknown_keycode();
                }
            }
            Action::CapsWordOn | Action::CapsWordToggle => self.process_caps_word_action(&action, event.time),
            Action::System(system_action) => self.process_system_action(system_action),
        }
    }

    fn execute_release(&mut self, action: Action, event: KeyboardEvent) {
        match action {
            Action::Key(key) => self.unregister_key(key, event),
            Action::KeyWithModifier(key, _) => {
                self.unregister_key(key, event);
                self.hid.release_modifiers(event.pos);
            }
            Action::Modifier(_) => self.hid.release_modifiers(event.pos),
            Action::LayerOn(layer_num) => {
                self.keymap.deactivate_layer(layer_num);
            }
            _ => (),
        }
    }

    /// Register a key, the key can be a basic keycode, a modifier or a media key.
    fn register_key(&mut self, key: KeyCode, event: KeyboardEvent) {
        if key.is_modifier() {
            self.hid
                .press_modifiers(event.pos, key.to_modifier_combination().to_hid_modifiers());
        } else if let Some(consumer) = key.as_consumer() {
            self.hid.press_consumer(event.pos);
            self.send_media_report(consumer.usage_id());
        } else if key.is_basic() {
            if self.hid.press(event.pos, key) {
                self.diagnostics.report_overflow();
            }
        } else {
            warn!("Unsupported key: {:?}", key);
            self.diagnostics.unknown_keycode();
        }
    }

    /// Unregister a key, the key can be a basic keycode, a modifier or a media key.
    fn unregister_key(&mut self, key: KeyCode, event: KeyboardEvent) {
        if key.is_modifier() {
            self.hid.release_modifiers(event.pos);
        } else if key.is_consumer() {
            if self.hid.release_consumer(event.pos) {
                self.send_media_report(0);
            }
        } else if key.is_basic() {
            self.hid.release(event.pos);
        }
    }

    fn process_system_action(&mut self, action: SystemAction) {
        match action {
            SystemAction::Bootloader => {
                info!("Entering bootloader");
                self.system.jump_to_bootloader();
            }
            SystemAction::ClearStorage => {
                info!("Clearing storage");
                self.system.clear_storage();
            }
            SystemAction::Rgb(rgb) => self.system.rgb(rgb),
        }
    }

    /// Send the keyboard report if the composite state changed since the last one
    pub(crate) fn send_keyboard_report(&mut self) {
        let report = self.hid.keyboard_report(self.one_shot.strong_modifiers());
        if report == self.hid.last_report {
            return;
        }
        self.hid.last_report = report;
        debug!("Sending keyboard report: {:?}", report);
        self.reporter.send_report(Report::KeyboardReport(report));
    }

    fn send_media_report(&mut self, usage_id: u16) {
        debug!("Sending media report: {:#X}", usage_id);
        self.reporter
            .send_report(Report::MediaKeyboardReport(MediaKeyboardReport { usage_id }));
    }
}

fn scan_order(action: KeyAction, pressed: bool, combos: &[Combo]) -> u8 {
    match action {
        _ if !pressed => 3,
        KeyAction::TapHold(..) => 0,
        _ if combos.iter().any(|c| c.actions.contains(&action)) => 1,
        _ => 2,
    }
}
