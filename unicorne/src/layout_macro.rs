/// Create a layer in keymap
#[macro_export]
macro_rules! layer {
    ([$([$($x: expr), +]), +]) => {
        [$([$($x), +]),+]
    };
}

/// Create a normal key. For example, `k!(A)` represents `KeyAction::Single(Action::Key(KeyCode::A))`
#[macro_export]
macro_rules! k {
    ($k: ident) => {
        $crate::action::KeyAction::Single($crate::action::Action::Key($crate::keycode::KeyCode::$k))
    };
}

/// Create a key sent together with a modifier combination
#[macro_export]
macro_rules! wm {
    ($x: ident, $m: expr) => {
        $crate::action::KeyAction::Single($crate::action::Action::KeyWithModifier(
            $crate::keycode::KeyCode::$x,
            $m,
        ))
    };
}

/// Create a shifted key, `shifted!(Kc9)` types `(`
#[macro_export]
macro_rules! shifted {
    ($x: ident) => {
        $crate::wm!($x, $crate::modifier::ModifierCombination::LSHIFT)
    };
}

/// Create a normal action: `KeyAction`
#[macro_export]
macro_rules! a {
    ($a: ident) => {
        $crate::action::KeyAction::$a
    };
}

/// Create a layer activate action. For example, `mo!(1)` activates layer 1.
#[macro_export]
macro_rules! mo {
    ($x: expr) => {
        $crate::action::KeyAction::Single($crate::action::Action::LayerOn($x))
    };
}

/// Create a layer activate action or tap key(tap/hold)
#[macro_export]
macro_rules! lt {
    ($x: expr, $k: ident) => {
        $crate::action::KeyAction::TapHold(
            $crate::action::Action::Key($crate::keycode::KeyCode::$k),
            $crate::action::Action::LayerOn($x),
        )
    };
}

/// Create a modifier-tap-hold action
#[macro_export]
macro_rules! mt {
    ($k: ident, $m: expr) => {
        $crate::action::KeyAction::TapHold(
            $crate::action::Action::Key($crate::keycode::KeyCode::$k),
            $crate::action::Action::Modifier($m),
        )
    };
}

/// create a switch default layer action, `n` is the layer number
#[macro_export]
macro_rules! df {
    ($x: expr) => {
        $crate::action::KeyAction::Single($crate::action::Action::DefaultLayer($x))
    };
}

/// Create an oneshot modifier key in keymap, `osm!(Shift)`
#[macro_export]
macro_rules! osm {
    ($m: ident) => {
        $crate::action::KeyAction::Single($crate::action::Action::OneShot(
            $crate::action::OneShotModifier::$m,
        ))
    };
}

/// Create a caps word key
#[macro_export]
macro_rules! cw {
    () => {
        $crate::action::KeyAction::Single($crate::action::Action::CapsWordToggle)
    };
}

/// Create a system action key, `sys!(Bootloader)`
#[macro_export]
macro_rules! sys {
    ($s: ident) => {
        $crate::action::KeyAction::Single($crate::action::Action::System($crate::action::SystemAction::$s))
    };
}

/// Create an rgb action key, `rgb!(Toggle)`
#[macro_export]
macro_rules! rgb {
    ($r: ident) => {
        $crate::action::KeyAction::Single($crate::action::Action::System($crate::action::SystemAction::Rgb(
            $crate::action::RgbAction::$r,
        )))
    };
}
