use crate::action::KeyAction;
use crate::event::KeyPos;

/// Keymap represents the stack of layers.
///
/// The conception of Keymap is borrowed from qmk: <https://docs.qmk.fm/#/keymap>.
///
/// A key position is resolved from the highest active layer down to the default layer,
/// the first entry that is not `Transparent` wins.
pub struct KeyMap<'a, const ROW: usize, const COL: usize, const NUM_LAYER: usize> {
    /// Layers
    layers: &'a [[[KeyAction; COL]; ROW]; NUM_LAYER],
    /// Layers activated explicitly, by a layer key
    layer_state: [bool; NUM_LAYER],
    /// Layers activated by the tri-layer rule
    auto_layer_state: [bool; NUM_LAYER],
    /// Default layer number, max: 32
    default_layer: u8,
    /// Layer each pressed position resolved on, so its release uses the same layer
    layer_cache: [[u8; COL]; ROW],
    tri_layer: Option<[u8; 3]>,
}

impl<'a, const ROW: usize, const COL: usize, const NUM_LAYER: usize> KeyMap<'a, ROW, COL, NUM_LAYER> {
    pub fn new(layers: &'a [[[KeyAction; COL]; ROW]; NUM_LAYER], tri_layer: Option<[u8; 3]>) -> Self {
        let tri_layer = match tri_layer {
            Some(t) if t.iter().any(|&l| l as usize >= NUM_LAYER) => {
                warn!("Tri-layer {:?} is out of range, keyboard supports only {} layers", t, NUM_LAYER);
                None
            }
            t => t,
        };
        KeyMap {
            layers,
            layer_state: [false; NUM_LAYER],
            auto_layer_state: [false; NUM_LAYER],
            default_layer: 0,
            layer_cache: [[0; COL]; ROW],
            tri_layer,
        }
    }

    /// Deactivate every layer, restore layer 0 as default and forget cached layers
    pub fn reset(&mut self) {
        self.layer_state = [false; NUM_LAYER];
        self.auto_layer_state = [false; NUM_LAYER];
        self.default_layer = 0;
        self.layer_cache = [[0; COL]; ROW];
    }

    pub fn default_layer(&self) -> u8 {
        self.default_layer
    }

    /// Replace the base layer. Returns `false` if the layer doesn't exist.
    pub fn set_default_layer(&mut self, layer_num: u8) -> bool {
        if !self.check_layer(layer_num) {
            return false;
        }
        info!("Default layer set to {}", layer_num);
        self.default_layer = layer_num;
        true
    }

    /// Activate given layer. Returns `false` if the layer doesn't exist.
    pub fn activate_layer(&mut self, layer_num: u8) -> bool {
        if !self.check_layer(layer_num) {
            return false;
        }
        self.layer_state[layer_num as usize] = true;
        self.update_tri_layer();
        true
    }

    /// Deactivate given layer. Returns `false` if the layer doesn't exist.
    pub fn deactivate_layer(&mut self, layer_num: u8) -> bool {
        if !self.check_layer(layer_num) {
            return false;
        }
        self.layer_state[layer_num as usize] = false;
        self.update_tri_layer();
        true
    }

    pub fn is_layer_active(&self, layer_num: u8) -> bool {
        let l = layer_num as usize;
        l < NUM_LAYER && (self.layer_state[l] || self.auto_layer_state[l])
    }

    /// Bitmask of active layers, the default layer is not included unless it is also activated
    pub fn active_layers(&self) -> u32 {
        (0..NUM_LAYER.min(32))
            .filter(|&l| self.layer_state[l] || self.auto_layer_state[l])
            .fold(0, |mask, l| mask | (1 << l))
    }

    /// The highest layer that is either active or the default layer
    pub fn get_activated_layer(&self) -> u8 {
        (0..NUM_LAYER)
            .rev()
            .find(|&l| self.is_layer_active(l as u8) || l as u8 == self.default_layer)
            .map_or(self.default_layer, |l| l as u8)
    }

    pub fn get_action_at(&self, pos: KeyPos, layer_num: u8) -> KeyAction {
        self.layers[layer_num as usize][pos.row as usize][pos.col as usize]
    }

    /// Resolve a position on the current layer state, without touching the layer cache
    pub fn peek_action(&self, pos: KeyPos) -> KeyAction {
        self.get_action_at(pos, self.resolve_layer(pos))
    }

    /// Fetch the action in keymap, with layer cache.
    ///
    /// A press saves the layer it resolved on. The release reads and restores that slot,
    /// so layer changes in between don't change what the key releases.
    pub fn get_action_with_layer_cache(&mut self, pos: KeyPos, pressed: bool) -> KeyAction {
        let row = pos.row as usize;
        let col = pos.col as usize;
        if !pressed {
            let layer = self.layer_cache[row][col];
            self.layer_cache[row][col] = self.default_layer;
            return self.get_action_at(pos, layer);
        }

        let layer = self.resolve_layer(pos);
        self.layer_cache[row][col] = layer;
        self.get_action_at(pos, layer)
    }

    // Walk from the highest layer down, the lowest checked layer is the default layer
    fn resolve_layer(&self, pos: KeyPos) -> u8 {
        for layer_idx in (0..NUM_LAYER).rev() {
            let layer_num = layer_idx as u8;
            if layer_num == self.default_layer {
                break;
            }
            if self.is_layer_active(layer_num) && self.get_action_at(pos, layer_num) != KeyAction::Transparent {
                return layer_num;
            }
        }
        self.default_layer
    }

    /// Update Tri Layer state.
    ///
    /// Only the derived flag of the third layer changes here, an explicit activation of it is left alone.
    fn update_tri_layer(&mut self) {
        if let Some([a, b, c]) = self.tri_layer {
            let on = self.is_layer_active(a) && self.is_layer_active(b);
            if on != self.auto_layer_state[c as usize] {
                debug!("Tri-layer {} {}", c, if on { "on" } else { "off" });
            }
            self.auto_layer_state[c as usize] = on;
        }
    }

    fn check_layer(&self, layer_num: u8) -> bool {
        if layer_num as usize >= NUM_LAYER {
            warn!(
                "Not a valid layer {}, keyboard supports only {} layers",
                layer_num, NUM_LAYER
            );
            return false;
        }
        true
    }
}
