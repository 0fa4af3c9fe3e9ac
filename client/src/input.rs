use std::collections::HashSet;
use winit::keyboard::KeyCode;

/// Flat per-frame snapshot of what the player wants to do.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Intents {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub jump: bool,
    pub mouse_look_active: bool,
}

impl Intents {
    pub fn is_moving(&self) -> bool {
        self.forward || self.backward
    }
}

/// On-screen stick and jump button for touch devices.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TouchControls {
    /// x: turn (right positive), y: drive (forward positive), both in [-1, 1].
    pub stick: (f32, f32),
    pub jump: bool,
}

const STICK_DEAD_ZONE: f32 = 0.3;

impl TouchControls {
    fn apply(&self, intents: &mut Intents) {
        let (x, y) = self.stick;
        intents.forward |= y > STICK_DEAD_ZONE;
        intents.backward |= y < -STICK_DEAD_ZONE;
        intents.right |= x > STICK_DEAD_ZONE;
        intents.left |= x < -STICK_DEAD_ZONE;
        intents.jump |= self.jump;
    }
}

pub struct InputState {
    pressed_keys: HashSet<KeyCode>,
    mouse_delta: (f32, f32),
    pub cursor_grabbed: bool,
    pub touch: Option<TouchControls>,
}

impl InputState {
    pub fn new() -> Self {
        Self {
            pressed_keys: HashSet::new(),
            mouse_delta: (0.0, 0.0),
            cursor_grabbed: false,
            touch: None,
        }
    }

    pub fn handle_key_press(&mut self, key: KeyCode) {
        self.pressed_keys.insert(key);
    }

    pub fn handle_key_release(&mut self, key: KeyCode) {
        self.pressed_keys.remove(&key);
    }

    pub fn handle_mouse_move(&mut self, dx: f32, dy: f32) {
        self.mouse_delta.0 += dx;
        self.mouse_delta.1 += dy;
    }

    pub fn consume_mouse_delta(&mut self) -> (f32, f32) {
        let delta = self.mouse_delta;
        self.mouse_delta = (0.0, 0.0);
        delta
    }

    pub fn is_pressed(&self, key: KeyCode) -> bool {
        self.pressed_keys.contains(&key)
    }

    /// Drop every held key, e.g. when the page loses focus.
    pub fn release_all(&mut self) {
        self.pressed_keys.clear();
        self.mouse_delta = (0.0, 0.0);
        if let Some(touch) = self.touch.as_mut() {
            *touch = TouchControls::default();
        }
    }

    pub fn intents(&self) -> Intents {
        let any = |keys: &[KeyCode]| keys.iter().any(|k| self.is_pressed(*k));
        let mut intents = Intents {
            forward: any(&[KeyCode::KeyW, KeyCode::ArrowUp]),
            backward: any(&[KeyCode::KeyS, KeyCode::ArrowDown]),
            left: any(&[KeyCode::KeyA, KeyCode::ArrowLeft]),
            right: any(&[KeyCode::KeyD, KeyCode::ArrowRight]),
            jump: any(&[KeyCode::Space]),
            mouse_look_active: self.cursor_grabbed,
        };
        if let Some(touch) = &self.touch {
            touch.apply(&mut intents);
        }
        intents
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

/// Map a DOM `KeyboardEvent.code` to the keys the viewer listens to.
pub fn key_from_dom_code(code: &str) -> Option<KeyCode> {
    let key = match code {
        "KeyW" => KeyCode::KeyW,
        "KeyA" => KeyCode::KeyA,
        "KeyS" => KeyCode::KeyS,
        "KeyD" => KeyCode::KeyD,
        "ArrowUp" => KeyCode::ArrowUp,
        "ArrowDown" => KeyCode::ArrowDown,
        "ArrowLeft" => KeyCode::ArrowLeft,
        "ArrowRight" => KeyCode::ArrowRight,
        "Space" => KeyCode::Space,
        "Escape" => KeyCode::Escape,
        _ => return None,
    };
    Some(key)
}
