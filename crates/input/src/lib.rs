//! Keyboard state and the flight control mapping.

use std::collections::HashSet;

use log::debug;
use physics::Flight;

/// Keyboard state for the current frame.
#[derive(Debug, Default)]
pub struct InputState {
    /// Keys currently held down.
    keys_held: HashSet<KeyCode>,
    /// Keys pressed this frame.
    keys_pressed: HashSet<KeyCode>,
    /// Keys released this frame.
    keys_released: HashSet<KeyCode>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear per-frame state. Call after the frame has consumed its input.
    pub fn end_frame(&mut self) {
        self.keys_pressed.clear();
        self.keys_released.clear();
    }

    /// Process a keyboard event.
    pub fn process_keyboard(&mut self, key: KeyCode, state: ElementState) {
        match state {
            ElementState::Pressed => {
                if !self.keys_held.contains(&key) {
                    self.keys_pressed.insert(key);
                }
                self.keys_held.insert(key);
            }
            ElementState::Released => {
                self.keys_held.remove(&key);
                self.keys_released.insert(key);
            }
        }
    }

    /// Drop everything held, e.g. when the window loses focus.
    pub fn release_all(&mut self) {
        self.keys_released.extend(self.keys_held.drain());
    }

    pub fn is_key_held(&self, key: KeyCode) -> bool {
        self.keys_held.contains(&key)
    }

    /// Pressed this frame (no key repeat).
    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    pub fn is_key_released(&self, key: KeyCode) -> bool {
        self.keys_released.contains(&key)
    }

    /// -1, 0 or 1 from a pair of opposing keys.
    pub fn axis(&self, negative: KeyCode, positive: KeyCode) -> f32 {
        let mut value = 0.0;
        if self.is_key_held(negative) {
            value -= 1.0;
        }
        if self.is_key_held(positive) {
            value += 1.0;
        }
        value
    }

    fn any_held(&self, keys: &[KeyCode]) -> bool {
        keys.iter().any(|k| self.is_key_held(*k))
    }
}

/// Throttle lever travel per second while a throttle key is held.
pub const THROTTLE_LEVER_RATE: f32 = 0.5;

/// Maps held keys onto the player's flight controls.
///
/// Arrows pitch and roll, Z/X yaw, A/Q (or +/-) move the throttle lever, G toggles the
/// landing gear and F the flaps.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlightControls;

impl FlightControls {
    pub fn new() -> Self {
        Self
    }

    pub fn apply(&self, input: &InputState, flight: &mut Flight, delta: f32) {
        // Nose down on Up, as with a stick.
        flight.set_pitch(input.axis(KeyCode::ArrowUp, KeyCode::ArrowDown));
        flight.set_roll(input.axis(KeyCode::ArrowLeft, KeyCode::ArrowRight));
        flight.set_yaw(input.axis(KeyCode::KeyZ, KeyCode::KeyX));

        let mut lever = 0.0;
        if input.any_held(&[KeyCode::KeyA, KeyCode::Equal, KeyCode::NumpadAdd]) {
            lever += 1.0;
        }
        if input.any_held(&[KeyCode::KeyQ, KeyCode::Minus, KeyCode::NumpadSubtract]) {
            lever -= 1.0;
        }
        if lever != 0.0 {
            let throttle = flight.state().throttle() + lever * THROTTLE_LEVER_RATE * delta;
            flight.set_throttle(throttle);
        }

        if input.is_key_pressed(KeyCode::KeyG) {
            let deployed = !flight.state().is_landing_gear_deployed();
            flight.set_landing_gear_deployed(deployed);
            debug!("Landing gear {}", if deployed { "down" } else { "up" });
        }
        if input.is_key_pressed(KeyCode::KeyF) {
            let extended = !flight.state().is_flaps_extended();
            flight.set_flaps_extended(extended);
            debug!("Flaps {}", if extended { "extended" } else { "retracted" });
        }
    }
}

// Re-export for convenience
pub use winit::event::ElementState;
pub use winit::keyboard::KeyCode;
