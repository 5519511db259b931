//! Free-flight model for inspecting scenery and cameras.
//!
//! No forces: the craft flies exactly where its nose points at a speed proportional to the
//! throttle, slides along the ground instead of touching down, and never crashes.

use glam::Vec3;

use crate::flight::{FlightModel, FlightModelKind, FlightState, PLANE_DISTANCE_TO_GROUND};

/// Speed at full throttle, m/s.
pub const DEBUG_MAX_SPEED: f32 = 120.0;
/// Turn rate per unit of control input, rad/s.
pub const DEBUG_TURN_RATE: f32 = 1.2;

#[derive(Debug, Clone, Default)]
pub struct DebugFlightModel {
    state: FlightState,
}

impl DebugFlightModel {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FlightModel for DebugFlightModel {
    fn step(&mut self, delta: f32) {
        let s = &mut self.state;
        s.effective_throttle = s.throttle;

        let turn = DEBUG_TURN_RATE * delta;
        s.transform.rotate_local(Vec3::X, s.pitch * turn);
        s.transform.rotate_local(Vec3::Z, -s.roll * turn);
        s.transform.rotate_local(Vec3::Y, -s.yaw * turn);

        s.velocity = s.transform.forward() * s.throttle * DEBUG_MAX_SPEED;
        s.transform.position += s.velocity * delta;

        if s.transform.position.y <= PLANE_DISTANCE_TO_GROUND {
            s.transform.position.y = PLANE_DISTANCE_TO_GROUND;
            s.velocity.y = s.velocity.y.max(0.0);
            s.landed = true;
        } else {
            s.landed = false;
        }
    }

    fn reset(&mut self) {
        self.state.reset();
    }

    fn state(&self) -> &FlightState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut FlightState {
        &mut self.state
    }

    fn kind(&self) -> FlightModelKind {
        FlightModelKind::Debug
    }
}
