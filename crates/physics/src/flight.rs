//! Flight-model capability, shared craft state and the fixed sub-step driver.

use std::str::FromStr;
use std::time::Duration;

use engine_core::{is_zero, FixedTimestep, Transform};
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::arcade::ArcadeFlightModel;
use crate::debug_model::DebugFlightModel;

/// Physics sub-steps per simulated second.
pub const SIM_RATE_HZ: u32 = 120;
/// Length of one physics sub-step in seconds.
pub const SIM_DELTA: f32 = 1.0 / SIM_RATE_HZ as f32;
/// Height of the craft's reference point above the ground plane when resting on its gear.
pub const PLANE_DISTANCE_TO_GROUND: f32 = 1.2;

/// Mutable state of one controlled craft.
///
/// Owned by exactly one flight model. Position is only written by the model's `step`
/// (plus the administrative `place`/`reset` calls), which keeps `landed` and the ground
/// contact height consistent.
#[derive(Debug, Clone, PartialEq)]
pub struct FlightState {
    pub(crate) transform: Transform,
    pub(crate) velocity: Vec3,
    pub(crate) pitch: f32,
    pub(crate) roll: f32,
    pub(crate) yaw: f32,
    pub(crate) throttle: f32,
    pub(crate) effective_throttle: f32,
    pub(crate) crashed: bool,
    pub(crate) landed: bool,
    pub(crate) landing_gear_deployed: bool,
    pub(crate) flaps_extended: bool,
}

impl Default for FlightState {
    fn default() -> Self {
        Self {
            transform: Transform::default(),
            velocity: Vec3::ZERO,
            pitch: 0.0,
            roll: 0.0,
            yaw: 0.0,
            throttle: 0.0,
            effective_throttle: 0.0,
            crashed: false,
            landed: false,
            landing_gear_deployed: true,
            flaps_extended: false,
        }
    }
}

impl FlightState {
    /// Back to defaults: origin, level, idle, gear down.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn position(&self) -> Vec3 {
        self.transform.position
    }

    pub fn quaternion(&self) -> Quat {
        self.transform.rotation
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    pub fn pitch_input(&self) -> f32 {
        self.pitch
    }

    pub fn roll_input(&self) -> f32 {
        self.roll
    }

    pub fn yaw_input(&self) -> f32 {
        self.yaw
    }

    pub fn throttle(&self) -> f32 {
        self.throttle
    }

    pub fn effective_throttle(&self) -> f32 {
        self.effective_throttle
    }

    pub fn is_crashed(&self) -> bool {
        self.crashed
    }

    pub fn is_landed(&self) -> bool {
        self.landed
    }

    pub fn is_landing_gear_deployed(&self) -> bool {
        self.landing_gear_deployed
    }

    pub fn is_flaps_extended(&self) -> bool {
        self.flaps_extended
    }

    pub fn set_pitch(&mut self, value: f32) {
        self.pitch = value.clamp(-1.0, 1.0);
    }

    pub fn set_roll(&mut self, value: f32) {
        self.roll = value.clamp(-1.0, 1.0);
    }

    pub fn set_yaw(&mut self, value: f32) {
        self.yaw = value.clamp(-1.0, 1.0);
    }

    pub fn set_throttle(&mut self, value: f32) {
        self.throttle = value.clamp(0.0, 1.0);
    }

    pub fn set_landing_gear_deployed(&mut self, deployed: bool) {
        self.landing_gear_deployed = deployed;
    }

    pub fn set_flaps_extended(&mut self, extended: bool) {
        self.flaps_extended = extended;
    }

    /// Administrative override; does not move the craft.
    pub fn set_landed(&mut self, landed: bool) {
        self.landed = landed;
    }

    /// Administrative override. Once set, only `reset` clears it.
    pub fn set_crashed(&mut self, crashed: bool) {
        self.crashed = crashed;
    }

    /// Put the craft at rest on its gear at `position` (only x/z are used).
    pub fn place_on_ground(&mut self, position: Vec3, rotation: Quat) {
        self.transform.position = Vec3::new(position.x, PLANE_DISTANCE_TO_GROUND, position.z);
        self.transform.rotation = rotation.normalize();
        self.velocity = Vec3::ZERO;
        self.landed = true;
    }

    /// Put the craft in the air at `position` flying along its nose at `speed`.
    pub fn place_in_air(&mut self, position: Vec3, rotation: Quat, speed: f32) {
        self.transform.position = Vec3::new(position.x, position.y.max(PLANE_DISTANCE_TO_GROUND), position.z);
        self.transform.rotation = rotation.normalize();
        self.velocity = self.transform.forward() * speed;
        self.landed = false;
    }
}

/// Pluggable per-substep integrator.
///
/// A single instance is not re-entrant: it owns scratch state and must only be stepped
/// from the thread driving the frame loop.
pub trait FlightModel {
    /// Advance the craft by one sub-step of `delta` seconds.
    fn step(&mut self, delta: f32);

    /// Reinitialise every field to its default without dropping the model.
    fn reset(&mut self);

    fn state(&self) -> &FlightState;

    fn state_mut(&mut self) -> &mut FlightState;

    /// Signed stall value; `>= 0` means actively stalling.
    fn stall_status(&self) -> f32 {
        -1.0
    }

    fn kind(&self) -> FlightModelKind;
}

/// Which flight-model implementation a craft is built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlightModelKind {
    #[default]
    Arcade,
    Debug,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown flight model `{0}` (expected `arcade` or `debug`)")]
pub struct FlightModelKindError(pub String);

impl FromStr for FlightModelKind {
    type Err = FlightModelKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "arcade" => Ok(Self::Arcade),
            "debug" => Ok(Self::Debug),
            other => Err(FlightModelKindError(other.to_string())),
        }
    }
}

impl FlightModelKind {
    pub fn build(self) -> Box<dyn FlightModel> {
        match self {
            Self::Arcade => Box::new(ArcadeFlightModel::new()),
            Self::Debug => Box::new(DebugFlightModel::new()),
        }
    }
}

/// Fixed-timestep driver around a flight model, plus the control and telemetry surface
/// used by input and HUD code.
pub struct Flight {
    model: Box<dyn FlightModel>,
    clock: FixedTimestep,
}

impl Flight {
    pub fn new(kind: FlightModelKind) -> Self {
        Self::with_model(kind.build())
    }

    pub fn with_model(model: Box<dyn FlightModel>) -> Self {
        Self {
            model,
            clock: FixedTimestep::new(SIM_RATE_HZ),
        }
    }

    /// Consume an outer frame delta, running one `step(SIM_DELTA)` per whole sub-step due.
    pub fn update(&mut self, delta: Duration) {
        let steps = self.clock.advance(delta);
        for _ in 0..steps {
            self.model.step(SIM_DELTA);
        }
    }

    pub fn update_seconds(&mut self, delta: f32) {
        self.update(Duration::from_secs_f32(delta.max(0.0)));
    }

    pub fn reset(&mut self) {
        self.model.reset();
        self.clock.reset();
        log::info!("Flight model reset ({:?})", self.model.kind());
    }

    pub fn model(&self) -> &dyn FlightModel {
        self.model.as_ref()
    }

    pub fn model_mut(&mut self) -> &mut dyn FlightModel {
        self.model.as_mut()
    }

    pub fn state(&self) -> &FlightState {
        self.model.state()
    }

    pub fn state_mut(&mut self) -> &mut FlightState {
        self.model.state_mut()
    }

    pub fn kind(&self) -> FlightModelKind {
        self.model.kind()
    }

    // Control surface

    pub fn set_pitch(&mut self, value: f32) {
        self.state_mut().set_pitch(value);
    }

    pub fn set_roll(&mut self, value: f32) {
        self.state_mut().set_roll(value);
    }

    pub fn set_yaw(&mut self, value: f32) {
        self.state_mut().set_yaw(value);
    }

    pub fn set_throttle(&mut self, value: f32) {
        self.state_mut().set_throttle(value);
    }

    pub fn set_landing_gear_deployed(&mut self, deployed: bool) {
        self.state_mut().set_landing_gear_deployed(deployed);
    }

    pub fn set_flaps_extended(&mut self, extended: bool) {
        self.state_mut().set_flaps_extended(extended);
    }

    pub fn set_landed(&mut self, landed: bool) {
        self.state_mut().set_landed(landed);
    }

    pub fn set_crashed(&mut self, crashed: bool) {
        self.state_mut().set_crashed(crashed);
    }

    // Telemetry

    pub fn position(&self) -> Vec3 {
        self.state().position()
    }

    pub fn quaternion(&self) -> Quat {
        self.state().quaternion()
    }

    pub fn velocity_vector(&self) -> Vec3 {
        self.state().velocity()
    }

    pub fn is_landed(&self) -> bool {
        self.state().is_landed()
    }

    pub fn is_crashed(&self) -> bool {
        self.state().is_crashed()
    }

    pub fn effective_throttle(&self) -> f32 {
        self.state().effective_throttle()
    }

    pub fn stall_status(&self) -> f32 {
        self.model.stall_status()
    }

    pub fn airspeed(&self) -> f32 {
        self.velocity_vector().length()
    }

    /// Height of the reference point above its resting height.
    pub fn altitude(&self) -> f32 {
        self.position().y - PLANE_DISTANCE_TO_GROUND
    }

    pub fn vertical_speed(&self) -> f32 {
        self.velocity_vector().y
    }

    /// Compass heading in degrees, 0 = -Z ("north"), increasing clockwise seen from above.
    pub fn heading_degrees(&self) -> f32 {
        let f = self.state().transform.forward();
        let heading = f.x.atan2(-f.z).to_degrees();
        if heading < 0.0 {
            heading + 360.0
        } else {
            heading
        }
    }

    pub fn pitch_degrees(&self) -> f32 {
        attitude_pitch(&self.state().transform).to_degrees()
    }

    pub fn roll_degrees(&self) -> f32 {
        attitude_roll(&self.state().transform).to_degrees()
    }
}

/// Nose elevation above the horizon in radians.
pub fn attitude_pitch(transform: &Transform) -> f32 {
    transform.forward().y.clamp(-1.0, 1.0).asin()
}

/// Bank angle in radians, positive when the right wing is down. NaN from degenerate
/// attitudes (nose straight up or down) is reported as level.
pub fn attitude_roll(transform: &Transform) -> f32 {
    let forward = transform.forward();
    let up = transform.up();
    let level_right = forward.cross(Vec3::Y);
    if is_zero(level_right.length_squared()) {
        return 0.0;
    }
    let level_right = level_right.normalize();
    let level_up = level_right.cross(forward);
    let magnitude = up.dot(level_up).acos();
    let roll = if up.dot(level_right) >= 0.0 { magnitude } else { -magnitude };
    if roll.is_nan() {
        0.0
    } else {
        roll
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setters_clamp_to_ranges() {
        let mut flight = Flight::new(FlightModelKind::Arcade);
        flight.set_pitch(3.0);
        flight.set_roll(-7.0);
        flight.set_yaw(0.5);
        flight.set_throttle(1.5);
        let s = flight.state();
        assert_eq!(s.pitch_input(), 1.0);
        assert_eq!(s.roll_input(), -1.0);
        assert_eq!(s.yaw_input(), 0.5);
        assert_eq!(s.throttle(), 1.0);
        flight.set_throttle(-0.2);
        assert_eq!(flight.state().throttle(), 0.0);
    }

    #[test]
    fn model_kind_parses() {
        assert_eq!("Arcade".parse::<FlightModelKind>(), Ok(FlightModelKind::Arcade));
        assert_eq!(" debug ".parse::<FlightModelKind>(), Ok(FlightModelKind::Debug));
        assert!("realistic".parse::<FlightModelKind>().is_err());
        assert_eq!(Flight::new(FlightModelKind::Debug).kind(), FlightModelKind::Debug);
    }

    #[test]
    fn attitude_roll_is_signed_and_nan_safe() {
        let mut t = Transform::default();
        assert!(attitude_roll(&t).abs() < 1e-5);
        t.rotate_local(Vec3::Z, -0.3);
        assert!((attitude_roll(&t) - 0.3).abs() < 1e-4);

        let vertical = Transform::from_position_rotation(Vec3::ZERO, Quat::from_rotation_x(std::f32::consts::FRAC_PI_2));
        assert_eq!(attitude_roll(&vertical), 0.0);
    }

    #[test]
    fn heading_is_clockwise_from_north() {
        let mut flight = Flight::new(FlightModelKind::Debug);
        assert!(flight.heading_degrees().abs() < 1e-3);
        flight
            .state_mut()
            .place_on_ground(Vec3::ZERO, Quat::from_rotation_y(-std::f32::consts::FRAC_PI_2));
        assert!((flight.heading_degrees() - 90.0).abs() < 1e-3);
    }
}
