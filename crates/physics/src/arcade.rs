//! Arcade flight model.
//!
//! Forces (thrust, drag, weight, ground friction) are integrated explicitly, but the
//! velocity vector is not free: every sub-step it is swung a little towards the nose. The
//! nose can point away from the direction of travel during hard manoeuvres and the craft
//! "catches up" afterwards, which is what gives the arcade handling its feel. Several terms
//! (banked-turn yaw, the lift/stall heuristic, the drag exponent) are tuned formulas rather
//! than aerodynamics; they are reproduced as-is.

use engine_core::{angle_between, ease_out, is_zero, look_rotation, rotate_direction_towards};
use glam::Vec3;

use crate::flight::{attitude_pitch, attitude_roll, FlightModel, FlightModelKind, FlightState, PLANE_DISTANCE_TO_GROUND};
use crate::touchdown::{classify_touchdown, Touchdown};

/// Effective-throttle increase per second (engine spool-up).
pub const THROTTLE_UP_RATE: f32 = 0.02;
/// Effective-throttle decrease per second (engine spool-down).
pub const THROTTLE_DOWN_RATE: f32 = 0.07;

pub const MASS: f32 = 1200.0;
pub const GRAVITY: f32 = 9.81;
/// Thrust acceleration (m/s²) at full effective throttle and sea-level density.
pub const MAX_THRUST: f32 = 30.0;
/// Altitude over which relative air density falls by a factor of e.
pub const AIR_DENSITY_SCALE_HEIGHT: f32 = 6000.0;

pub const WING_AREA: f32 = 16.0;
pub const DRAG_COEFFICIENT: f32 = 0.3;
/// Weight of the `1 - cos(2·AoA)` lift-induced drag term.
pub const INDUCED_DRAG_COEFFICIENT: f32 = 0.8;
pub const GEAR_DRAG_MULTIPLIER: f32 = 1.3;
pub const FLAPS_DRAG_MULTIPLIER: f32 = 1.6;
/// Drag exponent growth per unit of nose/velocity misalignment (`1 - cos`).
pub const DRAG_ALIGNMENT_EXPONENT: f32 = 0.5;
/// Drag exponent growth per unit of bank (lateral tilt of the up axis).
pub const DRAG_ROLL_EXPONENT: f32 = 0.02;

/// Airspeed at which the wing fully carries the craft's weight.
pub const LIFT_SPEED: f32 = 40.0;
/// Half-width of the angle-of-attack band with the shallow lift slope.
pub const STALL_AOA_BAND: f32 = std::f32::consts::PI / 8.0;
/// Lift factor below which the wing stalls.
pub const STALL_LIFT_THRESHOLD: f32 = 0.35;

pub const PITCH_RATE: f32 = 1.0;
pub const ROLL_RATE: f32 = 2.0;
pub const YAW_RATE: f32 = 0.3;
/// Nose-wheel steering rate while landed.
pub const GROUND_YAW_RATE: f32 = 0.8;
/// Roll authority with flaps extended.
pub const FLAPS_ROLL_FACTOR: f32 = 0.75;
pub const BANK_TURN_RATE: f32 = 0.9;
/// Horizontal length of the forward axis below which the craft counts as near-vertical.
pub const NEAR_VERTICAL: f32 = 0.05;
pub const STALL_PITCH_RATE: f32 = 0.6;
/// How quickly the velocity vector swings towards the nose, per second, per radian of lag.
pub const TURNING_RATE: f32 = 1.5;

/// Static friction limit as a fraction of weight.
pub const STATIC_FRICTION: f32 = 0.3;
/// Rolling friction as a fraction of weight.
pub const KINETIC_FRICTION: f32 = 0.03;
/// Per-step displacement below which a craft at idle is treated as stationary.
pub const REST_EPSILON: f32 = 1e-3;

/// The arcade integrator.
#[derive(Debug, Clone)]
pub struct ArcadeFlightModel {
    state: FlightState,
    stall: f32,
    angle_of_attack: f32,
}

impl Default for ArcadeFlightModel {
    fn default() -> Self {
        Self::new()
    }
}

impl ArcadeFlightModel {
    pub fn new() -> Self {
        Self {
            state: FlightState::default(),
            stall: -1.0,
            angle_of_attack: 0.0,
        }
    }

    /// Signed angle between nose and travel direction in the pitch plane, radians.
    /// Positive when the nose is above the flight path.
    pub fn angle_of_attack(&self) -> f32 {
        self.angle_of_attack
    }

    fn smooth_throttle(&mut self, delta: f32) {
        let s = &mut self.state;
        let diff = s.throttle - s.effective_throttle;
        if diff > 0.0 {
            s.effective_throttle += diff.min(THROTTLE_UP_RATE * delta);
        } else {
            s.effective_throttle += diff.max(-THROTTLE_DOWN_RATE * delta);
        }
        s.effective_throttle = s.effective_throttle.clamp(0.0, 1.0);
    }

    fn apply_controls(&mut self, speed: f32, delta: f32) {
        let s = &mut self.state;

        let flap_factor = if s.flaps_extended { FLAPS_ROLL_FACTOR } else { 1.0 };
        s.transform.rotate_local(Vec3::Z, -s.roll * ROLL_RATE * flap_factor * delta);

        let mut pitch = s.pitch;
        if s.landed && pitch < 0.0 {
            pitch = 0.0;
        }
        if self.stall >= 0.0 {
            let aoa = self.angle_of_attack;
            let deepens = (pitch > 0.0 && aoa >= 0.0) || (pitch < 0.0 && aoa < 0.0);
            if deepens {
                pitch = 0.0;
            }
        }
        s.transform.rotate_local(Vec3::X, pitch * PITCH_RATE * delta);

        if !is_zero(speed) {
            let rate = if s.landed { GROUND_YAW_RATE } else { YAW_RATE };
            s.transform.rotate_local(Vec3::Y, -s.yaw * rate * delta);
        }
    }

    /// Rolling the wings couples into a yaw towards the low wing.
    fn apply_banked_turn(&mut self, delta: f32) {
        let transform = &mut self.state.transform;
        let forward = transform.forward();
        let flat_forward = Vec3::new(forward.x, 0.0, forward.z);
        let flat_length = flat_forward.length();
        if flat_length <= NEAR_VERTICAL {
            return;
        }
        let flat_right = (flat_forward / flat_length).cross(Vec3::Y);
        let lateral = transform.up().dot(flat_right);
        let angle = -lateral * lateral.abs() * flat_length * BANK_TURN_RATE * delta;
        transform.rotate_world(Vec3::Y, angle);
    }

    fn compute_angle_of_attack(&self, forward: Vec3, right: Vec3) -> f32 {
        let velocity = self.state.velocity;
        let projected = velocity - right * velocity.dot(right);
        if is_zero(projected.length_squared()) {
            return 0.0;
        }
        let magnitude = angle_between(projected, forward);
        if projected.cross(forward).dot(right) >= 0.0 {
            magnitude
        } else {
            -magnitude
        }
    }

    fn compute_drag(&self, forward: Vec3, up: Vec3, speed: f32, density: f32, delta: f32) -> Vec3 {
        if is_zero(speed) {
            return Vec3::ZERO;
        }
        let s = &self.state;
        let velocity_unit = s.velocity / speed;

        let mut coefficient =
            DRAG_COEFFICIENT + INDUCED_DRAG_COEFFICIENT * (1.0 - (2.0 * self.angle_of_attack).cos());
        if s.landing_gear_deployed {
            coefficient *= GEAR_DRAG_MULTIPLIER;
        }
        if s.flaps_extended {
            coefficient *= FLAPS_DRAG_MULTIPLIER;
        }

        let alignment = forward.dot(velocity_unit).clamp(-1.0, 1.0);
        let bank = (1.0 - up.y.abs()).max(0.0);
        let exponent = 1.0 + DRAG_ALIGNMENT_EXPONENT * (1.0 - alignment) + DRAG_ROLL_EXPONENT * bank;

        let base = 0.5 * coefficient * density * speed * speed * WING_AREA;
        // Drag may stop the craft within a step but never reverse it.
        let magnitude = base.powf(exponent).min(speed * MASS / delta);
        -velocity_unit * magnitude
    }

    fn compute_stall(&self, speed: f32) -> f32 {
        if self.state.landed {
            return -1.0;
        }
        let speed_factor = (speed / LIFT_SPEED).min(1.0);
        let aoa = self.angle_of_attack.abs();
        let lift_curve = if aoa <= STALL_AOA_BAND {
            1.0 - 0.3 * aoa / STALL_AOA_BAND
        } else {
            (0.7 - 1.5 * (aoa - STALL_AOA_BAND) / STALL_AOA_BAND).max(0.0)
        };
        let lift = speed_factor * speed_factor * lift_curve;
        ((STALL_LIFT_THRESHOLD - lift) / STALL_LIFT_THRESHOLD).clamp(-1.0, 1.0)
    }

    /// Gravity, with the vertical part progressively cancelled by lift as speed builds and
    /// the along-nose part kept so climbs bleed speed and dives gain it.
    fn compute_weight(forward: Vec3, speed: f32) -> Vec3 {
        let carried = ease_out(speed / LIFT_SPEED);
        let down = Vec3::NEG_Y;
        (down * (1.0 - carried) + forward * forward.dot(down) * carried) * MASS * GRAVITY
    }

    fn realign_velocity(&mut self, forward: Vec3, delta: f32) {
        let s = &mut self.state;
        let speed = s.velocity.length();
        if s.landed {
            s.velocity = forward * speed;
            return;
        }
        if is_zero(speed) {
            return;
        }
        let velocity_unit = s.velocity / speed;
        let lag = angle_between(velocity_unit, forward);
        let turned = rotate_direction_towards(velocity_unit, forward, lag * TURNING_RATE * delta, Vec3::Y);
        if turned != Vec3::ZERO {
            s.velocity = turned * speed;
        }
    }

    fn compute_friction(&self, forces: Vec3) -> Vec3 {
        let s = &self.state;
        let horizontal_force = Vec3::new(forces.x, 0.0, forces.z);
        let speed = s.velocity.length();
        if is_zero(speed) && horizontal_force.length() < STATIC_FRICTION * MASS * GRAVITY {
            return -horizontal_force;
        }
        let horizontal_velocity = Vec3::new(s.velocity.x, 0.0, s.velocity.z);
        let direction = if !is_zero(horizontal_velocity.length_squared()) {
            -horizontal_velocity.normalize()
        } else if !is_zero(horizontal_force.length_squared()) {
            -horizontal_force.normalize()
        } else {
            Vec3::ZERO
        };
        direction * KINETIC_FRICTION * MASS * GRAVITY
    }

    fn touch_down(&mut self) {
        let s = &mut self.state;
        s.transform.position.y = PLANE_DISTANCE_TO_GROUND;
        let touchdown = Touchdown {
            speed: s.velocity.length(),
            vertical_speed: s.velocity.y,
            pitch: attitude_pitch(&s.transform),
            roll: attitude_roll(&s.transform),
            gear_deployed: s.landing_gear_deployed,
        };
        match classify_touchdown(&touchdown) {
            Ok(()) => {
                let forward = s.transform.forward();
                let flat_forward = Vec3::new(forward.x, 0.0, forward.z);
                if !is_zero(flat_forward.length_squared()) {
                    s.transform.rotation = look_rotation(flat_forward, Vec3::Y);
                }
                s.velocity.y = 0.0;
                s.landed = true;
                self.stall = -1.0;
                log::info!(
                    "Touchdown at {:.1} m/s, sink {:.1} m/s",
                    touchdown.speed,
                    -touchdown.vertical_speed
                );
            }
            Err(cause) => {
                s.crashed = true;
                log::warn!("Crashed: {}", cause);
            }
        }
    }
}

impl FlightModel for ArcadeFlightModel {
    fn step(&mut self, delta: f32) {
        if self.state.crashed {
            return;
        }
        if self.state.landed && self.state.transform.position.y > PLANE_DISTANCE_TO_GROUND {
            self.state.landed = false;
        }

        self.smooth_throttle(delta);

        let speed = self.state.velocity.length();
        let forward = self.state.transform.forward();
        let right = self.state.transform.right();
        self.angle_of_attack = self.compute_angle_of_attack(forward, right);

        self.apply_controls(speed, delta);
        self.apply_banked_turn(delta);
        if self.stall >= 0.0 && !self.state.landed {
            self.state
                .transform
                .rotate_local(Vec3::X, -STALL_PITCH_RATE * delta);
        }

        // Forces use the attitude after this step's rotations.
        let forward = self.state.transform.forward();
        let up = self.state.transform.up();
        let altitude = (self.state.transform.position.y - PLANE_DISTANCE_TO_GROUND).max(0.0);
        let density = (-altitude / AIR_DENSITY_SCALE_HEIGHT).exp();

        let thrust = forward * density * MAX_THRUST * self.state.effective_throttle * MASS;
        let drag = self.compute_drag(forward, up, speed, density, delta);
        self.stall = self.compute_stall(speed);
        let weight = Self::compute_weight(forward, speed);

        self.realign_velocity(forward, delta);

        let mut total = thrust + drag + weight;
        if self.state.landed {
            total += self.compute_friction(total);
        }

        let s = &mut self.state;
        let horizontal_before = Vec3::new(s.velocity.x, 0.0, s.velocity.z);
        s.velocity += total / MASS * delta;
        if s.landed {
            if s.velocity.y < 0.0 {
                s.velocity.y = 0.0;
            }
            let horizontal_after = Vec3::new(s.velocity.x, 0.0, s.velocity.z);
            if horizontal_before.dot(horizontal_after) < 0.0 {
                s.velocity.x = 0.0;
                s.velocity.z = 0.0;
            }
        }

        let displacement = s.velocity * delta;
        if displacement.length() >= REST_EPSILON * (1.0 - s.effective_throttle) {
            s.transform.position += displacement;
        }

        if s.transform.position.y < PLANE_DISTANCE_TO_GROUND {
            if s.landed {
                s.transform.position.y = PLANE_DISTANCE_TO_GROUND;
            } else {
                self.touch_down();
            }
        }
    }

    fn reset(&mut self) {
        *self = Self::new();
    }

    fn state(&self) -> &FlightState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut FlightState {
        &mut self.state
    }

    fn stall_status(&self) -> f32 {
        self.stall
    }

    fn kind(&self) -> FlightModelKind {
        FlightModelKind::Arcade
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flight::{Flight, SIM_DELTA};
    use glam::Quat;
    use std::time::Duration;

    fn airborne(speed: f32, altitude: f32) -> ArcadeFlightModel {
        let mut model = ArcadeFlightModel::new();
        model
            .state_mut()
            .place_in_air(Vec3::new(0.0, altitude, 0.0), Quat::IDENTITY, speed);
        model.state_mut().set_landing_gear_deployed(true);
        model
    }

    fn resting() -> ArcadeFlightModel {
        let mut model = ArcadeFlightModel::new();
        model.state_mut().place_on_ground(Vec3::ZERO, Quat::IDENTITY);
        model
    }

    #[test]
    fn at_rest_on_ground_stays_put() {
        let mut model = resting();
        let start = model.state().position();
        for _ in 0..120 {
            model.step(SIM_DELTA);
        }
        assert_eq!(model.state().position(), start);
        assert_eq!(model.state().velocity(), Vec3::ZERO);
        assert_eq!(model.stall_status(), -1.0);
        assert!(model.state().is_landed());
    }

    #[test]
    fn throttle_spools_up_slower_than_down() {
        let mut model = resting();
        model.state_mut().set_throttle(1.0);
        for _ in 0..120 {
            model.step(SIM_DELTA);
        }
        assert!((model.state().effective_throttle() - THROTTLE_UP_RATE).abs() < 1e-4);

        model.state.effective_throttle = 0.5;
        model.state_mut().set_throttle(0.0);
        for _ in 0..120 {
            model.step(SIM_DELTA);
        }
        assert!((model.state().effective_throttle() - (0.5 - THROTTLE_DOWN_RATE)).abs() < 1e-4);
    }

    #[test]
    fn crashed_model_is_frozen() {
        let mut model = airborne(60.0, 300.0);
        model.step(SIM_DELTA);
        model.state_mut().set_crashed(true);
        model.state_mut().set_pitch(1.0);
        model.state_mut().set_roll(-1.0);
        model.state_mut().set_throttle(1.0);
        let frozen = model.state().clone();
        let stall = model.stall_status();
        for _ in 0..500 {
            model.step(SIM_DELTA);
        }
        assert_eq!(model.state(), &frozen);
        assert_eq!(model.stall_status(), stall);
    }

    #[test]
    fn reset_is_idempotent() {
        let mut model = airborne(70.0, 200.0);
        model.state_mut().set_throttle(0.8);
        model.state_mut().set_roll(0.4);
        for _ in 0..240 {
            model.step(SIM_DELTA);
        }
        model.reset();
        let once = (model.state().clone(), model.stall_status(), model.angle_of_attack());
        model.reset();
        let twice = (model.state().clone(), model.stall_status(), model.angle_of_attack());
        assert_eq!(once, twice);
        assert_eq!(model.state().position(), Vec3::ZERO);
        assert_eq!(model.state().effective_throttle(), 0.0);
        assert!(!model.state().is_crashed());
    }

    #[test]
    fn first_step_after_reset_settles_on_ground() {
        let mut model = ArcadeFlightModel::new();
        model.step(SIM_DELTA);
        assert!(model.state().is_landed());
        assert!(!model.state().is_crashed());
        assert_eq!(model.state().position().y, PLANE_DISTANCE_TO_GROUND);
    }

    #[test]
    fn fixed_step_is_partition_independent() {
        let build = || {
            let mut flight = Flight::with_model(Box::new(airborne(55.0, 400.0)));
            flight.set_throttle(0.7);
            flight.set_pitch(0.3);
            flight.set_roll(-0.4);
            flight.set_yaw(0.2);
            flight
        };
        let mut a = build();
        for _ in 0..200 {
            a.update(Duration::from_millis(10));
        }
        let mut b = build();
        for _ in 0..8 {
            b.update(Duration::from_millis(250));
        }
        let mut c = build();
        c.update(Duration::from_secs(2));
        let mut d = build();
        for ms in [3, 997, 1, 999] {
            d.update(Duration::from_millis(ms));
        }
        for other in [&b, &c, &d] {
            assert_eq!(a.state(), other.state());
            assert_eq!(a.stall_status(), other.stall_status());
        }
    }

    #[test]
    fn never_penetrates_ground() {
        let scenarios: [(f32, f32, f32, bool); 4] = [
            // (speed, pitch attitude, pitch input, gear)
            (30.0, 0.0, 0.0, true),
            (80.0, -0.6, -1.0, true),
            (45.0, -0.1, 0.0, false),
            (20.0, 0.2, 1.0, true),
        ];
        for (speed, attitude, pitch_input, gear) in scenarios {
            let mut model = ArcadeFlightModel::new();
            model.state_mut().place_in_air(
                Vec3::new(0.0, PLANE_DISTANCE_TO_GROUND + 15.0, 0.0),
                Quat::from_rotation_x(attitude),
                speed,
            );
            model.state_mut().set_landing_gear_deployed(gear);
            model.state_mut().set_pitch(pitch_input);
            model.state_mut().set_roll(0.3);
            for _ in 0..(SIM_DELTA.recip() as usize * 20) {
                model.step(SIM_DELTA);
                assert!(model.state().position().y >= PLANE_DISTANCE_TO_GROUND);
            }
        }
    }

    #[test]
    fn gentle_descent_lands() {
        let mut model = airborne(30.0, PLANE_DISTANCE_TO_GROUND + 0.5);
        for _ in 0..(120 * 10) {
            model.step(SIM_DELTA);
            if model.state().is_landed() {
                break;
            }
        }
        let s = model.state();
        assert!(s.is_landed());
        assert!(!s.is_crashed());
        assert_eq!(s.velocity().y, 0.0);
        assert_eq!(s.position().y, PLANE_DISTANCE_TO_GROUND);
        assert_eq!(model.stall_status(), -1.0);
    }

    #[test]
    fn gear_up_touchdown_crashes() {
        let mut model = airborne(30.0, PLANE_DISTANCE_TO_GROUND + 0.5);
        model.state_mut().set_landing_gear_deployed(false);
        for _ in 0..(120 * 10) {
            model.step(SIM_DELTA);
        }
        assert!(model.state().is_crashed());
        assert!(!model.state().is_landed());
    }

    #[test]
    fn steep_dive_crashes() {
        let mut model = ArcadeFlightModel::new();
        model.state_mut().place_in_air(
            Vec3::new(0.0, 60.0, 0.0),
            Quat::from_rotation_x(-std::f32::consts::FRAC_PI_4),
            80.0,
        );
        for _ in 0..(120 * 10) {
            model.step(SIM_DELTA);
        }
        assert!(model.state().is_crashed());
        assert_eq!(model.state().position().y, PLANE_DISTANCE_TO_GROUND);
    }

    #[test]
    fn landed_blocks_nose_down_and_static_yaw() {
        let mut model = resting();
        model.state_mut().set_pitch(-1.0);
        model.state_mut().set_yaw(1.0);
        for _ in 0..120 {
            model.step(SIM_DELTA);
        }
        let forward = model.state().transform().forward();
        assert!((forward - Vec3::NEG_Z).length() < 1e-5);
    }

    #[test]
    fn slow_flight_stalls_fast_flight_does_not() {
        let mut slow = airborne(10.0, 500.0);
        slow.step(SIM_DELTA);
        assert!(slow.stall_status() >= 0.0);

        let mut fast = airborne(70.0, 500.0);
        fast.step(SIM_DELTA);
        assert!(fast.stall_status() < 0.0);
    }

    #[test]
    fn stall_blocks_deepening_pitch() {
        let mut model = airborne(10.0, 500.0);
        model.step(SIM_DELTA);
        assert!(model.stall_status() >= 0.0);
        let before = attitude_pitch(model.state().transform());
        model.state_mut().set_pitch(1.0);
        model.step(SIM_DELTA);
        let after = attitude_pitch(model.state().transform());
        // Pitch-up is suppressed and the auto-rotation lowers the nose.
        assert!(after < before);
    }

    #[test]
    fn velocity_lags_then_follows_nose() {
        let mut model = airborne(60.0, 800.0);
        model.state_mut().set_throttle(1.0);
        model.state.effective_throttle = 1.0;
        model.state_mut().set_pitch(1.0);
        for _ in 0..60 {
            model.step(SIM_DELTA);
        }
        let lag = angle_between(model.state().velocity(), model.state().transform().forward());
        assert!(lag > 0.05, "velocity should trail the nose, lag {lag}");

        model.state_mut().set_pitch(0.0);
        for _ in 0..(120 * 3) {
            model.step(SIM_DELTA);
        }
        let settled = angle_between(model.state().velocity(), model.state().transform().forward());
        assert!(settled < lag * 0.5, "lag {lag} should shrink, got {settled}");
    }

    #[test]
    fn bank_turns_towards_low_wing() {
        let mut model = airborne(60.0, 800.0);
        model.state_mut().set_roll(1.0);
        for _ in 0..30 {
            model.step(SIM_DELTA);
        }
        model.state_mut().set_roll(0.0);
        for _ in 0..120 {
            model.step(SIM_DELTA);
        }
        // Right bank: nose swings towards +X.
        assert!(model.state().transform().forward().x > 0.05);
    }

    #[test]
    fn full_throttle_takeoff() {
        let mut model = resting();
        model.state_mut().set_throttle(1.0);
        let mut airborne_at = None;
        for i in 0..(120 * 90) {
            let s = model.state();
            let speed = s.velocity().length();
            let altitude = s.position().y - PLANE_DISTANCE_TO_GROUND;
            let pitch = if altitude > 30.0 {
                0.0
            } else if speed > LIFT_SPEED + 2.0 {
                0.5
            } else {
                0.0
            };
            model.state_mut().set_pitch(pitch);
            model.step(SIM_DELTA);
            assert!(!model.state().is_crashed(), "crashed at step {i}");
            if altitude > 20.0 {
                airborne_at = Some(i);
                break;
            }
        }
        assert!(airborne_at.is_some(), "never climbed away");
        assert!(!model.state().is_landed());
    }
}
