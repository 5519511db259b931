//! The player aircraft: flight model, LOD model and exhaust smoke trail.

use std::any::Any;
use std::f32::consts::PI;
use std::sync::Arc;

use engine_core::Transform;
use glam::{Quat, Vec3};
use physics::{
    ConeEmitter, Flight, FlightModelKind, ParticleForce, ParticleSystem, ParticleSystemConfig,
};
use renderer::{DrawItem, Entity, LodHelper, Material, Model, RenderContext, RenderLists, LIST_PARTICLES};

/// Exhaust position in aircraft space.
const EXHAUST_OFFSET: Vec3 = Vec3::new(0.0, -0.2, 3.6);
/// Upward drift of smoke puffs.
const SMOKE_BUOYANCY: f32 = 1.2;
const SMOKE_DRAG: f32 = 0.6;

/// Snapshot of the flight instruments, published to the HUD each frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Telemetry {
    /// m/s
    pub airspeed: f32,
    /// m above the resting height.
    pub altitude: f32,
    pub vertical_speed: f32,
    pub heading: f32,
    pub pitch: f32,
    pub roll: f32,
    pub throttle: f32,
    pub effective_throttle: f32,
    pub gear_down: bool,
    pub flaps_extended: bool,
    pub landed: bool,
    pub crashed: bool,
    pub stalling: bool,
}

pub struct Aircraft {
    flight: Flight,
    lod: LodHelper,
    smoke: ParticleSystem,
    /// Hidden from raster layers, e.g. when the camera sits in the cockpit.
    pub visible: bool,
}

impl Aircraft {
    pub fn new(
        kind: FlightModelKind,
        model: Arc<Model>,
        lod_bias: i32,
        smoke: ParticleSystemConfig,
        seed: u64,
    ) -> Self {
        let mut smoke = ParticleSystem::with_seed(smoke, Box::new(ConeEmitter::new(0.4, 1.0, 1.5, 3.0)), seed);
        smoke.add_force(ParticleForce::Acceleration(Vec3::Y * SMOKE_BUOYANCY));
        smoke.add_force(ParticleForce::Drag(SMOKE_DRAG));
        let mut aircraft = Self {
            flight: Flight::new(kind),
            lod: LodHelper::new(model, lod_bias),
            smoke,
            visible: true,
        };
        aircraft.sync_exhaust();
        aircraft
    }

    pub fn flight(&self) -> &Flight {
        &self.flight
    }

    pub fn flight_mut(&mut self) -> &mut Flight {
        &mut self.flight
    }

    pub fn transform(&self) -> &Transform {
        self.flight.state().transform()
    }

    pub fn smoke(&self) -> &ParticleSystem {
        &self.smoke
    }

    /// Back to the runway threshold with the smoke trail cleared.
    pub fn reset(&mut self) {
        self.flight.reset();
        self.smoke.reset();
        self.sync_exhaust();
    }

    pub fn telemetry(&self) -> Telemetry {
        let flight = &self.flight;
        let state = flight.state();
        Telemetry {
            airspeed: flight.airspeed(),
            altitude: flight.altitude(),
            vertical_speed: flight.vertical_speed(),
            heading: flight.heading_degrees(),
            pitch: flight.pitch_degrees(),
            roll: flight.roll_degrees(),
            throttle: state.throttle(),
            effective_throttle: flight.effective_throttle(),
            gear_down: state.is_landing_gear_deployed(),
            flaps_extended: state.is_flaps_extended(),
            landed: flight.is_landed(),
            crashed: flight.is_crashed(),
            stalling: flight.stall_status() >= 0.0,
        }
    }

    /// Emitter sits at the tail pointing backwards.
    fn sync_exhaust(&mut self) {
        let transform = self.transform();
        let position = transform.transform_point(EXHAUST_OFFSET);
        let rotation = transform.rotation * Quat::from_rotation_y(PI);
        self.smoke.transform = Transform::from_position_rotation(position, rotation);
    }
}

impl Entity for Aircraft {
    fn update(&mut self, delta: f32) {
        self.flight.update_seconds(delta);
        self.sync_exhaust();
        let smoking = self.flight.state().throttle() > 0.0 || self.flight.is_crashed();
        self.smoke.set_emitting(smoking);
        self.smoke.update(delta);
    }

    fn render_3d(&self, ctx: &RenderContext, lists: &mut RenderLists) {
        if self.visible {
            self.lod.add_to_render_lists(ctx, self.transform(), lists);
        }
        if !lists.contains(LIST_PARTICLES) {
            return;
        }
        for particle in self.smoke.active_particles() {
            lists.push(
                LIST_PARTICLES,
                DrawItem::Sprite {
                    position: particle.position,
                    size: particle.size(),
                    material: Material::Smoke,
                    coverage: 1.0 - particle.progress(),
                },
            );
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
