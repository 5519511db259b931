//! Fixed-capacity particle pool.
//!
//! Slots are allocated once at construction and recycled through their `active` flag.
//! Spawning scans slots in index order, so a consumer indexing `particles()` sees a stable
//! slot-to-particle mapping from frame to frame.

use engine_core::{Aabb, Transform};
use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::emitter::{sample_range, ParticleEmitter};

/// Construction options. Every `(min, max)` pair is sampled uniformly per particle at spawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleSystemConfig {
    pub max_particles: usize,
    /// Whether a slot may spawn again after its particle died.
    pub respawn: bool,
    pub spawn_rate_per_second: f32,
    pub life: (f32, f32),
    pub size_start: (f32, f32),
    pub size_end: (f32, f32),
    pub rotation_start: (f32, f32),
    pub rotation_end: (f32, f32),
}

impl Default for ParticleSystemConfig {
    fn default() -> Self {
        Self {
            max_particles: 200,
            respawn: true,
            spawn_rate_per_second: 40.0,
            life: (1.0, 2.5),
            size_start: (0.6, 1.0),
            size_end: (2.5, 4.0),
            rotation_start: (0.0, std::f32::consts::TAU),
            rotation_end: (0.0, std::f32::consts::TAU),
        }
    }
}

/// One pooled particle. Fields other than `active` and `spawns` are meaningless while
/// `active` is false.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Particle {
    pub position: Vec3,
    pub velocity: Vec3,
    pub life: f32,
    pub lifespan: f32,
    /// How many times this slot has spawned.
    pub spawns: u32,
    pub size_start: f32,
    pub size_end: f32,
    pub rotation_start: f32,
    pub rotation_end: f32,
    pub active: bool,
}

impl Particle {
    /// Fraction of the lifespan used up, in `[0, 1]`.
    pub fn progress(&self) -> f32 {
        if self.lifespan <= 0.0 {
            return 1.0;
        }
        (self.life / self.lifespan).clamp(0.0, 1.0)
    }

    pub fn size(&self) -> f32 {
        let t = self.progress();
        self.size_start + (self.size_end - self.size_start) * t
    }

    pub fn rotation(&self) -> f32 {
        let t = self.progress();
        self.rotation_start + (self.rotation_end - self.rotation_start) * t
    }
}

/// Per-step influence on every active particle, applied in registration order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParticleForce {
    /// Constant acceleration (gravity, buoyancy, wind).
    Acceleration(Vec3),
    /// Linear velocity damping per second.
    Drag(f32),
}

impl ParticleForce {
    fn apply(&self, particle: &mut Particle, delta: f32) {
        match *self {
            ParticleForce::Acceleration(a) => particle.velocity += a * delta,
            ParticleForce::Drag(k) => particle.velocity *= (1.0 - k * delta).max(0.0),
        }
    }
}

pub struct ParticleSystem {
    /// Emitter origin and orientation.
    pub transform: Transform,
    config: ParticleSystemConfig,
    emitter: Box<dyn ParticleEmitter>,
    forces: Vec<ParticleForce>,
    particles: Vec<Particle>,
    alive: usize,
    emitting: bool,
    bounds: Aabb,
    rng: ChaCha8Rng,
    exhaustion_logged: bool,
}

impl ParticleSystem {
    pub fn new(config: ParticleSystemConfig, emitter: Box<dyn ParticleEmitter>) -> Self {
        Self::with_rng(config, emitter, ChaCha8Rng::from_entropy())
    }

    /// Deterministic system: the same seed and the same update sequence give the same
    /// particles.
    pub fn with_seed(config: ParticleSystemConfig, emitter: Box<dyn ParticleEmitter>, seed: u64) -> Self {
        Self::with_rng(config, emitter, ChaCha8Rng::seed_from_u64(seed))
    }

    fn with_rng(config: ParticleSystemConfig, emitter: Box<dyn ParticleEmitter>, rng: ChaCha8Rng) -> Self {
        let particles = vec![Particle::default(); config.max_particles];
        Self {
            transform: Transform::default(),
            config,
            emitter,
            forces: Vec::new(),
            particles,
            alive: 0,
            emitting: true,
            bounds: Aabb::EMPTY,
            rng,
            exhaustion_logged: false,
        }
    }

    pub fn add_force(&mut self, force: ParticleForce) {
        self.forces.push(force);
    }

    pub fn config(&self) -> &ParticleSystemConfig {
        &self.config
    }

    pub fn set_emitting(&mut self, emitting: bool) {
        self.emitting = emitting;
    }

    pub fn is_emitting(&self) -> bool {
        self.emitting
    }

    pub fn alive(&self) -> usize {
        self.alive
    }

    pub fn capacity(&self) -> usize {
        self.particles.len()
    }

    /// The whole pool, including inactive slots.
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn active_particles(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter().filter(|p| p.active)
    }

    /// Box around every active particle after the last `update`; empty when none are active.
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    pub fn update(&mut self, delta: f32) {
        if self.emitting && self.alive < self.particles.len() {
            self.spawn(delta);
        }

        self.bounds = Aabb::EMPTY;
        for particle in self.particles.iter_mut().filter(|p| p.active) {
            particle.life += delta;
            if particle.life > particle.lifespan {
                particle.active = false;
                self.alive -= 1;
                continue;
            }
            for force in &self.forces {
                force.apply(particle, delta);
            }
            particle.position += particle.velocity * delta;
            self.bounds.include(particle.position);
        }

        if !self.config.respawn && !self.exhaustion_logged && self.alive == 0 && self.is_exhausted() {
            log::debug!("Particle system exhausted ({} slots spawned once)", self.particles.len());
            self.exhaustion_logged = true;
        }
    }

    fn spawn(&mut self, delta: f32) {
        let expected = self.config.spawn_rate_per_second * delta;
        let mut quota = expected.floor() as usize;
        if self.rng.gen::<f32>() < expected.fract() {
            quota += 1;
        }

        for particle in self.particles.iter_mut() {
            if quota == 0 {
                break;
            }
            if particle.active || (!self.config.respawn && particle.spawns > 0) {
                continue;
            }
            self.emitter.emit(&self.transform, &mut self.rng, particle);
            particle.life = 0.0;
            particle.lifespan = sample_range(&mut self.rng, self.config.life);
            particle.size_start = sample_range(&mut self.rng, self.config.size_start);
            particle.size_end = sample_range(&mut self.rng, self.config.size_end);
            particle.rotation_start = sample_range(&mut self.rng, self.config.rotation_start);
            particle.rotation_end = sample_range(&mut self.rng, self.config.rotation_end);
            particle.spawns += 1;
            particle.active = true;
            self.alive += 1;
            quota -= 1;
        }
    }

    /// True when no slot can ever spawn again (only possible without respawn).
    pub fn is_exhausted(&self) -> bool {
        !self.config.respawn && self.particles.iter().all(|p| p.spawns > 0)
    }

    /// Deactivate every particle. Spawn counters are kept, so without respawn a slot that
    /// already spawned stays spent.
    pub fn reset(&mut self) {
        for particle in &mut self.particles {
            particle.active = false;
        }
        self.alive = 0;
        self.bounds = Aabb::EMPTY;
    }
}
