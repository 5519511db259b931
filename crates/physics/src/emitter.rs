//! Emission geometry for particle systems.

use std::f32::consts::TAU;

use engine_core::{is_zero, Transform};
use glam::Vec3;
use rand::{Rng, RngCore};

use crate::particles::Particle;

/// Uniform sample in `[min, max)`; a degenerate or inverted range yields `min`.
pub fn sample_range(rng: &mut dyn RngCore, (min, max): (f32, f32)) -> f32 {
    if max <= min {
        return min;
    }
    min + (max - min) * rng.gen::<f32>()
}

/// Places a freshly spawned particle and gives it its initial velocity.
pub trait ParticleEmitter {
    fn emit(&self, origin: &Transform, rng: &mut dyn RngCore, particle: &mut Particle);
}

/// Emits from a single point in a uniformly random direction.
#[derive(Debug, Clone, Copy)]
pub struct PointEmitter {
    pub min_speed: f32,
    pub max_speed: f32,
}

impl PointEmitter {
    pub fn new(min_speed: f32, max_speed: f32) -> Self {
        Self { min_speed, max_speed }
    }
}

impl ParticleEmitter for PointEmitter {
    fn emit(&self, origin: &Transform, rng: &mut dyn RngCore, particle: &mut Particle) {
        // Uniform on the sphere: uniform z, uniform azimuth.
        let z = 2.0 * rng.gen::<f32>() - 1.0;
        let azimuth = TAU * rng.gen::<f32>();
        let ring = (1.0 - z * z).max(0.0).sqrt();
        let direction = Vec3::new(ring * azimuth.cos(), ring * azimuth.sin(), z);
        let speed = sample_range(rng, (self.min_speed, self.max_speed));

        particle.position = origin.position;
        particle.velocity = direction * speed;
    }
}

/// Emits along the origin's forward axis, spread through a disk of `radius` placed `depth`
/// units ahead. A wider radius or shorter depth gives a wider cone.
#[derive(Debug, Clone, Copy)]
pub struct ConeEmitter {
    pub radius: f32,
    pub depth: f32,
    pub min_speed: f32,
    pub max_speed: f32,
}

impl ConeEmitter {
    pub fn new(radius: f32, depth: f32, min_speed: f32, max_speed: f32) -> Self {
        Self {
            radius,
            depth,
            min_speed,
            max_speed,
        }
    }
}

impl ParticleEmitter for ConeEmitter {
    fn emit(&self, origin: &Transform, rng: &mut dyn RngCore, particle: &mut Particle) {
        let r = self.radius * rng.gen::<f32>().sqrt();
        let theta = TAU * rng.gen::<f32>();
        let (x, y) = (r * theta.cos(), r * theta.sin());

        let forward = origin.forward();
        let raw = forward * self.depth + origin.right() * x + origin.up() * y;
        let direction = if is_zero(raw.length_squared()) {
            forward
        } else {
            raw.normalize()
        };
        let speed = sample_range(rng, (self.min_speed, self.max_speed));

        particle.position = origin.position;
        particle.velocity = direction * speed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn sample_range_guards_degenerate_ranges() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(sample_range(&mut rng, (2.0, 2.0)), 2.0);
        assert_eq!(sample_range(&mut rng, (3.0, 1.0)), 3.0);
        for _ in 0..100 {
            let v = sample_range(&mut rng, (-1.0, 4.0));
            assert!((-1.0..4.0).contains(&v));
        }
    }

    #[test]
    fn point_emitter_speed_in_range_and_directions_spread() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let emitter = PointEmitter::new(2.0, 5.0);
        let origin = Transform::from_position(Vec3::new(1.0, 2.0, 3.0));
        let mut sum = Vec3::ZERO;
        for _ in 0..2000 {
            let mut p = Particle::default();
            emitter.emit(&origin, &mut rng, &mut p);
            let speed = p.velocity.length();
            assert!((2.0 - 1e-4..5.0 + 1e-4).contains(&speed), "speed {speed}");
            assert_eq!(p.position, origin.position);
            sum += p.velocity / speed;
        }
        // Mean of uniform directions tends to zero.
        assert!((sum / 2000.0).length() < 0.1);
    }

    #[test]
    fn cone_emitter_stays_within_cone() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let emitter = ConeEmitter::new(1.0, 2.0, 10.0, 10.0);
        let origin = Transform::default();
        let max_angle = (1.0f32 / 2.0).atan();
        for _ in 0..500 {
            let mut p = Particle::default();
            emitter.emit(&origin, &mut rng, &mut p);
            assert!((p.velocity.length() - 10.0).abs() < 1e-4);
            let angle = engine_core::angle_between(p.velocity, origin.forward());
            assert!(angle <= max_angle + 1e-4, "angle {angle}");
        }
    }

    #[test]
    fn cone_emitter_zero_geometry_falls_back_to_forward() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let emitter = ConeEmitter::new(0.0, 0.0, 1.0, 1.0);
        let mut p = Particle::default();
        emitter.emit(&Transform::default(), &mut rng, &mut p);
        assert!((p.velocity - Vec3::NEG_Z).length() < 1e-6);
    }
}
