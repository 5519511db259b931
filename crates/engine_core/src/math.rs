//! Vector and quaternion helpers shared by the flight model and the renderer.

use glam::{Mat3, Quat, Vec3};

/// Threshold below which a scalar is treated as zero.
pub const EPSILON: f32 = 1e-6;

/// True when `value` is close enough to zero that normalising by it is unsafe.
#[inline]
pub fn is_zero(value: f32) -> bool {
    value.abs() < EPSILON
}

/// Unsigned angle between two vectors in radians. Returns 0.0 when either is zero-length.
pub fn angle_between(a: Vec3, b: Vec3) -> f32 {
    let denom = (a.length_squared() * b.length_squared()).sqrt();
    if is_zero(denom) {
        return 0.0;
    }
    (a.dot(b) / denom).clamp(-1.0, 1.0).acos()
}

/// Quadratic ease-out on `[0, 1]`: fast start, slow finish.
#[inline]
pub fn ease_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t) * (1.0 - t)
}

/// Rotation whose local -Z axis points along `forward` and whose local +Y is as close to
/// `up` as possible. Falls back to world +Z as the up hint when `forward` is parallel to `up`.
pub fn look_rotation(forward: Vec3, up: Vec3) -> Quat {
    let forward = forward.normalize_or_zero();
    if forward == Vec3::ZERO {
        return Quat::IDENTITY;
    }
    let mut right = forward.cross(up);
    if is_zero(right.length_squared()) {
        right = forward.cross(Vec3::Z);
    }
    let right = right.normalize();
    let up = right.cross(forward);
    Quat::from_mat3(&Mat3::from_cols(right, up, -forward)).normalize()
}

/// Rotate `from` towards `to` by at most `max_angle` radians.
pub fn rotate_towards(from: Quat, to: Quat, max_angle: f32) -> Quat {
    let angle = from.angle_between(to);
    if is_zero(angle) || max_angle >= angle {
        return to;
    }
    from.slerp(to, max_angle / angle)
}

/// Rotate a unit direction towards another unit direction by at most `max_angle` radians,
/// working through look rotations so the result stays a unit vector.
pub fn rotate_direction_towards(from: Vec3, to: Vec3, max_angle: f32, up: Vec3) -> Vec3 {
    let q_from = look_rotation(from, up);
    let q_to = look_rotation(to, up);
    (rotate_towards(q_from, q_to, max_angle) * Vec3::NEG_Z).normalize_or_zero()
}

/// Axis-aligned bounding box accumulated point by point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Aabb {
    /// Box containing nothing; the first `include` collapses it onto that point.
    pub const EMPTY: Self = Self {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn include(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        if self.is_empty() {
            Vec3::ZERO
        } else {
            self.max - self.min
        }
    }

    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }
}
