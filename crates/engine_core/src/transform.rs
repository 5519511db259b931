//! Transform component and utilities for spatial positioning.
//!
//! Conventions: Y is world-up, a transform's forward axis is local -Z and its right axis
//! is local +X.

use glam::{Mat4, Quat, Vec3};

/// A 3D transform representing position, rotation, and scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Create a new transform at the given position.
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a new transform with position and rotation.
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            ..Default::default()
        }
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Create the model matrix for this transform.
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// Get the forward direction (negative Z in right-handed coordinates).
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    /// Get the right direction (positive X).
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    /// Get the up direction (positive Y).
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    /// Rotate around an axis expressed in the transform's own frame.
    pub fn rotate_local(&mut self, local_axis: Vec3, angle: f32) {
        self.rotation = (self.rotation * Quat::from_axis_angle(local_axis, angle)).normalize();
    }

    /// Rotate around an axis expressed in world space.
    pub fn rotate_world(&mut self, world_axis: Vec3, angle: f32) {
        self.rotation = (Quat::from_axis_angle(world_axis, angle) * self.rotation).normalize();
    }

    /// Largest absolute scale component; used for bounding-size estimates.
    pub fn max_abs_scale(&self) -> f32 {
        self.scale.abs().max_element()
    }

    /// Map a point from local space into world space.
    pub fn transform_point(&self, local: Vec3) -> Vec3 {
        self.position + self.rotation * (local * self.scale)
    }
}
