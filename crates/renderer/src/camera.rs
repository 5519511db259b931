//! Cameras for raster render layers.

use engine_core::Transform;
use glam::{Mat4, Vec3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    /// Vertical field of view in degrees.
    Perspective { fov_degrees: f32 },
    /// World-space height of the view volume.
    Orthographic { height: f32 },
}

/// Camera with free orientation (it rolls with the aircraft, so the view is built from the
/// full rotation rather than a look-at with a fixed up vector).
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Camera transform (position and rotation); looks down its local -Z.
    pub transform: Transform,
    pub projection: Projection,
    /// Near clipping plane.
    pub near: f32,
    /// Far clipping plane.
    pub far: f32,
    /// Aspect ratio (width / height).
    pub aspect: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            transform: Transform::default(),
            projection: Projection::Perspective { fov_degrees: 60.0 },
            near: 0.5,
            far: 12_000.0,
            aspect: 320.0 / 200.0,
        }
    }
}

impl Camera {
    pub fn perspective(fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            transform: Transform::default(),
            projection: Projection::Perspective { fov_degrees },
            near,
            far,
            aspect,
        }
    }

    pub fn orthographic(height: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            transform: Transform::default(),
            projection: Projection::Orthographic { height },
            near,
            far,
            aspect,
        }
    }

    /// Update aspect ratio from a target size in pixels.
    pub fn set_aspect(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    pub fn is_perspective(&self) -> bool {
        matches!(self.projection, Projection::Perspective { .. })
    }

    /// Vertical field of view in radians, if perspective.
    pub fn fov_radians(&self) -> Option<f32> {
        match self.projection {
            Projection::Perspective { fov_degrees } => Some(fov_degrees.to_radians()),
            Projection::Orthographic { .. } => None,
        }
    }

    /// Place the camera at `eye` looking at `target`, keeping world-up as up.
    pub fn look_at(&mut self, eye: Vec3, target: Vec3) {
        self.transform.position = eye;
        self.transform.rotation = engine_core::look_rotation(target - eye, Vec3::Y);
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.transform.rotation, self.transform.position).inverse()
    }

    /// Projection with a `[0, 1]` depth range.
    pub fn projection_matrix(&self) -> Mat4 {
        match self.projection {
            Projection::Perspective { fov_degrees } => {
                Mat4::perspective_rh(fov_degrees.to_radians(), self.aspect, self.near, self.far)
            }
            Projection::Orthographic { height } => {
                let half_h = height * 0.5;
                let half_w = half_h * self.aspect;
                Mat4::orthographic_rh(-half_w, half_w, -half_h, half_h, self.near, self.far)
            }
        }
    }

    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    pub fn position(&self) -> Vec3 {
        self.transform.position
    }

    pub fn forward(&self) -> Vec3 {
        self.transform.forward()
    }

    pub fn right(&self) -> Vec3 {
        self.transform.right()
    }

    pub fn up(&self) -> Vec3 {
        self.transform.up()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_ahead_projects_to_center() {
        let mut cam = Camera::default();
        cam.look_at(Vec3::new(0.0, 10.0, 0.0), Vec3::new(0.0, 10.0, -50.0));
        let clip = cam.view_projection_matrix() * Vec3::new(0.0, 10.0, -50.0).extend(1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-4 && ndc.y.abs() < 1e-4);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn rolled_camera_rolls_the_view() {
        let mut cam = Camera::default();
        cam.transform.rotate_local(Vec3::Z, -std::f32::consts::FRAC_PI_2);
        // Rolled right 90 degrees: a point above the camera appears on the left.
        let clip = cam.view_projection_matrix() * Vec3::new(0.0, 5.0, -50.0).extend(1.0);
        assert!(clip.x / clip.w < -0.01);
    }

    #[test]
    fn orthographic_is_not_perspective() {
        let cam = Camera::orthographic(200.0, 1.6, 0.1, 100.0);
        assert!(!cam.is_perspective());
        assert!(cam.fov_radians().is_none());
        assert!(Camera::default().is_perspective());
    }
}
