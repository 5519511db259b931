//! Models: a stack of detail levels, each holding flats and volumes.

use std::sync::Arc;

use engine_core::Aabb;
use glam::Vec3;

use crate::mesh::Mesh;
use crate::palette::TimeOfDay;

/// One renderable piece of a model. A time-restricted object (runway lights, lit windows)
/// is only drawn while the active palette has the same time of day.
#[derive(Debug, Clone)]
pub struct ModelObject {
    pub mesh: Arc<Mesh>,
    pub time: Option<TimeOfDay>,
}

impl ModelObject {
    pub fn new(mesh: Mesh) -> Self {
        Self {
            mesh: Arc::new(mesh),
            time: None,
        }
    }

    pub fn at(mesh: Mesh, time: TimeOfDay) -> Self {
        Self {
            mesh: Arc::new(mesh),
            time: Some(time),
        }
    }

    pub fn visible_at(&self, time: TimeOfDay) -> bool {
        self.time.map_or(true, |t| t == time)
    }
}

/// One detail level. Flats are planar, unshaded and never culled by facing; volumes are
/// closed shaded meshes.
#[derive(Debug, Clone, Default)]
pub struct LodLevel {
    pub flats: Vec<ModelObject>,
    pub volumes: Vec<ModelObject>,
}

impl LodLevel {
    pub fn new(flats: Vec<ModelObject>, volumes: Vec<ModelObject>) -> Self {
        Self { flats, volumes }
    }

    pub fn volumes(volumes: Vec<ModelObject>) -> Self {
        Self {
            flats: Vec::new(),
            volumes,
        }
    }

    fn objects(&self) -> impl Iterator<Item = &ModelObject> {
        self.flats.iter().chain(self.volumes.iter())
    }
}

/// Levels ordered from most (index 0) to least detailed.
#[derive(Debug, Clone, Default)]
pub struct Model {
    pub lod: Vec<LodLevel>,
    /// Largest extent of the most detailed level, in model units.
    pub max_size: f32,
    /// Centre of the most detailed level's bounds, in model space.
    pub center: Vec3,
}

impl Model {
    /// A model with no levels, the placeholder for content that is not available yet.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a model, measuring size and centre from the first level.
    pub fn new(lod: Vec<LodLevel>) -> Self {
        let mut bounds = Aabb::EMPTY;
        if let Some(first) = lod.first() {
            for object in first.objects() {
                let b = object.mesh.bounds();
                if !b.is_empty() {
                    bounds.include(b.min);
                    bounds.include(b.max);
                }
            }
        }
        let (max_size, center) = if bounds.is_empty() {
            (0.0, Vec3::ZERO)
        } else {
            (bounds.size().max_element(), bounds.center())
        };
        Self { lod, max_size, center }
    }

    /// Same levels, but never reduced or culled by distance.
    pub fn without_lod_size(mut self) -> Self {
        self.max_size = 0.0;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.lod.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::Material;

    #[test]
    fn measures_first_level() {
        let model = Model::new(vec![
            LodLevel::new(
                vec![ModelObject::new(Mesh::flat_rect(-10.0, -2.0, 10.0, 2.0, 0.0, Material::Runway))],
                vec![ModelObject::new(Mesh::cuboid(Vec3::new(0.0, 1.0, 0.0), Vec3::splat(2.0), Material::Hangar))],
            ),
            LodLevel::volumes(vec![ModelObject::new(Mesh::cuboid(Vec3::ZERO, Vec3::splat(100.0), Material::Hangar))]),
        ]);
        assert_eq!(model.max_size, 20.0);
        assert_eq!(model.center, Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn empty_model_has_zero_size() {
        let model = Model::empty();
        assert!(model.is_empty());
        assert_eq!(model.max_size, 0.0);
        assert_eq!(Model::new(vec![LodLevel::default()]).max_size, 0.0);
    }

    #[test]
    fn time_tag_filters_visibility() {
        let always = ModelObject::new(Mesh::new());
        let night = ModelObject::at(Mesh::new(), TimeOfDay::Night);
        assert!(always.visible_at(TimeOfDay::Day));
        assert!(always.visible_at(TimeOfDay::Night));
        assert!(!night.visible_at(TimeOfDay::Day));
        assert!(night.visible_at(TimeOfDay::Night));
    }
}
