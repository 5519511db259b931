//! Level-of-detail selection and routing of a model instance into render lists.

use std::sync::Arc;

use engine_core::{is_zero, Transform};

use crate::camera::{Camera, Projection};
use crate::model::Model;
use crate::render_list::{DrawItem, RenderLists, Shading, LIST_FLATS, LIST_VOLUMES};
use crate::scene::RenderContext;

/// Target width the LOD thresholds are tuned for; wider targets keep detail longer.
pub const REF_WIDTH: f32 = 320.0;
pub const DEFAULT_LOD_BIAS: i32 = 3;

#[derive(Debug, Clone)]
pub struct LodHelper {
    pub model: Arc<Model>,
    /// Levels of detail to hold back before halving kicks in; smaller switches sooner.
    pub bias: i32,
}

impl LodHelper {
    pub fn new(model: Arc<Model>, bias: i32) -> Self {
        Self { model, bias }
    }

    /// Detail level for this instance; a value `>= model.lod.len()` means "too small to
    /// draw".
    pub fn get_lod_level(&self, camera: &Camera, transform: &Transform, target_width: u32) -> usize {
        let Projection::Perspective { fov_degrees } = camera.projection else {
            return 0;
        };
        if self.model.max_size <= 0.0 {
            return 0;
        }

        let center = transform.transform_point(self.model.center);
        let distance = camera.position().distance(center);
        let visible_width = camera.aspect * 2.0 * (fov_degrees.to_radians() * 0.5).tan() * distance;
        if is_zero(visible_width) {
            return 0;
        }

        let relative = self.model.max_size * transform.max_abs_scale() / visible_width;
        let scaled = relative * target_width as f32 / REF_WIDTH;
        if scaled >= 1.0 {
            return 0;
        }
        // Saturates to a culled level when the instance has zero scale.
        let halvings = (-scaled.log2()).floor() as i64;
        (halvings - self.bias as i64).max(0) as usize
    }

    /// Push this instance's objects for the selected level into the layer's flats and volumes
    /// lists.
    /// Returns the level drawn, or `None` when culled or when the layer wants neither list.
    pub fn add_to_render_lists(
        &self,
        ctx: &RenderContext,
        transform: &Transform,
        lists: &mut RenderLists,
    ) -> Option<usize> {
        let wants_flats = lists.contains(LIST_FLATS);
        let wants_volumes = lists.contains(LIST_VOLUMES);
        if !wants_flats && !wants_volumes {
            return None;
        }
        let camera = ctx.camera?;

        let level = self.get_lod_level(camera, transform, ctx.target_width);
        let lod = self.model.lod.get(level)?;
        let matrix = transform.to_matrix();
        let time = ctx.palette.time;

        if wants_flats && !lod.flats.is_empty() {
            for object in lod.flats.iter().filter(|o| o.visible_at(time)) {
                lists.push(
                    LIST_FLATS,
                    DrawItem::Mesh {
                        mesh: Arc::clone(&object.mesh),
                        matrix,
                        shading: Shading::Flat,
                    },
                );
            }
        }
        if wants_volumes && !lod.volumes.is_empty() {
            for object in lod.volumes.iter().filter(|o| o.visible_at(time)) {
                lists.push(
                    LIST_VOLUMES,
                    DrawItem::Mesh {
                        mesh: Arc::clone(&object.mesh),
                        matrix,
                        shading: Shading::Volume,
                    },
                );
            }
        }
        Some(level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::Mesh;
    use crate::model::{LodLevel, ModelObject};
    use crate::palette::{Material, Palette, TimeOfDay};
    use crate::render_list::RenderList;
    use glam::Vec3;

    fn three_level_model() -> Arc<Model> {
        let cube = |s: f32| ModelObject::new(Mesh::cuboid(Vec3::ZERO, Vec3::splat(s), Material::Hangar));
        Arc::new(Model::new(vec![
            LodLevel::new(
                vec![ModelObject::new(Mesh::flat_rect(-5.0, -5.0, 5.0, 5.0, 0.0, Material::Runway))],
                vec![cube(10.0), ModelObject::at(Mesh::cuboid(Vec3::Y, Vec3::ONE, Material::Light), TimeOfDay::Night)],
            ),
            LodLevel::volumes(vec![cube(10.0)]),
            LodLevel::volumes(vec![cube(10.0)]),
        ]))
    }

    fn camera_at(distance: f32) -> Camera {
        let mut cam = Camera::default();
        cam.look_at(Vec3::new(0.0, 0.0, distance), Vec3::ZERO);
        cam
    }

    fn lists() -> RenderLists {
        let mut lists = RenderLists::new();
        lists.insert(LIST_FLATS, RenderList::new());
        lists.insert(LIST_VOLUMES, RenderList::new());
        lists
    }

    #[test]
    fn close_is_full_detail() {
        let helper = LodHelper::new(three_level_model(), DEFAULT_LOD_BIAS);
        assert_eq!(helper.get_lod_level(&camera_at(5.0), &Transform::default(), 320), 0);
    }

    #[test]
    fn level_never_decreases_with_distance() {
        let helper = LodHelper::new(three_level_model(), DEFAULT_LOD_BIAS);
        let transform = Transform::default();
        let mut previous = 0;
        let mut distance = 1.0;
        while distance < 100_000.0 {
            let level = helper.get_lod_level(&camera_at(distance), &transform, 320);
            assert!(level >= previous, "level dropped from {previous} to {level} at {distance}");
            previous = level;
            distance *= 1.1;
        }
        assert!(previous >= helper.model.lod.len());
    }

    #[test]
    fn bias_keeps_detail_longer() {
        let model = three_level_model();
        let eager = LodHelper::new(Arc::clone(&model), 0);
        let lazy = LodHelper::new(model, 3);
        let cam = camera_at(400.0);
        let t = Transform::default();
        assert!(eager.get_lod_level(&cam, &t, 320) > lazy.get_lod_level(&cam, &t, 320));
    }

    #[test]
    fn wider_targets_keep_detail_longer() {
        let helper = LodHelper::new(three_level_model(), DEFAULT_LOD_BIAS);
        let cam = camera_at(600.0);
        let t = Transform::default();
        assert!(helper.get_lod_level(&cam, &t, 1280) < helper.get_lod_level(&cam, &t, 320));
    }

    #[test]
    fn orthographic_and_sizeless_models_use_level_zero() {
        let helper = LodHelper::new(three_level_model(), DEFAULT_LOD_BIAS);
        let mut ortho = Camera::orthographic(100.0, 1.6, 0.1, 1000.0);
        ortho.transform.position = Vec3::new(0.0, 0.0, 50_000.0);
        assert_eq!(helper.get_lod_level(&ortho, &Transform::default(), 320), 0);

        let sizeless = LodHelper::new(Arc::new(Model::clone(&three_level_model()).without_lod_size()), 3);
        assert_eq!(sizeless.get_lod_level(&camera_at(50_000.0), &Transform::default(), 320), 0);

        // Camera sitting on the model centre.
        assert_eq!(helper.get_lod_level(&camera_at(0.0), &Transform::default(), 320), 0);
    }

    #[test]
    fn culled_level_adds_nothing() {
        let helper = LodHelper::new(three_level_model(), DEFAULT_LOD_BIAS);
        let cam = camera_at(90_000.0);
        let palette = Palette::day();
        let ctx = RenderContext::new(Some(&cam), &palette, 320, 200);
        let mut lists = lists();
        assert!(helper.get_lod_level(&cam, &Transform::default(), 320) >= 3);
        assert_eq!(helper.add_to_render_lists(&ctx, &Transform::default(), &mut lists), None);
        assert_eq!(lists.item_count(), 0);
    }

    #[test]
    fn empty_model_adds_nothing() {
        let helper = LodHelper::new(Arc::new(Model::empty()), 3);
        let cam = camera_at(20.0);
        let palette = Palette::day();
        let ctx = RenderContext::new(Some(&cam), &palette, 320, 200);
        let mut lists = lists();
        assert_eq!(helper.add_to_render_lists(&ctx, &Transform::default(), &mut lists), None);
        assert_eq!(lists.item_count(), 0);
    }

    #[test]
    fn routes_by_time_of_day() {
        let helper = LodHelper::new(three_level_model(), DEFAULT_LOD_BIAS);
        let cam = camera_at(20.0);
        let t = Transform::default();

        let day = Palette::day();
        let mut day_lists = lists();
        let ctx = RenderContext::new(Some(&cam), &day, 320, 200);
        assert_eq!(helper.add_to_render_lists(&ctx, &t, &mut day_lists), Some(0));
        assert_eq!(day_lists.get(LIST_FLATS).map(|l| l.len()), Some(1));
        assert_eq!(day_lists.get(LIST_VOLUMES).map(|l| l.len()), Some(1));

        let night = Palette::night();
        let mut night_lists = lists();
        let ctx = RenderContext::new(Some(&cam), &night, 320, 200);
        helper.add_to_render_lists(&ctx, &t, &mut night_lists);
        assert_eq!(night_lists.get(LIST_VOLUMES).map(|l| l.len()), Some(2));
    }

    #[test]
    fn skips_layers_without_its_lists() {
        let helper = LodHelper::new(three_level_model(), DEFAULT_LOD_BIAS);
        let cam = camera_at(20.0);
        let palette = Palette::day();
        let ctx = RenderContext::new(Some(&cam), &palette, 320, 200);
        let mut other = RenderLists::new();
        other.insert("hud", RenderList::new());
        assert_eq!(helper.add_to_render_lists(&ctx, &Transform::default(), &mut other), None);
        assert_eq!(other.item_count(), 0);

        // Only volumes requested: flats are skipped, volumes still routed.
        let mut volumes_only = RenderLists::new();
        volumes_only.insert(LIST_VOLUMES, RenderList::new());
        assert_eq!(helper.add_to_render_lists(&ctx, &Transform::default(), &mut volumes_only), Some(0));
        assert_eq!(volumes_only.item_count(), 1);
    }
}
