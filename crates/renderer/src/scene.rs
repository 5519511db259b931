//! Scene: the ordered entity collection that feeds the renderer.

use std::any::Any;

use crate::camera::Camera;
use crate::canvas::Canvas;
use crate::palette::Palette;
use crate::render_list::RenderLists;

/// What an entity may know about the layer it is drawing into.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    /// Present for raster layers.
    pub camera: Option<&'a Camera>,
    pub palette: &'a Palette,
    pub target_width: u32,
    pub target_height: u32,
}

impl<'a> RenderContext<'a> {
    pub fn new(camera: Option<&'a Camera>, palette: &'a Palette, target_width: u32, target_height: u32) -> Self {
        Self {
            camera,
            palette,
            target_width,
            target_height,
        }
    }
}

/// Anything that lives in the scene.
pub trait Entity: Any {
    fn update(&mut self, _delta: f32) {}

    /// Contribute draw items to the raster layer's lists.
    fn render_3d(&self, _ctx: &RenderContext, _lists: &mut RenderLists) {}

    /// Paint into a canvas layer for the requested list id.
    fn render_2d(&self, _ctx: &RenderContext, _list: &str, _canvas: &mut Canvas) {}

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Entities are updated and drawn in insertion order.
#[derive(Default)]
pub struct Scene {
    entities: Vec<Box<dyn Entity>>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entity; returns its index.
    pub fn add(&mut self, entity: Box<dyn Entity>) -> usize {
        self.entities.push(entity);
        self.entities.len() - 1
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn update(&mut self, delta: f32) {
        for entity in &mut self.entities {
            entity.update(delta);
        }
    }

    pub fn render_3d(&self, ctx: &RenderContext, lists: &mut RenderLists) {
        for entity in &self.entities {
            entity.render_3d(ctx, lists);
        }
    }

    pub fn render_2d(&self, ctx: &RenderContext, lists: &[String], canvas: &mut Canvas) {
        for list in lists {
            for entity in &self.entities {
                entity.render_2d(ctx, list, canvas);
            }
        }
    }

    /// First entity of type `T`.
    pub fn find<T: Entity>(&self) -> Option<&T> {
        self.entities.iter().find_map(|e| e.as_any().downcast_ref::<T>())
    }

    pub fn find_mut<T: Entity>(&mut self) -> Option<&mut T> {
        self.entities.iter_mut().find_map(|e| e.as_any_mut().downcast_mut::<T>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render_list::{DrawItem, RenderList, LIST_PARTICLES};
    use crate::palette::Material;
    use glam::Vec3;

    struct Counter {
        ticks: u32,
    }

    impl Entity for Counter {
        fn update(&mut self, _delta: f32) {
            self.ticks += 1;
        }

        fn render_3d(&self, _ctx: &RenderContext, lists: &mut RenderLists) {
            lists.push(
                LIST_PARTICLES,
                DrawItem::Sprite {
                    position: Vec3::ZERO,
                    size: self.ticks as f32,
                    material: Material::Smoke,
                    coverage: 1.0,
                },
            );
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    struct Marker;

    impl Entity for Marker {
        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    #[test]
    fn updates_and_renders_every_entity() {
        let mut scene = Scene::new();
        scene.add(Box::new(Counter { ticks: 0 }));
        scene.add(Box::new(Marker));
        scene.add(Box::new(Counter { ticks: 10 }));
        scene.update(0.1);

        let palette = Palette::day();
        let ctx = RenderContext::new(None, &palette, 320, 200);
        let mut lists = RenderLists::new();
        lists.insert(LIST_PARTICLES, RenderList::new());
        scene.render_3d(&ctx, &mut lists);
        assert_eq!(lists.item_count(), 2);
    }

    #[test]
    fn finds_entities_by_type() {
        let mut scene = Scene::new();
        scene.add(Box::new(Marker));
        scene.add(Box::new(Counter { ticks: 4 }));
        assert_eq!(scene.find::<Counter>().map(|c| c.ticks), Some(4));
        if let Some(c) = scene.find_mut::<Counter>() {
            c.ticks = 9;
        }
        assert_eq!(scene.find::<Counter>().map(|c| c.ticks), Some(9));
        assert_eq!(scene.len(), 2);
    }
}
