//! Named draw lists filled by entities each frame.

use std::sync::Arc;

use glam::{Mat4, Vec3};

use crate::mesh::Mesh;
use crate::palette::Material;

/// Conventional list ids used by the built-in entities.
pub const LIST_FLATS: &str = "flats";
pub const LIST_VOLUMES: &str = "volumes";
pub const LIST_PARTICLES: &str = "particles";
pub const LIST_HUD: &str = "hud";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shading {
    /// Lit colour only, both sides drawn.
    Flat,
    /// Back faces culled, dithered between lit and shade by light intensity.
    Volume,
}

#[derive(Debug, Clone)]
pub enum DrawItem {
    Mesh {
        mesh: Arc<Mesh>,
        matrix: Mat4,
        shading: Shading,
    },
    /// Camera-facing square `size` world units across. `coverage` in `[0, 1]` is the share
    /// of its pixels drawn, through the dither pattern.
    Sprite {
        position: Vec3,
        size: f32,
        material: Material,
        coverage: f32,
    },
}

#[derive(Debug, Clone, Default)]
pub struct RenderList {
    items: Vec<DrawItem>,
}

impl RenderList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: DrawItem) {
        self.items.push(item);
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn items(&self) -> &[DrawItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// The lists a single render layer asked for this frame, in the layer's order.
#[derive(Debug, Default)]
pub struct RenderLists {
    lists: Vec<(String, RenderList)>,
}

impl RenderLists {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, list: RenderList) {
        self.lists.push((id.into(), list));
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lists.iter().any(|(k, _)| k == id)
    }

    pub fn get(&self, id: &str) -> Option<&RenderList> {
        self.lists.iter().find(|(k, _)| k == id).map(|(_, l)| l)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut RenderList> {
        self.lists.iter_mut().find(|(k, _)| k == id).map(|(_, l)| l)
    }

    /// Add to the list `id`; returns false when this frame has no such list.
    pub fn push(&mut self, id: &str, item: DrawItem) -> bool {
        match self.get_mut(id) {
            Some(list) => {
                list.push(item);
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RenderList)> {
        self.lists.iter().map(|(k, l)| (k.as_str(), l))
    }

    pub fn into_inner(self) -> Vec<(String, RenderList)> {
        self.lists
    }

    /// Total items across all lists.
    pub fn item_count(&self) -> usize {
        self.lists.iter().map(|(_, l)| l.len()).sum()
    }
}
