//! Main renderer: named targets, per-layer dispatch and the compose pass.
//!
//! Raster layers render on the GPU; touched raster targets are read back once per frame and
//! stacked with the canvases on the CPU into the output the window presents.

use std::collections::HashMap;

use log::{debug, info};
use tiny_skia::{FilterQuality, Pixmap, PixmapPaint, Transform};

use crate::camera::Camera;
use crate::canvas::{Canvas, TextEffect};
use crate::error::RenderError;
use crate::palette::Palette;
use crate::raster::RasterBatch;
use crate::render_list::{RenderList, RenderLists};
use crate::scene::{RenderContext, Scene};
use crate::target::{RenderTarget, RenderTargetKind, TargetRect};

/// Placement of the logical frame inside the output surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub scale: f32,
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    /// Largest uniform scale of a `logical_width` x `logical_height` frame that fits the
    /// output, centred with bars on the spare axis.
    pub fn fit(logical_width: u32, logical_height: u32, output_width: u32, output_height: u32) -> Self {
        let lw = logical_width.max(1) as f32;
        let lh = logical_height.max(1) as f32;
        let ow = output_width as f32;
        let oh = output_height as f32;
        let scale = (ow / lw).min(oh / lh);
        let width = lw * scale;
        let height = lh * scale;
        Self {
            x: ((ow - width) * 0.5).floor(),
            y: ((oh - height) * 0.5).floor(),
            scale,
            width,
            height,
        }
    }
}

/// One unit of per-frame work: draw `lists` from the scene into `target`.
#[derive(Debug, Clone)]
pub struct RenderLayer {
    /// Required for raster targets.
    pub camera: Option<Camera>,
    pub target: String,
    pub lists: Vec<String>,
    /// Replaces the renderer palette for this layer only.
    pub palette: Option<Palette>,
}

impl RenderLayer {
    pub fn raster(camera: Camera, target: impl Into<String>, lists: &[&str]) -> Self {
        Self {
            camera: Some(camera),
            target: target.into(),
            lists: lists.iter().map(|s| s.to_string()).collect(),
            palette: None,
        }
    }

    pub fn canvas(target: impl Into<String>, lists: &[&str]) -> Self {
        Self {
            camera: None,
            target: target.into(),
            lists: lists.iter().map(|s| s.to_string()).collect(),
            palette: None,
        }
    }

    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = Some(palette);
        self
    }
}

pub struct Renderer {
    logical_width: u32,
    logical_height: u32,
    palette: Palette,
    text_effect: TextEffect,
    targets: Vec<RenderTarget>,
    lists: HashMap<String, RenderList>,
    /// Target indices in first-touch order for the current frame.
    touched: Vec<usize>,
    viewport: Viewport,
    output: Pixmap,
}

impl Renderer {
    /// Renderer for a `width` x `height` logical frame; the output starts at that size.
    pub fn new(width: u32, height: u32, palette: Palette) -> Result<Self, RenderError> {
        let output = Pixmap::new(width, height).ok_or_else(|| RenderError::InvalidSize {
            id: "output".to_string(),
            width,
            height,
        })?;
        info!("Renderer initialized ({}x{} logical)", width, height);
        Ok(Self {
            logical_width: width,
            logical_height: height,
            palette,
            text_effect: TextEffect::default(),
            targets: Vec::new(),
            lists: HashMap::new(),
            touched: Vec::new(),
            viewport: Viewport::fit(width, height, width, height),
            output,
        })
    }

    pub fn logical_size(&self) -> (u32, u32) {
        (self.logical_width, self.logical_height)
    }

    pub fn create_render_target(
        &mut self,
        id: &str,
        kind: RenderTargetKind,
        x: f32,
        y: f32,
        width: u32,
        height: u32,
    ) -> Result<(), RenderError> {
        if self.targets.iter().any(|t| t.id() == id) {
            return Err(RenderError::DuplicateTarget(id.to_string()));
        }
        let target = RenderTarget::new(id, kind, TargetRect { x, y, width, height })?;
        debug!("Render target '{}' created: {:?} {}x{} at ({}, {})", id, kind, width, height, x, y);
        self.targets.push(target);
        Ok(())
    }

    pub fn create_render_list(&mut self, id: &str) -> Result<(), RenderError> {
        if self.lists.contains_key(id) {
            return Err(RenderError::DuplicateList(id.to_string()));
        }
        self.lists.insert(id.to_string(), RenderList::new());
        Ok(())
    }

    pub fn target(&self, id: &str) -> Option<&RenderTarget> {
        self.targets.iter().find(|t| t.id() == id)
    }

    /// Contents of a list as left by the last frame.
    pub fn render_list(&self, id: &str) -> Option<&RenderList> {
        self.lists.get(id)
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn set_palette(&mut self, palette: Palette) {
        info!("Palette switched to {}", palette.name);
        self.palette = palette;
    }

    pub fn text_effect(&self) -> TextEffect {
        self.text_effect
    }

    pub fn set_text_effect(&mut self, effect: TextEffect) {
        self.text_effect = effect;
    }

    /// Resize the output surface; the logical frame is letterboxed into it.
    pub fn set_viewport(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        self.output = Pixmap::new(width, height).ok_or_else(|| RenderError::InvalidSize {
            id: "output".to_string(),
            width,
            height,
        })?;
        self.viewport = Viewport::fit(self.logical_width, self.logical_height, width, height);
        debug!("Viewport {}x{} -> {:?}", width, height, self.viewport);
        Ok(())
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// The composed frame.
    pub fn output(&self) -> &Pixmap {
        &self.output
    }

    /// Ids of the targets composed last frame, bottom to top.
    pub fn touched_targets(&self) -> Vec<&str> {
        self.touched.iter().map(|&i| self.targets[i].id()).collect()
    }

    /// Draw every layer in order, then compose the touched targets into the output.
    pub fn render(&mut self, scene: &Scene, layers: &[RenderLayer]) -> Result<(), RenderError> {
        for target in &mut self.targets {
            target.begin_frame();
        }
        self.touched.clear();

        for layer in layers {
            let index = self
                .targets
                .iter()
                .position(|t| t.id() == layer.target)
                .ok_or_else(|| RenderError::UnknownTarget(layer.target.clone()))?;
            if let Some(missing) = layer.lists.iter().find(|id| !self.lists.contains_key(id.as_str())) {
                return Err(RenderError::UnknownList(missing.clone()));
            }

            let palette = layer.palette.as_ref().unwrap_or(&self.palette);
            let target = &mut self.targets[index];
            if target.prepare(palette) {
                self.touched.push(index);
            }

            match target.kind() {
                RenderTargetKind::Raster => {
                    let camera = layer
                        .camera
                        .as_ref()
                        .ok_or_else(|| RenderError::MissingCamera(layer.target.clone()))?;
                    let mut frame_lists = RenderLists::new();
                    for id in &layer.lists {
                        if frame_lists.contains(id) {
                            continue;
                        }
                        let mut list = self.lists.remove(id).unwrap_or_default();
                        list.clear();
                        frame_lists.insert(id.clone(), list);
                    }

                    let ctx = RenderContext::new(Some(camera), palette, target.width(), target.height());
                    scene.render_3d(&ctx, &mut frame_lists);

                    let mut batch = RasterBatch::new();
                    for (_, list) in frame_lists.iter() {
                        for item in list.items() {
                            batch.push_item(item, camera, palette);
                        }
                    }
                    self.lists.extend(frame_lists.into_inner());
                    target.draw(camera, &batch);
                }
                RenderTargetKind::Canvas => {
                    let ctx = RenderContext::new(layer.camera.as_ref(), palette, target.width(), target.height());
                    let mut canvas = Canvas::new(target.pixmap_mut(), self.text_effect, palette.hud_effect);
                    scene.render_2d(&ctx, &layer.lists, &mut canvas);
                }
            }
        }

        for &index in &self.touched {
            self.targets[index].read_back()?;
        }
        self.compose();
        Ok(())
    }

    fn compose(&mut self) {
        self.output.fill(tiny_skia::Color::BLACK);
        let vp = self.viewport;
        let paint = PixmapPaint {
            quality: FilterQuality::Nearest,
            ..PixmapPaint::default()
        };
        for &index in &self.touched {
            let target = &self.targets[index];
            let rect = target.rect();
            let transform = Transform::from_row(
                vp.scale,
                0.0,
                0.0,
                vp.scale,
                vp.x + rect.x * vp.scale,
                vp.y + rect.y * vp.scale,
            );
            self.output.draw_pixmap(0, 0, target.pixmap().as_ref(), &paint, transform, None);
        }
    }
}
