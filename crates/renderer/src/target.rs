//! Render targets: the per-layer surfaces the compose pass stacks into the output.

use tiny_skia::Pixmap;

use crate::camera::Camera;
use crate::error::RenderError;
use crate::gpu::GpuContext;
use crate::palette::Palette;
use crate::raster::{RasterBatch, RasterSurface};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderTargetKind {
    /// Depth-buffered 3D surface rendered on the GPU and read back for composing.
    Raster,
    /// Transparent 2D surface painted through a [`crate::Canvas`].
    Canvas,
}

/// Placement of a target in logical output pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetRect {
    pub x: f32,
    pub y: f32,
    pub width: u32,
    pub height: u32,
}

/// A registered surface. Kind and size are fixed at creation.
pub struct RenderTarget {
    id: String,
    kind: RenderTargetKind,
    rect: TargetRect,
    /// Canvas pixels, or the last read-back frame of a raster target.
    pixmap: Pixmap,
    surface: Option<RasterSurface>,
    ready: bool,
}

impl RenderTarget {
    /// Raster targets acquire the shared GPU context; canvases never touch the GPU.
    pub fn new(id: impl Into<String>, kind: RenderTargetKind, rect: TargetRect) -> Result<Self, RenderError> {
        let id = id.into();
        let pixmap = Pixmap::new(rect.width, rect.height).ok_or_else(|| RenderError::InvalidSize {
            id: id.clone(),
            width: rect.width,
            height: rect.height,
        })?;
        let surface = match kind {
            RenderTargetKind::Raster => Some(RasterSurface::new(
                GpuContext::shared()?,
                &id,
                rect.width,
                rect.height,
            )),
            RenderTargetKind::Canvas => None,
        };
        Ok(Self {
            id,
            kind,
            rect,
            pixmap,
            surface,
            ready: false,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> RenderTargetKind {
        self.kind
    }

    pub fn rect(&self) -> TargetRect {
        self.rect
    }

    pub fn width(&self) -> u32 {
        self.rect.width
    }

    pub fn height(&self) -> u32 {
        self.rect.height
    }

    /// Touched (and cleared) during the current frame.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub(crate) fn begin_frame(&mut self) {
        self.ready = false;
    }

    /// Clear the target on its first use in a frame; later calls in the same frame keep
    /// what earlier layers drew. Returns true when this call cleared it.
    pub fn prepare(&mut self, palette: &Palette) -> bool {
        if self.ready {
            return false;
        }
        match &mut self.surface {
            Some(surface) => surface.request_clear(palette.background),
            None => self.pixmap.fill(tiny_skia::Color::TRANSPARENT),
        }
        self.ready = true;
        true
    }

    /// Render a batch into a raster target. Canvases ignore it.
    pub(crate) fn draw(&mut self, camera: &Camera, batch: &RasterBatch) {
        if let Some(surface) = &mut self.surface {
            surface.draw(camera, batch);
        }
    }

    /// Pull a raster target's GPU pixels into its pixmap.
    pub(crate) fn read_back(&mut self) -> Result<(), RenderError> {
        match &self.surface {
            Some(surface) => surface.read_into(&self.id, &mut self.pixmap),
            None => Ok(()),
        }
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    pub fn pixmap_mut(&mut self) -> &mut Pixmap {
        &mut self.pixmap
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::test_context;
    use glam::Vec3;

    fn rect(w: u32, h: u32) -> TargetRect {
        TargetRect { x: 0.0, y: 0.0, width: w, height: h }
    }

    #[test]
    fn zero_size_is_rejected() {
        let err = RenderTarget::new("main", RenderTargetKind::Raster, rect(0, 10)).err();
        assert!(matches!(err, Some(RenderError::InvalidSize { .. })));
        let err = RenderTarget::new("hud", RenderTargetKind::Canvas, rect(10, 0)).err();
        assert!(matches!(err, Some(RenderError::InvalidSize { .. })));
    }

    #[test]
    fn canvas_clears_once_per_frame() {
        let palette = Palette::night();
        let Ok(mut target) = RenderTarget::new("hud", RenderTargetKind::Canvas, rect(4, 4)) else {
            panic!("target");
        };
        assert_eq!(target.kind(), RenderTargetKind::Canvas);
        target.pixmap_mut().data_mut()[0] = 7;
        assert!(target.prepare(&palette));
        assert!(target.pixmap().data().iter().all(|b| *b == 0));

        target.pixmap_mut().data_mut()[0] = 7;
        assert!(!target.prepare(&palette));
        assert_eq!(target.pixmap().data()[0], 7);

        target.begin_frame();
        assert!(!target.is_ready());
        assert!(target.prepare(&palette));
        assert_eq!(target.pixmap().data()[0], 0);
    }

    #[test]
    fn raster_clears_to_background_once_per_frame() {
        if test_context().is_none() {
            return;
        }
        let palette = Palette::day();
        let mut target = RenderTarget::new("main", RenderTargetKind::Raster, rect(5, 3)).expect("target");
        assert_eq!(target.kind(), RenderTargetKind::Raster);
        let mut camera = Camera::perspective(60.0, 5.0 / 3.0, 0.5, 100.0);
        camera.look_at(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO);

        assert!(target.prepare(&palette));
        target.draw(&camera, &RasterBatch::new());
        target.read_back().expect("read back");
        let bg = palette.background;
        assert!(target
            .pixmap()
            .data()
            .chunks(4)
            .all(|p| p == [bg.r, bg.g, bg.b, 255]));

        // A second layer in the same frame keeps the first one's pixels.
        assert!(!target.prepare(&Palette::night()));
        target.draw(&camera, &RasterBatch::new());
        target.read_back().expect("read back");
        assert_eq!(&target.pixmap().data()[..4], &[bg.r, bg.g, bg.b, 255]);

        target.begin_frame();
        assert!(target.prepare(&Palette::night()));
        target.draw(&camera, &RasterBatch::new());
        target.read_back().expect("read back");
        let night = Palette::night().background;
        assert_eq!(&target.pixmap().data()[..4], &[night.r, night.g, night.b, 255]);
    }
}
