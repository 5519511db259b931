//! GPU raster path for raster render targets.
//!
//! A layer's draw items are flattened on the CPU into one world-space vertex batch, grouped
//! into runs by how they are drawn, then rendered into an offscreen colour and depth texture.
//! Volumes are flat-shaded by a fixed sun direction and the fragment shader quantises them to
//! the swatch's two tones through a 4x4 ordered dither, which is what gives the output its
//! low-colour look. Flats are ground decals: depth-tested but never writing depth, so later
//! flats paint over earlier ones and any volume drawn after them wins.

use std::ops::Range;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use tiny_skia::Pixmap;
use wgpu::util::DeviceExt;

use crate::camera::Camera;
use crate::error::RenderError;
use crate::gpu::{GpuContext, COLOR_FORMAT, DEPTH_FORMAT};
use crate::mesh::Mesh;
use crate::palette::{Palette, Rgb};
use crate::render_list::{DrawItem, Shading};

/// Direction towards the light, world space.
pub const LIGHT_DIRECTION: Vec3 = Vec3::new(0.36, 0.8, 0.48);
/// Light intensity on faces turned fully away from the sun.
pub const AMBIENT: f32 = 0.3;

/// Light intensity in `[AMBIENT, 1]` for a face normal.
pub fn light_intensity(normal: Vec3) -> f32 {
    let n = normal.normalize_or_zero();
    AMBIENT + (1.0 - AMBIENT) * n.dot(LIGHT_DIRECTION.normalize()).max(0.0)
}

fn rgb_to_f32(c: Rgb) -> [f32; 3] {
    [c.r as f32 / 255.0, c.g as f32 / 255.0, c.b as f32 / 255.0]
}

/// World-space vertex with the flat shading inputs of its triangle.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct RasterVertex {
    pub position: [f32; 3],
    pub lit: [f32; 3],
    pub shade: [f32; 3],
    /// Share of pixels taking `lit`.
    pub intensity: f32,
    /// Share of pixels drawn at all.
    pub coverage: f32,
}

impl RasterVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3,
        2 => Float32x3,
        3 => Float32,
        4 => Float32
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<RasterVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawKind {
    Volume,
    Flat,
    Sprite,
}

impl From<Shading> for DrawKind {
    fn from(shading: Shading) -> Self {
        match shading {
            Shading::Flat => DrawKind::Flat,
            Shading::Volume => DrawKind::Volume,
        }
    }
}

/// One layer's geometry in draw order.
#[derive(Debug, Default)]
pub struct RasterBatch {
    vertices: Vec<RasterVertex>,
    runs: Vec<(DrawKind, Range<u32>)>,
}

impl RasterBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertices(&self) -> &[RasterVertex] {
        &self.vertices
    }

    /// Consecutive vertex ranges sharing a pipeline.
    pub fn runs(&self) -> &[(DrawKind, Range<u32>)] {
        &self.runs
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn push_item(&mut self, item: &DrawItem, camera: &Camera, palette: &Palette) {
        match item {
            DrawItem::Mesh { mesh, matrix, shading } => self.push_mesh(mesh, matrix, palette, *shading),
            DrawItem::Sprite {
                position,
                size,
                material,
                coverage,
            } => {
                let lit = palette.swatch(*material).lit;
                self.push_sprite(*position, *size, lit, *coverage, camera);
            }
        }
    }

    pub fn push_mesh(&mut self, mesh: &Mesh, model: &Mat4, palette: &Palette, shading: Shading) {
        let world: Vec<Vec3> = mesh.vertices.iter().map(|v| model.transform_point3(*v)).collect();
        let start = self.vertices.len();

        for triangle in &mesh.triangles {
            let [a, b, c] = triangle.indices.map(|i| i as usize);
            if a >= world.len() || b >= world.len() || c >= world.len() {
                continue;
            }
            let swatch = palette.swatch(triangle.material);
            let intensity = match shading {
                Shading::Flat => 1.0,
                Shading::Volume => light_intensity((world[b] - world[a]).cross(world[c] - world[a])),
            };
            let (lit, shade) = (rgb_to_f32(swatch.lit), rgb_to_f32(swatch.shade));
            for i in [a, b, c] {
                self.vertices.push(RasterVertex {
                    position: world[i].to_array(),
                    lit,
                    shade,
                    intensity,
                    coverage: 1.0,
                });
            }
        }
        self.close_run(shading.into(), start);
    }

    /// Camera-facing square `size` world units across, centred on `position`. `coverage` thins
    /// it through the dither pattern.
    pub fn push_sprite(&mut self, position: Vec3, size: f32, color: Rgb, coverage: f32, camera: &Camera) {
        if coverage <= 0.0 || size <= 0.0 {
            return;
        }
        let start = self.vertices.len();
        let right = camera.right() * (size * 0.5);
        let up = camera.up() * (size * 0.5);
        let corners = [
            position - right - up,
            position + right - up,
            position + right + up,
            position - right + up,
        ];
        let color = rgb_to_f32(color);
        for i in [0, 1, 2, 0, 2, 3] {
            self.vertices.push(RasterVertex {
                position: corners[i].to_array(),
                lit: color,
                shade: color,
                intensity: 1.0,
                coverage: coverage.min(1.0),
            });
        }
        self.close_run(DrawKind::Sprite, start);
    }

    fn close_run(&mut self, kind: DrawKind, start: usize) {
        let (start, end) = (start as u32, self.vertices.len() as u32);
        if start == end {
            return;
        }
        match self.runs.last_mut() {
            Some((last, range)) if *last == kind && range.end == start => range.end = end,
            _ => self.runs.push((kind, start..end)),
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct CameraUniform {
    view_proj: [[f32; 4]; 4],
}

/// Offscreen colour and depth textures of one raster target, plus the buffer its pixels are
/// read back through.
pub struct RasterSurface {
    gpu: Arc<GpuContext>,
    width: u32,
    height: u32,
    color_texture: wgpu::Texture,
    color_view: wgpu::TextureView,
    depth_view: wgpu::TextureView,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    readback: wgpu::Buffer,
    padded_row: u32,
    /// Background for the next pass, set when the target is prepared for a new frame.
    clear: Option<Rgb>,
}

impl RasterSurface {
    pub fn new(gpu: Arc<GpuContext>, label: &str, width: u32, height: u32) -> Self {
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let color_texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: COLOR_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let color_view = color_texture.create_view(&wgpu::TextureViewDescriptor::default());
        let depth_texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Raster Depth"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let depth_view = depth_texture.create_view(&wgpu::TextureViewDescriptor::default());

        let camera_buffer = gpu.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Raster Camera Buffer"),
            contents: bytemuck::cast_slice(&[CameraUniform {
                view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            }]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let camera_bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Raster Camera Bind Group"),
            layout: &gpu.camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        // Copy rows must be 256-byte aligned.
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded_row = (width * 4).div_ceil(align) * align;
        let readback = gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Raster Readback"),
            size: (padded_row * height) as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        Self {
            gpu,
            width,
            height,
            color_texture,
            color_view,
            depth_view,
            camera_buffer,
            camera_bind_group,
            readback,
            padded_row,
            clear: None,
        }
    }

    /// Clear to `background` (and reset depth) at the start of the next draw.
    pub fn request_clear(&mut self, background: Rgb) {
        self.clear = Some(background);
    }

    /// Render `batch` through `camera`, on top of what earlier layers drew this frame unless a
    /// clear is pending.
    pub fn draw(&mut self, camera: &Camera, batch: &RasterBatch) {
        let gpu = &self.gpu;
        gpu.queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::cast_slice(&[CameraUniform {
                view_proj: camera.view_projection_matrix().to_cols_array_2d(),
            }]),
        );
        let vertex_buffer = (!batch.is_empty()).then(|| {
            gpu.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Raster Vertex Buffer"),
                contents: bytemuck::cast_slice(batch.vertices()),
                usage: wgpu::BufferUsages::VERTEX,
            })
        });

        let (color_load, depth_load) = match self.clear.take() {
            Some(bg) => (
                wgpu::LoadOp::Clear(wgpu::Color {
                    r: bg.r as f64 / 255.0,
                    g: bg.g as f64 / 255.0,
                    b: bg.b as f64 / 255.0,
                    a: 1.0,
                }),
                wgpu::LoadOp::Clear(1.0),
            ),
            None => (wgpu::LoadOp::Load, wgpu::LoadOp::Load),
        };

        let mut encoder = gpu.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Raster Encoder"),
        });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Raster Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: color_load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: depth_load,
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            if let Some(vertex_buffer) = &vertex_buffer {
                pass.set_bind_group(0, &self.camera_bind_group, &[]);
                pass.set_vertex_buffer(0, vertex_buffer.slice(..));
                for (kind, range) in batch.runs() {
                    pass.set_pipeline(gpu.pipeline(*kind));
                    pass.draw(range.clone(), 0..1);
                }
            }
        }
        gpu.queue.submit(std::iter::once(encoder.finish()));
    }

    /// Copy the colour texture into `pixmap`, which must match the surface size.
    pub fn read_into(&self, id: &str, pixmap: &mut Pixmap) -> Result<(), RenderError> {
        let gpu = &self.gpu;
        let mut encoder = gpu.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Raster Readback Encoder"),
        });
        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture: &self.color_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &self.readback,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(self.padded_row),
                    rows_per_image: Some(self.height),
                },
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );
        gpu.queue.submit(std::iter::once(encoder.finish()));

        let readback_error = |reason: String| RenderError::Readback {
            id: id.to_string(),
            reason,
        };
        let slice = self.readback.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        gpu.device.poll(wgpu::Maintain::Wait);
        rx.recv()
            .map_err(|e| readback_error(e.to_string()))?
            .map_err(|e| readback_error(e.to_string()))?;

        {
            let mapped = slice.get_mapped_range();
            let row = (self.width * 4) as usize;
            let out = pixmap.data_mut();
            for (y, src) in mapped.chunks(self.padded_row as usize).take(self.height as usize).enumerate() {
                out[y * row..(y + 1) * row].copy_from_slice(&src[..row]);
            }
        }
        self.readback.unmap();
        Ok(())
    }
}
