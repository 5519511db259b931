//! Headless wgpu device and the raster pipelines shared by every raster target.

use std::sync::{Arc, OnceLock};

use log::info;

use crate::error::RenderError;
use crate::raster::{DrawKind, RasterVertex};

pub const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

static SHARED: OnceLock<Result<Arc<GpuContext>, RenderError>> = OnceLock::new();

pub struct GpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub camera_bind_group_layout: wgpu::BindGroupLayout,
    volume_pipeline: wgpu::RenderPipeline,
    flat_pipeline: wgpu::RenderPipeline,
    sprite_pipeline: wgpu::RenderPipeline,
}

impl GpuContext {
    /// Device without a surface. Prefers a hardware adapter and falls back to a software one.
    pub fn headless() -> Result<Self, RenderError> {
        pollster::block_on(Self::headless_async())
    }

    async fn headless_async() -> Result<Self, RenderError> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let mut adapter = None;
        for force_fallback_adapter in [false, true] {
            adapter = instance
                .request_adapter(&wgpu::RequestAdapterOptions {
                    power_preference: wgpu::PowerPreference::HighPerformance,
                    compatible_surface: None,
                    force_fallback_adapter,
                })
                .await;
            if adapter.is_some() {
                break;
            }
        }
        let adapter = adapter.ok_or(RenderError::NoAdapter)?;
        info!("Raster adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Raster Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await
            .map_err(|e| RenderError::Device(e.to_string()))?;

        let camera_bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Raster Camera Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Raster Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/raster.wgsl").into()),
        });
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Raster Pipeline Layout"),
            bind_group_layouts: &[&camera_bind_group_layout],
            push_constant_ranges: &[],
        });

        let volume_pipeline = create_raster_pipeline(&device, &layout, &shader, DrawKind::Volume);
        let flat_pipeline = create_raster_pipeline(&device, &layout, &shader, DrawKind::Flat);
        let sprite_pipeline = create_raster_pipeline(&device, &layout, &shader, DrawKind::Sprite);

        Ok(Self {
            device,
            queue,
            camera_bind_group_layout,
            volume_pipeline,
            flat_pipeline,
            sprite_pipeline,
        })
    }

    /// Process-wide context, created on first use. A failed creation is remembered.
    pub fn shared() -> Result<Arc<GpuContext>, RenderError> {
        SHARED
            .get_or_init(|| Self::headless().map(Arc::new))
            .clone()
    }

    pub fn pipeline(&self, kind: DrawKind) -> &wgpu::RenderPipeline {
        match kind {
            DrawKind::Volume => &self.volume_pipeline,
            DrawKind::Flat => &self.flat_pipeline,
            DrawKind::Sprite => &self.sprite_pipeline,
        }
    }
}

/// Volumes cull back faces and write depth. Flats are depth-tested decals that never write
/// depth. Sprites write depth but are never culled.
fn create_raster_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    kind: DrawKind,
) -> wgpu::RenderPipeline {
    let (label, cull_mode, depth_write_enabled) = match kind {
        DrawKind::Volume => ("Raster Volume Pipeline", Some(wgpu::Face::Back), true),
        DrawKind::Flat => ("Raster Flat Pipeline", None, false),
        DrawKind::Sprite => ("Raster Sprite Pipeline", None, true),
    };
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[RasterVertex::layout()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: COLOR_FORMAT,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode,
            unclipped_depth: false,
            polygon_mode: wgpu::PolygonMode::Fill,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

/// Shared context for GPU-backed tests; `None` (with a note on stderr) when the machine has
/// no usable adapter.
#[cfg(test)]
pub(crate) fn test_context() -> Option<Arc<GpuContext>> {
    match GpuContext::shared() {
        Ok(gpu) => Some(gpu),
        Err(e) => {
            eprintln!("skipping GPU test: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_context_is_reused() {
        let (Some(a), Some(b)) = (test_context(), test_context()) else {
            return;
        };
        assert!(Arc::ptr_eq(&a, &b));
    }
}
