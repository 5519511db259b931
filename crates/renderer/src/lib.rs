//! Renderer for the retro flight sim: palettes, LOD models, render lists, dithered wgpu
//! raster targets, HUD canvases and the multi-target compose pass.

pub mod camera;
pub mod canvas;
pub mod error;
pub mod font;
pub mod gpu;
pub mod lod;
pub mod mesh;
pub mod model;
pub mod palette;
pub mod raster;
pub mod render_list;
pub mod renderer;
pub mod scene;
pub mod target;

pub use camera::*;
pub use canvas::*;
pub use error::*;
pub use font::*;
pub use gpu::GpuContext;
pub use lod::*;
pub use mesh::*;
pub use model::*;
pub use palette::*;
pub use raster::*;
pub use render_list::*;
pub use renderer::*;
pub use scene::*;
pub use target::*;
