//! Renderer errors.
//!
//! Most variants are configuration mistakes: a layer pointing at something that was never
//! registered, or a registration that collides with an existing one. The rest come from the
//! GPU backing raster targets. None of them are recoverable at runtime; callers propagate
//! them up and stop.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("render target `{0}` is already registered")]
    DuplicateTarget(String),
    #[error("render list `{0}` is already registered")]
    DuplicateList(String),
    #[error("render layer references unknown render target `{0}`")]
    UnknownTarget(String),
    #[error("render layer references unknown render list `{0}`")]
    UnknownList(String),
    #[error("raster layer for target `{0}` has no camera")]
    MissingCamera(String),
    #[error("cannot allocate a {width}x{height} surface for `{id}`")]
    InvalidSize { id: String, width: u32, height: u32 },
    #[error("no GPU adapter available for raster targets")]
    NoAdapter,
    #[error("failed to create GPU device: {0}")]
    Device(String),
    #[error("failed to read back raster target `{id}`: {reason}")]
    Readback { id: String, reason: String },
}
