//! Core engine types and utilities for retroflight.
//!
//! This crate provides the foundational types used across all engine systems:
//! - Transform and spatial helpers
//! - Frame clock and the fixed sub-step accumulator
//! - Vector/quaternion utilities shared by the flight model and renderer

pub mod math;
pub mod time;
pub mod transform;

pub use math::*;
pub use time::*;
pub use transform::*;

// Re-export commonly used types
pub use glam::{Mat3, Mat4, Quat, Vec2, Vec3, Vec4};
