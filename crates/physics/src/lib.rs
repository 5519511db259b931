//! Flight dynamics and particle simulation for retroflight.
//!
//! - [`Flight`] drives a pluggable [`FlightModel`] at a fixed sub-step rate.
//! - [`ArcadeFlightModel`] is the arcade integrator; [`DebugFlightModel`] is a free-flight
//!   variant for testing scenery and cameras.
//! - [`ParticleSystem`] is a fixed-capacity particle pool with pluggable emitters.

pub mod arcade;
pub mod debug_model;
pub mod emitter;
pub mod flight;
pub mod particles;
pub mod touchdown;

pub use arcade::*;
pub use debug_model::*;
pub use emitter::*;
pub use flight::*;
pub use particles::*;
pub use touchdown::*;
