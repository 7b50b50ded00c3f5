//! Light and darkness source builders: LOS geometry, animation schedule and
//! per-source uniforms, plus the registry keeping them in sync with the host.
#![forbid(unsafe_code)]

pub mod animation;
pub mod builder;
pub mod error;
pub mod geometry;
pub mod material;
pub mod noise;
pub mod registry;

pub use animation::{AnimationState, animation_time, smooth_amplitude};
pub use builder::{BuildContext, DarknessSourceBuilder, FrameTime, LightSourceBuilder, seed_for};
pub use error::SourceError;
pub use geometry::{GeometryInput, SourceGeometry, build_geometry};
pub use material::{
    DarknessUniforms, LightUniforms, attenuation_curve, border_distance, boost_saturation,
    brightness_for,
};
pub use noise::SmoothNoise;
pub use registry::{RebuildStats, SourceBuilder, SourceRegistry};

#[cfg(test)]
mod tests;
