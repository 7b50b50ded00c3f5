//! Offscreen mask and accumulation passes feeding the composite shader.

pub mod backend;
pub mod error;
pub mod layers;
pub mod pool;
pub mod sequencer;

pub use backend::{
    CompositeInputs, ExternalTextures, MaskPackInputs, RenderBackend, SceneKind, SpriteId,
    TargetDesc, TargetFormat, TargetHandle,
};
pub use error::PipelineError;
pub use layers::Layers;
pub use pool::{TargetId, TargetPool};
pub use sequencer::{FramePipeline, FrameReport, Pass};

#[cfg(test)]
mod tests;
