//! Scene model shared by every engine crate: authoritative documents,
//! environment state, collaborator traits, the hook bus and engine config.

pub mod animation;
pub mod color;
pub mod config;
pub mod environment;
pub mod hooks;
pub mod host;
pub mod model;
pub mod patch;

pub use animation::{DarknessAnimationKind, LightAnimationKind};
pub use color::Rgb;
pub use config::{ConfigError, EngineConfig, load_config_from_path};
pub use environment::{Environment, LightningFlash};
pub use hooks::{HookBus, HookEvent, HookKind, ListenerId};
pub use host::{
    CollisionHit, CollisionKind, CollisionMode, CollisionQuery, MaskLifecycle, MaskMeta,
    MaskRegistry, MaskSpace, PathFinder, PathFinderOptions, PermissionService, PolygonBackends,
    SceneHost, TextureRef, WallDirectionMode, mask_ids,
};
pub use model::*;
pub use patch::{PatchError, apply_patch, deep_merge, expand_dotted};

#[cfg(test)]
mod tests;
