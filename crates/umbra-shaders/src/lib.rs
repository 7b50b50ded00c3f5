//! GLSL 330 chunk library and the programs assembled from it.
#![forbid(unsafe_code)]

pub mod chunks;
pub mod programs;

pub use programs::{
    composite_program, darkness_program, light_program, mask_pack_program,
    outdoors_projection_program,
};

/// Vertex + fragment source pair. `vertex: None` means the backend's default
/// vertex stage (position, texcoord, colour, `mvp`).
#[derive(Clone, Debug)]
pub struct ShaderSource {
    pub vertex: Option<String>,
    pub fragment: String,
}

/// Uniform and sampler names shared between programs and the backend binding them.
pub mod uniforms {
    pub const CENTER: &str = "uCenter";
    pub const MESH_RADIUS: &str = "uMeshRadius";
    pub const COLOR: &str = "uColor";
    pub const RADIUS: &str = "uRadius";
    pub const BRIGHT_RADIUS: &str = "uBrightRadius";
    pub const ALPHA: &str = "uAlpha";
    pub const ATTENUATION: &str = "uAttenuation";
    pub const TIME: &str = "uTime";
    pub const ANIM_TYPE: &str = "uAnimType";
    pub const INTENSITY: &str = "uIntensity";
    pub const SEED: &str = "uSeed";
    pub const MASTER_INTENSITY: &str = "uMasterIntensity";
    pub const PULSE: &str = "uPulse";
    pub const BRIGHTNESS: &str = "uBrightness";
    pub const BORDER_DISTANCE: &str = "uBorderDistance";
    pub const GLOBAL_DARKNESS_LEVEL: &str = "uGlobalDarknessLevel";

    pub const T_DIFFUSE: &str = "tDiffuse";
    pub const T_LIGHT: &str = "tLight";
    pub const T_DARKNESS: &str = "tDarkness";
    pub const T_MASKS: &str = "tMasks";
    pub const T_WINDOW_LIGHT: &str = "tWindowLight";
    pub const T_SHADOWS: [&str; 5] = [
        "tOverheadShadow",
        "tBuildingShadow",
        "tBushShadow",
        "tTreeShadow",
        "tCloudShadow",
    ];
    pub const T_CLOUD_TOP: &str = "tCloudTop";

    pub const T_OUTDOORS: &str = "tOutdoors";
    pub const T_ROPE: &str = "tRope";
    pub const T_TOKEN: &str = "tToken";
    pub const T_ROOF: &str = "tRoof";
    pub const HAS_OUTDOORS: &str = "uHasOutdoors";
}

#[cfg(test)]
mod tests;
