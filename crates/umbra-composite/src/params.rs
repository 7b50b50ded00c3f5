//! Immutable per-frame snapshot of everything the passes bind as uniforms.

use umbra_geom::Vec2;
use umbra_scene::config::{EngineConfig, ShadowKindConfig};
use umbra_scene::{Environment, Rgb};

/// Shadow kinds in the order the composite program declares them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShadowKind {
    Overhead = 0,
    Building = 1,
    Bush = 2,
    Tree = 3,
    Cloud = 4,
}

impl ShadowKind {
    pub const ALL: [ShadowKind; 5] = [
        ShadowKind::Overhead,
        ShadowKind::Building,
        ShadowKind::Bush,
        ShadowKind::Tree,
        ShadowKind::Cloud,
    ];
}

/// Which optional textures are bound this frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextureBindings {
    pub shadows: [bool; 5],
    pub window_light: bool,
    pub cloud_top: bool,
    pub outdoors: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadowParams {
    pub opacity: f32,
    /// Screen-space sampling offset in pixels along the sun direction.
    pub offset_px: Vec2,
    pub bound: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightningParams {
    pub flash01: f32,
    pub gain: f32,
    pub edge_shadows: bool,
    pub edge_gain: f32,
    pub band_uv: f32,
    pub radius_uv: f32,
    pub gradient_step_uv: f32,
    pub strike_uv: Vec2,
    pub direction: Vec2,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WindowLightParams {
    pub bound: bool,
    pub rope_boost: f32,
    pub luma_lo: f32,
    pub luma_hi: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameParams {
    pub frame: u64,
    pub width: i32,
    pub height: i32,
    pub elapsed_ms: f64,
    /// The one darkness sample every pass of this frame uses.
    pub darkness_level: f32,
    pub ambient_brightest: Rgb,
    pub ambient_darkness: Rgb,
    pub ambient_daylight: Rgb,
    pub global_illumination: f32,
    pub master_intensity: f32,
    pub coloration_strength: f32,
    pub negative_darkness_strength: f32,
    pub darkness_punch_gain: f32,
    pub outdoor_brightness: f32,
    pub shadows: [ShadowParams; 5],
    pub lightning: LightningParams,
    pub window_light: WindowLightParams,
    pub cloud_top_bound: bool,
    pub cloud_top_opacity: f32,
    pub outdoors_bound: bool,
}

fn shadow(cfg: &ShadowKindConfig, sun: Vec2, bound: bool) -> ShadowParams {
    ShadowParams {
        opacity: cfg.opacity.clamp(0.0, 1.0),
        offset_px: sun * cfg.offset_px,
        bound,
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct FrameInfo {
    pub frame: u64,
    pub width: i32,
    pub height: i32,
    pub elapsed_ms: f64,
}

impl FrameParams {
    pub fn snapshot(
        env: &Environment,
        cfg: &EngineConfig,
        info: FrameInfo,
        bindings: TextureBindings,
    ) -> Self {
        let c = &cfg.composite;
        let sun = if env.sun_dir.length_sq() > 0.0 {
            env.sun_dir.normalized()
        } else {
            Vec2::ZERO
        };
        let s = &c.shadows;
        let flash = env.lightning;
        Self {
            frame: info.frame,
            width: info.width.max(1),
            height: info.height.max(1),
            elapsed_ms: info.elapsed_ms,
            darkness_level: env.darkness(),
            ambient_brightest: env.ambient_brightest,
            ambient_darkness: env.ambient_darkness,
            ambient_daylight: env.ambient_daylight,
            global_illumination: c.global_illumination.max(0.0),
            master_intensity: cfg.lighting.master_intensity.max(0.0),
            coloration_strength: c.coloration_strength,
            negative_darkness_strength: c.negative_darkness_strength.clamp(0.0, 1.0),
            darkness_punch_gain: c.darkness_punch_gain.max(0.0),
            outdoor_brightness: c.outdoor_brightness,
            shadows: [
                shadow(&s.overhead, sun, bindings.shadows[0]),
                shadow(&s.building, sun, bindings.shadows[1]),
                shadow(&s.bush, sun, bindings.shadows[2]),
                shadow(&s.tree, sun, bindings.shadows[3]),
                shadow(&s.cloud, sun, bindings.shadows[4]),
            ],
            lightning: LightningParams {
                flash01: env.flash01(),
                gain: c.lightning.flash_gain,
                edge_shadows: c.lightning.edge_shadows,
                edge_gain: c.lightning.edge_gain,
                band_uv: c.lightning.band_uv.max(1e-5),
                radius_uv: c.lightning.radius_uv.max(1e-5),
                gradient_step_uv: c.lightning.gradient_step_uv.max(1e-5),
                strike_uv: flash.map_or(Vec2::new(0.5, 0.5), |f| f.strike_uv),
                direction: flash.map_or(Vec2::ZERO, |f| f.direction),
            },
            window_light: WindowLightParams {
                bound: bindings.window_light,
                rope_boost: c.window_light.rope_boost,
                luma_lo: c.window_light.rope_luma_lo,
                luma_hi: c.window_light.rope_luma_hi,
            },
            cloud_top_bound: bindings.cloud_top,
            cloud_top_opacity: c.cloud_top_opacity.clamp(0.0, 1.0),
            outdoors_bound: bindings.outdoors,
        }
    }

    #[inline]
    pub fn ambient_day(&self) -> Rgb {
        self.ambient_brightest * self.global_illumination
    }

    #[inline]
    pub fn ambient_night(&self) -> Rgb {
        self.ambient_darkness * self.global_illumination
    }
}
