//! Uniform blocks bound per source and the colour policies feeding them.

use umbra_geom::Vec2;
use umbra_scene::{DarknessAnimationKind, LightConfig, Rgb};

use crate::animation::AnimationState;

/// Precomputed attenuation curve: `(cos(pi * att^1.5) - 1) / -2`.
#[inline]
pub fn attenuation_curve(att: f32) -> f32 {
    let a = att.clamp(0.0, 1.0);
    ((std::f32::consts::PI * a.powf(1.5)).cos() - 1.0) / -2.0
}

/// Multiplies HSL saturation by `boost`, capped at 1.
pub fn boost_saturation(c: Rgb, boost: f32) -> Rgb {
    let (h, s, l) = c.to_hsl();
    Rgb::from_hsl(h, (s * boost).min(1.0), l)
}

/// `1.2 + 1.5 * luminosity + 0.5 * satBonus`, `satBonus` is 0.5 iff HSL saturation > 0.2.
#[inline]
pub fn brightness_for(luminosity: f32, color: Rgb) -> f32 {
    let (_, s, _) = color.to_hsl();
    let sat_bonus = if s > 0.2 { 0.5 } else { 0.0 };
    1.2 + 1.5 * luminosity.clamp(0.0, 1.0) + 0.5 * sat_bonus
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightUniforms {
    pub center: Vec2,
    pub mesh_radius: f32,
    pub color: Rgb,
    pub radius: f32,
    pub bright_radius: f32,
    pub alpha: f32,
    pub attenuation: f32,
    pub time: f32,
    pub anim_type: i32,
    pub intensity: f32,
    pub seed: f32,
    pub master_intensity: f32,
    pub pulse: f32,
    pub brightness: f32,
}

impl LightUniforms {
    pub fn from_config(cfg: &LightConfig, center: Vec2, mesh_radius: f32, anim: &AnimationState, master: f32) -> Self {
        let color = boost_saturation(cfg.rgb(), 1.05);
        Self {
            center,
            mesh_radius,
            color,
            radius: cfg.radius(),
            bright_radius: cfg.bright.clamp(0.0, cfg.radius()),
            alpha: cfg.alpha.clamp(0.0, 1.0),
            attenuation: attenuation_curve(cfg.attenuation),
            time: anim.time,
            anim_type: anim.kind.code(),
            intensity: anim.intensity,
            seed: anim.seed,
            master_intensity: master,
            pulse: anim.pulse,
            brightness: brightness_for(cfg.luminosity, color),
        }
    }

    #[inline]
    pub fn apply_animation(&mut self, anim: &AnimationState) {
        self.time = anim.time;
        self.pulse = anim.pulse;
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DarknessUniforms {
    pub center: Vec2,
    pub mesh_radius: f32,
    pub radius: f32,
    pub alpha: f32,
    pub attenuation: f32,
    pub border_distance: f32,
    pub global_darkness_level: f32,
    pub time: f32,
    pub anim_type: i32,
    pub intensity: f32,
    pub seed: f32,
}

impl DarknessUniforms {
    pub fn from_config(
        cfg: &LightConfig,
        kind: DarknessAnimationKind,
        center: Vec2,
        padding: f32,
        seed: f32,
    ) -> Self {
        let radius = cfg.radius();
        let padding = padding.max(0.0);
        Self {
            center,
            mesh_radius: radius + padding,
            radius,
            alpha: (cfg.alpha * 2.0).min(1.0).max(0.0),
            attenuation: attenuation_curve(cfg.attenuation),
            border_distance: border_distance(radius, padding),
            global_darkness_level: 0.0,
            time: seed,
            anim_type: kind.code(),
            intensity: cfg.animation.intensity.clamp(0.0, 10.0),
            seed,
        }
    }
}

/// `r / (r + padding)`, 1 when the source has no extent.
#[inline]
pub fn border_distance(radius: f32, padding: f32) -> f32 {
    if radius + padding <= 0.0 {
        1.0
    } else {
        radius / (radius + padding)
    }
}
