//! CPU mirror of the composite fragment program. The GPU path and this code
//! must agree; tests pin the behaviour here.

use umbra_geom::{Vec2, mix, smoothstep};
use umbra_scene::Rgb;

use crate::masks::MaskSample;
use crate::params::{FrameParams, LightningParams};

/// Screen-space outdoors lookups for the lightning gradient.
pub trait OutdoorsField {
    fn outdoors_at(&self, uv: Vec2) -> f32;
}

/// Uniform outdoors value everywhere.
pub struct ConstantOutdoors(pub f32);

impl OutdoorsField for ConstantOutdoors {
    fn outdoors_at(&self, _uv: Vec2) -> f32 {
        self.0
    }
}

/// Hard vertical edge: outdoors left of `x`, indoors right of it.
pub struct VerticalEdge {
    pub x: f32,
}

impl OutdoorsField for VerticalEdge {
    fn outdoors_at(&self, uv: Vec2) -> f32 {
        if uv.x < self.x { 1.0 } else { 0.0 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PixelInputs {
    pub uv: Vec2,
    pub diffuse: Rgb,
    pub light: Rgb,
    pub darkness: f32,
    pub masks: MaskSample,
    /// Raw shadow texture samples (1 = unshadowed), composite order.
    pub shadows: [f32; 5],
    pub window_light: Rgb,
    /// Cloud top colour and alpha.
    pub cloud_top: (Rgb, f32),
}

impl Default for PixelInputs {
    fn default() -> Self {
        Self {
            uv: Vec2::new(0.5, 0.5),
            diffuse: Rgb::WHITE,
            light: Rgb::BLACK,
            darkness: 0.0,
            masks: MaskSample {
                outdoors: 1.0,
                ..Default::default()
            },
            shadows: [1.0; 5],
            window_light: Rgb::BLACK,
            cloud_top: (Rgb::BLACK, 0.0),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompositeOutput {
    pub color: Rgb,
    pub light_visibility: f32,
    pub punch: f32,
    pub local_darkness: f32,
    pub punched_mask: f32,
    pub combined_shadow: f32,
    pub total_illumination: Rgb,
    /// Multiplier actually applied to the lit colour (1 where not outdoors).
    pub outdoor_factor: f32,
}

#[inline]
pub fn roof_alpha(roof_raw: f32, rope: f32) -> f32 {
    roof_raw * (1.0 - rope)
}

#[inline]
pub fn light_visibility(roof_raw: f32, rope: f32) -> f32 {
    1.0 - roof_alpha(roof_raw, rope)
}

/// `1 - exp(-I * gain)` with `I` already scaled by the master intensity.
#[inline]
pub fn punch(light_i: f32, gain: f32) -> f32 {
    1.0 - (-(light_i.max(0.0)) * gain).exp()
}

/// `mix(1, sample, opacity)`, pulled to 1 under roofs, then to 1 where outdoors is weak.
#[inline]
pub fn shadow_factor(sample: f32, opacity: f32, roof_raw: f32, outdoors: f32) -> f32 {
    let f = mix(1.0, sample, opacity);
    let f = mix(f, 1.0, roof_raw);
    mix(1.0, f, outdoors)
}

#[inline]
pub fn outdoor_multiplier(outdoor_brightness: f32, darkness: f32) -> f32 {
    mix(outdoor_brightness, 2.0 - outdoor_brightness, darkness).clamp(0.0, 2.0)
}

/// One-sided half-plane shadow cast by the outdoors edge at the strike point.
pub fn lightning_shadow(p: &LightningParams, uv: Vec2, field: &dyn OutdoorsField) -> f32 {
    let h = p.gradient_step_uv;
    let s = p.strike_uv;
    let gx = field.outdoors_at(s + Vec2::new(h, 0.0)) - field.outdoors_at(s - Vec2::new(h, 0.0));
    let gy = field.outdoors_at(s + Vec2::new(0.0, h)) - field.outdoors_at(s - Vec2::new(0.0, h));
    let g = Vec2::new(gx, gy);
    let gl = g.length();
    if gl < 1e-4 {
        return 0.0;
    }
    let n = g / gl;
    let side = if p.direction.dot(n) < 0.0 { -1.0 } else { 1.0 };
    let sd = (uv - s).dot(n) * side;
    if sd < 0.0 {
        return 0.0;
    }
    let band = 1.0 - smoothstep(0.5 * p.band_uv, p.band_uv, sd);
    let radial = 1.0 - smoothstep(0.0, p.radius_uv, (uv - s).length());
    let edge_strength = (p.edge_gain * gl).clamp(0.0, 1.0);
    (edge_strength * band * radial).clamp(0.0, 1.0)
}

fn rgb_mix(a: Rgb, b: Rgb, t: f32) -> Rgb {
    a.lerp(b, t)
}

pub fn composite_pixel(fp: &FrameParams, px: &PixelInputs, field: &dyn OutdoorsField) -> CompositeOutput {
    let light = if px.light.has_nan() { Rgb::BLACK } else { px.light };
    let m = px.masks;
    let roof = roof_alpha(m.roof, m.rope);
    let visibility = 1.0 - roof;
    let safe_lights = light.max(Rgb::BLACK) * visibility;

    let mut combined_shadow = 1.0;
    for (i, sp) in fp.shadows.iter().enumerate() {
        let sample = if sp.bound { px.shadows[i] } else { 1.0 };
        combined_shadow *= shadow_factor(sample, sp.opacity, m.roof, m.outdoors);
    }

    let darkness = fp.darkness_level.clamp(0.0, 1.0);
    let day = fp.ambient_day();
    let night = fp.ambient_night();
    let light_i = safe_lights.max_channel() * fp.master_intensity;
    let punch = punch(light_i, fp.darkness_punch_gain);
    let neg = fp.negative_darkness_strength;
    let local_darkness = (darkness * (1.0 - punch * neg)).clamp(0.0, 1.0);

    let window = if fp.window_light.bound { px.window_light } else { Rgb::BLACK };
    let shaded_ambient = rgb_mix(day, night, local_darkness) * combined_shadow + window * combined_shadow;

    let punched_mask = (px.darkness - punch * neg).clamp(0.0, 1.0);
    let after_dark = shaded_ambient * (1.0 - punched_mask);

    let mut total = (after_dark + Rgb::splat(light_i)).max(day * 0.1);
    if total.has_nan() {
        total = shaded_ambient;
    }

    let coloration = safe_lights
        * fp.master_intensity
        * px.diffuse.perceived_brightness()
        * fp.coloration_strength;
    let mut lit = px.diffuse * total + coloration;

    if fp.window_light.bound && m.rope > 0.0 {
        let gate = smoothstep(
            fp.window_light.luma_lo,
            fp.window_light.luma_hi,
            px.diffuse.perceived_brightness(),
        );
        lit = lit + px.diffuse * window * (fp.window_light.rope_boost * m.rope * gate);
    }

    let outdoor_strength = m.outdoors * (1.0 - roof);
    let mut outdoor_factor = 1.0;
    if outdoor_strength > 0.0 {
        let mut mult = outdoor_multiplier(fp.outdoor_brightness, darkness);
        let l = &fp.lightning;
        if l.flash01 > 0.0 {
            let shadow = if l.edge_shadows {
                lightning_shadow(l, px.uv, field)
            } else {
                0.0
            };
            mult *= 1.0 + l.flash01 * l.gain * (1.0 - shadow);
        }
        outdoor_factor = mix(1.0, mult, outdoor_strength);
        lit = lit * outdoor_factor;
    }

    if fp.cloud_top_bound {
        let (cloud, alpha) = px.cloud_top;
        let cloud_dark = mix(1.0, 0.25, darkness);
        let a = (alpha * fp.cloud_top_opacity).clamp(0.0, 1.0);
        lit = rgb_mix(lit, cloud * (cloud_dark * (1.0 - punched_mask)), a);
    }

    CompositeOutput {
        color: lit,
        light_visibility: visibility,
        punch,
        local_darkness,
        punched_mask,
        combined_shadow,
        total_illumination: total,
        outdoor_factor,
    }
}
