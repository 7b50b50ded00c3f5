//! Shader wrappers with cached uniform locations. Sources come from the
//! chunk library; every setter skips uniforms the driver optimised away.

use raylib::prelude::*;
use umbra_composite::FrameParams;
use umbra_lighting::{DarknessUniforms, LightUniforms};
use umbra_shaders::{ShaderSource, uniforms as u};

use crate::conv::rgb_to_array;

fn load_program(
    rl: &mut RaylibHandle,
    thread: &RaylibThread,
    name: &str,
    src: &ShaderSource,
) -> Option<raylib::shaders::WeakShader> {
    let strong = rl.load_shader_from_memory(thread, src.vertex.as_deref(), Some(&src.fragment));
    let shader = unsafe { strong.make_weak() };
    let fallback = unsafe { raylib::ffi::rlGetShaderIdDefault() };
    if shader.id == 0 || shader.id == fallback {
        log::warn!("{name} shader failed to compile; pass disabled");
        return None;
    }
    log::debug!("{name} shader loaded (id {})", shader.id);
    Some(shader)
}

/// Binds a texture id to `slot` and points the sampler at it.
fn bind_sampler(shader: &mut raylib::shaders::WeakShader, loc: i32, slot: i32, texture: u32) {
    if loc < 0 || texture == 0 {
        return;
    }
    unsafe {
        raylib::ffi::rlActiveTextureSlot(slot);
        raylib::ffi::rlEnableTexture(texture);
        raylib::ffi::rlActiveTextureSlot(0);
    }
    shader.set_shader_value(loc, slot);
}

/// Clears slots `1..=count` after a pass.
pub fn release_slots(count: i32) {
    unsafe {
        for slot in 1..=count {
            raylib::ffi::rlActiveTextureSlot(slot);
            raylib::ffi::rlDisableTexture();
        }
        raylib::ffi::rlActiveTextureSlot(0);
    }
}

#[inline]
fn flag(b: bool) -> i32 {
    if b { 1 } else { 0 }
}

pub struct LightShader {
    pub shader: raylib::shaders::WeakShader,
    pub loc_center: i32,
    pub loc_mesh_radius: i32,
    pub loc_color: i32,
    pub loc_radius: i32,
    pub loc_bright_radius: i32,
    pub loc_alpha: i32,
    pub loc_attenuation: i32,
    pub loc_time: i32,
    pub loc_anim_type: i32,
    pub loc_intensity: i32,
    pub loc_seed: i32,
    pub loc_master_intensity: i32,
    pub loc_pulse: i32,
    pub loc_brightness: i32,
}

impl LightShader {
    pub fn load(rl: &mut RaylibHandle, thread: &RaylibThread) -> Option<Self> {
        let shader = load_program(rl, thread, "light", &umbra_shaders::light_program())?;
        Some(Self {
            loc_center: shader.get_shader_location(u::CENTER),
            loc_mesh_radius: shader.get_shader_location(u::MESH_RADIUS),
            loc_color: shader.get_shader_location(u::COLOR),
            loc_radius: shader.get_shader_location(u::RADIUS),
            loc_bright_radius: shader.get_shader_location(u::BRIGHT_RADIUS),
            loc_alpha: shader.get_shader_location(u::ALPHA),
            loc_attenuation: shader.get_shader_location(u::ATTENUATION),
            loc_time: shader.get_shader_location(u::TIME),
            loc_anim_type: shader.get_shader_location(u::ANIM_TYPE),
            loc_intensity: shader.get_shader_location(u::INTENSITY),
            loc_seed: shader.get_shader_location(u::SEED),
            loc_master_intensity: shader.get_shader_location(u::MASTER_INTENSITY),
            loc_pulse: shader.get_shader_location(u::PULSE),
            loc_brightness: shader.get_shader_location(u::BRIGHTNESS),
            shader,
        })
    }

    pub fn apply(&mut self, v: &LightUniforms) {
        let s = &mut self.shader;
        if self.loc_center >= 0 {
            s.set_shader_value(self.loc_center, [v.center.x, v.center.y]);
        }
        if self.loc_mesh_radius >= 0 {
            s.set_shader_value(self.loc_mesh_radius, v.mesh_radius);
        }
        if self.loc_color >= 0 {
            s.set_shader_value(self.loc_color, rgb_to_array(v.color));
        }
        if self.loc_radius >= 0 {
            s.set_shader_value(self.loc_radius, v.radius);
        }
        if self.loc_bright_radius >= 0 {
            s.set_shader_value(self.loc_bright_radius, v.bright_radius);
        }
        if self.loc_alpha >= 0 {
            s.set_shader_value(self.loc_alpha, v.alpha);
        }
        if self.loc_attenuation >= 0 {
            s.set_shader_value(self.loc_attenuation, v.attenuation);
        }
        if self.loc_time >= 0 {
            s.set_shader_value(self.loc_time, v.time);
        }
        if self.loc_anim_type >= 0 {
            s.set_shader_value(self.loc_anim_type, v.anim_type);
        }
        if self.loc_intensity >= 0 {
            s.set_shader_value(self.loc_intensity, v.intensity);
        }
        if self.loc_seed >= 0 {
            s.set_shader_value(self.loc_seed, v.seed);
        }
        if self.loc_master_intensity >= 0 {
            s.set_shader_value(self.loc_master_intensity, v.master_intensity);
        }
        if self.loc_pulse >= 0 {
            s.set_shader_value(self.loc_pulse, v.pulse);
        }
        if self.loc_brightness >= 0 {
            s.set_shader_value(self.loc_brightness, v.brightness);
        }
    }
}

pub struct DarknessShader {
    pub shader: raylib::shaders::WeakShader,
    pub loc_center: i32,
    pub loc_mesh_radius: i32,
    pub loc_radius: i32,
    pub loc_alpha: i32,
    pub loc_attenuation: i32,
    pub loc_border_distance: i32,
    pub loc_global_darkness: i32,
    pub loc_time: i32,
    pub loc_anim_type: i32,
    pub loc_intensity: i32,
    pub loc_seed: i32,
}

impl DarknessShader {
    pub fn load(rl: &mut RaylibHandle, thread: &RaylibThread) -> Option<Self> {
        let shader = load_program(rl, thread, "darkness", &umbra_shaders::darkness_program())?;
        Some(Self {
            loc_center: shader.get_shader_location(u::CENTER),
            loc_mesh_radius: shader.get_shader_location(u::MESH_RADIUS),
            loc_radius: shader.get_shader_location(u::RADIUS),
            loc_alpha: shader.get_shader_location(u::ALPHA),
            loc_attenuation: shader.get_shader_location(u::ATTENUATION),
            loc_border_distance: shader.get_shader_location(u::BORDER_DISTANCE),
            loc_global_darkness: shader.get_shader_location(u::GLOBAL_DARKNESS_LEVEL),
            loc_time: shader.get_shader_location(u::TIME),
            loc_anim_type: shader.get_shader_location(u::ANIM_TYPE),
            loc_intensity: shader.get_shader_location(u::INTENSITY),
            loc_seed: shader.get_shader_location(u::SEED),
            shader,
        })
    }

    pub fn apply(&mut self, v: &DarknessUniforms) {
        let s = &mut self.shader;
        if self.loc_center >= 0 {
            s.set_shader_value(self.loc_center, [v.center.x, v.center.y]);
        }
        if self.loc_mesh_radius >= 0 {
            s.set_shader_value(self.loc_mesh_radius, v.mesh_radius);
        }
        if self.loc_radius >= 0 {
            s.set_shader_value(self.loc_radius, v.radius);
        }
        if self.loc_alpha >= 0 {
            s.set_shader_value(self.loc_alpha, v.alpha);
        }
        if self.loc_attenuation >= 0 {
            s.set_shader_value(self.loc_attenuation, v.attenuation);
        }
        if self.loc_border_distance >= 0 {
            s.set_shader_value(self.loc_border_distance, v.border_distance);
        }
        if self.loc_global_darkness >= 0 {
            s.set_shader_value(self.loc_global_darkness, v.global_darkness_level);
        }
        if self.loc_time >= 0 {
            s.set_shader_value(self.loc_time, v.time);
        }
        if self.loc_anim_type >= 0 {
            s.set_shader_value(self.loc_anim_type, v.anim_type);
        }
        if self.loc_intensity >= 0 {
            s.set_shader_value(self.loc_intensity, v.intensity);
        }
        if self.loc_seed >= 0 {
            s.set_shader_value(self.loc_seed, v.seed);
        }
    }
}

pub struct MaskPackShader {
    pub shader: raylib::shaders::WeakShader,
    pub loc_outdoors: i32,
    pub loc_rope: i32,
    pub loc_token: i32,
    pub loc_roof: i32,
    pub loc_has_outdoors: i32,
}

impl MaskPackShader {
    pub const SLOTS: i32 = 4;

    pub fn load(rl: &mut RaylibHandle, thread: &RaylibThread) -> Option<Self> {
        let shader = load_program(rl, thread, "mask-pack", &umbra_shaders::mask_pack_program())?;
        Some(Self {
            loc_outdoors: shader.get_shader_location(u::T_OUTDOORS),
            loc_rope: shader.get_shader_location(u::T_ROPE),
            loc_token: shader.get_shader_location(u::T_TOKEN),
            loc_roof: shader.get_shader_location(u::T_ROOF),
            loc_has_outdoors: shader.get_shader_location(u::HAS_OUTDOORS),
            shader,
        })
    }

    /// Texture ids; `outdoors` is 0 when no projection exists yet.
    pub fn bind(&mut self, outdoors: u32, rope: u32, token: u32, roof: u32) {
        bind_sampler(&mut self.shader, self.loc_outdoors, 1, outdoors);
        bind_sampler(&mut self.shader, self.loc_rope, 2, rope);
        bind_sampler(&mut self.shader, self.loc_token, 3, token);
        bind_sampler(&mut self.shader, self.loc_roof, 4, roof);
        if self.loc_has_outdoors >= 0 {
            self.shader
                .set_shader_value(self.loc_has_outdoors, flag(outdoors != 0));
        }
    }
}

/// Samples the world-space outdoors texture through the scene camera.
pub struct OutdoorsShader {
    pub shader: raylib::shaders::WeakShader,
}

impl OutdoorsShader {
    pub fn load(rl: &mut RaylibHandle, thread: &RaylibThread) -> Option<Self> {
        let shader = load_program(
            rl,
            thread,
            "outdoors-projection",
            &umbra_shaders::outdoors_projection_program(),
        )?;
        Some(Self { shader })
    }
}

/// Texture ids bound for one composite draw; 0 means unbound.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CompositeTextures {
    pub diffuse: u32,
    pub light: u32,
    pub darkness: u32,
    pub masks: u32,
    pub window_light: u32,
    pub shadows: [u32; 5],
    pub cloud_top: u32,
}

pub struct CompositeShader {
    pub shader: raylib::shaders::WeakShader,
    pub loc_diffuse: i32,
    pub loc_light: i32,
    pub loc_darkness: i32,
    pub loc_masks: i32,
    pub loc_window_light: i32,
    pub loc_shadows: [i32; 5],
    pub loc_cloud_top: i32,
    pub loc_resolution: i32,
    pub loc_ambient_brightest: i32,
    pub loc_ambient_darkness: i32,
    pub loc_darkness_level: i32,
    pub loc_global_illumination: i32,
    pub loc_master_intensity: i32,
    pub loc_coloration_strength: i32,
    pub loc_negative_darkness_strength: i32,
    pub loc_darkness_punch_gain: i32,
    pub loc_outdoor_brightness: i32,
    pub loc_shadow_opacity: i32,
    pub loc_shadow_offset: i32,
    pub loc_shadow_bound: i32,
    pub loc_has_window_light: i32,
    pub loc_rope_boost: i32,
    pub loc_rope_luma_lo: i32,
    pub loc_rope_luma_hi: i32,
    pub loc_has_cloud_top: i32,
    pub loc_cloud_top_opacity: i32,
    pub loc_flash01: i32,
    pub loc_flash_gain: i32,
    pub loc_edge_shadows: i32,
    pub loc_edge_gain: i32,
    pub loc_edge_band: i32,
    pub loc_edge_radius: i32,
    pub loc_gradient_step: i32,
    pub loc_strike_uv: i32,
    pub loc_strike_dir: i32,
}

impl CompositeShader {
    pub const SLOTS: i32 = 11;

    pub fn load(rl: &mut RaylibHandle, thread: &RaylibThread) -> Option<Self> {
        let shader = load_program(rl, thread, "composite", &umbra_shaders::composite_program())?;
        let loc = |name: &str| shader.get_shader_location(name);
        Some(Self {
            loc_diffuse: loc(u::T_DIFFUSE),
            loc_light: loc(u::T_LIGHT),
            loc_darkness: loc(u::T_DARKNESS),
            loc_masks: loc(u::T_MASKS),
            loc_window_light: loc(u::T_WINDOW_LIGHT),
            loc_shadows: u::T_SHADOWS.map(|n| loc(n)),
            loc_cloud_top: loc(u::T_CLOUD_TOP),
            loc_resolution: loc("uResolution"),
            loc_ambient_brightest: loc("uAmbientBrightest"),
            loc_ambient_darkness: loc("uAmbientDarkness"),
            loc_darkness_level: loc("uDarknessLevel"),
            loc_global_illumination: loc("uGlobalIllumination"),
            loc_master_intensity: loc(u::MASTER_INTENSITY),
            loc_coloration_strength: loc("uColorationStrength"),
            loc_negative_darkness_strength: loc("uNegativeDarknessStrength"),
            loc_darkness_punch_gain: loc("uDarknessPunchGain"),
            loc_outdoor_brightness: loc("uOutdoorBrightness"),
            loc_shadow_opacity: loc("uShadowOpacity"),
            loc_shadow_offset: loc("uShadowOffset"),
            loc_shadow_bound: loc("uShadowBound"),
            loc_has_window_light: loc("uHasWindowLight"),
            loc_rope_boost: loc("uRopeBoost"),
            loc_rope_luma_lo: loc("uRopeLumaLo"),
            loc_rope_luma_hi: loc("uRopeLumaHi"),
            loc_has_cloud_top: loc("uHasCloudTop"),
            loc_cloud_top_opacity: loc("uCloudTopOpacity"),
            loc_flash01: loc("uFlash01"),
            loc_flash_gain: loc("uFlashGain"),
            loc_edge_shadows: loc("uEdgeShadows"),
            loc_edge_gain: loc("uEdgeGain"),
            loc_edge_band: loc("uEdgeBand"),
            loc_edge_radius: loc("uEdgeRadius"),
            loc_gradient_step: loc("uGradientStep"),
            loc_strike_uv: loc("uStrikeUv"),
            loc_strike_dir: loc("uStrikeDir"),
            shader,
        })
    }

    pub fn bind(&mut self, t: &CompositeTextures) {
        let s = &mut self.shader;
        bind_sampler(s, self.loc_diffuse, 1, t.diffuse);
        bind_sampler(s, self.loc_light, 2, t.light);
        bind_sampler(s, self.loc_darkness, 3, t.darkness);
        bind_sampler(s, self.loc_masks, 4, t.masks);
        bind_sampler(s, self.loc_window_light, 5, t.window_light);
        for (i, (&loc, &tex)) in self.loc_shadows.iter().zip(&t.shadows).enumerate() {
            bind_sampler(s, loc, 6 + i as i32, tex);
        }
        bind_sampler(s, self.loc_cloud_top, 11, t.cloud_top);
    }

    pub fn apply(&mut self, p: &FrameParams) {
        let s = &mut self.shader;
        if self.loc_resolution >= 0 {
            s.set_shader_value(self.loc_resolution, [p.width as f32, p.height as f32]);
        }
        if self.loc_ambient_brightest >= 0 {
            s.set_shader_value(self.loc_ambient_brightest, rgb_to_array(p.ambient_brightest));
        }
        if self.loc_ambient_darkness >= 0 {
            s.set_shader_value(self.loc_ambient_darkness, rgb_to_array(p.ambient_darkness));
        }
        if self.loc_darkness_level >= 0 {
            s.set_shader_value(self.loc_darkness_level, p.darkness_level);
        }
        if self.loc_global_illumination >= 0 {
            s.set_shader_value(self.loc_global_illumination, p.global_illumination);
        }
        if self.loc_master_intensity >= 0 {
            s.set_shader_value(self.loc_master_intensity, p.master_intensity);
        }
        if self.loc_coloration_strength >= 0 {
            s.set_shader_value(self.loc_coloration_strength, p.coloration_strength);
        }
        if self.loc_negative_darkness_strength >= 0 {
            s.set_shader_value(
                self.loc_negative_darkness_strength,
                p.negative_darkness_strength,
            );
        }
        if self.loc_darkness_punch_gain >= 0 {
            s.set_shader_value(self.loc_darkness_punch_gain, p.darkness_punch_gain);
        }
        if self.loc_outdoor_brightness >= 0 {
            s.set_shader_value(self.loc_outdoor_brightness, p.outdoor_brightness);
        }

        if self.loc_shadow_opacity >= 0 {
            let v = p.shadows.map(|sh| sh.opacity);
            s.set_shader_value_v(self.loc_shadow_opacity, &v);
        }
        if self.loc_shadow_offset >= 0 {
            let v = p.shadows.map(|sh| [sh.offset_px.x, sh.offset_px.y]);
            s.set_shader_value_v(self.loc_shadow_offset, &v);
        }
        if self.loc_shadow_bound >= 0 {
            let v = p.shadows.map(|sh| flag(sh.bound));
            s.set_shader_value_v(self.loc_shadow_bound, &v);
        }

        let w = &p.window_light;
        if self.loc_has_window_light >= 0 {
            s.set_shader_value(self.loc_has_window_light, flag(w.bound));
        }
        if self.loc_rope_boost >= 0 {
            s.set_shader_value(self.loc_rope_boost, w.rope_boost);
        }
        if self.loc_rope_luma_lo >= 0 {
            s.set_shader_value(self.loc_rope_luma_lo, w.luma_lo);
        }
        if self.loc_rope_luma_hi >= 0 {
            s.set_shader_value(self.loc_rope_luma_hi, w.luma_hi);
        }
        if self.loc_has_cloud_top >= 0 {
            s.set_shader_value(self.loc_has_cloud_top, flag(p.cloud_top_bound));
        }
        if self.loc_cloud_top_opacity >= 0 {
            s.set_shader_value(self.loc_cloud_top_opacity, p.cloud_top_opacity);
        }

        let l = &p.lightning;
        if self.loc_flash01 >= 0 {
            s.set_shader_value(self.loc_flash01, l.flash01);
        }
        if self.loc_flash_gain >= 0 {
            s.set_shader_value(self.loc_flash_gain, l.gain);
        }
        if self.loc_edge_shadows >= 0 {
            s.set_shader_value(self.loc_edge_shadows, flag(l.edge_shadows));
        }
        if self.loc_edge_gain >= 0 {
            s.set_shader_value(self.loc_edge_gain, l.edge_gain);
        }
        if self.loc_edge_band >= 0 {
            s.set_shader_value(self.loc_edge_band, l.band_uv);
        }
        if self.loc_edge_radius >= 0 {
            s.set_shader_value(self.loc_edge_radius, l.radius_uv);
        }
        if self.loc_gradient_step >= 0 {
            s.set_shader_value(self.loc_gradient_step, l.gradient_step_uv);
        }
        if self.loc_strike_uv >= 0 {
            s.set_shader_value(self.loc_strike_uv, [l.strike_uv.x, l.strike_uv.y]);
        }
        if self.loc_strike_dir >= 0 {
            s.set_shader_value(self.loc_strike_dir, [l.direction.x, l.direction.y]);
        }
    }
}
