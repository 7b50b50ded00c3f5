//! Per-document source builders. One builder owns the document copy, the
//! animation state, the uniform block and the current mesh outline.

use umbra_geom::{Vec2, polygon};
use umbra_scene::config::LightingConfig;
use umbra_scene::{DarknessAnimationKind, LightDoc};

use crate::animation::AnimationState;
use crate::geometry::{GeometryInput, SourceGeometry};
use crate::material::{DarknessUniforms, LightUniforms};
use crate::noise::SmoothNoise;

/// Frame timing handed to every builder.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameTime {
    pub elapsed_ms: f64,
    pub dt_ms: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BuildContext {
    pub lighting: LightingConfig,
    pub scene_height: f32,
}

impl BuildContext {
    pub fn new(lighting: LightingConfig, scene_height: f32) -> Self {
        Self {
            lighting,
            scene_height,
        }
    }
}

/// Stable per-source seed in [0,1) from a 32-bit FNV-1a of the id.
pub fn seed_for(id: &str) -> f32 {
    let mut h: u32 = 0x811C_9DC5;
    for b in id.as_bytes() {
        h ^= u32::from(*b);
        h = h.wrapping_mul(0x0100_0193);
    }
    (h >> 8) as f32 / (1u32 << 24) as f32
}

#[inline]
fn world_center(doc: &LightDoc, ctx: &BuildContext) -> Vec2 {
    polygon::host_to_world(doc.position(), ctx.scene_height)
}

fn shape_changed(a: &LightDoc, b: &LightDoc) -> bool {
    a.x != b.x || a.y != b.y || a.config.radius() != b.config.radius()
}

pub struct LightSourceBuilder {
    doc: LightDoc,
    anim: AnimationState,
    uniforms: LightUniforms,
    geometry: Option<SourceGeometry>,
    z: f32,
    dirty: bool,
}

impl LightSourceBuilder {
    pub fn new(doc: LightDoc, ctx: &BuildContext) -> Self {
        let seed = seed_for(&doc.id);
        let anim = AnimationState::new(&doc.config.animation, seed);
        let uniforms = LightUniforms::from_config(
            &doc.config,
            world_center(&doc, ctx),
            doc.config.radius(),
            &anim,
            ctx.lighting.master_intensity,
        );
        Self {
            doc,
            anim,
            uniforms,
            geometry: None,
            z: ctx.lighting.ground_z + ctx.lighting.light_z_offset,
            dirty: true,
        }
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.doc.id
    }

    #[inline]
    pub fn doc(&self) -> &LightDoc {
        &self.doc
    }

    /// Replaces the document. Animation time carries over when the kind is unchanged.
    pub fn update(&mut self, doc: LightDoc, ctx: &BuildContext) {
        if shape_changed(&self.doc, &doc) {
            self.dirty = true;
        }
        let mut anim = AnimationState::new(&doc.config.animation, self.anim.seed);
        if anim.kind == self.anim.kind {
            anim.time = self.anim.time;
            anim.pulse = self.anim.pulse;
        }
        self.anim = anim;
        self.doc = doc;
        self.rebuild_uniforms(ctx);
    }

    pub fn rebuild_uniforms(&mut self, ctx: &BuildContext) {
        let (center, mesh_radius) = match &self.geometry {
            Some(g) => (g.center, g.mesh_radius),
            None => (world_center(&self.doc, ctx), self.doc.config.radius()),
        };
        self.uniforms = LightUniforms::from_config(
            &self.doc.config,
            center,
            mesh_radius,
            &self.anim,
            ctx.lighting.master_intensity,
        );
        self.z = ctx.lighting.ground_z + ctx.lighting.light_z_offset;
    }

    pub fn geometry_input(&self, los: Option<Vec<f32>>, ctx: &BuildContext) -> GeometryInput {
        GeometryInput {
            center: self.doc.position(),
            radius: self.doc.config.radius(),
            los,
            inset: ctx.lighting.effective_inset(),
            segments: ctx.lighting.circle_segments,
            scene_height: ctx.scene_height,
            padding: 0.0,
        }
    }

    pub fn set_geometry(&mut self, geometry: Option<SourceGeometry>) {
        if let Some(g) = &geometry {
            self.uniforms.center = g.center;
            self.uniforms.mesh_radius = g.mesh_radius;
        }
        self.geometry = geometry;
        self.dirty = false;
    }

    pub fn tick(&mut self, frame: FrameTime, noise: &SmoothNoise, audio_level: f32) {
        self.anim.advance(frame.elapsed_ms, frame.dt_ms, noise, audio_level);
        self.uniforms.apply_animation(&self.anim);
    }

    #[inline]
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    #[inline]
    pub fn is_fallback(&self) -> bool {
        self.geometry.as_ref().is_some_and(|g| g.fallback)
    }

    #[inline]
    pub fn geometry(&self) -> Option<&SourceGeometry> {
        self.geometry.as_ref()
    }

    #[inline]
    pub fn uniforms(&self) -> &LightUniforms {
        &self.uniforms
    }

    #[inline]
    pub fn animation(&self) -> &AnimationState {
        &self.anim
    }

    #[inline]
    pub fn z(&self) -> f32 {
        self.z
    }

    /// Drawable this frame: has a mesh and is not hidden.
    #[inline]
    pub fn is_renderable(&self) -> bool {
        self.geometry.is_some() && !self.doc.hidden
    }
}

pub struct DarknessSourceBuilder {
    doc: LightDoc,
    kind: DarknessAnimationKind,
    uniforms: DarknessUniforms,
    geometry: Option<SourceGeometry>,
    z: f32,
    dirty: bool,
}

impl DarknessSourceBuilder {
    pub fn new(doc: LightDoc, ctx: &BuildContext) -> Self {
        let kind = Self::kind_of(&doc);
        let uniforms = DarknessUniforms::from_config(
            &doc.config,
            kind,
            world_center(&doc, ctx),
            ctx.lighting.darkness_padding_px,
            seed_for(&doc.id),
        );
        Self {
            doc,
            kind,
            uniforms,
            geometry: None,
            z: ctx.lighting.ground_z + ctx.lighting.darkness_z_offset,
            dirty: true,
        }
    }

    fn kind_of(doc: &LightDoc) -> DarknessAnimationKind {
        doc.config
            .animation
            .kind
            .as_deref()
            .map(DarknessAnimationKind::from_name)
            .unwrap_or(DarknessAnimationKind::None)
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.doc.id
    }

    #[inline]
    pub fn doc(&self) -> &LightDoc {
        &self.doc
    }

    pub fn update(&mut self, doc: LightDoc, ctx: &BuildContext) {
        if shape_changed(&self.doc, &doc) {
            self.dirty = true;
        }
        self.doc = doc;
        self.rebuild_uniforms(ctx);
    }

    pub fn rebuild_uniforms(&mut self, ctx: &BuildContext) {
        let (time, level) = (self.uniforms.time, self.uniforms.global_darkness_level);
        self.kind = Self::kind_of(&self.doc);
        self.uniforms = DarknessUniforms::from_config(
            &self.doc.config,
            self.kind,
            world_center(&self.doc, ctx),
            ctx.lighting.darkness_padding_px,
            seed_for(&self.doc.id),
        );
        if let Some(g) = &self.geometry {
            self.uniforms.center = g.center;
            self.uniforms.mesh_radius = g.mesh_radius;
        }
        self.uniforms.time = time;
        self.uniforms.global_darkness_level = level;
        self.z = ctx.lighting.ground_z + ctx.lighting.darkness_z_offset;
    }

    pub fn geometry_input(&self, los: Option<Vec<f32>>, ctx: &BuildContext) -> GeometryInput {
        GeometryInput {
            center: self.doc.position(),
            radius: self.doc.config.radius(),
            los,
            inset: ctx.lighting.effective_inset(),
            segments: ctx.lighting.circle_segments,
            scene_height: ctx.scene_height,
            padding: ctx.lighting.darkness_padding_px,
        }
    }

    pub fn set_geometry(&mut self, geometry: Option<SourceGeometry>) {
        if let Some(g) = &geometry {
            self.uniforms.center = g.center;
            self.uniforms.mesh_radius = g.mesh_radius;
        }
        self.geometry = geometry;
        self.dirty = false;
    }

    /// Darkness time follows the same seeded model as lights.
    pub fn tick(&mut self, frame: FrameTime, darkness_level: f32) {
        let anim = &self.doc.config.animation;
        self.uniforms.time = crate::animation::animation_time(
            anim.speed.clamp(0.0, 10.0),
            frame.elapsed_ms,
            self.uniforms.seed,
            anim.reverse,
        );
        self.uniforms.global_darkness_level = darkness_level;
    }

    #[inline]
    pub fn kind(&self) -> DarknessAnimationKind {
        self.kind
    }

    #[inline]
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    #[inline]
    pub fn is_fallback(&self) -> bool {
        self.geometry.as_ref().is_some_and(|g| g.fallback)
    }

    #[inline]
    pub fn geometry(&self) -> Option<&SourceGeometry> {
        self.geometry.as_ref()
    }

    #[inline]
    pub fn uniforms(&self) -> &DarknessUniforms {
        &self.uniforms
    }

    #[inline]
    pub fn z(&self) -> f32 {
        self.z
    }

    #[inline]
    pub fn is_renderable(&self) -> bool {
        self.geometry.is_some() && !self.doc.hidden
    }
}
