//! `RenderBackend` over raylib. Draw calls go straight to rlgl so the
//! pipeline can drive targets and blend state without a draw handle.

use hashbrown::{HashMap, HashSet};
use raylib::prelude::{RaylibHandle, RaylibThread};
use umbra_composite::FrameParams;
use umbra_geom::Rect;
use umbra_lighting::{DarknessUniforms, LightUniforms, SourceRegistry};
use umbra_pipeline::{
    CompositeInputs, Layers, MaskPackInputs, RenderBackend, SceneKind, SpriteId, TargetDesc,
    TargetHandle,
};
use umbra_scene::{DocId, TextureRef};
use umbra_visibility::SpriteSink;

use crate::TextureCache;
use crate::conv::{color_from_f32, rect_to_ffi};
use crate::meshes::{MeshSyncStats, SourceMeshes};
use crate::shaders::{
    CompositeShader, CompositeTextures, DarknessShader, LightShader, MaskPackShader,
    OutdoorsShader, release_slots,
};
use crate::sprites::SpriteStore;
use crate::targets::GpuTarget;
use crate::view::{Affine2, View2D};

// GL / raylib enum values.
const BLEND_ADDITIVE: i32 = 1;
const BLEND_CUSTOM: i32 = 6;
const BLEND_CUSTOM_SEPARATE: i32 = 7;
const GL_ZERO: i32 = 0;
const GL_ONE: i32 = 1;
const GL_SRC_ALPHA: i32 = 0x0302;
const GL_ONE_MINUS_SRC_ALPHA: i32 = 0x0303;
const GL_FUNC_ADD: i32 = 0x8006;
const GL_MAX: i32 = 0x8008;
const RL_QUADS: i32 = 0x0007;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Blend {
    /// Straight alpha over, alpha channel accumulated without squaring.
    Over,
    Additive,
    Max,
    Replace,
}

fn begin_blend(blend: Blend) {
    unsafe {
        match blend {
            Blend::Over => {
                raylib::ffi::rlSetBlendFactorsSeparate(
                    GL_SRC_ALPHA,
                    GL_ONE_MINUS_SRC_ALPHA,
                    GL_ONE,
                    GL_ONE_MINUS_SRC_ALPHA,
                    GL_FUNC_ADD,
                    GL_FUNC_ADD,
                );
                raylib::ffi::BeginBlendMode(BLEND_CUSTOM_SEPARATE);
            }
            Blend::Additive => raylib::ffi::BeginBlendMode(BLEND_ADDITIVE),
            Blend::Max => {
                raylib::ffi::rlSetBlendFactors(GL_ONE, GL_ONE, GL_MAX);
                raylib::ffi::BeginBlendMode(BLEND_CUSTOM);
            }
            Blend::Replace => {
                raylib::ffi::rlSetBlendFactors(GL_ONE, GL_ZERO, GL_FUNC_ADD);
                raylib::ffi::BeginBlendMode(BLEND_CUSTOM);
            }
        }
    }
}

fn end_blend() {
    unsafe { raylib::ffi::EndBlendMode() }
}

/// Screen-covering quad; `v` runs bottom-up so render-target textures
/// sample upright.
fn fullscreen_quad(width: i32, height: i32) {
    let (w, h) = (width as f32, height as f32);
    unsafe {
        raylib::ffi::rlSetTexture(raylib::ffi::rlGetTextureIdDefault());
        raylib::ffi::rlBegin(RL_QUADS);
        raylib::ffi::rlColor4ub(255, 255, 255, 255);
        raylib::ffi::rlNormal3f(0.0, 0.0, 1.0);
        raylib::ffi::rlTexCoord2f(0.0, 1.0);
        raylib::ffi::rlVertex2f(0.0, 0.0);
        raylib::ffi::rlTexCoord2f(0.0, 0.0);
        raylib::ffi::rlVertex2f(0.0, h);
        raylib::ffi::rlTexCoord2f(1.0, 0.0);
        raylib::ffi::rlVertex2f(w, h);
        raylib::ffi::rlTexCoord2f(1.0, 1.0);
        raylib::ffi::rlVertex2f(w, 0.0);
        raylib::ffi::rlEnd();
        raylib::ffi::rlSetTexture(0);
    }
}

fn push_affine(a: Affine2) {
    unsafe {
        raylib::ffi::rlDrawRenderBatchActive();
        raylib::ffi::rlPushMatrix();
        raylib::ffi::rlTranslatef(a.tx, a.ty, 0.0);
        raylib::ffi::rlScalef(a.sx, a.sy, 1.0);
    }
}

fn pop_affine() {
    unsafe {
        raylib::ffi::rlDrawRenderBatchActive();
        raylib::ffi::rlPopMatrix();
    }
}

/// Draws `tex` stretched over a host rect rotated about its centre.
fn draw_texture_in(tex: raylib::ffi::Texture2D, rect: Rect, lift: f32, rotation: f32, alpha: f32) {
    let src = raylib::ffi::Rectangle {
        x: 0.0,
        y: 0.0,
        width: tex.width as f32,
        height: tex.height as f32,
    };
    let c = rect.center();
    let dest = raylib::ffi::Rectangle {
        x: c.x,
        y: c.y - lift,
        width: rect.width,
        height: rect.height,
    };
    let origin = raylib::ffi::Vector2 {
        x: rect.width * 0.5,
        y: rect.height * 0.5,
    };
    unsafe {
        raylib::ffi::DrawTexturePro(tex, src, dest, origin, rotation, color_from_f32([1.0, 1.0, 1.0, alpha]));
    }
}

#[derive(Clone, Debug, PartialEq)]
struct LightDraw {
    id: DocId,
    uniforms: LightUniforms,
    z: f32,
}

#[derive(Clone, Debug, PartialEq)]
struct DarknessDraw {
    id: DocId,
    uniforms: DarknessUniforms,
    z: f32,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct BackendStats {
    pub sprite_draws: usize,
    pub light_draws: usize,
    pub darkness_draws: usize,
    pub mesh_uploads: usize,
    pub targets: usize,
}

pub struct RaylibBackend {
    pub light_shader: Option<LightShader>,
    pub darkness_shader: Option<DarknessShader>,
    pub mask_pack_shader: Option<MaskPackShader>,
    pub outdoors_shader: Option<OutdoorsShader>,
    pub composite_shader: Option<CompositeShader>,
    light_material: Option<raylib::ffi::Material>,
    darkness_material: Option<raylib::ffi::Material>,
    targets: HashMap<u32, GpuTarget>,
    next_target: u32,
    bound: Option<TargetHandle>,
    clear: [f32; 4],
    camera_layers: Layers,
    pub sprites: SpriteStore,
    pub textures: TextureCache,
    meshes: SourceMeshes,
    light_draws: Vec<LightDraw>,
    darkness_draws: Vec<DarknessDraw>,
    /// World-space outdoors mask texture key, if the scene has one.
    pub outdoors_texture: Option<String>,
    pub scene_rect: Rect,
    view: View2D,
    viewport: (i32, i32),
    scene_ready: bool,
    pub stats: BackendStats,
}

impl RaylibBackend {
    pub fn new(rl: &mut RaylibHandle, thread: &RaylibThread) -> Self {
        let light_shader = LightShader::load(rl, thread);
        let darkness_shader = DarknessShader::load(rl, thread);
        let material_for = |shader: raylib::ffi::Shader| {
            let mut m = unsafe { raylib::ffi::LoadMaterialDefault() };
            m.shader = shader;
            m
        };
        let light_material = light_shader.as_ref().map(|s| material_for(*s.shader.as_ref()));
        let darkness_material = darkness_shader
            .as_ref()
            .map(|s| material_for(*s.shader.as_ref()));
        Self {
            light_shader,
            darkness_shader,
            mask_pack_shader: MaskPackShader::load(rl, thread),
            outdoors_shader: OutdoorsShader::load(rl, thread),
            composite_shader: CompositeShader::load(rl, thread),
            light_material,
            darkness_material,
            targets: HashMap::new(),
            next_target: 1,
            bound: None,
            clear: [0.0, 0.0, 0.0, 1.0],
            camera_layers: Layers::ALL,
            sprites: SpriteStore::new(),
            textures: TextureCache::new(),
            meshes: SourceMeshes::new(),
            light_draws: Vec::new(),
            darkness_draws: Vec::new(),
            outdoors_texture: None,
            scene_rect: Rect::new(0.0, 0.0, 0.0, 0.0),
            view: View2D::new(umbra_geom::Vec2::ZERO, 1.0, 0.0),
            viewport: (0, 0),
            scene_ready: false,
            stats: BackendStats::default(),
        }
    }

    /// Marks the scene drawable; the pipeline stays idle until then.
    pub fn set_scene(&mut self, scene_rect: Rect) {
        self.scene_rect = scene_rect;
        self.scene_ready = true;
    }

    pub fn begin_frame(&mut self, width: i32, height: i32, view: View2D) {
        self.viewport = (width.max(0), height.max(0));
        self.view = view;
        let uploads = self.stats.mesh_uploads;
        self.stats = BackendStats {
            mesh_uploads: uploads,
            targets: self.targets.len(),
            ..BackendStats::default()
        };
    }

    #[inline]
    pub fn view(&self) -> &View2D {
        &self.view
    }

    /// Copies this frame's source uniforms and keeps GPU meshes in step with
    /// the builders' geometry.
    pub fn sync_sources(&mut self, registry: &SourceRegistry) -> MeshSyncStats {
        let mut stats = MeshSyncStats::default();
        self.light_draws.clear();
        self.darkness_draws.clear();
        for b in registry.lights() {
            let Some(geometry) = b.geometry().filter(|_| b.is_renderable()) else {
                continue;
            };
            if self.meshes.ensure(b.id(), geometry) {
                stats.uploaded += 1;
            }
            self.light_draws.push(LightDraw {
                id: b.id().to_string(),
                uniforms: *b.uniforms(),
                z: b.z(),
            });
        }
        for b in registry.darkness() {
            let Some(geometry) = b.geometry().filter(|_| b.is_renderable()) else {
                continue;
            };
            if self.meshes.ensure(b.id(), geometry) {
                stats.uploaded += 1;
            }
            self.darkness_draws.push(DarknessDraw {
                id: b.id().to_string(),
                uniforms: *b.uniforms(),
                z: b.z(),
            });
        }
        self.light_draws.sort_by(|a, b| a.z.total_cmp(&b.z));
        self.darkness_draws.sort_by(|a, b| a.z.total_cmp(&b.z));
        let live: HashSet<&str> = self
            .light_draws
            .iter()
            .map(|d| d.id.as_str())
            .chain(self.darkness_draws.iter().map(|d| d.id.as_str()))
            .collect();
        stats.dropped = self.meshes.retain(|id| live.contains(id));
        self.stats.mesh_uploads += stats.uploaded;
        if stats.uploaded > 0 || stats.dropped > 0 {
            log::debug!(
                target: "pipeline",
                "source meshes: {} uploaded, {} dropped, {} resident",
                stats.uploaded,
                stats.dropped,
                self.meshes.len()
            );
        }
        stats
    }

    fn target_texture_id(&self, handle: TargetHandle) -> u32 {
        self.targets.get(&handle.0).map_or(0, |t| t.color)
    }

    fn draw_sprites(&mut self) {
        let (w, h) = self.viewport;
        let camera = self.camera_layers;
        push_affine(self.view.host_affine(w, h));
        begin_blend(Blend::Over);
        let mut drawn = 0;
        for s in self.sprites.ordered() {
            if !s.drawable() || !camera.intersects(s.layers) {
                continue;
            }
            let Some(tex) = self.textures.raw(&s.texture) else {
                continue;
            };
            draw_texture_in(tex, s.rect, s.lift, s.rotation, s.alpha);
            drawn += 1;
        }
        end_blend();
        pop_affine();
        self.stats.sprite_draws += drawn;
    }

    fn draw_lights(&mut self) {
        let (Some(shader), Some(material)) = (self.light_shader.as_mut(), self.light_material)
        else {
            return;
        };
        let (w, h) = self.viewport;
        let transform = self.view.world_affine(w, h).to_matrix();
        begin_blend(Blend::Additive);
        unsafe { raylib::ffi::rlDisableBackfaceCulling() };
        for d in &self.light_draws {
            let Some(m) = self.meshes.get(&d.id) else {
                continue;
            };
            shader.apply(&d.uniforms);
            unsafe { raylib::ffi::DrawMesh(*m.mesh.as_ref(), material, transform) };
            self.stats.light_draws += 1;
        }
        unsafe { raylib::ffi::rlEnableBackfaceCulling() };
        end_blend();
    }

    fn draw_darkness(&mut self) {
        let (Some(shader), Some(material)) =
            (self.darkness_shader.as_mut(), self.darkness_material)
        else {
            return;
        };
        let (w, h) = self.viewport;
        let transform = self.view.world_affine(w, h).to_matrix();
        begin_blend(Blend::Max);
        unsafe { raylib::ffi::rlDisableBackfaceCulling() };
        for d in &self.darkness_draws {
            let Some(m) = self.meshes.get(&d.id) else {
                continue;
            };
            shader.apply(&d.uniforms);
            unsafe { raylib::ffi::DrawMesh(*m.mesh.as_ref(), material, transform) };
            self.stats.darkness_draws += 1;
        }
        unsafe { raylib::ffi::rlEnableBackfaceCulling() };
        end_blend();
    }

    /// Frees GPU resources; call before the window closes.
    pub fn teardown(&mut self) {
        self.set_render_target(None);
        for (_, t) in self.targets.drain() {
            t.destroy();
        }
        self.meshes.clear();
        for m in [self.light_material.take(), self.darkness_material.take()]
            .into_iter()
            .flatten()
        {
            unsafe { raylib::ffi::MemFree(m.maps as *mut std::ffi::c_void) };
        }
        self.scene_ready = false;
    }
}

impl RenderBackend for RaylibBackend {
    fn is_ready(&self) -> bool {
        self.scene_ready
            && self.composite_shader.is_some()
            && self.viewport.0 > 0
            && self.viewport.1 > 0
    }

    fn drawing_buffer_size(&self) -> (i32, i32) {
        self.viewport
    }

    fn create_target(&mut self, desc: TargetDesc) -> Option<TargetHandle> {
        let target = GpuTarget::create(desc)?;
        let handle = TargetHandle(self.next_target);
        self.next_target += 1;
        log::debug!(
            target: "pipeline",
            "target {} created {}x{} {:?} (fbo {})",
            handle.0,
            target.width,
            target.height,
            target.format,
            target.fbo
        );
        self.targets.insert(handle.0, target);
        Some(handle)
    }

    fn destroy_target(&mut self, target: TargetHandle) {
        if self.bound == Some(target) {
            self.set_render_target(None);
        }
        if let Some(t) = self.targets.remove(&target.0) {
            t.destroy();
        }
    }

    fn texture(&self, target: TargetHandle) -> TextureRef {
        self.targets
            .get(&target.0)
            .map(GpuTarget::texture_ref)
            .unwrap_or_default()
    }

    fn render_target(&self) -> Option<TargetHandle> {
        self.bound
    }

    fn set_render_target(&mut self, target: Option<TargetHandle>) {
        if self.bound == target {
            return;
        }
        unsafe {
            if self.bound.is_some() {
                raylib::ffi::EndTextureMode();
            }
            self.bound = None;
            if let Some(t) = target.and_then(|h| self.targets.get(&h.0)) {
                raylib::ffi::BeginTextureMode(t.raw_render_texture());
                self.bound = target;
            }
        }
    }

    fn clear_color(&self) -> [f32; 4] {
        self.clear
    }

    fn set_clear_color(&mut self, color: [f32; 4]) {
        self.clear = color;
    }

    fn clear(&mut self) {
        unsafe { raylib::ffi::ClearBackground(color_from_f32(self.clear)) };
    }

    fn set_color_write(&mut self, enabled: bool) {
        unsafe {
            raylib::ffi::rlDrawRenderBatchActive();
            raylib::ffi::rlColorMask(enabled, enabled, enabled, enabled);
        }
    }

    fn camera_layers(&self) -> Layers {
        self.camera_layers
    }

    fn set_camera_layers(&mut self, layers: Layers) {
        self.camera_layers = layers;
    }

    fn token_sprite_layers(&self, out: &mut Vec<(SpriteId, Layers)>) {
        self.sprites.token_layers(out);
    }

    fn set_sprite_layers(&mut self, sprite: SpriteId, layers: Layers) {
        self.sprites.set_layers(sprite, layers);
    }

    fn draw_scene(&mut self, scene: SceneKind, _params: &FrameParams) {
        match scene {
            SceneKind::Main => self.draw_sprites(),
            SceneKind::Lights => self.draw_lights(),
            SceneKind::Darkness => self.draw_darkness(),
        }
    }

    fn draw_mask_pack(&mut self, inputs: &MaskPackInputs) {
        let outdoors = inputs.outdoors.map_or(0, |h| self.target_texture_id(h));
        let rope = self.target_texture_id(inputs.rope);
        let token = self.target_texture_id(inputs.token);
        let roof = self.target_texture_id(inputs.roof);
        let (w, h) = self.viewport;
        let Some(pack) = self.mask_pack_shader.as_mut() else {
            return;
        };
        begin_blend(Blend::Replace);
        unsafe { raylib::ffi::BeginShaderMode(*pack.shader.as_ref()) };
        pack.bind(outdoors, rope, token, roof);
        fullscreen_quad(w, h);
        unsafe { raylib::ffi::EndShaderMode() };
        end_blend();
        release_slots(MaskPackShader::SLOTS);
    }

    fn draw_outdoors_projection(&mut self) -> bool {
        let Some(tex) = self
            .outdoors_texture
            .as_deref()
            .and_then(|key| self.textures.raw(key))
        else {
            return false;
        };
        let Some(shader) = self.outdoors_shader.as_ref() else {
            return false;
        };
        let (w, h) = self.viewport;
        push_affine(self.view.host_affine(w, h));
        begin_blend(Blend::Replace);
        unsafe { raylib::ffi::BeginShaderMode(*shader.shader.as_ref()) };
        draw_texture_in(tex, self.scene_rect, 0.0, 0.0, 1.0);
        unsafe { raylib::ffi::EndShaderMode() };
        end_blend();
        pop_affine();
        true
    }

    fn draw_composite(&mut self, inputs: &CompositeInputs, params: &FrameParams) {
        let ext = |t: Option<TextureRef>| t.map_or(0, |t| t.id);
        let textures = CompositeTextures {
            diffuse: self.target_texture_id(inputs.diffuse),
            light: self.target_texture_id(inputs.light),
            darkness: self.target_texture_id(inputs.darkness),
            masks: self.target_texture_id(inputs.masks),
            window_light: ext(inputs.external.window_light),
            shadows: inputs.external.shadows.map(ext),
            cloud_top: ext(inputs.external.cloud_top),
        };
        let (w, h) = self.viewport;
        let Some(composite) = self.composite_shader.as_mut() else {
            return;
        };
        begin_blend(Blend::Replace);
        unsafe { raylib::ffi::BeginShaderMode(*composite.shader.as_ref()) };
        composite.bind(&textures);
        composite.apply(params);
        fullscreen_quad(w, h);
        unsafe { raylib::ffi::EndShaderMode() };
        end_blend();
        release_slots(CompositeShader::SLOTS);
    }

    fn draw_debug_overlay(&mut self, target: TargetHandle) {
        let Some(t) = self.targets.get(&target.0) else {
            return;
        };
        let (w, h) = self.viewport;
        let (dw, dh) = (w as f32 * 0.25, h as f32 * 0.25);
        let dest = Rect::new(w as f32 - dw - 8.0, h as f32 - dh - 8.0, dw, dh);
        // Render textures are stored bottom-up.
        let src = raylib::ffi::Rectangle {
            x: 0.0,
            y: 0.0,
            width: t.width as f32,
            height: -(t.height as f32),
        };
        unsafe {
            raylib::ffi::DrawTexturePro(
                t.raw_texture(),
                src,
                rect_to_ffi(dest),
                raylib::ffi::Vector2 { x: 0.0, y: 0.0 },
                0.0,
                color_from_f32([1.0, 1.0, 1.0, 1.0]),
            );
            raylib::ffi::DrawRectangleLinesEx(
                rect_to_ffi(dest),
                1.0,
                color_from_f32([1.0, 1.0, 1.0, 0.8]),
            );
        }
    }

    fn capture_depth(&mut self, near_pad: f32, far_pad: f32) {
        let range = self
            .sprites
            .iter()
            .filter(|s| s.drawable())
            .fold(None, |acc: Option<(f32, f32)>, s| {
                let e = s.elevation;
                Some(acc.map_or((e, e), |(lo, hi)| (lo.min(e), hi.max(e))))
            });
        let Some((lo, hi)) = range else {
            return;
        };
        let near = lo - near_pad.max(0.0);
        let far = (hi + far_pad.max(0.0)).max(near + 1e-3);
        let (w, h) = self.viewport;
        push_affine(self.view.host_affine(w, h));
        begin_blend(Blend::Max);
        for s in self.sprites.ordered() {
            if !s.drawable() {
                continue;
            }
            let d = ((s.elevation - near) / (far - near)).clamp(0.0, 1.0);
            let c = s.rect.center();
            unsafe {
                raylib::ffi::DrawRectanglePro(
                    raylib::ffi::Rectangle {
                        x: c.x,
                        y: c.y,
                        width: s.rect.width,
                        height: s.rect.height,
                    },
                    raylib::ffi::Vector2 {
                        x: s.rect.width * 0.5,
                        y: s.rect.height * 0.5,
                    },
                    s.rotation,
                    color_from_f32([d, d, d, 1.0]),
                );
            }
        }
        end_blend();
        pop_affine();
    }
}

impl SpriteSink for RaylibBackend {
    fn sprite_ids(&self, out: &mut Vec<DocId>) {
        out.extend(self.sprites.iter().filter(|s| s.token).map(|s| s.doc.clone()));
    }

    fn has_sprite(&self, id: &str) -> bool {
        self.sprites.by_doc(id).is_some()
    }

    fn set_sprite_visible(&mut self, id: &str, visible: bool) {
        if let Some(s) = self.sprites.by_doc_mut(id) {
            s.visible = visible;
        }
    }

    fn set_sprite_opacity(&mut self, id: &str, opacity: f32) {
        if let Some(s) = self.sprites.by_doc_mut(id) {
            s.alpha = opacity.clamp(0.0, 1.0);
        }
    }
}
