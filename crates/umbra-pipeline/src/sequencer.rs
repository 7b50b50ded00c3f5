//! Per-frame pass sequencer: masks, outdoors projection, pack, light and
//! darkness accumulation, composite and the optional debug overlay.

use umbra_composite::FrameParams;
use umbra_scene::config::MaskConfig;
use umbra_scene::{MaskLifecycle, MaskMeta, MaskRegistry, MaskSpace, mask_ids};

use crate::backend::{
    CompositeInputs, ExternalTextures, MaskPackInputs, RenderBackend, SceneKind, SpriteId,
    TargetHandle,
};
use crate::error::PipelineError;
use crate::layers::Layers;
use crate::pool::{TargetId, TargetPool};

const TRANSPARENT: [f32; 4] = [0.0, 0.0, 0.0, 0.0];
const OPAQUE_BLACK: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Pass {
    RoofMask,
    WeatherRoofMask,
    RopeMask,
    TokenMask,
    OutdoorsProjection,
    MaskPack,
    LightAccumulate,
    DarknessAccumulate,
    Composite,
    DepthCapture,
    DebugOverlay,
}

impl Pass {
    pub fn name(self) -> &'static str {
        match self {
            Pass::RoofMask => "roof",
            Pass::WeatherRoofMask => "weather-roof",
            Pass::RopeMask => "rope",
            Pass::TokenMask => "token",
            Pass::MaskPack => "mask-pack",
            Pass::OutdoorsProjection => "outdoors-projection",
            Pass::LightAccumulate => "light-accumulate",
            Pass::DarknessAccumulate => "darkness-accumulate",
            Pass::Composite => "composite",
            Pass::DepthCapture => "depth-capture",
            Pass::DebugOverlay => "debug-overlay",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameReport {
    pub passes: Vec<Pass>,
    pub width: i32,
    pub height: i32,
    pub outdoors_bound: bool,
}

/// Logs a condition once until reset.
#[derive(Default, Debug)]
struct Latch(bool);

impl Latch {
    fn fire(&mut self) -> bool {
        !std::mem::replace(&mut self.0, true)
    }

    fn reset(&mut self) {
        self.0 = false;
    }
}

pub struct FramePipeline {
    pool: TargetPool,
    masks: MaskConfig,
    sprite_scratch: Vec<(SpriteId, Layers)>,
    missing: Latch,
    frames: u64,
}

impl FramePipeline {
    pub fn new(masks: MaskConfig) -> Self {
        Self {
            pool: TargetPool::new(),
            masks,
            sprite_scratch: Vec::new(),
            missing: Latch::default(),
            frames: 0,
        }
    }

    pub fn set_mask_config(&mut self, masks: MaskConfig) {
        self.masks = masks;
    }

    #[inline]
    pub fn pool(&self) -> &TargetPool {
        &self.pool
    }

    #[inline]
    pub fn target(&self, id: TargetId) -> Option<TargetHandle> {
        self.pool.get(id)
    }

    #[inline]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn render_frame(
        &mut self,
        backend: &mut dyn RenderBackend,
        params: &FrameParams,
        external: &ExternalTextures,
        registry: &mut dyn MaskRegistry,
    ) -> Result<FrameReport, PipelineError> {
        if !backend.is_ready() {
            if self.missing.fire() {
                log::warn!(target: "pipeline", "renderer not ready; compositor disabled");
            }
            return Err(PipelineError::MissingCollaborator("renderer"));
        }
        self.missing.reset();

        let (w, h) = backend.drawing_buffer_size();
        let mut report = FrameReport {
            passes: Vec::with_capacity(11),
            width: w,
            height: h,
            outdoors_bound: false,
        };

        let roof = self.acquire(backend, TargetId::Roof, w, h)?;
        let weather = self.acquire(backend, TargetId::WeatherRoof, w, h)?;
        let rope = self.acquire(backend, TargetId::Rope, w, h)?;
        let token = self.acquire(backend, TargetId::Token, w, h)?;
        let packed = self.acquire(backend, TargetId::Masks, w, h)?;
        let outdoors = self.acquire(backend, TargetId::OutdoorsScreen, w, h)?;
        let light = self.acquire(backend, TargetId::Light, w, h)?;
        let darkness = self.acquire(backend, TargetId::Darkness, w, h)?;
        let diffuse = self.acquire(backend, TargetId::Diffuse, w, h)?;

        self.layer_pass(backend, params, roof, Layers::ROOF);
        report.passes.push(Pass::RoofMask);
        if self.masks.weather_roof {
            self.layer_pass(backend, params, weather, Layers::WEATHER_ROOF);
            report.passes.push(Pass::WeatherRoofMask);
        }
        if self.masks.rope {
            self.layer_pass(backend, params, rope, Layers::ROPE);
            report.passes.push(Pass::RopeMask);
        }
        if self.masks.token {
            self.token_pass(backend, params, token);
            report.passes.push(Pass::TokenMask);
        }

        // Projected first so the pack's R channel matches this frame's camera.
        let mut projected = false;
        offscreen(backend, outdoors, TRANSPARENT, |b| {
            projected = b.draw_outdoors_projection();
        });
        report.passes.push(Pass::OutdoorsProjection);

        let pack = MaskPackInputs {
            outdoors: projected.then_some(outdoors),
            rope,
            token,
            roof,
        };
        offscreen(backend, packed, TRANSPARENT, |b| b.draw_mask_pack(&pack));
        report.outdoors_bound = projected;
        report.passes.push(Pass::MaskPack);

        with_all_layers(backend, |b| {
            offscreen(b, light, OPAQUE_BLACK, |b| b.draw_scene(SceneKind::Lights, params));
        });
        report.passes.push(Pass::LightAccumulate);
        with_all_layers(backend, |b| {
            offscreen(b, darkness, OPAQUE_BLACK, |b| {
                b.draw_scene(SceneKind::Darkness, params)
            });
        });
        report.passes.push(Pass::DarknessAccumulate);

        // Diffuse excludes every occlusion mask layer.
        let camera = backend.camera_layers();
        backend.set_camera_layers(
            camera.without(Layers::WEATHER_ROOF | Layers::ROPE | Layers::TOKEN | Layers::OVERLAY),
        );
        offscreen(backend, diffuse, OPAQUE_BLACK, |b| {
            b.draw_scene(SceneKind::Main, params)
        });
        backend.set_camera_layers(camera);
        backend.draw_composite(
            &CompositeInputs {
                diffuse,
                light,
                darkness,
                masks: packed,
                external: *external,
            },
            params,
        );
        report.passes.push(Pass::Composite);

        if self.masks.depth_capture {
            let depth = self.acquire(backend, TargetId::Depth, w, h)?;
            let (near, far) = (self.masks.depth_near_pad, self.masks.depth_far_pad);
            offscreen(backend, depth, OPAQUE_BLACK, |b| b.capture_depth(near, far));
            report.passes.push(Pass::DepthCapture);
        }

        self.publish(backend, registry, projected, w, h);

        if let Some(name) = self.masks.debug_overlay.as_deref() {
            match TargetId::from_name(name).and_then(|id| self.pool.get(id)) {
                Some(target) => {
                    backend.draw_debug_overlay(target);
                    report.passes.push(Pass::DebugOverlay);
                }
                None => log::debug!(target: "pipeline", "no debug target named {name}"),
            }
        }

        self.frames += 1;
        Ok(report)
    }

    /// Frees every render target.
    pub fn teardown(&mut self, backend: &mut dyn RenderBackend) {
        self.pool.drain(backend);
        log::info!(target: "pipeline", "targets released after {} frames", self.frames);
    }

    fn acquire(
        &mut self,
        backend: &mut dyn RenderBackend,
        id: TargetId,
        w: i32,
        h: i32,
    ) -> Result<TargetHandle, PipelineError> {
        self.pool
            .acquire(backend, id, w, h)
            .ok_or(PipelineError::TargetCreation {
                target: id.name(),
                width: w,
                height: h,
            })
    }

    fn layer_pass(
        &mut self,
        backend: &mut dyn RenderBackend,
        params: &FrameParams,
        target: TargetHandle,
        layer: Layers,
    ) {
        let saved = backend.camera_layers();
        backend.set_camera_layers(layer);
        offscreen(backend, target, TRANSPARENT, |b| b.draw_scene(SceneKind::Main, params));
        backend.set_camera_layers(saved);
    }

    fn token_pass(
        &mut self,
        backend: &mut dyn RenderBackend,
        params: &FrameParams,
        target: TargetHandle,
    ) {
        let saved = backend.camera_layers();
        self.sprite_scratch.clear();
        backend.token_sprite_layers(&mut self.sprite_scratch);
        for &(sprite, layers) in &self.sprite_scratch {
            backend.set_sprite_layers(sprite, layers.with(Layers::TOKEN));
        }
        backend.set_camera_layers(Layers::TOKEN);
        let prepass = self.masks.token_depth_prepass;
        offscreen(backend, target, TRANSPARENT, |b| {
            if prepass {
                b.set_color_write(false);
                b.draw_scene(SceneKind::Main, params);
                b.set_color_write(true);
            }
            b.draw_scene(SceneKind::Main, params);
        });
        for &(sprite, layers) in &self.sprite_scratch {
            backend.set_sprite_layers(sprite, layers);
        }
        backend.set_camera_layers(saved);
    }

    fn publish(
        &self,
        backend: &dyn RenderBackend,
        registry: &mut dyn MaskRegistry,
        projected: bool,
        w: i32,
        h: i32,
    ) {
        let screen = |channels: &'static str| MaskMeta {
            space: MaskSpace::ScreenUv,
            channels,
            lifecycle: MaskLifecycle::PerFrame,
            width: w,
            height: h,
            uv_flip_y: true,
        };
        let mut entries = vec![(mask_ids::ROOF_ALPHA, TargetId::Roof, "a")];
        if self.masks.weather_roof {
            entries.push((mask_ids::WEATHER_ROOF_ALPHA, TargetId::WeatherRoof, "a"));
        }
        if self.masks.rope {
            entries.push((mask_ids::ROPE_MASK, TargetId::Rope, "a"));
        }
        if self.masks.token {
            entries.push((mask_ids::TOKEN_MASK, TargetId::Token, "a"));
        }
        if projected {
            entries.push((mask_ids::OUTDOORS, TargetId::OutdoorsScreen, "r"));
        }
        for (id, target, channels) in entries {
            if let Some(handle) = self.pool.get(target) {
                registry.set_texture(id, backend.texture(handle), screen(channels));
            }
        }
        if self.masks.depth_capture {
            if let Some(handle) = self.pool.get(TargetId::Depth) {
                registry.set_texture(
                    mask_ids::DEPTH,
                    backend.texture(handle),
                    MaskMeta {
                        space: MaskSpace::Device,
                        ..screen("r")
                    },
                );
            }
        }
    }
}

/// Draws into `target`, restoring the previous render target and clear colour.
fn offscreen(
    backend: &mut dyn RenderBackend,
    target: TargetHandle,
    clear: [f32; 4],
    draw: impl FnOnce(&mut dyn RenderBackend),
) {
    let prev_target = backend.render_target();
    let prev_clear = backend.clear_color();
    backend.set_render_target(Some(target));
    backend.set_clear_color(clear);
    backend.clear();
    draw(backend);
    backend.set_clear_color(prev_clear);
    backend.set_render_target(prev_target);
}

fn with_all_layers(backend: &mut dyn RenderBackend, draw: impl FnOnce(&mut dyn RenderBackend)) {
    let saved = backend.camera_layers();
    backend.set_camera_layers(Layers::ALL);
    draw(backend);
    backend.set_camera_layers(saved);
}
