use hashbrown::HashMap;
use umbra_composite::{FrameInfo, FrameParams, TextureBindings};
use umbra_scene::config::MaskConfig;
use umbra_scene::{EngineConfig, Environment, MaskMeta, MaskRegistry, TextureRef, mask_ids};

use crate::*;

#[derive(Clone, Debug, PartialEq)]
enum Call {
    Create(TargetDesc),
    Destroy(TargetHandle),
    Target(Option<TargetHandle>),
    Clear([f32; 4]),
    ColorWrite(bool),
    Draw(SceneKind, Layers),
    Pack(bool),
    Project,
    Composite,
    Depth,
    Overlay(TargetHandle),
}

struct Recorder {
    ready: bool,
    size: (i32, i32),
    next: u32,
    target: Option<TargetHandle>,
    clear: [f32; 4],
    camera: Layers,
    sprites: Vec<(SpriteId, Layers)>,
    has_outdoors: bool,
    calls: Vec<Call>,
    /// Sprite layers seen by each `Main` draw.
    sprite_snapshots: Vec<Vec<Layers>>,
}

impl Recorder {
    fn new(w: i32, h: i32) -> Self {
        Self {
            ready: true,
            size: (w, h),
            next: 0,
            target: None,
            clear: [0.2, 0.2, 0.2, 1.0],
            camera: Layers::BASE | Layers::ROOF,
            sprites: vec![(SpriteId(1), Layers::BASE), (SpriteId(2), Layers::BASE)],
            has_outdoors: true,
            calls: Vec::new(),
            sprite_snapshots: Vec::new(),
        }
    }

    fn draws(&self) -> Vec<(SceneKind, Layers)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Draw(k, l) => Some((*k, *l)),
                _ => None,
            })
            .collect()
    }

    fn creates(&self) -> Vec<TargetDesc> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Create(d) => Some(*d),
                _ => None,
            })
            .collect()
    }
}

impl RenderBackend for Recorder {
    fn is_ready(&self) -> bool {
        self.ready
    }
    fn drawing_buffer_size(&self) -> (i32, i32) {
        self.size
    }
    fn create_target(&mut self, desc: TargetDesc) -> Option<TargetHandle> {
        self.next += 1;
        self.calls.push(Call::Create(desc));
        Some(TargetHandle(self.next))
    }
    fn destroy_target(&mut self, target: TargetHandle) {
        self.calls.push(Call::Destroy(target));
    }
    fn texture(&self, target: TargetHandle) -> TextureRef {
        TextureRef {
            id: target.0,
            width: self.size.0,
            height: self.size.1,
        }
    }
    fn render_target(&self) -> Option<TargetHandle> {
        self.target
    }
    fn set_render_target(&mut self, target: Option<TargetHandle>) {
        self.target = target;
        self.calls.push(Call::Target(target));
    }
    fn clear_color(&self) -> [f32; 4] {
        self.clear
    }
    fn set_clear_color(&mut self, color: [f32; 4]) {
        self.clear = color;
    }
    fn clear(&mut self) {
        self.calls.push(Call::Clear(self.clear));
    }
    fn set_color_write(&mut self, enabled: bool) {
        self.calls.push(Call::ColorWrite(enabled));
    }
    fn camera_layers(&self) -> Layers {
        self.camera
    }
    fn set_camera_layers(&mut self, layers: Layers) {
        self.camera = layers;
    }
    fn token_sprite_layers(&self, out: &mut Vec<(SpriteId, Layers)>) {
        out.extend_from_slice(&self.sprites);
    }
    fn set_sprite_layers(&mut self, sprite: SpriteId, layers: Layers) {
        if let Some(s) = self.sprites.iter_mut().find(|(id, _)| *id == sprite) {
            s.1 = layers;
        }
    }
    fn draw_scene(&mut self, scene: SceneKind, _params: &FrameParams) {
        self.calls.push(Call::Draw(scene, self.camera));
        if scene == SceneKind::Main {
            self.sprite_snapshots
                .push(self.sprites.iter().map(|(_, l)| *l).collect());
        }
    }
    fn draw_mask_pack(&mut self, inputs: &MaskPackInputs) {
        self.calls.push(Call::Pack(inputs.outdoors.is_some()));
    }
    fn draw_outdoors_projection(&mut self) -> bool {
        self.calls.push(Call::Project);
        self.has_outdoors
    }
    fn draw_composite(&mut self, _inputs: &CompositeInputs, _params: &FrameParams) {
        self.calls.push(Call::Composite);
    }
    fn draw_debug_overlay(&mut self, target: TargetHandle) {
        self.calls.push(Call::Overlay(target));
    }
    fn capture_depth(&mut self, _near_pad: f32, _far_pad: f32) {
        self.calls.push(Call::Depth);
    }
}

#[derive(Default)]
struct Registry(HashMap<String, (TextureRef, MaskMeta)>);

impl MaskRegistry for Registry {
    fn set_texture(&mut self, id: &str, texture: TextureRef, meta: MaskMeta) {
        self.0.insert(id.to_string(), (texture, meta));
    }
}

fn params(w: i32, h: i32) -> FrameParams {
    FrameParams::snapshot(
        &Environment::default(),
        &EngineConfig::default(),
        FrameInfo {
            frame: 0,
            width: w,
            height: h,
            elapsed_ms: 0.0,
        },
        TextureBindings::default(),
    )
}

fn run(pipe: &mut FramePipeline, be: &mut Recorder) -> FrameReport {
    let p = params(be.size.0, be.size.1);
    let mut reg = Registry::default();
    match pipe.render_frame(be, &p, &ExternalTextures::default(), &mut reg) {
        Ok(r) => r,
        Err(e) => panic!("frame failed: {e}"),
    }
}

#[test]
fn pass_order_is_fixed() {
    let mut be = Recorder::new(320, 200);
    let mut pipe = FramePipeline::new(MaskConfig::default());
    let report = run(&mut pipe, &mut be);
    assert_eq!(
        report.passes,
        vec![
            Pass::RoofMask,
            Pass::WeatherRoofMask,
            Pass::RopeMask,
            Pass::TokenMask,
            Pass::OutdoorsProjection,
            Pass::MaskPack,
            Pass::LightAccumulate,
            Pass::DarknessAccumulate,
            Pass::Composite,
        ]
    );
    let draws = be.draws();
    assert_eq!(draws[0], (SceneKind::Main, Layers::ROOF));
    assert_eq!(draws[1], (SceneKind::Main, Layers::WEATHER_ROOF));
    assert_eq!(draws[2], (SceneKind::Main, Layers::ROPE));
    // Depth prepass then colour pass.
    assert_eq!(draws[3], (SceneKind::Main, Layers::TOKEN));
    assert_eq!(draws[4], (SceneKind::Main, Layers::TOKEN));
    assert_eq!(draws[5], (SceneKind::Lights, Layers::ALL));
    assert_eq!(draws[6], (SceneKind::Darkness, Layers::ALL));
    assert_eq!(draws[7].0, SceneKind::Main);
    assert!(!draws[7].1.intersects(Layers::TOKEN | Layers::ROPE));
}

#[test]
fn token_prepass_disables_colour_writes() {
    let mut be = Recorder::new(64, 64);
    let mut pipe = FramePipeline::new(MaskConfig::default());
    run(&mut pipe, &mut be);
    let writes: Vec<_> = be
        .calls
        .iter()
        .filter(|c| matches!(c, Call::ColorWrite(_)))
        .cloned()
        .collect();
    assert_eq!(writes, vec![Call::ColorWrite(false), Call::ColorWrite(true)]);

    let mut be = Recorder::new(64, 64);
    let mut pipe = FramePipeline::new(MaskConfig {
        token_depth_prepass: false,
        ..MaskConfig::default()
    });
    run(&mut pipe, &mut be);
    assert!(!be.calls.iter().any(|c| matches!(c, Call::ColorWrite(_))));
}

#[test]
fn camera_layers_and_target_restored() {
    let mut be = Recorder::new(128, 96);
    let before = be.camera;
    let clear = be.clear;
    let mut pipe = FramePipeline::new(MaskConfig::default());
    run(&mut pipe, &mut be);
    assert_eq!(be.camera, before);
    assert_eq!(be.clear, clear);
    assert_eq!(be.target, None);
}

#[test]
fn sprite_layers_enabled_only_for_token_pass() {
    let mut be = Recorder::new(64, 64);
    let mut pipe = FramePipeline::new(MaskConfig::default());
    run(&mut pipe, &mut be);
    assert_eq!(be.sprites[0].1, Layers::BASE);
    assert_eq!(be.sprites[1].1, Layers::BASE);
    // Main draws: roof, weather, rope, token x2, diffuse.
    let snaps = &be.sprite_snapshots;
    assert_eq!(snaps.len(), 6);
    assert!(snaps[3].iter().all(|l| l.contains(Layers::TOKEN)));
    assert!(snaps[4].iter().all(|l| l.contains(Layers::TOKEN)));
    assert!(snaps[0].iter().all(|l| !l.contains(Layers::TOKEN)));
    assert!(snaps[5].iter().all(|l| !l.contains(Layers::TOKEN)));
}

#[test]
fn mask_passes_clear_transparent_accumulators_opaque() {
    let mut be = Recorder::new(64, 64);
    let mut pipe = FramePipeline::new(MaskConfig::default());
    run(&mut pipe, &mut be);
    let clears: Vec<[f32; 4]> = be
        .calls
        .iter()
        .filter_map(|c| match c {
            Call::Clear(c) => Some(*c),
            _ => None,
        })
        .collect();
    // roof, weather, rope, token, pack, projection are transparent.
    assert!(clears[..6].iter().all(|c| *c == [0.0; 4]));
    assert_eq!(clears[6], [0.0, 0.0, 0.0, 1.0]);
    assert_eq!(clears[7], [0.0, 0.0, 0.0, 1.0]);
}

#[test]
fn targets_match_drawing_buffer_and_resize_lazily() {
    let mut be = Recorder::new(300, 200);
    let mut pipe = FramePipeline::new(MaskConfig::default());
    run(&mut pipe, &mut be);
    let first = be.creates();
    assert_eq!(first.len(), 9);
    assert!(first.iter().all(|d| d.width == 300 && d.height == 200));
    let light = first
        .iter()
        .filter(|d| d.format == TargetFormat::Rgba16F)
        .count();
    assert_eq!(light, 1);

    be.calls.clear();
    run(&mut pipe, &mut be);
    assert!(be.creates().is_empty());

    be.calls.clear();
    be.size = (640, 480);
    run(&mut pipe, &mut be);
    let resized = be.creates();
    assert_eq!(resized.len(), 9);
    assert!(resized.iter().all(|d| d.width == 640 && d.height == 480));
    assert_eq!(pipe.pool().desc(TargetId::Light).map(|d| d.width), Some(640));
}

#[test]
fn pool_recycles_released_sizes() {
    let mut be = Recorder::new(100, 100);
    let mut pipe = FramePipeline::new(MaskConfig::default());
    run(&mut pipe, &mut be);
    be.size = (200, 100);
    run(&mut pipe, &mut be);
    be.size = (100, 100);
    be.calls.clear();
    run(&mut pipe, &mut be);
    assert!(be.creates().is_empty());
    assert_eq!(pipe.pool().created_count(), 18);
}

#[test]
fn teardown_destroys_every_target() {
    let mut be = Recorder::new(100, 100);
    let mut pipe = FramePipeline::new(MaskConfig::default());
    run(&mut pipe, &mut be);
    be.size = (50, 50);
    run(&mut pipe, &mut be);
    be.calls.clear();
    pipe.teardown(&mut be);
    let destroyed = be
        .calls
        .iter()
        .filter(|c| matches!(c, Call::Destroy(_)))
        .count();
    assert_eq!(destroyed, 18);
    assert_eq!(pipe.pool().live_count(), 0);
}

#[test]
fn pack_samples_this_frames_outdoors_projection() {
    let mut be = Recorder::new(64, 64);
    let mut pipe = FramePipeline::new(MaskConfig::default());
    let first = run(&mut pipe, &mut be);
    assert!(first.outdoors_bound);
    let project = be.calls.iter().position(|c| *c == Call::Project);
    let pack = be.calls.iter().position(|c| *c == Call::Pack(true));
    assert!(matches!((project, pack), (Some(a), Some(b)) if a < b));

    // Losing the outdoors texture unbinds the channel in the same frame.
    be.has_outdoors = false;
    be.calls.clear();
    let second = run(&mut pipe, &mut be);
    assert!(!second.outdoors_bound);
    assert!(be.calls.contains(&Call::Pack(false)));
}

#[test]
fn disabled_passes_are_skipped() {
    let mut be = Recorder::new(64, 64);
    let mut pipe = FramePipeline::new(MaskConfig {
        weather_roof: false,
        rope: false,
        token: false,
        ..MaskConfig::default()
    });
    let report = run(&mut pipe, &mut be);
    assert_eq!(report.passes[0], Pass::RoofMask);
    assert_eq!(report.passes[1], Pass::OutdoorsProjection);
    assert_eq!(report.passes[2], Pass::MaskPack);
    assert!(!report.passes.contains(&Pass::TokenMask));
}

#[test]
fn depth_and_overlay_follow_composite() {
    let mut be = Recorder::new(64, 64);
    let mut pipe = FramePipeline::new(MaskConfig {
        depth_capture: true,
        debug_overlay: Some("light".into()),
        ..MaskConfig::default()
    });
    let report = run(&mut pipe, &mut be);
    let n = report.passes.len();
    assert_eq!(report.passes[n - 3], Pass::Composite);
    assert_eq!(report.passes[n - 2], Pass::DepthCapture);
    assert_eq!(report.passes[n - 1], Pass::DebugOverlay);
    let light = pipe.target(TargetId::Light);
    assert!(light.is_some());
    assert!(be.calls.iter().any(|c| Some(c) == light.map(Call::Overlay).as_ref()));
}

#[test]
fn unknown_overlay_is_ignored() {
    let mut be = Recorder::new(64, 64);
    let mut pipe = FramePipeline::new(MaskConfig {
        debug_overlay: Some("nope".into()),
        ..MaskConfig::default()
    });
    let report = run(&mut pipe, &mut be);
    assert_eq!(report.passes.last(), Some(&Pass::Composite));
}

#[test]
fn masks_published_to_registry() {
    let mut be = Recorder::new(80, 60);
    let mut pipe = FramePipeline::new(MaskConfig {
        depth_capture: true,
        ..MaskConfig::default()
    });
    let p = params(80, 60);
    let mut reg = Registry::default();
    let ext = ExternalTextures::default();
    assert!(pipe.render_frame(&mut be, &p, &ext, &mut reg).is_ok());
    for id in [
        mask_ids::ROOF_ALPHA,
        mask_ids::WEATHER_ROOF_ALPHA,
        mask_ids::ROPE_MASK,
        mask_ids::TOKEN_MASK,
        mask_ids::OUTDOORS,
        mask_ids::DEPTH,
    ] {
        let (tex, meta) = reg.0.get(id).copied().unwrap_or_else(|| panic!("{id} missing"));
        assert_eq!((tex.width, tex.height), (80, 60));
        assert_eq!((meta.width, meta.height), (80, 60));
    }
    assert_eq!(reg.0[mask_ids::OUTDOORS].1.channels, "r");
}

#[test]
fn missing_renderer_errors_every_frame() {
    let mut be = Recorder::new(64, 64);
    be.ready = false;
    let mut pipe = FramePipeline::new(MaskConfig::default());
    let p = params(64, 64);
    let mut reg = Registry::default();
    let ext = ExternalTextures::default();
    for _ in 0..3 {
        let err = pipe.render_frame(&mut be, &p, &ext, &mut reg);
        assert_eq!(
            err.map_err(|e| e.reason()),
            Err("missing-collaborator")
        );
    }
    assert!(be.calls.is_empty());
    assert_eq!(pipe.frames(), 0);
}

#[test]
fn layer_mask_ops() {
    let l = Layers::BASE | Layers::ROOF;
    assert!(l.contains(Layers::ROOF));
    assert!(!l.contains(Layers::ROOF | Layers::ROPE));
    assert_eq!(l.without(Layers::ROOF), Layers::BASE);
    assert!(Layers::ALL.contains(l));
    assert_eq!(TargetId::from_name("Weather-Roof"), Some(TargetId::WeatherRoof));
}
