use serde_json::json;
use umbra_geom::{Vec2, polygon};
use umbra_scene::config::LightingConfig;
use umbra_scene::{
    Environment, GridInfo, HookEvent, LightAnimation, LightConfig, LightDoc, SceneDimensions,
    SceneHost, TileDoc, TokenDoc, WallDoc,
};

use super::*;

#[derive(Default)]
struct FakeHost {
    lights: Vec<LightDoc>,
    los: hashbrown::HashMap<String, Vec<f32>>,
}

impl SceneHost for FakeHost {
    fn grid(&self) -> GridInfo {
        GridInfo::default()
    }
    fn dimensions(&self) -> SceneDimensions {
        SceneDimensions {
            width: 2000.0,
            height: 1000.0,
            scene_width: 2000.0,
            scene_height: 1000.0,
            distance: 5.0,
            size: 100.0,
            ..Default::default()
        }
    }
    fn environment(&self) -> Environment {
        Environment::default()
    }
    fn lights(&self) -> Vec<LightDoc> {
        self.lights.clone()
    }
    fn walls(&self) -> Vec<WallDoc> {
        Vec::new()
    }
    fn tokens(&self) -> Vec<TokenDoc> {
        Vec::new()
    }
    fn tiles(&self) -> Vec<TileDoc> {
        Vec::new()
    }
    fn light_los(&self, id: &str) -> Option<Vec<f32>> {
        self.los.get(id).cloned()
    }
    fn door_revision(&self) -> u64 {
        0
    }
}

fn light(id: &str, x: f32, y: f32, dim: f32, bright: f32) -> LightDoc {
    LightDoc {
        id: id.into(),
        x,
        y,
        config: LightConfig {
            dim,
            bright,
            color: Some("#ffb366".into()),
            animation: LightAnimation {
                kind: Some("torch".into()),
                ..Default::default()
            },
            ..Default::default()
        },
        ..Default::default()
    }
}

fn square_los(cx: f32, cy: f32, h: f32) -> Vec<f32> {
    vec![cx - h, cy - h, cx + h, cy - h, cx + h, cy + h, cx - h, cy + h]
}

#[test]
fn attenuation_curve_endpoints() {
    assert!(attenuation_curve(0.0).abs() < 1e-6);
    assert!((attenuation_curve(1.0) - 1.0).abs() < 1e-6);
    assert!((attenuation_curve(0.5) - ((std::f32::consts::PI * 0.5f32.powf(1.5)).cos() - 1.0) / -2.0).abs() < 1e-6);
}

#[test]
fn brightness_bonus_needs_saturation() {
    assert!((brightness_for(0.5, umbra_scene::Rgb::WHITE) - 1.95).abs() < 1e-6);
    let warm = umbra_scene::Rgb::new(1.0, 0.7, 0.4);
    assert!((brightness_for(0.5, warm) - 2.2).abs() < 1e-6);
    assert!((brightness_for(0.0, umbra_scene::Rgb::WHITE) - 1.2).abs() < 1e-6);
}

#[test]
fn zero_radius_builds_no_mesh() {
    let input = GeometryInput {
        center: Vec2::new(10.0, 10.0),
        radius: 0.0,
        los: None,
        inset: 6.0,
        segments: 128,
        scene_height: 100.0,
        padding: 0.0,
    };
    assert!(build_geometry(&input).is_none());
}

#[test]
fn missing_los_falls_back_to_circle() {
    let input = GeometryInput {
        center: Vec2::new(100.0, 100.0),
        radius: 50.0,
        los: None,
        inset: 6.0,
        segments: 128,
        scene_height: 1000.0,
        padding: 0.0,
    };
    let g = build_geometry(&input).unwrap();
    assert!(g.fallback);
    assert_eq!(g.ring.len(), 128);
    assert_eq!(g.center, Vec2::new(100.0, 900.0));
    assert_eq!(g.triangle_count(), 128);
}

#[test]
fn los_polygon_is_flipped_and_inset() {
    let input = GeometryInput {
        center: Vec2::new(500.0, 500.0),
        radius: 300.0,
        los: Some(square_los(500.0, 500.0, 100.0)),
        inset: 10.0,
        segments: 128,
        scene_height: 1000.0,
        padding: 0.0,
    };
    let g = build_geometry(&input).unwrap();
    assert!(!g.fallback);
    assert_eq!(g.ring.len(), 4);
    assert!(polygon::signed_area(&g.ring) > 0.0);
    for p in &g.ring {
        assert!((p.x - 500.0).abs() <= 90.0 + 1e-3);
        assert!((p.y - 500.0).abs() <= 90.0 + 1e-3);
    }
}

#[test]
fn degenerate_los_uses_circle() {
    let input = GeometryInput {
        center: Vec2::new(0.0, 0.0),
        radius: 20.0,
        los: Some(vec![1.0, 1.0, 1.0, 1.0]),
        inset: 0.0,
        segments: 16,
        scene_height: 100.0,
        padding: 0.0,
    };
    let g = build_geometry(&input).unwrap();
    assert!(g.fallback);
    assert_eq!(g.ring.len(), 16);
}

#[test]
fn registry_creates_light_and_upgrades_fallback() {
    let mut host = FakeHost::default();
    host.lights.push(light("a", 500.0, 500.0, 300.0, 100.0));
    let mut reg = SourceRegistry::new(LightingConfig::default(), 1000.0);
    reg.sync_from_host(&host);
    assert_eq!(reg.lights().len(), 1);
    assert!(reg.lights()[0].is_fallback());

    host.los.insert("a".into(), square_los(500.0, 500.0, 150.0));
    let stats = reg.upgrade_fallbacks(&host);
    assert_eq!(stats.rebuilt, 1);
    let l = reg.lights()[0];
    assert!(!l.is_fallback());
    assert_eq!(l.geometry().map(|g| g.ring.len()), Some(4));
}

#[test]
fn negative_flip_swaps_builder() {
    let host = FakeHost::default();
    let mut reg = SourceRegistry::new(LightingConfig::default(), 1000.0);
    reg.create(light("a", 100.0, 100.0, 50.0, 0.0));
    reg.rebuild_dirty(&host);
    assert_eq!(reg.lights().len(), 1);
    assert!(reg.darkness().is_empty());

    reg.update("a", &json!({"config.negative": true})).unwrap();
    assert!(reg.lights().is_empty());
    assert!(reg.darkness().is_empty(), "needs geometry before drawing");
    reg.rebuild_dirty(&host);
    assert_eq!(reg.darkness().len(), 1);
    assert!(reg.lights().is_empty());
    assert_eq!(reg.len(), 1);
}

#[test]
fn darkness_alpha_doubles_and_clamps() {
    let ctx = BuildContext::new(LightingConfig::default(), 1000.0);
    let mut doc = light("d", 0.0, 0.0, 100.0, 0.0);
    doc.config.negative = true;
    doc.config.alpha = 0.3;
    let b = DarknessSourceBuilder::new(doc.clone(), &ctx);
    assert!((b.uniforms().alpha - 0.6).abs() < 1e-6);
    doc.config.alpha = 0.8;
    let b = DarknessSourceBuilder::new(doc, &ctx);
    assert_eq!(b.uniforms().alpha, 1.0);
}

#[test]
fn darkness_border_distance_uses_padding() {
    let mut cfg = LightingConfig::default();
    cfg.darkness_padding_px = 25.0;
    let ctx = BuildContext::new(cfg, 1000.0);
    let mut doc = light("d", 0.0, 0.0, 100.0, 0.0);
    doc.config.negative = true;
    doc.config.animation.kind = Some("roiling".into());
    let b = DarknessSourceBuilder::new(doc, &ctx);
    assert!((b.uniforms().border_distance - 0.8).abs() < 1e-6);
    assert_eq!(b.uniforms().mesh_radius, 125.0);
    assert_eq!(b.kind(), umbra_scene::DarknessAnimationKind::Roiling);
}

#[test]
fn same_update_twice_is_idempotent() {
    let host = FakeHost::default();
    let mut reg = SourceRegistry::new(LightingConfig::default(), 1000.0);
    reg.create(light("a", 100.0, 100.0, 50.0, 10.0));
    reg.rebuild_dirty(&host);
    let changes = json!({"config.dim": 80.0, "config.animation.type": "wave"});
    reg.update("a", &changes).unwrap();
    reg.rebuild_dirty(&host);
    let (u1, g1) = {
        let l = reg.lights()[0];
        (*l.uniforms(), l.geometry().cloned())
    };
    reg.update("a", &changes).unwrap();
    reg.rebuild_dirty(&host);
    let l = reg.lights()[0];
    assert_eq!(*l.uniforms(), u1);
    assert_eq!(l.geometry().cloned(), g1);
    assert_eq!(u1.anim_type, umbra_scene::LightAnimationKind::Wave.code());
}

#[test]
fn update_for_unknown_source_reports_missing_document() {
    let mut reg = SourceRegistry::new(LightingConfig::default(), 1000.0);
    let err = reg.update("nope", &json!({})).unwrap_err();
    assert_eq!(err.reason(), "missing-document");
}

#[test]
fn wall_change_waits_for_lighting_refresh() {
    let mut host = FakeHost::default();
    host.los.insert("a".into(), square_los(500.0, 500.0, 100.0));
    let mut reg = SourceRegistry::new(LightingConfig::default(), 1000.0);
    reg.create(light("a", 500.0, 500.0, 300.0, 0.0));
    reg.rebuild_dirty(&host);
    let before = reg.lights()[0].geometry().cloned();

    host.los.insert("a".into(), square_los(500.0, 500.0, 60.0));
    reg.handle_event(&HookEvent::UpdateWall { id: "w".into(), changes: json!({}) }, &host);
    assert_eq!(reg.lights()[0].geometry().cloned(), before);
    reg.handle_event(&HookEvent::LightingRefresh, &host);
    assert_ne!(reg.lights()[0].geometry().cloned(), before);
}

#[test]
fn large_batches_rebuild_in_parallel() {
    let mut host = FakeHost::default();
    for i in 0..32 {
        host.lights.push(light(&format!("l{i:02}"), 50.0 * i as f32, 100.0, 40.0, 0.0));
    }
    let mut reg = SourceRegistry::new(LightingConfig::default(), 1000.0);
    for doc in host.lights() {
        reg.create(doc);
    }
    let stats = reg.rebuild_dirty(&host);
    assert!(stats.parallel);
    assert_eq!(stats.rebuilt, 32);
    assert_eq!(stats.fallbacks, 32);
    assert_eq!(reg.lights().len(), 32);
}

#[test]
fn torch_pulse_flickers_deterministically() {
    let ctx = BuildContext::new(LightingConfig::default(), 1000.0);
    let mut a = LightSourceBuilder::new(light("t", 0.0, 0.0, 10.0, 0.0), &ctx);
    let mut b = LightSourceBuilder::new(light("t", 0.0, 0.0, 10.0, 0.0), &ctx);
    let noise = SmoothNoise::default();
    let frame = FrameTime { elapsed_ms: 1234.0, dt_ms: 16.0 };
    a.tick(frame, &noise, 0.0);
    b.tick(frame, &noise, 0.0);
    assert_eq!(a.uniforms().pulse, b.uniforms().pulse);
    assert!((0.6..=1.0).contains(&a.uniforms().pulse));
    let expected = animation_time(5.0, 1234.0, seed_for("t"), false);
    assert_eq!(a.uniforms().time, expected);
}

#[test]
fn reactive_pulse_smooths_towards_level() {
    let mut desc = LightAnimation::default();
    desc.kind = Some("reactivepulse".into());
    let mut s = AnimationState::new(&desc, 0.0);
    assert!(s.reactive);
    let noise = SmoothNoise::default();
    s.advance(16.0, 16.0, &noise, 1.0);
    let first = s.amplitude();
    let expected = 1.0 - (-5.0f32 * 16.0 * 0.085).exp();
    assert!((first - expected).abs() < 1e-6);
    s.advance(32.0, 16.0, &noise, 1.0);
    assert!(s.amplitude() > first && s.amplitude() <= 1.0);
}

#[test]
fn smooth_noise_table_is_power_of_two() {
    let n = SmoothNoise::new(1.0, 1.0, 200, 7);
    assert_eq!(n.len(), 256);
    let a = n.generate(3.0);
    let b = n.generate(3.0 + 256.0);
    assert!((a - b).abs() < 1e-6);
}
