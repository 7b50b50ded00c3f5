use serde_json::json;
use umbra_geom::Vec2;

use super::*;
use crate::config::DoorClosePolicy;
use crate::host::snap_center;

#[test]
fn dotted_keys_expand_and_merge() {
    let doc = LightDoc {
        id: "a".into(),
        config: LightConfig {
            dim: 300.0,
            bright: 100.0,
            ..Default::default()
        },
        ..Default::default()
    };
    let patched = apply_patch(
        &doc,
        &json!({"config.animation.type": "torch", "config.animation.speed": 7.0, "x": 10.0}),
    )
    .unwrap();
    assert_eq!(patched.config.animation.kind.as_deref(), Some("torch"));
    assert_eq!(patched.config.animation.speed, 7.0);
    assert_eq!(patched.config.dim, 300.0);
    assert_eq!(patched.x, 10.0);
}

#[test]
fn same_patch_twice_is_idempotent() {
    let doc = LightDoc::default();
    let changes = json!({"config": {"alpha": 0.8}, "config.color": "#ff8800"});
    let once = apply_patch(&doc, &changes).unwrap();
    let twice = apply_patch(&once, &changes).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn deletion_marker_removes_key() {
    let mut v = json!({"a": {"b": 1, "c": 2}});
    deep_merge(&mut v, &json!({"a": {"-=b": null}}));
    assert_eq!(v, json!({"a": {"c": 2}}));
}

#[test]
fn non_object_patch_is_rejected() {
    let doc = WallDoc::default();
    assert!(matches!(apply_patch(&doc, &json!(3)), Err(PatchError::NotAnObject)));
}

#[test]
fn bad_patch_leaves_document_unchanged() {
    let doc = WallDoc {
        id: "w".into(),
        ..Default::default()
    };
    assert!(apply_patch(&doc, &json!({"ds": "ajar"})).is_err());
    assert_eq!(doc.ds, DoorState::Closed);
}

#[test]
fn wall_patch_updates_door_state() {
    let doc = WallDoc {
        id: "w".into(),
        door: DoorKind::Door,
        ..Default::default()
    };
    let open = apply_patch(&doc, &json!({"ds": "open"})).unwrap();
    assert!(open.is_open());
    assert!(!doc.is_open());
}

#[test]
fn light_animation_names_resolve() {
    assert_eq!(LightAnimationKind::from_name("torch"), (LightAnimationKind::Torch, false));
    assert_eq!(
        LightAnimationKind::from_name("reactivepulse"),
        (LightAnimationKind::Pulse, true)
    );
    assert_eq!(
        LightAnimationKind::from_name("witchwave").0,
        LightAnimationKind::BewitchingWave
    );
    assert_eq!(LightAnimationKind::from_name("bogus").0, LightAnimationKind::None);
    for (i, k) in LightAnimationKind::ALL.iter().enumerate() {
        assert_eq!(k.code(), i as i32);
        assert_eq!(LightAnimationKind::from_name(k.name()).0, *k);
    }
}

#[test]
fn darkness_animation_names_resolve() {
    assert_eq!(
        DarknessAnimationKind::from_name("magicalGloom"),
        DarknessAnimationKind::MagicalGloom
    );
    assert_eq!(DarknessAnimationKind::from_name("denseSmoke").code(), 4);
    assert_eq!(DarknessAnimationKind::from_name("torch"), DarknessAnimationKind::None);
}

#[test]
fn config_defaults_fill_missing_fields() {
    let cfg = EngineConfig::from_toml_str(
        r#"
        [lighting]
        wall_inset_px = 10.0
        zoomed_padding_px = 4.0

        [movement]
        heuristic_weight = 9.0
        door_close_policy = "never"
        "#,
    )
    .unwrap();
    assert_eq!(cfg.lighting.effective_inset(), 6.0);
    assert_eq!(cfg.lighting.circle_segments, 128);
    assert_eq!(cfg.movement.heuristic_weight, 4.0);
    assert_eq!(cfg.movement.door_close_policy, DoorClosePolicy::Never);
    assert_eq!(cfg.movement.wait_for_open_ms, 1200);
    assert_eq!(cfg.visibility.hidden_opacity, 0.5);
}

#[test]
fn config_rejects_bad_toml() {
    assert!(matches!(
        EngineConfig::from_toml_str("[lighting\nx=1"),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn door_poll_interval_is_clamped() {
    let mut m = config::MovementConfig::default();
    m.poll_interval_ms = 1;
    assert_eq!(m.door_poll_ms(), 10);
    m.poll_interval_ms = 5000;
    assert_eq!(m.door_poll_ms(), 250);
}

#[test]
fn close_policy_matrix() {
    assert!(DoorClosePolicy::Always.should_close(true));
    assert!(DoorClosePolicy::OutOfCombatOnly.should_close(false));
    assert!(!DoorClosePolicy::OutOfCombatOnly.should_close(true));
    assert!(DoorClosePolicy::CombatOnly.should_close(true));
    assert!(!DoorClosePolicy::Never.should_close(false));
}

#[test]
fn hook_bus_delivers_in_order_and_off_detaches() {
    use std::cell::RefCell;
    use std::rc::Rc;

    let mut bus = HookBus::new();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let s = seen.clone();
    let id = bus.on(HookKind::SightRefresh, move |e| s.borrow_mut().push(e.kind()));
    bus.emit(HookEvent::SightRefresh);
    bus.emit(HookEvent::LightingRefresh);
    bus.emit(HookEvent::SightRefresh);
    let drained = bus.drain();
    assert_eq!(drained.len(), 3);
    assert_eq!(drained[1], HookEvent::LightingRefresh);
    assert_eq!(seen.borrow().len(), 2);
    assert!(bus.off(id));
    assert!(!bus.off(id));
    bus.emit(HookEvent::SightRefresh);
    bus.drain();
    assert_eq!(seen.borrow().len(), 2);
    assert_eq!(bus.pending(), 0);
}

#[test]
fn square_snap_hits_cell_centers() {
    let g = GridInfo::default();
    assert_eq!(snap_center(&g, Vec2::new(130.0, 290.0)), Vec2::new(150.0, 250.0));
    let gridless = GridInfo {
        kind: GridKind::Gridless,
        ..g
    };
    assert_eq!(snap_center(&gridless, Vec2::new(13.0, 29.0)), Vec2::new(13.0, 29.0));
}

#[test]
fn light_radius_and_colour_fallback() {
    let cfg = LightConfig {
        dim: 40.0,
        bright: 80.0,
        color: Some("not-a-colour".into()),
        ..Default::default()
    };
    assert_eq!(cfg.radius(), 80.0);
    assert_eq!(cfg.rgb(), Rgb::WHITE);
}

#[test]
fn environment_darkness_is_sanitised() {
    let env = Environment {
        darkness_level: f32::NAN,
        ..Default::default()
    };
    assert_eq!(env.darkness(), 0.0);
    let env = Environment {
        darkness_level: 3.0,
        ..Default::default()
    };
    assert_eq!(env.darkness(), 1.0);
}
