use umbra_scene::{DarknessAnimationKind, LightAnimationKind};

use super::*;
use crate::chunks::{darkness, light};

fn balanced(src: &str) -> bool {
    let mut depth = 0i32;
    for c in src.chars() {
        match c {
            '{' | '(' => depth += 1,
            '}' | ')' => depth -= 1,
            _ => {}
        }
        if depth < 0 {
            return false;
        }
    }
    depth == 0
}

#[test]
fn every_light_kind_has_a_dispatch_branch() {
    let fs = light_program().fragment;
    for kind in LightAnimationKind::ALL.iter().skip(1) {
        let needle = format!("uAnimType == {})", kind.code());
        assert!(fs.contains(&needle), "missing branch for {:?}", kind);
    }
    assert_eq!(light::LIGHT_CHUNKS.len(), LightAnimationKind::ALL.len() - 1);
}

#[test]
fn every_darkness_kind_has_a_dispatch_branch() {
    let fs = darkness_program().fragment;
    for kind in DarknessAnimationKind::ALL.iter().skip(1) {
        assert!(fs.contains(&format!("uAnimType == {})", kind.code())));
    }
    assert_eq!(darkness::DARKNESS_CHUNKS.len(), 4);
}

#[test]
fn chunk_functions_are_defined_once() {
    let fs = light_program().fragment;
    for c in light::LIGHT_CHUNKS.iter() {
        let def = format!("void {}(", c.function);
        assert_eq!(fs.matches(&def).count(), 1, "{}", c.function);
    }
}

#[test]
fn programs_are_versioned_and_balanced() {
    for src in [
        light_program(),
        darkness_program(),
        composite_program(),
        mask_pack_program(),
        outdoors_projection_program(),
    ] {
        assert!(src.fragment.starts_with("#version 330"));
        assert!(balanced(&src.fragment));
        if let Some(vs) = src.vertex {
            assert!(vs.starts_with("#version 330"));
            assert!(balanced(&vs));
        }
    }
}

#[test]
fn composite_declares_every_sampler() {
    let fs = composite_program().fragment;
    for name in [
        uniforms::T_DIFFUSE,
        uniforms::T_LIGHT,
        uniforms::T_DARKNESS,
        uniforms::T_MASKS,
        uniforms::T_WINDOW_LIGHT,
        uniforms::T_CLOUD_TOP,
    ]
    .into_iter()
    .chain(uniforms::T_SHADOWS)
    {
        assert!(fs.contains(&format!("uniform sampler2D {};", name)), "{}", name);
    }
}

#[test]
fn light_program_declares_bound_uniforms() {
    let src = light_program();
    let vs = src.vertex.unwrap_or_default();
    for name in [uniforms::CENTER, uniforms::MESH_RADIUS] {
        assert!(vs.contains(name));
    }
    for name in [
        uniforms::COLOR,
        uniforms::RADIUS,
        uniforms::BRIGHT_RADIUS,
        uniforms::ALPHA,
        uniforms::ATTENUATION,
        uniforms::TIME,
        uniforms::ANIM_TYPE,
        uniforms::INTENSITY,
        uniforms::SEED,
        uniforms::MASTER_INTENSITY,
        uniforms::PULSE,
        uniforms::BRIGHTNESS,
    ] {
        assert!(src.fragment.contains(name), "{}", name);
    }
}

#[test]
fn mask_pack_channel_order() {
    let fs = mask_pack_program().fragment;
    let o = fs.find("outdoors,").unwrap_or(usize::MAX);
    let rope = fs.find("texture(tRope").unwrap_or(usize::MAX);
    let token = fs.find("texture(tToken").unwrap_or(usize::MAX);
    let roof = fs.find("texture(tRoof, uv).a").unwrap_or(usize::MAX);
    assert!(o < rope && rope < token && token < roof);
}
