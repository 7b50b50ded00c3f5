//! Darkness modulators. Signature:
//! `float dark*(vec2 p, float r, float ti)` returning a multiplier for the mask.

use umbra_scene::DarknessAnimationKind;

pub struct DarknessChunk {
    pub kind: DarknessAnimationKind,
    pub function: &'static str,
    pub source: &'static str,
}

// Projects onto the unit disc with its own falloff; the light chunk library
// has no equivalent helper.
pub const MAGICAL_GLOOM: &str = r#"
vec2 gloomPolar(vec2 p) {
    float d = length(p);
    return vec2(atan(p.y, p.x) / TWO_PI + 0.5, pow(d, 0.75));
}

float darkMagicalGloom(vec2 p, float r, float ti) {
    vec2 pol = gloomPolar(p);
    float ring = 0.5 + 0.5 * sin(pol.y * 18.0 - uTime * 2.5);
    float n = fbm(vec2(pol.x * 8.0, pol.y * 4.0 - uTime * 0.3) + uSeed * 11.0, 4);
    float contrast = mix(0.85, 1.0, uGlobalDarknessLevel);
    return mix(1.0, contrast * (0.55 + 0.35 * ring + 0.3 * n), ti);
}
"#;

pub const ROILING: &str = r#"
float darkRoiling(vec2 p, float r, float ti) {
    float n = fbm3(vec3(p * 3.0, uTime * 0.35 + uSeed * 7.0), 5);
    return mix(1.0, 0.35 + 0.9 * n, ti);
}
"#;

pub const HOLE: &str = r#"
float darkHole(vec2 p, float r, float ti) {
    float core = 1.0 - smoothstep(0.0, 0.85, r);
    float breathe = 0.9 + 0.1 * sin(uTime * 1.3 + uSeed * TWO_PI);
    return mix(1.0, clamp(0.4 + core * 1.2 * breathe, 0.0, 1.5), ti);
}
"#;

pub const DENSE_SMOKE: &str = r#"
float darkDenseSmoke(vec2 p, float r, float ti) {
    float a = fbm(p * 2.0 + vec2(uTime * 0.10, uTime * 0.05) + uSeed * 3.0, 5);
    float b = fbm(p * 4.5 - vec2(uTime * 0.18, -uTime * 0.07) + uSeed * 9.0, 4);
    float layered = smoothstep(0.25, 0.75, 0.6 * a + 0.4 * b);
    return mix(1.0, 0.5 + 0.7 * layered, ti);
}
"#;

pub const DARKNESS_CHUNKS: [DarknessChunk; 4] = [
    DarknessChunk { kind: DarknessAnimationKind::MagicalGloom, function: "darkMagicalGloom", source: MAGICAL_GLOOM },
    DarknessChunk { kind: DarknessAnimationKind::Roiling, function: "darkRoiling", source: ROILING },
    DarknessChunk { kind: DarknessAnimationKind::Hole, function: "darkHole", source: HOLE },
    DarknessChunk { kind: DarknessAnimationKind::DenseSmoke, function: "darkDenseSmoke", source: DENSE_SMOKE },
];

pub fn dispatch() -> String {
    let mut s = String::new();
    for (i, c) in DARKNESS_CHUNKS.iter().enumerate() {
        let kw = if i == 0 { "if" } else { "else if" };
        s.push_str(&format!(
            "    {} (uAnimType == {}) modulator = {}(p, r, ti);\n",
            kw,
            c.kind.code(),
            c.function
        ));
    }
    s
}
