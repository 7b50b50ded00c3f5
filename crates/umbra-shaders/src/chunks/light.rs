//! Light animation chunks. Every chunk is a function with the signature
//! `void anim*(vec2 p, float r, float ti, inout vec3 col, inout float amul, inout float boost)`
//! where `p` is the local position in radius units, `r = length(p)` and `ti`
//! the animation intensity normalised to [0,1].

use umbra_scene::LightAnimationKind;

pub struct LightChunk {
    pub kind: LightAnimationKind,
    pub function: &'static str,
    pub source: &'static str,
}

pub const WAVE: &str = r#"
void animWave(vec2 p, float r, float ti, inout vec3 col, inout float amul, inout float boost) {
    float w = 0.5 + 0.5 * cos(r * 8.0 * TWO_PI - uTime * 6.0);
    amul *= mix(1.0, 0.35 + 0.65 * w, ti);
    boost = 1.0 + 0.25 * ti * w;
}
"#;

pub const FAIRY: &str = r#"
void animFairy(vec2 p, float r, float ti, inout vec3 col, inout float amul, inout float boost) {
    float n = fbm(p * 4.0 + vec2(uTime * 0.6, -uTime * 0.4) + uSeed * 17.0, 4);
    float sparkle = smoothstep(0.62, 0.8, noise2(p * 18.0 + uTime * 2.0 + uSeed * 31.0));
    vec3 tint = hsb2rgb(vec3(fract(n + uTime * 0.05), 0.45, 1.0));
    col = mix(col, tint, 0.5 * ti);
    amul *= mix(1.0, 0.6 + 0.4 * n + sparkle, ti);
}
"#;

pub const CHROMA: &str = r#"
void animChroma(vec2 p, float r, float ti, inout vec3 col, inout float amul, inout float boost) {
    vec3 hue = hsb2rgb(vec3(fract(uTime * 0.1 + uSeed), 1.0, 1.0));
    col = mix(col, hue, 0.8 * ti);
}
"#;

pub const ENERGY_FIELD: &str = r#"
void animEnergyField(vec2 p, float r, float ti, inout vec3 col, inout float amul, inout float boost) {
    float v = voronoi(p * 5.0 + uSeed * 7.0, uTime * 1.5);
    float edge = 1.0 - smoothstep(0.0, 0.18, abs(v - 0.5));
    col = mix(col, col * vec3(0.7, 0.9, 1.3), 0.5 * ti);
    amul *= mix(1.0, 0.45 + 0.9 * edge, ti);
    boost = 1.0 + 0.3 * ti * edge;
}
"#;

pub const BEWITCHING_WAVE: &str = r#"
void animBewitchingWave(vec2 p, float r, float ti, inout vec3 col, inout float amul, inout float boost) {
    float a = atan(p.y, p.x);
    float w = 0.5 + 0.5 * sin(r * 14.0 - uTime * 5.0 + sin(a * 3.0 + uTime) * 2.0);
    col = mix(col, col * vec3(1.1, 0.8, 1.2), 0.4 * ti);
    amul *= mix(1.0, 0.4 + 0.6 * w, ti);
}
"#;

pub const REVOLVING: &str = r#"
void animRevolving(vec2 p, float r, float ti, inout vec3 col, inout float amul, inout float boost) {
    float a = atan(p.y, p.x) + uTime * 2.0;
    float beam = pow(0.5 + 0.5 * cos(a), 6.0);
    amul *= mix(1.0, 0.25 + 0.75 * beam, ti);
    boost = 1.0 + 0.5 * ti * beam;
}
"#;

pub const SIREN: &str = r#"
void animSiren(vec2 p, float r, float ti, inout vec3 col, inout float amul, inout float boost) {
    float a = atan(p.y, p.x) + uTime * 4.0;
    float beams = pow(abs(cos(a)), 8.0);
    amul *= mix(1.0, 0.15 + 0.85 * beams, ti);
    boost = 1.0 + 0.6 * ti * beams;
}
"#;

pub const FOG: &str = r#"
void animFog(vec2 p, float r, float ti, inout vec3 col, inout float amul, inout float boost) {
    float n = fbm(p * 3.0 + vec2(uTime * 0.3, uTime * 0.15) + uSeed * 13.0, 5);
    amul *= mix(1.0, smoothstep(0.2, 0.8, n) * 1.3, ti);
}
"#;

pub const SUNBURST: &str = r#"
void animSunburst(vec2 p, float r, float ti, inout vec3 col, inout float amul, inout float boost) {
    float a = atan(p.y, p.x);
    float rays = 0.5 + 0.5 * cos(a * 12.0 + uTime * 1.5 + uSeed * TWO_PI);
    rays *= 1.0 - r;
    amul *= mix(1.0, 0.6 + 0.8 * rays, ti);
    boost = 1.0 + 0.4 * ti * rays;
}
"#;

pub const DOME: &str = r#"
void animDome(vec2 p, float r, float ti, inout vec3 col, inout float amul, inout float boost) {
    float shell = sqrt(max(0.0, 1.0 - r * r));
    float rings = 0.5 + 0.5 * cos(shell * 10.0 - uTime * 2.0);
    amul *= mix(1.0, 0.5 + 0.5 * mix(shell, rings, 0.5), ti);
}
"#;

pub const EMANATION: &str = r#"
void animEmanation(vec2 p, float r, float ti, inout vec3 col, inout float amul, inout float boost) {
    float a = atan(p.y, p.x);
    float rays = 0.5 + 0.5 * cos(a * 7.0 + sin(r * 6.0 - uTime * 3.0));
    float pulse = 0.5 + 0.5 * cos(r * 10.0 - uTime * 4.0);
    amul *= mix(1.0, 0.4 + 0.6 * rays * pulse + 0.2, ti);
}
"#;

pub const HEXA_DOME: &str = r#"
void animHexaDome(vec2 p, float r, float ti, inout vec3 col, inout float amul, inout float boost) {
    vec4 h = hexCoords(p * 6.0);
    float d = hexDist(h.xy);
    float edge = smoothstep(0.38, 0.5, d);
    float flicker = 0.5 + 0.5 * sin(uTime * 3.0 + hash12(h.zw + uSeed) * TWO_PI);
    float shell = sqrt(max(0.0, 1.0 - r * r));
    amul *= mix(1.0, 0.3 + edge * (0.7 + 0.5 * flicker) * (0.5 + 0.5 * shell), ti);
    boost = 1.0 + 0.3 * ti * edge;
}
"#;

pub const GHOST: &str = r#"
void animGhost(vec2 p, float r, float ti, inout vec3 col, inout float amul, inout float boost) {
    vec2 q = p * 2.5 + vec2(fbm(p * 2.0 + uTime * 0.2, 3), fbm(p * 2.0 - uTime * 0.2, 3));
    float n = fbm(q + uSeed * 5.0, 4);
    float flicker = 0.75 + 0.25 * sin(uTime * 7.0 + uSeed * 11.0);
    col = mix(col, vec3(0.75, 0.9, 1.0) * perceivedBrightness(col) * 1.4, 0.3 * ti);
    amul *= mix(1.0, smoothstep(0.25, 0.75, n) * flicker * 1.4, ti);
}
"#;

pub const VORTEX: &str = r#"
void animVortex(vec2 p, float r, float ti, inout vec3 col, inout float amul, inout float boost) {
    float a = atan(p.y, p.x) + uTime * 1.2 + (1.0 - r) * 6.0;
    vec2 q = vec2(cos(a), sin(a)) * r;
    float n = fbm(q * 4.0 + uSeed * 9.0, 4);
    amul *= mix(1.0, 0.4 + 1.0 * n, ti);
}
"#;

pub const SWIRLING_RAINBOW: &str = r#"
void animSwirlingRainbow(vec2 p, float r, float ti, inout vec3 col, inout float amul, inout float boost) {
    float a = atan(p.y, p.x) / TWO_PI;
    vec3 rainbow = hsb2rgb(vec3(fract(a + r * 0.5 - uTime * 0.1 + uSeed), 0.9, 1.0));
    col = mix(col, rainbow, ti);
}
"#;

pub const RADIAL_RAINBOW: &str = r#"
void animRadialRainbow(vec2 p, float r, float ti, inout vec3 col, inout float amul, inout float boost) {
    vec3 rainbow = hsb2rgb(vec3(fract(r - uTime * 0.1 + uSeed), 0.9, 1.0));
    col = mix(col, rainbow, ti);
}
"#;

pub const FORCE_GRID: &str = r#"
void animForceGrid(vec2 p, float r, float ti, inout vec3 col, inout float amul, inout float boost) {
    float z = 1.0 / max(0.15, 1.0 - r * 0.85);
    vec2 g = abs(fract(p * z * 4.0 + vec2(0.0, uTime * 0.5)) - 0.5);
    float lines = 1.0 - smoothstep(0.0, 0.06, min(g.x, g.y));
    amul *= mix(1.0, 0.3 + 1.2 * lines, ti);
    boost = 1.0 + 0.4 * ti * lines;
}
"#;

pub const STARLIGHT: &str = r#"
void animStarlight(vec2 p, float r, float ti, inout vec3 col, inout float amul, inout float boost) {
    vec2 cell = floor(p * 12.0);
    vec2 f = fract(p * 12.0) - 0.5;
    float h = hash12(cell + uSeed * 19.0);
    float twinkle = 0.5 + 0.5 * sin(uTime * (2.0 + 4.0 * h) + h * TWO_PI);
    float star = smoothstep(0.12, 0.0, length(f)) * step(0.7, h) * twinkle;
    amul *= mix(1.0, 0.55 + 2.5 * star, ti);
    boost = 1.0 + ti * star;
}
"#;

pub const SMOKE_PATCH: &str = r#"
void animSmokePatch(vec2 p, float r, float ti, inout vec3 col, inout float amul, inout float boost) {
    float n = fbm(p * 2.5 + vec2(uTime * 0.12, -uTime * 0.08) + uSeed * 3.0, 5);
    float patches = smoothstep(0.35, 0.65, n);
    col = mix(col, col * 0.85, 0.5 * ti);
    amul *= mix(1.0, 0.3 + 0.9 * patches, ti);
}
"#;

// Torch and flame read the CPU-side smooth-noise flicker from uPulse.
pub const TORCH: &str = r#"
void animTorch(vec2 p, float r, float ti, inout vec3 col, inout float amul, inout float boost) {
    float n = noise2(p * 3.0 + vec2(uTime * 0.8, uSeed * 7.0));
    amul *= mix(1.0, uPulse * (0.9 + 0.2 * n), ti);
    boost = 1.0 + 0.2 * ti * (uPulse - 0.5);
}
"#;

pub const FLAME: &str = r#"
void animFlame(vec2 p, float r, float ti, inout vec3 col, inout float amul, inout float boost) {
    float tongue = fbm(vec2(p.x * 3.0, p.y * 2.0 - uTime * 1.8) + uSeed * 5.0, 4);
    vec3 hot = mix(col, vec3(1.0, 0.55, 0.2), 0.35);
    col = mix(col, hot, ti * (1.0 - r));
    amul *= mix(1.0, uPulse * (0.7 + 0.6 * tongue), ti);
    boost = 1.0 + 0.3 * ti * tongue;
}
"#;

pub const PULSE: &str = r#"
void animPulse(vec2 p, float r, float ti, inout vec3 col, inout float amul, inout float boost) {
    amul *= mix(1.0, uPulse, ti);
}
"#;

pub const LIGHT_CHUNKS: [LightChunk; 22] = [
    LightChunk { kind: LightAnimationKind::Wave, function: "animWave", source: WAVE },
    LightChunk { kind: LightAnimationKind::Fairy, function: "animFairy", source: FAIRY },
    LightChunk { kind: LightAnimationKind::Chroma, function: "animChroma", source: CHROMA },
    LightChunk { kind: LightAnimationKind::EnergyField, function: "animEnergyField", source: ENERGY_FIELD },
    LightChunk { kind: LightAnimationKind::BewitchingWave, function: "animBewitchingWave", source: BEWITCHING_WAVE },
    LightChunk { kind: LightAnimationKind::Revolving, function: "animRevolving", source: REVOLVING },
    LightChunk { kind: LightAnimationKind::Siren, function: "animSiren", source: SIREN },
    LightChunk { kind: LightAnimationKind::Fog, function: "animFog", source: FOG },
    LightChunk { kind: LightAnimationKind::Sunburst, function: "animSunburst", source: SUNBURST },
    LightChunk { kind: LightAnimationKind::Dome, function: "animDome", source: DOME },
    LightChunk { kind: LightAnimationKind::Emanation, function: "animEmanation", source: EMANATION },
    LightChunk { kind: LightAnimationKind::HexaDome, function: "animHexaDome", source: HEXA_DOME },
    LightChunk { kind: LightAnimationKind::Ghost, function: "animGhost", source: GHOST },
    LightChunk { kind: LightAnimationKind::Vortex, function: "animVortex", source: VORTEX },
    LightChunk { kind: LightAnimationKind::SwirlingRainbow, function: "animSwirlingRainbow", source: SWIRLING_RAINBOW },
    LightChunk { kind: LightAnimationKind::RadialRainbow, function: "animRadialRainbow", source: RADIAL_RAINBOW },
    LightChunk { kind: LightAnimationKind::ForceGrid, function: "animForceGrid", source: FORCE_GRID },
    LightChunk { kind: LightAnimationKind::Starlight, function: "animStarlight", source: STARLIGHT },
    LightChunk { kind: LightAnimationKind::SmokePatch, function: "animSmokePatch", source: SMOKE_PATCH },
    LightChunk { kind: LightAnimationKind::Torch, function: "animTorch", source: TORCH },
    LightChunk { kind: LightAnimationKind::Flame, function: "animFlame", source: FLAME },
    LightChunk { kind: LightAnimationKind::Pulse, function: "animPulse", source: PULSE },
];

/// `if/else` chain selecting the chunk by `uAnimType`.
pub fn dispatch() -> String {
    let mut s = String::new();
    for (i, c) in LIGHT_CHUNKS.iter().enumerate() {
        let kw = if i == 0 { "if" } else { "else if" };
        s.push_str(&format!(
            "    {} (uAnimType == {}) {}(p, r, ti, outColor, animAlphaMul, kindBoost);\n",
            kw,
            c.kind.code(),
            c.function
        ));
    }
    s
}
