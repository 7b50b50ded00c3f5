//! Complete shader programs assembled from the chunk library.

use crate::ShaderSource;
use crate::chunks::{common, darkness, light};

const VERSION: &str = "#version 330\n";

/// Shared by light and darkness meshes: local position in radius units.
pub const SOURCE_VERTEX: &str = r#"
in vec3 vertexPosition;
uniform mat4 mvp;
uniform vec2 uCenter;
uniform float uMeshRadius;
out vec2 vLocal;

void main() {
    vLocal = (vertexPosition.xy - uCenter) / max(uMeshRadius, 0.0001);
    gl_Position = mvp * vec4(vertexPosition, 1.0);
}
"#;

const LIGHT_UNIFORMS: &str = r#"
in vec2 vLocal;
out vec4 finalColor;

uniform vec3 uColor;
uniform float uRadius;
uniform float uBrightRadius;
uniform float uAlpha;
uniform float uAttenuation;
uniform float uTime;
uniform int uAnimType;
uniform float uIntensity;
uniform float uSeed;
uniform float uMasterIntensity;
uniform float uPulse;
uniform float uBrightness;
"#;

const LIGHT_MAIN_HEAD: &str = r#"
void main() {
    vec2 p = vLocal;
    float r = length(p);
    if (r >= 1.0) discard;

    float s = clamp(uAttenuation, 0.0, 1.0);
    float b = clamp(uBrightRadius / max(uRadius, EPS), 0.0, 1.0);
    float outerAlpha = 1.0 - smoothstep(1.0 - s, 1.0 + EPS, r);
    float innerAlpha = 1.0 - smoothstep(b * (1.0 - s), b + s * (1.0 - b) + EPS, r);
    float intensity = 0.5 * outerAlpha + 0.5 * innerAlpha;

    vec3 outColor = uColor;
    float animAlphaMul = 1.0;
    float kindBoost = 1.0;
    float ti = clamp(uIntensity, 0.0, 10.0) / 10.0;
"#;

const LIGHT_MAIN_TAIL: &str = r#"
    float alpha = intensity * uAlpha * uMasterIntensity * animAlphaMul * kindBoost;
    vec3 rgb = outColor * uBrightness * kindBoost;
    finalColor = vec4(max(rgb, vec3(0.0)), clamp(alpha, 0.0, 1.0));
}
"#;

pub fn light_program() -> ShaderSource {
    let mut fs = String::from(VERSION);
    fs.push_str(LIGHT_UNIFORMS);
    fs.push_str(&common::prelude());
    for c in light::LIGHT_CHUNKS.iter() {
        fs.push_str(c.source);
    }
    fs.push_str(LIGHT_MAIN_HEAD);
    fs.push_str(&light::dispatch());
    fs.push_str(LIGHT_MAIN_TAIL);
    ShaderSource {
        vertex: Some(format!("{VERSION}{SOURCE_VERTEX}")),
        fragment: fs,
    }
}

const DARKNESS_UNIFORMS: &str = r#"
in vec2 vLocal;
out vec4 finalColor;

uniform float uRadius;
uniform float uAlpha;
uniform float uAttenuation;
uniform float uBorderDistance;
uniform float uGlobalDarknessLevel;
uniform float uTime;
uniform int uAnimType;
uniform float uIntensity;
uniform float uSeed;
"#;

const DARKNESS_MAIN_HEAD: &str = r#"
void main() {
    vec2 p = vLocal;
    float r = length(p);
    if (r >= 1.0) discard;

    float s = clamp(uAttenuation, 0.0, 1.0);
    float border = clamp(uBorderDistance, EPS, 1.0);
    float outerAlpha = 1.0 - smoothstep(border * (1.0 - s), 1.0 + EPS, r);
    float ti = clamp(uIntensity, 0.0, 10.0) / 10.0;
    float modulator = 1.0;
"#;

const DARKNESS_MAIN_TAIL: &str = r#"
    float mask = clamp(outerAlpha * uAlpha * modulator, 0.0, 1.0);
    finalColor = vec4(mask, mask, mask, 1.0);
}
"#;

pub fn darkness_program() -> ShaderSource {
    let mut fs = String::from(VERSION);
    fs.push_str(DARKNESS_UNIFORMS);
    fs.push_str(&common::prelude());
    for c in darkness::DARKNESS_CHUNKS.iter() {
        fs.push_str(c.source);
    }
    fs.push_str(DARKNESS_MAIN_HEAD);
    fs.push_str(&darkness::dispatch());
    fs.push_str(DARKNESS_MAIN_TAIL);
    ShaderSource {
        vertex: Some(format!("{VERSION}{SOURCE_VERTEX}")),
        fragment: fs,
    }
}

/// R=outdoors(screen), G=rope, B=token, A=roof.
pub const MASK_PACK_FRAGMENT: &str = r#"
in vec2 fragTexCoord;
out vec4 finalColor;

uniform sampler2D tOutdoors;
uniform sampler2D tRope;
uniform sampler2D tToken;
uniform sampler2D tRoof;
uniform int uHasOutdoors;

void main() {
    vec2 uv = fragTexCoord;
    float outdoors = uHasOutdoors == 1 ? texture(tOutdoors, uv).r : 1.0;
    finalColor = vec4(
        outdoors,
        texture(tRope, uv).a,
        texture(tToken, uv).a,
        texture(tRoof, uv).a
    );
}
"#;

pub fn mask_pack_program() -> ShaderSource {
    ShaderSource {
        vertex: None,
        fragment: format!("{VERSION}{MASK_PACK_FRAGMENT}"),
    }
}

/// Draws the world-space outdoors texture through the scene camera so it can
/// be sampled with screen UVs.
pub const OUTDOORS_PROJECTION_FRAGMENT: &str = r#"
in vec2 fragTexCoord;
in vec4 fragColor;
out vec4 finalColor;

uniform sampler2D texture0;

void main() {
    float o = texture(texture0, fragTexCoord).r;
    finalColor = vec4(o, o, o, 1.0);
}
"#;

pub fn outdoors_projection_program() -> ShaderSource {
    ShaderSource {
        vertex: None,
        fragment: format!("{VERSION}{OUTDOORS_PROJECTION_FRAGMENT}"),
    }
}

const COMPOSITE_UNIFORMS: &str = r#"
in vec2 fragTexCoord;
out vec4 finalColor;

uniform sampler2D tDiffuse;
uniform sampler2D tLight;
uniform sampler2D tDarkness;
uniform sampler2D tMasks;
uniform sampler2D tWindowLight;
uniform sampler2D tOverheadShadow;
uniform sampler2D tBuildingShadow;
uniform sampler2D tBushShadow;
uniform sampler2D tTreeShadow;
uniform sampler2D tCloudShadow;
uniform sampler2D tCloudTop;

uniform vec2 uResolution;
uniform vec3 uAmbientBrightest;
uniform vec3 uAmbientDarkness;
uniform float uDarknessLevel;
uniform float uGlobalIllumination;
uniform float uMasterIntensity;
uniform float uColorationStrength;
uniform float uNegativeDarknessStrength;
uniform float uDarknessPunchGain;
uniform float uOutdoorBrightness;

// overhead, building, bush, tree, cloud
uniform float uShadowOpacity[5];
uniform vec2 uShadowOffset[5];
uniform int uShadowBound[5];

uniform int uHasWindowLight;
uniform float uRopeBoost;
uniform float uRopeLumaLo;
uniform float uRopeLumaHi;

uniform int uHasCloudTop;
uniform float uCloudTopOpacity;

uniform float uFlash01;
uniform float uFlashGain;
uniform int uEdgeShadows;
uniform float uEdgeGain;
uniform float uEdgeBand;
uniform float uEdgeRadius;
uniform float uGradientStep;
uniform vec2 uStrikeUv;
uniform vec2 uStrikeDir;
"#;

const COMPOSITE_FUNCTIONS: &str = r#"
bool anyNan(vec3 v) {
    return v.x != v.x || v.y != v.y || v.z != v.z;
}

float shadowSample(int i, vec2 uv) {
    if (uShadowBound[i] == 0) return 1.0;
    vec2 suv = uv + uShadowOffset[i] / max(uResolution, vec2(1.0));
    if (i == 0) return texture(tOverheadShadow, suv).r;
    if (i == 1) return texture(tBuildingShadow, suv).r;
    if (i == 2) return texture(tBushShadow, suv).r;
    if (i == 3) return texture(tTreeShadow, suv).r;
    return texture(tCloudShadow, suv).r;
}

float lightningShadow(vec2 uv) {
    float h = uGradientStep;
    float gx = texture(tMasks, uStrikeUv + vec2(h, 0.0)).r - texture(tMasks, uStrikeUv - vec2(h, 0.0)).r;
    float gy = texture(tMasks, uStrikeUv + vec2(0.0, h)).r - texture(tMasks, uStrikeUv - vec2(0.0, h)).r;
    vec2 g = vec2(gx, gy);
    float gl = length(g);
    if (gl < 1e-4) return 0.0;
    vec2 n = g / gl;
    float side = dot(uStrikeDir, n) < 0.0 ? -1.0 : 1.0;
    float sd = dot(uv - uStrikeUv, n) * side;
    if (sd < 0.0) return 0.0;
    float band = 1.0 - smoothstep(0.5 * uEdgeBand, uEdgeBand, sd);
    float radial = 1.0 - smoothstep(0.0, uEdgeRadius, length(uv - uStrikeUv));
    float edgeStrength = clamp(uEdgeGain * gl, 0.0, 1.0);
    return clamp(edgeStrength * band * radial, 0.0, 1.0);
}
"#;

const COMPOSITE_MAIN: &str = r#"
void main() {
    vec2 uv = fragTexCoord;
    vec3 diffuse = texture(tDiffuse, uv).rgb;
    vec3 lightSample = texture(tLight, uv).rgb;
    if (anyNan(lightSample)) lightSample = vec3(0.0);
    float darknessMask = texture(tDarkness, uv).r;
    vec4 masks = texture(tMasks, uv);
    float outdoorsBase = masks.r;
    float ropeMask = masks.g;
    float roofAlphaRaw = masks.a;
    float roofAlpha = roofAlphaRaw * (1.0 - ropeMask);
    float lightVisibility = 1.0 - roofAlpha;
    vec3 safeLights = max(lightSample, vec3(0.0)) * lightVisibility;

    float combinedShadow = 1.0;
    for (int i = 0; i < 5; i++) {
        float f = mix(1.0, shadowSample(i, uv), uShadowOpacity[i]);
        f = mix(f, 1.0, roofAlphaRaw);
        f = mix(1.0, f, outdoorsBase);
        combinedShadow *= f;
    }

    float darkness = clamp(uDarknessLevel, 0.0, 1.0);
    vec3 ambientDay = uAmbientBrightest * uGlobalIllumination;
    vec3 ambientNight = uAmbientDarkness * uGlobalIllumination;
    float lightI = max(safeLights.r, max(safeLights.g, safeLights.b)) * uMasterIntensity;
    float punch = 1.0 - exp(-lightI * uDarknessPunchGain);
    float localDarkness = clamp(darkness * (1.0 - punch * uNegativeDarknessStrength), 0.0, 1.0);

    vec3 windowIllum = uHasWindowLight == 1 ? texture(tWindowLight, uv).rgb : vec3(0.0);
    vec3 shadedAmbient = mix(ambientDay, ambientNight, localDarkness) * combinedShadow
        + windowIllum * combinedShadow;

    float punchedMask = clamp(darknessMask - punch * uNegativeDarknessStrength, 0.0, 1.0);
    vec3 ambientAfterDark = shadedAmbient * (1.0 - punchedMask);

    vec3 total = max(ambientAfterDark + vec3(lightI), ambientDay * 0.1);
    if (anyNan(total)) total = shadedAmbient;

    vec3 coloration = safeLights * uMasterIntensity * perceivedBrightness(diffuse) * uColorationStrength;
    vec3 lit = diffuse * total + coloration;

    if (uHasWindowLight == 1 && ropeMask > 0.0) {
        float gate = smoothstep(uRopeLumaLo, uRopeLumaHi, perceivedBrightness(diffuse));
        lit += diffuse * windowIllum * uRopeBoost * ropeMask * gate;
    }

    float outdoorStrength = outdoorsBase * (1.0 - roofAlpha);
    if (outdoorStrength > 0.0) {
        float mult = clamp(mix(uOutdoorBrightness, 2.0 - uOutdoorBrightness, darkness), 0.0, 2.0);
        if (uFlash01 > 0.0) {
            float shadow = uEdgeShadows == 1 ? lightningShadow(uv) : 0.0;
            mult *= 1.0 + uFlash01 * uFlashGain * (1.0 - shadow);
        }
        lit *= mix(1.0, mult, outdoorStrength);
    }

    if (uHasCloudTop == 1) {
        vec4 cloud = texture(tCloudTop, uv);
        float cloudDark = mix(1.0, 0.25, darkness);
        float a = clamp(cloud.a * uCloudTopOpacity, 0.0, 1.0);
        lit = mix(lit, cloud.rgb * cloudDark * (1.0 - punchedMask), a);
    }

    finalColor = vec4(lit, 1.0);
}
"#;

pub fn composite_program() -> ShaderSource {
    let mut fs = String::from(VERSION);
    fs.push_str(COMPOSITE_UNIFORMS);
    fs.push_str(common::CONSTANTS);
    fs.push_str(common::COLOR);
    fs.push_str(COMPOSITE_FUNCTIONS);
    fs.push_str(COMPOSITE_MAIN);
    ShaderSource {
        vertex: None,
        fragment: fs,
    }
}
