//! Closed sets of animation kinds with their shader codes.

/// Light animation kinds. The discriminant is the `uAnimType` code bound to
/// the light shader; `reactivepulse` shares the `Pulse` code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(i32)]
pub enum LightAnimationKind {
    None = 0,
    Wave = 1,
    Fairy = 2,
    Chroma = 3,
    EnergyField = 4,
    BewitchingWave = 5,
    Revolving = 6,
    Siren = 7,
    Fog = 8,
    Sunburst = 9,
    Dome = 10,
    Emanation = 11,
    HexaDome = 12,
    Ghost = 13,
    Vortex = 14,
    SwirlingRainbow = 15,
    RadialRainbow = 16,
    ForceGrid = 17,
    Starlight = 18,
    SmokePatch = 19,
    Torch = 20,
    Flame = 21,
    Pulse = 22,
}

impl LightAnimationKind {
    pub const ALL: [LightAnimationKind; 23] = [
        LightAnimationKind::None,
        LightAnimationKind::Wave,
        LightAnimationKind::Fairy,
        LightAnimationKind::Chroma,
        LightAnimationKind::EnergyField,
        LightAnimationKind::BewitchingWave,
        LightAnimationKind::Revolving,
        LightAnimationKind::Siren,
        LightAnimationKind::Fog,
        LightAnimationKind::Sunburst,
        LightAnimationKind::Dome,
        LightAnimationKind::Emanation,
        LightAnimationKind::HexaDome,
        LightAnimationKind::Ghost,
        LightAnimationKind::Vortex,
        LightAnimationKind::SwirlingRainbow,
        LightAnimationKind::RadialRainbow,
        LightAnimationKind::ForceGrid,
        LightAnimationKind::Starlight,
        LightAnimationKind::SmokePatch,
        LightAnimationKind::Torch,
        LightAnimationKind::Flame,
        LightAnimationKind::Pulse,
    ];

    #[inline]
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Resolves a host animation name. Unknown names map to `None` so a
    /// misconfigured source still renders as a static light.
    pub fn from_name(name: &str) -> (LightAnimationKind, bool) {
        let reactive = name.eq_ignore_ascii_case("reactivepulse");
        let kind = match name.to_ascii_lowercase().replace(['-', '_', ' '], "").as_str() {
            "wave" => LightAnimationKind::Wave,
            "fairy" => LightAnimationKind::Fairy,
            "chroma" => LightAnimationKind::Chroma,
            "energy" | "energyfield" => LightAnimationKind::EnergyField,
            "witchwave" | "bewitchingwave" => LightAnimationKind::BewitchingWave,
            "revolving" => LightAnimationKind::Revolving,
            "siren" => LightAnimationKind::Siren,
            "fog" => LightAnimationKind::Fog,
            "sunburst" => LightAnimationKind::Sunburst,
            "dome" => LightAnimationKind::Dome,
            "emanation" => LightAnimationKind::Emanation,
            "hexa" | "hexadome" => LightAnimationKind::HexaDome,
            "ghost" => LightAnimationKind::Ghost,
            "vortex" => LightAnimationKind::Vortex,
            "rainbowswirl" | "swirlingrainbow" => LightAnimationKind::SwirlingRainbow,
            "radialrainbow" => LightAnimationKind::RadialRainbow,
            "grid" | "forcegrid" => LightAnimationKind::ForceGrid,
            "starlight" => LightAnimationKind::Starlight,
            "smokepatch" => LightAnimationKind::SmokePatch,
            "torch" => LightAnimationKind::Torch,
            "flame" => LightAnimationKind::Flame,
            "pulse" | "reactivepulse" => LightAnimationKind::Pulse,
            _ => LightAnimationKind::None,
        };
        (kind, reactive)
    }

    pub fn name(self) -> &'static str {
        match self {
            LightAnimationKind::None => "none",
            LightAnimationKind::Wave => "wave",
            LightAnimationKind::Fairy => "fairy",
            LightAnimationKind::Chroma => "chroma",
            LightAnimationKind::EnergyField => "energy",
            LightAnimationKind::BewitchingWave => "witchwave",
            LightAnimationKind::Revolving => "revolving",
            LightAnimationKind::Siren => "siren",
            LightAnimationKind::Fog => "fog",
            LightAnimationKind::Sunburst => "sunburst",
            LightAnimationKind::Dome => "dome",
            LightAnimationKind::Emanation => "emanation",
            LightAnimationKind::HexaDome => "hexa",
            LightAnimationKind::Ghost => "ghost",
            LightAnimationKind::Vortex => "vortex",
            LightAnimationKind::SwirlingRainbow => "rainbowswirl",
            LightAnimationKind::RadialRainbow => "radialrainbow",
            LightAnimationKind::ForceGrid => "grid",
            LightAnimationKind::Starlight => "starlight",
            LightAnimationKind::SmokePatch => "smokepatch",
            LightAnimationKind::Torch => "torch",
            LightAnimationKind::Flame => "flame",
            LightAnimationKind::Pulse => "pulse",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum DarknessAnimationKind {
    None = 0,
    MagicalGloom = 1,
    Roiling = 2,
    Hole = 3,
    DenseSmoke = 4,
}

impl DarknessAnimationKind {
    pub const ALL: [DarknessAnimationKind; 5] = [
        DarknessAnimationKind::None,
        DarknessAnimationKind::MagicalGloom,
        DarknessAnimationKind::Roiling,
        DarknessAnimationKind::Hole,
        DarknessAnimationKind::DenseSmoke,
    ];

    #[inline]
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_name(name: &str) -> DarknessAnimationKind {
        match name.to_ascii_lowercase().replace(['-', '_', ' '], "").as_str() {
            "magicalgloom" => DarknessAnimationKind::MagicalGloom,
            "roiling" => DarknessAnimationKind::Roiling,
            "hole" => DarknessAnimationKind::Hole,
            "densesmoke" => DarknessAnimationKind::DenseSmoke,
            _ => DarknessAnimationKind::None,
        }
    }
}
