//! Engine tunables loaded from TOML. Every section and field is optional.

use std::fs;
use std::path::Path;

use serde::Deserialize;

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config read failed: {}", e),
            ConfigError::Parse(e) => write!(f, "config parse error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Parse(e)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub lighting: LightingConfig,
    pub composite: CompositeConfig,
    pub masks: MaskConfig,
    pub movement: MovementConfig,
    pub visibility: VisibilityConfig,
}

impl EngineConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let mut cfg: EngineConfig = toml::from_str(s)?;
        cfg.movement.heuristic_weight = cfg.movement.heuristic_weight.clamp(1.0, 4.0);
        Ok(cfg)
    }
}

pub fn load_config_from_path(path: &Path) -> Result<EngineConfig, ConfigError> {
    let s = fs::read_to_string(path)?;
    EngineConfig::from_toml_str(&s)
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    pub wall_inset_px: f32,
    pub zoomed_padding_px: f32,
    pub circle_segments: usize,
    pub ground_z: f32,
    pub light_z_offset: f32,
    pub darkness_z_offset: f32,
    pub master_intensity: f32,
    /// Feather added outside a darkness source's radius (`uBorderDistance`).
    pub darkness_padding_px: f32,
    /// Dirty-source count above which polygon rebuilds fan out over rayon.
    pub parallel_rebuild_threshold: usize,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            wall_inset_px: 6.0,
            zoomed_padding_px: 0.0,
            circle_segments: 128,
            ground_z: 0.0,
            light_z_offset: 0.5,
            darkness_z_offset: 0.75,
            master_intensity: 1.0,
            darkness_padding_px: 0.0,
            parallel_rebuild_threshold: 8,
        }
    }
}

impl LightingConfig {
    #[inline]
    pub fn effective_inset(&self) -> f32 {
        (self.wall_inset_px - self.zoomed_padding_px).max(0.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ShadowKindConfig {
    pub opacity: f32,
    /// Length of the sun-direction offset in pixels.
    pub offset_px: f32,
}

impl Default for ShadowKindConfig {
    fn default() -> Self {
        Self {
            opacity: 0.0,
            offset_px: 0.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ShadowsConfig {
    pub overhead: ShadowKindConfig,
    pub building: ShadowKindConfig,
    pub bush: ShadowKindConfig,
    pub tree: ShadowKindConfig,
    pub cloud: ShadowKindConfig,
}

impl Default for ShadowsConfig {
    fn default() -> Self {
        Self {
            overhead: ShadowKindConfig { opacity: 0.4, offset_px: 12.0 },
            building: ShadowKindConfig { opacity: 0.5, offset_px: 24.0 },
            bush: ShadowKindConfig { opacity: 0.3, offset_px: 6.0 },
            tree: ShadowKindConfig { opacity: 0.4, offset_px: 16.0 },
            cloud: ShadowKindConfig { opacity: 0.35, offset_px: 0.0 },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct LightningConfig {
    pub edge_shadows: bool,
    pub flash_gain: f32,
    pub edge_gain: f32,
    /// Half-width of the shadow band beside the edge, in UV.
    pub band_uv: f32,
    /// Radial falloff distance from the strike point, in UV.
    pub radius_uv: f32,
    /// Finite-difference step used for the outdoors gradient, in UV.
    pub gradient_step_uv: f32,
}

impl Default for LightningConfig {
    fn default() -> Self {
        Self {
            edge_shadows: true,
            flash_gain: 1.0,
            edge_gain: 4.0,
            band_uv: 0.05,
            radius_uv: 0.6,
            gradient_step_uv: 0.004,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct WindowLightConfig {
    pub rope_boost: f32,
    pub rope_luma_lo: f32,
    pub rope_luma_hi: f32,
}

impl Default for WindowLightConfig {
    fn default() -> Self {
        Self {
            rope_boost: 0.5,
            rope_luma_lo: 0.25,
            rope_luma_hi: 0.6,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct CompositeConfig {
    pub global_illumination: f32,
    pub coloration_strength: f32,
    pub negative_darkness_strength: f32,
    pub darkness_punch_gain: f32,
    pub outdoor_brightness: f32,
    pub cloud_top_opacity: f32,
    pub shadows: ShadowsConfig,
    pub lightning: LightningConfig,
    pub window_light: WindowLightConfig,
}

impl Default for CompositeConfig {
    fn default() -> Self {
        Self {
            global_illumination: 1.0,
            coloration_strength: 0.3,
            negative_darkness_strength: 1.0,
            darkness_punch_gain: 2.0,
            outdoor_brightness: 1.0,
            cloud_top_opacity: 0.6,
            shadows: ShadowsConfig::default(),
            lightning: LightningConfig::default(),
            window_light: WindowLightConfig::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct MaskConfig {
    pub weather_roof: bool,
    pub rope: bool,
    pub token: bool,
    /// Depth-only token prepass before the colour pass.
    pub token_depth_prepass: bool,
    pub depth_capture: bool,
    pub depth_near_pad: f32,
    pub depth_far_pad: f32,
    /// Name of a target to show in the corner (`light`, `darkness`, `masks`, `roof`, ...).
    pub debug_overlay: Option<String>,
}

impl Default for MaskConfig {
    fn default() -> Self {
        Self {
            weather_roof: true,
            rope: true,
            token: true,
            token_depth_prepass: true,
            depth_capture: false,
            depth_near_pad: 1.0,
            depth_far_pad: 1.0,
            debug_overlay: None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DoorClosePolicy {
    Always,
    #[default]
    OutOfCombatOnly,
    CombatOnly,
    Never,
}

impl DoorClosePolicy {
    pub fn should_close(self, in_combat: bool) -> bool {
        match self {
            DoorClosePolicy::Always => true,
            DoorClosePolicy::OutOfCombatOnly => !in_combat,
            DoorClosePolicy::CombatOnly => in_combat,
            DoorClosePolicy::Never => false,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LatticeChoice {
    /// Follow the scene grid: square 8-connected, hex, or gridless.
    #[default]
    Auto,
    Square4,
    Square8,
    Hex,
    Gridless,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    pub walk_bob_px: f32,
    pub walk_bob_cycles: f32,
    pub pick_up_height: f32,
    pub pick_up_turns: f32,
    pub hover_height: f32,
    pub rock_amplitude_rad: f32,
    pub rock_speed_hz: f32,
    /// Grid cells per second used to time tracks.
    pub grid_per_second: f32,
    pub min_track_ms: f32,
    pub indicator_ring_segments: usize,
    pub indicator_dash_px: f32,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            walk_bob_px: 3.0,
            walk_bob_cycles: 2.0,
            pick_up_height: 40.0,
            pick_up_turns: 1.0,
            hover_height: 24.0,
            rock_amplitude_rad: 0.08,
            rock_speed_hz: 0.5,
            grid_per_second: 6.0,
            min_track_ms: 120.0,
            indicator_ring_segments: 48,
            indicator_dash_px: 6.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    pub lattice: LatticeChoice,
    pub lattice_step_px: f32,
    pub search_margin_px: f32,
    pub max_graph_nodes: usize,
    pub max_search_iterations: usize,
    pub heuristic_weight: f32,
    pub allow_diagonals: bool,
    pub strict_no_fog_path: bool,
    pub force_foundry_parity: bool,
    pub smooth_paths: bool,
    pub door_close_policy: DoorClosePolicy,
    pub door_offset_px: f32,
    pub door_penalty_grid: f32,
    pub wait_for_open_ms: u64,
    pub wait_for_close_ms: u64,
    pub poll_interval_ms: u64,
    pub wait_for_track_finish_ms: u64,
    pub fallback_ms_per_grid: f32,
    pub fallback_max_ms: u64,
    pub occupancy_penalty: f32,
    pub player_auto_doors: bool,
    pub default_style: String,
    pub styles: StyleConfig,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            lattice: LatticeChoice::Auto,
            lattice_step_px: 50.0,
            search_margin_px: 200.0,
            max_graph_nodes: 20_000,
            max_search_iterations: 50_000,
            heuristic_weight: 1.15,
            allow_diagonals: true,
            strict_no_fog_path: false,
            force_foundry_parity: false,
            smooth_paths: true,
            door_close_policy: DoorClosePolicy::OutOfCombatOnly,
            door_offset_px: 8.0,
            door_penalty_grid: 0.25,
            wait_for_open_ms: 1200,
            wait_for_close_ms: 1200,
            poll_interval_ms: 50,
            wait_for_track_finish_ms: 3000,
            fallback_ms_per_grid: 150.0,
            fallback_max_ms: 2000,
            occupancy_penalty: 0.0,
            player_auto_doors: true,
            default_style: "walk".to_string(),
            styles: StyleConfig::default(),
        }
    }
}

impl MovementConfig {
    /// Door state polling interval, clamped to [10, 250] ms.
    #[inline]
    pub fn door_poll_ms(&self) -> u64 {
        self.poll_interval_ms.clamp(10, 250)
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct VisibilityConfig {
    pub hidden_opacity: f32,
    pub level_epsilon: f32,
}

impl Default for VisibilityConfig {
    fn default() -> Self {
        Self {
            hidden_opacity: 0.5,
            level_epsilon: 0.01,
        }
    }
}
