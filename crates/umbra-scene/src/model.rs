//! Authoritative documents as the host hands them to the engine.
//!
//! Field names follow the host's camelCase JSON so update payloads with
//! dotted keys (`"config.animation.type"`) merge straight into them.

use serde::{Deserialize, Serialize};
use umbra_geom::{Rect, Segment, Vec2};

use crate::color::Rgb;

pub type DocId = String;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LightAnimation {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub speed: f32,
    pub intensity: f32,
    pub reverse: bool,
}

impl Default for LightAnimation {
    fn default() -> Self {
        Self {
            kind: None,
            speed: 5.0,
            intensity: 5.0,
            reverse: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LightConfig {
    pub dim: f32,
    pub bright: f32,
    pub color: Option<String>,
    pub alpha: f32,
    pub attenuation: f32,
    pub luminosity: f32,
    pub animation: LightAnimation,
    pub negative: bool,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            dim: 0.0,
            bright: 0.0,
            color: None,
            alpha: 0.5,
            attenuation: 0.5,
            luminosity: 0.5,
            animation: LightAnimation::default(),
            negative: false,
        }
    }
}

impl LightConfig {
    #[inline]
    pub fn radius(&self) -> f32 {
        self.dim.max(self.bright).max(0.0)
    }

    pub fn rgb(&self) -> Rgb {
        self.color
            .as_deref()
            .and_then(Rgb::parse_hex)
            .unwrap_or(Rgb::WHITE)
    }
}

/// Ambient light document. Position is in host pixels (top-left origin, Y down).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LightDoc {
    pub id: DocId,
    pub x: f32,
    pub y: f32,
    pub elevation: f32,
    pub hidden: bool,
    pub config: LightConfig,
}

impl LightDoc {
    #[inline]
    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DoorKind {
    #[default]
    None,
    Door,
    Secret,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DoorState {
    #[default]
    Closed,
    Open,
    Locked,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WallDoc {
    pub id: DocId,
    /// `[x0, y0, x1, y1]` in host pixels.
    pub c: [f32; 4],
    pub door: DoorKind,
    pub ds: DoorState,
}

impl WallDoc {
    #[inline]
    pub fn segment(&self) -> Segment {
        Segment::new(Vec2::new(self.c[0], self.c[1]), Vec2::new(self.c[2], self.c[3]))
    }

    #[inline]
    pub fn is_door(&self) -> bool {
        self.door != DoorKind::None
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.is_door() && self.ds == DoorState::Open
    }
}

/// Occlusion layer an overhead tile is flagged into.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OcclusionLayer {
    #[default]
    None,
    Roof,
    WeatherRoof,
    RopeMask,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TileDoc {
    pub id: DocId,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub rotation: f32,
    pub alpha: f32,
    pub elevation: f32,
    pub hidden: bool,
    pub occlusion: OcclusionLayer,
    pub texture: Option<String>,
}

impl Default for TileDoc {
    fn default() -> Self {
        Self {
            id: DocId::new(),
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            rotation: 0.0,
            alpha: 1.0,
            elevation: 0.0,
            hidden: false,
            occlusion: OcclusionLayer::None,
            texture: None,
        }
    }
}

impl TileDoc {
    #[inline]
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TokenFlags {
    /// Authoritative movement style override (`walk`, `pick-up-drop`, `flying-glide`).
    pub movement_style: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TokenDoc {
    pub id: DocId,
    pub name: String,
    /// Top-left corner in host pixels.
    pub x: f32,
    pub y: f32,
    /// Footprint in grid units.
    pub width: f32,
    pub height: f32,
    pub elevation: f32,
    pub rotation: f32,
    pub hidden: bool,
    pub texture: Option<String>,
    pub flags: TokenFlags,
}

impl Default for TokenDoc {
    fn default() -> Self {
        Self {
            id: DocId::new(),
            name: String::new(),
            x: 0.0,
            y: 0.0,
            width: 1.0,
            height: 1.0,
            elevation: 0.0,
            rotation: 0.0,
            hidden: false,
            texture: None,
            flags: TokenFlags::default(),
        }
    }
}

impl TokenDoc {
    /// Center of the token footprint for a given grid size in pixels.
    #[inline]
    pub fn center(&self, grid_size: f32) -> Vec2 {
        Vec2::new(
            self.x + self.width * grid_size * 0.5,
            self.y + self.height * grid_size * 0.5,
        )
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GridKind {
    Gridless,
    #[default]
    Square,
    /// Pointy-top hexes laid out in rows.
    HexRows,
    /// Flat-top hexes laid out in columns.
    HexColumns,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridInfo {
    pub size: f32,
    pub size_x: f32,
    pub size_y: f32,
    pub kind: GridKind,
}

impl Default for GridInfo {
    fn default() -> Self {
        Self {
            size: 100.0,
            size_x: 100.0,
            size_y: 100.0,
            kind: GridKind::Square,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SceneDimensions {
    pub width: f32,
    pub height: f32,
    pub scene_x: f32,
    pub scene_y: f32,
    pub scene_width: f32,
    pub scene_height: f32,
    /// Grid distance units per grid cell.
    pub distance: f32,
    pub size: f32,
}

impl SceneDimensions {
    #[inline]
    pub fn scene_rect(&self) -> Rect {
        Rect::new(self.scene_x, self.scene_y, self.scene_width, self.scene_height)
    }
}

/// Stacked-level context advertised by a multi-level scene.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LevelContext {
    pub level_count: usize,
    pub active_bottom: f32,
    pub active_top: f32,
}
