//! Collaborator contracts. The engine never reaches for globals; everything it
//! needs from the host arrives through these traits at construction or per call.

use umbra_geom::{Rect, Vec2};

use crate::model::{
    DocId, DoorState, GridInfo, GridKind, LevelContext, LightDoc, SceneDimensions, TileDoc,
    TokenDoc, WallDoc,
};
use crate::Environment;

/// Read access to the authoritative scene model.
pub trait SceneHost {
    fn grid(&self) -> GridInfo;
    fn dimensions(&self) -> SceneDimensions;
    fn environment(&self) -> Environment;

    fn lights(&self) -> Vec<LightDoc>;
    fn walls(&self) -> Vec<WallDoc>;
    fn tokens(&self) -> Vec<TokenDoc>;
    fn tiles(&self) -> Vec<TileDoc>;

    fn light(&self, id: &str) -> Option<LightDoc> {
        self.lights().into_iter().find(|l| l.id == id)
    }

    fn wall(&self, id: &str) -> Option<WallDoc> {
        self.walls().into_iter().find(|w| w.id == id)
    }

    fn token(&self, id: &str) -> Option<TokenDoc> {
        self.tokens().into_iter().find(|t| t.id == id)
    }

    /// Wall-clipped line-of-sight polygon for a light, flat `[x0,y0,x1,y1,..]`
    /// in host pixels. `None` until the host has computed it.
    fn light_los(&self, id: &str) -> Option<Vec<f32>>;

    fn level_context(&self) -> Option<LevelContext> {
        None
    }

    /// Monotonic counter bumped by every door state change.
    fn door_revision(&self) -> u64;

    /// Snap to the center of the containing grid cell.
    fn snap_to_grid(&self, p: Vec2) -> Vec2 {
        snap_center(&self.grid(), p)
    }

    /// Whether the current user can see a host-space point through fog of war.
    fn is_point_visible(&self, _p: Vec2) -> bool {
        true
    }

    fn scene_rect(&self) -> Rect {
        self.dimensions().scene_rect()
    }
}

/// Center-mode snapping for square grids; hex and gridless scenes pass through.
pub fn snap_center(grid: &GridInfo, p: Vec2) -> Vec2 {
    match grid.kind {
        GridKind::Square if grid.size_x > 0.0 && grid.size_y > 0.0 => Vec2::new(
            (p.x / grid.size_x).floor() * grid.size_x + grid.size_x * 0.5,
            (p.y / grid.size_y).floor() * grid.size_y + grid.size_y * 0.5,
        ),
        _ => p,
    }
}

pub trait PermissionService {
    fn is_gm(&self) -> bool;
    /// `canUserModify(wall, 'update', {ds})`.
    fn can_modify_wall(&self, wall: &WallDoc, ds: DoorState) -> bool;
    fn combat_started(&self) -> bool;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CollisionMode {
    #[default]
    Any,
    All,
    Closest,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CollisionKind {
    Move,
    Sight,
    Light,
}

impl CollisionKind {
    /// Order the planner consults backends in.
    pub const ORDER: [CollisionKind; 3] =
        [CollisionKind::Move, CollisionKind::Sight, CollisionKind::Light];

    pub fn as_str(self) -> &'static str {
        match self {
            CollisionKind::Move => "move",
            CollisionKind::Sight => "sight",
            CollisionKind::Light => "light",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WallDirectionMode {
    #[default]
    Normal,
    Reversed,
    Both,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CollisionQuery {
    pub mode: CollisionMode,
    pub kind: CollisionKind,
    pub source: Option<DocId>,
    pub wall_direction_mode: WallDirectionMode,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CollisionHit {
    pub point: Vec2,
    /// Wall responsible for the hit, when the backend can tell.
    pub wall_id: Option<DocId>,
}

pub trait PolygonBackends {
    fn test_collision(&self, a: Vec2, b: Vec2, query: &CollisionQuery) -> Vec<CollisionHit>;
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PathFinderOptions {
    pub preview: bool,
    pub history: bool,
    pub delay_ms: u32,
    pub ignore_walls: bool,
    pub ignore_cost: bool,
}

/// The host's own path finder, consulted for parity arbitration.
pub trait PathFinder {
    fn find_movement_path(&self, waypoints: &[Vec2], opts: &PathFinderOptions)
    -> Option<Vec<Vec2>>;
}

/// Handle to a GPU texture published to other collaborators.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextureRef {
    pub id: u32,
    pub width: i32,
    pub height: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MaskSpace {
    ScreenUv,
    World,
    Device,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MaskLifecycle {
    PerFrame,
    Persistent,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MaskMeta {
    pub space: MaskSpace,
    pub channels: &'static str,
    pub lifecycle: MaskLifecycle,
    pub width: i32,
    pub height: i32,
    pub uv_flip_y: bool,
}

pub mod mask_ids {
    pub const ROOF_ALPHA: &str = "roofAlpha.screen";
    pub const WEATHER_ROOF_ALPHA: &str = "weatherRoofAlpha.screen";
    pub const ROPE_MASK: &str = "ropeMask.screen";
    pub const TOKEN_MASK: &str = "tokenMask.screen";
    pub const OUTDOORS: &str = "outdoors.screen";
    pub const DEPTH: &str = "depth.device";
}

pub trait MaskRegistry {
    fn set_texture(&mut self, id: &str, texture: TextureRef, meta: MaskMeta);
}
