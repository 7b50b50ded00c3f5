//! In-memory scene standing in for a VTT server: documents, permissions,
//! wall collision, ray-cast line of sight and the mask table.

use hashbrown::{HashMap, HashSet};
use serde_json::json;
use umbra_geom::{Segment, Vec2, polygon};
use umbra_movement::{MoveError, MoveExecutor, MoveRequest};
use umbra_scene::{
    CollisionHit, CollisionKind, CollisionMode, CollisionQuery, DocId, DoorKind, DoorState,
    Environment, GridInfo, HookBus, HookEvent, LevelContext, LightDoc, MaskMeta, MaskRegistry,
    PermissionService, PolygonBackends, SceneDimensions, SceneHost, TextureRef, TileDoc, TokenDoc,
    WallDirectionMode, WallDoc,
};
use umbra_visibility::TokenPlaceables;

use super::demo::GROUND_LEVEL;

pub struct DemoScene {
    pub grid: GridInfo,
    pub dims: SceneDimensions,
    pub env: Environment,
    pub lights: Vec<LightDoc>,
    pub walls: Vec<WallDoc>,
    pub tokens: Vec<TokenDoc>,
    pub tiles: Vec<TileDoc>,
    pub level: Option<LevelContext>,
    pub gm: bool,
    pub in_combat: bool,
    /// Tokens the current user owns; their sight drives fog of war.
    pub owned: HashSet<DocId>,
    pub los_rays: usize,
    pub(crate) door_revision: u64,
    pub(crate) interactive: HashSet<DocId>,
}

impl DemoScene {
    /// Walls that block movement and sight: everything but open doors.
    fn blocking(&self) -> impl Iterator<Item = &WallDoc> + '_ {
        self.walls.iter().filter(|w| !w.is_open())
    }

    fn hits(&self, seg: &Segment) -> Vec<(f32, CollisionHit)> {
        let mut out: Vec<(f32, CollisionHit)> = self
            .blocking()
            .filter_map(|w| {
                seg.intersect(&w.segment()).map(|(t, _)| {
                    (
                        t,
                        CollisionHit {
                            point: seg.point_at(t),
                            wall_id: Some(w.id.clone()),
                        },
                    )
                })
            })
            .collect();
        out.sort_by(|a, b| a.0.total_cmp(&b.0));
        out
    }

    /// Wall-clipped visibility fan around `origin`, flat host coordinates.
    pub fn compute_los(&self, origin: Vec2, radius: f32) -> Vec<f32> {
        let n = self.los_rays.max(16);
        let mut ring = Vec::with_capacity(n);
        for i in 0..n {
            let a = std::f32::consts::TAU * i as f32 / n as f32;
            let end = origin + Vec2::new(a.cos(), a.sin()) * radius;
            let ray = Segment::new(origin, end);
            let t = self
                .blocking()
                .filter_map(|w| ray.intersect(&w.segment()).map(|(t, _)| t))
                .fold(1.0f32, f32::min);
            ring.push(ray.point_at(t));
        }
        polygon::to_flat(&ring)
    }

    fn clear_line(&self, a: Vec2, b: Vec2) -> bool {
        let seg = Segment::new(a, b);
        !self.blocking().any(|w| seg.intersect(&w.segment()).is_some())
    }

    /// Switches between the ground-floor view and seeing every level.
    pub fn toggle_level_view(&mut self) -> HookEvent {
        self.level = match self.level {
            Some(_) => None,
            None => Some(GROUND_LEVEL),
        };
        let view = if self.level.is_some() { "ground" } else { "all" };
        HookEvent::UpdateScene {
            changes: json!({ "levelView": view }),
        }
    }

    /// Applies a door change and returns the hook announcing it.
    pub fn set_door_state(&mut self, id: &str, ds: DoorState) -> Option<HookEvent> {
        let wall = self.walls.iter_mut().find(|w| w.id == id)?;
        if !wall.is_door() || wall.ds == ds {
            return None;
        }
        wall.ds = ds;
        self.door_revision += 1;
        log::info!(target: "movement", "door {id} -> {ds:?} (rev {})", self.door_revision);
        Some(HookEvent::UpdateWall {
            id: id.to_string(),
            changes: json!({ "ds": ds }),
        })
    }

    /// Cycles closed -> open -> locked -> closed for the door nearest `p`.
    pub fn toggle_door_near(&mut self, p: Vec2, reach: f32) -> Option<HookEvent> {
        let (id, ds) = self
            .walls
            .iter()
            .filter(|w| w.is_door())
            .map(|w| (w, w.segment().distance_to_point(p)))
            .filter(|(_, d)| *d <= reach)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(w, _)| (w.id.clone(), w.ds))?;
        let next = match ds {
            DoorState::Closed => DoorState::Open,
            DoorState::Open => DoorState::Locked,
            DoorState::Locked => DoorState::Closed,
        };
        self.set_door_state(&id, next)
    }

    /// Moves a token so its footprint centre lands on `center`. Returns the
    /// previous centre.
    pub fn place_token(&mut self, id: &str, center: Vec2) -> Option<Vec2> {
        let size = self.grid.size;
        let doc = self.tokens.iter_mut().find(|t| t.id == id)?;
        let from = doc.center(size);
        doc.x = center.x - doc.width * size * 0.5;
        doc.y = center.y - doc.height * size * 0.5;
        Some(from)
    }

    pub fn token_at(&self, p: Vec2) -> Option<&TokenDoc> {
        let size = self.grid.size;
        self.tokens.iter().find(|t| {
            p.x >= t.x && p.y >= t.y && p.x <= t.x + t.width * size && p.y <= t.y + t.height * size
        })
    }

    pub fn set_token_hidden(&mut self, id: &str, hidden: bool) -> bool {
        match self.tokens.iter_mut().find(|t| t.id == id) {
            Some(t) if t.hidden != hidden => {
                t.hidden = hidden;
                true
            }
            _ => false,
        }
    }

    pub fn is_interactive(&self, id: &str) -> bool {
        self.interactive.contains(id)
    }
}

impl SceneHost for DemoScene {
    fn grid(&self) -> GridInfo {
        self.grid
    }

    fn dimensions(&self) -> SceneDimensions {
        self.dims
    }

    fn environment(&self) -> Environment {
        self.env
    }

    fn lights(&self) -> Vec<LightDoc> {
        self.lights.clone()
    }

    fn walls(&self) -> Vec<WallDoc> {
        self.walls.clone()
    }

    fn tokens(&self) -> Vec<TokenDoc> {
        self.tokens.clone()
    }

    fn tiles(&self) -> Vec<TileDoc> {
        self.tiles.clone()
    }

    fn light(&self, id: &str) -> Option<LightDoc> {
        self.lights.iter().find(|l| l.id == id).cloned()
    }

    fn wall(&self, id: &str) -> Option<WallDoc> {
        self.walls.iter().find(|w| w.id == id).cloned()
    }

    fn token(&self, id: &str) -> Option<TokenDoc> {
        self.tokens.iter().find(|t| t.id == id).cloned()
    }

    fn light_los(&self, id: &str) -> Option<Vec<f32>> {
        let doc = self.lights.iter().find(|l| l.id == id)?;
        let radius = doc.config.radius();
        if radius <= 0.0 {
            return None;
        }
        Some(self.compute_los(doc.position(), radius))
    }

    fn level_context(&self) -> Option<LevelContext> {
        self.level
    }

    fn door_revision(&self) -> u64 {
        self.door_revision
    }

    fn is_point_visible(&self, p: Vec2) -> bool {
        if self.gm {
            return true;
        }
        let size = self.grid.size;
        self.tokens
            .iter()
            .filter(|t| self.owned.contains(&t.id))
            .any(|t| self.clear_line(t.center(size), p))
    }
}

impl PermissionService for DemoScene {
    fn is_gm(&self) -> bool {
        self.gm
    }

    fn can_modify_wall(&self, wall: &WallDoc, ds: DoorState) -> bool {
        self.gm
            || (wall.door == DoorKind::Door
                && wall.ds != DoorState::Locked
                && ds != DoorState::Locked)
    }

    fn combat_started(&self) -> bool {
        self.in_combat
    }
}

impl PolygonBackends for DemoScene {
    fn test_collision(&self, a: Vec2, b: Vec2, query: &CollisionQuery) -> Vec<CollisionHit> {
        let mut hits = self.hits(&Segment::new(a, b));
        match query.mode {
            CollisionMode::All => hits.into_iter().map(|(_, h)| h).collect(),
            CollisionMode::Any | CollisionMode::Closest => {
                hits.truncate(1);
                hits.into_iter().map(|(_, h)| h).collect()
            }
        }
    }
}

impl TokenPlaceables for DemoScene {
    fn is_visible(&self, id: &str) -> Option<bool> {
        let t = self.tokens.iter().find(|t| t.id == id)?;
        if self.gm {
            return Some(true);
        }
        if t.hidden {
            return Some(false);
        }
        Some(self.owned.contains(&t.id) || self.is_point_visible(t.center(self.grid.size)))
    }

    fn document(&self, id: &str) -> Option<TokenDoc> {
        self.token(id)
    }

    fn detection_filter(&self, id: &str) -> Option<String> {
        self.tokens
            .iter()
            .find(|t| t.id == id && t.hidden && self.gm)
            .map(|_| "invisibility".to_string())
    }

    fn keep_interactive(&mut self, id: &str) {
        self.interactive.insert(id.to_string());
    }
}

impl DemoScene {
    /// Where a sequencer move from `from` lands, or why it cannot.
    pub fn resolve_move(&self, req: &MoveRequest, from: Vec2) -> Result<Vec2, MoveError> {
        if !req.point.is_finite() {
            return Err(MoveError::Host(format!("bad move target for {}", req.token)));
        }
        let to = if req.snap {
            self.snap_to_grid(req.point)
        } else {
            req.point
        };
        if !req.ignore_walls {
            let query = CollisionQuery {
                mode: CollisionMode::Any,
                kind: CollisionKind::Move,
                source: Some(req.token.clone()),
                wall_direction_mode: WallDirectionMode::Normal,
            };
            if !self.test_collision(from, to, &query).is_empty() {
                return Err(MoveError::Blocked {
                    token: req.token.clone(),
                });
            }
        }
        Ok(to)
    }
}

/// Commands the door sequencer issues, applied to the scene after each poll.
#[derive(Default)]
pub struct CommandQueue {
    pub moves: Vec<MoveRequest>,
    pub doors: Vec<(DocId, DoorState)>,
    pub animating: HashSet<DocId>,
}

impl CommandQueue {
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty() && self.doors.is_empty()
    }
}

/// Queues an applied wall change. Light LOS is rebuilt on the refresh that
/// follows it.
pub fn announce_wall_change(hooks: &mut HookBus, update: HookEvent) {
    hooks.emit(update);
    hooks.emit(HookEvent::LightingRefresh);
    hooks.emit(HookEvent::SightRefresh);
}

/// Executor the door sequencer sees for one poll: validates moves against the
/// scene and queues them.
pub struct SceneExecutor<'a> {
    pub scene: &'a DemoScene,
    pub queue: &'a mut CommandQueue,
}

impl MoveExecutor for SceneExecutor<'_> {
    fn move_token(&mut self, req: &MoveRequest) -> Result<(), MoveError> {
        let doc = self
            .scene
            .token(&req.token)
            .ok_or_else(|| MoveError::MissingDocument(req.token.clone()))?;
        let from = self
            .queue
            .moves
            .iter()
            .rev()
            .find(|m| m.token == req.token)
            .map_or_else(|| doc.center(self.scene.grid.size), |m| m.point);
        let to = self.scene.resolve_move(req, from)?;
        self.queue.animating.insert(req.token.clone());
        self.queue.moves.push(MoveRequest {
            point: to,
            snap: false,
            ..req.clone()
        });
        Ok(())
    }

    fn set_door_state(&mut self, wall: &str, state: DoorState) -> Result<(), MoveError> {
        self.queue.doors.push((wall.to_string(), state));
        Ok(())
    }

    fn is_animating(&self, token: &str) -> bool {
        self.queue.animating.contains(token)
    }
}

/// Screen masks published by the pipeline each frame.
#[derive(Default)]
pub struct MaskTable {
    pub entries: HashMap<String, (TextureRef, MaskMeta)>,
}

impl MaskTable {
    pub fn get(&self, id: &str) -> Option<&(TextureRef, MaskMeta)> {
        self.entries.get(id)
    }
}

impl MaskRegistry for MaskTable {
    fn set_texture(&mut self, id: &str, texture: TextureRef, meta: MaskMeta) {
        self.entries.insert(id.to_string(), (texture, meta));
    }
}
