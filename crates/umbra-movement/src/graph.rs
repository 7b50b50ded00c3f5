//! Bounded traversal graph built lazily over a lattice, and the edge
//! admission rules (collision, doors, fog, cost).

use hashbrown::HashMap;
use umbra_geom::{Rect, Segment, Vec2};
use umbra_scene::{
    CollisionKind, CollisionMode, CollisionQuery, DocId, DoorKind, DoorState, PolygonBackends,
    SceneHost, WallDirectionMode, WallDoc,
};

use crate::lattice::{Lattice, NodeKey};

pub const START: u32 = 0;
pub const END: u32 = 1;

pub struct Graph {
    lattice: Lattice,
    origin: Vec2,
    end: Vec2,
    bounds: Rect,
    cap: usize,
    nodes: Vec<Vec2>,
    keys: HashMap<NodeKey, u32>,
    truncated: bool,
}

impl Graph {
    pub fn new(lattice: Lattice, start: Vec2, end: Vec2, bounds: Rect, cap: usize) -> Self {
        let mut keys = HashMap::new();
        keys.insert(NodeKey(0, 0), START);
        if let Some(k) = lattice.key_near(start, end) {
            keys.insert(k, END);
        }
        Self {
            lattice,
            origin: start,
            end,
            bounds,
            cap: cap.max(2),
            nodes: vec![start, end],
            keys,
            truncated: false,
        }
    }

    /// Search bounds: the endpoints' box grown by `max(3 * grid, margin)`,
    /// clipped to the scene.
    pub fn bounds_for(start: Vec2, end: Vec2, grid_size: f32, margin: f32, scene: Rect) -> Rect {
        Rect::from_points(start, end)
            .expanded((3.0 * grid_size).max(margin))
            .intersect(&scene)
    }

    #[inline]
    pub fn point(&self, node: u32) -> Vec2 {
        self.nodes[node as usize]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn truncated(&self) -> bool {
        self.truncated
    }

    #[inline]
    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    fn node_for(&mut self, key: NodeKey) -> Option<u32> {
        if let Some(&id) = self.keys.get(&key) {
            return Some(id);
        }
        let p = self.lattice.point(self.origin, key);
        if !self.bounds.contains(p) {
            return None;
        }
        if self.nodes.len() >= self.cap {
            self.truncated = true;
            return None;
        }
        let id = self.nodes.len() as u32;
        self.nodes.push(p);
        self.keys.insert(key, id);
        Some(id)
    }

    fn key_of(&self, node: u32) -> Option<NodeKey> {
        if node == START {
            return Some(NodeKey(0, 0));
        }
        self.lattice.key_near(self.origin, self.point(node))
    }

    /// Neighbours of `node`; END is adjacent to any node within one edge of it.
    pub fn successors(&mut self, node: u32, out: &mut Vec<u32>) {
        out.clear();
        if node == END {
            return;
        }
        let here = self.point(node);
        if let Some(key) = self.key_of(node) {
            let lattice = self.lattice;
            for k in lattice.neighbors(key) {
                if let Some(id) = self.node_for(k) {
                    out.push(id);
                }
            }
        }
        if !out.contains(&END) && here.distance(self.end) <= self.lattice.max_edge() + 1e-3 {
            out.push(END);
        }
    }
}

/// Per-edge cost, or `None` when the edge is not admissible.
pub trait EdgeOracle {
    fn edge_cost(&self, a: Vec2, b: Vec2) -> Option<f32>;
}

pub trait TerrainCost {
    fn multiplier(&self, a: Vec2, b: Vec2) -> f32;
}

pub struct FlatTerrain;

impl TerrainCost for FlatTerrain {
    #[inline]
    fn multiplier(&self, _a: Vec2, _b: Vec2) -> f32 {
        1.0
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DoorWall {
    pub id: DocId,
    pub segment: Segment,
    pub kind: DoorKind,
    pub state: DoorState,
}

impl DoorWall {
    pub fn from_doc(w: &WallDoc) -> Option<Self> {
        w.is_door().then(|| Self {
            id: w.id.clone(),
            segment: w.segment(),
            kind: w.door,
            state: w.ds,
        })
    }

    /// Whether a path may plan to go through this door.
    pub fn passable(&self, is_gm: bool) -> bool {
        match (self.state, self.kind) {
            (DoorState::Open, _) => true,
            (DoorState::Locked, _) => is_gm,
            (DoorState::Closed, DoorKind::Secret) => is_gm,
            (DoorState::Closed, _) => true,
        }
    }
}

/// Door walls a segment crosses, ordered along the segment, with the
/// crossing parameter.
pub fn doors_crossed<'d>(doors: &'d [DoorWall], a: Vec2, b: Vec2) -> Vec<(f32, &'d DoorWall)> {
    let seg = Segment::new(a, b);
    let mut out: Vec<(f32, &DoorWall)> = doors
        .iter()
        .filter_map(|d| seg.intersect(&d.segment).map(|(t, _)| (t, d)))
        .collect();
    out.sort_by(|x, y| x.0.total_cmp(&y.0));
    out
}

pub struct SceneEdges<'a> {
    pub host: &'a dyn SceneHost,
    pub backends: &'a dyn PolygonBackends,
    pub terrain: &'a dyn TerrainCost,
    pub source: Option<DocId>,
    pub doors: Vec<DoorWall>,
    pub is_gm: bool,
    pub strict_no_fog: bool,
    pub start: Vec2,
    pub end: Vec2,
    pub grid_size: f32,
    pub door_penalty_grid: f32,
    pub occupied: Vec<Vec2>,
    pub occupancy_penalty: f32,
}

impl SceneEdges<'_> {
    fn fog_ok(&self, p: Vec2) -> bool {
        if !self.strict_no_fog || self.is_gm {
            return true;
        }
        p == self.start || p == self.end || self.host.is_point_visible(p)
    }

    /// Collision in backend order; hits on doors the path may open are ignored.
    fn collides(&self, a: Vec2, b: Vec2, openable: &[&DocId]) -> bool {
        for kind in CollisionKind::ORDER {
            let query = CollisionQuery {
                mode: CollisionMode::All,
                kind,
                source: self.source.clone(),
                wall_direction_mode: WallDirectionMode::Normal,
            };
            let hits = self.backends.test_collision(a, b, &query);
            let blocking = hits.iter().any(|h| match &h.wall_id {
                Some(id) => !openable.contains(&id),
                None => true,
            });
            if blocking {
                return true;
            }
        }
        false
    }
}

impl EdgeOracle for SceneEdges<'_> {
    fn edge_cost(&self, a: Vec2, b: Vec2) -> Option<f32> {
        if !self.fog_ok(a) || !self.fog_ok(b) {
            return None;
        }
        let crossed = doors_crossed(&self.doors, a, b);
        let mut openable = Vec::with_capacity(crossed.len());
        let mut door_cost = 0.0;
        for (_, d) in &crossed {
            if d.state == DoorState::Open {
                continue;
            }
            if !d.passable(self.is_gm) {
                return None;
            }
            openable.push(&d.id);
            door_cost += self.door_penalty_grid * self.grid_size;
        }
        if self.collides(a, b, &openable) {
            return None;
        }
        let mut cost = a.distance(b) * self.terrain.multiplier(a, b).max(0.0) + door_cost;
        if self.occupancy_penalty > 0.0 && b != self.end {
            let r = self.grid_size * 0.5;
            if self.occupied.iter().any(|o| o.distance(b) < r) {
                cost += self.occupancy_penalty * self.grid_size;
            }
        }
        cost.is_finite().then_some(cost)
    }
}
