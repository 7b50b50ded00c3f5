//! Traversal lattices: square 4/8-connected, hex (axial) and gridless.

use umbra_geom::Vec2;
use umbra_scene::config::LatticeChoice;
use umbra_scene::{GridInfo, GridKind};

const SQRT3_2: f32 = 0.866_025_4;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey(pub i32, pub i32);

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Lattice {
    Square4 { step: f32 },
    Square8 { step: f32 },
    /// Axial coordinates; `columns` swaps the axes for flat-topped grids.
    Hex { step: f32, columns: bool },
    Gridless { step: f32 },
}

const SQUARE4: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
const SQUARE8: [(i32, i32); 8] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];
const HEX6: [(i32, i32); 6] = [(1, 0), (-1, 0), (0, 1), (0, -1), (1, -1), (-1, 1)];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Heuristic {
    Octile,
    Manhattan,
    Euclidean,
}

impl Heuristic {
    #[inline]
    pub fn estimate(self, a: Vec2, b: Vec2) -> f32 {
        let dx = (a.x - b.x).abs();
        let dy = (a.y - b.y).abs();
        match self {
            Heuristic::Octile => dx.max(dy) + (std::f32::consts::SQRT_2 - 1.0) * dx.min(dy),
            Heuristic::Manhattan => dx + dy,
            Heuristic::Euclidean => (dx * dx + dy * dy).sqrt(),
        }
    }
}

impl Lattice {
    pub fn for_scene(
        choice: LatticeChoice,
        grid: &GridInfo,
        gridless_step: f32,
        allow_diagonals: bool,
    ) -> Lattice {
        let size = grid.size.max(1.0);
        let gridless = Lattice::Gridless {
            step: gridless_step.max(1.0),
        };
        match choice {
            LatticeChoice::Square4 => Lattice::Square4 { step: size },
            LatticeChoice::Square8 => Lattice::Square8 { step: size },
            LatticeChoice::Hex => Lattice::Hex {
                step: size,
                columns: grid.kind == GridKind::HexColumns,
            },
            LatticeChoice::Gridless => gridless,
            LatticeChoice::Auto => match grid.kind {
                GridKind::Square if allow_diagonals => Lattice::Square8 { step: size },
                GridKind::Square => Lattice::Square4 { step: size },
                GridKind::HexRows => Lattice::Hex {
                    step: size,
                    columns: false,
                },
                GridKind::HexColumns => Lattice::Hex {
                    step: size,
                    columns: true,
                },
                GridKind::Gridless => gridless,
            },
        }
    }

    #[inline]
    pub fn step(&self) -> f32 {
        match *self {
            Lattice::Square4 { step }
            | Lattice::Square8 { step }
            | Lattice::Hex { step, .. }
            | Lattice::Gridless { step } => step,
        }
    }

    /// Longest edge between neighbouring nodes.
    #[inline]
    pub fn max_edge(&self) -> f32 {
        match self {
            Lattice::Square8 { step } | Lattice::Gridless { step } => {
                step * std::f32::consts::SQRT_2
            }
            _ => self.step(),
        }
    }

    pub fn offsets(&self) -> &'static [(i32, i32)] {
        match self {
            Lattice::Square4 { .. } => &SQUARE4,
            Lattice::Square8 { .. } | Lattice::Gridless { .. } => &SQUARE8,
            Lattice::Hex { .. } => &HEX6,
        }
    }

    pub fn heuristic(&self) -> Heuristic {
        match self {
            Lattice::Square8 { .. } => Heuristic::Octile,
            Lattice::Square4 { .. } => Heuristic::Manhattan,
            Lattice::Hex { .. } | Lattice::Gridless { .. } => Heuristic::Euclidean,
        }
    }

    /// Position of `key` relative to `origin` (the key `(0,0)`).
    pub fn point(&self, origin: Vec2, key: NodeKey) -> Vec2 {
        let (i, j) = (key.0 as f32, key.1 as f32);
        match *self {
            Lattice::Square4 { step } | Lattice::Square8 { step } | Lattice::Gridless { step } => {
                origin + Vec2::new(i * step, j * step)
            }
            Lattice::Hex {
                step,
                columns: false,
            } => origin + Vec2::new(step * (i + j * 0.5), step * SQRT3_2 * j),
            Lattice::Hex {
                step,
                columns: true,
            } => origin + Vec2::new(step * SQRT3_2 * i, step * (j + i * 0.5)),
        }
    }

    pub fn neighbors(&self, key: NodeKey) -> impl Iterator<Item = NodeKey> + '_ {
        self.offsets()
            .iter()
            .map(move |(di, dj)| NodeKey(key.0 + di, key.1 + dj))
    }

    /// The key whose node lies within half a pixel of `p`, if any.
    pub fn key_near(&self, origin: Vec2, p: Vec2) -> Option<NodeKey> {
        let d = p - origin;
        let step = self.step();
        let (fi, fj) = match *self {
            Lattice::Hex {
                columns: false, ..
            } => {
                let j = d.y / (step * SQRT3_2);
                (d.x / step - j * 0.5, j)
            }
            Lattice::Hex { columns: true, .. } => {
                let i = d.x / (step * SQRT3_2);
                (i, d.y / step - i * 0.5)
            }
            _ => (d.x / step, d.y / step),
        };
        if !fi.is_finite() || !fj.is_finite() {
            return None;
        }
        let key = NodeKey(fi.round() as i32, fj.round() as i32);
        (self.point(origin, key).distance(p) < 0.5).then_some(key)
    }
}
