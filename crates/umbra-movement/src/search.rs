//! Weighted A* over a [`Graph`], with cooperative cancellation.

use std::cell::Cell;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::rc::Rc;

use hashbrown::{HashMap, HashSet};
use umbra_geom::Vec2;

use crate::error::MoveError;
use crate::graph::{END, EdgeOracle, Graph, START};
use crate::lattice::Heuristic;

/// Expansions between cancellation checks.
pub const CANCEL_CHECK_INTERVAL: usize = 32;

/// Shared `{cancelled}` flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Rc<Cell<bool>>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn cancel(&self) {
        self.0.set(true);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.get()
    }
}

/// Monotonic search generation; starting a search bumps it, which
/// invalidates any search still holding an older value.
#[derive(Clone, Debug, Default)]
pub struct Generation(Rc<Cell<u64>>);

impl Generation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bump(&self) -> u64 {
        let next = self.0.get().wrapping_add(1);
        self.0.set(next);
        next
    }

    #[inline]
    pub fn current(&self) -> u64 {
        self.0.get()
    }
}

#[derive(Clone, Copy, Debug)]
pub struct SearchLimits {
    pub weight: f32,
    pub max_iterations: usize,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SearchStats {
    pub iterations: usize,
    pub expansions: usize,
    pub nodes: usize,
    pub truncated: bool,
    pub cost: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct OpenEntry {
    f: f32,
    g: f32,
    node: u32,
}

impl Eq for OpenEntry {}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap on f; ties prefer the deeper node.
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| self.g.total_cmp(&other.g))
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

pub struct SearchControl<'a> {
    pub cancel: &'a CancelToken,
    pub generation: &'a Generation,
    /// Value of `generation` when this search started.
    pub started_at: u64,
}

impl SearchControl<'_> {
    #[inline]
    fn stopped(&self) -> bool {
        self.cancel.is_cancelled() || self.generation.current() != self.started_at
    }
}

/// Returns the node positions from START to END.
pub fn weighted_astar(
    graph: &mut Graph,
    edges: &dyn EdgeOracle,
    heuristic: Heuristic,
    limits: SearchLimits,
    control: &SearchControl<'_>,
) -> (Result<Vec<Vec2>, MoveError>, SearchStats) {
    let goal = graph.point(END);
    let w = limits.weight.clamp(1.0, 4.0);
    let mut stats = SearchStats::default();
    let mut open = BinaryHeap::new();
    let mut best_g: HashMap<u32, f32> = HashMap::new();
    let mut came_from: HashMap<u32, u32> = HashMap::new();
    let mut closed: HashSet<u32> = HashSet::new();
    let mut succ = Vec::with_capacity(8);

    best_g.insert(START, 0.0);
    open.push(OpenEntry {
        f: w * heuristic.estimate(graph.point(START), goal),
        g: 0.0,
        node: START,
    });

    let result = loop {
        let Some(entry) = open.pop() else {
            break Err(MoveError::NoPath);
        };
        stats.iterations += 1;
        if stats.iterations > limits.max_iterations {
            break Err(MoveError::MaxIterations);
        }
        if closed.contains(&entry.node) {
            continue;
        }
        if entry.node == END {
            stats.cost = entry.g;
            break Ok(reconstruct(graph, &came_from));
        }
        if stats.expansions % CANCEL_CHECK_INTERVAL == 0 && control.stopped() {
            break Err(MoveError::Cancelled);
        }
        stats.expansions += 1;
        closed.insert(entry.node);

        let here = graph.point(entry.node);
        graph.successors(entry.node, &mut succ);
        for &next in &succ {
            if closed.contains(&next) {
                continue;
            }
            let there = graph.point(next);
            let Some(cost) = edges.edge_cost(here, there) else {
                continue;
            };
            let g = entry.g + cost;
            if best_g.get(&next).is_some_and(|&old| old <= g) {
                continue;
            }
            best_g.insert(next, g);
            came_from.insert(next, entry.node);
            open.push(OpenEntry {
                f: g + w * heuristic.estimate(there, goal),
                g,
                node: next,
            });
        }
    };
    stats.nodes = graph.len();
    stats.truncated = graph.truncated();
    (result, stats)
}

fn reconstruct(graph: &Graph, came_from: &HashMap<u32, u32>) -> Vec<Vec2> {
    let mut out = vec![graph.point(END)];
    let mut cur = END;
    while let Some(&prev) = came_from.get(&cur) {
        out.push(graph.point(prev));
        cur = prev;
        if cur == START {
            break;
        }
    }
    out.reverse();
    out
}

#[inline]
pub fn path_length(path: &[Vec2]) -> f32 {
    path.windows(2).map(|w| w[0].distance(w[1])).sum()
}

/// String-pulling: from each kept node jump to the farthest later node
/// reachable by one admissible edge.
pub fn smooth_path(path: &[Vec2], edges: &dyn EdgeOracle) -> Vec<Vec2> {
    if path.len() <= 2 {
        return path.to_vec();
    }
    let mut out = vec![path[0]];
    let mut i = 0;
    while i < path.len() - 1 {
        let mut next = i + 1;
        for j in (i + 2..path.len()).rev() {
            if edges.edge_cost(path[i], path[j]).is_some() {
                next = j;
                break;
            }
        }
        out.push(path[next]);
        i = next;
    }
    out
}

/// Drops intermediate nodes the viewer cannot see. Endpoints are kept.
pub fn redact_path(path: &[Vec2], is_gm: bool, visible: impl Fn(Vec2) -> bool) -> Vec<Vec2> {
    if is_gm || path.len() <= 2 {
        return path.to_vec();
    }
    let last = path.len() - 1;
    path.iter()
        .enumerate()
        .filter(|&(i, p)| i == 0 || i == last || visible(*p))
        .map(|(_, p)| *p)
        .collect()
}
