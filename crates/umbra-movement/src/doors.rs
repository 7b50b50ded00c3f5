//! Door-aware planning: which doors a path opens and where the token waits.

use umbra_geom::{Segment, Vec2};
use umbra_scene::config::DoorClosePolicy;
use umbra_scene::{DocId, DoorState};

use crate::graph::{DoorWall, doors_crossed};

#[derive(Clone, Debug, PartialEq)]
pub struct DoorStep {
    /// Index of the path segment `path[i] -> path[i + 1]` crossing the door.
    pub segment_index: usize,
    pub wall_id: DocId,
    pub crossing: Vec2,
    /// `offset` before the door along the segment.
    pub hold_point: Vec2,
    /// `offset` past the door.
    pub entry_point: Vec2,
    pub close_after_crossing: bool,
    pub state_at_plan: DoorState,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DoorPlan {
    pub path: Vec<Vec2>,
    pub steps: Vec<DoorStep>,
    /// Host door revision when the plan was made.
    pub revision: u64,
}

impl DoorPlan {
    pub fn is_plain(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Splits segments so each crosses at most one closed door, then inserts a
/// step per closed door in path order.
pub fn plan_doors(
    path: &[Vec2],
    doors: &[DoorWall],
    policy: DoorClosePolicy,
    in_combat: bool,
    offset: f32,
    revision: u64,
) -> DoorPlan {
    let closed: Vec<DoorWall> = doors
        .iter()
        .filter(|d| d.state != DoorState::Open)
        .cloned()
        .collect();

    let mut split = Vec::with_capacity(path.len());
    for (i, w) in path.windows(2).enumerate() {
        if i == 0 {
            split.push(w[0]);
        }
        let hits = doors_crossed(&closed, w[0], w[1]);
        let seg = Segment::new(w[0], w[1]);
        for pair in hits.windows(2) {
            split.push(seg.point_at((pair[0].0 + pair[1].0) * 0.5));
        }
        split.push(w[1]);
    }
    if split.is_empty() {
        split.extend_from_slice(path);
    }

    let close = policy.should_close(in_combat);
    let mut steps = Vec::new();
    for (i, w) in split.windows(2).enumerate() {
        let Some((t, door)) = doors_crossed(&closed, w[0], w[1]).into_iter().next() else {
            continue;
        };
        let seg = Segment::new(w[0], w[1]);
        let dir = seg.direction();
        let crossing = seg.point_at(t);
        steps.push(DoorStep {
            segment_index: i,
            wall_id: door.id.clone(),
            crossing,
            hold_point: crossing - dir * offset,
            entry_point: crossing + dir * offset,
            close_after_crossing: close,
            state_at_plan: door.state,
        });
        log::debug!(target: "movement", "door step {} on segment {i} ({:?})", door.id, door.state);
    }
    DoorPlan {
        path: split,
        steps,
        revision,
    }
}
