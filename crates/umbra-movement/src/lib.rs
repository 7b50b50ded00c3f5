//! Token movement: styles and tracks, flying hover, the weighted A* planner
//! with parity arbitration, door planning and the door sequencer.

pub mod doors;
pub mod error;
pub mod graph;
pub mod hover;
pub mod lattice;
pub mod parity;
pub mod planner;
pub mod search;
pub mod sequencer;
pub mod style;
pub mod track;

pub use doors::{DoorPlan, DoorStep, plan_doors};
pub use error::MoveError;
pub use graph::{DoorWall, EdgeOracle, FlatTerrain, Graph, SceneEdges, TerrainCost};
pub use hover::{FlyingHover, GroundIndicator, HoverPose, dashed_tether};
pub use lattice::{Heuristic, Lattice, NodeKey};
pub use parity::{ParityVerdict, PathSource, arbitrate};
pub use planner::{MovePlan, MovementPlanner, PlanDiagnostics, PlanRequest, PlanServices};
pub use search::{
    CancelToken, Generation, SearchControl, SearchLimits, SearchStats, path_length, redact_path,
    smooth_path, weighted_astar,
};
pub use sequencer::{
    DoorSequencer, MoveExecutor, MoveRequest, SequenceEnv, SequenceReport, SequencerState,
    TransitionRecord,
};
pub use style::{Animator, FlyingGlide, PickUpDrop, StylePose, StyleRegistry, Walk};
pub use track::{SpritePose, StartTrack, Track, TrackManager, TrackUpdate};

#[cfg(test)]
mod tests;
