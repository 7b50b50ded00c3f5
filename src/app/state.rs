use std::path::PathBuf;
use std::rc::Rc;
use std::sync::mpsc::Receiver;
use std::time::Instant;

use umbra_geom::Vec2;
use umbra_lighting::SourceRegistry;
use umbra_movement::{Animator, DoorSequencer, MovementPlanner, StyleRegistry, TrackManager};
use umbra_pipeline::FramePipeline;
use umbra_render_raylib::{RaylibBackend, View2D};
use umbra_scene::{DocId, EngineConfig, HookBus};
use umbra_visibility::VisibilityController;

use super::host::{CommandQueue, DemoScene, MaskTable};

pub struct App {
    pub config: EngineConfig,
    pub scene: DemoScene,
    pub hooks: HookBus,
    pub registry: SourceRegistry,
    pub pipeline: FramePipeline,
    pub backend: RaylibBackend,
    pub masks: MaskTable,
    pub planner: MovementPlanner,
    pub styles: StyleRegistry,
    pub fallback_style: Rc<dyn Animator>,
    pub tracks: TrackManager,
    pub visibility: VisibilityController,
    pub commands: CommandQueue,
    pub active_move: Option<ActiveMove>,
    pub selected: Option<DocId>,
    pub view: View2D,
    pub debug_stats: DebugStats,
    pub show_overlay: bool,
    pub(crate) started: Instant,
    pub(crate) frame: u64,
    pub(crate) config_path: Option<PathBuf>,
    pub(crate) config_event_rx: Option<Receiver<()>>,
    pub(crate) lightning_until_ms: Option<f64>,
}

/// A planned move being walked through the door sequencer.
pub struct ActiveMove {
    pub sequencer: DoorSequencer,
    /// Path as the user is allowed to see it.
    pub shown_path: Vec<Vec2>,
    pub target: Vec2,
    pub attempt: u32,
}

#[derive(Default)]
pub struct DebugStats {
    pub passes: usize,
    pub sprite_draws: usize,
    pub light_draws: usize,
    pub darkness_draws: usize,
    pub mesh_uploads: usize,
    pub sources: usize,
    pub rebuilt_last: usize,
    pub fallbacks: usize,
    pub hooks_delivered: usize,
    pub visibility_refreshes: u64,
    pub last_plan: Option<String>,
    pub last_move: Option<String>,
    pub last_error: Option<String>,
}
