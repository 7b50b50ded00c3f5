use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::task::Poll;

use umbra_geom::{Rect, Segment, Vec2};
use umbra_scene::config::{DoorClosePolicy, MovementConfig, StyleConfig};
use umbra_scene::{
    CollisionHit, CollisionKind, CollisionQuery, DoorKind, DoorState, Environment, GridInfo,
    GridKind, LightDoc, PathFinder, PathFinderOptions, PermissionService, PolygonBackends,
    SceneDimensions, SceneHost, TileDoc, TokenDoc, TokenFlags, WallDoc,
};

use crate::*;

struct Scene {
    walls: RefCell<Vec<WallDoc>>,
    tokens: Vec<TokenDoc>,
    revision: Cell<u64>,
    /// Fog: visible region, `None` = everything.
    visible: Option<Rect>,
}

impl Scene {
    fn new(walls: Vec<WallDoc>) -> Self {
        Self {
            walls: RefCell::new(walls),
            tokens: vec![token()],
            revision: Cell::new(0),
            visible: None,
        }
    }

    fn set_door(&self, id: &str, ds: DoorState) {
        for w in self.walls.borrow_mut().iter_mut() {
            if w.id == id {
                w.ds = ds;
            }
        }
        self.revision.set(self.revision.get() + 1);
    }

    fn door_state(&self, id: &str) -> Option<DoorState> {
        self.walls.borrow().iter().find(|w| w.id == id).map(|w| w.ds)
    }
}

impl SceneHost for Scene {
    fn grid(&self) -> GridInfo {
        GridInfo::default()
    }
    fn dimensions(&self) -> SceneDimensions {
        SceneDimensions {
            width: 1000.0,
            height: 1000.0,
            scene_x: 0.0,
            scene_y: 0.0,
            scene_width: 1000.0,
            scene_height: 1000.0,
            distance: 5.0,
            size: 100.0,
        }
    }
    fn environment(&self) -> Environment {
        Environment::default()
    }
    fn lights(&self) -> Vec<LightDoc> {
        Vec::new()
    }
    fn walls(&self) -> Vec<WallDoc> {
        self.walls.borrow().clone()
    }
    fn tokens(&self) -> Vec<TokenDoc> {
        self.tokens.clone()
    }
    fn tiles(&self) -> Vec<TileDoc> {
        Vec::new()
    }
    fn light_los(&self, _id: &str) -> Option<Vec<f32>> {
        None
    }
    fn door_revision(&self) -> u64 {
        self.revision.get()
    }
    fn is_point_visible(&self, p: Vec2) -> bool {
        self.visible.is_none_or(|r| r.contains(p))
    }
}

struct Backends<'a> {
    scene: &'a Scene,
    kinds: RefCell<Vec<CollisionKind>>,
}

impl<'a> Backends<'a> {
    fn new(scene: &'a Scene) -> Self {
        Self {
            scene,
            kinds: RefCell::new(Vec::new()),
        }
    }
}

impl PolygonBackends for Backends<'_> {
    fn test_collision(&self, a: Vec2, b: Vec2, query: &CollisionQuery) -> Vec<CollisionHit> {
        self.kinds.borrow_mut().push(query.kind);
        if query.kind != CollisionKind::Move {
            return Vec::new();
        }
        let seg = Segment::new(a, b);
        self.scene
            .walls
            .borrow()
            .iter()
            .filter(|w| !w.is_open())
            .filter_map(|w| {
                seg.intersect(&w.segment()).map(|(t, _)| CollisionHit {
                    point: seg.point_at(t),
                    wall_id: Some(w.id.clone()),
                })
            })
            .collect()
    }
}

struct Perms {
    gm: bool,
    combat: bool,
    allow: bool,
}

impl Perms {
    fn player() -> Self {
        Self {
            gm: false,
            combat: false,
            allow: true,
        }
    }

    fn gm() -> Self {
        Self {
            gm: true,
            ..Self::player()
        }
    }
}

impl PermissionService for Perms {
    fn is_gm(&self) -> bool {
        self.gm
    }
    fn can_modify_wall(&self, _wall: &WallDoc, _ds: DoorState) -> bool {
        self.allow
    }
    fn combat_started(&self) -> bool {
        self.combat
    }
}

struct Exec<'a> {
    scene: &'a Scene,
    auto_doors: bool,
    moves: Vec<MoveRequest>,
    door_requests: Vec<(String, DoorState)>,
    animating_until: Option<u64>,
    now: Rc<Cell<u64>>,
}

impl<'a> Exec<'a> {
    fn new(scene: &'a Scene) -> Self {
        Self {
            scene,
            auto_doors: true,
            moves: Vec::new(),
            door_requests: Vec::new(),
            animating_until: None,
            now: Rc::new(Cell::new(0)),
        }
    }
}

impl MoveExecutor for Exec<'_> {
    fn move_token(&mut self, req: &MoveRequest) -> Result<(), MoveError> {
        self.moves.push(req.clone());
        Ok(())
    }
    fn set_door_state(&mut self, wall: &str, state: DoorState) -> Result<(), MoveError> {
        self.door_requests.push((wall.to_string(), state));
        if self.auto_doors {
            self.scene.set_door(wall, state);
        }
        Ok(())
    }
    fn is_animating(&self, _token: &str) -> bool {
        self.animating_until.is_some_and(|t| self.now.get() < t)
    }
}

fn token() -> TokenDoc {
    TokenDoc {
        id: "tok".into(),
        x: 100.0,
        y: 400.0,
        ..TokenDoc::default()
    }
}

fn wall(id: &str, c: [f32; 4]) -> WallDoc {
    WallDoc {
        id: id.into(),
        c,
        ..WallDoc::default()
    }
}

fn door(id: &str, c: [f32; 4], ds: DoorState) -> WallDoc {
    WallDoc {
        id: id.into(),
        c,
        door: DoorKind::Door,
        ds,
    }
}

/// Full-height wall at x = 400 with a door spanning y 400..600.
fn door_room(ds: DoorState) -> Vec<WallDoc> {
    vec![
        wall("w-top", [400.0, 0.0, 400.0, 400.0]),
        door("door", [400.0, 400.0, 400.0, 600.0], ds),
        wall("w-bottom", [400.0, 600.0, 400.0, 1000.0]),
    ]
}

const START: Vec2 = Vec2::new(150.0, 450.0);
const END: Vec2 = Vec2::new(750.0, 450.0);

fn plan_with(
    scene: &Scene,
    perms: &Perms,
    cfg: MovementConfig,
    cancel: &CancelToken,
) -> Result<MovePlan, MoveError> {
    let backends = Backends::new(scene);
    let planner = MovementPlanner::new(cfg);
    let svc = PlanServices {
        host: scene,
        backends: &backends,
        permissions: perms,
        path_finder: None,
    };
    let tok = token();
    planner.plan(
        &svc,
        &PlanRequest {
            token: &tok,
            start: START,
            end: END,
            terrain: &FlatTerrain,
            cancel,
        },
    )
}

fn plan(scene: &Scene, perms: &Perms) -> Result<MovePlan, MoveError> {
    plan_with(scene, perms, MovementConfig::default(), &CancelToken::new())
}

fn run(seq: &mut DoorSequencer, scene: &Scene, perms: &Perms, exec: &mut Exec<'_>) -> SequenceReport {
    let mut now = 0;
    while now < 60_000 {
        exec.now.set(now);
        let mut env = SequenceEnv {
            host: scene,
            permissions: perms,
            executor: &mut *exec,
        };
        if let Poll::Ready(r) = seq.poll(now, &mut env) {
            return r;
        }
        now += 16;
    }
    panic!("sequence did not finish");
}

fn states(report: &SequenceReport) -> Vec<SequencerState> {
    report.records.iter().map(|r| r.state).collect()
}

fn crosses_wall(path: &[Vec2], w: &WallDoc) -> bool {
    path.windows(2)
        .any(|p| Segment::new(p[0], p[1]).intersect(&w.segment()).is_some())
}

#[test]
fn direct_line_when_admissible() {
    let scene = Scene::new(Vec::new());
    let plan = plan(&scene, &Perms::player()).unwrap();
    assert_eq!(plan.path(), &[START, END]);
    assert_eq!(plan.source, PathSource::Direct);
    assert!((plan.length() - START.distance(END)).abs() < 1e-3);
    assert!(plan.doors.is_plain());
}

#[test]
fn collision_backends_consulted_in_order() {
    let scene = Scene::new(Vec::new());
    let backends = Backends::new(&scene);
    let edges = SceneEdges {
        host: &scene,
        backends: &backends,
        terrain: &FlatTerrain,
        source: Some("tok".into()),
        doors: Vec::new(),
        is_gm: false,
        strict_no_fog: false,
        start: START,
        end: END,
        grid_size: 100.0,
        door_penalty_grid: 0.25,
        occupied: Vec::new(),
        occupancy_penalty: 0.0,
    };
    assert!(edges.edge_cost(START, END).is_some());
    assert_eq!(
        *backends.kinds.borrow(),
        vec![CollisionKind::Move, CollisionKind::Sight, CollisionKind::Light]
    );
}

#[test]
fn routes_around_a_wall() {
    let blocker = wall("w", [400.0, 0.0, 400.0, 700.0]);
    let scene = Scene::new(vec![blocker.clone()]);
    let plan = plan(&scene, &Perms::player()).unwrap();
    let path = plan.path();
    assert_eq!(path.first(), Some(&START));
    assert_eq!(path.last(), Some(&END));
    assert!(!crosses_wall(path, &blocker));
    assert!(plan.length() > START.distance(END));
    assert_eq!(plan.source, PathSource::Planner);
    assert!(plan.diagnostics.search.expansions > 0);
    assert!(path.len() <= plan.diagnostics.smoothed_from);
}

#[test]
fn sealed_wall_has_no_path() {
    let scene = Scene::new(vec![wall("w", [400.0, 0.0, 400.0, 1000.0])]);
    let err = plan(&scene, &Perms::gm()).unwrap_err();
    assert_eq!(err.reason(), "no-path");
}

#[test]
fn closed_door_is_crossed_with_a_step() {
    let scene = Scene::new(door_room(DoorState::Closed));
    let plan = plan(&scene, &Perms::player()).unwrap();
    assert_eq!(plan.path(), &[START, END]);
    assert_eq!(plan.doors.steps.len(), 1);
    let step = &plan.doors.steps[0];
    assert_eq!(step.wall_id, "door");
    assert_eq!(step.segment_index, 0);
    assert!((step.hold_point.x - 392.0).abs() < 1e-3);
    assert!((step.entry_point.x - 408.0).abs() < 1e-3);
    assert!(step.close_after_crossing);
    assert_eq!(plan.doors.revision, 0);
}

#[test]
fn open_door_needs_no_step() {
    let scene = Scene::new(door_room(DoorState::Open));
    let plan = plan(&scene, &Perms::player()).unwrap();
    assert!(plan.doors.is_plain());
}

#[test]
fn locked_door_blocks_players() {
    let scene = Scene::new(door_room(DoorState::Locked));
    assert_eq!(plan(&scene, &Perms::player()).unwrap_err(), MoveError::NoPath);
}

#[test]
fn door_sequence_runs_every_state_in_order() {
    let scene = Scene::new(door_room(DoorState::Closed));
    let perms = Perms::player();
    let plan = plan(&scene, &perms).unwrap();
    let mut seq = DoorSequencer::new("tok", plan.doors, MovementConfig::default(), 100.0);
    let mut exec = Exec::new(&scene);
    let report = run(&mut seq, &scene, &perms, &mut exec);
    assert!(report.ok(), "{:?}", report.result);
    use SequencerState::*;
    assert_eq!(
        states(&report),
        vec![
            ApproachDoor,
            PreDoorHold,
            RequestDoorOpen,
            WaitForDoorOpen,
            CrossDoor,
            PostDoorPolicyEval,
            RequestDoorClose,
            ResumePath,
        ]
    );
    assert!(report.records.iter().all(|r| r.ok && r.wall_id == "door"));
    let ts: Vec<u64> = report.records.iter().map(|r| r.timestamp_ms).collect();
    assert!(ts.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(exec.moves.len(), 3);
    assert!(exec.moves[0].ignore_walls && !exec.moves[0].snap);
    assert!(!exec.moves[2].ignore_walls && exec.moves[2].snap);
    assert!(exec.moves.iter().all(|m| !m.show_waypoint));
    assert_eq!(exec.moves[2].point, END);
    assert_eq!(
        exec.door_requests,
        vec![
            ("door".to_string(), DoorState::Open),
            ("door".to_string(), DoorState::Closed)
        ]
    );
    assert_eq!(scene.door_state("door"), Some(DoorState::Closed));
}

#[test]
fn locked_door_fails_before_any_move() {
    let scene = Scene::new(door_room(DoorState::Locked));
    let perms = Perms::gm();
    let plan = plan(&scene, &perms).unwrap();
    assert_eq!(plan.doors.steps.len(), 1);
    let mut seq = DoorSequencer::new("tok", plan.doors, MovementConfig::default(), 100.0);
    let mut exec = Exec::new(&scene);
    let report = run(&mut seq, &scene, &perms, &mut exec);
    assert_eq!(report.reason(), Some("locked"));
    assert!(exec.moves.is_empty());
    assert!(exec.door_requests.is_empty());
    use SequencerState::*;
    assert_eq!(
        states(&report),
        vec![ApproachDoor, PreDoorHold, RequestDoorOpen, WaitForDoorOpen]
    );
    let wait = &report.records[3];
    assert!(!wait.ok);
    assert_eq!(wait.reason, Some("locked"));
}

#[test]
fn revision_change_forces_replan() {
    let scene = Scene::new(door_room(DoorState::Closed));
    let perms = Perms::player();
    let plan = plan(&scene, &perms).unwrap();
    scene.revision.set(7);
    let mut seq = DoorSequencer::new("tok", plan.doors, MovementConfig::default(), 100.0);
    let mut exec = Exec::new(&scene);
    let report = run(&mut seq, &scene, &perms, &mut exec);
    assert_eq!(report.reason(), Some("door-revision-mismatch"));
    assert!(report.result.as_ref().unwrap_err().wants_replan());
    assert!(exec.moves.is_empty());
}

#[test]
fn permission_denied_is_not_retried() {
    let scene = Scene::new(door_room(DoorState::Closed));
    let perms = Perms {
        allow: false,
        ..Perms::player()
    };
    let plan = plan(&scene, &perms).unwrap();
    let mut seq = DoorSequencer::new("tok", plan.doors, MovementConfig::default(), 100.0);
    let mut exec = Exec::new(&scene);
    let report = run(&mut seq, &scene, &perms, &mut exec);
    assert_eq!(report.reason(), Some("permission-denied"));
    assert!(exec.door_requests.is_empty());
}

#[test]
fn player_auto_doors_can_be_disabled() {
    let scene = Scene::new(door_room(DoorState::Closed));
    let perms = Perms::player();
    let cfg = MovementConfig {
        player_auto_doors: false,
        ..MovementConfig::default()
    };
    let plan = plan(&scene, &perms).unwrap();
    let mut seq = DoorSequencer::new("tok", plan.doors.clone(), cfg.clone(), 100.0);
    let mut exec = Exec::new(&scene);
    let report = run(&mut seq, &scene, &perms, &mut exec);
    assert_eq!(report.reason(), Some("player-auto-door-disabled"));

    // A GM is unaffected.
    let gm = Perms::gm();
    let mut seq = DoorSequencer::new("tok", plan.doors, cfg, 100.0);
    let mut exec = Exec::new(&scene);
    assert!(run(&mut seq, &scene, &gm, &mut exec).ok());
}

#[test]
fn door_that_never_opens_times_out() {
    let scene = Scene::new(door_room(DoorState::Closed));
    let perms = Perms::player();
    let plan = plan(&scene, &perms).unwrap();
    let mut seq = DoorSequencer::new("tok", plan.doors, MovementConfig::default(), 100.0);
    let mut exec = Exec::new(&scene);
    exec.auto_doors = false;
    let report = run(&mut seq, &scene, &perms, &mut exec);
    assert_eq!(report.reason(), Some("door-open-timeout"));
    let last = report.records.last().unwrap();
    assert_eq!(last.state, SequencerState::WaitForDoorOpen);
    assert!(!last.ok);
    let open = report
        .records
        .iter()
        .find(|r| r.state == SequencerState::RequestDoorOpen)
        .unwrap();
    assert!(last.timestamp_ms - open.timestamp_ms >= 1200);
    assert_eq!(exec.moves.len(), 1);
}

#[test]
fn close_policy_never_leaves_door_open() {
    let scene = Scene::new(door_room(DoorState::Closed));
    let perms = Perms::player();
    let cfg = MovementConfig {
        door_close_policy: DoorClosePolicy::Never,
        ..MovementConfig::default()
    };
    let plan = plan_with(&scene, &perms, cfg.clone(), &CancelToken::new()).unwrap();
    assert!(!plan.doors.steps[0].close_after_crossing);
    let mut seq = DoorSequencer::new("tok", plan.doors, cfg, 100.0);
    let mut exec = Exec::new(&scene);
    let report = run(&mut seq, &scene, &perms, &mut exec);
    assert!(report.ok());
    let eval = report
        .records
        .iter()
        .find(|r| r.state == SequencerState::PostDoorPolicyEval)
        .unwrap();
    assert_eq!(eval.reason, Some("keep-open"));
    assert!(!states(&report).contains(&SequencerState::RequestDoorClose));
    assert_eq!(scene.door_state("door"), Some(DoorState::Open));
}

#[test]
fn combat_changes_close_decision_at_execution() {
    let scene = Scene::new(door_room(DoorState::Closed));
    let perms = Perms {
        combat: true,
        ..Perms::player()
    };
    let plan = plan(&scene, &perms).unwrap();
    let mut seq = DoorSequencer::new("tok", plan.doors, MovementConfig::default(), 100.0);
    let mut exec = Exec::new(&scene);
    let report = run(&mut seq, &scene, &perms, &mut exec);
    assert!(report.ok());
    assert_eq!(scene.door_state("door"), Some(DoorState::Open));
}

#[test]
fn waits_for_track_to_finish() {
    let scene = Scene::new(Vec::new());
    let perms = Perms::player();
    let plan = plan(&scene, &perms).unwrap();
    let mut seq = DoorSequencer::new("tok", plan.doors, MovementConfig::default(), 100.0);
    let mut exec = Exec::new(&scene);
    exec.animating_until = Some(2500);
    let mut now = 0;
    let report = loop {
        exec.now.set(now);
        let mut env = SequenceEnv {
            host: &scene,
            permissions: &perms,
            executor: &mut exec,
        };
        if let Poll::Ready(r) = seq.poll(now, &mut env) {
            break r;
        }
        now += 16;
        assert!(now < 10_000);
    };
    assert!(report.ok());
    assert!(now >= 2500);
    assert_eq!(report.moves, 1);
}

#[test]
fn pre_cancelled_search_stops() {
    let scene = Scene::new(vec![wall("w", [400.0, 0.0, 400.0, 700.0])]);
    let cancel = CancelToken::new();
    cancel.cancel();
    let err = plan_with(&scene, &Perms::player(), MovementConfig::default(), &cancel).unwrap_err();
    assert_eq!(err.reason(), "cancelled");
}

fn plan_with_host(
    planner: &MovementPlanner,
    scene: &Scene,
    host_path: &dyn PathFinder,
    cancel: &CancelToken,
) -> Result<MovePlan, MoveError> {
    let backends = Backends::new(scene);
    let perms = Perms::player();
    let svc = PlanServices {
        host: scene,
        backends: &backends,
        permissions: &perms,
        path_finder: Some(host_path),
    };
    let tok = token();
    planner.plan(
        &svc,
        &PlanRequest {
            token: &tok,
            start: START,
            end: END,
            terrain: &FlatTerrain,
            cancel,
        },
    )
}

#[test]
fn cancelled_search_ignores_host_path() {
    let scene = Scene::new(vec![wall("w", [400.0, 0.0, 400.0, 700.0])]);
    let host_path = HostPath(vec![START, Vec2::new(400.0, 800.0), END]);
    let cancel = CancelToken::new();
    cancel.cancel();
    let planner = MovementPlanner::new(MovementConfig::default());
    let err = plan_with_host(&planner, &scene, &host_path, &cancel).unwrap_err();
    assert_eq!(err, MoveError::Cancelled);
    assert!(err.wants_replan());
}

struct SupersedingPathFinder {
    generation: Generation,
    path: Vec<Vec2>,
}

impl PathFinder for SupersedingPathFinder {
    fn find_movement_path(&self, _w: &[Vec2], _opts: &PathFinderOptions) -> Option<Vec<Vec2>> {
        self.generation.bump();
        Some(self.path.clone())
    }
}

#[test]
fn superseded_plan_is_cancelled_even_on_a_direct_line() {
    let scene = Scene::new(Vec::new());
    let planner = MovementPlanner::new(MovementConfig::default());
    let host_path = SupersedingPathFinder {
        generation: planner.generation(),
        path: vec![START, END],
    };
    let err = plan_with_host(&planner, &scene, &host_path, &CancelToken::new()).unwrap_err();
    assert_eq!(err.reason(), "cancelled");
    // The next request plans normally.
    let plan = plan_with_host(&planner, &scene, &HostPath(vec![START, END]), &CancelToken::new());
    assert!(plan.is_ok());
}

#[test]
fn iteration_cap_reported() {
    let scene = Scene::new(vec![wall("w", [400.0, 0.0, 400.0, 700.0])]);
    let cfg = MovementConfig {
        max_search_iterations: 5,
        ..MovementConfig::default()
    };
    let err = plan_with(&scene, &Perms::player(), cfg, &CancelToken::new()).unwrap_err();
    assert_eq!(err, MoveError::MaxIterations);
}

struct BumpOnFirstCall {
    generation: Generation,
    calls: Cell<usize>,
}

impl EdgeOracle for BumpOnFirstCall {
    fn edge_cost(&self, a: Vec2, b: Vec2) -> Option<f32> {
        if self.calls.replace(self.calls.get() + 1) == 0 {
            self.generation.bump();
        }
        Some(a.distance(b))
    }
}

#[test]
fn newer_generation_invalidates_search() {
    let generation = Generation::new();
    let started_at = generation.bump();
    let oracle = BumpOnFirstCall {
        generation: generation.clone(),
        calls: Cell::new(0),
    };
    let start = Vec2::new(0.0, 0.0);
    let end = Vec2::new(10_000.0, 0.0);
    let lattice = Lattice::Square4 { step: 100.0 };
    let bounds = Rect::new(-100.0, -100.0, 10_200.0, 200.0);
    let mut graph = Graph::new(lattice, start, end, bounds, 100_000);
    let cancel = CancelToken::new();
    let (result, stats) = weighted_astar(
        &mut graph,
        &oracle,
        lattice.heuristic(),
        SearchLimits {
            weight: 1.0,
            max_iterations: 100_000,
        },
        &SearchControl {
            cancel: &cancel,
            generation: &generation,
            started_at,
        },
    );
    assert_eq!(result, Err(MoveError::Cancelled));
    assert_eq!(stats.expansions, search::CANCEL_CHECK_INTERVAL);
}

#[test]
fn planning_bumps_generation() {
    let scene = Scene::new(Vec::new());
    let backends = Backends::new(&scene);
    let perms = Perms::player();
    let planner = MovementPlanner::new(MovementConfig::default());
    let svc = PlanServices {
        host: &scene,
        backends: &backends,
        permissions: &perms,
        path_finder: None,
    };
    let tok = token();
    let cancel = CancelToken::new();
    let req = PlanRequest {
        token: &tok,
        start: START,
        end: END,
        terrain: &FlatTerrain,
        cancel: &cancel,
    };
    let g = planner.generation();
    let a = planner.plan(&svc, &req).unwrap().diagnostics.generation;
    let b = planner.plan(&svc, &req).unwrap().diagnostics.generation;
    assert!(b > a);
    assert_eq!(g.current(), b);
}

#[test]
fn graph_cap_truncates() {
    let start = Vec2::new(0.0, 0.0);
    let end = Vec2::new(5_000.0, 0.0);
    let lattice = Lattice::Square8 { step: 100.0 };
    let bounds = Rect::new(-1000.0, -1000.0, 7000.0, 2000.0);
    let mut graph = Graph::new(lattice, start, end, bounds, 10);
    let generation = Generation::new();
    let cancel = CancelToken::new();
    let oracle = BumpOnFirstCall {
        generation: Generation::new(),
        calls: Cell::new(0),
    };
    let (result, stats) = weighted_astar(
        &mut graph,
        &oracle,
        lattice.heuristic(),
        SearchLimits {
            weight: 1.15,
            max_iterations: 10_000,
        },
        &SearchControl {
            cancel: &cancel,
            generation: &generation,
            started_at: generation.current(),
        },
    );
    assert_eq!(result, Err(MoveError::NoPath));
    assert!(stats.truncated);
    assert_eq!(stats.nodes, 10);
}

#[test]
fn strict_fog_rejects_hidden_nodes() {
    let mut scene = Scene::new(vec![wall("w", [400.0, 0.0, 400.0, 700.0])]);
    scene.visible = Some(Rect::new(0.0, 0.0, 1.0, 1.0));
    let cfg = MovementConfig {
        strict_no_fog_path: true,
        ..MovementConfig::default()
    };
    let err = plan_with(&scene, &Perms::player(), cfg.clone(), &CancelToken::new()).unwrap_err();
    assert_eq!(err, MoveError::NoPath);
    assert!(plan_with(&scene, &Perms::gm(), cfg, &CancelToken::new()).is_ok());
}

#[test]
fn redaction_keeps_endpoints() {
    let path = [
        Vec2::new(0.0, 0.0),
        Vec2::new(100.0, 0.0),
        Vec2::new(200.0, 0.0),
        Vec2::new(300.0, 0.0),
    ];
    let visible = |p: Vec2| p.x < 150.0;
    let out = redact_path(&path, false, visible);
    assert_eq!(out, vec![path[0], path[1], path[3]]);
    assert_eq!(redact_path(&path, true, visible), path.to_vec());
}

struct HostPath(Vec<Vec2>);

impl PathFinder for HostPath {
    fn find_movement_path(&self, _w: &[Vec2], opts: &PathFinderOptions) -> Option<Vec<Vec2>> {
        assert!(opts.preview);
        Some(self.0.clone())
    }
}

#[test]
fn parity_rules() {
    let end = Vec2::new(100.0, 0.0);
    let own = [Vec2::ZERO, end];
    assert_eq!(arbitrate(Some(&own), Some(&own), end, 100.0, false), ParityVerdict::KeepPlanner);
    assert_eq!(arbitrate(Some(&own), None, end, 100.0, true), ParityVerdict::KeepPlanner);
    assert_eq!(arbitrate(Some(&own), Some(&own), end, 100.0, true), ParityVerdict::HostForced);
    assert_eq!(arbitrate(None, Some(&own), end, 100.0, false), ParityVerdict::HostOnly);

    let short = [Vec2::ZERO, Vec2::new(90.0, 0.0)];
    assert_eq!(arbitrate(Some(&short), Some(&own), end, 100.0, false), ParityVerdict::HostCloser);

    let detour = [Vec2::ZERO, Vec2::new(0.0, 400.0), end];
    assert_eq!(arbitrate(Some(&detour), Some(&own), end, 100.0, false), ParityVerdict::HostDiverged);
    // Within 2 grid cells: keep.
    let slight = [Vec2::ZERO, Vec2::new(50.0, 50.0), end];
    assert_eq!(arbitrate(Some(&slight), Some(&own), end, 100.0, false), ParityVerdict::KeepPlanner);
}

#[test]
fn forced_parity_uses_host_path() {
    let scene = Scene::new(Vec::new());
    let backends = Backends::new(&scene);
    let perms = Perms::player();
    let host_path = HostPath(vec![START, Vec2::new(450.0, 250.0), END]);
    let planner = MovementPlanner::new(MovementConfig {
        force_foundry_parity: true,
        ..MovementConfig::default()
    });
    let svc = PlanServices {
        host: &scene,
        backends: &backends,
        permissions: &perms,
        path_finder: Some(&host_path),
    };
    let tok = token();
    let cancel = CancelToken::new();
    let plan = planner
        .plan(
            &svc,
            &PlanRequest {
                token: &tok,
                start: START,
                end: END,
                terrain: &FlatTerrain,
                cancel: &cancel,
            },
        )
        .unwrap();
    assert_eq!(plan.source, PathSource::Host);
    assert_eq!(plan.path().len(), 3);
    assert_eq!(plan.diagnostics.parity, Some(ParityVerdict::HostForced));
}

#[test]
fn two_doors_on_one_segment_are_split() {
    let doors = vec![
        DoorWall {
            id: "a".into(),
            segment: Segment::new(Vec2::new(200.0, -50.0), Vec2::new(200.0, 50.0)),
            kind: DoorKind::Door,
            state: DoorState::Closed,
        },
        DoorWall {
            id: "b".into(),
            segment: Segment::new(Vec2::new(600.0, -50.0), Vec2::new(600.0, 50.0)),
            kind: DoorKind::Door,
            state: DoorState::Closed,
        },
    ];
    let path = [Vec2::ZERO, Vec2::new(800.0, 0.0)];
    let plan = plan_doors(&path, &doors, DoorClosePolicy::Always, false, 8.0, 3);
    assert_eq!(plan.path.len(), 3);
    assert_eq!(plan.path[1], Vec2::new(400.0, 0.0));
    let idx: Vec<usize> = plan.steps.iter().map(|s| s.segment_index).collect();
    assert_eq!(idx, vec![0, 1]);
    assert_eq!(plan.steps[0].wall_id, "a");
    assert_eq!(plan.steps[1].wall_id, "b");
    assert_eq!(plan.revision, 3);
}

#[test]
fn lattice_geometry() {
    let hex = Lattice::Hex {
        step: 100.0,
        columns: false,
    };
    let o = Vec2::new(10.0, 20.0);
    for k in hex.neighbors(NodeKey(0, 0)) {
        let d = hex.point(o, k).distance(o);
        assert!((d - 100.0).abs() < 1e-2, "{k:?} at {d}");
        assert_eq!(hex.key_near(o, hex.point(o, k)), Some(k));
    }
    assert_eq!(hex.heuristic(), Heuristic::Euclidean);

    let grid = GridInfo {
        kind: GridKind::Square,
        ..GridInfo::default()
    };
    let auto = Lattice::for_scene(Default::default(), &grid, 50.0, false);
    assert_eq!(auto, Lattice::Square4 { step: 100.0 });
    assert_eq!(auto.heuristic(), Heuristic::Manhattan);
    let gridless = GridInfo {
        kind: GridKind::Gridless,
        ..GridInfo::default()
    };
    assert_eq!(
        Lattice::for_scene(Default::default(), &gridless, 50.0, true),
        Lattice::Gridless { step: 50.0 }
    );
    assert_eq!(Heuristic::Octile.estimate(Vec2::ZERO, Vec2::new(3.0, 4.0)), 4.0 + 3.0 * (2f32.sqrt() - 1.0));
}

fn styles() -> StyleConfig {
    StyleConfig::default()
}

#[test]
fn walk_and_pick_up_shapes() {
    let from = Vec2::ZERO;
    let to = Vec2::new(100.0, 0.0);
    let walk = Walk {
        bob_px: 3.0,
        cycles: 2.0,
    };
    let mid = walk.sample(from, to, 0.25, 0.0);
    assert_eq!(mid.position, Vec2::new(25.0, 0.0));
    assert!((mid.lift - 3.0).abs() < 1e-4);
    let pick = PickUpDrop {
        height: 40.0,
        turns: 1.0,
    };
    assert!((pick.sample(from, to, 0.5, 0.0).lift - 40.0).abs() < 1e-4);
    let end = pick.sample(from, to, 1.0, 0.0);
    assert!(end.lift.abs() < 1e-3);
    assert!((end.rotation - std::f32::consts::TAU).abs() < 1e-4);
}

#[test]
fn style_resolution_order() {
    let mut reg = StyleRegistry::new(&styles(), "walk");
    let fallback: Rc<dyn Animator> = Rc::new(Walk {
        bob_px: 0.0,
        cycles: 0.0,
    });
    let mut tok = token();
    assert_eq!(reg.style_name(&tok), "walk");
    reg.set_override("tok", Some("pick-up-drop"));
    assert_eq!(reg.style_name(&tok), "pick-up-drop");
    tok.flags = TokenFlags {
        movement_style: Some("flying-glide".into()),
    };
    assert_eq!(reg.style_name(&tok), "flying-glide");
    assert!(reg.resolve(&tok, &fallback).persistent_hover());

    tok.flags.movement_style = Some("moonwalk".into());
    let a = reg.resolve(&tok, &fallback);
    assert!(Rc::ptr_eq(&a, &fallback));
    reg.set_override("tok", None);
    tok.flags.movement_style = None;
    assert_eq!(reg.style_name(&tok), "walk");
}

#[test]
fn flying_glide_midpoint() {
    let cfg = StyleConfig {
        grid_per_second: 5.0 / 0.9,
        ..styles()
    };
    let reg = StyleRegistry::new(&cfg, "walk");
    let glide = reg.get("flying-glide").unwrap();
    let mut tracks = TrackManager::new(cfg.clone());
    let base_rot = 0.3;
    tracks.start(
        "tok",
        StartTrack {
            from: Vec2::ZERO,
            to: Vec2::new(500.0, 0.0),
            base_z: 2.0,
            base_rotation: base_rot,
            footprint_radius: 50.0,
            grid_size: 100.0,
        },
        glide,
        0.0,
    );
    let duration = tracks.track("tok").unwrap().duration_ms;
    assert!((duration - 900.0).abs() < 1.0);
    let half = duration / 2.0;
    let update = tracks.advance(half);
    assert_eq!(update.len(), 1);
    let pose = update[0].pose;
    assert!((pose.position.x - 250.0).abs() < 1e-2);
    assert_eq!(pose.position.y, 0.0);
    assert!((pose.z - (2.0 + cfg.hover_height)).abs() < 1e-5);
    let elapsed_s = (half / 1000.0) as f32;
    let rock = cfg.rock_amplitude_rad * (std::f32::consts::TAU * elapsed_s * cfg.rock_speed_hz).sin();
    assert!((pose.rotation - (base_rot + rock)).abs() < 1e-5);
    let hover = tracks.hover("tok").unwrap();
    assert!((hover.indicator.center.x - 250.0).abs() < 1e-2);

    let done = tracks.advance(duration + 10.0);
    assert!(done[0].finished);
    assert!(!tracks.is_active("tok"));
    let after = tracks.advance(duration + 500.0);
    assert_eq!(after.len(), 1);
    assert!(!after[0].finished);
    assert!((after[0].pose.z - (2.0 + cfg.hover_height)).abs() < 1e-5);
    assert!(tracks.land("tok"));
    assert!(tracks.advance(duration + 600.0).is_empty());
}

#[test]
fn walk_track_finishes_and_is_removed() {
    let mut tracks = TrackManager::new(styles());
    let walk: Rc<dyn Animator> = Rc::new(Walk {
        bob_px: 3.0,
        cycles: 2.0,
    });
    tracks.start(
        "tok",
        StartTrack {
            from: Vec2::ZERO,
            to: Vec2::new(10.0, 0.0),
            base_z: 0.0,
            base_rotation: 0.0,
            footprint_radius: 50.0,
            grid_size: 100.0,
        },
        walk,
        1000.0,
    );
    assert_eq!(tracks.track("tok").unwrap().duration_ms, 120.0);
    assert!(tracks.advance(1060.0).iter().all(|u| !u.finished));
    let end = tracks.advance(1120.0);
    assert!(end[0].finished);
    assert_eq!(end[0].pose.position, Vec2::new(10.0, 0.0));
    assert!(end[0].pose.z.abs() < 1e-3);
    assert!(tracks.advance(1200.0).is_empty());
}

#[test]
fn indicator_geometry() {
    let ind = GroundIndicator::new(Vec2::new(10.0, 10.0), 40.0, 24.0, 48, 6.0);
    assert_eq!(ind.ring.len(), 48);
    assert!(ind.ring_points().all(|p| (p.distance(Vec2::new(10.0, 10.0)) - 40.0).abs() < 1e-3));
    assert_eq!(ind.tether.len(), 2);
    let segs: Vec<Segment> = ind.tether_segments().collect();
    assert_eq!(segs[0].a, Vec2::new(10.0, 10.0));
    assert_eq!(segs[1].b, Vec2::new(10.0, -8.0));
    assert!(dashed_tether(0.0, 6.0).is_empty());
}

#[test]
fn standalone_moves_carry_waypoints_only_when_ignoring_walls() {
    assert!(MoveRequest::standalone("t", Vec2::ZERO, true).show_waypoint);
    assert!(!MoveRequest::standalone("t", Vec2::ZERO, false).show_waypoint);
}
