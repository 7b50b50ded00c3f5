//! Executes a [`DoorPlan`]: walks plain nodes and runs the per-door state
//! machine. Driven by `poll` once per frame; never blocks.

use std::task::Poll;

use umbra_geom::Vec2;
use umbra_scene::config::MovementConfig;
use umbra_scene::{DocId, DoorState, PermissionService, SceneHost, WallDoc};

use crate::doors::{DoorPlan, DoorStep};
use crate::error::MoveError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SequencerState {
    ApproachDoor,
    PreDoorHold,
    RequestDoorOpen,
    WaitForDoorOpen,
    CrossDoor,
    PostDoorPolicyEval,
    RequestDoorClose,
    ResumePath,
}

impl SequencerState {
    pub fn name(self) -> &'static str {
        match self {
            SequencerState::ApproachDoor => "APPROACH_DOOR",
            SequencerState::PreDoorHold => "PRE_DOOR_HOLD",
            SequencerState::RequestDoorOpen => "REQUEST_DOOR_OPEN",
            SequencerState::WaitForDoorOpen => "WAIT_FOR_DOOR_OPEN",
            SequencerState::CrossDoor => "CROSS_DOOR",
            SequencerState::PostDoorPolicyEval => "POST_DOOR_POLICY_EVAL",
            SequencerState::RequestDoorClose => "REQUEST_DOOR_CLOSE",
            SequencerState::ResumePath => "RESUME_PATH",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TransitionRecord {
    pub state: SequencerState,
    pub step_index: usize,
    pub wall_id: DocId,
    pub ok: bool,
    pub reason: Option<&'static str>,
    pub timestamp_ms: u64,
}

/// One authoritative token update.
#[derive(Clone, Debug, PartialEq)]
pub struct MoveRequest {
    pub token: DocId,
    pub point: Vec2,
    pub snap: bool,
    pub ignore_walls: bool,
    /// Attach a movement-waypoint payload so the host draws its ruler.
    pub show_waypoint: bool,
}

impl MoveRequest {
    /// A one-off move outside a sequence; ignore-walls moves carry a waypoint.
    pub fn standalone(token: &str, point: Vec2, ignore_walls: bool) -> Self {
        Self {
            token: token.to_string(),
            point,
            snap: true,
            ignore_walls,
            show_waypoint: ignore_walls,
        }
    }
}

/// Write side of the host.
pub trait MoveExecutor {
    fn move_token(&mut self, req: &MoveRequest) -> Result<(), MoveError>;
    fn set_door_state(&mut self, wall: &str, state: DoorState) -> Result<(), MoveError>;
    /// Whether the token's sprite track is still running.
    fn is_animating(&self, token: &str) -> bool;
}

pub struct SequenceEnv<'a> {
    pub host: &'a dyn SceneHost,
    pub permissions: &'a dyn PermissionService,
    pub executor: &'a mut dyn MoveExecutor,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SequenceReport {
    pub result: Result<(), MoveError>,
    pub records: Vec<TransitionRecord>,
    pub moves: usize,
}

impl SequenceReport {
    #[inline]
    pub fn ok(&self) -> bool {
        self.result.is_ok()
    }

    pub fn reason(&self) -> Option<&'static str> {
        self.result.as_ref().err().map(MoveError::reason)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Preflight,
    Walk,
    Approach,
    HoldReached,
    DoorOpened,
    Crossed,
    CloseSettled,
    Done,
}

#[derive(Clone, Debug)]
enum Wait {
    Move {
        saw_track: bool,
        fallback_until: u64,
        limit_until: u64,
    },
    Door {
        wall: DocId,
        want: DoorState,
        until: u64,
        next_check: u64,
    },
}

enum Step {
    Continue,
    Wait(Wait),
    Finish(Result<(), MoveError>),
}

enum WaitOutcome {
    Pending,
    Done,
    /// Close timed out; recorded and the sequence carries on.
    SoftTimeout,
    Failed(MoveError),
}

pub struct DoorSequencer {
    token: DocId,
    plan: DoorPlan,
    cfg: MovementConfig,
    grid_size: f32,
    revision: u64,
    phase: Phase,
    wait: Option<Wait>,
    /// Index of the last path node reached.
    cursor: usize,
    step: usize,
    position: Vec2,
    records: Vec<TransitionRecord>,
    moves: usize,
    opened_by_us: bool,
    report: Option<SequenceReport>,
}

impl DoorSequencer {
    pub fn new(token: &str, plan: DoorPlan, cfg: MovementConfig, grid_size: f32) -> Self {
        let position = plan.path.first().copied().unwrap_or(Vec2::ZERO);
        let revision = plan.revision;
        Self {
            token: token.to_string(),
            plan,
            cfg,
            grid_size: grid_size.max(1.0),
            revision,
            phase: Phase::Preflight,
            wait: None,
            cursor: 0,
            step: 0,
            position,
            records: Vec::new(),
            moves: 0,
            opened_by_us: false,
            report: None,
        }
    }

    #[inline]
    pub fn records(&self) -> &[TransitionRecord] {
        &self.records
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.report.is_some()
    }

    #[inline]
    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn poll(&mut self, now_ms: u64, env: &mut SequenceEnv<'_>) -> Poll<SequenceReport> {
        if let Some(r) = &self.report {
            return Poll::Ready(r.clone());
        }
        if let Some(mut wait) = self.wait.take() {
            match self.check_wait(&mut wait, now_ms, env) {
                WaitOutcome::Pending => {
                    self.wait = Some(wait);
                    return Poll::Pending;
                }
                WaitOutcome::Done => {}
                WaitOutcome::SoftTimeout => {
                    self.record(SequencerState::RequestDoorClose, false, Some("door-close-timeout"), now_ms);
                }
                WaitOutcome::Failed(e) => match wait {
                    Wait::Door {
                        want: DoorState::Closed,
                        ..
                    } => {
                        self.record(SequencerState::RequestDoorClose, false, Some(e.reason()), now_ms);
                    }
                    Wait::Door { .. } => {
                        self.record(SequencerState::WaitForDoorOpen, false, Some(e.reason()), now_ms);
                        return Poll::Ready(self.finish(Err(e)));
                    }
                    Wait::Move { .. } => return Poll::Ready(self.finish(Err(e))),
                },
            }
        }
        loop {
            match self.advance(now_ms, env) {
                Step::Continue => {}
                Step::Wait(w) => {
                    self.wait = Some(w);
                    return Poll::Pending;
                }
                Step::Finish(result) => return Poll::Ready(self.finish(result)),
            }
        }
    }

    fn finish(&mut self, result: Result<(), MoveError>) -> SequenceReport {
        self.phase = Phase::Done;
        match &result {
            Ok(()) => log::info!(target: "movement", "{} arrived after {} moves", self.token, self.moves),
            Err(e) => log::info!(target: "movement", "{} stopped: {}", self.token, e.reason()),
        }
        let report = SequenceReport {
            result,
            records: self.records.clone(),
            moves: self.moves,
        };
        self.report = Some(report.clone());
        report
    }

    fn current_step(&self) -> Option<&DoorStep> {
        self.plan.steps.get(self.step)
    }

    fn record(&mut self, state: SequencerState, ok: bool, reason: Option<&'static str>, now_ms: u64) {
        let wall_id = self
            .current_step()
            .map(|s| s.wall_id.clone())
            .unwrap_or_default();
        log::trace!(target: "movement", "{} step {} {} ok={ok} {:?}", self.token, self.step, state.name(), reason);
        self.records.push(TransitionRecord {
            state,
            step_index: self.step,
            wall_id,
            ok,
            reason,
            timestamp_ms: now_ms,
        });
    }

    fn issue_move(
        &mut self,
        point: Vec2,
        door_move: bool,
        now_ms: u64,
        env: &mut SequenceEnv<'_>,
    ) -> Result<Wait, MoveError> {
        let req = MoveRequest {
            token: self.token.clone(),
            point,
            snap: !door_move,
            ignore_walls: door_move,
            show_waypoint: false,
        };
        env.executor.move_token(&req)?;
        self.moves += 1;
        let cells = self.position.distance(point) / self.grid_size;
        let fallback = ((cells * self.cfg.fallback_ms_per_grid) as u64).min(self.cfg.fallback_max_ms);
        self.position = point;
        Ok(Wait::Move {
            saw_track: false,
            fallback_until: now_ms + fallback,
            limit_until: now_ms + self.cfg.wait_for_track_finish_ms,
        })
    }

    fn advance(&mut self, now_ms: u64, env: &mut SequenceEnv<'_>) -> Step {
        use SequencerState as S;
        if matches!(self.phase, Phase::Preflight) {
            return self.preflight(now_ms, env);
        }
        if matches!(self.phase, Phase::Walk) {
            let last = self.plan.path.len().saturating_sub(1);
            let target = self.current_step().map_or(last, |s| s.segment_index);
            if self.cursor < target {
                self.cursor += 1;
                let p = self.plan.path[self.cursor];
                return wait_on(self.issue_move(p, false, now_ms, env));
            }
            if self.step < self.plan.steps.len() {
                self.phase = Phase::Approach;
                return Step::Continue;
            }
            return Step::Finish(Ok(()));
        }
        let Some(step) = self.current_step().cloned() else {
            return Step::Finish(Ok(()));
        };
        match self.phase {
            Phase::Approach => {
                let current = env.host.door_revision();
                if current != self.revision {
                    self.record(S::ApproachDoor, false, Some("door-revision-mismatch"), now_ms);
                    return Step::Finish(Err(MoveError::DoorRevisionMismatch {
                        planned: self.revision,
                        current,
                    }));
                }
                self.record(S::ApproachDoor, true, None, now_ms);
                self.phase = Phase::HoldReached;
                self.door_move(S::PreDoorHold, step.hold_point, now_ms, env)
            }
            Phase::HoldReached => self.request_open(&step, now_ms, env),
            Phase::DoorOpened => {
                self.record(S::WaitForDoorOpen, true, None, now_ms);
                self.revision = env.host.door_revision();
                self.phase = Phase::Crossed;
                self.door_move(S::CrossDoor, step.entry_point, now_ms, env)
            }
            Phase::Crossed => {
                let in_combat = env.permissions.combat_started();
                let close = self.opened_by_us && self.cfg.door_close_policy.should_close(in_combat);
                let reason = if close { "close" } else { "keep-open" };
                self.record(S::PostDoorPolicyEval, true, Some(reason), now_ms);
                if close {
                    self.request_close(&step, now_ms, env)
                } else {
                    self.phase = Phase::CloseSettled;
                    Step::Continue
                }
            }
            Phase::CloseSettled => {
                self.revision = env.host.door_revision();
                self.record(S::ResumePath, true, None, now_ms);
                self.cursor = step.segment_index;
                self.step += 1;
                self.phase = Phase::Walk;
                Step::Continue
            }
            Phase::Preflight | Phase::Walk | Phase::Done => Step::Finish(Ok(())),
        }
    }

    /// Fails before any authoritative update when a planned door cannot be
    /// opened, or when doors changed since planning.
    fn preflight(&mut self, now_ms: u64, env: &mut SequenceEnv<'_>) -> Step {
        let current = env.host.door_revision();
        if current != self.revision {
            return Step::Finish(Err(MoveError::DoorRevisionMismatch {
                planned: self.revision,
                current,
            }));
        }
        for k in 0..self.plan.steps.len() {
            let id = self.plan.steps[k].wall_id.clone();
            let Some(wall) = env.host.wall(&id) else {
                return Step::Finish(Err(MoveError::MissingDocument(id)));
            };
            if wall.is_open() {
                continue;
            }
            if let Err(e) = self.door_permission(&wall, DoorState::Open, env) {
                self.step = k;
                let reason = Some(e.reason());
                self.record(SequencerState::ApproachDoor, true, None, now_ms);
                self.record(SequencerState::PreDoorHold, true, Some("preflight"), now_ms);
                self.record(SequencerState::RequestDoorOpen, false, reason, now_ms);
                self.record(SequencerState::WaitForDoorOpen, false, reason, now_ms);
                return Step::Finish(Err(e));
            }
        }
        self.phase = Phase::Walk;
        Step::Continue
    }

    fn door_permission(
        &self,
        wall: &WallDoc,
        want: DoorState,
        env: &SequenceEnv<'_>,
    ) -> Result<(), MoveError> {
        if want == DoorState::Open && wall.ds == DoorState::Locked {
            return Err(MoveError::Locked {
                wall: wall.id.clone(),
            });
        }
        if !env.permissions.is_gm() && !self.cfg.player_auto_doors {
            return Err(MoveError::PlayerAutoDoorDisabled {
                wall: wall.id.clone(),
            });
        }
        if !env.permissions.can_modify_wall(wall, want) {
            return Err(MoveError::PermissionDenied {
                wall: wall.id.clone(),
            });
        }
        Ok(())
    }

    fn door_move(
        &mut self,
        state: SequencerState,
        point: Vec2,
        now_ms: u64,
        env: &mut SequenceEnv<'_>,
    ) -> Step {
        match self.issue_move(point, true, now_ms, env) {
            Ok(w) => {
                self.record(state, true, None, now_ms);
                Step::Wait(w)
            }
            Err(e) => {
                self.record(state, false, Some(e.reason()), now_ms);
                Step::Finish(Err(e))
            }
        }
    }

    fn request_open(&mut self, step: &DoorStep, now_ms: u64, env: &mut SequenceEnv<'_>) -> Step {
        let state = SequencerState::RequestDoorOpen;
        let Some(wall) = env.host.wall(&step.wall_id) else {
            self.record(state, false, Some("missing-document"), now_ms);
            return Step::Finish(Err(MoveError::MissingDocument(step.wall_id.clone())));
        };
        self.phase = Phase::DoorOpened;
        if wall.is_open() {
            self.opened_by_us = false;
            self.record(state, true, Some("already-open"), now_ms);
            return Step::Continue;
        }
        let requested = self
            .door_permission(&wall, DoorState::Open, env)
            .and_then(|()| env.executor.set_door_state(&wall.id, DoorState::Open));
        if let Err(e) = requested {
            self.record(state, false, Some(e.reason()), now_ms);
            return Step::Finish(Err(e));
        }
        self.opened_by_us = true;
        self.record(state, true, None, now_ms);
        Step::Wait(Wait::Door {
            wall: wall.id,
            want: DoorState::Open,
            until: now_ms + self.cfg.wait_for_open_ms,
            next_check: now_ms,
        })
    }

    /// Close failures are recorded but never stop the sequence.
    fn request_close(&mut self, step: &DoorStep, now_ms: u64, env: &mut SequenceEnv<'_>) -> Step {
        let state = SequencerState::RequestDoorClose;
        self.phase = Phase::CloseSettled;
        let Some(wall) = env.host.wall(&step.wall_id) else {
            self.record(state, false, Some("missing-document"), now_ms);
            return Step::Continue;
        };
        let requested = self
            .door_permission(&wall, DoorState::Closed, env)
            .and_then(|()| env.executor.set_door_state(&wall.id, DoorState::Closed));
        if let Err(e) = requested {
            log::warn!(target: "movement", "could not close {}: {}", wall.id, e.reason());
            self.record(state, false, Some(e.reason()), now_ms);
            return Step::Continue;
        }
        self.record(state, true, None, now_ms);
        Step::Wait(Wait::Door {
            wall: wall.id,
            want: DoorState::Closed,
            until: now_ms + self.cfg.wait_for_close_ms,
            next_check: now_ms,
        })
    }

    fn check_wait(&self, wait: &mut Wait, now_ms: u64, env: &mut SequenceEnv<'_>) -> WaitOutcome {
        match wait {
            Wait::Move {
                saw_track,
                fallback_until,
                limit_until,
            } => {
                if env.executor.is_animating(&self.token) {
                    *saw_track = true;
                    if now_ms >= *limit_until {
                        log::warn!(target: "movement", "{} track overran its wait", self.token);
                        return WaitOutcome::Done;
                    }
                    return WaitOutcome::Pending;
                }
                if *saw_track || now_ms >= *fallback_until {
                    WaitOutcome::Done
                } else {
                    WaitOutcome::Pending
                }
            }
            Wait::Door {
                wall,
                want,
                until,
                next_check,
            } => {
                if now_ms < *next_check {
                    return WaitOutcome::Pending;
                }
                *next_check = now_ms + self.cfg.door_poll_ms();
                let Some(doc) = env.host.wall(wall) else {
                    return WaitOutcome::Failed(MoveError::MissingDocument(wall.clone()));
                };
                if doc.ds == *want {
                    return WaitOutcome::Done;
                }
                if *want == DoorState::Open && doc.ds == DoorState::Locked {
                    return WaitOutcome::Failed(MoveError::Locked { wall: wall.clone() });
                }
                if now_ms >= *until {
                    return match want {
                        DoorState::Closed => WaitOutcome::SoftTimeout,
                        _ => WaitOutcome::Failed(MoveError::DoorOpenTimeout { wall: wall.clone() }),
                    };
                }
                WaitOutcome::Pending
            }
        }
    }
}

fn wait_on(r: Result<Wait, MoveError>) -> Step {
    match r {
        Ok(w) => Step::Wait(w),
        Err(e) => Step::Finish(Err(e)),
    }
}
