use std::task::Poll;
use std::time::Instant;

use umbra_geom::Vec2;
use umbra_lighting::FrameTime;
use umbra_movement::{
    CancelToken, DoorSequencer, FlatTerrain, MoveRequest, PlanRequest, PlanServices,
    SequenceEnv, SequenceReport, StartTrack,
};
use umbra_scene::{HookEvent, LightningFlash, SceneHost};

use super::host::{SceneExecutor, announce_wall_change};
use super::state::ActiveMove;
use super::App;

const LIGHTNING_MS: f64 = 700.0;
const MAX_REPLANS: u32 = 2;

impl App {
    pub fn step(&mut self, dt: f32) {
        self.process_config_events();
        let now = self.now_ms();
        self.update_lightning(now);

        let events = self.hooks.drain();
        self.debug_stats.hooks_delivered += events.len();
        for ev in &events {
            self.registry.handle_event(ev, &self.scene);
            self.visibility.handle_hook(ev);
            match ev {
                HookEvent::CanvasReady | HookEvent::UpdateScene { .. } => {
                    self.visibility.sync_from_host(&self.scene);
                }
                HookEvent::UpdateWall { .. } => {
                    self.visibility.request_refresh();
                }
                _ => {}
            }
        }

        let rebuilt = self.registry.rebuild_dirty(&self.scene);
        let upgraded = self.registry.upgrade_fallbacks(&self.scene);
        if rebuilt.rebuilt + upgraded.rebuilt > 0 {
            log::debug!(
                "sources rebuilt: {} ({} fallback, parallel={})",
                rebuilt.rebuilt + upgraded.rebuilt,
                rebuilt.fallbacks,
                rebuilt.parallel
            );
            self.debug_stats.rebuilt_last = rebuilt.rebuilt + upgraded.rebuilt;
            self.debug_stats.fallbacks = rebuilt.fallbacks;
        }
        self.registry.tick(
            FrameTime {
                elapsed_ms: now,
                dt_ms: dt * 1000.0,
            },
            self.scene.env.darkness(),
        );
        self.backend.sync_sources(&self.registry);
        self.debug_stats.sources = self.registry.len();

        self.advance_tracks(now);
        self.poll_sequencer(now);

        if self.visibility.on_animation_frame(&mut self.scene, &mut self.backend) {
            self.debug_stats.visibility_refreshes = self.visibility.refreshes();
        }
        self.hooks.advance_frame();
    }

    pub fn trigger_lightning(&mut self, strike_uv: Vec2) {
        let now = self.now_ms();
        self.lightning_until_ms = Some(now + LIGHTNING_MS);
        self.scene.env.lightning = Some(LightningFlash {
            flash01: 1.0,
            strike_uv,
            direction: Vec2::new(-0.3, 1.0).normalized(),
        });
    }

    fn update_lightning(&mut self, now: f64) {
        let Some(until) = self.lightning_until_ms else {
            return;
        };
        let left = ((until - now) / LIGHTNING_MS) as f32;
        match self.scene.env.lightning.as_mut() {
            Some(flash) if left > 0.0 => {
                // Double strike: a dip a third of the way through.
                let dip = if (0.55..0.7).contains(&left) { 0.35 } else { 1.0 };
                flash.flash01 = (left * left * dip).clamp(0.0, 1.0);
            }
            _ => {
                self.scene.env.lightning = None;
                self.lightning_until_ms = None;
            }
        }
    }

    fn advance_tracks(&mut self, now: f64) {
        for u in self.tracks.advance(now) {
            let Some(doc) = self.scene.tokens.iter().find(|t| t.id == u.token) else {
                continue;
            };
            let elevation = doc.elevation;
            if let Some(s) = self.backend.sprites.by_doc_mut(&u.token) {
                s.center_on(u.pose.position);
                s.lift = (u.pose.z - elevation).max(0.0);
                s.rotation = u.pose.rotation;
            }
            if u.finished {
                log::trace!(target: "movement", "track {} finished", u.token);
            }
        }
    }

    /// Plans a move for the selected token and hands it to a door sequencer.
    pub fn start_move(&mut self, target: Vec2) {
        self.start_move_attempt(target, 0);
    }

    fn start_move_attempt(&mut self, target: Vec2, attempt: u32) {
        let Some(id) = self.selected.clone() else {
            return;
        };
        let Some(token) = self.scene.token(&id) else {
            return;
        };
        if self.active_move.take().is_some() {
            self.planner.generation().bump();
            log::info!(target: "movement", "{id}: previous move superseded");
        }
        let cancel = CancelToken::new();
        let started = Instant::now();
        let svc = PlanServices {
            host: &self.scene,
            backends: &self.scene,
            permissions: &self.scene,
            path_finder: None,
        };
        let req = PlanRequest {
            token: &token,
            start: token.center(self.scene.grid.size),
            end: target,
            terrain: &FlatTerrain,
            cancel: &cancel,
        };
        match self.planner.plan(&svc, &req) {
            Ok(plan) => {
                let shown_path = self.planner.visible_path(&plan, &svc);
                let d = &plan.diagnostics;
                let summary = format!(
                    "{:?} path {:.0}px, {} nodes, {} door(s), {:.1}ms",
                    plan.source,
                    plan.length(),
                    d.search.nodes,
                    plan.doors.steps.len(),
                    started.elapsed().as_secs_f64() * 1000.0
                );
                log::info!(target: "movement", "{id}: {summary}");
                self.debug_stats.last_plan = Some(summary);
                self.debug_stats.last_error = None;
                let sequencer = DoorSequencer::new(
                    &id,
                    plan.doors,
                    self.config.movement.clone(),
                    self.scene.grid.size,
                );
                self.active_move = Some(ActiveMove {
                    sequencer,
                    shown_path,
                    target,
                    attempt,
                });
            }
            Err(e) => {
                log::info!(target: "movement", "{id}: no plan ({})", e.reason());
                self.debug_stats.last_error = Some(e.to_string());
            }
        }
    }

    pub fn cancel_move(&mut self) {
        if self.active_move.take().is_some() {
            self.planner.generation().bump();
            self.debug_stats.last_move = Some("cancelled".to_string());
        }
    }

    fn poll_sequencer(&mut self, now: f64) {
        let Some(mut active) = self.active_move.take() else {
            return;
        };
        self.commands.animating.clear();
        for t in &self.scene.tokens {
            if self.tracks.is_active(&t.id) {
                self.commands.animating.insert(t.id.clone());
            }
        }
        let poll = {
            let mut executor = SceneExecutor {
                scene: &self.scene,
                queue: &mut self.commands,
            };
            let mut env = SequenceEnv {
                host: &self.scene,
                permissions: &self.scene,
                executor: &mut executor,
            };
            active.sequencer.poll(now as u64, &mut env)
        };
        if !self.commands.is_empty() {
            self.apply_commands(now);
        }
        match poll {
            Poll::Pending => self.active_move = Some(active),
            Poll::Ready(report) => self.finish_move(active, report),
        }
    }

    fn finish_move(&mut self, active: ActiveMove, report: SequenceReport) {
        let token = active.sequencer.token().to_string();
        match &report.result {
            Ok(()) => {
                let msg = format!("{token}: arrived after {} move(s)", report.moves);
                log::info!(target: "movement", "{msg}");
                self.debug_stats.last_move = Some(msg);
            }
            Err(e) if e.wants_replan() && active.attempt < MAX_REPLANS => {
                log::info!(target: "movement", "{token}: {}; planning again", e.reason());
                self.selected = Some(token);
                self.start_move_attempt(active.target, active.attempt + 1);
            }
            Err(e) => {
                log::warn!(target: "movement", "{token}: move stopped: {}", e.reason());
                self.debug_stats.last_move = Some(format!("{token}: {}", e.reason()));
            }
        }
        for r in report.records.iter().filter(|r| !r.ok) {
            log::debug!(
                target: "movement",
                "{token}: {} failed at step {} ({})",
                r.state.name(),
                r.step_index,
                r.reason.unwrap_or("unknown")
            );
        }
    }

    fn apply_commands(&mut self, now: f64) {
        for (wall, ds) in std::mem::take(&mut self.commands.doors) {
            if let Some(ev) = self.scene.set_door_state(&wall, ds) {
                announce_wall_change(&mut self.hooks, ev);
            }
        }
        for req in std::mem::take(&mut self.commands.moves) {
            self.apply_move(&req, now);
        }
    }

    fn apply_move(&mut self, req: &MoveRequest, now: f64) {
        let Some(doc) = self.scene.token(&req.token) else {
            return;
        };
        let grid = self.scene.grid.size;
        let from = doc.center(grid);
        // Targets were snapped and collision-checked when queued.
        let to = req.point;
        self.scene.place_token(&req.token, to);
        let animator = self.styles.resolve(&doc, &self.fallback_style);
        self.tracks.start(
            &req.token,
            StartTrack {
                from,
                to,
                base_z: doc.elevation,
                base_rotation: doc.rotation,
                footprint_radius: doc.width.max(doc.height) * grid * 0.5,
                grid_size: grid,
            },
            animator,
            now,
        );
        self.commands.animating.insert(req.token.clone());
        self.visibility.request_refresh();
    }
}
