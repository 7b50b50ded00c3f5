//! Plans a token move: direct line, weighted A*, smoothing, parity with the
//! host path finder, then door steps.

use umbra_geom::Vec2;
use umbra_scene::config::MovementConfig;
use umbra_scene::{
    DocId, PathFinder, PathFinderOptions, PermissionService, PolygonBackends, SceneHost, TokenDoc,
};

use crate::doors::{DoorPlan, plan_doors};
use crate::error::MoveError;
use crate::graph::{DoorWall, EdgeOracle, Graph, SceneEdges, TerrainCost};
use crate::lattice::Lattice;
use crate::parity::{ParityVerdict, PathSource, arbitrate};
use crate::search::{
    CancelToken, Generation, SearchControl, SearchLimits, SearchStats, path_length, redact_path,
    smooth_path, weighted_astar,
};

pub struct PlanServices<'a> {
    pub host: &'a dyn SceneHost,
    pub backends: &'a dyn PolygonBackends,
    pub permissions: &'a dyn PermissionService,
    pub path_finder: Option<&'a dyn PathFinder>,
}

pub struct PlanRequest<'a> {
    pub token: &'a TokenDoc,
    /// Host pixels, token centre.
    pub start: Vec2,
    pub end: Vec2,
    pub terrain: &'a dyn TerrainCost,
    pub cancel: &'a CancelToken,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlanDiagnostics {
    pub generation: u64,
    pub direct: bool,
    pub search: SearchStats,
    pub planner_length: Option<f32>,
    pub host_length: Option<f32>,
    pub parity: Option<ParityVerdict>,
    pub smoothed_from: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MovePlan {
    pub token: DocId,
    pub start: Vec2,
    pub end: Vec2,
    pub doors: DoorPlan,
    pub source: PathSource,
    pub diagnostics: PlanDiagnostics,
}

impl MovePlan {
    #[inline]
    pub fn path(&self) -> &[Vec2] {
        &self.doors.path
    }

    #[inline]
    pub fn length(&self) -> f32 {
        path_length(&self.doors.path)
    }
}

pub struct MovementPlanner {
    cfg: MovementConfig,
    generation: Generation,
}

impl MovementPlanner {
    pub fn new(cfg: MovementConfig) -> Self {
        Self {
            cfg,
            generation: Generation::new(),
        }
    }

    pub fn set_config(&mut self, cfg: MovementConfig) {
        self.cfg = cfg;
    }

    #[inline]
    pub fn config(&self) -> &MovementConfig {
        &self.cfg
    }

    /// Shared handle; bumping it cancels the search in flight.
    pub fn generation(&self) -> Generation {
        self.generation.clone()
    }

    pub fn plan(
        &self,
        svc: &PlanServices<'_>,
        req: &PlanRequest<'_>,
    ) -> Result<MovePlan, MoveError> {
        let started_at = self.generation.bump();
        let host = svc.host;
        let grid = host.grid();
        let grid_size = grid.size.max(1.0);
        let start = host.snap_to_grid(req.start);
        let end = host.snap_to_grid(req.end);
        let is_gm = svc.permissions.is_gm();

        let doors: Vec<DoorWall> = host.walls().iter().filter_map(DoorWall::from_doc).collect();
        let occupied = host
            .tokens()
            .iter()
            .filter(|t| t.id != req.token.id)
            .map(|t| t.center(grid_size))
            .collect();
        let edges = SceneEdges {
            host,
            backends: svc.backends,
            terrain: req.terrain,
            source: Some(req.token.id.clone()),
            doors,
            is_gm,
            strict_no_fog: self.cfg.strict_no_fog_path,
            start,
            end,
            grid_size,
            door_penalty_grid: self.cfg.door_penalty_grid,
            occupied,
            occupancy_penalty: self.cfg.occupancy_penalty,
        };

        let mut diag = PlanDiagnostics {
            generation: started_at,
            ..PlanDiagnostics::default()
        };

        let host_path = svc.path_finder.and_then(|pf| {
            pf.find_movement_path(
                &[start, end],
                &PathFinderOptions {
                    preview: true,
                    ..PathFinderOptions::default()
                },
            )
        });
        diag.host_length = host_path.as_deref().map(path_length);

        let own: Result<Vec<Vec2>, MoveError> = if start == end {
            diag.direct = true;
            Ok(vec![start])
        } else if edges.edge_cost(start, end).is_some() {
            diag.direct = true;
            Ok(vec![start, end])
        } else {
            self.search(&edges, &grid, start, end, host.scene_rect(), req, started_at, &mut diag)
        };
        // A cancelled or superseded request never falls back to the host path.
        let superseded = self.generation.current() != started_at;
        if matches!(own, Err(MoveError::Cancelled)) || req.cancel.is_cancelled() || superseded {
            log::info!(target: "movement", "plan for {} cancelled", req.token.id);
            return Err(MoveError::Cancelled);
        }
        if let Ok(p) = &own {
            diag.planner_length = Some(path_length(p));
        }

        let (path, source) = match own {
            Ok(p) if diag.direct && !self.cfg.force_foundry_parity => (p, PathSource::Direct),
            own => {
                let verdict = arbitrate(
                    own.as_deref().ok(),
                    host_path.as_deref(),
                    end,
                    grid_size,
                    self.cfg.force_foundry_parity,
                );
                diag.parity = Some(verdict);
                match (own, host_path) {
                    (_, Some(h)) if verdict.prefers_host() => (h, PathSource::Host),
                    (Ok(p), _) => {
                        let src = if diag.direct {
                            PathSource::Direct
                        } else {
                            PathSource::Planner
                        };
                        (p, src)
                    }
                    (Err(e), _) => {
                        log::info!(target: "movement", "no path for {}: {}", req.token.id, e.reason());
                        return Err(e);
                    }
                }
            }
        };

        let doors = plan_doors(
            &path,
            &edges.doors,
            self.cfg.door_close_policy,
            svc.permissions.combat_started(),
            self.cfg.door_offset_px,
            host.door_revision(),
        );
        log::debug!(target: "movement",
            "planned {} nodes ({:?}) with {} door steps for {}",
            doors.path.len(), source, doors.steps.len(), req.token.id);
        Ok(MovePlan {
            token: req.token.id.clone(),
            start,
            end,
            doors,
            source,
            diagnostics: diag,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn search(
        &self,
        edges: &SceneEdges<'_>,
        grid: &umbra_scene::GridInfo,
        start: Vec2,
        end: Vec2,
        scene: umbra_geom::Rect,
        req: &PlanRequest<'_>,
        started_at: u64,
        diag: &mut PlanDiagnostics,
    ) -> Result<Vec<Vec2>, MoveError> {
        let lattice = Lattice::for_scene(
            self.cfg.lattice,
            grid,
            self.cfg.lattice_step_px,
            self.cfg.allow_diagonals,
        );
        let bounds = Graph::bounds_for(start, end, grid.size, self.cfg.search_margin_px, scene);
        let mut graph = Graph::new(lattice, start, end, bounds, self.cfg.max_graph_nodes);
        let control = SearchControl {
            cancel: req.cancel,
            generation: &self.generation,
            started_at,
        };
        let (result, stats) = weighted_astar(
            &mut graph,
            edges,
            lattice.heuristic(),
            SearchLimits {
                weight: self.cfg.heuristic_weight,
                max_iterations: self.cfg.max_search_iterations,
            },
            &control,
        );
        diag.search = stats;
        if stats.truncated {
            log::warn!(target: "movement", "graph truncated at {} nodes", stats.nodes);
        }
        let raw = result?;
        diag.smoothed_from = raw.len();
        Ok(if self.cfg.smooth_paths {
            smooth_path(&raw, edges)
        } else {
            raw
        })
    }

    /// The path as the current user may see it.
    pub fn visible_path(&self, plan: &MovePlan, svc: &PlanServices<'_>) -> Vec<Vec2> {
        redact_path(plan.path(), svc.permissions.is_gm(), |p| {
            svc.host.is_point_visible(p)
        })
    }
}
