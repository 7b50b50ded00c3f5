use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::mpsc::Receiver;
use std::time::Instant;

use raylib::prelude::{RaylibHandle, RaylibThread};
use umbra_geom::Vec2;
use umbra_lighting::SourceRegistry;
use umbra_movement::{Animator, MovementPlanner, StyleRegistry, TrackManager, Walk};
use umbra_pipeline::FramePipeline;
use umbra_render_raylib::{RaylibBackend, Sprite, View2D};
use umbra_scene::{EngineConfig, HookBus, HookEvent, SceneHost};
use umbra_visibility::VisibilityController;

use super::demo;
use super::host::{CommandQueue, MaskTable};
use super::{App, DebugStats};

impl App {
    pub fn new(
        rl: &mut RaylibHandle,
        thread: &RaylibThread,
        config: EngineConfig,
        config_path: Option<PathBuf>,
        watch_config: bool,
        gm: bool,
        seed: i32,
    ) -> Self {
        let scene = demo::build_scene(gm);
        let dims = scene.dimensions();

        let mut backend = RaylibBackend::new(rl, thread);
        demo::generate_textures(rl, thread, &mut backend.textures, seed);
        backend.outdoors_texture = Some(demo::OUTDOORS_TEXTURE.to_string());
        let grid_size = scene.grid.size;
        for tile in &scene.tiles {
            backend.sprites.upsert(Sprite::for_tile(tile, demo::FALLBACK_TEXTURE));
        }
        for token in &scene.tokens {
            backend
                .sprites
                .upsert(Sprite::for_token(token, grid_size, demo::FALLBACK_TEXTURE));
        }
        backend.set_scene(scene.scene_rect());

        let mut registry = SourceRegistry::new(config.lighting.clone(), dims.height);
        registry.sync_from_host(&scene);
        let stats = registry.rebuild_dirty(&scene);
        log::info!(
            "registered {} sources ({} built, {} fallback)",
            registry.len(),
            stats.rebuilt,
            stats.fallbacks
        );

        let mv = &config.movement;
        let styles = StyleRegistry::new(&mv.styles, &mv.default_style);
        let fallback_style: Rc<dyn Animator> = Rc::new(Walk {
            bob_px: mv.styles.walk_bob_px,
            cycles: mv.styles.walk_bob_cycles,
        });

        let mut hooks = HookBus::new();
        hooks.emit(HookEvent::CanvasReady);
        hooks.emit(HookEvent::VisibilityRefresh);

        let config_event_rx = match (&config_path, watch_config) {
            (Some(p), true) => Some(spawn_config_watcher(p)),
            _ => None,
        };

        Self {
            pipeline: FramePipeline::new(config.masks.clone()),
            planner: MovementPlanner::new(config.movement.clone()),
            tracks: TrackManager::new(config.movement.styles.clone()),
            visibility: VisibilityController::new(config.visibility.clone()),
            styles,
            fallback_style,
            scene,
            hooks,
            registry,
            backend,
            masks: MaskTable::default(),
            commands: CommandQueue::default(),
            active_move: None,
            selected: Some("hero".to_string()),
            view: View2D::new(
                Vec2::new(dims.width * 0.5, dims.height * 0.5),
                0.5,
                dims.height,
            ),
            debug_stats: DebugStats::default(),
            show_overlay: true,
            started: Instant::now(),
            frame: 0,
            config_path,
            config_event_rx,
            lightning_until_ms: None,
            config,
        }
    }

    #[inline]
    pub fn now_ms(&self) -> f64 {
        self.started.elapsed().as_secs_f64() * 1000.0
    }

    /// Releases GPU resources; call before the window closes.
    pub fn shutdown(&mut self) {
        self.cancel_move();
        self.pipeline.teardown(&mut self.backend);
        self.backend.teardown();
        log::info!("shutdown after {} frames", self.frame);
    }
}

/// Watches the config file and signals on every change.
fn spawn_config_watcher(path: &Path) -> Receiver<()> {
    let (tx, rx) = std::sync::mpsc::channel::<()>();
    let watch_path = path.to_path_buf();
    std::thread::spawn(move || {
        use notify::{EventKind, RecursiveMode, Watcher};
        let mut watcher = match notify::recommended_watcher(
            move |res: Result<notify::Event, notify::Error>| {
                if let Ok(event) = res {
                    match event.kind {
                        EventKind::Modify(_)
                        | EventKind::Create(_)
                        | EventKind::Remove(_)
                        | EventKind::Any => {
                            let _ = tx.send(());
                        }
                        _ => {}
                    }
                }
            },
        ) {
            Ok(w) => w,
            Err(e) => {
                log::warn!("config watcher unavailable: {e}");
                return;
            }
        };
        if let Err(e) = watcher.watch(&watch_path, RecursiveMode::NonRecursive) {
            log::warn!("cannot watch {}: {e}", watch_path.display());
            return;
        }
        log::info!("watching {} for changes", watch_path.display());
        loop {
            std::thread::sleep(std::time::Duration::from_millis(500));
        }
    });
    rx
}
