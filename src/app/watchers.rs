use umbra_movement::StyleRegistry;
use umbra_scene::{EngineConfig, load_config_from_path};

use super::App;

impl App {
    /// Applies a reloaded config between frames.
    pub fn process_config_events(&mut self) {
        let Some(rx) = self.config_event_rx.as_ref() else {
            return;
        };
        if rx.try_iter().count() == 0 {
            return;
        }
        let Some(path) = self.config_path.clone() else {
            return;
        };
        match load_config_from_path(&path) {
            Ok(cfg) => {
                self.apply_config(cfg);
                log::info!("config reloaded from {}", path.display());
            }
            Err(e) => log::warn!("config reload failed for {}: {}", path.display(), e),
        }
    }

    pub fn apply_config(&mut self, cfg: EngineConfig) {
        if cfg.lighting != self.config.lighting {
            self.registry.set_config(cfg.lighting.clone());
        }
        if cfg.masks != self.config.masks {
            self.pipeline.set_mask_config(cfg.masks.clone());
        }
        if cfg.movement != self.config.movement {
            self.planner.set_config(cfg.movement.clone());
            self.tracks.set_config(cfg.movement.styles.clone());
            self.styles = StyleRegistry::new(&cfg.movement.styles, &cfg.movement.default_style);
        }
        if cfg.visibility != self.config.visibility {
            self.visibility.set_config(cfg.visibility.clone());
            self.visibility.request_refresh();
        }
        self.config = cfg;
    }
}
