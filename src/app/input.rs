use raylib::consts::{KeyboardKey, MouseButton};
use raylib::prelude::RaylibHandle;
use umbra_geom::Vec2;
use umbra_render_raylib::conv::vec2_from_rl;
use umbra_scene::{HookEvent, SceneHost};

use super::App;
use super::host::announce_wall_change;

const OVERLAY_CYCLE: [&str; 6] = ["light", "darkness", "masks", "roof", "outdoors", "token"];
const ZOOM_STEP: f32 = 1.1;
const DOOR_REACH_PX: f32 = 40.0;

/// Next debug target after `current`; wraps back to none.
pub fn next_debug_overlay(current: Option<&str>) -> Option<String> {
    let next = match current {
        None => Some(0),
        Some(name) => OVERLAY_CYCLE
            .iter()
            .position(|n| n.eq_ignore_ascii_case(name))
            .map(|i| i + 1)
            .filter(|&i| i < OVERLAY_CYCLE.len()),
    };
    next.map(|i| OVERLAY_CYCLE[i].to_string())
}

impl App {
    pub fn handle_input(&mut self, rl: &RaylibHandle) {
        let (w, h) = (rl.get_screen_width(), rl.get_screen_height());
        let mouse = vec2_from_rl(rl.get_mouse_position());
        let host = self.view.screen_to_host(mouse, w, h);

        if rl.is_mouse_button_down(MouseButton::MOUSE_BUTTON_RIGHT) {
            let delta = vec2_from_rl(rl.get_mouse_delta());
            if delta != Vec2::ZERO {
                self.view.pan_screen(delta);
            }
        }
        let wheel = rl.get_mouse_wheel_move();
        if wheel != 0.0 {
            self.view.zoom_at(ZOOM_STEP.powf(wheel), mouse, w, h);
        }

        if rl.is_mouse_button_pressed(MouseButton::MOUSE_BUTTON_LEFT) {
            match self.scene.token_at(host).map(|t| t.id.clone()) {
                Some(id) => {
                    log::info!("selected {id}");
                    self.selected = Some(id);
                }
                None => self.start_move(host),
            }
        }

        if rl.is_key_pressed(KeyboardKey::KEY_X) {
            self.cancel_move();
        }
        if rl.is_key_pressed(KeyboardKey::KEY_D) {
            if self.scene.gm {
                if let Some(ev) = self.scene.toggle_door_near(host, DOOR_REACH_PX / self.view.zoom) {
                    announce_wall_change(&mut self.hooks, ev);
                }
            } else {
                log::info!("only the GM can toggle doors by hand");
            }
        }
        if rl.is_key_pressed(KeyboardKey::KEY_G) {
            self.scene.gm = !self.scene.gm;
            log::info!("gm view: {}", self.scene.gm);
            self.hooks.emit(HookEvent::SightRefresh);
        }
        if rl.is_key_pressed(KeyboardKey::KEY_C) {
            self.scene.in_combat = !self.scene.in_combat;
            self.hooks.emit(if self.scene.in_combat {
                HookEvent::CreateCombat
            } else {
                HookEvent::DeleteCombat
            });
        }
        if rl.is_key_pressed(KeyboardKey::KEY_H) {
            if let Some(id) = self.selected.clone() {
                let hidden = self.scene.token(&id).is_some_and(|t| !t.hidden);
                if self.scene.set_token_hidden(&id, hidden) {
                    self.hooks.emit(HookEvent::VisibilityRefresh);
                }
            }
        }
        if rl.is_key_pressed(KeyboardKey::KEY_V) {
            let ev = self.scene.toggle_level_view();
            log::info!("level view: {:?}", self.scene.level);
            self.hooks.emit(ev);
        }
        if rl.is_key_pressed(KeyboardKey::KEY_L) {
            let uv = Vec2::new(mouse.x / w.max(1) as f32, 1.0 - mouse.y / h.max(1) as f32);
            self.trigger_lightning(uv);
        }
        if rl.is_key_pressed(KeyboardKey::KEY_UP) || rl.is_key_pressed(KeyboardKey::KEY_DOWN) {
            let step = if rl.is_key_pressed(KeyboardKey::KEY_UP) { 0.1 } else { -0.1 };
            self.scene.env.darkness_level = (self.scene.env.darkness_level + step).clamp(0.0, 1.0);
            self.hooks.emit(HookEvent::LightingRefresh);
        }
        if rl.is_key_pressed(KeyboardKey::KEY_O) {
            let mut masks = self.config.masks.clone();
            masks.debug_overlay = next_debug_overlay(masks.debug_overlay.as_deref());
            log::info!("debug overlay: {:?}", masks.debug_overlay);
            self.pipeline.set_mask_config(masks.clone());
            self.config.masks = masks;
        }
        if rl.is_key_pressed(KeyboardKey::KEY_F1) {
            self.show_overlay = !self.show_overlay;
        }
    }
}
