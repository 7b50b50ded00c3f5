use raylib::prelude::*;
use umbra_composite::{FrameInfo, FrameParams, TextureBindings};
use umbra_geom::Vec2;
use umbra_pipeline::ExternalTextures;
use umbra_render_raylib::conv::vec2_to_rl;
use umbra_scene::{DoorKind, DoorState, TextureRef, mask_ids};

use super::App;
use super::demo;

const CLOUD_SHADOW: usize = 4;

fn wall_color(kind: DoorKind, ds: DoorState) -> Color {
    match (kind, ds) {
        (DoorKind::None, _) => Color::new(230, 230, 230, 200),
        (_, DoorState::Open) => Color::new(90, 220, 110, 220),
        (_, DoorState::Locked) => Color::new(230, 70, 60, 230),
        (DoorKind::Secret, DoorState::Closed) => Color::new(190, 110, 230, 220),
        (DoorKind::Door, DoorState::Closed) => Color::new(240, 180, 60, 230),
    }
}

impl App {
    fn external_textures(&self) -> ExternalTextures {
        let clouds = self.backend.textures.raw(demo::CLOUD_TEXTURE).map(|t| TextureRef {
            id: t.id,
            width: t.width,
            height: t.height,
        });
        let mut ext = ExternalTextures::default();
        ext.shadows[CLOUD_SHADOW] = clouds;
        ext.cloud_top = clouds;
        ext
    }

    pub fn render(&mut self, rl: &mut RaylibHandle, thread: &RaylibThread) {
        let (w, h) = (rl.get_screen_width(), rl.get_screen_height());
        let external = self.external_textures();
        let bindings = TextureBindings {
            shadows: external.shadows.map(|t| t.is_some()),
            window_light: external.window_light.is_some(),
            cloud_top: external.cloud_top.is_some(),
            outdoors: self.backend.outdoors_texture.is_some(),
        };
        let params = FrameParams::snapshot(
            &self.scene.env,
            &self.config,
            FrameInfo {
                frame: self.frame,
                width: w,
                height: h,
                elapsed_ms: self.now_ms(),
            },
            bindings,
        );
        self.backend.begin_frame(w, h, self.view);

        let mut d = rl.begin_drawing(thread);
        d.clear_background(Color::BLACK);
        match self
            .pipeline
            .render_frame(&mut self.backend, &params, &external, &mut self.masks)
        {
            Ok(report) => {
                self.debug_stats.passes = report.passes.len();
                let s = &self.backend.stats;
                self.debug_stats.sprite_draws = s.sprite_draws;
                self.debug_stats.light_draws = s.light_draws;
                self.debug_stats.darkness_draws = s.darkness_draws;
                self.debug_stats.mesh_uploads = s.mesh_uploads;
            }
            Err(e) => self.debug_stats.last_error = Some(e.to_string()),
        }
        if self.show_overlay {
            self.draw_overlay(&mut d, w, h);
            self.draw_hud(&mut d);
        }
        self.frame += 1;
    }

    fn draw_overlay(&self, d: &mut RaylibDrawHandle, w: i32, h: i32) {
        let view = &self.view;
        let to_screen = |p: Vec2| vec2_to_rl(view.host_to_screen(p, w, h));
        let thick = (3.0 * view.zoom).clamp(1.0, 6.0);

        for wall in &self.scene.walls {
            let s = wall.segment();
            d.draw_line_ex(to_screen(s.a), to_screen(s.b), thick, wall_color(wall.door, wall.ds));
        }

        if let Some(active) = &self.active_move {
            for pair in active.shown_path.windows(2) {
                d.draw_line_ex(to_screen(pair[0]), to_screen(pair[1]), 2.0, Color::YELLOW);
            }
            for p in &active.shown_path {
                d.draw_circle_v(to_screen(*p), 3.0, Color::YELLOW);
            }
        }

        for (_, ind) in self.tracks.indicators() {
            let ring: Vec<Vector2> = ind.ring_points().map(to_screen).collect();
            for (i, p) in ring.iter().enumerate() {
                let q = ring[(i + 1) % ring.len()];
                d.draw_line_v(*p, q, Color::SKYBLUE);
            }
            for seg in ind.tether_segments() {
                d.draw_line_v(to_screen(seg.a), to_screen(seg.b), Color::SKYBLUE);
            }
        }

        if let Some(token) = self
            .selected
            .as_deref()
            .and_then(|id| self.scene.tokens.iter().find(|t| t.id == id))
        {
            let size = self.scene.grid.size;
            let c = to_screen(token.center(size));
            let r = token.width.max(token.height) * size * 0.55 * view.zoom;
            d.draw_circle_lines(c.x as i32, c.y as i32, r, Color::GOLD);
        }
    }

    fn draw_hud(&self, d: &mut RaylibDrawHandle) {
        let s = &self.debug_stats;
        d.draw_fps(10, 10);
        let mut lines = vec![
            format!(
                "frame {}  passes {}  sprites {}  lights {}  darkness {}  sources {}  uploads {}",
                self.frame,
                s.passes,
                s.sprite_draws,
                s.light_draws,
                s.darkness_draws,
                s.sources,
                s.mesh_uploads
            ),
            format!(
                "darkness {:.2}  gm {}  combat {}  door rev {}  hooks {}  vis refreshes {}",
                self.scene.env.darkness(),
                self.scene.gm,
                self.scene.in_combat,
                self.scene.door_revision,
                s.hooks_delivered,
                s.visibility_refreshes
            ),
            format!(
                "selected {}{}  overlay {}  masks {} (outdoors {})",
                self.selected.as_deref().unwrap_or("-"),
                if self.selected.as_deref().is_some_and(|id| self.scene.is_interactive(id)) {
                    " (interactive)"
                } else {
                    ""
                },
                self.config.masks.debug_overlay.as_deref().unwrap_or("off"),
                self.masks.entries.len(),
                self.masks.get(mask_ids::OUTDOORS).is_some()
            ),
        ];
        lines.extend(s.last_plan.iter().map(|p| format!("plan: {p}")));
        lines.extend(s.last_move.iter().map(|m| format!("move: {m}")));
        lines.extend(s.last_error.iter().map(|e| format!("error: {e}")));
        lines.push(
            "LMB select/move  RMB pan  wheel zoom  D door  G gm  C combat  H hide  V levels  L lightning  O overlay  X cancel  F1 hud"
                .to_string(),
        );
        for (i, line) in lines.iter().enumerate() {
            d.draw_text(line, 10, 36 + i as i32 * 18, 16, Color::RAYWHITE);
        }
    }
}
