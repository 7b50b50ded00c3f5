//! In-flight sprite animations driven once per frame.

use std::rc::Rc;

use hashbrown::HashMap;
use umbra_geom::Vec2;
use umbra_scene::DocId;
use umbra_scene::config::StyleConfig;

use crate::hover::{FlyingHover, GroundIndicator};
use crate::style::{Animator, FlyingGlide};

pub struct Track {
    pub from: Vec2,
    pub to: Vec2,
    pub start_ms: f64,
    pub duration_ms: f64,
    pub base_z: f32,
    pub base_rotation: f32,
    animator: Rc<dyn Animator>,
}

impl Track {
    #[inline]
    pub fn progress(&self, now_ms: f64) -> f32 {
        if self.duration_ms <= 0.0 {
            return 1.0;
        }
        ((now_ms - self.start_ms) / self.duration_ms).clamp(0.0, 1.0) as f32
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpritePose {
    pub position: Vec2,
    pub z: f32,
    pub rotation: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TrackUpdate {
    pub token: DocId,
    pub pose: SpritePose,
    /// The track reached `t = 1` this frame and was removed.
    pub finished: bool,
}

pub struct StartTrack {
    pub from: Vec2,
    pub to: Vec2,
    pub base_z: f32,
    pub base_rotation: f32,
    /// Token footprint radius, sizes the flying ring.
    pub footprint_radius: f32,
    pub grid_size: f32,
}

pub struct TrackManager {
    cfg: StyleConfig,
    tracks: HashMap<DocId, Track>,
    hovers: HashMap<DocId, FlyingHover>,
}

impl TrackManager {
    pub fn new(cfg: StyleConfig) -> Self {
        Self {
            cfg,
            tracks: HashMap::new(),
            hovers: HashMap::new(),
        }
    }

    pub fn set_config(&mut self, cfg: StyleConfig) {
        self.cfg = cfg;
    }

    /// Track length from distance in grid cells, never below `min_track_ms`.
    pub fn duration_ms(&self, from: Vec2, to: Vec2, grid_size: f32) -> f64 {
        let cells = from.distance(to) / grid_size.max(1.0);
        let secs = cells / self.cfg.grid_per_second.max(0.01);
        (secs * 1000.0).max(self.cfg.min_track_ms) as f64
    }

    pub fn start(&mut self, token: &str, req: StartTrack, animator: Rc<dyn Animator>, now_ms: f64) {
        let duration_ms = self.duration_ms(req.from, req.to, req.grid_size);
        if animator.persistent_hover() {
            let glide = FlyingGlide {
                hover_height: self.cfg.hover_height,
                rock_amplitude: self.cfg.rock_amplitude_rad,
                rock_speed_hz: self.cfg.rock_speed_hz,
            };
            if !self.hovers.contains_key(token) {
                let hover = FlyingHover::enter(
                    glide,
                    req.from,
                    req.base_z,
                    req.base_rotation,
                    now_ms,
                    req.footprint_radius,
                    self.cfg.indicator_ring_segments,
                    self.cfg.indicator_dash_px,
                );
                self.hovers.insert(token.to_string(), hover);
            }
        } else {
            self.hovers.remove(token);
        }
        log::trace!(target: "movement", "track {token} {duration_ms:.0}ms");
        self.tracks.insert(
            token.to_string(),
            Track {
                from: req.from,
                to: req.to,
                start_ms: now_ms,
                duration_ms,
                base_z: req.base_z,
                base_rotation: req.base_rotation,
                animator,
            },
        );
    }

    #[inline]
    pub fn is_active(&self, token: &str) -> bool {
        self.tracks.contains_key(token)
    }

    pub fn track(&self, token: &str) -> Option<&Track> {
        self.tracks.get(token)
    }

    pub fn hover(&self, token: &str) -> Option<&FlyingHover> {
        self.hovers.get(token)
    }

    pub fn indicators(&self) -> impl Iterator<Item = (&DocId, &GroundIndicator)> {
        self.hovers.iter().map(|(id, h)| (id, &h.indicator))
    }

    /// Leaves flying state; the sprite drops back to its base pose.
    pub fn land(&mut self, token: &str) -> bool {
        self.hovers.remove(token).is_some()
    }

    pub fn cancel(&mut self, token: &str) {
        self.tracks.remove(token);
    }

    /// Advances every track and hovering sprite. Finished tracks are removed.
    pub fn advance(&mut self, now_ms: f64) -> Vec<TrackUpdate> {
        let mut out = Vec::with_capacity(self.tracks.len() + self.hovers.len());
        let mut done = Vec::new();
        for (id, track) in &self.tracks {
            let t = track.progress(now_ms);
            let elapsed_s = ((now_ms - track.start_ms).max(0.0) / 1000.0) as f32;
            let s = track.animator.sample(track.from, track.to, t, elapsed_s);
            let pose = match self.hovers.get_mut(id) {
                Some(hover) => {
                    hover.move_to(s.position);
                    let h = hover.pose(now_ms);
                    SpritePose {
                        position: h.position,
                        z: h.z,
                        rotation: h.rotation,
                    }
                }
                None => SpritePose {
                    position: s.position,
                    z: track.base_z + s.lift,
                    rotation: track.base_rotation + s.rotation,
                },
            };
            let finished = t >= 1.0;
            if finished {
                done.push(id.clone());
            }
            out.push(TrackUpdate {
                token: id.clone(),
                pose,
                finished,
            });
        }
        for id in done {
            self.tracks.remove(&id);
        }
        for (id, hover) in &self.hovers {
            if out.iter().any(|u| &u.token == id) {
                continue;
            }
            let h = hover.pose(now_ms);
            out.push(TrackUpdate {
                token: id.clone(),
                pose: SpritePose {
                    position: h.position,
                    z: h.z,
                    rotation: h.rotation,
                },
                finished: false,
            });
        }
        out
    }
}
