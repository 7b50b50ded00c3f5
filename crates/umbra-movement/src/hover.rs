//! Persistent flying hover: lift, rocking and the ground indicator mesh.

use std::f32::consts::TAU;

use umbra_geom::{Segment, Vec2};

use crate::style::FlyingGlide;

/// Ring under the token plus a dashed tether up to the lifted sprite.
#[derive(Clone, Debug, PartialEq)]
pub struct GroundIndicator {
    pub center: Vec2,
    pub radius: f32,
    /// Closed line loop, relative to `center`.
    pub ring: Vec<Vec2>,
    /// Dash segments, relative to `center`.
    pub tether: Vec<Segment>,
}

impl GroundIndicator {
    pub fn new(center: Vec2, radius: f32, lift: f32, segments: usize, dash_px: f32) -> Self {
        let n = segments.max(8);
        let ring = (0..n)
            .map(|i| {
                let a = TAU * i as f32 / n as f32;
                Vec2::new(a.cos() * radius, a.sin() * radius)
            })
            .collect();
        Self {
            center,
            radius,
            ring,
            tether: dashed_tether(lift, dash_px),
        }
    }

    #[inline]
    pub fn track(&mut self, center: Vec2) {
        self.center = center;
    }

    /// Ring vertices in host space.
    pub fn ring_points(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.ring.iter().map(move |p| *p + self.center)
    }

    pub fn tether_segments(&self) -> impl Iterator<Item = Segment> + '_ {
        self.tether
            .iter()
            .map(move |s| Segment::new(s.a + self.center, s.b + self.center))
    }
}

/// Dashes from the ground point up (negative host Y) to the sprite.
pub fn dashed_tether(lift: f32, dash_px: f32) -> Vec<Segment> {
    if lift <= 0.0 {
        return Vec::new();
    }
    let dash = dash_px.max(1.0);
    let mut out = Vec::new();
    let mut d = 0.0;
    while d < lift {
        let end = (d + dash).min(lift);
        out.push(Segment::new(Vec2::new(0.0, -d), Vec2::new(0.0, -end)));
        d += dash * 2.0;
    }
    out
}

#[derive(Clone, Debug)]
pub struct FlyingHover {
    pub glide: FlyingGlide,
    pub position: Vec2,
    pub base_z: f32,
    pub base_rotation: f32,
    pub since_ms: f64,
    pub indicator: GroundIndicator,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HoverPose {
    pub position: Vec2,
    pub z: f32,
    pub rotation: f32,
}

impl FlyingHover {
    pub fn enter(
        glide: FlyingGlide,
        position: Vec2,
        base_z: f32,
        base_rotation: f32,
        now_ms: f64,
        footprint_radius: f32,
        ring_segments: usize,
        dash_px: f32,
    ) -> Self {
        log::debug!(target: "movement", "hover at ({:.0},{:.0})", position.x, position.y);
        Self {
            glide,
            position,
            base_z,
            base_rotation,
            since_ms: now_ms,
            indicator: GroundIndicator::new(
                position,
                footprint_radius,
                glide.hover_height,
                ring_segments,
                dash_px,
            ),
        }
    }

    pub fn move_to(&mut self, position: Vec2) {
        self.position = position;
        self.indicator.track(position);
    }

    pub fn pose(&self, now_ms: f64) -> HoverPose {
        let elapsed_s = ((now_ms - self.since_ms).max(0.0) / 1000.0) as f32;
        HoverPose {
            position: self.position,
            z: self.base_z + self.glide.hover_height,
            rotation: self.base_rotation + self.glide.rock(elapsed_s),
        }
    }
}
