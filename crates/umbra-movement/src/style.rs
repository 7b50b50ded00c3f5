//! Named movement styles and the registry resolving a token to its animator.

use std::f32::consts::{PI, TAU};
use std::rc::Rc;

use hashbrown::HashMap;
use umbra_geom::Vec2;
use umbra_scene::config::StyleConfig;
use umbra_scene::{DocId, TokenDoc};

pub const WALK: &str = "walk";
pub const PICK_UP_DROP: &str = "pick-up-drop";
pub const FLYING_GLIDE: &str = "flying-glide";

/// Pose of a sprite relative to its document transform.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StylePose {
    pub position: Vec2,
    /// Height above the token's base Z.
    pub lift: f32,
    /// Added to the base rotation, radians.
    pub rotation: f32,
}

pub trait Animator {
    /// `t` is normalised track progress, `elapsed_s` wall time since the track began.
    fn sample(&self, from: Vec2, to: Vec2, t: f32, elapsed_s: f32) -> StylePose;

    /// Flying styles keep their lift after the track ends.
    fn persistent_hover(&self) -> bool {
        false
    }
}

/// Linear motion with a small vertical bob.
#[derive(Clone, Copy, Debug)]
pub struct Walk {
    pub bob_px: f32,
    pub cycles: f32,
}

impl Animator for Walk {
    fn sample(&self, from: Vec2, to: Vec2, t: f32, _elapsed_s: f32) -> StylePose {
        let t = t.clamp(0.0, 1.0);
        StylePose {
            position: from.lerp(to, t),
            lift: self.bob_px * (t * self.cycles * PI).sin().abs(),
            rotation: 0.0,
        }
    }
}

/// Sinusoidal arc with constant angular velocity spin.
#[derive(Clone, Copy, Debug)]
pub struct PickUpDrop {
    pub height: f32,
    pub turns: f32,
}

impl Animator for PickUpDrop {
    fn sample(&self, from: Vec2, to: Vec2, t: f32, _elapsed_s: f32) -> StylePose {
        let t = t.clamp(0.0, 1.0);
        StylePose {
            position: from.lerp(to, t),
            lift: self.height * (t * PI).sin(),
            rotation: TAU * self.turns * t,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct FlyingGlide {
    pub hover_height: f32,
    pub rock_amplitude: f32,
    pub rock_speed_hz: f32,
}

impl FlyingGlide {
    #[inline]
    pub fn rock(&self, elapsed_s: f32) -> f32 {
        self.rock_amplitude * (TAU * elapsed_s * self.rock_speed_hz).sin()
    }
}

impl Animator for FlyingGlide {
    fn sample(&self, from: Vec2, to: Vec2, t: f32, elapsed_s: f32) -> StylePose {
        StylePose {
            position: from.lerp(to, t.clamp(0.0, 1.0)),
            lift: self.hover_height,
            rotation: self.rock(elapsed_s),
        }
    }

    fn persistent_hover(&self) -> bool {
        true
    }
}

/// Maps style names to animators, with per-token overrides.
pub struct StyleRegistry {
    styles: HashMap<String, Rc<dyn Animator>>,
    overrides: HashMap<DocId, String>,
    default_style: String,
}

impl StyleRegistry {
    pub fn new(cfg: &StyleConfig, default_style: &str) -> Self {
        let mut styles: HashMap<String, Rc<dyn Animator>> = HashMap::new();
        styles.insert(
            WALK.to_string(),
            Rc::new(Walk {
                bob_px: cfg.walk_bob_px,
                cycles: cfg.walk_bob_cycles,
            }),
        );
        styles.insert(
            PICK_UP_DROP.to_string(),
            Rc::new(PickUpDrop {
                height: cfg.pick_up_height,
                turns: cfg.pick_up_turns,
            }),
        );
        styles.insert(
            FLYING_GLIDE.to_string(),
            Rc::new(FlyingGlide {
                hover_height: cfg.hover_height,
                rock_amplitude: cfg.rock_amplitude_rad,
                rock_speed_hz: cfg.rock_speed_hz,
            }),
        );
        Self {
            styles,
            overrides: HashMap::new(),
            default_style: default_style.to_string(),
        }
    }

    pub fn register(&mut self, name: &str, animator: Rc<dyn Animator>) {
        self.styles.insert(name.to_string(), animator);
    }

    pub fn set_override(&mut self, token: &str, style: Option<&str>) {
        match style {
            Some(s) => {
                self.overrides.insert(token.to_string(), s.to_string());
            }
            None => {
                self.overrides.remove(token);
            }
        }
    }

    /// Style name for a token: document flag, then local override, then default.
    pub fn style_name<'a>(&'a self, token: &'a TokenDoc) -> &'a str {
        token
            .flags
            .movement_style
            .as_deref()
            .or_else(|| self.overrides.get(&token.id).map(String::as_str))
            .unwrap_or(&self.default_style)
    }

    /// Unknown names resolve to `fallback`.
    pub fn resolve(&self, token: &TokenDoc, fallback: &Rc<dyn Animator>) -> Rc<dyn Animator> {
        let name = self.style_name(token);
        match self.styles.get(name) {
            Some(a) => Rc::clone(a),
            None => {
                log::debug!(target: "movement", "unknown style {name} for {}", token.id);
                Rc::clone(fallback)
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<Rc<dyn Animator>> {
        self.styles.get(name).cloned()
    }
}
