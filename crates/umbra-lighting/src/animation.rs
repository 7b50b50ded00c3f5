//! CPU side of the animation model: seeded time, per-kind pulse schedule and
//! the smoothed amplitude of sound-reactive pulses.

use umbra_scene::{LightAnimation, LightAnimationKind};

use crate::noise::SmoothNoise;

/// `time = speed * elapsed_ms / 5000 + seed`, negated when reversed.
#[inline]
pub fn animation_time(speed: f32, elapsed_ms: f64, seed: f32, reverse: bool) -> f32 {
    let t = (speed as f64 * elapsed_ms / 5000.0) as f32 + seed;
    if reverse { -t } else { t }
}

/// One step of exponential smoothing towards `target`.
#[inline]
pub fn smooth_amplitude(current: f32, target: f32, speed: f32, dt_ms: f32) -> f32 {
    current + (target - current) * (1.0 - (-speed * dt_ms * 0.085).exp())
}

#[derive(Clone, Debug, PartialEq)]
pub struct AnimationState {
    pub kind: LightAnimationKind,
    pub reactive: bool,
    pub speed: f32,
    pub intensity: f32,
    pub reverse: bool,
    pub seed: f32,
    pub time: f32,
    pub pulse: f32,
    amplitude: f32,
}

impl AnimationState {
    pub fn new(desc: &LightAnimation, seed: f32) -> Self {
        let (kind, reactive) = desc
            .kind
            .as_deref()
            .map(LightAnimationKind::from_name)
            .unwrap_or((LightAnimationKind::None, false));
        Self {
            kind,
            reactive,
            speed: desc.speed.clamp(0.0, 10.0),
            intensity: desc.intensity.clamp(0.0, 10.0),
            reverse: desc.reverse,
            seed,
            time: seed,
            pulse: 1.0,
            amplitude: 0.0,
        }
    }

    /// Advances to `elapsed_ms` since engine start. `audio_level` feeds the
    /// reactive pulse; other kinds ignore it.
    pub fn advance(&mut self, elapsed_ms: f64, dt_ms: f32, noise: &SmoothNoise, audio_level: f32) {
        self.time = animation_time(self.speed, elapsed_ms, self.seed, self.reverse);
        self.pulse = match self.kind {
            LightAnimationKind::Torch => 0.6 + 0.4 * noise.generate(self.time * 10.0),
            LightAnimationKind::Flame => 0.45 + 0.55 * noise.generate(self.time * 14.0 + 31.0),
            LightAnimationKind::Pulse if self.reactive => {
                self.amplitude =
                    smooth_amplitude(self.amplitude, audio_level.clamp(0.0, 1.0), self.speed, dt_ms);
                0.3 + 0.7 * self.amplitude
            }
            LightAnimationKind::Pulse => {
                0.3 + 0.7 * (0.5 + 0.5 * (self.time * std::f32::consts::PI).cos())
            }
            _ => 1.0,
        };
    }

    #[inline]
    pub fn amplitude(&self) -> f32 {
        self.amplitude
    }
}
