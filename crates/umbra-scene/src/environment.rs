use umbra_geom::Vec2;

use crate::color::Rgb;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightningFlash {
    pub flash01: f32,
    /// Strike point in screen UV.
    pub strike_uv: Vec2,
    pub direction: Vec2,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Environment {
    pub darkness_level: f32,
    pub ambient_daylight: Rgb,
    pub ambient_darkness: Rgb,
    pub ambient_brightest: Rgb,
    pub sun_dir: Vec2,
    pub hour: f32,
    pub lightning: Option<LightningFlash>,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            darkness_level: 0.0,
            ambient_daylight: Rgb::WHITE,
            ambient_darkness: Rgb::from_hex(0x242448),
            ambient_brightest: Rgb::WHITE,
            sun_dir: Vec2::new(0.5, 0.5),
            hour: 12.0,
            lightning: None,
        }
    }
}

impl Environment {
    /// Darkness clamped to [0,1]; NaN reads as fully lit.
    #[inline]
    pub fn darkness(&self) -> f32 {
        if self.darkness_level.is_nan() {
            0.0
        } else {
            self.darkness_level.clamp(0.0, 1.0)
        }
    }

    #[inline]
    pub fn flash01(&self) -> f32 {
        self.lightning.map_or(0.0, |l| l.flash01.clamp(0.0, 1.0))
    }
}
