/// One-dimensional value noise over a power-of-two reference table with
/// hermite smoothing between neighbours. Drives torch and flame flicker.
#[derive(Clone, Debug)]
pub struct SmoothNoise {
    refs: Vec<f32>,
    mask: usize,
    pub amplitude: f32,
    pub scale: f32,
}

impl SmoothNoise {
    pub const DEFAULT_REFERENCES: usize = 256;

    /// `references` is rounded up to a power of two.
    pub fn new(amplitude: f32, scale: f32, references: usize, seed: u64) -> Self {
        let n = references.max(2).next_power_of_two();
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        let refs = (0..n)
            .map(|_| {
                // xorshift64*
                state ^= state >> 12;
                state ^= state << 25;
                state ^= state >> 27;
                let v = state.wrapping_mul(0x2545_F491_4F6C_DD1D);
                (v >> 40) as f32 / (1u64 << 24) as f32
            })
            .collect();
        Self {
            refs,
            mask: n - 1,
            amplitude,
            scale,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.refs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    pub fn generate(&self, x: f32) -> f32 {
        let sx = x * self.scale;
        let floor = sx.floor();
        let t = sx - floor;
        let smooth = t * t * (3.0 - 2.0 * t);
        let i0 = (floor as i64 as usize) & self.mask;
        let i1 = (i0 + 1) & self.mask;
        let y = self.refs[i0] + (self.refs[i1] - self.refs[i0]) * smooth;
        y * self.amplitude
    }
}

impl Default for SmoothNoise {
    fn default() -> Self {
        Self::new(1.0, 1.0, Self::DEFAULT_REFERENCES, 0)
    }
}
