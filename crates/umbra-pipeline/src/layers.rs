use core::ops::{BitAnd, BitOr, Not};

/// Camera/sprite layer bitmask.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Layers(pub u32);

impl Layers {
    pub const NONE: Layers = Layers(0);
    pub const BASE: Layers = Layers(1 << 0);
    /// Layer R.
    pub const ROOF: Layers = Layers(1 << 1);
    /// Layer W.
    pub const WEATHER_ROOF: Layers = Layers(1 << 2);
    /// Layer P.
    pub const ROPE: Layers = Layers(1 << 3);
    /// Layer T.
    pub const TOKEN: Layers = Layers(1 << 4);
    pub const OVERLAY: Layers = Layers(1 << 5);
    pub const ALL: Layers = Layers(u32::MAX);

    #[inline]
    pub fn contains(self, other: Layers) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub fn intersects(self, other: Layers) -> bool {
        self.0 & other.0 != 0
    }

    #[inline]
    pub fn with(self, other: Layers) -> Layers {
        Layers(self.0 | other.0)
    }

    #[inline]
    pub fn without(self, other: Layers) -> Layers {
        Layers(self.0 & !other.0)
    }
}

impl BitOr for Layers {
    type Output = Layers;
    fn bitor(self, rhs: Layers) -> Layers {
        Layers(self.0 | rhs.0)
    }
}

impl BitAnd for Layers {
    type Output = Layers;
    fn bitand(self, rhs: Layers) -> Layers {
        Layers(self.0 & rhs.0)
    }
}

impl Not for Layers {
    type Output = Layers;
    fn not(self) -> Layers {
        Layers(!self.0)
    }
}
