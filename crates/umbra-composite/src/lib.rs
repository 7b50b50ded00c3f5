//! Frame parameter snapshot, packed-mask codec and the reference maths of
//! the final composite.
#![forbid(unsafe_code)]

pub mod masks;
pub mod params;
pub mod reference;

pub use masks::{MaskSample, pack, pack_planes, unpack};
pub use params::{
    FrameInfo, FrameParams, LightningParams, ShadowKind, ShadowParams, TextureBindings,
    WindowLightParams,
};
pub use reference::{
    CompositeOutput, ConstantOutdoors, OutdoorsField, PixelInputs, composite_pixel,
    VerticalEdge, light_visibility, lightning_shadow, outdoor_multiplier, punch, roof_alpha,
    shadow_factor,
};
