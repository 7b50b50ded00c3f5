//! Reconciles the host's per-token visibility with the sprite renderer.

pub mod controller;
pub mod level;
pub mod surface;

pub use controller::{TokenVisibility, VisibilityController};
pub use level::above_active_level;
pub use surface::{SpriteSink, TokenPlaceables};
