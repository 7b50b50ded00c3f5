pub mod common;
pub mod darkness;
pub mod light;
