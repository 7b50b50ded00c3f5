use umbra_scene::LevelContext;

/// Tokens on the shared boundary belong to the upper level, so anything at
/// or above `top - eps` is hidden while a lower level is active.
pub fn above_active_level(elevation: f32, ctx: Option<&LevelContext>, eps: f32) -> bool {
    match ctx {
        Some(c) if c.level_count > 1 && c.active_top.is_finite() => {
            elevation >= c.active_top - eps
        }
        _ => false,
    }
}
