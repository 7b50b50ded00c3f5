use umbra_scene::{DocId, TokenDoc};

/// Sprite-backed tokens drawn by the engine's own renderer.
pub trait SpriteSink {
    fn sprite_ids(&self, out: &mut Vec<DocId>);
    fn has_sprite(&self, id: &str) -> bool;
    fn set_sprite_visible(&mut self, id: &str, visible: bool);
    fn set_sprite_opacity(&mut self, id: &str, opacity: f32);
}

/// The host's token placeables.
pub trait TokenPlaceables {
    /// `token.isVisible` for the current user; `None` when the host has no
    /// placeable for `id`.
    fn is_visible(&self, id: &str) -> Option<bool>;

    fn document(&self, id: &str) -> Option<TokenDoc>;

    /// Class name of the detection filter the host applied, if any.
    fn detection_filter(&self, id: &str) -> Option<String>;

    /// Keeps the host token hit-testable while its own mesh stays hidden
    /// (visible, alpha 0).
    fn keep_interactive(&mut self, id: &str);
}
