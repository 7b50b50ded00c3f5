//! The seam between the pass sequencer and a concrete GPU backend.

use umbra_composite::FrameParams;
use umbra_scene::TextureRef;

use crate::layers::Layers;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TargetFormat {
    Rgba8,
    /// Half-float HDR.
    Rgba16F,
    /// Single channel, 8-bit.
    R8,
    Depth32F,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TargetDesc {
    pub width: i32,
    pub height: i32,
    pub format: TargetFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetHandle(pub u32);

/// What a `draw_scene` call renders. The main scene is filtered by the
/// camera layer mask; light and darkness scenes carry their own blending.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SceneKind {
    Main,
    Lights,
    Darkness,
}

/// Identifies one sprite so its layer bits can be saved and restored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SpriteId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MaskPackInputs {
    pub outdoors: Option<TargetHandle>,
    pub rope: TargetHandle,
    pub token: TargetHandle,
    pub roof: TargetHandle,
}

/// Textures owned by other collaborators (shadow casters, weather).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ExternalTextures {
    pub shadows: [Option<TextureRef>; 5],
    pub window_light: Option<TextureRef>,
    pub cloud_top: Option<TextureRef>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompositeInputs {
    pub diffuse: TargetHandle,
    pub light: TargetHandle,
    pub darkness: TargetHandle,
    pub masks: TargetHandle,
    pub external: ExternalTextures,
}

pub trait RenderBackend {
    /// False until the renderer, scene and camera exist.
    fn is_ready(&self) -> bool;
    fn drawing_buffer_size(&self) -> (i32, i32);

    fn create_target(&mut self, desc: TargetDesc) -> Option<TargetHandle>;
    fn destroy_target(&mut self, target: TargetHandle);
    fn texture(&self, target: TargetHandle) -> TextureRef;

    fn render_target(&self) -> Option<TargetHandle>;
    fn set_render_target(&mut self, target: Option<TargetHandle>);
    fn clear_color(&self) -> [f32; 4];
    fn set_clear_color(&mut self, color: [f32; 4]);
    fn clear(&mut self);
    fn set_color_write(&mut self, enabled: bool);

    fn camera_layers(&self) -> Layers;
    fn set_camera_layers(&mut self, layers: Layers);
    /// Token sprites with their current layer bits, appended to `out`.
    fn token_sprite_layers(&self, out: &mut Vec<(SpriteId, Layers)>);
    fn set_sprite_layers(&mut self, sprite: SpriteId, layers: Layers);

    fn draw_scene(&mut self, scene: SceneKind, params: &FrameParams);
    fn draw_mask_pack(&mut self, inputs: &MaskPackInputs);
    /// Projects the world-space outdoors mask; false when the scene has none.
    fn draw_outdoors_projection(&mut self) -> bool;
    fn draw_composite(&mut self, inputs: &CompositeInputs, params: &FrameParams);
    fn draw_debug_overlay(&mut self, target: TargetHandle);
    /// Renders scene depth into the bound target with a near/far range
    /// tightened around the scene by the given padding.
    fn capture_depth(&mut self, near_pad: f32, far_pad: f32);
}
