//! Raylib/OpenGL backend for the compositor: render targets, shader
//! wrappers, source meshes, sprites and the full-screen passes.
// Unsafe is required for rlgl framebuffer, blend and mesh upload calls.

pub mod backend;
pub mod meshes;
pub mod shaders;
pub mod sprites;
pub mod targets;
pub mod view;

pub use backend::RaylibBackend;
pub use meshes::SourceMeshes;
pub use shaders::{CompositeShader, DarknessShader, LightShader, MaskPackShader, OutdoorsShader};
pub use sprites::{Sprite, SpriteStore};
pub use targets::{GpuTarget, pixel_format};
pub use view::{Affine2, View2D};

pub mod conv {
    use umbra_geom::{Rect, Vec2};
    use umbra_scene::Rgb;

    pub fn vec2_to_rl(v: Vec2) -> raylib::prelude::Vector2 {
        raylib::prelude::Vector2::new(v.x, v.y)
    }

    pub fn vec2_from_rl(v: raylib::prelude::Vector2) -> Vec2 {
        Vec2::new(v.x, v.y)
    }

    pub fn rect_to_ffi(r: Rect) -> raylib::ffi::Rectangle {
        raylib::ffi::Rectangle {
            x: r.x,
            y: r.y,
            width: r.width,
            height: r.height,
        }
    }

    pub fn rgb_to_array(c: Rgb) -> [f32; 3] {
        [c.r, c.g, c.b]
    }

    /// Float RGBA in [0,1] to an 8-bit colour.
    pub fn color_from_f32(c: [f32; 4]) -> raylib::ffi::Color {
        let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        raylib::ffi::Color {
            r: q(c[0]),
            g: q(c[1]),
            b: q(c[2]),
            a: q(c[3]),
        }
    }
}

/// Loaded textures by key (file path or generated name).
pub struct TextureCache {
    pub map: hashbrown::HashMap<String, raylib::core::texture::Texture2D>,
}

impl TextureCache {
    pub fn new() -> Self {
        Self {
            map: hashbrown::HashMap::new(),
        }
    }

    pub fn get_ref(&self, key: &str) -> Option<&raylib::core::texture::Texture2D> {
        self.map.get(key)
    }

    pub fn replace_loaded(&mut self, key: String, tex: raylib::core::texture::Texture2D) {
        self.map.insert(key, tex);
    }

    /// Raw handle for ffi draws.
    pub fn raw(&self, key: &str) -> Option<raylib::ffi::Texture2D> {
        self.map.get(key).map(|t| *t.as_ref())
    }
}

impl Default for TextureCache {
    fn default() -> Self {
        Self::new()
    }
}
