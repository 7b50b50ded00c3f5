//! Framebuffer-backed render targets created through rlgl so the pipeline
//! can ask for half-float and single-channel formats.

use umbra_pipeline::{TargetDesc, TargetFormat};
use umbra_scene::TextureRef;

// rlgl / raylib enum values (raylib 5.5).
const PIXELFORMAT_UNCOMPRESSED_GRAYSCALE: i32 = 1;
const PIXELFORMAT_UNCOMPRESSED_R8G8B8A8: i32 = 7;
const PIXELFORMAT_UNCOMPRESSED_R32: i32 = 8;
const PIXELFORMAT_UNCOMPRESSED_R16G16B16A16: i32 = 13;
const DEPTH_COMPONENT_24BIT: i32 = 19;
const RL_ATTACHMENT_COLOR_CHANNEL0: i32 = 0;
const RL_ATTACHMENT_DEPTH: i32 = 100;
const RL_ATTACHMENT_TEXTURE2D: i32 = 100;
const RL_ATTACHMENT_RENDERBUFFER: i32 = 200;

/// Colour attachment pixel format for a pipeline target format. Depth
/// targets store linear depth in a 32-bit float red channel.
pub fn pixel_format(format: TargetFormat) -> i32 {
    match format {
        TargetFormat::Rgba8 => PIXELFORMAT_UNCOMPRESSED_R8G8B8A8,
        TargetFormat::Rgba16F => PIXELFORMAT_UNCOMPRESSED_R16G16B16A16,
        TargetFormat::R8 => PIXELFORMAT_UNCOMPRESSED_GRAYSCALE,
        TargetFormat::Depth32F => PIXELFORMAT_UNCOMPRESSED_R32,
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GpuTarget {
    pub fbo: u32,
    pub color: u32,
    pub depth: u32,
    pub width: i32,
    pub height: i32,
    pub format: TargetFormat,
}

impl GpuTarget {
    /// `None` if the driver rejects the framebuffer.
    pub fn create(desc: TargetDesc) -> Option<Self> {
        let (w, h) = (desc.width.max(1), desc.height.max(1));
        unsafe {
            let fbo = raylib::ffi::rlLoadFramebuffer();
            if fbo == 0 {
                return None;
            }
            raylib::ffi::rlEnableFramebuffer(fbo);
            let color = raylib::ffi::rlLoadTexture(
                std::ptr::null(),
                w,
                h,
                pixel_format(desc.format),
                1,
            );
            raylib::ffi::rlFramebufferAttach(
                fbo,
                color,
                RL_ATTACHMENT_COLOR_CHANNEL0,
                RL_ATTACHMENT_TEXTURE2D,
                0,
            );
            let depth = raylib::ffi::rlLoadTextureDepth(w, h, true);
            raylib::ffi::rlFramebufferAttach(
                fbo,
                depth,
                RL_ATTACHMENT_DEPTH,
                RL_ATTACHMENT_RENDERBUFFER,
                0,
            );
            let complete = raylib::ffi::rlFramebufferComplete(fbo);
            raylib::ffi::rlDisableFramebuffer();
            if !complete || color == 0 {
                if color != 0 {
                    raylib::ffi::rlUnloadTexture(color);
                }
                raylib::ffi::rlUnloadFramebuffer(fbo);
                return None;
            }
            raylib::ffi::rlTextureParameters(color, 0x2801, 0x2601); // MIN_FILTER, LINEAR
            raylib::ffi::rlTextureParameters(color, 0x2800, 0x2601); // MAG_FILTER, LINEAR
            Some(Self {
                fbo,
                color,
                depth,
                width: w,
                height: h,
                format: desc.format,
            })
        }
    }

    /// Also frees the depth renderbuffer attached to the framebuffer.
    pub fn destroy(self) {
        unsafe {
            raylib::ffi::rlUnloadTexture(self.color);
            raylib::ffi::rlUnloadFramebuffer(self.fbo);
        }
    }

    pub fn texture_ref(&self) -> TextureRef {
        TextureRef {
            id: self.color,
            width: self.width,
            height: self.height,
        }
    }

    pub fn raw_texture(&self) -> raylib::ffi::Texture2D {
        raylib::ffi::Texture2D {
            id: self.color,
            width: self.width,
            height: self.height,
            mipmaps: 1,
            format: pixel_format(self.format),
        }
    }

    pub fn raw_render_texture(&self) -> raylib::ffi::RenderTexture2D {
        raylib::ffi::RenderTexture2D {
            id: self.fbo,
            texture: self.raw_texture(),
            depth: raylib::ffi::Texture2D {
                id: self.depth,
                width: self.width,
                height: self.height,
                mipmaps: 1,
                format: DEPTH_COMPONENT_24BIT,
            },
        }
    }
}
