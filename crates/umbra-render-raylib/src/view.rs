//! Scene camera. Host pixels are Y down; source meshes live in renderer
//! space (Y up) and go through the same camera after a flip.

use umbra_geom::Vec2;

pub const MIN_ZOOM: f32 = 0.1;
pub const MAX_ZOOM: f32 = 8.0;

/// `p' = (p.x * sx + tx, p.y * sy + ty)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Affine2 {
    pub sx: f32,
    pub sy: f32,
    pub tx: f32,
    pub ty: f32,
}

impl Affine2 {
    #[inline]
    pub fn apply(&self, p: Vec2) -> Vec2 {
        Vec2::new(p.x * self.sx + self.tx, p.y * self.sy + self.ty)
    }

    /// Column-major model matrix for `DrawMesh`.
    pub fn to_matrix(&self) -> raylib::ffi::Matrix {
        raylib::ffi::Matrix {
            m0: self.sx,
            m4: 0.0,
            m8: 0.0,
            m12: self.tx,
            m1: 0.0,
            m5: self.sy,
            m9: 0.0,
            m13: self.ty,
            m2: 0.0,
            m6: 0.0,
            m10: 1.0,
            m14: 0.0,
            m3: 0.0,
            m7: 0.0,
            m11: 0.0,
            m15: 1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct View2D {
    /// Host point shown at the centre of the screen.
    pub center: Vec2,
    pub zoom: f32,
    pub scene_height: f32,
}

impl View2D {
    pub fn new(center: Vec2, zoom: f32, scene_height: f32) -> Self {
        Self {
            center,
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
            scene_height,
        }
    }

    pub fn host_affine(&self, width: i32, height: i32) -> Affine2 {
        let z = self.zoom;
        Affine2 {
            sx: z,
            sy: z,
            tx: width as f32 * 0.5 - self.center.x * z,
            ty: height as f32 * 0.5 - self.center.y * z,
        }
    }

    /// Renderer space to screen: `host_y = scene_height - y` folded in.
    pub fn world_affine(&self, width: i32, height: i32) -> Affine2 {
        let a = self.host_affine(width, height);
        Affine2 {
            sx: a.sx,
            sy: -a.sy,
            tx: a.tx,
            ty: a.ty + a.sy * self.scene_height,
        }
    }

    #[inline]
    pub fn host_to_screen(&self, p: Vec2, width: i32, height: i32) -> Vec2 {
        self.host_affine(width, height).apply(p)
    }

    pub fn screen_to_host(&self, s: Vec2, width: i32, height: i32) -> Vec2 {
        let half = Vec2::new(width as f32 * 0.5, height as f32 * 0.5);
        self.center + (s - half) / self.zoom
    }

    pub fn pan_screen(&mut self, delta: Vec2) {
        self.center -= delta / self.zoom;
    }

    /// Zooms keeping the host point under `anchor` fixed on screen.
    pub fn zoom_at(&mut self, factor: f32, anchor: Vec2, width: i32, height: i32) {
        if !(factor > 0.0) {
            return;
        }
        let pinned = self.screen_to_host(anchor, width, height);
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        let half = Vec2::new(width as f32 * 0.5, height as f32 * 0.5);
        self.center = pinned - (anchor - half) / self.zoom;
    }
}
