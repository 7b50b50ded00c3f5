//! GPU meshes for light and darkness fans, re-uploaded only when a source's
//! geometry changes.

use hashbrown::HashMap;
use umbra_lighting::SourceGeometry;
use umbra_scene::DocId;

pub struct SourceMesh {
    pub mesh: raylib::core::models::Mesh,
    pub geometry: SourceGeometry,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MeshSyncStats {
    pub uploaded: usize,
    pub dropped: usize,
}

#[derive(Default)]
pub struct SourceMeshes {
    meshes: HashMap<DocId, SourceMesh>,
}

impl SourceMeshes {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&SourceMesh> {
        self.meshes.get(id)
    }

    /// Uploads `geometry` for `id` unless the resident mesh already matches.
    /// Returns true when an upload happened.
    pub fn ensure(&mut self, id: &str, geometry: &SourceGeometry) -> bool {
        if self.meshes.get(id).is_some_and(|m| m.geometry == *geometry) {
            return false;
        }
        match upload_source_mesh(geometry) {
            Some(mesh) => {
                self.meshes.insert(
                    id.to_string(),
                    SourceMesh {
                        mesh,
                        geometry: geometry.clone(),
                    },
                );
                true
            }
            None => {
                log::warn!(target: "pipeline", "source {id}: mesh upload skipped");
                self.meshes.remove(id);
                false
            }
        }
    }

    /// Drops meshes whose source no longer exists or lost its geometry.
    pub fn retain(&mut self, mut live: impl FnMut(&str) -> bool) -> usize {
        let before = self.meshes.len();
        self.meshes.retain(|id, _| live(id));
        before - self.meshes.len()
    }

    pub fn clear(&mut self) {
        self.meshes.clear();
    }
}

/// Fan vertices at z = 0 with 16-bit indices.
pub fn upload_source_mesh(geometry: &SourceGeometry) -> Option<raylib::core::models::Mesh> {
    let verts = geometry.vertices();
    if verts.len() < 3 || geometry.indices.is_empty() || verts.len() > u16::MAX as usize {
        return None;
    }
    let mut pos: Vec<f32> = Vec::with_capacity(verts.len() * 3);
    for v in &verts {
        pos.extend_from_slice(&[v.x, v.y, 0.0]);
    }
    let mut idx: Vec<u16> = Vec::with_capacity(geometry.indices.len() * 3);
    for tri in &geometry.indices {
        if tri.iter().any(|&i| i as usize >= verts.len()) {
            return None;
        }
        idx.extend(tri.iter().map(|&i| i as u16));
    }

    let mut raw: raylib::ffi::Mesh = unsafe { std::mem::zeroed() };
    raw.vertexCount = verts.len() as i32;
    raw.triangleCount = geometry.indices.len() as i32;
    unsafe {
        let vbytes = (pos.len() * std::mem::size_of::<f32>()) as u32;
        let ibytes = (idx.len() * std::mem::size_of::<u16>()) as u32;
        raw.vertices = raylib::ffi::MemAlloc(vbytes) as *mut f32;
        raw.indices = raylib::ffi::MemAlloc(ibytes) as *mut u16;
        std::ptr::copy_nonoverlapping(pos.as_ptr(), raw.vertices, pos.len());
        std::ptr::copy_nonoverlapping(idx.as_ptr(), raw.indices, idx.len());
    }
    let mut mesh = unsafe { raylib::core::models::Mesh::from_raw(raw) };
    unsafe {
        mesh.upload(false);
    }
    Some(mesh)
}
