//! Pure polygon work for one source: LOS conversion, wall inset and the
//! circle fallback. Runs off the main thread during batch rebuilds.

use umbra_geom::{Vec2, polygon};

/// Minimum vertex spacing kept after converting a host polygon.
const DEDUP_EPS: f32 = 0.01;

#[derive(Clone, Debug, PartialEq)]
pub struct GeometryInput {
    /// Source center in host pixels.
    pub center: Vec2,
    pub radius: f32,
    /// Flat LOS polygon in host pixels.
    pub los: Option<Vec<f32>>,
    pub inset: f32,
    pub segments: usize,
    pub scene_height: f32,
    /// Extra ring added around the circle fallback (darkness feather).
    pub padding: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SourceGeometry {
    /// Center in renderer space (Y up).
    pub center: Vec2,
    /// Counter-clockwise outline in renderer space.
    pub ring: Vec<Vec2>,
    pub indices: Vec<[u32; 3]>,
    pub mesh_radius: f32,
    /// Built without a LOS polygon; upgraded once the host provides one.
    pub fallback: bool,
}

impl SourceGeometry {
    /// Fan vertices: the center followed by the ring.
    pub fn vertices(&self) -> Vec<Vec2> {
        let mut v = Vec::with_capacity(self.ring.len() + 1);
        v.push(self.center);
        v.extend_from_slice(&self.ring);
        v
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len()
    }
}

/// Returns `None` for sources without extent.
pub fn build_geometry(input: &GeometryInput) -> Option<SourceGeometry> {
    if !(input.radius > 0.0) || !input.center.is_finite() {
        return None;
    }
    let center = polygon::host_to_world(input.center, input.scene_height);
    let mesh_radius = input.radius + input.padding.max(0.0);

    let los_ring = input.los.as_deref().and_then(|flat| {
        let mut ring: Vec<Vec2> = polygon::from_flat(flat)
            .into_iter()
            .map(|p| polygon::host_to_world(p, input.scene_height))
            .collect();
        polygon::dedup(&mut ring, DEDUP_EPS);
        if ring.len() < 3 || ring.iter().any(|p| !p.is_finite()) {
            return None;
        }
        polygon::ensure_ccw(&mut ring);
        if polygon::signed_area(&ring) <= 0.0 {
            return None;
        }
        Some(ring)
    });

    let (ring, fallback) = match los_ring {
        Some(ring) if input.inset > 0.0 => {
            let inset = polygon::inset_offset(&ring, input.inset)
                .unwrap_or_else(|| polygon::radial_inset(&ring, center, input.inset));
            (inset, false)
        }
        Some(ring) => (ring, false),
        None => (polygon::circle(center, mesh_radius, input.segments), true),
    };

    let indices = polygon::fan_indices(ring.len());
    Some(SourceGeometry {
        center,
        ring,
        indices,
        mesh_radius,
        fallback,
    })
}
