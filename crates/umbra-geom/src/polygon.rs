//! Polygon helpers for line-of-sight meshes.
//!
//! Host polygons arrive as flat `[x0, y0, x1, y1, ...]` arrays in host space
//! (top-left origin, Y down). Meshes are built in renderer space (Y up) and
//! relative to the source center.

use crate::{Segment, Vec2};

/// Reject offsets whose miter would extend past this many multiples of the distance.
const MITER_LIMIT: f32 = 4.0;

pub fn from_flat(points: &[f32]) -> Vec<Vec2> {
    points
        .chunks_exact(2)
        .map(|c| Vec2::new(c[0], c[1]))
        .collect()
}

pub fn to_flat(points: &[Vec2]) -> Vec<f32> {
    let mut out = Vec::with_capacity(points.len() * 2);
    for p in points {
        out.push(p.x);
        out.push(p.y);
    }
    out
}

/// Host (Y down) to renderer (Y up) for a scene of the given pixel height.
#[inline]
pub fn host_to_world(p: Vec2, scene_height: f32) -> Vec2 {
    Vec2::new(p.x, scene_height - p.y)
}

#[inline]
pub fn world_to_host(p: Vec2, scene_height: f32) -> Vec2 {
    Vec2::new(p.x, scene_height - p.y)
}

/// Positive for counter-clockwise rings in a Y-up frame.
pub fn signed_area(ring: &[Vec2]) -> f32 {
    if ring.len() < 3 {
        return 0.0;
    }
    let mut acc = 0.0;
    for i in 0..ring.len() {
        let a = ring[i];
        let b = ring[(i + 1) % ring.len()];
        acc += a.cross(b);
    }
    acc * 0.5
}

pub fn ensure_ccw(ring: &mut [Vec2]) {
    if signed_area(ring) < 0.0 {
        ring.reverse();
    }
}

/// Drops consecutive duplicates and the closing vertex when it repeats the first.
pub fn dedup(ring: &mut Vec<Vec2>, eps: f32) {
    ring.dedup_by(|b, a| a.distance(*b) <= eps);
    while ring.len() > 1 {
        let (first, last) = (ring[0], ring[ring.len() - 1]);
        if first.distance(last) <= eps {
            ring.pop();
        } else {
            break;
        }
    }
}

pub fn contains_point(ring: &[Vec2], p: Vec2) -> bool {
    let mut inside = false;
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut j = n - 1;
    for i in 0..n {
        let (a, b) = (ring[i], ring[j]);
        if (a.y > p.y) != (b.y > p.y) {
            let x = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
            if p.x < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Regular polygon approximating a circle, counter-clockwise.
pub fn circle(center: Vec2, radius: f32, segments: usize) -> Vec<Vec2> {
    let segments = segments.max(3);
    (0..segments)
        .map(|i| {
            let a = (i as f32 / segments as f32) * std::f32::consts::TAU;
            Vec2::new(center.x + radius * a.cos(), center.y + radius * a.sin())
        })
        .collect()
}

/// Inward miter offset of a simple ring. Returns `None` when the result
/// degenerates (collapsed area, flipped edges, non-finite vertices); callers
/// fall back to [`radial_inset`].
pub fn inset_offset(ring: &[Vec2], distance: f32) -> Option<Vec<Vec2>> {
    let n = ring.len();
    if n < 3 {
        return None;
    }
    if distance <= 0.0 {
        return Some(ring.to_vec());
    }
    let mut src = ring.to_vec();
    ensure_ccw(&mut src);
    let area = signed_area(&src);
    if area <= 0.0 {
        return None;
    }
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let prev = src[(i + n - 1) % n];
        let cur = src[i];
        let next = src[(i + 1) % n];
        let n0 = (cur - prev).normalized().perp();
        let n1 = (next - cur).normalized().perp();
        let bis = (n0 + n1).normalized();
        let cos_half = bis.dot(n1);
        if bis.length_sq() == 0.0 || cos_half.abs() < 1e-4 {
            out.push(cur + n1 * distance);
            continue;
        }
        let miter = (distance / cos_half).min(distance * MITER_LIMIT);
        out.push(cur + bis * miter);
    }
    if out.iter().any(|p| !p.is_finite()) {
        return None;
    }
    for i in 0..n {
        let before = src[(i + 1) % n] - src[i];
        let after = out[(i + 1) % n] - out[i];
        if before.dot(after) < 0.0 {
            return None;
        }
    }
    let new_area = signed_area(&out);
    if new_area <= 0.0 || new_area >= area {
        return None;
    }
    Some(out)
}

/// Moves every vertex towards `center` by `distance`, never past it.
pub fn radial_inset(ring: &[Vec2], center: Vec2, distance: f32) -> Vec<Vec2> {
    ring.iter()
        .map(|&p| {
            let d = p - center;
            let len = d.length();
            if len <= 0.0 {
                return p;
            }
            let new_len = (len - distance).max(0.0);
            center + d * (new_len / len)
        })
        .collect()
}

/// Triangle fan indices for `[center, ring...]` vertex layout.
pub fn fan_indices(ring_len: usize) -> Vec<[u32; 3]> {
    if ring_len < 2 {
        return Vec::new();
    }
    (0..ring_len)
        .map(|i| {
            let a = (i + 1) as u32;
            let b = ((i + 1) % ring_len + 1) as u32;
            [0, a, b]
        })
        .collect()
}

/// Largest distance from `center` to any vertex.
pub fn max_radius(ring: &[Vec2], center: Vec2) -> f32 {
    ring.iter().map(|p| p.distance(center)).fold(0.0, f32::max)
}

/// Every wall-like edge of a ring, closing edge included.
pub fn edges(ring: &[Vec2]) -> impl Iterator<Item = Segment> + '_ {
    let n = ring.len();
    (0..n).map(move |i| Segment::new(ring[i], ring[(i + 1) % n]))
}
