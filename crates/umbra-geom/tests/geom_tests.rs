use umbra_geom::polygon::{
    circle, contains_point, dedup, fan_indices, from_flat, host_to_world, inset_offset,
    radial_inset, signed_area, to_flat,
};
use umbra_geom::{Rect, Segment, Vec2};

fn approx_eq(a: f32, b: f32, eps: f32) -> bool {
    (a - b).abs() <= eps
}

#[test]
fn vec2_perp_is_ccw() {
    let v = Vec2::new(1.0, 0.0);
    assert_eq!(v.perp(), Vec2::new(0.0, 1.0));
    assert!(approx_eq(v.cross(v.perp()), 1.0, 1e-6));
}

#[test]
fn rect_from_points_and_expand() {
    let r = Rect::from_points(Vec2::new(10.0, 40.0), Vec2::new(0.0, 20.0));
    assert_eq!(r, Rect::new(0.0, 20.0, 10.0, 20.0));
    let e = r.expanded(5.0);
    assert_eq!(e, Rect::new(-5.0, 15.0, 20.0, 30.0));
    let clipped = e.intersect(&Rect::new(0.0, 0.0, 100.0, 100.0));
    assert_eq!(clipped, Rect::new(0.0, 15.0, 15.0, 30.0));
}

#[test]
fn segment_intersection_crossing() {
    let a = Segment::new(Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0));
    let b = Segment::new(Vec2::new(5.0, -5.0), Vec2::new(5.0, 5.0));
    let (t, u) = a.intersect(&b).unwrap();
    assert!(approx_eq(t, 0.5, 1e-6));
    assert!(approx_eq(u, 0.5, 1e-6));
}

#[test]
fn segment_parallel_never_intersects() {
    let a = Segment::new(Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0));
    let b = Segment::new(Vec2::new(0.0, 1.0), Vec2::new(10.0, 1.0));
    assert!(a.intersect(&b).is_none());
}

#[test]
fn segment_distance_to_point_clamps() {
    let s = Segment::new(Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0));
    assert!(approx_eq(s.distance_to_point(Vec2::new(5.0, 3.0)), 3.0, 1e-6));
    assert!(approx_eq(s.distance_to_point(Vec2::new(-4.0, 3.0)), 5.0, 1e-6));
}

#[test]
fn flat_roundtrip_and_flip() {
    let flat = [0.0, 0.0, 10.0, 0.0, 10.0, 10.0];
    let pts = from_flat(&flat);
    assert_eq!(pts.len(), 3);
    assert_eq!(to_flat(&pts), flat.to_vec());
    assert_eq!(host_to_world(Vec2::new(3.0, 10.0), 100.0), Vec2::new(3.0, 90.0));
}

#[test]
fn circle_is_ccw_and_close_to_disc_area() {
    let c = circle(Vec2::ZERO, 100.0, 128);
    assert_eq!(c.len(), 128);
    let area = signed_area(&c);
    assert!(area > 0.0);
    let disc = std::f32::consts::PI * 100.0 * 100.0;
    assert!((area - disc).abs() / disc < 0.01);
}

#[test]
fn inset_square_shrinks_uniformly() {
    let sq = vec![
        Vec2::new(0.0, 0.0),
        Vec2::new(100.0, 0.0),
        Vec2::new(100.0, 100.0),
        Vec2::new(0.0, 100.0),
    ];
    let inset = inset_offset(&sq, 10.0).unwrap();
    assert!(approx_eq(signed_area(&inset), 80.0 * 80.0, 1e-2));
    assert!(contains_point(&sq, inset[0]));
}

#[test]
fn inset_collapses_to_none() {
    let sq = vec![
        Vec2::new(0.0, 0.0),
        Vec2::new(10.0, 0.0),
        Vec2::new(10.0, 10.0),
        Vec2::new(0.0, 10.0),
    ];
    assert!(inset_offset(&sq, 20.0).is_none());
}

#[test]
fn radial_inset_stops_at_center() {
    let ring = vec![Vec2::new(5.0, 0.0), Vec2::new(0.0, 50.0)];
    let out = radial_inset(&ring, Vec2::ZERO, 10.0);
    assert_eq!(out[0], Vec2::ZERO);
    assert!(approx_eq(out[1].y, 40.0, 1e-5));
}

#[test]
fn dedup_drops_closing_vertex() {
    let mut ring = vec![
        Vec2::new(0.0, 0.0),
        Vec2::new(0.0, 0.0),
        Vec2::new(1.0, 0.0),
        Vec2::new(1.0, 1.0),
        Vec2::new(0.0, 0.0),
    ];
    dedup(&mut ring, 1e-4);
    assert_eq!(ring.len(), 3);
}

#[test]
fn fan_indices_wrap_around() {
    let idx = fan_indices(4);
    assert_eq!(idx, vec![[0, 1, 2], [0, 2, 3], [0, 3, 4], [0, 4, 1]]);
    assert!(fan_indices(1).is_empty());
}
