use proptest::prelude::*;
use umbra_geom::polygon::{circle, inset_offset, radial_inset, signed_area};
use umbra_geom::{Segment, Vec2};

fn coord() -> impl Strategy<Value = f32> {
    -1.0e4f32..1.0e4f32
}

fn arb_vec2() -> impl Strategy<Value = Vec2> {
    (coord(), coord()).prop_map(|(x, y)| Vec2::new(x, y))
}

proptest! {
    // Circle fallback area tracks the disc area for any reasonable radius
    #[test]
    fn circle_area_matches_disc(r in 1.0f32..5000.0) {
        let ring = circle(Vec2::ZERO, r, 128);
        let disc = std::f32::consts::PI * r * r;
        prop_assert!((signed_area(&ring) - disc).abs() / disc < 0.01);
    }

    // A successful inset never grows the polygon
    #[test]
    fn inset_never_grows(r in 10.0f32..2000.0, d in 0.1f32..50.0) {
        let ring = circle(Vec2::ZERO, r, 64);
        if let Some(out) = inset_offset(&ring, d) {
            prop_assert!(signed_area(&out) < signed_area(&ring));
        }
    }

    // Radial inset never moves a vertex further from the center
    #[test]
    fn radial_inset_is_contracting(p in arb_vec2(), c in arb_vec2(), d in 0.0f32..500.0) {
        let out = radial_inset(&[p], c, d);
        prop_assert!(out[0].distance(c) <= p.distance(c) + 1e-2);
    }

    // Intersection is symmetric in its two arguments
    #[test]
    fn segment_intersection_symmetric(a in arb_vec2(), b in arb_vec2(), c in arb_vec2(), d in arb_vec2()) {
        let s0 = Segment::new(a, b);
        let s1 = Segment::new(c, d);
        prop_assert_eq!(s0.intersect(&s1).is_some(), s1.intersect(&s0).is_some());
    }
}
