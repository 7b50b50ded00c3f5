use proptest::prelude::*;
use umbra_lighting::{
    SmoothNoise, animation_time, attenuation_curve, boost_saturation, brightness_for, seed_for,
    smooth_amplitude,
};
use umbra_scene::Rgb;

proptest! {
    #[test]
    fn attenuation_stays_in_unit_range(att in -1.0f32..2.0) {
        let a = attenuation_curve(att);
        prop_assert!((0.0..=1.0 + 1e-6).contains(&a));
    }

    #[test]
    fn saturation_boost_caps_at_one(r in 0.0f32..1.0, g in 0.0f32..1.0, b in 0.0f32..1.0) {
        let c = Rgb::new(r, g, b);
        let (_, s0, l) = c.to_hsl();
        prop_assume!(l > 0.05 && l < 0.95);
        let (_, s1, _) = boost_saturation(c, 1.05).to_hsl();
        prop_assert!(s1 <= 1.0 + 1e-3);
        prop_assert!(s1 + 1e-2 >= s0.min(1.0));
    }

    #[test]
    fn brightness_bounded(lum in 0.0f32..1.0, r in 0.0f32..1.0, g in 0.0f32..1.0, b in 0.0f32..1.0) {
        let v = brightness_for(lum, Rgb::new(r, g, b));
        prop_assert!((1.2..=2.95 + 1e-5).contains(&v));
    }

    #[test]
    fn seeds_are_unit_interval(id in "[a-zA-Z0-9]{1,16}") {
        let s = seed_for(&id);
        prop_assert!((0.0..1.0).contains(&s));
    }

    #[test]
    fn reverse_negates_time(speed in 0.0f32..10.0, ms in 0.0f64..1.0e6, seed in 0.0f32..1.0) {
        let f = animation_time(speed, ms, seed, false);
        let r = animation_time(speed, ms, seed, true);
        prop_assert_eq!(f, -r);
    }

    #[test]
    fn smoothing_never_overshoots(a in 0.0f32..1.0, t in 0.0f32..1.0, speed in 0.0f32..10.0, dt in 0.0f32..100.0) {
        let next = smooth_amplitude(a, t, speed, dt);
        let (lo, hi) = if a < t { (a, t) } else { (t, a) };
        prop_assert!(next >= lo - 1e-5 && next <= hi + 1e-5);
    }

    #[test]
    fn noise_within_amplitude(x in -1.0e4f32..1.0e4) {
        let n = SmoothNoise::new(2.0, 1.5, 256, 3);
        let v = n.generate(x);
        prop_assert!((0.0..=2.0).contains(&v));
    }
}
