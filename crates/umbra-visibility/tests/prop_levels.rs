use proptest::prelude::*;
use umbra_scene::LevelContext;
use umbra_visibility::above_active_level;

proptest! {
    // A single level never hides anything.
    #[test]
    fn single_level_never_hides(elev in -1e6f32..1e6, top in -1e6f32..1e6) {
        let ctx = LevelContext { level_count: 1, active_bottom: 0.0, active_top: top };
        prop_assert!(!above_active_level(elev, Some(&ctx), 0.01));
    }

    // With several levels the filter is a threshold on elevation.
    #[test]
    fn filter_is_monotonic(
        a in -1e4f32..1e4,
        b in -1e4f32..1e4,
        top in -1e4f32..1e4,
        levels in 2usize..8,
    ) {
        let ctx = LevelContext { level_count: levels, active_bottom: top - 10.0, active_top: top };
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        if above_active_level(lo, Some(&ctx), 0.01) {
            prop_assert!(above_active_level(hi, Some(&ctx), 0.01));
        }
        prop_assert_eq!(above_active_level(top, Some(&ctx), 0.01), true);
    }
}
