//! Property-based invariant tests for the effect engines.
//!
//! 1. Every reveal order is a permutation of `0..len`, and `invert` is its
//!    exact inverse.
//! 2. Random orders are deterministic for a fixed seed.
//! 3. `visible_count` is non-decreasing in time and never exceeds the total.
//! 4. Container allocation never hands out more than the budget or more
//!    than an element holds, and fills front to back.
//! 5. Gradient colors stay between their neighbouring stops per channel.
//! 6. Shake offsets never exceed the amplitude.
//! 7. Reveal mode uncovers characters exactly in reveal order.

use std::time::Duration;

use fxmark_effects::{
    ObfuscateTrack, allocate_container, build_order, gradient_color, invert, shake_offset,
    visible_count,
};
use fxmark_style::Argb;
use fxmark_text::{ObfuscateMode, RevealDirection, ShakeKind, ShakeSpec};
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

fn direction() -> impl Strategy<Value = RevealDirection> {
    prop::sample::select(RevealDirection::ALL)
}

fn shake_kind() -> impl Strategy<Value = ShakeKind> {
    prop::sample::select(ShakeKind::ALL)
}

fn channel_between(value: u8, a: u8, b: u8) -> bool {
    value >= a.min(b) && value <= a.max(b)
}

// ═════════════════════════════════════════════════════════════════════════
// 1-2. Reveal orders
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn order_is_permutation(len in 0usize..200, dir in direction(), seed in any::<u64>()) {
        let order = build_order(len, dir, seed);
        let mut sorted = order.clone();
        sorted.sort_unstable();
        prop_assert_eq!(sorted, (0..len).collect::<Vec<_>>());

        let rank = invert(&order);
        for (i, &index) in order.iter().enumerate() {
            prop_assert_eq!(rank[index], i);
        }
    }

    #[test]
    fn random_order_is_deterministic(len in 0usize..200, seed in any::<u64>()) {
        prop_assert_eq!(
            build_order(len, RevealDirection::Random, seed),
            build_order(len, RevealDirection::Random, seed)
        );
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3-4. Typewriter
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn visible_count_monotone_and_bounded(
        total in 0usize..500,
        speed in 0.01f64..100.0,
        delay in 0.0f64..100.0,
        mut times in prop::collection::vec(0.0f64..10_000.0, 1..20),
    ) {
        times.sort_by(f64::total_cmp);
        let mut last = 0;
        for t in times {
            let visible = visible_count(t, speed, delay, total);
            prop_assert!(visible >= last);
            prop_assert!(visible <= total);
            last = visible;
        }
    }

    #[test]
    fn container_allocation_is_front_to_back(
        budget in 0usize..200,
        lengths in prop::collection::vec(0usize..50, 0..8),
    ) {
        let shares = allocate_container(budget, &lengths);
        prop_assert_eq!(shares.len(), lengths.len());
        let total: usize = lengths.iter().sum();
        prop_assert_eq!(shares.iter().sum::<usize>(), budget.min(total));
        let mut starved = false;
        for (share, len) in shares.iter().zip(&lengths) {
            prop_assert!(share <= len);
            if starved {
                prop_assert_eq!(*share, 0);
            }
            if share < len {
                starved = true;
            }
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5-6. Gradient and shake
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn gradient_stays_between_stops(
        a in any::<u32>(),
        b in any::<u32>(),
        position in 0.0f64..1.0,
    ) {
        let (a, b) = (Argb(a), Argb(b));
        let color = gradient_color(&[a, b], position, false).unwrap_or(Argb::TRANSPARENT);
        prop_assert!(channel_between(color.a(), a.a(), b.a()));
        prop_assert!(channel_between(color.r(), a.r(), b.r()));
        prop_assert!(channel_between(color.g(), a.g(), b.g()));
        prop_assert!(channel_between(color.b(), a.b(), b.b()));
    }

    #[test]
    fn shake_is_bounded_by_amplitude(
        kind in shake_kind(),
        amplitude in 0.0f64..64.0,
        speed in 0.0f64..100.0,
        wavelength in 0.01f64..1000.0,
        ticks in 0.0f64..100_000.0,
        index in 0usize..1000,
        seed in any::<u64>(),
    ) {
        let spec = ShakeSpec { kind, amplitude, speed, wavelength };
        let (x, y) = shake_offset(&spec, ticks, index, seed);
        prop_assert!(x.abs() <= amplitude + 1e-9);
        prop_assert!(y.abs() <= amplitude + 1e-9);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 7. Reveal progression
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn reveal_follows_order(len in 1usize..40, dir in direction(), seed in any::<u64>()) {
        let mut track = ObfuscateTrack::new(0, Duration::from_secs(3600), seed);
        track.sync(len, dir, seed, 0);
        let order = track.order().to_vec();

        for step in 0..=len {
            let now = step as u64 * 100;
            for (position, &index) in order.iter().enumerate() {
                let scrambled = track
                    .is_obfuscated(index, ObfuscateMode::Reveal, 100.0, now)
                    .unwrap_or(false);
                prop_assert_eq!(scrambled, position >= step);
            }
        }
    }
}
