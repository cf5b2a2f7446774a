//! Deterministic randomness.
//!
//! Effects must look random while staying reproducible: the same seed,
//! time bucket, and character index always produce the same jitter or the
//! same filler glyph. Nothing here is suitable for cryptography.

use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;

const GOLDEN_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;

/// Fixed-multiply integer hash of two words.
///
/// Used to derive per-character, per-time-bucket seeds. The finalizer is
/// the SplitMix64 mixer, so adjacent inputs land far apart.
#[inline]
#[must_use]
pub fn mix64(a: u64, b: u64) -> u64 {
    let mut z = a ^ b.wrapping_mul(GOLDEN_GAMMA).rotate_left(31);
    z = z.wrapping_add(GOLDEN_GAMMA);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Hash any value with FxHash.
#[inline]
#[must_use]
pub fn fx_hash<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = FxHasher::default();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Small xorshift64 generator seeded through [`mix64`].
#[derive(Debug, Clone)]
pub struct SeededRng {
    state: u64,
}

impl SeededRng {
    /// Create a generator; every seed (including zero) yields a valid state.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        let state = mix64(seed, 0);
        Self {
            state: if state == 0 { GOLDEN_GAMMA } else { state },
        }
    }

    /// Next raw 64-bit value.
    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Uniform value in `0..bound`; returns 0 when `bound` is 0.
    pub fn next_below(&mut self, bound: u64) -> u64 {
        if bound == 0 {
            return 0;
        }
        self.next_u64() % bound
    }

    /// Uniform index in `0..len`.
    pub fn next_index(&mut self, len: usize) -> usize {
        self.next_below(len as u64) as usize
    }

    /// Uniform value in `lo..=hi`; returns `lo` when the range is empty.
    pub fn next_inclusive(&mut self, lo: u64, hi: u64) -> u64 {
        if hi <= lo {
            return lo;
        }
        match (hi - lo).checked_add(1) {
            Some(span) => lo + self.next_below(span),
            None => self.next_u64(),
        }
    }

    /// Uniform float in `[0, 1)`.
    pub fn next_unit(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform float in `[-1, 1)`.
    pub fn next_signed_unit(&mut self) -> f64 {
        self.next_unit() * 2.0 - 1.0
    }
}
