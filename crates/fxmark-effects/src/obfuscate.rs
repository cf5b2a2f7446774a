//! Glyph scrambling.
//!
//! Reveal and hide modes walk a reveal order: a permutation of character
//! indices built from a [`RevealDirection`]. `rank` is its inverse, so
//! `rank[i]` is the step at which character `i` changes state. Random mode
//! keeps a small set of scrambled indices, each with its own deadline.

use std::time::Duration;

use fxmark_core::{RandomObfuscation, SeededRng, mix64};
use fxmark_text::{Alphabet, ObfuscateMode, ObfuscateSpec, RevealDirection};
use tracing::trace;

use crate::error::EffectError;
use crate::glyph::GlyphState;
use crate::renderer::{EffectContext, GlyphEffect};

/// Milliseconds one filler character stays on screen.
pub const FILLER_BUCKET_MS: u64 = 50;

const READABLE: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Reveal order for `len` characters.
///
/// - `Left`: `0, 1, 2, …`
/// - `Right`: `…, 2, 1, 0`
/// - `Center`: outward from the middle, left of center first
/// - `Edges`: inward from both ends, left end first
/// - `Random`: Fisher–Yates shuffle seeded by `seed`
#[must_use]
pub fn build_order(len: usize, direction: RevealDirection, seed: u64) -> Vec<usize> {
    match direction {
        RevealDirection::Left => (0..len).collect(),
        RevealDirection::Right => (0..len).rev().collect(),
        RevealDirection::Center => {
            if len == 0 {
                return Vec::new();
            }
            let mid = (len - 1) / 2;
            let mut order = Vec::with_capacity(len);
            for k in 0..len {
                if k <= mid {
                    order.push(mid - k);
                }
                if mid + 1 + k < len {
                    order.push(mid + 1 + k);
                }
                if order.len() == len {
                    break;
                }
            }
            order
        }
        RevealDirection::Edges => {
            let mut order = Vec::with_capacity(len);
            for k in 0..len.div_ceil(2) {
                order.push(k);
                if len - 1 - k != k {
                    order.push(len - 1 - k);
                }
            }
            order
        }
        RevealDirection::Random => {
            let mut order: Vec<usize> = (0..len).collect();
            let mut rng = SeededRng::new(seed);
            for i in (1..len).rev() {
                let j = rng.next_index(i + 1);
                order.swap(i, j);
            }
            order
        }
    }
}

/// Inverse permutation: `rank[order[i]] == i`. Out-of-range entries are ignored.
#[must_use]
pub fn invert(order: &[usize]) -> Vec<usize> {
    let mut rank = vec![0; order.len()];
    for (position, &index) in order.iter().enumerate() {
        if let Some(slot) = rank.get_mut(index) {
            *slot = position;
        }
    }
    rank
}

/// Persistent state for one obfuscated element.
#[derive(Debug, Clone)]
pub struct ObfuscateTrack {
    order: Vec<usize>,
    rank: Vec<usize>,
    direction: RevealDirection,
    seed: u64,
    synced: bool,
    origin_ms: Option<u64>,
    last_access_ms: u64,
    reset_delay_ms: u64,
    active: Vec<(usize, u64)>,
    last_spawn_ms: Option<u64>,
    rng: SeededRng,
}

impl ObfuscateTrack {
    /// An empty track; call [`sync`](Self::sync) before querying it.
    #[must_use]
    pub fn new(now_ms: u64, reset_delay: Duration, seed: u64) -> Self {
        Self {
            order: Vec::new(),
            rank: Vec::new(),
            direction: RevealDirection::default(),
            seed,
            synced: false,
            origin_ms: None,
            last_access_ms: now_ms,
            reset_delay_ms: u64::try_from(reset_delay.as_millis()).unwrap_or(u64::MAX),
            active: Vec::new(),
            last_spawn_ms: None,
            rng: SeededRng::new(seed),
        }
    }

    /// Bring the track up to date for this frame.
    ///
    /// An idle track (no access for the reset delay) forgets its time origin
    /// and random state. The rank table is rebuilt when the length, the
    /// direction, or the seed differs from the last sync.
    pub fn sync(&mut self, len: usize, direction: RevealDirection, seed: u64, now_ms: u64) {
        if self.origin_ms.is_some() && now_ms.saturating_sub(self.last_access_ms) >= self.reset_delay_ms {
            trace!(idle_ms = now_ms - self.last_access_ms, "obfuscate idle, resetting");
            self.reset(now_ms);
        }
        if !self.synced || len != self.rank.len() || direction != self.direction || seed != self.seed {
            self.order = build_order(len, direction, seed);
            self.rank = invert(&self.order);
            self.direction = direction;
            self.seed = seed;
            self.synced = true;
            self.active.retain(|&(index, _)| index < len);
        }
        self.origin_ms.get_or_insert(now_ms);
        self.last_access_ms = now_ms;
    }

    /// Forget the time origin and every random choice.
    pub fn reset(&mut self, now_ms: u64) {
        self.origin_ms = None;
        self.active.clear();
        self.last_spawn_ms = None;
        self.rng = SeededRng::new(mix64(self.seed, now_ms));
    }

    /// Milliseconds since the first sync after creation or reset.
    #[must_use]
    pub fn elapsed_ms(&self, now_ms: u64) -> u64 {
        self.origin_ms.map_or(0, |origin| now_ms.saturating_sub(origin))
    }

    /// Clock time of the last sync.
    #[must_use]
    pub fn last_access_ms(&self) -> u64 {
        self.last_access_ms
    }

    /// The current reveal order.
    #[must_use]
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Position of `index` in the reveal order.
    #[must_use]
    pub fn rank(&self, index: usize) -> Option<usize> {
        self.rank.get(index).copied()
    }

    /// Characters currently scrambled by random mode.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Advance random mode: drop expired entries, then (at most once per
    /// poll interval, and only while under the scrambled fraction) add a
    /// burst of fresh indices with their own deadlines.
    pub fn step_random(&mut self, now_ms: u64, timing: &RandomObfuscation) {
        self.active.retain(|&(_, deadline)| deadline > now_ms);

        let due = self
            .last_spawn_ms
            .is_none_or(|last| now_ms.saturating_sub(last) >= timing.poll_interval_ms);
        let len = self.rank.len();
        if !due || len == 0 || self.active.len() as f64 >= timing.max_fraction * len as f64 {
            return;
        }
        self.last_spawn_ms = Some(now_ms);

        let mut free: Vec<usize> = (0..len)
            .filter(|i| !self.active.iter().any(|&(index, _)| index == *i))
            .collect();
        let burst = self
            .rng
            .next_inclusive(timing.min_burst as u64, timing.max_burst as u64) as usize;
        for _ in 0..burst.min(free.len()) {
            let index = free.swap_remove(self.rng.next_index(free.len()));
            let deadline = now_ms
                + self
                    .rng
                    .next_inclusive(timing.min_deadline_ms, timing.max_deadline_ms);
            self.active.push((index, deadline));
        }
    }

    /// Whether character `index` is scrambled right now.
    pub fn is_obfuscated(
        &self,
        index: usize,
        mode: ObfuscateMode,
        speed_ms: f64,
        now_ms: u64,
    ) -> Result<bool, EffectError> {
        let rank = self.rank(index).ok_or(EffectError::TrackMismatch {
            expected: self.rank.len(),
            found: index,
        })?;
        let step = || (self.elapsed_ms(now_ms) as f64 / speed_ms.max(1.0)).floor() as usize;
        Ok(match mode {
            ObfuscateMode::Constant => true,
            ObfuscateMode::Reveal => rank >= step(),
            ObfuscateMode::Hide => rank < step(),
            ObfuscateMode::Random => self.active.iter().any(|&(i, _)| i == index),
        })
    }

    /// Replacement for `ch` at `index`. Whitespace is never replaced.
    ///
    /// Filler is a pure function of the seed, the glyph and the time bucket,
    /// so drawing it never disturbs the random-mode spawn sequence.
    #[must_use]
    pub fn substitute(&self, index: usize, ch: char, alphabet: Alphabet, now_ms: u64) -> char {
        if ch.is_whitespace() {
            return ch;
        }
        let bucket = now_ms / FILLER_BUCKET_MS;
        match alphabet {
            Alphabet::Glyphset => {
                let hash = mix64(mix64(self.seed, bucket), index as u64);
                char::from(33 + (hash % 94) as u8)
            }
            Alphabet::Readable => {
                let hash = mix64(bucket, index as u64);
                char::from(READABLE[(hash % READABLE.len() as u64) as usize])
            }
        }
    }
}

impl GlyphEffect for ObfuscateSpec {
    fn name(&self) -> &'static str {
        "obfuscate"
    }

    fn apply(&self, ctx: &mut EffectContext<'_>, glyph: &mut GlyphState) -> Result<(), EffectError> {
        if !self.speed_ms.is_finite() {
            return Err(EffectError::NonFiniteParameter {
                effect: "obfuscate",
                param: "speed",
            });
        }
        let local = ctx.local_index(glyph.index);
        let len = ctx.extent_len();
        let key = ctx.track_key();
        let seed = self.seed.unwrap_or(key.value());
        let now_ms = ctx.now_ms;
        let timing = ctx.config.random_obfuscation;

        let track = ctx.tracks.obfuscate(key);
        track.sync(len, self.direction, seed, now_ms);
        if self.mode == ObfuscateMode::Random {
            track.step_random(now_ms, &timing);
        }
        if track.is_obfuscated(local, self.mode, self.speed_ms, now_ms)? {
            glyph.codepoint = track.substitute(local, glyph.codepoint, self.alphabet, now_ms);
        }
        Ok(())
    }
}
