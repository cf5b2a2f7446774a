//! Per-identity animation state.
//!
//! Typewriter and obfuscate tracks live in separate LRU maps, so the same
//! key never collides across families. Entries expire after a period of
//! inactivity; an expired or evicted track is silently replaced by a fresh
//! one on the next access, so callers must not rely on a track surviving.

use std::num::NonZeroUsize;
use std::ops::Range;
use std::sync::Arc;
use std::time::Duration;

use fxmark_core::{Clock, DEFAULT_RESET_DELAY, EffectConfig, fx_hash, mix64};
use lru::LruCache;
use rustc_hash::FxBuildHasher;
use tracing::trace;

use crate::obfuscate::ObfuscateTrack;
use crate::typewriter::TypewriterTrack;

const TEXT_DOMAIN: u64 = 1;
const INSTANCE_DOMAIN: u64 = 2;
const CONTAINER_DOMAIN: u64 = 3;

/// Opaque track identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackKey(pub u64);

impl TrackKey {
    /// Identity derived from literal text content.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        Self(mix64(fx_hash(text), TEXT_DOMAIN))
    }

    /// Identity from a stable per-instance id supplied by the host.
    #[must_use]
    pub fn from_instance(id: u64) -> Self {
        Self(mix64(id, INSTANCE_DOMAIN))
    }

    /// Text and instance together, so repeated text animates independently.
    #[must_use]
    pub fn composite(text: &str, id: u64) -> Self {
        Self(mix64(Self::from_text(text).0, Self::from_instance(id).0))
    }

    /// Identity of one element (character extent) inside this text.
    #[must_use]
    pub fn scoped(self, extent: &Range<usize>) -> Self {
        Self(mix64(self.0, ((extent.start as u64) << 32) ^ extent.end as u64))
    }

    /// Identity of the shared container-typewriter budget for this text.
    #[must_use]
    pub fn container(self) -> Self {
        Self(mix64(self.0, CONTAINER_DOMAIN))
    }

    /// Raw value, also used as the default seed for random effects.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

/// Bounded, idle-expiring storage for effect tracks.
#[derive(Debug)]
pub struct TrackCache {
    clock: Arc<dyn Clock>,
    idle_timeout_ms: u64,
    typewriter_reset: Duration,
    obfuscate_reset: Duration,
    typewriter: LruCache<TrackKey, TypewriterTrack, FxBuildHasher>,
    obfuscate: LruCache<TrackKey, ObfuscateTrack, FxBuildHasher>,
}

impl TrackCache {
    /// A cache holding up to `capacity` tracks per family.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, capacity: usize, idle_timeout: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            clock,
            idle_timeout_ms: millis(idle_timeout),
            typewriter_reset: DEFAULT_RESET_DELAY,
            obfuscate_reset: DEFAULT_RESET_DELAY,
            typewriter: LruCache::with_hasher(capacity, FxBuildHasher),
            obfuscate: LruCache::with_hasher(capacity, FxBuildHasher),
        }
    }

    /// A cache sized and timed by `config`.
    #[must_use]
    pub fn from_config(clock: Arc<dyn Clock>, config: &EffectConfig) -> Self {
        Self::new(clock, config.track_capacity, config.track_idle_timeout)
            .with_reset_delays(config.typewriter_reset_delay, config.obfuscate_reset_delay)
    }

    /// Idle time after which tracks restart while keeping their identity.
    #[must_use]
    pub fn with_reset_delays(mut self, typewriter: Duration, obfuscate: Duration) -> Self {
        self.typewriter_reset = typewriter;
        self.obfuscate_reset = obfuscate;
        self
    }

    /// Current clock time.
    #[must_use]
    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// The typewriter track for `key`, created fresh if absent or expired.
    pub fn typewriter(&mut self, key: TrackKey) -> &mut TypewriterTrack {
        let now = self.now_ms();
        let idle = self.idle_timeout_ms;
        if self
            .typewriter
            .peek(&key)
            .is_some_and(|track| now.saturating_sub(track.last_access_ms()) > idle)
        {
            trace!(key = key.0, "typewriter track expired");
            self.typewriter.pop(&key);
        }
        let reset = self.typewriter_reset;
        self.typewriter.get_or_insert_mut(key, || {
            trace!(key = key.0, "typewriter track created");
            TypewriterTrack::new(now, reset)
        })
    }

    /// The obfuscate track for `key`, created fresh if absent or expired.
    pub fn obfuscate(&mut self, key: TrackKey) -> &mut ObfuscateTrack {
        let now = self.now_ms();
        let idle = self.idle_timeout_ms;
        if self
            .obfuscate
            .peek(&key)
            .is_some_and(|track| now.saturating_sub(track.last_access_ms()) > idle)
        {
            trace!(key = key.0, "obfuscate track expired");
            self.obfuscate.pop(&key);
        }
        let reset = self.obfuscate_reset;
        self.obfuscate.get_or_insert_mut(key, || {
            trace!(key = key.0, "obfuscate track created");
            ObfuscateTrack::new(now, reset, key.0)
        })
    }

    /// Evict idle tracks, oldest first. Returns how many were removed.
    pub fn sweep(&mut self) -> usize {
        let now = self.now_ms();
        let idle = self.idle_timeout_ms;
        let mut removed = 0;
        while self
            .typewriter
            .peek_lru()
            .is_some_and(|(_, track)| now.saturating_sub(track.last_access_ms()) > idle)
        {
            self.typewriter.pop_lru();
            removed += 1;
        }
        while self
            .obfuscate
            .peek_lru()
            .is_some_and(|(_, track)| now.saturating_sub(track.last_access_ms()) > idle)
        {
            self.obfuscate.pop_lru();
            removed += 1;
        }
        if removed > 0 {
            trace!(removed, "idle tracks swept");
        }
        removed
    }

    /// Drop both tracks stored under `key`.
    pub fn reset(&mut self, key: TrackKey) {
        self.typewriter.pop(&key);
        self.obfuscate.pop(&key);
    }

    /// Drop every track.
    pub fn clear(&mut self) {
        self.typewriter.clear();
        self.obfuscate.clear();
    }

    /// Live typewriter tracks.
    #[must_use]
    pub fn typewriter_len(&self) -> usize {
        self.typewriter.len()
    }

    /// Live obfuscate tracks.
    #[must_use]
    pub fn obfuscate_len(&self) -> usize {
        self.obfuscate.len()
    }

    /// Live tracks across both families.
    #[must_use]
    pub fn len(&self) -> usize {
        self.typewriter.len() + self.obfuscate.len()
    }

    /// Whether no track is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Per-family capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.typewriter.cap().get()
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
