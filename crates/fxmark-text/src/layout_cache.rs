//! Memoization of parsed and shaped text.
//!
//! Shaping is the host's job; this cache only stores what the host
//! produced, keyed by everything that can change it. Entries leave through
//! LRU eviction on capacity overflow or through a wholesale clear when the
//! display language, the display scale, or the effect configuration
//! fingerprint changes.
//!
//! # Example
//! ```
//! use fxmark_text::AttributedText;
//! use fxmark_text::layout_cache::{CacheKey, CachedLayout, LayoutCache};
//!
//! let cache: LayoutCache<Vec<u32>> = LayoutCache::new(64);
//! let key = CacheKey::new("hello", 200, 1.0, "en_us", 0, 1);
//! let layout = cache.get_or_insert_with(key.clone(), || {
//!     CachedLayout::deferred(AttributedText::plain("hello"), || vec![1, 2, 3])
//! });
//! assert_eq!(layout.sequence(), Some(&vec![1, 2, 3]));
//!
//! assert!(cache.set_language("de_de"));
//! assert!(cache.get(&key).is_none());
//! ```

use std::fmt;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use fxmark_core::{ConfigFingerprint, DEFAULT_LAYOUT_CAPACITY};
use lru::LruCache;
use rustc_hash::FxBuildHasher;
use tracing::{debug, trace};

use crate::attributed::AttributedText;

/// Everything a shaped layout depends on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    text: Arc<str>,
    width: u32,
    scale_bits: u64,
    locale: Arc<str>,
    seed: u64,
    effects_version: u64,
}

impl CacheKey {
    /// Build a key. `scale` is compared by bit pattern.
    #[must_use]
    pub fn new(
        text: impl Into<Arc<str>>,
        width: u32,
        scale: f64,
        locale: impl Into<Arc<str>>,
        seed: u64,
        effects_version: u64,
    ) -> Self {
        Self {
            text: text.into(),
            width,
            scale_bits: scale.to_bits(),
            locale: locale.into(),
            seed,
            effects_version,
        }
    }

    /// Source text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Wrap width.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Display scale.
    #[must_use]
    pub fn scale(&self) -> f64 {
        f64::from_bits(self.scale_bits)
    }

    /// Locale tag.
    #[must_use]
    pub fn locale(&self) -> &str {
        &self.locale
    }
}

type Factory<S> = Box<dyn FnOnce() -> S + Send>;

/// A cached span bundle plus the host's shaped sequence.
///
/// The sequence may be supplied up front or produced on first access; a
/// deferred factory runs at most once.
pub struct CachedLayout<S> {
    spans: AttributedText,
    sequence: OnceLock<S>,
    factory: Mutex<Option<Factory<S>>>,
}

impl<S: fmt::Debug> fmt::Debug for CachedLayout<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedLayout")
            .field("spans", &self.spans)
            .field("sequence", &self.sequence.get())
            .finish()
    }
}

impl<S> CachedLayout<S> {
    /// A layout whose sequence is already known.
    #[must_use]
    pub fn eager(spans: AttributedText, sequence: S) -> Self {
        Self {
            spans,
            sequence: OnceLock::from(sequence),
            factory: Mutex::new(None),
        }
    }

    /// A layout whose sequence is built on first [`sequence`](Self::sequence) call.
    #[must_use]
    pub fn deferred(spans: AttributedText, factory: impl FnOnce() -> S + Send + 'static) -> Self {
        Self {
            spans,
            sequence: OnceLock::new(),
            factory: Mutex::new(Some(Box::new(factory))),
        }
    }

    /// The parsed spans.
    #[must_use]
    pub fn spans(&self) -> &AttributedText {
        &self.spans
    }

    /// The shaped sequence, building it if needed.
    ///
    /// Returns `None` only if a previous deferred build panicked.
    pub fn sequence(&self) -> Option<&S> {
        if let Some(sequence) = self.sequence.get() {
            return Some(sequence);
        }
        // Held across the build so concurrent callers wait for it.
        let mut slot = self.factory.lock().unwrap_or_else(PoisonError::into_inner);
        match slot.take() {
            Some(factory) => Some(self.sequence.get_or_init(factory)),
            None => self.sequence.get(),
        }
    }

    /// Whether the sequence exists yet.
    #[must_use]
    pub fn is_materialized(&self) -> bool {
        self.sequence.get().is_some()
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Current number of entries.
    pub size: usize,
    /// Maximum capacity.
    pub capacity: usize,
}

impl CacheStats {
    /// Calculate hit rate (0.0 to 1.0).
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Debug, Default)]
struct Environment {
    language: Option<String>,
    scale_bits: Option<u64>,
    fingerprint: Option<ConfigFingerprint>,
}

struct Inner<S> {
    entries: LruCache<CacheKey, Arc<CachedLayout<S>>, FxBuildHasher>,
    environment: Environment,
    hits: u64,
    misses: u64,
}

impl<S> Inner<S> {
    fn clear(&mut self, cause: &'static str) {
        if !self.entries.is_empty() {
            debug!(cause, dropped = self.entries.len(), "layout cache cleared");
        }
        self.entries.clear();
    }
}

/// Bounded LRU of [`CachedLayout`]s with global invalidation triggers.
pub struct LayoutCache<S> {
    inner: Mutex<Inner<S>>,
}

impl<S> fmt::Debug for LayoutCache<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutCache")
            .field("stats", &self.stats())
            .finish()
    }
}

impl<S> Default for LayoutCache<S> {
    fn default() -> Self {
        Self::new(DEFAULT_LAYOUT_CAPACITY)
    }
}

impl<S> LayoutCache<S> {
    /// Create a cache holding at most `capacity` layouts (minimum 1).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(Inner {
                entries: LruCache::with_hasher(capacity, FxBuildHasher),
                environment: Environment::default(),
                hits: 0,
                misses: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<S>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Look up a layout, refreshing its recency.
    #[must_use]
    pub fn get(&self, key: &CacheKey) -> Option<Arc<CachedLayout<S>>> {
        let mut inner = self.lock();
        match inner.entries.get(key).cloned() {
            Some(layout) => {
                inner.hits += 1;
                trace!(text = key.text(), "layout cache hit");
                Some(layout)
            }
            None => {
                inner.misses += 1;
                trace!(text = key.text(), "layout cache miss");
                None
            }
        }
    }

    /// Store a layout, returning the shared handle.
    pub fn put(&self, key: CacheKey, layout: CachedLayout<S>) -> Arc<CachedLayout<S>> {
        let layout = Arc::new(layout);
        self.lock().entries.put(key, Arc::clone(&layout));
        layout
    }

    /// Look up `key`, building and storing a layout on a miss.
    ///
    /// `make` runs outside the lock, so it may itself use the cache.
    pub fn get_or_insert_with<F>(&self, key: CacheKey, make: F) -> Arc<CachedLayout<S>>
    where
        F: FnOnce() -> CachedLayout<S>,
    {
        if let Some(layout) = self.get(&key) {
            return layout;
        }
        let layout = Arc::new(make());
        let mut inner = self.lock();
        if let Some(existing) = inner.entries.get(&key) {
            return Arc::clone(existing);
        }
        inner.entries.put(key, Arc::clone(&layout));
        layout
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.lock().clear("explicit");
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// True when empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Maximum number of entries.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.lock().entries.cap().get()
    }

    /// Change capacity, evicting least recently used entries as needed.
    pub fn resize(&self, capacity: usize) {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        self.lock().entries.resize(capacity);
    }

    /// Current statistics.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            size: inner.entries.len(),
            capacity: inner.entries.cap().get(),
        }
    }

    /// Report the active display language. Clears and returns true when it
    /// differs from the last reported value.
    pub fn set_language(&self, language: &str) -> bool {
        let mut inner = self.lock();
        if inner.environment.language.as_deref() == Some(language) {
            return false;
        }
        inner.environment.language = Some(language.to_string());
        inner.clear("language");
        true
    }

    /// Report the display scale. Clears and returns true on change.
    pub fn set_scale(&self, scale: f64) -> bool {
        let mut inner = self.lock();
        let bits = scale.to_bits();
        if inner.environment.scale_bits == Some(bits) {
            return false;
        }
        inner.environment.scale_bits = Some(bits);
        inner.clear("scale");
        true
    }

    /// Report the effect configuration fingerprint. Clears and returns true
    /// on change.
    pub fn set_config_fingerprint(&self, fingerprint: ConfigFingerprint) -> bool {
        let mut inner = self.lock();
        if inner.environment.fingerprint == Some(fingerprint) {
            return false;
        }
        inner.environment.fingerprint = Some(fingerprint);
        inner.clear("config");
        true
    }
}
