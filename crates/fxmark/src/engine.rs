//! The host-facing service object.
//!
//! [`TextEngine`] owns everything that outlives a single frame: the effect
//! configuration, the tag registry, animation tracks and the layout cache.
//! A host creates one per rendering context and reports environment
//! changes (language, scale, configuration) to it.

use std::ops::ControlFlow;
use std::sync::Arc;

use fxmark_core::{Clock, EffectConfig, SystemClock};
use fxmark_effects::{EffectRenderer, FrameContext, GlyphSink, GlyphState, StyledCharSink, TrackCache};
use fxmark_text::{AttributedText, CacheKey, CachedLayout, EffectRegistry, LayoutCache, ParseOptions, parse};
use fxmark_wire::{ResolvedSpan, decode_spans, encode_spans, spans_from_text};
use tracing::{debug, info};

use crate::Result;

const DEFAULT_LANGUAGE: &str = "en_us";

/// Parse, lay out, animate and encode rich text with shared caches.
///
/// `S` is whatever the host produces when it shapes a line of text.
pub struct TextEngine<S> {
    config: EffectConfig,
    registry: EffectRegistry,
    renderer: EffectRenderer,
    clock: Arc<dyn Clock>,
    tracks: TrackCache,
    layouts: LayoutCache<S>,
    language: String,
    scale: f64,
}

impl<S> std::fmt::Debug for TextEngine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextEngine")
            .field("config", &self.config)
            .field("tracks", &self.tracks.len())
            .field("layouts", &self.layouts.len())
            .field("language", &self.language)
            .field("scale", &self.scale)
            .finish()
    }
}

impl<S> TextEngine<S> {
    /// An engine on the system clock.
    #[must_use]
    pub fn new(config: EffectConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock::new()))
    }

    /// An engine on a caller-supplied clock.
    #[must_use]
    pub fn with_clock(config: EffectConfig, clock: Arc<dyn Clock>) -> Self {
        let layouts = LayoutCache::new(config.layout_capacity);
        layouts.set_language(DEFAULT_LANGUAGE);
        layouts.set_scale(1.0);
        layouts.set_config_fingerprint(config.fingerprint());
        Self {
            tracks: TrackCache::from_config(Arc::clone(&clock), &config),
            renderer: EffectRenderer::new(config.clone()),
            registry: EffectRegistry::builtin(),
            config,
            clock,
            layouts,
            language: DEFAULT_LANGUAGE.to_string(),
            scale: 1.0,
        }
    }

    /// Replace the tag registry. Cached layouts were parsed with the old
    /// one, so they are dropped.
    #[must_use]
    pub fn with_registry(mut self, registry: EffectRegistry) -> Self {
        self.registry = registry;
        self.layouts.clear();
        self
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &EffectConfig {
        &self.config
    }

    /// Tag registry used by [`parse`](Self::parse).
    #[must_use]
    pub fn registry(&self) -> &EffectRegistry {
        &self.registry
    }

    /// Animation tracks.
    #[must_use]
    pub fn tracks(&self) -> &TrackCache {
        &self.tracks
    }

    /// Mutable animation tracks, for explicit resets.
    pub fn tracks_mut(&mut self) -> &mut TrackCache {
        &mut self.tracks
    }

    /// Layout cache.
    #[must_use]
    pub fn layouts(&self) -> &LayoutCache<S> {
        &self.layouts
    }

    /// Clock shared with the track cache.
    #[must_use]
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Current display language.
    #[must_use]
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Current display scale.
    #[must_use]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Parse markup under the configured limits.
    #[must_use]
    pub fn parse(&self, source: &str) -> AttributedText {
        parse(source, &self.registry, &ParseOptions::from_config(&self.config))
    }

    fn key(&self, source: &str, width: u32, seed: u64) -> CacheKey {
        CacheKey::new(
            source,
            width,
            self.scale,
            self.language.as_str(),
            seed,
            self.config.fingerprint().0,
        )
    }

    /// Parse and shape `source` for `width`, reusing a cached layout when
    /// nothing it depends on has changed.
    pub fn layout<F>(&self, source: &str, width: u32, seed: u64, shape: F) -> Arc<CachedLayout<S>>
    where
        F: FnOnce(&AttributedText) -> S,
    {
        self.layouts.get_or_insert_with(self.key(source, width, seed), || {
            let text = self.parse(source);
            let sequence = shape(&text);
            CachedLayout::eager(text, sequence)
        })
    }

    /// Like [`layout`](Self::layout) but shaping runs on first access to
    /// the sequence instead of now.
    pub fn layout_deferred<F>(&self, source: &str, width: u32, seed: u64, shape: F) -> Arc<CachedLayout<S>>
    where
        F: FnOnce() -> S + Send + 'static,
    {
        self.layouts.get_or_insert_with(self.key(source, width, seed), || {
            CachedLayout::deferred(self.parse(source), shape)
        })
    }

    /// Evaluate every glyph of `text` for one frame.
    pub fn render(&mut self, text: &AttributedText, frame: &FrameContext) -> Vec<GlyphState> {
        self.sweep();
        self.renderer.render(text, frame, &mut self.tracks)
    }

    /// Stream glyphs of `text` into `sink` in document order.
    pub fn render_into<K>(&mut self, text: &AttributedText, frame: &FrameContext, sink: &mut K)
    where
        K: GlyphSink + ?Sized,
    {
        self.sweep();
        self.renderer.render_into(text, frame, &mut self.tracks, sink);
    }

    /// Visit static per-character style without running animations.
    pub fn render_styled<K>(&self, text: &AttributedText, frame: &FrameContext, sink: &mut K) -> ControlFlow<()>
    where
        K: StyledCharSink + ?Sized,
    {
        self.renderer.render_styled(text, frame, sink)
    }

    fn sweep(&mut self) {
        let evicted = self.tracks.sweep();
        if evicted > 0 {
            debug!(evicted, remaining = self.tracks.len(), "idle tracks evicted");
        }
    }

    /// Install a new configuration.
    ///
    /// Tracks are rebuilt when their sizing or timing changed. Returns true
    /// when the configuration fingerprint changed and cached layouts were
    /// dropped.
    pub fn apply_config(&mut self, config: EffectConfig) -> bool {
        if config == self.config {
            return false;
        }
        let tracks_changed = config.track_capacity != self.config.track_capacity
            || config.track_idle_timeout != self.config.track_idle_timeout
            || config.typewriter_reset_delay != self.config.typewriter_reset_delay
            || config.obfuscate_reset_delay != self.config.obfuscate_reset_delay;
        if tracks_changed {
            self.tracks = TrackCache::from_config(Arc::clone(&self.clock), &config);
        }
        let fingerprint = config.fingerprint();
        self.layouts.resize(config.layout_capacity);
        let invalidated = self.layouts.set_config_fingerprint(fingerprint);
        self.renderer.set_config(config.clone());
        self.config = config;
        info!(
            fingerprint = fingerprint.0,
            enabled = self.config.enabled,
            tracks_rebuilt = tracks_changed,
            layouts_invalidated = invalidated,
            "effect configuration applied"
        );
        invalidated
    }

    /// Report the display language. Returns true when cached layouts were
    /// invalidated.
    pub fn set_language(&mut self, language: &str) -> bool {
        self.language = language.to_string();
        self.layouts.set_language(language)
    }

    /// Report the display scale. Returns true when cached layouts were
    /// invalidated.
    pub fn set_scale(&mut self, scale: f64) -> bool {
        self.scale = scale;
        self.layouts.set_scale(scale)
    }

    /// Resolve `text` into transport spans and encode them.
    pub fn encode(&self, text: &AttributedText) -> Result<Vec<u8>> {
        Ok(encode_spans(&spans_from_text(text))?)
    }

    /// Decode spans received from a peer.
    pub fn decode(&self, bytes: &[u8]) -> Result<Vec<ResolvedSpan>> {
        Ok(decode_spans(bytes)?)
    }
}

impl<S> Default for TextEngine<S> {
    fn default() -> Self {
        Self::new(EffectConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fxmark_core::ManualClock;
    use tracing_test::traced_test;

    fn engine() -> TextEngine<()> {
        TextEngine::with_clock(EffectConfig::default(), Arc::new(ManualClock::new(0)))
    }

    #[test]
    #[traced_test]
    fn config_change_is_logged() {
        let mut engine = engine();
        assert!(engine.apply_config(EffectConfig::default().with_enabled(false)));
        assert!(logs_contain("effect configuration applied"));
        assert!(logs_contain("layouts_invalidated=true"));
    }

    #[test]
    #[traced_test]
    fn idle_sweep_is_logged() {
        let clock = Arc::new(ManualClock::new(0));
        let mut engine: TextEngine<()> = TextEngine::with_clock(EffectConfig::default(), clock.clone());
        let text = engine.parse("<typewriter>ab</typewriter>");
        let _ = engine.render(&text, &FrameContext::at(0.0));
        clock.advance_ms(10_000);
        let _ = engine.render(&AttributedText::plain(""), &FrameContext::at(1.0));
        assert!(logs_contain("idle tracks evicted"));
    }

    #[test]
    fn registry_swap_drops_layouts() {
        let engine = engine();
        let _ = engine.layout("x", 10, 0, |_| ());
        assert_eq!(engine.layouts().len(), 1);
        let engine = engine.with_registry(EffectRegistry::new());
        assert!(engine.layouts().is_empty());
        assert_eq!(engine.parse("<bold>x</bold>").spans().len(), 0);
    }
}
