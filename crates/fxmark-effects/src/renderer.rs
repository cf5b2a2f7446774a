//! Glyph evaluation.
//!
//! [`EffectRenderer`] walks a text in document order, resolves each
//! character's static style, then applies the animated effects of its span
//! chain outermost first. An effect that fails is logged once per frame and
//! skipped; the rest of the chain and the rest of the text still render.

use std::cmp::Reverse;
use std::ops::{ControlFlow, Range};

use fxmark_core::{EffectConfig, TypewriterAllocation};
use fxmark_style::{Argb, Style};
use fxmark_text::{AttributeSpan, AttributedText, EffectDescriptor, TypewriterSpec, style_of};
use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use tracing::warn;

use crate::error::EffectError;
use crate::glyph::{GlyphSink, GlyphState, StyledCharSink};
use crate::track_cache::{TrackCache, TrackKey};
use crate::typewriter::ContainerPlan;

/// Default horizontal advance per character, in pixels.
pub const DEFAULT_GLYPH_ADVANCE: f64 = 6.0;

/// Host inputs for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameContext {
    /// Host tick counter; fractional ticks are allowed.
    pub ticks: f64,
    /// Horizontal advance of one character, used by centered typewriters.
    pub glyph_advance: f64,
    /// Color of characters no style or effect colors.
    pub base_color: Argb,
    /// Screen the text is drawn on.
    pub screen: Option<String>,
    /// Plugin (message source) the text came from.
    pub plugin: Option<String>,
    /// Stable id of this text occurrence, if the host has one.
    pub instance: Option<u64>,
    /// Monotonic progress position for regression-based typewriter restarts.
    pub progress: Option<usize>,
}

impl Default for FrameContext {
    fn default() -> Self {
        Self {
            ticks: 0.0,
            glyph_advance: DEFAULT_GLYPH_ADVANCE,
            base_color: Argb::WHITE,
            screen: None,
            plugin: None,
            instance: None,
            progress: None,
        }
    }
}

impl FrameContext {
    /// A frame at `ticks` with default everything else.
    #[must_use]
    pub fn at(ticks: f64) -> Self {
        Self {
            ticks,
            ..Self::default()
        }
    }

    /// Set the screen.
    #[must_use]
    pub fn with_screen(mut self, screen: impl Into<String>) -> Self {
        self.screen = Some(screen.into());
        self
    }

    /// Set the source plugin.
    #[must_use]
    pub fn with_plugin(mut self, plugin: impl Into<String>) -> Self {
        self.plugin = Some(plugin.into());
        self
    }

    /// Set the instance id.
    #[must_use]
    pub fn with_instance(mut self, id: u64) -> Self {
        self.instance = Some(id);
        self
    }

    /// Set the progress position.
    #[must_use]
    pub fn with_progress(mut self, position: usize) -> Self {
        self.progress = Some(position);
        self
    }

    /// Set the glyph advance.
    #[must_use]
    pub fn with_glyph_advance(mut self, advance: f64) -> Self {
        self.glyph_advance = advance;
        self
    }

    /// Set the base color.
    #[must_use]
    pub fn with_base_color(mut self, color: Argb) -> Self {
        self.base_color = color;
        self
    }

    /// Track identity of `raw` in this frame.
    #[must_use]
    pub fn text_key(&self, raw: &str) -> TrackKey {
        match self.instance {
            Some(id) => TrackKey::composite(raw, id),
            None => TrackKey::from_text(raw),
        }
    }
}

/// Everything an effect may read or mutate while evaluating one glyph.
pub struct EffectContext<'a> {
    /// Frame inputs.
    pub frame: &'a FrameContext,
    /// Active configuration.
    pub config: &'a EffectConfig,
    /// Persistent tracks.
    pub tracks: &'a mut TrackCache,
    /// Clock time for this frame.
    pub now_ms: u64,
    /// Identity of the whole text.
    pub text_key: TrackKey,
    /// Character extent of the element that declared the effect.
    pub extent: Range<usize>,
    container: Option<&'a ContainerPlan>,
}

impl<'a> EffectContext<'a> {
    /// Context for one element; the time is read from the track clock.
    pub fn new(
        frame: &'a FrameContext,
        config: &'a EffectConfig,
        tracks: &'a mut TrackCache,
        text_key: TrackKey,
        extent: Range<usize>,
    ) -> Self {
        let now_ms = tracks.now_ms();
        Self {
            frame,
            config,
            tracks,
            now_ms,
            text_key,
            extent,
            container: None,
        }
    }

    /// Track identity of the current element.
    #[must_use]
    pub fn track_key(&self) -> TrackKey {
        self.text_key.scoped(&self.extent)
    }

    /// Characters in the current element.
    #[must_use]
    pub fn extent_len(&self) -> usize {
        self.extent.len()
    }

    /// Offset of `index` inside the current element.
    #[must_use]
    pub fn local_index(&self, index: usize) -> usize {
        index.saturating_sub(self.extent.start)
    }

    pub(crate) fn container_share(&self, index: usize) -> Option<(Range<usize>, usize)> {
        self.container?.share_for(index)
    }
}

/// One animated or color effect.
pub trait GlyphEffect {
    /// Family name for logs.
    fn name(&self) -> &'static str;

    /// Apply to `glyph`. Errors are logged by the renderer and skipped.
    fn apply(&self, ctx: &mut EffectContext<'_>, glyph: &mut GlyphState) -> Result<(), EffectError>;
}

/// The effect behind a descriptor; `None` for static style.
#[must_use]
pub fn effect_of(descriptor: &EffectDescriptor) -> Option<&dyn GlyphEffect> {
    match descriptor {
        EffectDescriptor::Typewriter(spec) => Some(spec),
        EffectDescriptor::Obfuscate(spec) => Some(spec),
        EffectDescriptor::Shake(spec) => Some(spec),
        EffectDescriptor::Gradient(spec) => Some(spec),
        EffectDescriptor::Rainbow(spec) => Some(spec),
        EffectDescriptor::Style(_) => None,
    }
}

struct CompiledSpan {
    style: Style,
    effects: SmallVec<[(Range<usize>, EffectDescriptor); 4]>,
}

/// Evaluates attributed text into glyphs.
#[derive(Debug, Clone, Default)]
pub struct EffectRenderer {
    config: EffectConfig,
}

impl EffectRenderer {
    /// A renderer governed by `config`.
    #[must_use]
    pub fn new(config: EffectConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &EffectConfig {
        &self.config
    }

    /// Replace the configuration.
    pub fn set_config(&mut self, config: EffectConfig) {
        self.config = config;
    }

    /// Whether effects are off for this frame: globally disabled, or the
    /// screen or plugin is excluded.
    #[must_use]
    pub fn is_suppressed(&self, frame: &FrameContext) -> bool {
        !self.config.enabled
            || frame
                .screen
                .as_deref()
                .is_some_and(|screen| self.config.is_screen_excluded(screen))
            || frame
                .plugin
                .as_deref()
                .is_some_and(|plugin| self.config.is_plugin_excluded(plugin))
    }

    /// Evaluate every glyph of `text`.
    #[must_use]
    pub fn render(&self, text: &AttributedText, frame: &FrameContext, tracks: &mut TrackCache) -> Vec<GlyphState> {
        let mut glyphs = Vec::with_capacity(text.char_len());
        self.render_into(text, frame, tracks, &mut |glyph: &GlyphState| glyphs.push(*glyph));
        glyphs
    }

    /// Evaluate every glyph of `text` into `sink`, in document order.
    pub fn render_into<K>(&self, text: &AttributedText, frame: &FrameContext, tracks: &mut TrackCache, sink: &mut K)
    where
        K: GlyphSink + ?Sized,
    {
        if self.is_suppressed(frame) {
            for (index, ch) in text.raw_text().chars().enumerate() {
                sink.emit(&GlyphState::new(index, ch, frame.base_color));
            }
            return;
        }

        let compiled: Vec<CompiledSpan> = text.spans().iter().map(|span| self.compile(span)).collect();
        let key = frame.text_key(text.raw_text());
        let container = match self.config.typewriter_allocation {
            TypewriterAllocation::Container => Some(ContainerPlan::build(
                &typewriter_elements(&compiled),
                tracks,
                key.container(),
                frame,
                self.config.typewriter_restart,
            )),
            TypewriterAllocation::Independent => None,
        };
        let now_ms = tracks.now_ms();
        let mut failed: FxHashSet<(usize, usize)> = FxHashSet::default();

        for (index, ch) in text.raw_text().chars().enumerate() {
            let mut glyph = GlyphState::new(index, ch, frame.base_color);
            if let Some(span_index) = text.span_index_at(index) {
                let span = &compiled[span_index];
                glyph.flags = span.style.flags;
                if let Some(color) = span.style.color {
                    glyph.color = color;
                }
                for (slot, (extent, descriptor)) in span.effects.iter().enumerate() {
                    let Some(effect) = effect_of(descriptor) else {
                        continue;
                    };
                    let mut ctx = EffectContext {
                        frame,
                        config: &self.config,
                        tracks: &mut *tracks,
                        now_ms,
                        text_key: key,
                        extent: extent.clone(),
                        container: container.as_ref(),
                    };
                    if let Err(error) = effect.apply(&mut ctx, &mut glyph)
                        && failed.insert((span_index, slot))
                    {
                        warn!(effect = effect.name(), %error, "effect failed, skipped");
                    }
                }
            }
            sink.emit(&glyph);
        }
    }

    /// Walk `text` with static styles only, stopping when `sink` breaks.
    pub fn render_styled<K>(&self, text: &AttributedText, frame: &FrameContext, sink: &mut K) -> ControlFlow<()>
    where
        K: StyledCharSink + ?Sized,
    {
        let plain = Style::new();
        let styles: Vec<Style> = if self.is_suppressed(frame) {
            Vec::new()
        } else {
            text.spans().iter().map(|span| self.compile(span).style).collect()
        };
        for (index, ch) in text.raw_text().chars().enumerate() {
            let style = text
                .span_index_at(index)
                .and_then(|span| styles.get(span))
                .unwrap_or(&plain);
            sink.accept(index, style, ch)?;
        }
        ControlFlow::Continue(())
    }

    fn compile(&self, span: &AttributeSpan) -> CompiledSpan {
        let depth = span.attributes.len().min(self.config.max_span_depth);
        let chain = &span.attributes[..depth];
        let effects = chain
            .iter()
            .filter_map(|attribute| {
                let descriptor = EffectDescriptor::from_attribute(attribute)?;
                effect_of(&descriptor)?;
                Some((attribute.extent.clone(), descriptor))
            })
            .take(self.config.max_effects_per_glyph)
            .collect();
        CompiledSpan {
            style: style_of(chain),
            effects,
        }
    }
}

fn typewriter_elements(spans: &[CompiledSpan]) -> Vec<(Range<usize>, TypewriterSpec)> {
    let mut elements: Vec<(Range<usize>, TypewriterSpec)> = spans
        .iter()
        .flat_map(|span| span.effects.iter())
        .filter_map(|(extent, descriptor)| match descriptor {
            EffectDescriptor::Typewriter(spec) => Some((extent.clone(), *spec)),
            _ => None,
        })
        .collect();
    elements.sort_by_key(|(extent, _)| (extent.start, Reverse(extent.end)));
    elements.dedup_by(|a, b| a.0 == b.0);
    elements
}
