#![forbid(unsafe_code)]

//! Glyph effects for fxmark.
//!
//! Given [`AttributedText`](fxmark_text::AttributedText) from the markup
//! layer, the [`EffectRenderer`] produces one [`GlyphState`] per character:
//! resolved color and style, pixel offsets, visibility, and the character
//! actually drawn. Effects that need memory across frames (typewriter,
//! obfuscate) keep it in a [`TrackCache`] the caller owns.
//!
//! - [`typewriter`] - progressive reveal, container allocation, restarts
//! - [`obfuscate`] - reveal orders, scramble modes, filler glyphs
//! - [`shake`] - wave, circle and jitter offsets
//! - [`gradient`] - color stops and rainbow hue cycling
//! - [`track_cache`] - [`TrackKey`] and the per-family LRU of tracks
//! - [`renderer`] - [`FrameContext`], [`GlyphEffect`], [`EffectRenderer`]
//!
//! # Example
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use fxmark_core::ManualClock;
//! use fxmark_effects::{EffectRenderer, FrameContext, TrackCache};
//! use fxmark_text::{EffectRegistry, ParseOptions, parse};
//!
//! let text = parse("<typewriter>hey</typewriter>", &EffectRegistry::builtin(), &ParseOptions::default());
//! let mut tracks = TrackCache::new(Arc::new(ManualClock::new(0)), 64, Duration::from_secs(1));
//! let renderer = EffectRenderer::default();
//!
//! let _ = renderer.render(&text, &FrameContext::at(0.0), &mut tracks);
//! let glyphs = renderer.render(&text, &FrameContext::at(2.0), &mut tracks);
//! let shown: String = glyphs.iter().filter(|g| g.visible).map(|g| g.codepoint).collect();
//! assert_eq!(shown, "he");
//! ```

pub mod error;
pub mod glyph;
pub mod gradient;
pub mod obfuscate;
pub mod renderer;
pub mod shake;
pub mod track_cache;
pub mod typewriter;

pub use error::EffectError;
pub use glyph::{GlyphSink, GlyphState, StyledCharSink};
pub use gradient::{gradient_color, gradient_position, rainbow_color};
pub use obfuscate::{ObfuscateTrack, build_order, invert};
pub use renderer::{DEFAULT_GLYPH_ADVANCE, EffectContext, EffectRenderer, FrameContext, GlyphEffect, effect_of};
pub use shake::shake_offset;
pub use track_cache::{TrackCache, TrackKey};
pub use typewriter::{TypewriterTrack, allocate_container, visible_count};
