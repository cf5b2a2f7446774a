#![forbid(unsafe_code)]

//! fxmark public facade crate.
//!
//! Re-exports the markup, effect, cache and codec types from the internal
//! crates and adds [`TextEngine`], the one object a host keeps around to
//! parse, lay out, animate and ship rich text.
//!
//! # Example
//! ```
//! use std::sync::Arc;
//!
//! use fxmark::prelude::*;
//!
//! let clock = Arc::new(ManualClock::new(0));
//! let mut engine: TextEngine<Vec<char>> = TextEngine::with_clock(EffectConfig::default(), clock);
//!
//! let text = engine.parse("<bold>hi</bold> <typewriter>there</typewriter>");
//! assert_eq!(text.raw_text(), "hi there");
//!
//! let _ = engine.render(&text, &FrameContext::at(0.0));
//! let glyphs = engine.render(&text, &FrameContext::at(4.0));
//! let shown: String = glyphs.iter().filter(|g| g.visible).map(|g| g.codepoint).collect();
//! assert_eq!(shown, "hi ther");
//! ```

use std::fmt;

pub mod engine;

pub use engine::TextEngine;

// --- Core re-exports -------------------------------------------------------

pub use fxmark_core::{
    Clock, ConfigFingerprint, EffectConfig, ManualClock, RandomObfuscation, RestartPolicy,
    SystemClock, TypewriterAllocation,
};

// --- Style re-exports ------------------------------------------------------

pub use fxmark_style::{Argb, Style, StyleFlags};

// --- Text re-exports -------------------------------------------------------

pub use fxmark_text::{
    Attribute, AttributeSpan, AttributedText, CacheKey, CacheStats, CachedLayout,
    EffectDescriptor, EffectRegistry, LayoutCache, ParseOptions, Run, parse,
};

// --- Effect re-exports -----------------------------------------------------

pub use fxmark_effects::{
    EffectError, EffectRenderer, FrameContext, GlyphEffect, GlyphSink, GlyphState,
    StyledCharSink, TrackCache, TrackKey,
};

// --- Wire re-exports -------------------------------------------------------

pub use fxmark_wire::{DecodeError, EncodeError, ResolvedSpan, decode_spans, encode_spans};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for fxmark hosts.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// A span list could not be encoded.
    Encode(EncodeError),
    /// Received bytes were not a valid span list.
    Decode(DecodeError),
    /// An effect could not be evaluated.
    Effect(EffectError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encode(err) => write!(f, "encode: {err}"),
            Self::Decode(err) => write!(f, "decode: {err}"),
            Self::Effect(err) => write!(f, "effect: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Encode(err) => Some(err),
            Self::Decode(err) => Some(err),
            Self::Effect(err) => Some(err),
        }
    }
}

impl From<EncodeError> for Error {
    fn from(err: EncodeError) -> Self {
        Self::Encode(err)
    }
}

impl From<DecodeError> for Error {
    fn from(err: DecodeError) -> Self {
        Self::Decode(err)
    }
}

impl From<EffectError> for Error {
    fn from(err: EffectError) -> Self {
        Self::Effect(err)
    }
}

/// Standard result type for fxmark APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Argb, AttributedText, EffectConfig, Error, FrameContext, GlyphState, ManualClock,
        ResolvedSpan, Result, Style, StyleFlags, SystemClock, TextEngine,
    };

    pub use crate::{core, effects, style, text, wire};
}

pub use fxmark_core as core;
pub use fxmark_effects as effects;
pub use fxmark_style as style;
pub use fxmark_text as text;
pub use fxmark_wire as wire;
