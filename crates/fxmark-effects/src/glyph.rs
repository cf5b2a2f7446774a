//! Per-glyph output and the consumer boundaries.

use std::ops::ControlFlow;

use fxmark_style::{Argb, Style, StyleFlags};

/// One character after every effect has been applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphState {
    /// Character index in the raw text.
    pub index: usize,
    /// Character to draw; obfuscation may replace the source character.
    pub codepoint: char,
    /// Final color.
    pub color: Argb,
    /// Horizontal offset in pixels.
    pub offset_x: f64,
    /// Vertical offset in pixels.
    pub offset_y: f64,
    /// Whether the glyph is drawn at all.
    pub visible: bool,
    /// Visible fraction of the cell, top edge.
    pub mask_top: f64,
    /// Visible fraction of the cell, bottom edge.
    pub mask_bottom: f64,
    /// Resolved static style.
    pub flags: StyleFlags,
}

impl GlyphState {
    /// An unaffected glyph.
    #[must_use]
    pub fn new(index: usize, codepoint: char, color: Argb) -> Self {
        Self {
            index,
            codepoint,
            color,
            offset_x: 0.0,
            offset_y: 0.0,
            visible: true,
            mask_top: 0.0,
            mask_bottom: 1.0,
            flags: StyleFlags::empty(),
        }
    }

    /// Whether any effect moved the glyph.
    #[must_use]
    pub fn is_displaced(&self) -> bool {
        self.offset_x != 0.0 || self.offset_y != 0.0
    }
}

/// Receives styled characters in document order.
pub trait StyledCharSink {
    /// Accept one character; `Break` stops the walk.
    fn accept(&mut self, index: usize, style: &Style, ch: char) -> ControlFlow<()>;
}

impl<F> StyledCharSink for F
where
    F: FnMut(usize, &Style, char) -> ControlFlow<()>,
{
    fn accept(&mut self, index: usize, style: &Style, ch: char) -> ControlFlow<()> {
        self(index, style, ch)
    }
}

/// Receives fully resolved glyphs for quad emission.
pub trait GlyphSink {
    /// Emit one glyph.
    fn emit(&mut self, glyph: &GlyphState);
}

impl<F> GlyphSink for F
where
    F: FnMut(&GlyphState),
{
    fn emit(&mut self, glyph: &GlyphState) {
        self(glyph);
    }
}
