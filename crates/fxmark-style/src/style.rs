//! Static text style carried alongside each character.

use std::sync::Arc;

use crate::color::Argb;

bitflags::bitflags! {
    /// 8-bit static style flags.
    ///
    /// The bit layout is also the wire layout of a resolved span's style byte.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct StyleFlags: u8 {
        /// Bold text.
        const BOLD          = 0b0000_0001;
        /// Italic text.
        const ITALIC        = 0b0000_0010;
        /// Underlined text.
        const UNDERLINE     = 0b0000_0100;
        /// Strikethrough text.
        const STRIKETHROUGH = 0b0000_1000;
        /// Legacy "magic" text; the host scrambles it on its own.
        const OBFUSCATED    = 0b0001_0000;
    }
}

/// Resolved static style for a character.
///
/// Unset fields inherit from whatever the host considers the base style.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Style {
    /// Foreground color override.
    pub color: Option<Argb>,
    /// Style toggles.
    pub flags: StyleFlags,
    /// Font identifier override.
    pub font: Option<Arc<str>>,
}

impl Style {
    /// An empty style.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            color: None,
            flags: StyleFlags::empty(),
            font: None,
        }
    }

    /// Add the bold flag.
    #[must_use]
    pub fn bold(self) -> Self {
        self.flag(StyleFlags::BOLD)
    }

    /// Add the italic flag.
    #[must_use]
    pub fn italic(self) -> Self {
        self.flag(StyleFlags::ITALIC)
    }

    /// Add the underline flag.
    #[must_use]
    pub fn underline(self) -> Self {
        self.flag(StyleFlags::UNDERLINE)
    }

    /// Add the strikethrough flag.
    #[must_use]
    pub fn strikethrough(self) -> Self {
        self.flag(StyleFlags::STRIKETHROUGH)
    }

    /// Add arbitrary flags.
    #[must_use]
    pub fn flag(mut self, flags: StyleFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// Set the foreground color.
    #[must_use]
    pub fn color(mut self, color: Argb) -> Self {
        self.color = Some(color);
        self
    }

    /// Set the font id.
    #[must_use]
    pub fn font(mut self, font: impl Into<Arc<str>>) -> Self {
        self.font = Some(font.into());
        self
    }

    /// Whether every flag in `flags` is set.
    #[inline]
    #[must_use]
    pub fn has(&self, flags: StyleFlags) -> bool {
        self.flags.contains(flags)
    }

    /// True when nothing is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.color.is_none() && self.flags.is_empty() && self.font.is_none()
    }

    /// Layer `inner` on top of `self`: flags union, set fields override.
    #[must_use]
    pub fn merge(&self, inner: &Style) -> Style {
        Style {
            color: inner.color.or(self.color),
            flags: self.flags | inner.flags,
            font: inner.font.clone().or_else(|| self.font.clone()),
        }
    }
}
