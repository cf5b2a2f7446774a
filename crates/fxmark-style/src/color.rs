//! Packed ARGB colors.
//!
//! Colors travel through the pipeline as a single `u32` in `0xAARRGGBB`
//! order, which is also the order hosts expect for glyph quads. Parsing
//! never fails loudly: callers that have a sensible fallback use
//! [`Argb::parse_or`].

use std::fmt;

/// A color packed as `0xAARRGGBB`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct Argb(pub u32);

impl Argb {
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self(0);
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    /// Create an opaque color.
    #[inline]
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::argb(255, r, g, b)
    }

    /// Create a color with explicit alpha.
    #[inline]
    #[must_use]
    pub const fn argb(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self(((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | (b as u32))
    }

    /// Alpha channel.
    #[inline]
    #[must_use]
    pub const fn a(self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// Red channel.
    #[inline]
    #[must_use]
    pub const fn r(self) -> u8 {
        (self.0 >> 16) as u8
    }

    /// Green channel.
    #[inline]
    #[must_use]
    pub const fn g(self) -> u8 {
        (self.0 >> 8) as u8
    }

    /// Blue channel.
    #[inline]
    #[must_use]
    pub const fn b(self) -> u8 {
        self.0 as u8
    }

    /// Same color with a different alpha.
    #[inline]
    #[must_use]
    pub const fn with_alpha(self, a: u8) -> Self {
        Self((self.0 & 0x00FF_FFFF) | ((a as u32) << 24))
    }

    /// Linear interpolation per ARGB channel in integer space.
    ///
    /// `t` is clamped to `[0, 1]` and quantized to 1/256 steps, so `t = 0`
    /// and `t = 1` return the endpoints exactly.
    #[must_use]
    pub fn lerp(self, other: Self, t: f64) -> Self {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let weight = (t * 256.0).round() as i32;
        let channel = |shift: u32| -> u32 {
            let a = ((self.0 >> shift) & 0xFF) as i32;
            let b = ((other.0 >> shift) & 0xFF) as i32;
            let v = a + (((b - a) * weight) >> 8);
            (v.clamp(0, 255) as u32) << shift
        };
        Self(channel(24) | channel(16) | channel(8) | channel(0))
    }

    /// Scale the RGB channels by `factor` (clamped to `[0, 1]`), keeping alpha.
    #[must_use]
    pub fn scale_brightness(self, factor: f64) -> Self {
        let factor = if factor.is_nan() {
            0.0
        } else {
            factor.clamp(0.0, 1.0)
        };
        Self::argb(
            self.a(),
            (self.r() as f64 * factor) as u8,
            (self.g() as f64 * factor) as u8,
            (self.b() as f64 * factor) as u8,
        )
    }

    /// Build an opaque color from hue (degrees), saturation and value in `[0, 1]`.
    #[must_use]
    pub fn from_hsv(h: f64, s: f64, v: f64) -> Self {
        let h = if h.is_finite() { h.rem_euclid(360.0) } else { 0.0 };
        let s = s.clamp(0.0, 1.0);
        let v = v.clamp(0.0, 1.0);
        let c = v * s;
        let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
        let m = v - c;

        let (r, g, b) = match (h / 60.0) as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };

        Self::rgb(
            ((r + m) * 255.0).round() as u8,
            ((g + m) * 255.0).round() as u8,
            ((b + m) * 255.0).round() as u8,
        )
    }

    /// Hue (degrees), saturation and value of this color; alpha is ignored.
    #[must_use]
    pub fn to_hsv(self) -> (f64, f64, f64) {
        let r = self.r() as f64 / 255.0;
        let g = self.g() as f64 / 255.0;
        let b = self.b() as f64 / 255.0;
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let delta = max - min;

        let hue = if delta == 0.0 {
            0.0
        } else if max == r {
            60.0 * ((g - b) / delta).rem_euclid(6.0)
        } else if max == g {
            60.0 * ((b - r) / delta + 2.0)
        } else {
            60.0 * ((r - g) / delta + 4.0)
        };
        let saturation = if max == 0.0 { 0.0 } else { delta / max };
        (hue, saturation, max)
    }

    /// Parse a hex color: 3, 6, or 8 digits with an optional `#` or `0x` prefix.
    ///
    /// Three- and six-digit forms are opaque; eight digits are `AARRGGBB`.
    #[must_use]
    pub fn parse_hex(s: &str) -> Option<Self> {
        let s = s.trim();
        let hex = s
            .strip_prefix('#')
            .or_else(|| s.strip_prefix("0x"))
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);

        if hex.is_empty() || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }

        match hex.len() {
            3 => {
                let mut digits = hex.chars().filter_map(|c| c.to_digit(16));
                let r = digits.next()? as u8;
                let g = digits.next()? as u8;
                let b = digits.next()? as u8;
                Some(Self::rgb(r * 17, g * 17, b * 17))
            }
            6 => {
                let value = u32::from_str_radix(hex, 16).ok()?;
                Some(Self(0xFF00_0000 | value))
            }
            8 => u32::from_str_radix(hex, 16).ok().map(Self),
            _ => None,
        }
    }

    /// Look up one of the sixteen legacy named colors.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.trim().to_ascii_lowercase();
        let rgb = match lower.as_str() {
            "black" => 0x000000,
            "dark_blue" => 0x0000AA,
            "dark_green" => 0x00AA00,
            "dark_aqua" => 0x00AAAA,
            "dark_red" => 0xAA0000,
            "dark_purple" => 0xAA00AA,
            "gold" => 0xFFAA00,
            "gray" | "grey" => 0xAAAAAA,
            "dark_gray" | "dark_grey" => 0x555555,
            "blue" => 0x5555FF,
            "green" => 0x55FF55,
            "aqua" => 0x55FFFF,
            "red" => 0xFF5555,
            "light_purple" => 0xFF55FF,
            "yellow" => 0xFFFF55,
            "white" => 0xFFFFFF,
            _ => return None,
        };
        Some(Self(0xFF00_0000 | rgb))
    }

    /// Map a legacy formatting code (`0`-`9`, `a`-`f`) to its color.
    #[must_use]
    pub fn from_legacy_code(code: char) -> Option<Self> {
        let name = match code.to_ascii_lowercase() {
            '0' => "black",
            '1' => "dark_blue",
            '2' => "dark_green",
            '3' => "dark_aqua",
            '4' => "dark_red",
            '5' => "dark_purple",
            '6' => "gold",
            '7' => "gray",
            '8' => "dark_gray",
            '9' => "blue",
            'a' => "green",
            'b' => "aqua",
            'c' => "red",
            'd' => "light_purple",
            'e' => "yellow",
            'f' => "white",
            _ => return None,
        };
        Self::from_name(name)
    }

    /// Parse a hex color or a legacy name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::from_name(s).or_else(|| Self::parse_hex(s))
    }

    /// Parse a color, falling back to `default` when it cannot be read.
    #[must_use]
    pub fn parse_or(s: &str, default: Self) -> Self {
        Self::parse(s).unwrap_or(default)
    }

    /// Format as `#AARRGGBB`.
    #[must_use]
    pub fn to_hex(self) -> String {
        format!("#{:08X}", self.0)
    }
}

impl fmt::Debug for Argb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Argb({})", self.to_hex())
    }
}

impl From<u32> for Argb {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl From<Argb> for u32 {
    fn from(color: Argb) -> Self {
        color.0
    }
}
