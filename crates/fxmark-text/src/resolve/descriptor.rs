//! Compiled, typed effect descriptions.
//!
//! [`EffectDescriptor::from_attribute`] reads an attribute the resolver
//! already normalized, so it never logs: anything still out of range is
//! clamped quietly and anything unreadable takes its default.

use std::sync::Arc;

use fxmark_style::{Argb, Style};
use smallvec::SmallVec;

use super::builtin::{
    GRADIENT_FLOW, GRADIENT_SPREAD, MAX_GRADIENT_STOPS, OBFUSCATE_SPEED, RAINBOW_BRIGHTNESS,
    RAINBOW_SATURATION, RAINBOW_SPEED, RAINBOW_SPREAD, SHAKE_AMPLITUDE, SHAKE_SPEED,
    SHAKE_WAVELENGTH, TYPEWRITER_DELAY, TYPEWRITER_SPEED, parse_stops,
};
use crate::attributed::Attribute;
use crate::params::Params;

macro_rules! named_enum {
    ($(#[$meta:meta])* $name:ident { $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Parse a case-insensitive name.
            #[must_use]
            pub fn from_name(name: &str) -> Option<Self> {
                let name = name.trim();
                $(if name.eq_ignore_ascii_case($text) {
                    return Some(Self::$variant);
                })+
                None
            }

            /// Canonical lowercase name.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }
    };
}

named_enum! {
    /// When obfuscated characters are shown scrambled.
    ObfuscateMode {
        /// Always scrambled.
        #[default]
        Constant => "constant",
        /// Scrambled until revealed in order.
        Reveal => "reveal",
        /// Clear until hidden in order.
        Hide => "hide",
        /// A drifting random subset is scrambled.
        Random => "random",
    }
}

named_enum! {
    /// Order in which characters reveal or hide.
    RevealDirection {
        /// First to last.
        #[default]
        Left => "left",
        /// Last to first.
        Right => "right",
        /// Outward from the middle, starting left of center.
        Center => "center",
        /// Inward from both ends.
        Edges => "edges",
        /// Seeded shuffle.
        Random => "random",
    }
}

named_enum! {
    /// Source of replacement glyphs for obfuscated characters.
    Alphabet {
        /// Any printable filler glyph.
        #[default]
        Glyphset => "glyphset",
        /// ASCII letters and digits.
        Readable => "readable",
    }
}

named_enum! {
    /// Shape of per-character motion.
    ShakeKind {
        /// Vertical sine wave.
        Wave => "wave",
        /// Circular orbit.
        Circle => "circle",
        /// Seeded jitter.
        #[default]
        Random => "random",
    }
}

/// Typewriter reveal parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TypewriterSpec {
    /// Characters revealed per tick.
    pub speed: f64,
    /// Ticks before the first character appears.
    pub delay: f64,
    /// Keep the visible part centered on the full width.
    pub center: bool,
}

/// Obfuscation parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObfuscateSpec {
    /// Mode.
    pub mode: ObfuscateMode,
    /// Milliseconds per reveal step.
    pub speed_ms: f64,
    /// Reveal order.
    pub direction: RevealDirection,
    /// Replacement glyph source.
    pub alphabet: Alphabet,
    /// Fixed seed for random order; otherwise derived from the track.
    pub seed: Option<u64>,
}

/// Shake parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShakeSpec {
    /// Motion shape.
    pub kind: ShakeKind,
    /// Peak offset in pixels.
    pub amplitude: f64,
    /// Time multiplier.
    pub speed: f64,
    /// Phase units per cycle.
    pub wavelength: f64,
}

impl Default for ShakeSpec {
    fn default() -> Self {
        Self {
            kind: ShakeKind::default(),
            amplitude: SHAKE_AMPLITUDE.default,
            speed: SHAKE_SPEED.default,
            wavelength: SHAKE_WAVELENGTH.default,
        }
    }
}

/// Gradient parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientSpec {
    /// Color stops; never empty after compilation. `None` marks a stop
    /// that could not be read and is drawn in the caller's base color.
    pub stops: SmallVec<[Option<Argb>; 4]>,
    /// Positions advanced per tick.
    pub flow: f64,
    /// Characters per stop; `None` stretches the stops across the element.
    pub spread: Option<f64>,
    /// Wrap around instead of clamping at the last stop.
    pub repeating: bool,
}

impl GradientSpec {
    /// Stops with unreadable entries replaced by `fallback`.
    #[must_use]
    pub fn resolved_stops(&self, fallback: Argb) -> SmallVec<[Argb; 4]> {
        self.stops.iter().map(|stop| stop.unwrap_or(fallback)).collect()
    }
}

/// Rainbow parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RainbowSpec {
    /// Hue cycles advanced per 100 ticks.
    pub speed: f64,
    /// HSV saturation.
    pub saturation: f64,
    /// HSV value.
    pub brightness: f64,
    /// Characters per full hue cycle.
    pub spread: f64,
}

/// Static style contributed by a tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleToggle {
    /// Bold.
    Bold,
    /// Italic.
    Italic,
    /// Underline.
    Underline,
    /// Strikethrough.
    Strikethrough,
    /// Foreground color; `None` when unreadable, meaning the caller's
    /// base color.
    Color(Option<Argb>),
    /// Font id.
    Font(Arc<str>),
}

/// A compiled attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum EffectDescriptor {
    /// Progressive reveal.
    Typewriter(TypewriterSpec),
    /// Glyph scrambling.
    Obfuscate(ObfuscateSpec),
    /// Per-character motion.
    Shake(ShakeSpec),
    /// Color stops along the text.
    Gradient(GradientSpec),
    /// Hue cycling.
    Rainbow(RainbowSpec),
    /// Static style.
    Style(StyleToggle),
}

impl EffectDescriptor {
    /// Compile an attribute; `None` for ids with no built-in meaning.
    #[must_use]
    pub fn from_attribute(attribute: &Attribute) -> Option<Self> {
        let p = &attribute.params;
        let descriptor = match attribute.id.as_str() {
            "bold" => Self::Style(StyleToggle::Bold),
            "italic" => Self::Style(StyleToggle::Italic),
            "underline" => Self::Style(StyleToggle::Underline),
            "strikethrough" => Self::Style(StyleToggle::Strikethrough),
            "color" => Self::Style(StyleToggle::Color(p.text("value").and_then(Argb::parse))),
            "font" => Self::Style(StyleToggle::Font(Arc::from(p.text("value")?))),
            "typewriter" => Self::Typewriter(TypewriterSpec {
                speed: quiet(TYPEWRITER_SPEED.lookup(p), TYPEWRITER_SPEED),
                delay: quiet(TYPEWRITER_DELAY.lookup(p), TYPEWRITER_DELAY),
                center: p.flag("center").unwrap_or(false),
            }),
            "obfuscate" => Self::Obfuscate(ObfuscateSpec {
                mode: enum_param(p, "mode", ObfuscateMode::from_name),
                speed_ms: quiet(OBFUSCATE_SPEED.lookup(p), OBFUSCATE_SPEED),
                direction: enum_param(p, "direction", RevealDirection::from_name),
                alphabet: enum_param(p, "alphabet", Alphabet::from_name),
                seed: p.number("seed").map(|s| s.abs() as u64),
            }),
            "shake" => Self::Shake(ShakeSpec {
                kind: enum_param(p, "type", ShakeKind::from_name),
                amplitude: quiet(SHAKE_AMPLITUDE.lookup(p), SHAKE_AMPLITUDE),
                speed: quiet(SHAKE_SPEED.lookup(p), SHAKE_SPEED),
                wavelength: quiet(SHAKE_WAVELENGTH.lookup(p), SHAKE_WAVELENGTH),
            }),
            "gradient" => {
                let mut stops = p.text("colors").map(parse_stops).unwrap_or_default();
                stops.truncate(MAX_GRADIENT_STOPS);
                if stops.is_empty() {
                    stops.push(None);
                }
                Self::Gradient(GradientSpec {
                    stops,
                    flow: quiet(GRADIENT_FLOW.lookup(p), GRADIENT_FLOW),
                    spread: GRADIENT_SPREAD.lookup(p).map(|s| GRADIENT_SPREAD.clamp(s)),
                    repeating: p.flag("repeating").unwrap_or(false),
                })
            }
            "rainbow" => Self::Rainbow(RainbowSpec {
                speed: quiet(RAINBOW_SPEED.lookup(p), RAINBOW_SPEED),
                saturation: quiet(RAINBOW_SATURATION.lookup(p), RAINBOW_SATURATION),
                brightness: quiet(RAINBOW_BRIGHTNESS.lookup(p), RAINBOW_BRIGHTNESS),
                spread: quiet(RAINBOW_SPREAD.lookup(p), RAINBOW_SPREAD),
            }),
            _ => return None,
        };
        Some(descriptor)
    }

    /// Whether the descriptor changes over time.
    #[must_use]
    pub fn is_animated(&self) -> bool {
        match self {
            Self::Typewriter(_) | Self::Obfuscate(_) | Self::Shake(_) | Self::Rainbow(_) => true,
            Self::Gradient(spec) => spec.flow != 0.0,
            Self::Style(_) => false,
        }
    }

    /// Short family name, used in logs.
    #[must_use]
    pub const fn family(&self) -> &'static str {
        match self {
            Self::Typewriter(_) => "typewriter",
            Self::Obfuscate(_) => "obfuscate",
            Self::Shake(_) => "shake",
            Self::Gradient(_) => "gradient",
            Self::Rainbow(_) => "rainbow",
            Self::Style(_) => "style",
        }
    }
}

fn quiet(value: Option<f64>, spec: super::ParamSpec) -> f64 {
    value.map_or(spec.default, |v| spec.clamp(v))
}

fn enum_param<T: Default>(params: &Params, key: &str, parse: fn(&str) -> Option<T>) -> T {
    params.text(key).and_then(parse).unwrap_or_default()
}

/// Fold the static style toggles of a chain, outermost first.
#[must_use]
pub fn style_of(attributes: &[Attribute]) -> Style {
    attributes
        .iter()
        .filter_map(EffectDescriptor::from_attribute)
        .fold(Style::new(), |style, descriptor| match descriptor {
            EffectDescriptor::Style(StyleToggle::Bold) => style.bold(),
            EffectDescriptor::Style(StyleToggle::Italic) => style.italic(),
            EffectDescriptor::Style(StyleToggle::Underline) => style.underline(),
            EffectDescriptor::Style(StyleToggle::Strikethrough) => style.strikethrough(),
            EffectDescriptor::Style(StyleToggle::Color(color)) => Style { color, ..style },
            EffectDescriptor::Style(StyleToggle::Font(font)) => style.font(font),
            _ => style,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fxmark_style::StyleFlags;

    fn attr(id: &str, params: Params) -> Attribute {
        Attribute::new(id, params)
    }

    #[test]
    fn enum_names_round_trip() {
        for mode in ObfuscateMode::ALL {
            assert_eq!(ObfuscateMode::from_name(mode.as_str()), Some(*mode));
        }
        assert_eq!(RevealDirection::from_name("EDGES"), Some(RevealDirection::Edges));
        assert_eq!(ShakeKind::from_name("spin"), None);
    }

    #[test]
    fn typewriter_defaults() {
        let Some(EffectDescriptor::Typewriter(spec)) =
            EffectDescriptor::from_attribute(&attr("typewriter", Params::new()))
        else {
            panic!("expected typewriter");
        };
        assert_eq!(spec.speed, 1.0);
        assert_eq!(spec.delay, 0.0);
        assert!(!spec.center);
    }

    #[test]
    fn unnormalized_values_clamp_quietly() {
        let params = Params::new().with("amplitude", 1e9).with("type", "circle");
        let Some(EffectDescriptor::Shake(spec)) =
            EffectDescriptor::from_attribute(&attr("shake", params))
        else {
            panic!("expected shake");
        };
        assert_eq!(spec.kind, ShakeKind::Circle);
        assert_eq!(spec.amplitude, SHAKE_AMPLITUDE.max);
    }

    #[test]
    fn gradient_never_empty() {
        let Some(EffectDescriptor::Gradient(spec)) =
            EffectDescriptor::from_attribute(&attr("gradient", Params::new()))
        else {
            panic!("expected gradient");
        };
        assert_eq!(spec.stops.as_slice(), &[None]);
        assert_eq!(spec.resolved_stops(Argb::BLACK).as_slice(), &[Argb::BLACK]);
        assert!(!EffectDescriptor::Gradient(spec).is_animated());
    }

    #[test]
    fn font_requires_value() {
        assert_eq!(EffectDescriptor::from_attribute(&attr("font", Params::new())), None);
    }

    #[test]
    fn unknown_ids_do_not_compile() {
        assert_eq!(EffectDescriptor::from_attribute(&attr("glow", Params::new())), None);
    }

    #[test]
    fn style_folds_outer_to_inner() {
        let chain = [
            attr("bold", Params::new()),
            attr("color", Params::new().with("value", "#ff0000")),
            attr("italic", Params::new()),
            attr("color", Params::new().with("value", "#00ff00")),
            attr("shake", Params::new()),
        ];
        let style = style_of(&chain);
        assert!(style.has(StyleFlags::BOLD | StyleFlags::ITALIC));
        assert_eq!(style.color, Some(Argb::rgb(0, 255, 0)));
    }

    #[test]
    fn unreadable_inner_color_resets_to_base() {
        let chain = [
            attr("color", Params::new().with("value", "#ff0000")),
            attr("color", Params::new()),
        ];
        assert_eq!(
            EffectDescriptor::from_attribute(&chain[1]),
            Some(EffectDescriptor::Style(StyleToggle::Color(None)))
        );
        assert_eq!(style_of(&chain).color, None);
    }
}
