//! Built-in tags.

use fxmark_style::Argb;
use smallvec::SmallVec;
use tracing::{debug, warn};

use super::descriptor::{Alphabet, ObfuscateMode, RevealDirection, ShakeKind};
use super::{EffectRegistry, ParamSpec};
use crate::attributed::Attribute;
use crate::params::{ParamValue, Params};

/// Typewriter characters per tick.
pub const TYPEWRITER_SPEED: ParamSpec = ParamSpec::new("speed", 1.0, 0.01, 100.0);
/// Typewriter start delay in ticks.
pub const TYPEWRITER_DELAY: ParamSpec = ParamSpec::new("delay", 0.0, 0.0, 10_000.0);
/// Obfuscation step in milliseconds.
pub const OBFUSCATE_SPEED: ParamSpec = ParamSpec::new("speed", 100.0, 1.0, 60_000.0);
/// Shake peak offset in pixels.
pub const SHAKE_AMPLITUDE: ParamSpec =
    ParamSpec::new("amplitude", 1.0, 0.0, 64.0).with_aliases(&["a", "amp"]);
/// Shake time multiplier.
pub const SHAKE_SPEED: ParamSpec = ParamSpec::new("speed", 1.0, 0.0, 100.0).with_aliases(&["s"]);
/// Shake phase units per cycle.
pub const SHAKE_WAVELENGTH: ParamSpec =
    ParamSpec::new("wavelength", 1.0, 0.01, 1000.0).with_aliases(&["w"]);
/// Gradient positions advanced per tick.
pub const GRADIENT_FLOW: ParamSpec = ParamSpec::new("flow", 0.0, -100.0, 100.0);
/// Gradient characters per stop.
pub const GRADIENT_SPREAD: ParamSpec = ParamSpec::new("spread", 1.0, 0.01, 1000.0);
/// Most color stops a gradient keeps.
pub const MAX_GRADIENT_STOPS: usize = 256;
/// Rainbow hue cycles per 100 ticks.
pub const RAINBOW_SPEED: ParamSpec = ParamSpec::new("speed", 1.0, -100.0, 100.0);
/// Rainbow saturation.
pub const RAINBOW_SATURATION: ParamSpec = ParamSpec::new("saturation", 1.0, 0.0, 1.0);
/// Rainbow brightness.
pub const RAINBOW_BRIGHTNESS: ParamSpec = ParamSpec::new("brightness", 1.0, 0.0, 1.0);
/// Rainbow characters per hue cycle.
pub const RAINBOW_SPREAD: ParamSpec = ParamSpec::new("spread", 16.0, 0.01, 1000.0);

pub(super) fn register_all(registry: &mut EffectRegistry) {
    for (name, aliases) in [
        ("bold", &["b"][..]),
        ("italic", &["i"][..]),
        ("underline", &["u"][..]),
        ("strikethrough", &["strike", "s"][..]),
    ] {
        registry.register(name, move |_: &Params, _: &[Attribute]| {
            vec![Attribute::new(name, Params::new())]
        });
        for alias in aliases {
            registry.alias(alias, name);
        }
    }

    registry.register("color", resolve_color);
    registry.alias("c", "color");
    registry.register("font", resolve_font);

    registry.register("typewriter", resolve_typewriter);
    registry.alias("type", "typewriter");
    registry.alias("tw", "typewriter");

    registry.register("obfuscate", resolve_obfuscate);
    registry.alias("obf", "obfuscate");
    registry.alias("scramble", "obfuscate");

    registry.register("shake", |p: &Params, _: &[Attribute]| resolve_shake(p, None));
    registry.register("wave", |p: &Params, _: &[Attribute]| {
        resolve_shake(p, Some(ShakeKind::Wave))
    });
    registry.register("circle", |p: &Params, _: &[Attribute]| {
        resolve_shake(p, Some(ShakeKind::Circle))
    });
    registry.register("jitter", |p: &Params, _: &[Attribute]| {
        resolve_shake(p, Some(ShakeKind::Random))
    });

    registry.register("gradient", resolve_gradient);
    registry.alias("grad", "gradient");
    registry.register("rainbow", resolve_rainbow);

    for container in ["span", "group"] {
        registry.register(container, |_: &Params, _: &[Attribute]| Vec::new());
    }
}

/// Token written for a stop that could not be read. It never parses as a
/// color, so it survives normalization as an unreadable stop.
const UNREADABLE_STOP: &str = "default";

/// Parse a comma or whitespace separated list of colors. Unreadable
/// entries keep their place as `None`.
pub(crate) fn parse_stops(list: &str) -> SmallVec<[Option<Argb>; 4]> {
    list.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(Argb::parse)
        .collect()
}

fn stops_to_text(stops: &[Option<Argb>]) -> String {
    stops
        .iter()
        .map(|stop| stop.map_or_else(|| UNREADABLE_STOP.to_string(), Argb::to_hex))
        .collect::<Vec<_>>()
        .join(",")
}

/// Enum-valued parameter: unreadable names warn and fall back to the default.
fn read_enum<T: Default + Copy>(
    effect: &str,
    params: &Params,
    key: &'static str,
    parse: fn(&str) -> Option<T>,
) -> T {
    let Some(raw) = params.text(key) else {
        return T::default();
    };
    parse(raw).unwrap_or_else(|| {
        warn!(effect, param = key, value = raw, "unknown option, using default");
        T::default()
    })
}

fn resolve_color(params: &Params, _: &[Attribute]) -> Vec<Attribute> {
    let raw = params.text("value").or_else(|| params.text("color"));
    let Some(color) = raw.and_then(Argb::parse) else {
        debug!(value = raw.unwrap_or(""), "unreadable color, using base color");
        return vec![Attribute::new("color", Params::new())];
    };
    vec![Attribute::new(
        "color",
        Params::new().with("value", color.to_hex()),
    )]
}

fn resolve_font(params: &Params, _: &[Attribute]) -> Vec<Attribute> {
    match params.text("value").or_else(|| params.text("id")) {
        Some(font) if !font.is_empty() => {
            vec![Attribute::new("font", Params::new().with("value", font))]
        }
        _ => Vec::new(),
    }
}

fn resolve_typewriter(params: &Params, enclosing: &[Attribute]) -> Vec<Attribute> {
    let parent = enclosing.iter().rev().find(|a| a.id == "typewriter");
    let inherited = |spec: ParamSpec| -> f64 {
        if spec.is_present(params) {
            spec.read("typewriter", params)
        } else {
            parent
                .and_then(|p| p.params.number(spec.name))
                .unwrap_or(spec.default)
        }
    };

    let out = Params::new()
        .with("speed", inherited(TYPEWRITER_SPEED))
        .with("delay", inherited(TYPEWRITER_DELAY))
        .with("center", params.flag("center").unwrap_or(false));
    vec![Attribute::new("typewriter", out)]
}

fn resolve_obfuscate(params: &Params, _: &[Attribute]) -> Vec<Attribute> {
    const EFFECT: &str = "obfuscate";
    let mode = read_enum(EFFECT, params, "mode", ObfuscateMode::from_name);
    let direction = read_enum(EFFECT, params, "direction", RevealDirection::from_name);
    let alphabet = read_enum(EFFECT, params, "alphabet", Alphabet::from_name);

    let mut out = Params::new()
        .with("mode", mode.as_str())
        .with("speed", OBFUSCATE_SPEED.read(EFFECT, params))
        .with("direction", direction.as_str())
        .with("alphabet", alphabet.as_str());
    if let Some(seed) = params.number("seed") {
        out.insert("seed", ParamValue::Number(seed.abs().trunc()));
    }
    vec![Attribute::new(EFFECT, out)]
}

fn resolve_shake(params: &Params, preset: Option<ShakeKind>) -> Vec<Attribute> {
    const EFFECT: &str = "shake";
    let kind = preset.unwrap_or_else(|| read_enum(EFFECT, params, "type", ShakeKind::from_name));
    let out = Params::new()
        .with("type", kind.as_str())
        .with("amplitude", SHAKE_AMPLITUDE.read(EFFECT, params))
        .with("speed", SHAKE_SPEED.read(EFFECT, params))
        .with("wavelength", SHAKE_WAVELENGTH.read(EFFECT, params));
    vec![Attribute::new(EFFECT, out)]
}

fn resolve_gradient(params: &Params, _: &[Attribute]) -> Vec<Attribute> {
    const EFFECT: &str = "gradient";
    let mut stops = match params.text("colors").or_else(|| params.text("value")) {
        Some(list) => parse_stops(list),
        None => [params.text("from"), params.text("to")]
            .into_iter()
            .flatten()
            .map(Argb::parse)
            .collect(),
    };
    if stops.len() > MAX_GRADIENT_STOPS {
        warn!(
            effect = EFFECT,
            param = "colors",
            value = stops.len(),
            bound = MAX_GRADIENT_STOPS,
            "too many color stops, truncated"
        );
        stops.truncate(MAX_GRADIENT_STOPS);
    }
    if stops.is_empty() {
        stops.push(None);
    }
    if stops.contains(&None) {
        debug!(effect = EFFECT, "unreadable color stops, using base color");
    }

    let mut out = Params::new()
        .with("colors", stops_to_text(&stops))
        .with("flow", GRADIENT_FLOW.read(EFFECT, params))
        .with("repeating", params.flag("repeating").unwrap_or(false));
    if let Some(spread) = GRADIENT_SPREAD.read_optional(EFFECT, params) {
        out.insert("spread", ParamValue::Number(spread));
    }
    vec![Attribute::new(EFFECT, out)]
}

fn resolve_rainbow(params: &Params, _: &[Attribute]) -> Vec<Attribute> {
    const EFFECT: &str = "rainbow";
    let out = Params::new()
        .with("speed", RAINBOW_SPEED.read(EFFECT, params))
        .with("saturation", RAINBOW_SATURATION.read(EFFECT, params))
        .with("brightness", RAINBOW_BRIGHTNESS.read(EFFECT, params))
        .with("spread", RAINBOW_SPREAD.read(EFFECT, params));
    vec![Attribute::new(EFFECT, out)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::{EffectDescriptor, GradientSpec, ShakeSpec, StyleToggle};
    use tracing_test::traced_test;

    fn resolve(tag: &str, raw: &[(&str, &str)]) -> Vec<Attribute> {
        resolve_in(tag, raw, &[])
    }

    fn resolve_in(tag: &str, raw: &[(&str, &str)], enclosing: &[Attribute]) -> Vec<Attribute> {
        EffectRegistry::builtin()
            .resolve(tag, &Params::from_raw(raw.iter().copied()), enclosing)
            .unwrap_or_default()
    }

    fn shake(attrs: &[Attribute]) -> ShakeSpec {
        match EffectDescriptor::from_attribute(&attrs[0]) {
            Some(EffectDescriptor::Shake(spec)) => spec,
            other => panic!("expected shake, got {other:?}"),
        }
    }

    fn gradient(attrs: &[Attribute]) -> GradientSpec {
        match EffectDescriptor::from_attribute(&attrs[0]) {
            Some(EffectDescriptor::Gradient(spec)) => spec,
            other => panic!("expected gradient, got {other:?}"),
        }
    }

    // =========================================================================
    // Style tags
    // =========================================================================

    #[test]
    fn aliases_resolve_to_canonical_ids() {
        for (tag, id) in [
            ("b", "bold"),
            ("i", "italic"),
            ("u", "underline"),
            ("strike", "strikethrough"),
            ("s", "strikethrough"),
        ] {
            let attrs = resolve(tag, &[]);
            assert_eq!(attrs[0].id, id, "{tag}");
        }
    }

    #[test]
    fn color_normalizes_to_hex() {
        let attrs = resolve("color", &[("value", "#f00")]);
        assert_eq!(attrs[0].params.text("value"), Some("#FFFF0000"));
        let named = resolve("c", &[("value", "gold")]);
        assert_eq!(named[0].params.text("value"), Some("#FFFFAA00"));
    }

    #[test]
    fn bad_color_is_left_unresolved() {
        let attrs = resolve("color", &[("value", "bright-ish")]);
        assert_eq!(attrs[0].id, "color");
        assert_eq!(attrs[0].params.text("value"), None);
        assert_eq!(
            EffectDescriptor::from_attribute(&attrs[0]),
            Some(EffectDescriptor::Style(StyleToggle::Color(None)))
        );
    }

    #[test]
    fn font_without_value_contributes_nothing() {
        assert!(resolve("font", &[]).is_empty());
        assert_eq!(resolve("font", &[("value", "mono")])[0].params.text("value"), Some("mono"));
    }

    // =========================================================================
    // Typewriter
    // =========================================================================

    #[test]
    fn typewriter_bare_center_flag() {
        let attrs = resolve("typewriter", &[("center", "true")]);
        assert_eq!(attrs[0].params.flag("center"), Some(true));
        assert_eq!(attrs[0].params.number("speed"), Some(1.0));
    }

    #[test]
    fn nested_typewriter_inherits_speed_and_delay() {
        let outer = resolve("typewriter", &[("speed", "3"), ("delay", "5")]);
        let inner = resolve_in("tw", &[("delay", "1")], &outer);
        assert_eq!(inner[0].params.number("speed"), Some(3.0));
        assert_eq!(inner[0].params.number("delay"), Some(1.0));
    }

    #[test]
    #[traced_test]
    fn typewriter_speed_clamped_with_warning() {
        let attrs = resolve("typewriter", &[("speed", "0")]);
        assert_eq!(attrs[0].params.number("speed"), Some(0.01));
        assert!(logs_contain("effect=\"typewriter\""));
        assert!(logs_contain("param=\"speed\""));
    }

    // =========================================================================
    // Obfuscate
    // =========================================================================

    #[test]
    fn obfuscate_defaults() {
        let attrs = resolve("scramble", &[]);
        let p = &attrs[0].params;
        assert_eq!(attrs[0].id, "obfuscate");
        assert_eq!(p.text("mode"), Some("constant"));
        assert_eq!(p.text("direction"), Some("left"));
        assert_eq!(p.text("alphabet"), Some("glyphset"));
        assert_eq!(p.number("speed"), Some(100.0));
        assert!(!p.contains("seed"));
    }

    #[test]
    #[traced_test]
    fn obfuscate_unknown_mode_warns() {
        let attrs = resolve("obfuscate", &[("mode", "explode")]);
        assert_eq!(attrs[0].params.text("mode"), Some("constant"));
        assert!(logs_contain("unknown option"));
    }

    // =========================================================================
    // Shake presets
    // =========================================================================

    #[test]
    fn shake_short_keys() {
        let spec = shake(&resolve("shake", &[("a", "2"), ("type", "wave")]));
        assert_eq!(spec.amplitude, 2.0);
        assert_eq!(spec.kind, ShakeKind::Wave);
    }

    #[test]
    fn presets_force_kind() {
        assert_eq!(shake(&resolve("wave", &[("type", "circle")])).kind, ShakeKind::Wave);
        assert_eq!(shake(&resolve("circle", &[])).kind, ShakeKind::Circle);
        assert_eq!(shake(&resolve("jitter", &[])).kind, ShakeKind::Random);
    }

    #[test]
    fn shake_amplitude_clamped() {
        let spec = shake(&resolve("shake", &[("amplitude", "-4")]));
        assert_eq!(spec.amplitude, 0.0);
    }

    // =========================================================================
    // Gradient and rainbow
    // =========================================================================

    #[test]
    fn gradient_stop_sources() {
        let list = gradient(&resolve("gradient", &[("colors", "#000, #fff red")]));
        assert_eq!(list.stops.len(), 3);
        let shorthand = gradient(&resolve("grad", &[("value", "black,white")]));
        assert_eq!(shorthand.stops.as_slice(), &[Some(Argb::BLACK), Some(Argb::WHITE)]);
        let pair = gradient(&resolve("gradient", &[("from", "#000"), ("to", "#fff")]));
        assert_eq!(pair.stops.as_slice(), &[Some(Argb::BLACK), Some(Argb::WHITE)]);
    }

    #[test]
    fn unreadable_stops_keep_their_place() {
        let spec = gradient(&resolve("gradient", &[("colors", "#000 mauve-ish #fff")]));
        assert_eq!(spec.stops.as_slice(), &[Some(Argb::BLACK), None, Some(Argb::WHITE)]);
        let gray = Argb::rgb(0x80, 0x80, 0x80);
        assert_eq!(spec.resolved_stops(gray)[1], gray);

        let empty = gradient(&resolve("gradient", &[("colors", "nope")]));
        assert_eq!(empty.stops.as_slice(), &[None]);
    }

    #[test]
    #[traced_test]
    fn gradient_stop_count_bounded() {
        let many = vec!["#fff"; MAX_GRADIENT_STOPS + 10].join(",");
        let spec = gradient(&resolve("gradient", &[("colors", many.as_str())]));
        assert_eq!(spec.stops.len(), MAX_GRADIENT_STOPS);
        assert!(logs_contain("too many color stops"));
    }

    #[test]
    fn gradient_spread_only_when_written() {
        assert_eq!(gradient(&resolve("gradient", &[])).spread, None);
        let spread = gradient(&resolve("gradient", &[("spread", "0")])).spread;
        assert_eq!(spread, Some(0.01));
    }

    #[test]
    fn rainbow_saturation_clamped() {
        let attrs = resolve("rainbow", &[("saturation", "3")]);
        assert_eq!(attrs[0].params.number("saturation"), Some(1.0));
        assert_eq!(attrs[0].params.number("spread"), Some(16.0));
    }
}
