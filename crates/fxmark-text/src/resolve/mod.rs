//! Tag name to [`Attribute`] resolution.
//!
//! The [`EffectRegistry`] maps case-insensitive tag names (and aliases) to
//! [`TagResolver`]s. Resolvers extract typed parameters, fill defaults, and
//! clamp numbers into their declared range. Clamping is never an error: it
//! logs a warning naming the effect, parameter, offending value and bound,
//! then writes the clamped value into the attribute so later stages never
//! see out-of-range input.

mod builtin;
mod descriptor;

pub use builtin::{
    GRADIENT_FLOW, GRADIENT_SPREAD, MAX_GRADIENT_STOPS, OBFUSCATE_SPEED, RAINBOW_BRIGHTNESS,
    RAINBOW_SATURATION, RAINBOW_SPEED, RAINBOW_SPREAD, SHAKE_AMPLITUDE, SHAKE_SPEED,
    SHAKE_WAVELENGTH, TYPEWRITER_DELAY, TYPEWRITER_SPEED,
};
pub use descriptor::{
    Alphabet, EffectDescriptor, GradientSpec, ObfuscateMode, ObfuscateSpec, RainbowSpec,
    RevealDirection, ShakeKind, ShakeSpec, StyleToggle, TypewriterSpec, style_of,
};

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::warn;

use crate::attributed::Attribute;
use crate::params::Params;

/// Declared numeric parameter: default and inclusive bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    /// Canonical key.
    pub name: &'static str,
    /// Short spellings accepted in markup.
    pub aliases: &'static [&'static str],
    /// Value used when the parameter is absent or unreadable.
    pub default: f64,
    /// Lower bound.
    pub min: f64,
    /// Upper bound.
    pub max: f64,
}

impl ParamSpec {
    /// Declare a parameter.
    #[must_use]
    pub const fn new(name: &'static str, default: f64, min: f64, max: f64) -> Self {
        Self {
            name,
            aliases: &[],
            default,
            min,
            max,
        }
    }

    /// Accept additional spellings.
    #[must_use]
    pub const fn with_aliases(mut self, aliases: &'static [&'static str]) -> Self {
        self.aliases = aliases;
        self
    }

    /// Raw number under the canonical key or any alias.
    #[must_use]
    pub fn lookup(&self, params: &Params) -> Option<f64> {
        params
            .number(self.name)
            .or_else(|| self.aliases.iter().find_map(|alias| params.number(alias)))
    }

    /// Whether the parameter was written at all.
    #[must_use]
    pub fn is_present(&self, params: &Params) -> bool {
        params.contains(self.name) || self.aliases.iter().any(|alias| params.contains(alias))
    }

    /// Clamp without logging.
    #[must_use]
    pub fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            self.default
        } else {
            value.clamp(self.min, self.max)
        }
    }

    /// Read, default, and clamp, warning when the written value was out of range.
    #[must_use]
    pub fn read(&self, effect: &str, params: &Params) -> f64 {
        let Some(value) = self.lookup(params) else {
            return self.default;
        };
        let clamped = self.clamp(value);
        if clamped != value {
            let bound = if value < self.min { self.min } else { self.max };
            warn!(
                effect,
                param = self.name,
                value,
                bound,
                "parameter out of range, clamped"
            );
        }
        clamped
    }

    /// Like [`read`](Self::read) but `None` when the parameter is absent.
    #[must_use]
    pub fn read_optional(&self, effect: &str, params: &Params) -> Option<f64> {
        self.lookup(params).map(|_| self.read(effect, params))
    }
}

/// Turns one tag's raw parameters into zero or more attributes.
pub trait TagResolver: Send + Sync {
    /// Resolve with the attributes of all enclosing elements, outermost first.
    fn resolve(&self, params: &Params, enclosing: &[Attribute]) -> Vec<Attribute>;
}

impl<F> TagResolver for F
where
    F: Fn(&Params, &[Attribute]) -> Vec<Attribute> + Send + Sync,
{
    fn resolve(&self, params: &Params, enclosing: &[Attribute]) -> Vec<Attribute> {
        self(params, enclosing)
    }
}

/// Case-insensitive tag registry with alias support.
#[derive(Clone, Default)]
pub struct EffectRegistry {
    resolvers: FxHashMap<String, Arc<dyn TagResolver>>,
    aliases: FxHashMap<String, String>,
}

impl fmt::Debug for EffectRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.resolvers.keys().collect();
        names.sort();
        f.debug_struct("EffectRegistry")
            .field("resolvers", &names)
            .field("aliases", &self.aliases.len())
            .finish()
    }
}

impl EffectRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every built-in tag.
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        builtin::register_all(&mut registry);
        registry
    }

    /// Register (or replace) a resolver under `name`.
    pub fn register(&mut self, name: &str, resolver: impl TagResolver + 'static) -> &mut Self {
        let name = name.to_ascii_lowercase();
        self.aliases.remove(&name);
        self.resolvers.insert(name, Arc::new(resolver));
        self
    }

    /// Make `alias` resolve like `target`. Returns false when `target` is unknown.
    pub fn alias(&mut self, alias: &str, target: &str) -> bool {
        let Some(target) = self.canonical(target).map(str::to_string) else {
            return false;
        };
        self.aliases.insert(alias.to_ascii_lowercase(), target);
        true
    }

    /// Canonical name for `tag`, following aliases.
    #[must_use]
    pub fn canonical(&self, tag: &str) -> Option<&str> {
        let lower = tag.to_ascii_lowercase();
        if let Some((name, _)) = self.resolvers.get_key_value(&lower) {
            return Some(name.as_str());
        }
        self.aliases.get(&lower).map(String::as_str)
    }

    /// Whether any resolver answers to `tag`.
    #[must_use]
    pub fn contains(&self, tag: &str) -> bool {
        self.canonical(tag).is_some()
    }

    /// Resolve a tag. `None` means no resolver is registered for it; an
    /// empty vector means a known container tag.
    #[must_use]
    pub fn resolve(&self, tag: &str, params: &Params, enclosing: &[Attribute]) -> Option<Vec<Attribute>> {
        let name = self.canonical(tag)?;
        let resolver = self.resolvers.get(name)?;
        Some(resolver.resolve(params, enclosing))
    }

    /// Registered canonical names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.resolvers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    const SPEED: ParamSpec = ParamSpec::new("speed", 1.0, 0.5, 4.0).with_aliases(&["s"]);

    #[test]
    fn spec_defaults_when_absent() {
        assert_eq!(SPEED.read("fx", &Params::new()), 1.0);
        assert_eq!(SPEED.read_optional("fx", &Params::new()), None);
    }

    #[test]
    fn spec_reads_alias() {
        let params = Params::from_raw([("s", "2")]);
        assert_eq!(SPEED.read("fx", &params), 2.0);
        assert!(SPEED.is_present(&params));
    }

    #[test]
    #[traced_test]
    fn spec_clamps_and_warns() {
        let params = Params::from_raw([("speed", "9")]);
        assert_eq!(SPEED.read("fx", &params), 4.0);
        assert!(logs_contain("parameter out of range"));
        assert!(logs_contain("param=\"speed\""));
        assert!(logs_contain("value=9"));
        assert!(logs_contain("bound=4"));
    }

    #[test]
    #[traced_test]
    fn in_range_values_do_not_warn() {
        let params = Params::from_raw([("speed", "2")]);
        let _ = SPEED.read("fx", &params);
        assert!(!logs_contain("parameter out of range"));
    }

    #[test]
    fn registry_is_case_insensitive() {
        let registry = EffectRegistry::builtin();
        assert_eq!(registry.canonical("BOLD"), Some("bold"));
        assert_eq!(registry.canonical("B"), Some("bold"));
        assert_eq!(registry.canonical("Scramble"), Some("obfuscate"));
        assert!(!registry.contains("nope"));
    }

    #[test]
    fn custom_resolver_and_alias() {
        let mut registry = EffectRegistry::new();
        registry.register("glow", |params: &Params, _: &[Attribute]| {
            vec![Attribute::new("glow", params.clone())]
        });
        assert!(registry.alias("shine", "glow"));
        assert!(!registry.alias("x", "missing"));

        let attrs = registry
            .resolve("SHINE", &Params::from_raw([("r", "3")]), &[])
            .unwrap_or_default();
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs[0].id, "glow");
    }

    #[test]
    fn unknown_tag_resolves_to_none() {
        assert!(EffectRegistry::builtin().resolve("mystery", &Params::new(), &[]).is_none());
    }

    #[test]
    fn containers_resolve_to_nothing() {
        let registry = EffectRegistry::builtin();
        assert_eq!(registry.resolve("span", &Params::new(), &[]), Some(Vec::new()));
        assert_eq!(registry.resolve("group", &Params::new(), &[]), Some(Vec::new()));
    }

    #[test]
    fn register_overrides_alias() {
        let mut registry = EffectRegistry::builtin();
        registry.register("b", |_: &Params, _: &[Attribute]| Vec::new());
        assert_eq!(registry.canonical("b"), Some("b"));
    }
}
