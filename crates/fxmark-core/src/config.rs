//! Effect-governing configuration.
//!
//! The core never loads configuration from disk; hosts build an
//! [`EffectConfig`] however they like and hand it to the pipeline. The
//! subset of fields that changes what a cached layout looks like is folded
//! into a [`ConfigFingerprint`], which the layout cache compares to decide
//! whether it must be wholly invalidated.

use std::hash::{Hash, Hasher};
use std::time::Duration;

use rustc_hash::FxHasher;

/// Default maximum tag nesting depth.
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 16;
/// Default maximum parsed input length, in characters.
pub const DEFAULT_MAX_PARSE_LENGTH: usize = 16_384;
/// Default cap on animated effects applied to a single glyph.
pub const DEFAULT_MAX_EFFECTS_PER_GLYPH: usize = 8;
/// Default cap on attributes considered from one span chain.
pub const DEFAULT_MAX_SPAN_DEPTH: usize = 32;
/// Default number of tracks kept per effect family.
pub const DEFAULT_TRACK_CAPACITY: usize = 512;
/// Default inactivity window after which a track is evicted.
pub const DEFAULT_TRACK_IDLE_TIMEOUT: Duration = Duration::from_secs(1);
/// Default idle window after which a live track restarts its animation.
pub const DEFAULT_RESET_DELAY: Duration = Duration::from_millis(1000);
/// Default layout cache capacity.
pub const DEFAULT_LAYOUT_CAPACITY: usize = 256;

/// How typewriter spans share their reveal budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TypewriterAllocation {
    /// Every typewriter span reveals on its own clock and speed.
    #[default]
    Independent,
    /// One budget of visible characters flows through all typewriter spans
    /// in document order.
    Container,
}

/// When a typewriter track considers its clock to have looped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RestartPolicy {
    /// Only idle-reset or an explicit reset restarts the reveal.
    Never,
    /// Restart when the number of characters under the track changes.
    #[default]
    OnTextChange,
    /// Restart when the caller-reported progress position decreases.
    OnRegression,
}

/// Timing constants for `random` obfuscation mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RandomObfuscation {
    /// Shortest time a character stays obfuscated.
    pub min_deadline_ms: u64,
    /// Longest time a character stays obfuscated.
    pub max_deadline_ms: u64,
    /// New characters are only added while fewer than this fraction are obfuscated.
    pub max_fraction: f64,
    /// Minimum interval between spawn attempts.
    pub poll_interval_ms: u64,
    /// Fewest characters added per spawn.
    pub min_burst: usize,
    /// Most characters added per spawn.
    pub max_burst: usize,
}

impl Default for RandomObfuscation {
    fn default() -> Self {
        Self {
            min_deadline_ms: 500,
            max_deadline_ms: 2000,
            max_fraction: 0.3,
            poll_interval_ms: 100,
            min_burst: 1,
            max_burst: 3,
        }
    }
}

/// Hash of the configuration values that govern cached layout output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConfigFingerprint(pub u64);

/// Read-only configuration consumed by parsing and evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectConfig {
    /// Global switch; when false text renders plain.
    pub enabled: bool,
    /// Deepest tag nesting the parser will honor.
    pub max_nesting_depth: usize,
    /// Longest input, in characters, the parser will read.
    pub max_parse_length: usize,
    /// Most animated effects evaluated for one glyph.
    pub max_effects_per_glyph: usize,
    /// Most attributes taken from a single span chain.
    pub max_span_depth: usize,
    /// Host screens on which effects are suppressed.
    pub excluded_screens: Vec<String>,
    /// Plugins (message sources) whose text is never animated.
    pub excluded_plugins: Vec<String>,
    /// Typewriter budget sharing mode.
    pub typewriter_allocation: TypewriterAllocation,
    /// Typewriter restart detection.
    pub typewriter_restart: RestartPolicy,
    /// Idle time after which a typewriter track starts over.
    pub typewriter_reset_delay: Duration,
    /// Idle time after which an obfuscate track starts over.
    pub obfuscate_reset_delay: Duration,
    /// Random obfuscation tuning.
    pub random_obfuscation: RandomObfuscation,
    /// Tracks kept per effect family.
    pub track_capacity: usize,
    /// Inactivity after which a track is evicted.
    pub track_idle_timeout: Duration,
    /// Layout cache capacity.
    pub layout_capacity: usize,
}

impl Default for EffectConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
            max_parse_length: DEFAULT_MAX_PARSE_LENGTH,
            max_effects_per_glyph: DEFAULT_MAX_EFFECTS_PER_GLYPH,
            max_span_depth: DEFAULT_MAX_SPAN_DEPTH,
            excluded_screens: Vec::new(),
            excluded_plugins: Vec::new(),
            typewriter_allocation: TypewriterAllocation::default(),
            typewriter_restart: RestartPolicy::default(),
            typewriter_reset_delay: DEFAULT_RESET_DELAY,
            obfuscate_reset_delay: DEFAULT_RESET_DELAY,
            random_obfuscation: RandomObfuscation::default(),
            track_capacity: DEFAULT_TRACK_CAPACITY,
            track_idle_timeout: DEFAULT_TRACK_IDLE_TIMEOUT,
            layout_capacity: DEFAULT_LAYOUT_CAPACITY,
        }
    }
}

impl EffectConfig {
    /// Create a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the global enable flag.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set the maximum tag nesting depth.
    #[must_use]
    pub fn with_max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }

    /// Set the maximum parsed input length.
    #[must_use]
    pub fn with_max_parse_length(mut self, length: usize) -> Self {
        self.max_parse_length = length;
        self
    }

    /// Set the per-glyph animated effect cap.
    #[must_use]
    pub fn with_max_effects_per_glyph(mut self, max: usize) -> Self {
        self.max_effects_per_glyph = max;
        self
    }

    /// Set the span chain depth cap.
    #[must_use]
    pub fn with_max_span_depth(mut self, max: usize) -> Self {
        self.max_span_depth = max;
        self
    }

    /// Suppress effects on the named host screen.
    #[must_use]
    pub fn exclude_screen(mut self, screen: impl Into<String>) -> Self {
        self.excluded_screens.push(screen.into());
        self
    }

    /// Never animate text originating from the named plugin.
    #[must_use]
    pub fn exclude_plugin(mut self, plugin: impl Into<String>) -> Self {
        self.excluded_plugins.push(plugin.into());
        self
    }

    /// Set how typewriter spans share their budget.
    #[must_use]
    pub fn with_typewriter_allocation(mut self, allocation: TypewriterAllocation) -> Self {
        self.typewriter_allocation = allocation;
        self
    }

    /// Set the typewriter restart policy.
    #[must_use]
    pub fn with_typewriter_restart(mut self, policy: RestartPolicy) -> Self {
        self.typewriter_restart = policy;
        self
    }

    /// Set random obfuscation timing.
    #[must_use]
    pub fn with_random_obfuscation(mut self, timing: RandomObfuscation) -> Self {
        self.random_obfuscation = timing;
        self
    }

    /// Set track cache capacity and idle eviction timeout.
    #[must_use]
    pub fn with_tracks(mut self, capacity: usize, idle_timeout: Duration) -> Self {
        self.track_capacity = capacity;
        self.track_idle_timeout = idle_timeout;
        self
    }

    /// Set the layout cache capacity.
    #[must_use]
    pub fn with_layout_capacity(mut self, capacity: usize) -> Self {
        self.layout_capacity = capacity;
        self
    }

    /// Whether effects are suppressed on `screen`.
    #[must_use]
    pub fn is_screen_excluded(&self, screen: &str) -> bool {
        self.excluded_screens.iter().any(|s| s == screen)
    }

    /// Whether text from `plugin` must stay plain.
    #[must_use]
    pub fn is_plugin_excluded(&self, plugin: &str) -> bool {
        self.excluded_plugins.iter().any(|p| p == plugin)
    }

    /// Fingerprint of the fields that change layout output.
    ///
    /// Covers the enable flag, per-glyph effect cap, span depth, nesting
    /// depth, and both exclusion lists. Timing and capacity fields are left
    /// out: they affect animation state, not the cached shape.
    #[must_use]
    pub fn fingerprint(&self) -> ConfigFingerprint {
        let mut hasher = FxHasher::default();
        self.enabled.hash(&mut hasher);
        self.max_effects_per_glyph.hash(&mut hasher);
        self.max_span_depth.hash(&mut hasher);
        self.max_nesting_depth.hash(&mut hasher);
        self.excluded_screens.hash(&mut hasher);
        self.excluded_plugins.hash(&mut hasher);
        ConfigFingerprint(hasher.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = EffectConfig::default();
        assert!(config.enabled);
        assert_eq!(config.max_nesting_depth, 16);
        assert_eq!(config.max_parse_length, 16_384);
        assert_eq!(config.track_capacity, 512);
        assert_eq!(config.track_idle_timeout, Duration::from_secs(1));
        assert_eq!(config.layout_capacity, 256);
        assert_eq!(config.typewriter_restart, RestartPolicy::OnTextChange);
    }

    #[test]
    fn random_obfuscation_defaults() {
        let timing = RandomObfuscation::default();
        assert_eq!(timing.min_deadline_ms, 500);
        assert_eq!(timing.max_deadline_ms, 2000);
        assert_eq!(timing.poll_interval_ms, 100);
        assert!((timing.max_fraction - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn fingerprint_is_stable() {
        let a = EffectConfig::default();
        let b = EffectConfig::default();
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn fingerprint_tracks_governing_fields() {
        let base = EffectConfig::default().fingerprint();
        assert_ne!(base, EffectConfig::default().with_enabled(false).fingerprint());
        assert_ne!(
            base,
            EffectConfig::default().with_max_effects_per_glyph(2).fingerprint()
        );
        assert_ne!(base, EffectConfig::default().with_max_span_depth(3).fingerprint());
        assert_ne!(
            base,
            EffectConfig::default().with_max_nesting_depth(4).fingerprint()
        );
        assert_ne!(base, EffectConfig::default().exclude_screen("chat").fingerprint());
        assert_ne!(base, EffectConfig::default().exclude_plugin("mail").fingerprint());
    }

    #[test]
    fn fingerprint_ignores_timing_and_capacity() {
        let base = EffectConfig::default().fingerprint();
        let tuned = EffectConfig::default()
            .with_layout_capacity(4)
            .with_tracks(8, Duration::from_secs(9))
            .with_typewriter_allocation(TypewriterAllocation::Container)
            .fingerprint();
        assert_eq!(base, tuned);
    }

    #[test]
    fn exclusion_lookup() {
        let config = EffectConfig::default()
            .exclude_screen("options")
            .exclude_plugin("legacy-chat");
        assert!(config.is_screen_excluded("options"));
        assert!(!config.is_screen_excluded("chat"));
        assert!(config.is_plugin_excluded("legacy-chat"));
        assert!(!config.is_plugin_excluded("chat"));
    }
}
