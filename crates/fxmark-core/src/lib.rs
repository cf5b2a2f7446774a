#![forbid(unsafe_code)]

//! Shared foundations for fxmark.
//!
//! This crate holds the pieces every other layer of the pipeline reads but
//! none of them owns:
//! - [`EffectConfig`] - the read-only configuration surface and its
//!   [`ConfigFingerprint`]
//! - [`Clock`] - injectable millisecond time source ([`SystemClock`],
//!   [`ManualClock`])
//! - [`SeededRng`] and [`mix64`] - deterministic randomness for effects
//!
//! # Example
//! ```
//! use fxmark_core::{Clock, EffectConfig, ManualClock};
//! use std::time::Duration;
//!
//! let config = EffectConfig::default().with_max_nesting_depth(8);
//! let before = config.fingerprint();
//! let config = config.with_enabled(false);
//! assert_ne!(before, config.fingerprint());
//!
//! let clock = ManualClock::new(0);
//! clock.advance(Duration::from_millis(250));
//! assert_eq!(clock.now_ms(), 250);
//! ```

pub mod clock;
pub mod config;
pub mod rng;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{
    ConfigFingerprint, DEFAULT_LAYOUT_CAPACITY, DEFAULT_MAX_EFFECTS_PER_GLYPH,
    DEFAULT_MAX_NESTING_DEPTH, DEFAULT_MAX_PARSE_LENGTH, DEFAULT_MAX_SPAN_DEPTH,
    DEFAULT_RESET_DELAY, DEFAULT_TRACK_CAPACITY, DEFAULT_TRACK_IDLE_TIMEOUT, EffectConfig,
    RandomObfuscation, RestartPolicy, TypewriterAllocation,
};
pub use rng::{SeededRng, fx_hash, mix64};
