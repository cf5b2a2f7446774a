//! Per-character motion.
//!
//! Shake is stateless: the offset of a character depends only on the frame
//! tick, its index inside the element, the parameters, and a seed.

use std::f64::consts::TAU;

use fxmark_core::{SeededRng, mix64};
use fxmark_text::{ShakeKind, ShakeSpec};

use crate::error::EffectError;
use crate::glyph::GlyphState;
use crate::renderer::{EffectContext, GlyphEffect};

/// Phase advanced per tick at speed 1.
pub const PHASE_PER_TICK: f64 = 0.05;
/// Phase offset between neighbouring characters.
pub const PHASE_PER_CHAR: f64 = 0.1;

/// Pixel offset `(x, y)` for the character at `index`.
///
/// - `Wave`: vertical sinusoid, `phase = ticks·0.05·speed + index·0.1`
/// - `Circle`: the same phase driving a cos/sin orbit
/// - `Random`: seeded jitter, re-rolled whenever `floor(ticks·speed)` changes
#[must_use]
pub fn shake_offset(spec: &ShakeSpec, elapsed_ticks: f64, index: usize, seed: u64) -> (f64, f64) {
    let amplitude = spec.amplitude;
    match spec.kind {
        ShakeKind::Wave | ShakeKind::Circle => {
            let phase = elapsed_ticks * PHASE_PER_TICK * spec.speed + index as f64 * PHASE_PER_CHAR;
            let angle = phase * TAU / spec.wavelength;
            if spec.kind == ShakeKind::Wave {
                (0.0, angle.sin() * amplitude)
            } else {
                (angle.cos() * amplitude, angle.sin() * amplitude)
            }
        }
        ShakeKind::Random => {
            let bucket = (elapsed_ticks * spec.speed).floor().max(0.0) as u64;
            let mut rng = SeededRng::new(mix64(seed ^ bucket, index as u64));
            (
                rng.next_signed_unit() * amplitude,
                rng.next_signed_unit() * amplitude,
            )
        }
    }
}

impl GlyphEffect for ShakeSpec {
    fn name(&self) -> &'static str {
        "shake"
    }

    fn apply(&self, ctx: &mut EffectContext<'_>, glyph: &mut GlyphState) -> Result<(), EffectError> {
        let ticks = ctx.frame.ticks;
        for (param, value) in [
            ("ticks", ticks),
            ("amplitude", self.amplitude),
            ("speed", self.speed),
            ("wavelength", self.wavelength),
        ] {
            if !value.is_finite() {
                return Err(EffectError::NonFiniteParameter {
                    effect: "shake",
                    param,
                });
            }
        }
        let (dx, dy) = shake_offset(
            self,
            ticks,
            ctx.local_index(glyph.index),
            ctx.track_key().value(),
        );
        glyph.offset_x += dx;
        glyph.offset_y += dy;
        Ok(())
    }
}
