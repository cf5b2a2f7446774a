//! Color stops and hue cycling along the text.

use fxmark_style::Argb;
use fxmark_text::{GradientSpec, RainbowSpec};

use crate::error::EffectError;
use crate::glyph::GlyphState;
use crate::renderer::{EffectContext, GlyphEffect};

/// Hue degrees advanced per tick at rainbow speed 1 (one cycle per 100 ticks).
pub const HUE_PER_TICK: f64 = 3.6;

/// Color at `position` in stop space (`0` is the first stop, `n-1` the last).
///
/// Repeating gradients wrap modulo the stop count and blend the last stop
/// back into the first; others clamp to `[0, n-1]`. Returns `None` for an
/// empty stop list.
#[must_use]
pub fn gradient_color(stops: &[Argb], position: f64, repeating: bool) -> Option<Argb> {
    let n = stops.len();
    match n {
        0 => return None,
        1 => return Some(stops[0]),
        _ => {}
    }
    let position = if position.is_finite() { position } else { 0.0 };

    if repeating {
        let p = position.rem_euclid(n as f64);
        let k = (p.floor() as usize).min(n - 1);
        Some(stops[k].lerp(stops[(k + 1) % n], p - k as f64))
    } else {
        let p = position.clamp(0.0, (n - 1) as f64);
        let k = (p.floor() as usize).min(n - 2);
        Some(stops[k].lerp(stops[k + 1], p - k as f64))
    }
}

/// Stop-space position of the character at `local` in an element of `len`
/// characters after `ticks` ticks of flow.
///
/// With an explicit `spread` every `spread` characters advance one stop.
/// Without one, repeating gradients advance one stop per character and
/// others stretch their stops across the element.
#[must_use]
pub fn gradient_position(spec: &GradientSpec, local: usize, len: usize, ticks: f64) -> f64 {
    let travel = local as f64 + ticks * spec.flow;
    let stops = spec.stops.len();
    match spec.spread {
        Some(spread) => travel / spread,
        None if spec.repeating || stops < 2 || len < 2 => travel,
        None => travel * (stops - 1) as f64 / (len - 1) as f64,
    }
}

/// Rainbow color for the character at `local` after `ticks` ticks.
#[must_use]
pub fn rainbow_color(spec: &RainbowSpec, local: usize, ticks: f64) -> Argb {
    let hue = local as f64 * 360.0 / spec.spread + ticks * spec.speed * HUE_PER_TICK;
    Argb::from_hsv(hue, spec.saturation, spec.brightness)
}

impl GlyphEffect for GradientSpec {
    fn name(&self) -> &'static str {
        "gradient"
    }

    fn apply(&self, ctx: &mut EffectContext<'_>, glyph: &mut GlyphState) -> Result<(), EffectError> {
        let ticks = ctx.frame.ticks;
        if !ticks.is_finite() || !self.flow.is_finite() {
            return Err(EffectError::NonFiniteParameter {
                effect: "gradient",
                param: if ticks.is_finite() { "flow" } else { "ticks" },
            });
        }
        let position = gradient_position(self, ctx.local_index(glyph.index), ctx.extent_len(), ticks);
        let stops = self.resolved_stops(ctx.frame.base_color);
        let color = gradient_color(&stops, position, self.repeating).ok_or(EffectError::EmptyGradient)?;
        glyph.color = color.with_alpha(glyph.color.a());
        Ok(())
    }
}

impl GlyphEffect for RainbowSpec {
    fn name(&self) -> &'static str {
        "rainbow"
    }

    fn apply(&self, ctx: &mut EffectContext<'_>, glyph: &mut GlyphState) -> Result<(), EffectError> {
        let ticks = ctx.frame.ticks;
        if !ticks.is_finite() {
            return Err(EffectError::NonFiniteParameter {
                effect: "rainbow",
                param: "ticks",
            });
        }
        let color = rainbow_color(self, ctx.local_index(glyph.index), ticks);
        glyph.color = color.with_alpha(glyph.color.a());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    const BW: [Argb; 2] = [Argb::BLACK, Argb::WHITE];

    fn spec(stops: &[Argb], spread: Option<f64>, repeating: bool) -> GradientSpec {
        GradientSpec {
            stops: stops.iter().copied().map(Some).collect(),
            flow: 0.0,
            spread,
            repeating,
        }
    }

    // =========================================================================
    // gradient_color
    // =========================================================================

    #[test]
    fn black_to_white_endpoints_and_midpoint() {
        assert_eq!(gradient_color(&BW, 0.0, false), Some(Argb::BLACK));
        assert_eq!(gradient_color(&BW, 1.0, false), Some(Argb::WHITE));
        assert_eq!(gradient_color(&BW, 0.5, false), Some(Argb::rgb(0x7F, 0x7F, 0x7F)));
    }

    #[test]
    fn non_repeating_clamps() {
        assert_eq!(gradient_color(&BW, -4.0, false), Some(Argb::BLACK));
        assert_eq!(gradient_color(&BW, 9.0, false), Some(Argb::WHITE));
    }

    #[test]
    fn repeating_wraps_back_to_first_stop() {
        assert_eq!(gradient_color(&BW, 2.0, true), Some(Argb::BLACK));
        assert_eq!(gradient_color(&BW, 3.0, true), Some(Argb::WHITE));
        assert_eq!(gradient_color(&BW, 1.5, true), Some(Argb::rgb(0x7F, 0x7F, 0x7F)));
        assert_eq!(gradient_color(&BW, -1.0, true), Some(Argb::WHITE));
    }

    #[test]
    fn single_and_empty_stop_lists() {
        let red = Argb::rgb(255, 0, 0);
        assert_eq!(gradient_color(&[red], 42.0, true), Some(red));
        assert_eq!(gradient_color(&[], 0.0, false), None);
    }

    #[test]
    fn nan_position_reads_first_stop() {
        assert_eq!(gradient_color(&BW, f64::NAN, false), Some(Argb::BLACK));
    }

    // =========================================================================
    // gradient_position
    // =========================================================================

    #[test]
    fn default_spread_stretches_across_element() {
        let g = spec(&BW, None, false);
        assert_eq!(gradient_position(&g, 0, 5, 0.0), 0.0);
        assert_eq!(gradient_position(&g, 4, 5, 0.0), 1.0);
        assert_eq!(gradient_position(&g, 2, 5, 0.0), 0.5);
    }

    #[test]
    fn explicit_spread_and_flow() {
        let mut g = spec(&BW, Some(4.0), true);
        assert_eq!(gradient_position(&g, 2, 10, 0.0), 0.5);
        g.flow = 0.5;
        assert_eq!(gradient_position(&g, 2, 10, 4.0), 1.0);
    }

    #[test]
    fn repeating_default_is_one_stop_per_char() {
        let g = spec(&BW, None, true);
        assert_eq!(gradient_position(&g, 3, 10, 0.0), 3.0);
    }

    #[test]
    fn single_stop_position_is_unscaled() {
        let g = GradientSpec {
            stops: smallvec![Some(Argb::BLACK)],
            flow: 0.0,
            spread: None,
            repeating: false,
        };
        assert_eq!(gradient_position(&g, 3, 10, 0.0), 3.0);
        assert_eq!(gradient_color(&g.resolved_stops(Argb::WHITE), 3.0, false), Some(Argb::BLACK));
    }

    // =========================================================================
    // Rainbow
    // =========================================================================

    #[test]
    fn rainbow_starts_red_and_cycles() {
        let spec = RainbowSpec {
            speed: 1.0,
            saturation: 1.0,
            brightness: 1.0,
            spread: 16.0,
        };
        assert_eq!(rainbow_color(&spec, 0, 0.0), Argb::rgb(255, 0, 0));
        assert_eq!(rainbow_color(&spec, 0, 100.0), Argb::rgb(255, 0, 0));
        assert_eq!(rainbow_color(&spec, 16, 0.0), Argb::rgb(255, 0, 0));
        assert_ne!(rainbow_color(&spec, 4, 0.0), Argb::rgb(255, 0, 0));
    }
}
