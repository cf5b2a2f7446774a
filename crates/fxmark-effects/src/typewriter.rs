//! Progressive reveal.
//!
//! A typewriter element shows `floor((elapsed - delay) * speed)` characters,
//! where `elapsed` counts host ticks since the element's track started.
//! With [`TypewriterAllocation::Container`] the outermost typewriter
//! elements of a text share one budget instead, filled front to back.
//!
//! [`TypewriterAllocation::Container`]: fxmark_core::TypewriterAllocation::Container

use std::ops::Range;
use std::time::Duration;

use fxmark_core::{RestartPolicy, TypewriterAllocation};
use fxmark_text::TypewriterSpec;
use tracing::trace;

use crate::error::EffectError;
use crate::glyph::GlyphState;
use crate::renderer::{EffectContext, FrameContext, GlyphEffect};
use crate::track_cache::{TrackCache, TrackKey};

/// Characters visible after `elapsed_ticks`, clamped to `[0, total]`.
#[must_use]
pub fn visible_count(elapsed_ticks: f64, speed: f64, delay: f64, total: usize) -> usize {
    let shown = (elapsed_ticks - delay) * speed;
    if shown.is_nan() || shown <= 0.0 {
        return 0;
    }
    (shown.floor() as usize).min(total)
}

/// Split `budget` visible characters across elements of the given lengths,
/// front to back. The last partially covered element gets the remainder.
#[must_use]
pub fn allocate_container(budget: usize, lengths: &[usize]) -> Vec<usize> {
    let mut remaining = budget;
    lengths
        .iter()
        .map(|&len| {
            let share = remaining.min(len);
            remaining -= share;
            share
        })
        .collect()
}

/// Persistent reveal state for one typewriter element.
#[derive(Debug, Clone)]
pub struct TypewriterTrack {
    origin: Option<f64>,
    last_access_ms: u64,
    total: Option<usize>,
    last_position: Option<usize>,
    reset_delay_ms: u64,
    restarts: u32,
}

impl TypewriterTrack {
    /// A track that starts revealing on its first [`elapsed`](Self::elapsed) call.
    #[must_use]
    pub fn new(now_ms: u64, reset_delay: Duration) -> Self {
        Self {
            origin: None,
            last_access_ms: now_ms,
            total: None,
            last_position: None,
            reset_delay_ms: u64::try_from(reset_delay.as_millis()).unwrap_or(u64::MAX),
            restarts: 0,
        }
    }

    /// Ticks since the reveal started.
    ///
    /// Restarts first when the track sat idle for the reset delay, when the
    /// host tick counter went backwards, or (under
    /// [`RestartPolicy::OnTextChange`]) when `total` differs from last time.
    pub fn elapsed(&mut self, now_ms: u64, ticks: f64, total: usize, policy: RestartPolicy) -> f64 {
        if self.origin.is_some() && now_ms.saturating_sub(self.last_access_ms) >= self.reset_delay_ms {
            trace!(idle_ms = now_ms - self.last_access_ms, "typewriter idle, restarting");
            self.restart();
        }
        if policy == RestartPolicy::OnTextChange
            && let Some(previous) = self.total
            && previous != total
        {
            trace!(previous, total, "typewriter text changed, restarting");
            self.restart();
        }
        if let Some(origin) = self.origin
            && ticks < origin
        {
            self.restart();
        }
        self.total = Some(total);
        self.last_access_ms = now_ms;
        let origin = *self.origin.get_or_insert(ticks);
        ticks - origin
    }

    /// Report the caller's progress position. A position lower than the last
    /// one reported means the host looped; the reveal restarts and `true` is
    /// returned.
    pub fn observe_position(&mut self, position: usize) -> bool {
        let regressed = self.last_position.is_some_and(|last| position < last);
        if regressed {
            trace!(position, "typewriter position regressed, restarting");
            self.restart();
        }
        self.last_position = Some(position);
        regressed
    }

    /// Start the reveal over on the next [`elapsed`](Self::elapsed) call.
    pub fn restart(&mut self) {
        self.origin = None;
        self.last_position = None;
        self.restarts = self.restarts.saturating_add(1);
    }

    /// How many times this track restarted.
    #[must_use]
    pub fn restarts(&self) -> u32 {
        self.restarts
    }

    /// Clock time of the last [`elapsed`](Self::elapsed) call.
    #[must_use]
    pub fn last_access_ms(&self) -> u64 {
        self.last_access_ms
    }
}

/// Shared budget for container allocation: outermost typewriter extents in
/// document order with the characters each may show this frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct ContainerPlan {
    shares: Vec<(Range<usize>, usize)>,
}

impl ContainerPlan {
    /// Plan one frame. `elements` are typewriter extents with their specs,
    /// in document order; nested extents are folded into their outermost one
    /// and the first element's speed and delay drive the budget.
    pub(crate) fn build(
        elements: &[(Range<usize>, TypewriterSpec)],
        tracks: &mut TrackCache,
        key: TrackKey,
        frame: &FrameContext,
        policy: RestartPolicy,
    ) -> Self {
        let mut outer: Vec<&(Range<usize>, TypewriterSpec)> = Vec::new();
        for element in elements {
            let nested = outer
                .iter()
                .any(|(range, _)| range.start <= element.0.start && element.0.end <= range.end);
            if !nested {
                outer.push(element);
            }
        }
        let Some((_, first)) = outer.first() else {
            return Self::default();
        };

        let lengths: Vec<usize> = outer.iter().map(|(range, _)| range.len()).collect();
        let total = lengths.iter().sum();
        let now_ms = tracks.now_ms();
        let track = tracks.typewriter(key);
        if policy == RestartPolicy::OnRegression
            && let Some(position) = frame.progress
        {
            track.observe_position(position);
        }
        let elapsed = track.elapsed(now_ms, frame.ticks, total, policy);
        let budget = visible_count(elapsed, first.speed, first.delay, total);

        let shares = outer
            .iter()
            .zip(allocate_container(budget, &lengths))
            .map(|((range, _), visible)| (range.clone(), visible))
            .collect();
        Self { shares }
    }

    /// The outermost extent covering `index` and its visible share.
    pub(crate) fn share_for(&self, index: usize) -> Option<(Range<usize>, usize)> {
        self.shares
            .iter()
            .find(|(range, _)| range.contains(&index))
            .cloned()
    }
}

impl GlyphEffect for TypewriterSpec {
    fn name(&self) -> &'static str {
        "typewriter"
    }

    fn apply(&self, ctx: &mut EffectContext<'_>, glyph: &mut GlyphState) -> Result<(), EffectError> {
        let ticks = ctx.frame.ticks;
        if !ticks.is_finite() {
            return Err(EffectError::NonFiniteParameter {
                effect: "typewriter",
                param: "ticks",
            });
        }

        let (local, total, visible) = match ctx.config.typewriter_allocation {
            TypewriterAllocation::Independent => {
                let local = ctx.local_index(glyph.index);
                let total = ctx.extent_len();
                let key = ctx.track_key();
                let policy = ctx.config.typewriter_restart;
                let progress = ctx.frame.progress;
                let now_ms = ctx.now_ms;
                let track = ctx.tracks.typewriter(key);
                if policy == RestartPolicy::OnRegression
                    && let Some(position) = progress
                {
                    track.observe_position(position);
                }
                let elapsed = track.elapsed(now_ms, ticks, total, policy);
                (local, total, visible_count(elapsed, self.speed, self.delay, total))
            }
            TypewriterAllocation::Container => match ctx.container_share(glyph.index) {
                Some((range, visible)) => (glyph.index - range.start, range.len(), visible),
                None => return Ok(()),
            },
        };

        if local >= visible {
            glyph.visible = false;
        } else if self.center {
            glyph.offset_x += (total - visible) as f64 * ctx.frame.glyph_advance / 2.0;
        }
        Ok(())
    }
}
