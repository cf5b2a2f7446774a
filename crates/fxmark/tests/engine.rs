//! Engine-level behavior: caching, invalidation, animation and transport.

use std::cell::Cell;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use fxmark::prelude::*;
use fxmark::{DecodeError, Error};

fn engine() -> (Arc<ManualClock>, TextEngine<Vec<char>>) {
    let clock = Arc::new(ManualClock::new(0));
    let engine = TextEngine::with_clock(EffectConfig::default(), clock.clone());
    (clock, engine)
}

fn shown(glyphs: &[GlyphState]) -> String {
    glyphs.iter().filter(|g| g.visible).map(|g| g.codepoint).collect()
}

fn chars(text: &AttributedText) -> Vec<char> {
    text.raw_text().chars().collect()
}

// =============================================================================
// Layout cache
// =============================================================================

#[test]
fn layout_shapes_once_per_key() {
    let (_, engine) = engine();
    let calls = Cell::new(0);
    let shape = |text: &AttributedText| {
        calls.set(calls.get() + 1);
        chars(text)
    };

    let first = engine.layout("<bold>hi</bold>", 100, 0, shape);
    let second = engine.layout("<bold>hi</bold>", 100, 0, shape);
    assert_eq!(calls.get(), 1);
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.sequence(), Some(&vec!['h', 'i']));
    assert_eq!(first.spans().raw_text(), "hi");

    let _ = engine.layout("<bold>hi</bold>", 200, 0, shape);
    assert_eq!(calls.get(), 2);
    assert_eq!(engine.layouts().stats().hits, 1);
}

#[test]
fn deferred_layout_shapes_on_first_access() {
    let (_, engine) = engine();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let layout = engine.layout_deferred("abc", 100, 0, move || {
        counter.fetch_add(1, Ordering::SeqCst);
        vec!['a', 'b', 'c']
    });
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(layout.sequence().map(Vec::len), Some(3));
    assert_eq!(layout.sequence().map(Vec::len), Some(3));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn environment_changes_invalidate_layouts() {
    let (_, mut engine) = engine();
    let _ = engine.layout("text", 100, 0, chars);
    assert_eq!(engine.layouts().len(), 1);

    assert!(!engine.set_language("en_us"));
    assert_eq!(engine.layouts().len(), 1);
    assert!(engine.set_language("de_de"));
    assert!(engine.layouts().is_empty());
    assert_eq!(engine.language(), "de_de");

    let _ = engine.layout("text", 100, 0, chars);
    assert!(!engine.set_scale(1.0));
    assert!(engine.set_scale(2.0));
    assert!(engine.layouts().is_empty());
}

#[test]
fn apply_config_invalidates_only_on_change() {
    let (_, mut engine) = engine();
    let _ = engine.layout("text", 100, 0, chars);

    assert!(!engine.apply_config(EffectConfig::default()));
    assert_eq!(engine.layouts().len(), 1);

    assert!(engine.apply_config(EffectConfig::default().with_max_span_depth(4)));
    assert!(engine.layouts().is_empty());
    assert_eq!(engine.config().max_span_depth, 4);
}

// =============================================================================
// Rendering
// =============================================================================

#[test]
fn typewriter_reveals_over_ticks() {
    let (_, mut engine) = engine();
    let text = engine.parse("<typewriter speed=2>abcdef</typewriter>");
    assert_eq!(shown(&engine.render(&text, &FrameContext::at(0.0))), "");
    assert_eq!(shown(&engine.render(&text, &FrameContext::at(2.0))), "abcd");
    assert_eq!(shown(&engine.render(&text, &FrameContext::at(10.0))), "abcdef");
}

#[test]
fn render_evicts_idle_tracks() {
    let (clock, mut engine) = engine();
    let text = engine.parse("<typewriter>abcd</typewriter>");
    let _ = engine.render(&text, &FrameContext::at(0.0));
    assert_eq!(engine.tracks().typewriter_len(), 1);

    clock.advance(Duration::from_secs(5));
    let other = engine.parse("plain");
    let _ = engine.render(&other, &FrameContext::at(1.0));
    assert_eq!(engine.tracks().typewriter_len(), 0);
}

#[test]
fn disabled_config_renders_plain_text() {
    let (_, mut engine) = engine();
    assert!(engine.apply_config(EffectConfig::default().with_enabled(false)));
    let text = engine.parse("<bold><typewriter>abc</typewriter></bold>");
    let glyphs = engine.render(&text, &FrameContext::at(0.0));
    assert_eq!(shown(&glyphs), "abc");
    assert!(glyphs.iter().all(|g| g.flags.is_empty()));
}

#[test]
fn styled_walk_stops_early() {
    let (_, engine) = engine();
    let text = engine.parse("ab<italic>cd</italic>");
    let mut seen = Vec::new();
    let mut sink = |index: usize, style: &Style, ch: char| {
        seen.push((index, ch, style.flags.contains(StyleFlags::ITALIC)));
        if index == 2 {
            std::ops::ControlFlow::Break(())
        } else {
            std::ops::ControlFlow::Continue(())
        }
    };
    let flow = engine.render_styled(&text, &FrameContext::default(), &mut sink);
    assert!(flow.is_break());
    assert_eq!(seen, vec![(0, 'a', false), (1, 'b', false), (2, 'c', true)]);
}

// =============================================================================
// Transport
// =============================================================================

#[test]
fn encode_then_decode_through_engine() {
    let (_, engine) = engine();
    let text = engine.parse("x<color value=#00ff00>y</color>");
    let spans = engine.decode(&engine.encode(&text).unwrap()).unwrap();
    assert_eq!(spans.len(), 2);
    assert_eq!(spans[1].content, "y");
    assert_eq!(spans[1].color, Some(Argb::rgb(0, 255, 0)));
}

#[test]
fn garbage_bytes_surface_as_decode_error() {
    let (_, engine) = engine();
    let err = engine.decode(&[0xFF, 0xFF, 0xFF, 0xFF]).unwrap_err();
    assert!(matches!(
        err,
        Error::Decode(DecodeError::CountOutOfRange { field: "spans", .. })
    ));
}

#[test]
fn track_settings_rebuild_tracks_but_keep_layouts() {
    let (_, mut engine) = engine();
    let text = engine.parse("<typewriter>abcd</typewriter>");
    let _ = engine.render(&text, &FrameContext::at(0.0));
    let _ = engine.layout("text", 100, 0, chars);

    let config = EffectConfig::default().with_tracks(8, Duration::from_secs(30));
    assert!(!engine.apply_config(config));
    assert_eq!(engine.tracks().capacity(), 8);
    assert!(engine.tracks().is_empty());
    assert_eq!(engine.layouts().len(), 1);
}
