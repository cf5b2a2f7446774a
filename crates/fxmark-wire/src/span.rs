//! Resolved spans on the wire.
//!
//! A span is a `u32` presence mask, the content string, every present
//! optional field in declaration order, then the tag list. Decoding rejects
//! bad structure (counts, lengths, enum codes, UTF-8) and clamps every
//! scalar into its documented range.

use fxmark_style::{Argb, StyleFlags};
use fxmark_text::{AttributedText, EffectDescriptor, ObfuscateMode, Run, ShakeKind, style_of};
use tracing::debug;

use crate::codec::{Reader, Writer};
use crate::error::{DecodeError, EncodeError};

/// Longest content string, in bytes.
pub const MAX_CONTENT_BYTES: usize = 65_536;
/// Longest font, item, or entity id, in bytes.
pub const MAX_ID_BYTES: usize = 256;
/// Most colors in a gradient.
pub const MAX_COLORS: usize = 256;
/// Most effect tags on one span.
pub const MAX_TAGS: usize = 256;
/// Longest effect tag, in bytes.
pub const MAX_TAG_BYTES: usize = 512;
/// Largest item stack count.
pub const MAX_ITEM_COUNT: usize = 64;
/// Most spans in one message.
pub const MAX_SPANS: usize = 4096;
/// Largest absolute message offset.
pub const MAX_OFFSET: f32 = 10_000.0;
/// Message scale bounds.
pub const SCALE_RANGE: (f32, f32) = (0.01, 100.0);

bitflags::bitflags! {
    /// Which optional fields follow the content string.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Presence: u32 {
        const STYLE               = 1 << 0;
        const COLOR               = 1 << 1;
        const FONT                = 1 << 2;
        const GRADIENT            = 1 << 3;
        const TYPEWRITER          = 1 << 4;
        const SHAKE               = 1 << 5;
        const CHAR_SHAKE          = 1 << 6;
        const OBFUSCATE           = 1 << 7;
        const BACKGROUND          = 1 << 8;
        const BACKGROUND_GRADIENT = 1 << 9;
        const OVERRIDES           = 1 << 10;
        const ITEM                = 1 << 11;
        const ENTITY              = 1 << 12;
    }
}

/// Typewriter parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WireTypewriter {
    /// Characters per tick, `[0.01, 100]`.
    pub speed: f32,
    /// Keep the visible part centered.
    pub center: bool,
}

/// Shake parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WireShake {
    /// Motion shape.
    pub kind: ShakeKind,
    /// Pixels, `[0, 64]`.
    pub amplitude: f32,
    /// `[0, 100]`.
    pub speed: f32,
    /// `[0.01, 1000]`.
    pub wavelength: f32,
}

/// Obfuscation parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WireObfuscate {
    /// Mode.
    pub mode: ObfuscateMode,
    /// Milliseconds per step, `[1, 60000]`.
    pub speed_ms: f32,
}

/// Message-level placement overrides.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Overrides {
    /// Pixels, `[-10000, 10000]`.
    pub offset_x: f32,
    /// Pixels, `[-10000, 10000]`.
    pub offset_y: f32,
    /// `[0.01, 100]`.
    pub scale: f32,
}

/// An item rendered inline with the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemAttachment {
    /// Item id.
    pub id: String,
    /// Stack count, `0..=64`.
    pub count: u32,
}

/// One fully resolved span, ready for transport.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedSpan {
    /// Text of the span.
    pub content: String,
    /// Style flags for every character.
    pub style: Option<StyleFlags>,
    /// Foreground color.
    pub color: Option<Argb>,
    /// Font id.
    pub font: Option<String>,
    /// Foreground gradient stops.
    pub gradient: Option<Vec<Argb>>,
    /// Typewriter reveal.
    pub typewriter: Option<WireTypewriter>,
    /// Whole-span shake.
    pub shake: Option<WireShake>,
    /// Per-character shake.
    pub char_shake: Option<WireShake>,
    /// Obfuscation.
    pub obfuscate: Option<WireObfuscate>,
    /// Background color.
    pub background: Option<Argb>,
    /// Background gradient stops.
    pub background_gradient: Option<Vec<Argb>>,
    /// Message-level overrides.
    pub overrides: Option<Overrides>,
    /// Inline item.
    pub item: Option<ItemAttachment>,
    /// Inline entity id.
    pub entity: Option<String>,
    /// Effect tags applied to the span.
    pub tags: Vec<String>,
}

impl ResolvedSpan {
    /// A span with only content.
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    /// Resolve one run of attributed text.
    ///
    /// Static style folds into `style`, `color` and `font`; shake maps to
    /// `char_shake` because markup shake moves characters individually.
    /// Unreadable colors and stops are left out so the receiver applies its
    /// own default. Every attribute id lands in `tags`.
    #[must_use]
    pub fn from_run(run: &Run<'_>) -> Self {
        let style = style_of(run.attributes);
        let mut span = Self {
            content: run.text.to_string(),
            style: (!style.flags.is_empty()).then_some(style.flags),
            color: style.color,
            font: style.font.as_deref().map(str::to_string),
            ..Self::default()
        };
        for attribute in run.attributes {
            if !span.tags.contains(&attribute.id) {
                span.tags.push(attribute.id.clone());
            }
            match EffectDescriptor::from_attribute(attribute) {
                Some(EffectDescriptor::Typewriter(spec)) => {
                    span.typewriter = Some(WireTypewriter {
                        speed: spec.speed as f32,
                        center: spec.center,
                    });
                }
                Some(EffectDescriptor::Shake(spec)) => {
                    span.char_shake = Some(WireShake {
                        kind: spec.kind,
                        amplitude: spec.amplitude as f32,
                        speed: spec.speed as f32,
                        wavelength: spec.wavelength as f32,
                    });
                }
                Some(EffectDescriptor::Obfuscate(spec)) => {
                    span.obfuscate = Some(WireObfuscate {
                        mode: spec.mode,
                        speed_ms: spec.speed_ms as f32,
                    });
                }
                Some(EffectDescriptor::Gradient(spec)) => {
                    let stops: Vec<Argb> = spec.stops.iter().flatten().copied().collect();
                    span.gradient = (!stops.is_empty()).then_some(stops);
                }
                _ => {}
            }
        }
        span
    }

    /// Presence mask for the fields that are set.
    #[must_use]
    pub fn presence(&self) -> Presence {
        let mut presence = Presence::empty();
        presence.set(Presence::STYLE, self.style.is_some());
        presence.set(Presence::COLOR, self.color.is_some());
        presence.set(Presence::FONT, self.font.is_some());
        presence.set(Presence::GRADIENT, self.gradient.is_some());
        presence.set(Presence::TYPEWRITER, self.typewriter.is_some());
        presence.set(Presence::SHAKE, self.shake.is_some());
        presence.set(Presence::CHAR_SHAKE, self.char_shake.is_some());
        presence.set(Presence::OBFUSCATE, self.obfuscate.is_some());
        presence.set(Presence::BACKGROUND, self.background.is_some());
        presence.set(Presence::BACKGROUND_GRADIENT, self.background_gradient.is_some());
        presence.set(Presence::OVERRIDES, self.overrides.is_some());
        presence.set(Presence::ITEM, self.item.is_some());
        presence.set(Presence::ENTITY, self.entity.is_some());
        presence
    }

    /// Append this span to `w`.
    pub fn encode(&self, w: &mut Writer) -> Result<(), EncodeError> {
        w.u32(self.presence().bits());
        w.string("content", &self.content, MAX_CONTENT_BYTES)?;
        if let Some(style) = self.style {
            w.u8(style.bits());
        }
        if let Some(color) = self.color {
            w.u32(color.0);
        }
        if let Some(font) = &self.font {
            w.string("font", font, MAX_ID_BYTES)?;
        }
        if let Some(stops) = &self.gradient {
            write_colors(w, "gradient", stops)?;
        }
        if let Some(tw) = self.typewriter {
            w.f32(tw.speed);
            w.u8(u8::from(tw.center));
        }
        if let Some(shake) = self.shake {
            write_shake(w, shake);
        }
        if let Some(shake) = self.char_shake {
            write_shake(w, shake);
        }
        if let Some(obf) = self.obfuscate {
            w.u8(code_of(ObfuscateMode::ALL, obf.mode));
            w.f32(obf.speed_ms);
        }
        if let Some(color) = self.background {
            w.u32(color.0);
        }
        if let Some(stops) = &self.background_gradient {
            write_colors(w, "background_gradient", stops)?;
        }
        if let Some(o) = self.overrides {
            w.f32(o.offset_x);
            w.f32(o.offset_y);
            w.f32(o.scale);
        }
        if let Some(item) = &self.item {
            w.string("item.id", &item.id, MAX_ID_BYTES)?;
            w.count("item.count", item.count as usize, MAX_ITEM_COUNT)?;
        }
        if let Some(entity) = &self.entity {
            w.string("entity", entity, MAX_ID_BYTES)?;
        }
        w.count("tags", self.tags.len(), MAX_TAGS)?;
        for tag in &self.tags {
            w.string("tag", tag, MAX_TAG_BYTES)?;
        }
        Ok(())
    }

    /// Read one span from `r`.
    pub fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let raw = r.u32()?;
        let presence = Presence::from_bits(raw).ok_or(DecodeError::InvalidEnum {
            field: "presence",
            value: raw,
        })?;
        let mut span = Self::new(r.string("content", MAX_CONTENT_BYTES)?);

        if presence.contains(Presence::STYLE) {
            span.style = Some(StyleFlags::from_bits_truncate(r.u8()?));
        }
        if presence.contains(Presence::COLOR) {
            span.color = Some(Argb(r.u32()?));
        }
        if presence.contains(Presence::FONT) {
            span.font = Some(r.string("font", MAX_ID_BYTES)?);
        }
        if presence.contains(Presence::GRADIENT) {
            span.gradient = Some(read_colors(r, "gradient")?);
        }
        if presence.contains(Presence::TYPEWRITER) {
            span.typewriter = Some(WireTypewriter {
                speed: r.f32_clamped(0.01, 100.0)?,
                center: r.u8()? != 0,
            });
        }
        if presence.contains(Presence::SHAKE) {
            span.shake = Some(read_shake(r)?);
        }
        if presence.contains(Presence::CHAR_SHAKE) {
            span.char_shake = Some(read_shake(r)?);
        }
        if presence.contains(Presence::OBFUSCATE) {
            span.obfuscate = Some(WireObfuscate {
                mode: enum_of("obfuscate.mode", ObfuscateMode::ALL, r.u8()?)?,
                speed_ms: r.f32_clamped(1.0, 60_000.0)?,
            });
        }
        if presence.contains(Presence::BACKGROUND) {
            span.background = Some(Argb(r.u32()?));
        }
        if presence.contains(Presence::BACKGROUND_GRADIENT) {
            span.background_gradient = Some(read_colors(r, "background_gradient")?);
        }
        if presence.contains(Presence::OVERRIDES) {
            span.overrides = Some(Overrides {
                offset_x: r.f32_clamped(-MAX_OFFSET, MAX_OFFSET)?,
                offset_y: r.f32_clamped(-MAX_OFFSET, MAX_OFFSET)?,
                scale: r.f32_clamped(SCALE_RANGE.0, SCALE_RANGE.1)?,
            });
        }
        if presence.contains(Presence::ITEM) {
            let id = r.string("item.id", MAX_ID_BYTES)?;
            let count = r.count("item.count", MAX_ITEM_COUNT)? as u32;
            span.item = Some(ItemAttachment { id, count });
        }
        if presence.contains(Presence::ENTITY) {
            span.entity = Some(r.string("entity", MAX_ID_BYTES)?);
        }

        let tags = r.count("tags", MAX_TAGS)?;
        span.tags = (0..tags)
            .map(|_| r.string("tag", MAX_TAG_BYTES))
            .collect::<Result<_, _>>()?;
        Ok(span)
    }

    /// Encode this span alone.
    pub fn to_bytes(&self) -> Result<Vec<u8>, EncodeError> {
        let mut w = Writer::new();
        self.encode(&mut w)?;
        Ok(w.into_bytes())
    }

    /// Decode a buffer holding exactly one span.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut r = Reader::new(bytes);
        let span = Self::decode(&mut r)?;
        r.finish()?;
        Ok(span)
    }
}

/// One resolved span per run of `text`.
#[must_use]
pub fn spans_from_text(text: &AttributedText) -> Vec<ResolvedSpan> {
    text.runs().iter().map(ResolvedSpan::from_run).collect()
}

/// Encode a count-prefixed list of spans.
pub fn encode_spans(spans: &[ResolvedSpan]) -> Result<Vec<u8>, EncodeError> {
    let mut w = Writer::new();
    w.count("spans", spans.len(), MAX_SPANS)?;
    for span in spans {
        span.encode(&mut w)?;
    }
    Ok(w.into_bytes())
}

/// Decode a count-prefixed list of spans; the buffer must hold nothing else.
pub fn decode_spans(bytes: &[u8]) -> Result<Vec<ResolvedSpan>, DecodeError> {
    read_spans(bytes).inspect_err(|error| {
        debug!(%error, bytes = bytes.len(), "span list rejected");
    })
}

fn read_spans(bytes: &[u8]) -> Result<Vec<ResolvedSpan>, DecodeError> {
    let mut r = Reader::new(bytes);
    let count = r.count("spans", MAX_SPANS)?;
    let spans = (0..count)
        .map(|_| ResolvedSpan::decode(&mut r))
        .collect::<Result<Vec<_>, _>>()?;
    r.finish()?;
    Ok(spans)
}

fn write_colors(w: &mut Writer, field: &'static str, stops: &[Argb]) -> Result<(), EncodeError> {
    w.count(field, stops.len(), MAX_COLORS)?;
    for stop in stops {
        w.u32(stop.0);
    }
    Ok(())
}

fn read_colors(r: &mut Reader<'_>, field: &'static str) -> Result<Vec<Argb>, DecodeError> {
    let count = r.count(field, MAX_COLORS)?;
    (0..count).map(|_| r.u32().map(Argb)).collect()
}

fn write_shake(w: &mut Writer, shake: WireShake) {
    w.u8(code_of(ShakeKind::ALL, shake.kind));
    w.f32(shake.amplitude);
    w.f32(shake.speed);
    w.f32(shake.wavelength);
}

fn read_shake(r: &mut Reader<'_>) -> Result<WireShake, DecodeError> {
    Ok(WireShake {
        kind: enum_of("shake.kind", ShakeKind::ALL, r.u8()?)?,
        amplitude: r.f32_clamped(0.0, 64.0)?,
        speed: r.f32_clamped(0.0, 100.0)?,
        wavelength: r.f32_clamped(0.01, 1000.0)?,
    })
}

fn code_of<T: PartialEq>(all: &[T], value: T) -> u8 {
    all.iter().position(|v| *v == value).unwrap_or(0) as u8
}

fn enum_of<T: Copy>(field: &'static str, all: &[T], code: u8) -> Result<T, DecodeError> {
    all.get(usize::from(code))
        .copied()
        .ok_or(DecodeError::InvalidEnum {
            field,
            value: u32::from(code),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fxmark_text::{EffectRegistry, ParseOptions, parse};
    use tracing_test::traced_test;

    fn full() -> ResolvedSpan {
        ResolvedSpan {
            content: "héllo".into(),
            style: Some(StyleFlags::BOLD | StyleFlags::ITALIC),
            color: Some(Argb(0xFF11_2233)),
            font: Some("minecraft:uniform".into()),
            gradient: Some(vec![Argb::BLACK, Argb::WHITE]),
            typewriter: Some(WireTypewriter {
                speed: 2.5,
                center: true,
            }),
            shake: Some(WireShake {
                kind: ShakeKind::Circle,
                amplitude: 3.0,
                speed: 1.0,
                wavelength: 2.0,
            }),
            char_shake: Some(WireShake {
                kind: ShakeKind::Wave,
                amplitude: 1.0,
                speed: 4.0,
                wavelength: 1.0,
            }),
            obfuscate: Some(WireObfuscate {
                mode: ObfuscateMode::Hide,
                speed_ms: 250.0,
            }),
            background: Some(Argb(0x8000_0000)),
            background_gradient: Some(vec![Argb::WHITE]),
            overrides: Some(Overrides {
                offset_x: -4.0,
                offset_y: 12.0,
                scale: 1.5,
            }),
            item: Some(ItemAttachment {
                id: "minecraft:apple".into(),
                count: 3,
            }),
            entity: Some("minecraft:pig".into()),
            tags: vec!["shake".into(), "gradient".into()],
        }
    }

    // =========================================================================
    // Layout
    // =========================================================================

    #[test]
    fn bare_span_layout() {
        let bytes = ResolvedSpan::new("hi").to_bytes().unwrap();
        assert_eq!(bytes, vec![0, 0, 0, 0, 0, 0, 0, 2, b'h', b'i', 0, 0, 0, 0]);
    }

    #[test]
    fn presence_reflects_fields() {
        let presence = full().presence();
        assert_eq!(presence, Presence::all());
        let mut span = ResolvedSpan::new("x");
        span.color = Some(Argb::WHITE);
        assert_eq!(span.presence(), Presence::COLOR);
    }

    #[test]
    fn every_field_survives_transport() {
        let span = full();
        assert_eq!(ResolvedSpan::from_bytes(&span.to_bytes().unwrap()), Ok(span));
    }

    // =========================================================================
    // Rejection and clamping
    // =========================================================================

    #[test]
    fn unknown_presence_bit_is_rejected() {
        let mut bytes = ResolvedSpan::new("").to_bytes().unwrap();
        bytes[0] = 0x80;
        assert!(matches!(
            ResolvedSpan::from_bytes(&bytes),
            Err(DecodeError::InvalidEnum {
                field: "presence",
                ..
            })
        ));
    }

    #[test]
    fn unknown_shake_kind_is_rejected() {
        let mut span = ResolvedSpan::new("");
        span.shake = Some(WireShake {
            kind: ShakeKind::Wave,
            amplitude: 1.0,
            speed: 1.0,
            wavelength: 1.0,
        });
        let mut bytes = span.to_bytes().unwrap();
        // presence(4) + content length(4), then the kind byte.
        bytes[8] = 7;
        assert_eq!(
            ResolvedSpan::from_bytes(&bytes),
            Err(DecodeError::InvalidEnum {
                field: "shake.kind",
                value: 7
            })
        );
    }

    #[test]
    fn scalars_are_clamped_not_rejected() {
        let mut span = ResolvedSpan::new("x");
        span.overrides = Some(Overrides {
            offset_x: 1e9,
            offset_y: f32::NEG_INFINITY,
            scale: 0.0,
        });
        span.typewriter = Some(WireTypewriter {
            speed: 1000.0,
            center: false,
        });
        span.obfuscate = Some(WireObfuscate {
            mode: ObfuscateMode::Reveal,
            speed_ms: f32::NAN,
        });
        let decoded = ResolvedSpan::from_bytes(&span.to_bytes().unwrap()).unwrap();
        let overrides = decoded.overrides.unwrap();
        assert_eq!(overrides.offset_x, 10_000.0);
        assert_eq!(overrides.offset_y, -10_000.0);
        assert_eq!(overrides.scale, 0.01);
        assert_eq!(decoded.typewriter.unwrap().speed, 100.0);
        assert_eq!(decoded.obfuscate.unwrap().speed_ms, 1.0);
    }

    #[test]
    fn oversize_fields_fail_to_encode() {
        let mut span = ResolvedSpan::new("x");
        span.gradient = Some(vec![Argb::BLACK; MAX_COLORS + 1]);
        assert!(matches!(
            span.to_bytes(),
            Err(EncodeError::TooLong {
                field: "gradient",
                ..
            })
        ));

        let mut span = ResolvedSpan::new("x");
        span.item = Some(ItemAttachment {
            id: "a".into(),
            count: 65,
        });
        assert!(span.to_bytes().is_err());

        let mut span = ResolvedSpan::new("x");
        span.tags = vec!["t".repeat(MAX_TAG_BYTES + 1)];
        assert!(span.to_bytes().is_err());
    }

    #[test]
    #[traced_test]
    fn span_list_rejects_negative_count() {
        let bytes = (-1i32).to_be_bytes();
        assert!(matches!(
            decode_spans(&bytes),
            Err(DecodeError::CountOutOfRange { field: "spans", .. })
        ));
        assert!(logs_contain("span list rejected"));
    }

    #[test]
    fn span_list_rejects_trailing_bytes() {
        let mut bytes = encode_spans(&[ResolvedSpan::new("a")]).unwrap();
        bytes.push(0);
        assert_eq!(decode_spans(&bytes), Err(DecodeError::TrailingBytes { remaining: 1 }));
    }

    // =========================================================================
    // From attributed text
    // =========================================================================

    #[test]
    fn runs_become_spans() {
        let text = parse(
            "a<bold><wave a=2>b</wave></bold><gradient colors=\"#000 #fff\">c</gradient>",
            &EffectRegistry::builtin(),
            &ParseOptions::default(),
        );
        let spans = spans_from_text(&text);
        assert_eq!(spans.len(), 3);
        assert_eq!(spans[0], ResolvedSpan::new("a"));

        assert_eq!(spans[1].content, "b");
        assert_eq!(spans[1].style, Some(StyleFlags::BOLD));
        let shake = spans[1].char_shake.unwrap();
        assert_eq!(shake.kind, ShakeKind::Wave);
        assert_eq!(shake.amplitude, 2.0);
        assert_eq!(spans[1].tags, vec!["bold".to_string(), "shake".to_string()]);

        assert_eq!(spans[2].gradient, Some(vec![Argb::BLACK, Argb::WHITE]));
        let decoded = decode_spans(&encode_spans(&spans).unwrap()).unwrap();
        assert_eq!(decoded, spans);
    }
}
