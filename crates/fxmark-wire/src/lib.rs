#![forbid(unsafe_code)]

//! Binary transport for resolved fxmark spans.
//!
//! Everything is big-endian. Strings are an `i32` byte length followed by
//! UTF-8; arrays are an `i32` count followed by their elements. Decoding
//! untrusted input never panics: structural problems come back as
//! [`DecodeError`] and out-of-range scalars are clamped.
//!
//! # Example
//! ```
//! use fxmark_style::Argb;
//! use fxmark_wire::{ResolvedSpan, decode_spans, encode_spans};
//!
//! let mut span = ResolvedSpan::new("hello");
//! span.color = Some(Argb::rgb(255, 0, 0));
//!
//! let bytes = encode_spans(&[span.clone()]).unwrap();
//! assert_eq!(decode_spans(&bytes).unwrap(), vec![span]);
//! ```

pub mod codec;
pub mod error;
pub mod span;

pub use codec::{Reader, Writer};
pub use error::{DecodeError, EncodeError};
pub use span::{
    ItemAttachment, MAX_COLORS, MAX_CONTENT_BYTES, MAX_ID_BYTES, MAX_ITEM_COUNT, MAX_OFFSET,
    MAX_SPANS, MAX_TAG_BYTES, MAX_TAGS, Overrides, Presence, ResolvedSpan, SCALE_RANGE,
    WireObfuscate, WireShake, WireTypewriter, decode_spans, encode_spans, spans_from_text,
};
