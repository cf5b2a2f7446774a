//! Codec errors.

/// Why a buffer could not be decoded.
///
/// Only structure is rejected: lengths, counts, enum codes, and UTF-8.
/// Out-of-range scalar values are clamped instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The buffer ended inside a field.
    UnexpectedEof { needed: usize, remaining: usize },
    /// A length or element count was negative or above its bound.
    CountOutOfRange {
        field: &'static str,
        count: i64,
        max: usize,
    },
    /// A string field was not valid UTF-8.
    InvalidUtf8 { field: &'static str },
    /// An enum code or presence bit this decoder does not know.
    InvalidEnum { field: &'static str, value: u32 },
    /// Bytes were left over after the last field.
    TrailingBytes { remaining: usize },
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnexpectedEof { needed, remaining } => write!(
                f,
                "unexpected end of input: needed {needed} bytes, {remaining} remaining"
            ),
            Self::CountOutOfRange { field, count, max } => {
                write!(f, "{field}: count {count} outside 0..={max}")
            }
            Self::InvalidUtf8 { field } => write!(f, "{field}: invalid UTF-8"),
            Self::InvalidEnum { field, value } => write!(f, "{field}: unknown value {value:#x}"),
            Self::TrailingBytes { remaining } => {
                write!(f, "{remaining} trailing bytes after last field")
            }
        }
    }
}

impl std::error::Error for DecodeError {}

/// Why a span could not be encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// A string or array exceeds what a decoder accepts.
    TooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },
}

impl std::fmt::Display for EncodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooLong { field, len, max } => {
                write!(f, "{field}: length {len} exceeds {max}")
            }
        }
    }
}

impl std::error::Error for EncodeError {}
