//! Flattened markup: raw text plus ordered attribute spans.
//!
//! Offsets are counted in `char`s. Spans nest: any two spans are either
//! disjoint or one contains the other, and each span's attribute chain
//! already contains the attributes of every span enclosing it (outermost
//! first). Looking up the innermost span for an offset is therefore enough
//! to know everything that applies there.

use std::ops::Range;

use crate::params::Params;

/// A resolved tag: canonical effect id plus normalized parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    /// Canonical (lowercase, alias-resolved) effect name.
    pub id: String,
    /// Normalized parameters.
    pub params: Params,
    /// Character range of the element this attribute came from.
    pub extent: Range<usize>,
}

impl Attribute {
    /// Create an attribute with an empty extent.
    #[must_use]
    pub fn new(id: impl Into<String>, params: Params) -> Self {
        Self {
            id: id.into(),
            params,
            extent: 0..0,
        }
    }

    /// Set the element extent.
    #[must_use]
    pub fn with_extent(mut self, extent: Range<usize>) -> Self {
        self.extent = extent;
        self
    }

    /// Number of characters under the owning element.
    #[inline]
    #[must_use]
    pub fn extent_len(&self) -> usize {
        self.extent.end.saturating_sub(self.extent.start)
    }

    /// Index of `char_index` relative to the owning element.
    #[inline]
    #[must_use]
    pub fn local_index(&self, char_index: usize) -> usize {
        char_index.saturating_sub(self.extent.start)
    }
}

/// A contiguous character range sharing one attribute chain.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeSpan {
    /// First character covered.
    pub start: usize,
    /// One past the last character covered.
    pub end: usize,
    /// Attributes, outermost first.
    pub attributes: Vec<Attribute>,
}

impl AttributeSpan {
    /// Whether the span governs `index`.
    #[inline]
    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        self.start <= index && index < self.end
    }

    /// Characters covered.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// True when the span covers nothing.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// A maximal run of characters governed by the same attribute chain.
#[derive(Debug, Clone, PartialEq)]
pub struct Run<'a> {
    /// Character range of the run.
    pub range: Range<usize>,
    /// The run's text.
    pub text: &'a str,
    /// Governing attributes, outermost first (empty for plain text).
    pub attributes: &'a [Attribute],
}

/// Raw text plus the spans that decorate it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributedText {
    raw: String,
    char_len: usize,
    spans: Vec<AttributeSpan>,
}

impl AttributedText {
    /// Text with no attributes.
    #[must_use]
    pub fn plain(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let char_len = raw.chars().count();
        Self {
            raw,
            char_len,
            spans: Vec::new(),
        }
    }

    /// Build from parts. Spans are clamped to the text, sorted by
    /// `(start, end)`, and empty spans are dropped.
    #[must_use]
    pub fn new(raw: impl Into<String>, spans: Vec<AttributeSpan>) -> Self {
        let raw = raw.into();
        let char_len = raw.chars().count();
        let mut spans: Vec<AttributeSpan> = spans
            .into_iter()
            .map(|mut span| {
                span.end = span.end.min(char_len);
                span.start = span.start.min(span.end);
                span
            })
            .filter(|span| !span.is_empty())
            .collect();
        spans.sort_by_key(|span| (span.start, span.end));
        Self {
            raw,
            char_len,
            spans,
        }
    }

    /// The text with all markup removed.
    #[must_use]
    pub fn raw_text(&self) -> &str {
        &self.raw
    }

    /// Length in characters.
    #[must_use]
    pub fn char_len(&self) -> usize {
        self.char_len
    }

    /// True when there is no text.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.char_len == 0
    }

    /// Spans, sorted by `(start, end)`.
    #[must_use]
    pub fn spans(&self) -> &[AttributeSpan] {
        &self.spans
    }

    /// True when no span decorates the text.
    #[must_use]
    pub fn is_plain(&self) -> bool {
        self.spans.is_empty()
    }

    /// Index of the innermost span governing `index`.
    #[must_use]
    pub fn span_index_at(&self, index: usize) -> Option<usize> {
        let upto = self.spans.partition_point(|span| span.start <= index);
        self.spans[..upto]
            .iter()
            .enumerate()
            .filter(|(_, span)| span.contains(index))
            .min_by_key(|(_, span)| span.len())
            .map(|(i, _)| i)
    }

    /// Attribute chain governing `index`, outermost first.
    #[must_use]
    pub fn attributes_at(&self, index: usize) -> &[Attribute] {
        self.span_index_at(index)
            .map(|i| self.spans[i].attributes.as_slice())
            .unwrap_or_default()
    }

    /// Maximal runs of characters sharing one attribute chain, in order.
    #[must_use]
    pub fn runs(&self) -> Vec<Run<'_>> {
        if self.char_len == 0 {
            return Vec::new();
        }

        let mut bounds: Vec<usize> = Vec::with_capacity(self.spans.len() * 2 + 2);
        bounds.push(0);
        bounds.push(self.char_len);
        for span in &self.spans {
            bounds.push(span.start);
            bounds.push(span.end);
        }
        bounds.sort_unstable();
        bounds.dedup();

        let byte_at = self.byte_offsets();
        let mut runs: Vec<(Range<usize>, Option<usize>)> = Vec::new();
        for pair in bounds.windows(2) {
            let (start, end) = (pair[0], pair[1]);
            let owner = self.span_index_at(start);
            match runs.last_mut() {
                Some((range, prev)) if *prev == owner => range.end = end,
                _ => runs.push((start..end, owner)),
            }
        }

        runs.into_iter()
            .map(|(range, owner)| Run {
                text: &self.raw[byte_at[range.start]..byte_at[range.end]],
                attributes: owner
                    .map(|i| self.spans[i].attributes.as_slice())
                    .unwrap_or_default(),
                range,
            })
            .collect()
    }

    /// Byte offset of every char boundary, including the end.
    fn byte_offsets(&self) -> Vec<usize> {
        let mut offsets: Vec<usize> = self.raw.char_indices().map(|(b, _)| b).collect();
        offsets.push(self.raw.len());
        offsets
    }
}
