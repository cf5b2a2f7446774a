//! Inline effect markup.
//!
//! # Syntax
//!
//! - `<name>text</name>` - element; names are case-insensitive
//! - `<name k=v k="quoted v" flag>` - attributes; a bare key means `true`
//! - `<name=v>` - shorthand for `<name value=v>`
//! - `<name/>` - self-closing element
//! - `\<` and `\\` - literal `<` and `\`
//! - `&lt;` `&gt;` `&amp;` - decoded exactly once
//!
//! Parsing never fails. Malformed tags stay in the text, unmatched closers
//! are kept verbatim, input past the length limit is dropped, and tags past
//! the depth limit are skipped while their content is kept.
//!
//! # Example
//! ```
//! use fxmark_text::markup::{ParseOptions, parse};
//! use fxmark_text::resolve::EffectRegistry;
//!
//! let registry = EffectRegistry::builtin();
//! let text = parse(
//!     "<bold><color value=#ff0000>Hi</color></bold>",
//!     &registry,
//!     &ParseOptions::default(),
//! );
//! assert_eq!(text.raw_text(), "Hi");
//! assert_eq!(text.spans().len(), 1);
//! let ids: Vec<_> = text.spans()[0].attributes.iter().map(|a| a.id.as_str()).collect();
//! assert_eq!(ids, ["bold", "color"]);
//! ```

mod flatten;
mod token;
mod tree;

pub use flatten::flatten;
pub use token::{SHORTHAND_KEY, Tag, TagKind, Token, tokenize};
pub use tree::{MarkupNode, build_tree};

use fxmark_core::{DEFAULT_MAX_NESTING_DEPTH, DEFAULT_MAX_PARSE_LENGTH, EffectConfig};
use tracing::{debug, trace};

use crate::attributed::AttributedText;
use crate::resolve::EffectRegistry;

/// Limits and logging switches for [`parse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Characters read before the rest of the input is dropped.
    pub max_length: usize,
    /// Elements that may be open at once.
    pub max_depth: usize,
    /// Log tags no resolver is registered for.
    pub log_unknown_tags: bool,
    /// Log tags skipped for exceeding `max_depth`.
    pub log_depth_skips: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_length: DEFAULT_MAX_PARSE_LENGTH,
            max_depth: DEFAULT_MAX_NESTING_DEPTH,
            log_unknown_tags: false,
            log_depth_skips: true,
        }
    }
}

impl ParseOptions {
    /// Limits taken from an [`EffectConfig`].
    #[must_use]
    pub fn from_config(config: &EffectConfig) -> Self {
        Self {
            max_length: config.max_parse_length,
            max_depth: config.max_nesting_depth,
            ..Self::default()
        }
    }

    /// Set the length limit.
    #[must_use]
    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    /// Set the depth limit.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Toggle unknown-tag logging.
    #[must_use]
    pub fn with_unknown_tag_logging(mut self, enabled: bool) -> Self {
        self.log_unknown_tags = enabled;
        self
    }
}

/// Parse markup into [`AttributedText`].
#[must_use]
pub fn parse(source: &str, registry: &EffectRegistry, options: &ParseOptions) -> AttributedText {
    parse_with(source, registry, options, false)
}

/// Parse markup, or pass `source` through as plain text when the caller is
/// already inside a parse of the same text.
#[must_use]
pub fn parse_with(
    source: &str,
    registry: &EffectRegistry,
    options: &ParseOptions,
    already_processing: bool,
) -> AttributedText {
    if already_processing {
        trace!("reentrant parse, returning plain text");
        return AttributedText::plain(source);
    }

    let source = match source.char_indices().nth(options.max_length) {
        Some((cut, _)) => {
            debug!(
                length = source.chars().count(),
                max_length = options.max_length,
                "markup truncated"
            );
            &source[..cut]
        }
        None => source,
    };

    let nodes = tree::build_tree_logged(tokenize(source), options.max_depth, options.log_depth_skips);
    flatten::flatten_logged(&nodes, registry, options.log_unknown_tags)
}
