#![forbid(unsafe_code)]

//! Effect markup for fxmark.
//!
//! The text layer turns a markup string into [`AttributedText`]: the plain
//! text plus nested [`AttributeSpan`]s whose [`Attribute`]s name resolved
//! effects. It also owns the [`LayoutCache`] that memoizes the host's shaped
//! output for a given text and environment.
//!
//! - [`markup`] - tokenizer, tree builder, flattener, [`parse`]
//! - [`resolve`] - [`EffectRegistry`], parameter clamping, [`EffectDescriptor`]
//! - [`params`] - typed [`Params`] map
//! - [`layout_cache`] - [`LayoutCache`] and [`CachedLayout`]
//!
//! # Example
//! ```
//! use fxmark_text::{EffectRegistry, ParseOptions, parse};
//!
//! let registry = EffectRegistry::builtin();
//! let text = parse("say <shake a=2>hi</shake>!", &registry, &ParseOptions::default());
//! assert_eq!(text.raw_text(), "say hi!");
//! assert_eq!(text.attributes_at(4)[0].id, "shake");
//! assert!(text.attributes_at(6).is_empty());
//! ```

pub mod attributed;
pub mod layout_cache;
pub mod markup;
pub mod params;
pub mod resolve;

pub use attributed::{Attribute, AttributeSpan, AttributedText, Run};
pub use layout_cache::{CacheKey, CacheStats, CachedLayout, LayoutCache};
pub use markup::{MarkupNode, ParseOptions, Token, build_tree, flatten, parse, parse_with, tokenize};
pub use params::{ParamValue, Params};
pub use resolve::{
    Alphabet, EffectDescriptor, EffectRegistry, GradientSpec, ObfuscateMode, ObfuscateSpec,
    ParamSpec, RainbowSpec, RevealDirection, ShakeKind, ShakeSpec, StyleToggle, TagResolver,
    TypewriterSpec, style_of,
};
