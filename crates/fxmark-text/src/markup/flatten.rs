//! Tree to [`AttributedText`] flattening.

use tracing::debug;

use super::tree::MarkupNode;
use crate::attributed::{Attribute, AttributeSpan, AttributedText};
use crate::params::Params;
use crate::resolve::EffectRegistry;

/// Flatten a markup tree, resolving every element through `registry`.
///
/// A span is recorded for each element that contributes at least one
/// attribute and covers at least one character. Its chain is every
/// enclosing element's attributes, outermost first. Elements covering the
/// exact same range collapse into the innermost span.
#[must_use]
pub fn flatten(nodes: &[MarkupNode], registry: &EffectRegistry) -> AttributedText {
    flatten_logged(nodes, registry, false)
}

pub(crate) fn flatten_logged(
    nodes: &[MarkupNode],
    registry: &EffectRegistry,
    log_unknown_tags: bool,
) -> AttributedText {
    let mut flattener = Flattener {
        registry,
        log_unknown_tags,
        raw: String::new(),
        offset: 0,
        chain: Vec::new(),
        spans: Vec::new(),
    };
    flattener.walk(nodes);

    let Flattener { raw, mut spans, .. } = flattener;
    spans.sort_by_key(|span| (span.start, span.end));
    spans.dedup_by(|later, earlier| later.start == earlier.start && later.end == earlier.end);
    AttributedText::new(raw, spans)
}

struct Flattener<'r> {
    registry: &'r EffectRegistry,
    log_unknown_tags: bool,
    raw: String,
    offset: usize,
    chain: Vec<Attribute>,
    spans: Vec<AttributeSpan>,
}

impl Flattener<'_> {
    fn walk(&mut self, nodes: &[MarkupNode]) {
        for node in nodes {
            match node {
                MarkupNode::Text(text) => {
                    self.raw.push_str(text);
                    self.offset += text.chars().count();
                }
                MarkupNode::Element {
                    tag,
                    attrs,
                    children,
                } => {
                    let start = self.offset;
                    let end = start + node.char_len();
                    let params = Params::from_raw(attrs.iter().map(|(k, v)| (k.as_str(), v.as_str())));

                    let contributed = match self.registry.resolve(tag, &params, &self.chain) {
                        Some(attributes) => attributes,
                        None => {
                            if self.log_unknown_tags {
                                debug!(tag = %tag, "unknown tag, children kept unattached");
                            }
                            Vec::new()
                        }
                    };

                    let base = self.chain.len();
                    self.chain
                        .extend(contributed.into_iter().map(|a| a.with_extent(start..end)));
                    self.walk(children);

                    if self.chain.len() > base && end > start {
                        self.spans.push(AttributeSpan {
                            start,
                            end,
                            attributes: self.chain.clone(),
                        });
                    }
                    self.chain.truncate(base);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::token::tokenize;
    use crate::markup::tree::build_tree;

    fn flat(src: &str) -> AttributedText {
        flatten(&build_tree(tokenize(src), 16), &EffectRegistry::builtin())
    }

    fn ids(attrs: &[Attribute]) -> Vec<&str> {
        attrs.iter().map(|a| a.id.as_str()).collect()
    }

    #[test]
    fn identical_ranges_collapse_to_innermost() {
        let text = flat("<bold><italic>Hi</italic></bold>");
        assert_eq!(text.spans().len(), 1);
        assert_eq!(ids(&text.spans()[0].attributes), ["bold", "italic"]);
    }

    #[test]
    fn nested_spans_carry_outer_chain() {
        let text = flat("<bold>a<italic>b</italic>c</bold>");
        assert_eq!(text.raw_text(), "abc");
        assert_eq!(text.spans().len(), 2);
        assert_eq!(ids(text.attributes_at(0)), ["bold"]);
        assert_eq!(ids(text.attributes_at(1)), ["bold", "italic"]);
        assert_eq!(ids(text.attributes_at(2)), ["bold"]);
    }

    #[test]
    fn extents_follow_owning_element() {
        let text = flat("x<typewriter>ab<bold>cd</bold></typewriter>");
        let chain = text.attributes_at(4);
        assert_eq!(chain[0].id, "typewriter");
        assert_eq!(chain[0].extent, 1..5);
        assert_eq!(chain[1].extent, 3..5);
        assert_eq!(chain[0].local_index(4), 3);
    }

    #[test]
    fn containers_and_unknown_tags_record_no_span() {
        let text = flat("<span>a</span><mystery k=v>b</mystery>");
        assert_eq!(text.raw_text(), "ab");
        assert!(text.is_plain());
    }

    #[test]
    fn empty_elements_record_no_span() {
        let text = flat("a<bold></bold>b");
        assert!(text.is_plain());
    }
}
