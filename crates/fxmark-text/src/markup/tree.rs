//! Tree construction from a token stream.
//!
//! An explicit stack of open elements receives pushes on open tags. A
//! closing tag is matched against the whole stack: on a match every element
//! above it is auto-closed and the match is closed; with no match the stack
//! is untouched and the closer stays in the text verbatim. End of input
//! closes whatever is still open.

use tracing::debug;

use super::token::{TagKind, Token};

/// A node of the parsed markup tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupNode {
    /// Literal text.
    Text(String),
    /// A tagged element and its children.
    Element {
        /// Lowercased tag name.
        tag: String,
        /// Raw attributes in source order.
        attrs: Vec<(String, String)>,
        /// Child nodes.
        children: Vec<MarkupNode>,
    },
}

impl MarkupNode {
    /// Number of text characters under this node.
    #[must_use]
    pub fn char_len(&self) -> usize {
        match self {
            Self::Text(text) => text.chars().count(),
            Self::Element { children, .. } => children.iter().map(Self::char_len).sum(),
        }
    }
}

#[derive(Debug)]
enum Open {
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
        children: Vec<MarkupNode>,
    },
    /// Opened past the depth limit; content flows to the parent and the
    /// matching closer is swallowed.
    Skipped { tag: String },
}

impl Open {
    fn tag(&self) -> &str {
        match self {
            Self::Element { tag, .. } | Self::Skipped { tag } => tag,
        }
    }
}

/// Build a tree, honoring at most `max_depth` nested elements.
#[must_use]
pub fn build_tree(tokens: Vec<Token>, max_depth: usize) -> Vec<MarkupNode> {
    build_tree_logged(tokens, max_depth, false)
}

pub(crate) fn build_tree_logged(
    tokens: Vec<Token>,
    max_depth: usize,
    log_depth_skips: bool,
) -> Vec<MarkupNode> {
    let mut root: Vec<MarkupNode> = Vec::new();
    let mut stack: Vec<Open> = Vec::new();
    let mut depth = 0usize;

    for token in tokens {
        match token {
            Token::Text(text) => push_text(sink(&mut stack, &mut root), &text),
            Token::Tag(tag) => match tag.kind {
                TagKind::Open | TagKind::SelfClosing if depth >= max_depth => {
                    if log_depth_skips {
                        debug!(tag = %tag.name, depth, max_depth, "nesting too deep, tag skipped");
                    }
                    if tag.kind == TagKind::Open {
                        stack.push(Open::Skipped { tag: tag.name });
                    }
                }
                TagKind::Open => {
                    depth += 1;
                    stack.push(Open::Element {
                        tag: tag.name,
                        attrs: tag.attrs,
                        children: Vec::new(),
                    });
                }
                TagKind::SelfClosing => {
                    sink(&mut stack, &mut root).push(MarkupNode::Element {
                        tag: tag.name,
                        attrs: tag.attrs,
                        children: Vec::new(),
                    });
                }
                TagKind::Close => match stack.iter().rposition(|open| open.tag() == tag.name) {
                    Some(pos) => {
                        while stack.len() > pos {
                            close_top(&mut stack, &mut root, &mut depth);
                        }
                    }
                    None => push_text(sink(&mut stack, &mut root), &tag.source),
                },
            },
        }
    }

    while !stack.is_empty() {
        close_top(&mut stack, &mut root, &mut depth);
    }
    root
}

/// Children list of the innermost real element, or the root.
fn sink<'a>(stack: &'a mut [Open], root: &'a mut Vec<MarkupNode>) -> &'a mut Vec<MarkupNode> {
    for open in stack.iter_mut().rev() {
        if let Open::Element { children, .. } = open {
            return children;
        }
    }
    root
}

fn push_text(children: &mut Vec<MarkupNode>, text: &str) {
    if text.is_empty() {
        return;
    }
    match children.last_mut() {
        Some(MarkupNode::Text(prev)) => prev.push_str(text),
        _ => children.push(MarkupNode::Text(text.to_string())),
    }
}

fn close_top(stack: &mut Vec<Open>, root: &mut Vec<MarkupNode>, depth: &mut usize) {
    match stack.pop() {
        Some(Open::Element {
            tag,
            attrs,
            children,
        }) => {
            *depth -= 1;
            sink(stack, root).push(MarkupNode::Element {
                tag,
                attrs,
                children,
            });
        }
        Some(Open::Skipped { .. }) | None => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::token::tokenize;

    fn tree(src: &str) -> Vec<MarkupNode> {
        build_tree(tokenize(src), 16)
    }

    fn text(s: &str) -> MarkupNode {
        MarkupNode::Text(s.to_string())
    }

    fn el(tag: &str, children: Vec<MarkupNode>) -> MarkupNode {
        MarkupNode::Element {
            tag: tag.to_string(),
            attrs: Vec::new(),
            children,
        }
    }

    #[test]
    fn nested_elements() {
        assert_eq!(
            tree("a<b>x<i>y</i></b>z"),
            vec![text("a"), el("b", vec![text("x"), el("i", vec![text("y")])]), text("z")]
        );
    }

    #[test]
    fn unmatched_closer_is_literal() {
        assert_eq!(tree("Hello</oops>"), vec![text("Hello</oops>")]);
    }

    #[test]
    fn unmatched_closer_inside_element_keeps_stack() {
        assert_eq!(
            tree("<b>x</i>y</b>"),
            vec![el("b", vec![text("x</i>y")])]
        );
    }

    #[test]
    fn mismatched_closer_auto_closes_intervening() {
        assert_eq!(
            tree("<b>x<i>y</b>z"),
            vec![el("b", vec![text("x"), el("i", vec![text("y")])]), text("z")]
        );
    }

    #[test]
    fn end_of_input_closes_everything() {
        assert_eq!(
            tree("<b><i>open"),
            vec![el("b", vec![el("i", vec![text("open")])])]
        );
    }

    #[test]
    fn self_closing_has_no_children() {
        assert_eq!(tree("a<br/>b"), vec![text("a"), el("br", vec![]), text("b")]);
    }

    #[test]
    fn depth_overrun_keeps_content_and_swallows_closer() {
        let nodes = build_tree(tokenize("<a><b><c>deep</c></b></a>"), 2);
        assert_eq!(nodes, vec![el("a", vec![el("b", vec![text("deep")])])]);
    }

    #[test]
    fn depth_zero_flattens_to_text() {
        let nodes = build_tree(tokenize("<a>x</a>y"), 0);
        assert_eq!(nodes, vec![text("xy")]);
    }

    #[test]
    fn char_len_counts_text_only() {
        let nodes = tree("<b>héllo<i>!</i></b>");
        assert_eq!(nodes[0].char_len(), 6);
    }
}
