//! A scanned document with opening and closing tags paired up.
//!
//! Pairing works like a bracket matcher with names: a closing tag matches
//! the nearest still-open tag of the same name. Any open tags skipped over
//! on the way stay unpaired. Closing tags with nothing to match stay
//! unpaired too. The evaluator decides what unpaired tags mean.

use crate::error::ParseError;
use crate::scanner::{Scanner, Segment};
use crate::tag::{Tag, TagKind};

/// One node of a parsed document, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node<'a> {
    Text(&'a str),
    /// A span echoed verbatim because it could not be parsed.
    Malformed { raw: &'a str, error: ParseError },
    /// A tag. `partner` is the index of the matching open/close node.
    Tag { tag: Tag, partner: Option<usize> },
}

/// The flat, paired node list for one input string.
#[derive(Debug, Clone)]
pub struct Document<'a> {
    source: &'a str,
    nodes: Vec<Node<'a>>,
}

impl<'a> Document<'a> {
    /// Scans and parses `source`. Never fails; problems become
    /// [`Node::Malformed`] entries.
    pub fn parse(source: &'a str) -> Self {
        let mut nodes = Vec::new();
        for segment in Scanner::new(source) {
            let node = match segment {
                Segment::Literal(text) => Node::Text(text),
                Segment::Malformed { raw, error } => Node::Malformed { raw, error },
                Segment::TagMarker { raw, range } => match Tag::parse(raw, range) {
                    Ok(tag) => Node::Tag { tag, partner: None },
                    Err(error) => Node::Malformed { raw, error },
                },
            };
            nodes.push(node);
        }
        pair_tags(&mut nodes);
        Self { source, nodes }
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    pub fn nodes(&self) -> &[Node<'a>] {
        &self.nodes
    }

    /// The original text of a tag.
    pub fn raw(&self, tag: &Tag) -> &'a str {
        &self.source[tag.range.clone()]
    }

    /// Parse errors found while scanning.
    pub fn errors(&self) -> impl Iterator<Item = &ParseError> {
        self.nodes.iter().filter_map(|node| match node {
            Node::Malformed { error, .. } => Some(error),
            _ => None,
        })
    }

    /// True when the document holds no tags at all, valid or not.
    pub fn is_plain_text(&self) -> bool {
        self.nodes.iter().all(|node| matches!(node, Node::Text(_)))
    }
}

fn pair_tags(nodes: &mut [Node<'_>]) {
    let mut open: Vec<usize> = Vec::new();
    for index in 0..nodes.len() {
        let (kind, name) = match &nodes[index] {
            Node::Tag { tag, .. } => (tag.kind, tag.name.clone()),
            _ => continue,
        };
        match kind {
            TagKind::Open => open.push(index),
            TagKind::SelfClosing => {}
            TagKind::Close => {
                let found = open.iter().rposition(|&candidate| {
                    matches!(&nodes[candidate], Node::Tag { tag, .. } if tag.name == name)
                });
                if let Some(position) = found {
                    let opener = open[position];
                    open.truncate(position);
                    set_partner(&mut nodes[opener], index);
                    set_partner(&mut nodes[index], opener);
                }
            }
        }
    }
}

fn set_partner(node: &mut Node<'_>, index: usize) {
    if let Node::Tag { partner, .. } = node {
        *partner = Some(index);
    }
}
