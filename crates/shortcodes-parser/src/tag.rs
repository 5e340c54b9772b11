//! Structured view of a single scanned tag.

use std::ops::Range;

use crate::arguments::Arguments;
use crate::error::{ParseError, Result};
use crate::scanner::{is_name_char, is_valid_tag_name};

/// Whether a tag opens, closes, or stands alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    /// `[name ...]`
    Open,
    /// `[/name]`
    Close,
    /// `[name ... /]`
    SelfClosing,
}

/// One parsed tag occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
    pub kind: TagKind,
    pub arguments: Arguments,
    /// Byte range of the whole `[...]` span in the source text.
    pub range: Range<usize>,
}

impl Tag {
    /// Parses a raw tag span (brackets included) found at `range`.
    ///
    /// The name is the leading identifier. A leading `/` makes a closing
    /// tag, a trailing `/` makes a self-closing one. Everything between is
    /// handed to the argument lexer.
    pub fn parse(raw: &str, range: Range<usize>) -> Result<Self> {
        let offset = range.start;
        let inner = raw
            .strip_prefix('[')
            .and_then(|s| s.strip_suffix(']'))
            .ok_or(ParseError::UnterminatedTag { offset })?;

        if let Some(rest) = inner.strip_prefix('/') {
            let name = rest.trim_end();
            if !is_valid_tag_name(name) {
                return Err(ParseError::InvalidCloseTag {
                    raw: raw.to_string(),
                    offset,
                });
            }
            return Ok(Self {
                name: name.to_string(),
                kind: TagKind::Close,
                arguments: Arguments::default(),
                range,
            });
        }

        let name_len = inner
            .bytes()
            .position(|c| !is_name_char(c))
            .unwrap_or(inner.len());
        let (name, rest) = inner.split_at(name_len);
        let separated = rest
            .chars()
            .next()
            .map_or(true, |c| c.is_whitespace() || c == '/');
        if !is_valid_tag_name(name) || !separated {
            return Err(ParseError::InvalidTagName {
                name: inner.split_whitespace().next().unwrap_or("").to_string(),
                offset,
            });
        }

        let trimmed = rest.trim_end();
        let (body, kind) = match trimmed.strip_suffix('/') {
            Some(body) => (body, TagKind::SelfClosing),
            None => (trimmed, TagKind::Open),
        };
        // +1 for the opening bracket.
        let arguments = Arguments::parse(body, offset + 1 + name_len)?;

        Ok(Self {
            name: name.to_string(),
            kind,
            arguments,
            range,
        })
    }

    pub fn is_open(&self) -> bool {
        self.kind == TagKind::Open
    }

    pub fn is_close(&self) -> bool {
        self.kind == TagKind::Close
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> Tag {
        Tag::parse(raw, 0..raw.len()).expect("tag should parse")
    }

    #[test]
    fn open_tag_with_arguments() {
        let tag = parse("[bold text='hi' 2]");
        assert_eq!(tag.name, "bold");
        assert_eq!(tag.kind, TagKind::Open);
        assert_eq!(tag.arguments.named("text"), Some("hi"));
        assert_eq!(tag.arguments.at(0), Some("2"));
    }

    #[test]
    fn close_tag() {
        let tag = parse("[/bold]");
        assert_eq!(tag.name, "bold");
        assert!(tag.is_close());
        assert!(tag.arguments.is_empty());
    }

    #[test]
    fn close_tag_tolerates_trailing_space() {
        assert!(parse("[/bold  ]").is_close());
    }

    #[test]
    fn close_tag_with_arguments_is_rejected() {
        let err = Tag::parse("[/bold x=1]", 0..11).unwrap_err();
        assert!(matches!(err, ParseError::InvalidCloseTag { .. }));
    }

    #[test]
    fn self_closing_variants() {
        assert_eq!(parse("[br/]").kind, TagKind::SelfClosing);
        assert_eq!(parse("[br /]").kind, TagKind::SelfClosing);
        let tag = parse("[img src='a.png' /]");
        assert_eq!(tag.kind, TagKind::SelfClosing);
        assert_eq!(tag.arguments.named("src"), Some("a.png"));
    }

    #[test]
    fn slash_inside_quotes_is_not_self_closing() {
        let tag = parse("[link url='/']");
        assert_eq!(tag.kind, TagKind::Open);
        assert_eq!(tag.arguments.named("url"), Some("/"));
    }

    #[test]
    fn name_must_be_followed_by_separator() {
        let err = Tag::parse("[bold=x]", 0..8).unwrap_err();
        assert!(matches!(err, ParseError::InvalidTagName { .. }));
    }

    #[test]
    fn duplicate_keys_last_wins() {
        let tag = parse("[tag a=1 a=2]");
        assert_eq!(tag.arguments.named("a"), Some("2"));
    }

    #[test]
    fn argument_errors_carry_document_offsets() {
        let err = Tag::parse("[t =x]", 10..16).unwrap_err();
        assert_eq!(err, ParseError::EmptyArgumentName { offset: 13 });
    }
}
