//! Tokenizer and tag parser for bracket-delimited shortcodes.
//!
//! This crate turns text such as `[bold text='x']content[/bold]` into a flat
//! list of nodes an evaluator can walk. It does no evaluation itself and
//! never fails: anything it cannot make sense of is kept as literal text and
//! reported as a [`ParseError`].
//!
//! # Example
//!
//! ```rust
//! use shortcodes_parser::{Document, Node, TagKind};
//!
//! let doc = Document::parse("Hi [bold text='x']content[/bold]!");
//! let nodes = doc.nodes();
//! assert_eq!(nodes.len(), 5);
//!
//! match &nodes[1] {
//!     Node::Tag { tag, partner } => {
//!         assert_eq!(tag.name, "bold");
//!         assert_eq!(tag.kind, TagKind::Open);
//!         assert_eq!(tag.arguments.named("text"), Some("x"));
//!         assert_eq!(*partner, Some(3));
//!     }
//!     other => panic!("unexpected node {:?}", other),
//! }
//! ```
//!
//! # Grammar
//!
//! - A tag starts at `[` followed by a name character, or by `/` and a name
//!   character. Other brackets are plain text.
//! - Names follow `[A-Za-z_][A-Za-z0-9_-]*` and are case-sensitive.
//! - `[/name]` closes, `[name ... /]` is self-closing.
//! - Arguments are `key=value`, `key='quoted value'`, `key="quoted"` or bare
//!   positional tokens. Repeated keys resolve to the last occurrence.
//! - Inside quotes, `\'`, `\"`, `\[` and `\]` escape the character. No other
//!   escapes exist; a lone backslash is kept.
//! - A tag ends at the first `]` outside quotes.

mod arguments;
mod document;
mod error;
mod scanner;
mod tag;

pub use arguments::{Argument, Arguments};
pub use document::{Document, Node};
pub use error::{ParseError, Result};
pub use scanner::{is_valid_tag_name, Scanner, Segment};
pub use tag::{Tag, TagKind};
