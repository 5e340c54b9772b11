//! Error types for shortcode parsing.
//!
//! None of these errors abort a document. The scanner and the evaluator
//! recover from every one of them by echoing the offending span as literal
//! text; the error value is only reported so callers can surface it.

use thiserror::Error;

/// A malformed or unbalanced piece of shortcode markup.
///
/// Offsets are byte offsets into the scanned document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A tag was opened with `[` but the input ended before its `]`.
    #[error("unterminated tag starting at byte {offset}")]
    UnterminatedTag { offset: usize },

    /// A quoted argument value was never closed.
    #[error("unterminated quoted value starting at byte {offset}")]
    UnterminatedQuote { offset: usize },

    /// An unquoted `[` appeared inside a tag.
    #[error("unexpected '[' inside tag at byte {offset}")]
    UnexpectedBracket { offset: usize },

    /// The tag name is not a valid identifier.
    #[error("invalid tag name '{name}' at byte {offset}")]
    InvalidTagName { name: String, offset: usize },

    /// A closing tag carried something other than its name.
    #[error("invalid closing tag '{raw}' at byte {offset}")]
    InvalidCloseTag { raw: String, offset: usize },

    /// An `=` without a key in front of it.
    #[error("argument without a name in tag at byte {offset}")]
    EmptyArgumentName { offset: usize },

    /// An opening tag with no matching closing tag, echoed verbatim.
    #[error("tag '{name}' at byte {offset} is never closed")]
    UnclosedTag { name: String, offset: usize },

    /// Paired tags nested beyond the configured limit.
    #[error("tag '{name}' at byte {offset} exceeds the nesting limit of {limit}")]
    NestingTooDeep {
        name: String,
        offset: usize,
        limit: usize,
    },
}

impl ParseError {
    /// Byte offset in the document where the problem was detected.
    pub fn offset(&self) -> usize {
        match self {
            ParseError::UnterminatedTag { offset }
            | ParseError::UnterminatedQuote { offset }
            | ParseError::UnexpectedBracket { offset }
            | ParseError::InvalidTagName { offset, .. }
            | ParseError::InvalidCloseTag { offset, .. }
            | ParseError::EmptyArgumentName { offset }
            | ParseError::UnclosedTag { offset, .. }
            | ParseError::NestingTooDeep { offset, .. } => *offset,
        }
    }
}

/// Result type for parser operations.
pub type Result<T> = std::result::Result<T, ParseError>;
