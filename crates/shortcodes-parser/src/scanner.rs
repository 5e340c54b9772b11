//! Left-to-right scanner splitting text into literal spans and tag spans.

use std::ops::Range;

use crate::arguments::is_escapable;
use crate::error::ParseError;

/// One piece of scanned input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Plain text, copied verbatim.
    Literal(&'a str),
    /// A complete `[...]` span, brackets included.
    TagMarker { raw: &'a str, range: Range<usize> },
    /// A span that looked like a tag but could not be scanned.
    /// It is echoed as literal text.
    Malformed { raw: &'a str, error: ParseError },
}

/// Checks whether `c` may start a tag name.
pub fn is_name_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}

/// Checks whether `c` may continue a tag name.
pub fn is_name_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_' || c == b'-'
}

/// Checks if a string is a valid tag name.
///
/// Names start with an ASCII letter or underscore and continue with letters,
/// digits, underscores or hyphens. They are case-sensitive.
pub fn is_valid_tag_name(s: &str) -> bool {
    let bytes = s.as_bytes();
    match bytes.split_first() {
        Some((first, rest)) => is_name_start(*first) && rest.iter().all(|c| is_name_char(*c)),
        None => false,
    }
}

/// Tokenizer for shortcode markup.
///
/// A `[` opens a tag only when followed by a name character (or by `/` and a
/// name character). Any other bracket is literal text.
pub struct Scanner<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    /// Finds the next byte offset at or after `from` where a tag may start.
    fn next_tag_start(&self, from: usize) -> Option<usize> {
        let bytes = self.input.as_bytes();
        let mut search = from;
        while let Some(offset) = self.input[search..].find('[') {
            let at = search + offset;
            let next = bytes.get(at + 1).copied();
            let opens = match next {
                Some(b'/') => bytes.get(at + 2).is_some_and(|c| is_name_start(*c)),
                Some(c) => is_name_start(c),
                None => false,
            };
            if opens {
                return Some(at);
            }
            search = at + 1;
        }
        None
    }

    /// Scans from the `[` at `start` to the end of the tag.
    ///
    /// Returns the exclusive end offset, or the error together with the
    /// offset where scanning should resume.
    fn scan_tag(&self, start: usize) -> Result<usize, (ParseError, usize)> {
        let bytes = self.input.as_bytes();
        let mut i = start + 1;
        if bytes.get(i) == Some(&b'/') {
            i += 1;
        }
        while bytes.get(i).is_some_and(|c| is_name_char(*c)) {
            i += 1;
        }

        let mut value_start = false;
        loop {
            let Some(&c) = bytes.get(i) else {
                return Err((
                    ParseError::UnterminatedTag { offset: start },
                    self.input.len(),
                ));
            };
            match c {
                b']' => return Ok(i + 1),
                b'[' => return Err((ParseError::UnexpectedBracket { offset: i }, i)),
                b'\'' | b'"' if value_start => {
                    i = self.skip_quoted(i)?;
                    value_start = false;
                }
                b'=' => {
                    value_start = true;
                    i += 1;
                }
                c if c.is_ascii_whitespace() => {
                    value_start = true;
                    i += 1;
                }
                _ => {
                    value_start = false;
                    i += 1;
                }
            }
        }
    }

    /// Skips a quoted value starting at `open`, returning the offset after
    /// the closing quote.
    ///
    /// An unterminated quote ends the malformed span at the first `]` after
    /// it, so later tags are still scanned.
    fn skip_quoted(&self, open: usize) -> Result<usize, (ParseError, usize)> {
        let bytes = self.input.as_bytes();
        let quote = bytes[open];
        let mut i = open + 1;
        while let Some(&c) = bytes.get(i) {
            if c == b'\\' && bytes.get(i + 1).is_some_and(|n| is_escapable(*n as char)) {
                i += 2;
            } else if c == quote {
                return Ok(i + 1);
            } else {
                i += 1;
            }
        }
        let resume = self.input[open..]
            .find(']')
            .map_or(self.input.len(), |close| open + close + 1);
        Err((ParseError::UnterminatedQuote { offset: open }, resume))
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Segment<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.input.len() {
            return None;
        }

        let Some(start) = self.next_tag_start(self.pos) else {
            let text = &self.input[self.pos..];
            self.pos = self.input.len();
            return Some(Segment::Literal(text));
        };

        if start > self.pos {
            let text = &self.input[self.pos..start];
            self.pos = start;
            return Some(Segment::Literal(text));
        }

        match self.scan_tag(start) {
            Ok(end) => {
                self.pos = end;
                Some(Segment::TagMarker {
                    raw: &self.input[start..end],
                    range: start..end,
                })
            }
            Err((error, resume)) => {
                self.pos = resume;
                Some(Segment::Malformed {
                    raw: &self.input[start..resume],
                    error,
                })
            }
        }
    }
}
