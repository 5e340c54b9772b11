//! Argument model shared by the parser and handler code.
//!
//! Values are kept as the raw text the author wrote (minus quotes and
//! escapes). Handlers decide how to interpret them.

use std::collections::BTreeMap;
use std::iter::Peekable;
use std::str::CharIndices;

use crate::error::{ParseError, Result};

/// One argument as written in a tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
    /// `Some` for `key=value`, `None` for positional values.
    pub name: Option<String>,
    pub value: String,
}

impl Argument {
    pub fn named(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            value: value.into(),
        }
    }

    pub fn positional(value: impl Into<String>) -> Self {
        Self {
            name: None,
            value: value.into(),
        }
    }
}

/// Ordered, immutable snapshot of the arguments of one tag.
///
/// # Lookup rules
///
/// - Named lookup returns the *last* occurrence of a key, so
///   `[tag a=1 a=2]` resolves `a` to `"2"`.
/// - Positional lookup counts only unnamed arguments, in source order.
///
/// ```rust
/// use shortcodes_parser::{Argument, Arguments};
///
/// let args = Arguments::new(vec![
///     Argument::positional("first"),
///     Argument::named("text", "hi"),
///     Argument::positional("second"),
/// ]);
/// assert_eq!(args.named("text"), Some("hi"));
/// assert_eq!(args.at(1), Some("second"));
/// assert_eq!(args.named_or_default("missing", "fallback"), "fallback");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Arguments {
    items: Vec<Argument>,
}

impl Arguments {
    pub fn new(items: Vec<Argument>) -> Self {
        Self { items }
    }

    /// Appends a named argument. Useful when building arguments by hand.
    pub fn with_named(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.items.push(Argument::named(name, value));
        self
    }

    /// Appends a positional argument.
    pub fn with_positional(mut self, value: impl Into<String>) -> Self {
        self.items.push(Argument::positional(value));
        self
    }

    /// Value of the last argument called `name`.
    pub fn named(&self, name: &str) -> Option<&str> {
        self.items
            .iter()
            .rev()
            .find(|arg| arg.name.as_deref() == Some(name))
            .map(|arg| arg.value.as_str())
    }

    pub fn named_or_default<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.named(name).unwrap_or(default)
    }

    /// The `index`-th positional argument, skipping named ones.
    pub fn at(&self, index: usize) -> Option<&str> {
        self.items
            .iter()
            .filter(|arg| arg.name.is_none())
            .nth(index)
            .map(|arg| arg.value.as_str())
    }

    pub fn at_or_default<'a>(&'a self, index: usize, default: &'a str) -> &'a str {
        self.at(index).unwrap_or(default)
    }

    /// Named lookup that falls back to a positional slot.
    ///
    /// Lets `[bold text='hi']` and `[bold 'hi']` mean the same thing.
    pub fn named_or_at(&self, name: &str, index: usize) -> Option<&str> {
        self.named(name).or_else(|| self.at(index))
    }

    /// Named arguments with duplicates collapsed (last wins).
    pub fn named_map(&self) -> BTreeMap<&str, &str> {
        let mut map = BTreeMap::new();
        for arg in &self.items {
            if let Some(name) = &arg.name {
                map.insert(name.as_str(), arg.value.as_str());
            }
        }
        map
    }

    /// Positional values in source order.
    pub fn positional(&self) -> Vec<&str> {
        self.items
            .iter()
            .filter(|arg| arg.name.is_none())
            .map(|arg| arg.value.as_str())
            .collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Argument> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Parses the argument portion of a tag (everything after the name).
    ///
    /// `base` is the byte offset of `src` in the document, used for errors.
    pub(crate) fn parse(src: &str, base: usize) -> Result<Self> {
        ArgumentLexer::new(src, base).collect_all().map(Self::new)
    }
}

impl<'a> IntoIterator for &'a Arguments {
    type Item = &'a Argument;
    type IntoIter = std::slice::Iter<'a, Argument>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl FromIterator<Argument> for Arguments {
    fn from_iter<I: IntoIterator<Item = Argument>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Characters that may follow a backslash inside a quoted value.
pub(crate) fn is_escapable(c: char) -> bool {
    matches!(c, '\'' | '"' | '[' | ']')
}

/// Splits `key=value`, `key='quoted'` and bare tokens.
struct ArgumentLexer<'a> {
    src: &'a str,
    base: usize,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> ArgumentLexer<'a> {
    fn new(src: &'a str, base: usize) -> Self {
        Self {
            src,
            base,
            chars: src.char_indices().peekable(),
        }
    }

    fn collect_all(mut self) -> Result<Vec<Argument>> {
        let mut items = Vec::new();
        while let Some(arg) = self.next_argument()? {
            items.push(arg);
        }
        Ok(items)
    }

    fn next_argument(&mut self) -> Result<Option<Argument>> {
        self.skip_whitespace();
        let Some(&(start, c)) = self.chars.peek() else {
            return Ok(None);
        };

        if c == '\'' || c == '"' {
            let value = self.read_quoted()?;
            return Ok(Some(Argument::positional(value)));
        }

        let token = self.read_until(|c| c.is_whitespace() || c == '=');
        match self.chars.peek() {
            Some(&(_, '=')) => {
                if token.is_empty() {
                    return Err(ParseError::EmptyArgumentName {
                        offset: self.base + start,
                    });
                }
                self.chars.next();
                let value = match self.chars.peek() {
                    Some(&(_, q)) if q == '\'' || q == '"' => self.read_quoted()?,
                    Some(&(_, c)) if !c.is_whitespace() => {
                        self.read_until(char::is_whitespace).to_string()
                    }
                    _ => String::new(),
                };
                Ok(Some(Argument::named(token, value)))
            }
            _ => Ok(Some(Argument::positional(token))),
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.chars.peek(), Some(&(_, c)) if c.is_whitespace()) {
            self.chars.next();
        }
    }

    fn read_until(&mut self, stop: impl Fn(char) -> bool) -> &'a str {
        let start = self.chars.peek().map_or(self.src.len(), |&(i, _)| i);
        let mut end = start;
        while let Some(&(i, c)) = self.chars.peek() {
            if stop(c) {
                break;
            }
            end = i + c.len_utf8();
            self.chars.next();
        }
        &self.src[start..end]
    }

    fn read_quoted(&mut self) -> Result<String> {
        let (start, quote) = self
            .chars
            .next()
            .ok_or(ParseError::UnterminatedQuote { offset: self.base })?;
        let mut value = String::new();
        loop {
            match self.chars.next() {
                None => {
                    return Err(ParseError::UnterminatedQuote {
                        offset: self.base + start,
                    })
                }
                Some((_, '\\')) => match self.chars.peek() {
                    Some(&(_, next)) if is_escapable(next) => {
                        value.push(next);
                        self.chars.next();
                    }
                    _ => value.push('\\'),
                },
                Some((_, c)) if c == quote => return Ok(value),
                Some((_, c)) => value.push(c),
            }
        }
    }
}
