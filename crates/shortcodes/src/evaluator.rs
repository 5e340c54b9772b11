//! The evaluation pass.
//!
//! The evaluator walks a parsed [`Document`] once, left to right, keeping an
//! explicit stack of open paired tags instead of recursing. Each frame
//! collects the evaluated content of its tag, so by the time a closing tag
//! is reached its content is already expanded and the handler sees output,
//! never raw markup. Depth therefore costs heap, not call stack, and
//! `max_nesting_depth` bounds it.
//!
//! Handlers run one at a time in source order. Everything that goes wrong
//! inside a document is isolated to its tag and reported as a
//! [`Diagnostic`]:
//!
//! | Condition | Output |
//! |-----------|--------|
//! | Malformed tag | Echoed verbatim |
//! | Unknown tag | Echoed verbatim, content still evaluated |
//! | Unclosed tag | Standalone call or echo, per [`UnclosedTagBehavior`]; reported either way |
//! | Orphan closing tag | Echoed verbatim |
//! | Handler error | [`FailureBehavior`](crate::FailureBehavior) replacement |
//!
//! Only cancellation and timeouts stop the pass; see [`EvaluateError`].

use std::future::Future;

use shortcodes_parser::{Document, Node, ParseError, Tag, TagKind};
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::cancellation::Cancellation;
use crate::config::{EngineConfig, UnclosedTagBehavior};
use crate::context::Context;
use crate::error::EvaluateError;
use crate::table::ShortcodeTable;

/// A non-fatal problem found while evaluating one document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Diagnostic {
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// No descriptor answers to this tag name.
    #[error("unknown shortcode '{name}' at byte {offset}")]
    Unresolved { name: String, offset: usize },

    #[error("shortcode '{name}' at byte {offset} failed: {message}")]
    HandlerFailed {
        name: String,
        offset: usize,
        message: String,
    },
}

/// Output of one evaluate call together with its diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evaluation {
    pub output: String,
    pub diagnostics: Vec<Diagnostic>,
}

impl Evaluation {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
enum Interrupt {
    Cancelled,
    TimedOut,
}

/// An open paired tag whose content is being collected.
struct Frame {
    node: usize,
    buffer: String,
}

/// Runs one document against a table.
pub struct Evaluator<'a> {
    table: &'a ShortcodeTable,
    config: &'a EngineConfig,
    cancellation: Option<&'a Cancellation>,
    deadline: Option<Instant>,
}

impl<'a> Evaluator<'a> {
    pub fn new(table: &'a ShortcodeTable, config: &'a EngineConfig) -> Self {
        Self {
            table,
            config,
            cancellation: None,
            deadline: None,
        }
    }

    pub fn with_cancellation(mut self, cancellation: &'a Cancellation) -> Self {
        self.cancellation = Some(cancellation);
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub async fn evaluate(
        &self,
        input: &str,
        ctx: &mut Context,
    ) -> Result<Evaluation, EvaluateError> {
        let doc = Document::parse(input);
        if doc.is_plain_text() {
            return Ok(Evaluation {
                output: input.to_string(),
                diagnostics: Vec::new(),
            });
        }

        let nodes = doc.nodes();
        let mut root = String::with_capacity(input.len());
        let mut frames: Vec<Frame> = Vec::new();
        let mut diagnostics = Vec::new();

        let mut index = 0;
        while index < nodes.len() {
            let step = match &nodes[index] {
                Node::Text(text) => {
                    sink(&mut root, &mut frames).push_str(text);
                    Ok(())
                }
                Node::Malformed { raw, error } => {
                    warn!(error = %error, "malformed shortcode left as text");
                    diagnostics.push(Diagnostic::Parse(error.clone()));
                    sink(&mut root, &mut frames).push_str(raw);
                    Ok(())
                }
                Node::Tag { tag, partner } => match (tag.kind, *partner) {
                    (TagKind::SelfClosing, _) => {
                        let raw = doc.raw(tag);
                        self.invoke(tag, "", raw, ctx, &mut diagnostics)
                            .await
                            .map(|out| sink(&mut root, &mut frames).push_str(&out))
                    }
                    (TagKind::Open, Some(close)) => {
                        if frames.len() >= self.config.max_nesting_depth {
                            let end = tag_at(nodes, close).map_or(tag.range.end, |t| t.range.end);
                            warn!(shortcode = %tag.name, "shortcode nesting too deep");
                            diagnostics.push(Diagnostic::Parse(ParseError::NestingTooDeep {
                                name: tag.name.clone(),
                                offset: tag.range.start,
                                limit: self.config.max_nesting_depth,
                            }));
                            sink(&mut root, &mut frames)
                                .push_str(&doc.source()[tag.range.start..end]);
                            index = close + 1;
                            continue;
                        }
                        frames.push(Frame {
                            node: index,
                            buffer: String::new(),
                        });
                        Ok(())
                    }
                    (TagKind::Open, None) => {
                        let raw = doc.raw(tag);
                        debug!(shortcode = %tag.name, "opening tag without a closing tag");
                        diagnostics.push(Diagnostic::Parse(ParseError::UnclosedTag {
                            name: tag.name.clone(),
                            offset: tag.range.start,
                        }));
                        match self.config.unclosed {
                            UnclosedTagBehavior::Standalone => self
                                .invoke(tag, "", raw, ctx, &mut diagnostics)
                                .await
                                .map(|out| sink(&mut root, &mut frames).push_str(&out)),
                            UnclosedTagBehavior::Literal => {
                                sink(&mut root, &mut frames).push_str(raw);
                                Ok(())
                            }
                        }
                    }
                    (TagKind::Close, Some(open)) if frames.last().map(|f| f.node) == Some(open) => {
                        let content = frames.pop().map(|f| f.buffer).unwrap_or_default();
                        match tag_at(nodes, open) {
                            Some(opener) => {
                                let fallback =
                                    format!("{}{}{}", doc.raw(opener), content, doc.raw(tag));
                                match self
                                    .invoke(opener, &content, &fallback, ctx, &mut diagnostics)
                                    .await
                                {
                                    Ok(out) => {
                                        sink(&mut root, &mut frames).push_str(&out);
                                        Ok(())
                                    }
                                    Err(interrupt) => {
                                        // Keep the tag open so the partial output echoes it.
                                        frames.push(Frame {
                                            node: open,
                                            buffer: content,
                                        });
                                        Err(interrupt)
                                    }
                                }
                            }
                            None => {
                                sink(&mut root, &mut frames).push_str(&content);
                                Ok(())
                            }
                        }
                    }
                    (TagKind::Close, _) => {
                        sink(&mut root, &mut frames).push_str(doc.raw(tag));
                        Ok(())
                    }
                },
            };

            if let Err(interrupt) = step {
                let partial = unwind(&doc, root, frames);
                return Err(match interrupt {
                    Interrupt::Cancelled => EvaluateError::Cancelled { partial },
                    Interrupt::TimedOut => EvaluateError::TimedOut { partial },
                });
            }
            index += 1;
        }

        Ok(Evaluation {
            output: unwind(&doc, root, frames),
            diagnostics,
        })
    }

    /// Resolves and runs the handler for `tag`.
    ///
    /// `fallback` is the text used when the name is unknown.
    async fn invoke(
        &self,
        tag: &Tag,
        content: &str,
        fallback: &str,
        ctx: &mut Context,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<String, Interrupt> {
        let Some(descriptor) = self.table.get(&tag.name) else {
            debug!(shortcode = %tag.name, "unknown shortcode left as text");
            diagnostics.push(Diagnostic::Unresolved {
                name: tag.name.clone(),
                offset: tag.range.start,
            });
            return Ok(fallback.to_string());
        };

        let result = self
            .guard(descriptor.handler.render(&tag.arguments, content, ctx))
            .await?;
        match result {
            Ok(output) => Ok(output),
            Err(err) => {
                warn!(shortcode = %tag.name, error = %err, "shortcode handler failed");
                diagnostics.push(Diagnostic::HandlerFailed {
                    name: tag.name.clone(),
                    offset: tag.range.start,
                    message: err.to_string(),
                });
                Ok(self.config.failure.replacement().to_string())
            }
        }
    }

    /// Awaits `fut` unless cancellation or the deadline comes first.
    async fn guard<F: Future>(&self, fut: F) -> Result<F::Output, Interrupt> {
        if self.cancellation.is_some_and(Cancellation::is_cancelled) {
            return Err(Interrupt::Cancelled);
        }
        tokio::select! {
            biased;
            _ = cancelled(self.cancellation) => Err(Interrupt::Cancelled),
            _ = expired(self.deadline) => Err(Interrupt::TimedOut),
            output = fut => Ok(output),
        }
    }
}

async fn cancelled(cancellation: Option<&Cancellation>) {
    match cancellation {
        Some(token) => token.cancelled().await,
        None => std::future::pending().await,
    }
}

async fn expired(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn sink<'b>(root: &'b mut String, frames: &'b mut [Frame]) -> &'b mut String {
    match frames.last_mut() {
        Some(frame) => &mut frame.buffer,
        None => root,
    }
}

fn tag_at<'d>(nodes: &'d [Node<'_>], index: usize) -> Option<&'d Tag> {
    match nodes.get(index) {
        Some(Node::Tag { tag, .. }) => Some(tag),
        _ => None,
    }
}

/// Flattens frames still open into the output, echoing their opening tags.
fn unwind(doc: &Document<'_>, mut root: String, frames: Vec<Frame>) -> String {
    for frame in frames {
        if let Some(tag) = tag_at(doc.nodes(), frame.node) {
            root.push_str(doc.raw(tag));
        }
        root.push_str(&frame.buffer);
    }
    root
}
