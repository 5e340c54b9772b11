//! Shortcode handlers.
//!
//! A handler turns one tag instance into output text. It receives the tag's
//! arguments, its already-evaluated inner content (empty for standalone and
//! self-closing tags) and the evaluation [`Context`].
//!
//! Handlers are async so they can wait on I/O. The evaluator still awaits
//! them one at a time in source order, so a handler always sees the context
//! writes of every tag before it.
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use shortcodes::{Arguments, Context, HandlerError, ShortcodeHandler};
//!
//! struct Footnote;
//!
//! #[async_trait]
//! impl ShortcodeHandler for Footnote {
//!     async fn render(
//!         &self,
//!         _args: &Arguments,
//!         content: &str,
//!         ctx: &mut Context,
//!     ) -> Result<String, HandlerError> {
//!         let n = ctx.increment("footnotes");
//!         ctx.push("footnote_bodies", content);
//!         Ok(format!("<sup>{}</sup>", n))
//!     }
//! }
//! ```

use async_trait::async_trait;
use shortcodes_parser::Arguments;

use crate::context::Context;
use crate::error::HandlerError;

/// Behavior bound to a shortcode name.
#[async_trait]
pub trait ShortcodeHandler: Send + Sync {
    async fn render(
        &self,
        args: &Arguments,
        content: &str,
        ctx: &mut Context,
    ) -> Result<String, HandlerError>;
}

/// Adapts a synchronous closure into a [`ShortcodeHandler`].
pub struct FnHandler<F> {
    f: F,
}

impl<F> FnHandler<F>
where
    F: Fn(&Arguments, &str, &mut Context) -> Result<String, HandlerError> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F> ShortcodeHandler for FnHandler<F>
where
    F: Fn(&Arguments, &str, &mut Context) -> Result<String, HandlerError> + Send + Sync,
{
    async fn render(
        &self,
        args: &Arguments,
        content: &str,
        ctx: &mut Context,
    ) -> Result<String, HandlerError> {
        (self.f)(args, content, ctx)
    }
}

/// Shorthand for [`FnHandler::new`].
pub fn handler_fn<F>(f: F) -> FnHandler<F>
where
    F: Fn(&Arguments, &str, &mut Context) -> Result<String, HandlerError> + Send + Sync,
{
    FnHandler::new(f)
}
