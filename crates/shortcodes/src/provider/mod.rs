//! Sources of shortcode descriptors.
//!
//! Two kinds ship with the engine:
//!
//! - [`CodeShortcodeProvider`]: descriptors registered in code through
//!   [`ShortcodeOptions`] at startup, identical for every table build.
//! - [`TemplateShortcodeProvider`]: descriptors built from authored
//!   templates, re-read from a [`TemplateStore`] on every table build.
//!
//! Custom providers implement [`ShortcodeProvider`].

mod options;
mod template;

use async_trait::async_trait;

use crate::context::Context;
use crate::descriptor::ShortcodeDescriptor;
use crate::error::ProviderError;

pub use options::{CodeShortcodeProvider, ShortcodeOptions};
pub use template::{
    InMemoryTemplateStore, ShortcodeTemplate, TemplateShortcodeHandler, TemplateShortcodeProvider,
    TemplateStore,
};

/// Contributes descriptors to a table build.
#[async_trait]
pub trait ShortcodeProvider: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Descriptors for the given context. May perform I/O.
    async fn descriptors(&self, ctx: &Context) -> Result<Vec<ShortcodeDescriptor>, ProviderError>;
}
