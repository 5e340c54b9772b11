use std::sync::Arc;

use async_trait::async_trait;
use shortcodes_parser::Arguments;
use tracing::debug;

use super::ShortcodeProvider;
use crate::context::Context;
use crate::descriptor::{Origin, ShortcodeDescriptor, ShortcodeMetadata};
use crate::error::{HandlerError, ProviderError};
use crate::handler::{handler_fn, ShortcodeHandler};

/// Code-registered shortcodes, collected at startup.
///
/// Registering a name twice replaces the earlier binding; the two handlers
/// are never both applied.
///
/// ```rust
/// use shortcodes::{HandlerError, ShortcodeOptions};
///
/// let mut options = ShortcodeOptions::new();
/// options.add_shortcode_fn("bold", |args, content, _ctx| {
///     let text = args.named_or_default("text", content);
///     Ok::<_, HandlerError>(format!("<b>{}</b>", text))
/// });
/// assert_eq!(options.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ShortcodeOptions {
    descriptors: Vec<ShortcodeDescriptor>,
}

impl ShortcodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_shortcode(
        &mut self,
        name: impl Into<String>,
        handler: impl ShortcodeHandler + 'static,
    ) -> &mut Self {
        self.add_shortcode_with(name, handler, |_| {})
    }

    /// Registers a handler and fills in its authoring metadata.
    pub fn add_shortcode_with(
        &mut self,
        name: impl Into<String>,
        handler: impl ShortcodeHandler + 'static,
        configure: impl FnOnce(&mut ShortcodeMetadata),
    ) -> &mut Self {
        let mut descriptor = ShortcodeDescriptor::new(name, Origin::Code, Arc::new(handler));
        configure(&mut descriptor.metadata);
        self.insert(descriptor);
        self
    }

    /// Registers a synchronous closure.
    pub fn add_shortcode_fn<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(&Arguments, &str, &mut Context) -> Result<String, HandlerError>
            + Send
            + Sync
            + 'static,
    {
        self.add_shortcode(name, handler_fn(f))
    }

    /// Adds every registration from `other`, replacing same-named ones.
    pub fn merge(&mut self, other: ShortcodeOptions) -> &mut Self {
        for descriptor in other.descriptors {
            self.insert(descriptor);
        }
        self
    }

    fn insert(&mut self, descriptor: ShortcodeDescriptor) {
        if let Some(existing) = self
            .descriptors
            .iter_mut()
            .find(|d| d.name == descriptor.name)
        {
            debug!(shortcode = %descriptor.name, "replacing code-registered shortcode");
            *existing = descriptor;
        } else {
            self.descriptors.push(descriptor);
        }
    }

    pub fn get(&self, name: &str) -> Option<&ShortcodeDescriptor> {
        self.descriptors.iter().find(|d| d.name == name)
    }

    pub fn descriptors(&self) -> &[ShortcodeDescriptor] {
        &self.descriptors
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

/// Serves a fixed [`ShortcodeOptions`] set to every table build.
#[derive(Debug, Clone)]
pub struct CodeShortcodeProvider {
    options: Arc<ShortcodeOptions>,
}

impl CodeShortcodeProvider {
    pub fn new(options: ShortcodeOptions) -> Self {
        Self {
            options: Arc::new(options),
        }
    }
}

#[async_trait]
impl ShortcodeProvider for CodeShortcodeProvider {
    fn name(&self) -> &str {
        "code"
    }

    async fn descriptors(&self, _ctx: &Context) -> Result<Vec<ShortcodeDescriptor>, ProviderError> {
        Ok(self.options.descriptors().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_same_name_replaces_earlier_registration() {
        let mut options = ShortcodeOptions::new();
        options.add_shortcode_fn("bold", |_, c, _| Ok(format!("<em>{}</em>", c)));
        options.add_shortcode_fn("bold", |_, c, _| Ok(format!("<b>{}</b>", c)));
        assert_eq!(options.len(), 1);

        let descriptor = options.get("bold").unwrap();
        let out = descriptor
            .handler
            .render(&Arguments::default(), "x", &mut Context::new())
            .await
            .unwrap();
        assert_eq!(out, "<b>x</b>");
    }

    #[test]
    fn test_metadata_configuration() {
        let mut options = ShortcodeOptions::new();
        options.add_shortcode_with(
            "bold",
            handler_fn(|_, c, _| Ok(c.to_string())),
            |meta| {
                meta.return_shortcode = Some("[bold ]".into());
                meta.usage = Some("[bold 'your bold content here']".into());
                meta.categories = vec!["HTML Content".into(), "Content Item".into()];
            },
        );
        let descriptor = options.get("bold").unwrap();
        assert_eq!(descriptor.origin, Origin::Code);
        assert_eq!(descriptor.default_shortcode(), "[bold ]");
        assert_eq!(descriptor.metadata.categories.len(), 2);
    }

    #[test]
    fn test_merge_keeps_order_and_replaces() {
        let mut base = ShortcodeOptions::new();
        base.add_shortcode_fn("a", |_, _, _| Ok("a".into()))
            .add_shortcode_fn("b", |_, _, _| Ok("b".into()));
        let mut extra = ShortcodeOptions::new();
        extra
            .add_shortcode_fn("b", |_, _, _| Ok("B".into()))
            .add_shortcode_fn("c", |_, _, _| Ok("c".into()));
        base.merge(extra);
        let names: Vec<_> = base.descriptors().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_provider_serves_all_descriptors() {
        let mut options = ShortcodeOptions::new();
        options
            .add_shortcode_fn("a", |_, _, _| Ok("a".into()))
            .add_shortcode_fn("b", |_, _, _| Ok("b".into()));
        let provider = CodeShortcodeProvider::new(options);
        let descriptors = provider.descriptors(&Context::new()).await.unwrap();
        let names: Vec<_> = descriptors.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
