use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use shortcodes_parser::{is_valid_tag_name, Arguments};
use tokio::sync::RwLock;
use tracing::warn;

use super::ShortcodeProvider;
use crate::context::Context;
use crate::descriptor::{Origin, ShortcodeDescriptor, ShortcodeMetadata};
use crate::error::{HandlerError, ProviderError};
use crate::handler::ShortcodeHandler;
use crate::template::TemplateRenderer;

/// A persisted, author-editable shortcode definition.
///
/// ```yaml
/// - name: callout
///   content: "<aside class='{{ args.tone or \"info\" }}'>{{ content }}</aside>"
///   hint: Highlighted aside
///   categories: [HTML Content]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortcodeTemplate {
    pub name: String,
    /// The template body rendered for each tag instance.
    pub content: String,
    #[serde(flatten)]
    pub metadata: ShortcodeMetadata,
}

impl ShortcodeTemplate {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            metadata: ShortcodeMetadata::default(),
        }
    }
}

/// Storage of authored templates.
///
/// Listed on every table build, since authors may change definitions
/// between evaluations.
#[async_trait]
pub trait TemplateStore: Send + Sync {
    async fn list(&self) -> Result<Vec<ShortcodeTemplate>, ProviderError>;
}

/// A [`TemplateStore`] held in memory, editable at runtime.
#[derive(Debug, Default)]
pub struct InMemoryTemplateStore {
    templates: RwLock<Vec<ShortcodeTemplate>>,
}

impl InMemoryTemplateStore {
    pub fn new(templates: Vec<ShortcodeTemplate>) -> Self {
        Self {
            templates: RwLock::new(templates),
        }
    }

    /// Loads a YAML list of templates.
    pub fn from_yaml(yaml: &str) -> Result<Self, ProviderError> {
        let templates: Vec<ShortcodeTemplate> = serde_yaml::from_str(yaml)?;
        Ok(Self::new(templates))
    }

    /// Adds a template or replaces the one with the same name.
    pub async fn upsert(&self, template: ShortcodeTemplate) {
        let mut templates = self.templates.write().await;
        match templates.iter_mut().find(|t| t.name == template.name) {
            Some(existing) => *existing = template,
            None => templates.push(template),
        }
    }

    pub async fn remove(&self, name: &str) -> Option<ShortcodeTemplate> {
        let mut templates = self.templates.write().await;
        let index = templates.iter().position(|t| t.name == name)?;
        Some(templates.remove(index))
    }
}

#[async_trait]
impl TemplateStore for InMemoryTemplateStore {
    async fn list(&self) -> Result<Vec<ShortcodeTemplate>, ProviderError> {
        Ok(self.templates.read().await.clone())
    }
}

/// Wraps each stored template into a descriptor whose handler renders the
/// template body.
pub struct TemplateShortcodeProvider {
    store: Arc<dyn TemplateStore>,
    renderer: Arc<dyn TemplateRenderer>,
}

impl TemplateShortcodeProvider {
    pub fn new(store: Arc<dyn TemplateStore>, renderer: Arc<dyn TemplateRenderer>) -> Self {
        Self { store, renderer }
    }
}

#[async_trait]
impl ShortcodeProvider for TemplateShortcodeProvider {
    fn name(&self) -> &str {
        "templates"
    }

    async fn descriptors(&self, _ctx: &Context) -> Result<Vec<ShortcodeDescriptor>, ProviderError> {
        let templates = self.store.list().await?;
        let mut descriptors = Vec::with_capacity(templates.len());
        for template in templates {
            if !is_valid_tag_name(&template.name) {
                warn!(shortcode = %template.name, "skipping template with invalid shortcode name");
                continue;
            }
            let handler = TemplateShortcodeHandler {
                name: template.name.clone(),
                body: template.content,
                renderer: Arc::clone(&self.renderer),
            };
            descriptors.push(
                ShortcodeDescriptor::new(template.name, Origin::Template, Arc::new(handler))
                    .with_metadata(template.metadata),
            );
        }
        Ok(descriptors)
    }
}

/// Renders one authored template body for a tag instance.
pub struct TemplateShortcodeHandler {
    name: String,
    body: String,
    renderer: Arc<dyn TemplateRenderer>,
}

impl TemplateShortcodeHandler {
    fn model(&self, args: &Arguments, content: &str, ctx: &Context) -> serde_json::Value {
        json!({
            "name": self.name,
            "args": args.named_map(),
            "positional": args.positional(),
            "content": content,
            "context": ctx.to_json(),
        })
    }
}

#[async_trait]
impl ShortcodeHandler for TemplateShortcodeHandler {
    async fn render(
        &self,
        args: &Arguments,
        content: &str,
        ctx: &mut Context,
    ) -> Result<String, HandlerError> {
        let model = self.model(args, content, ctx);
        Ok(self.renderer.render(&self.body, &model).await?)
    }
}
