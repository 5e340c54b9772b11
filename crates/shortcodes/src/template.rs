//! Template rendering for template-authored shortcodes.
//!
//! This module defines the [`TemplateRenderer`] trait so the engine does not
//! depend on one template language. The default implementation is
//! [`MiniJinjaRenderer`].
//!
//! # Template model
//!
//! Template bodies are rendered against:
//!
//! | Name | Value |
//! |------|-------|
//! | `name` | The tag name |
//! | `args` | Named arguments (last occurrence wins) |
//! | `positional` | Positional arguments in source order |
//! | `content` | Evaluated inner content, empty for standalone tags |
//! | `context` | Snapshot of the evaluation context |

use async_trait::async_trait;
use minijinja::{Environment, Value};

use crate::error::TemplateError;

/// Renders a template body against a JSON model.
#[async_trait]
pub trait TemplateRenderer: Send + Sync {
    async fn render(&self, template: &str, model: &serde_json::Value)
        -> Result<String, TemplateError>;
}

/// MiniJinja-based renderer.
///
/// Autoescaping is off: shortcode output is spliced into text that is
/// already markup.
///
/// # Example
///
/// ```rust
/// use shortcodes::template::{MiniJinjaRenderer, TemplateRenderer};
/// use serde_json::json;
///
/// # tokio_test_block(async {
/// let renderer = MiniJinjaRenderer::new();
/// let out = renderer
///     .render("<b>{{ args.text or content }}</b>", &json!({"args": {}, "content": "hi"}))
///     .await
///     .unwrap();
/// assert_eq!(out, "<b>hi</b>");
/// # });
/// # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
/// # }
/// ```
pub struct MiniJinjaRenderer {
    env: Environment<'static>,
}

impl MiniJinjaRenderer {
    pub fn new() -> Self {
        Self {
            env: Environment::new(),
        }
    }

    /// The underlying environment, for registering filters and functions.
    pub fn environment(&self) -> &Environment<'static> {
        &self.env
    }

    pub fn environment_mut(&mut self) -> &mut Environment<'static> {
        &mut self.env
    }
}

impl Default for MiniJinjaRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TemplateRenderer for MiniJinjaRenderer {
    async fn render(
        &self,
        template: &str,
        model: &serde_json::Value,
    ) -> Result<String, TemplateError> {
        let value = Value::from_serialize(model);
        Ok(self.env.render_str(template, value)?)
    }
}
