//! Shortcode descriptors: a name bound to a handler, plus authoring metadata.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::handler::ShortcodeHandler;

/// Where a descriptor came from.
///
/// The ordering is the override order: a [`Origin::Template`] descriptor
/// shadows a [`Origin::Code`] descriptor of the same name no matter which
/// provider produced it first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Registered in code at startup.
    Code,
    /// Authored and persisted at runtime.
    Template,
}

/// Text shown by authoring tools. Never consulted during evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShortcodeMetadata {
    /// One-line description of what the shortcode does.
    pub hint: Option<String>,
    /// Usage example, e.g. `[bold 'your text']`.
    pub usage: Option<String>,
    /// The snippet inserted when an author picks this shortcode.
    pub return_shortcode: Option<String>,
    pub categories: Vec<String>,
}

impl ShortcodeMetadata {
    pub fn hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = Some(usage.into());
        self
    }

    pub fn return_shortcode(mut self, snippet: impl Into<String>) -> Self {
        self.return_shortcode = Some(snippet.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.categories.push(category.into());
        self
    }
}

/// A registered binding from a tag name to behavior.
#[derive(Clone)]
pub struct ShortcodeDescriptor {
    pub name: String,
    pub handler: Arc<dyn ShortcodeHandler>,
    pub metadata: ShortcodeMetadata,
    pub origin: Origin,
}

impl ShortcodeDescriptor {
    pub fn new(name: impl Into<String>, origin: Origin, handler: Arc<dyn ShortcodeHandler>) -> Self {
        Self {
            name: name.into(),
            handler,
            metadata: ShortcodeMetadata::default(),
            origin,
        }
    }

    pub fn with_metadata(mut self, metadata: ShortcodeMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// The snippet an authoring tool should insert for this shortcode.
    pub fn default_shortcode(&self) -> String {
        self.metadata
            .return_shortcode
            .clone()
            .unwrap_or_else(|| format!("[{}]", self.name))
    }

    /// Serializable summary for pickers and listings.
    pub fn info(&self) -> ShortcodeInfo {
        ShortcodeInfo {
            name: self.name.clone(),
            hint: self.metadata.hint.clone(),
            usage: self.metadata.usage.clone(),
            categories: self.metadata.categories.clone(),
            default_shortcode: self.default_shortcode(),
            origin: self.origin,
        }
    }
}

impl fmt::Debug for ShortcodeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShortcodeDescriptor")
            .field("name", &self.name)
            .field("origin", &self.origin)
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

/// What authoring tools get when listing available shortcodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortcodeInfo {
    pub name: String,
    pub hint: Option<String>,
    pub usage: Option<String>,
    pub categories: Vec<String>,
    pub default_shortcode: String,
    pub origin: Origin,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::handler_fn;

    fn noop() -> Arc<dyn ShortcodeHandler> {
        Arc::new(handler_fn(|_, content, _| Ok(content.to_string())))
    }

    #[test]
    fn test_template_outranks_code() {
        assert!(Origin::Template > Origin::Code);
    }

    #[test]
    fn test_default_shortcode_falls_back_to_name() {
        let descriptor = ShortcodeDescriptor::new("hr", Origin::Code, noop());
        assert_eq!(descriptor.default_shortcode(), "[hr]");

        let descriptor = descriptor
            .with_metadata(ShortcodeMetadata::default().return_shortcode("[hr /]"));
        assert_eq!(descriptor.default_shortcode(), "[hr /]");
    }

    #[test]
    fn test_info_serializes_camel_case() {
        let descriptor = ShortcodeDescriptor::new("bold", Origin::Template, noop()).with_metadata(
            ShortcodeMetadata::default()
                .hint("Bold text")
                .category("HTML Content"),
        );
        let json = serde_json::to_value(descriptor.info()).unwrap();
        assert_eq!(json["defaultShortcode"], "[bold]");
        assert_eq!(json["origin"], "template");
        assert_eq!(json["categories"][0], "HTML Content");
    }
}
