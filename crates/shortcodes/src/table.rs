//! The per-evaluation shortcode table and the registry that builds it.
//!
//! # Override rule
//!
//! When two descriptors share a name, the one with the higher [`Origin`]
//! wins: template-authored shortcodes shadow code-registered ones whatever
//! order their providers run in. Between descriptors of the same origin,
//! the one registered later wins.
//!
//! Tables are built per call. Authored templates can change at any time, so
//! a table is a snapshot that is never reused across evaluate calls.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::context::Context;
use crate::descriptor::{Origin, ShortcodeDescriptor, ShortcodeInfo};
use crate::provider::ShortcodeProvider;

/// Resolved mapping from tag name to the winning descriptor.
#[derive(Debug, Clone, Default)]
pub struct ShortcodeTable {
    entries: BTreeMap<String, ShortcodeDescriptor>,
}

impl ShortcodeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a descriptor, applying the override rule.
    ///
    /// Returns `false` if an existing descriptor with a higher origin kept
    /// the name.
    pub fn insert(&mut self, descriptor: ShortcodeDescriptor) -> bool {
        if let Some(existing) = self.entries.get(&descriptor.name) {
            if existing.origin > descriptor.origin {
                debug!(
                    shortcode = %descriptor.name,
                    kept = ?existing.origin,
                    ignored = ?descriptor.origin,
                    "shortcode already overridden"
                );
                return false;
            }
            debug!(
                shortcode = %descriptor.name,
                replaced = ?existing.origin,
                by = ?descriptor.origin,
                "overriding shortcode"
            );
        }
        self.entries.insert(descriptor.name.clone(), descriptor);
        true
    }

    pub fn get(&self, name: &str) -> Option<&ShortcodeDescriptor> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Descriptors sorted by name.
    pub fn descriptors(&self) -> impl Iterator<Item = &ShortcodeDescriptor> {
        self.entries.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Authoring summaries sorted by name.
    pub fn infos(&self) -> Vec<ShortcodeInfo> {
        self.entries.values().map(ShortcodeDescriptor::info).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// How many entries come from the given origin.
    pub fn count_by_origin(&self, origin: Origin) -> usize {
        self.entries.values().filter(|d| d.origin == origin).count()
    }
}

/// Ordered set of providers that a table is built from.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn ShortcodeProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, provider: Arc<dyn ShortcodeProvider>) -> &mut Self {
        self.providers.push(provider);
        self
    }

    pub fn with(mut self, provider: Arc<dyn ShortcodeProvider>) -> Self {
        self.add(provider);
        self
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Queries every provider in order and merges the results.
    ///
    /// A failing provider is logged and skipped; the rest of the table is
    /// still built.
    pub async fn build_table(&self, ctx: &Context) -> ShortcodeTable {
        let mut table = ShortcodeTable::new();
        for provider in &self.providers {
            match provider.descriptors(ctx).await {
                Ok(descriptors) => {
                    for descriptor in descriptors {
                        table.insert(descriptor);
                    }
                }
                Err(err) => {
                    warn!(provider = provider.name(), error = %err, "shortcode provider failed");
                }
            }
        }
        debug!(
            shortcodes = table.len(),
            templates = table.count_by_origin(Origin::Template),
            "built shortcode table"
        );
        table
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<_> = self.providers.iter().map(|p| p.name()).collect();
        f.debug_struct("ProviderRegistry")
            .field("providers", &names)
            .finish()
    }
}
