//! The engine: providers, context seeding and evaluation behind one handle.
//!
//! An [`Engine`] is immutable once built and can be shared across tasks.
//! Every evaluate call builds its own [`ShortcodeTable`] snapshot and runs
//! one [`Evaluator`] pass over the input, so concurrent calls on different
//! documents never share mutable state.
//!
//! ```rust
//! use shortcodes::{Context, Engine};
//!
//! # tokio_test_block(async {
//! let engine = Engine::builder()
//!     .shortcode_fn("bold", |args, content, _ctx| {
//!         Ok(format!("<b>{}</b>", args.named_or_default("text", content)))
//!     })
//!     .build()
//!     .unwrap();
//!
//! let out = engine
//!     .evaluate("[bold]plain[/bold] and [bold text='hi']x[/bold]", &mut Context::new())
//!     .await
//!     .unwrap();
//! assert_eq!(out, "<b>plain</b> and <b>hi</b>");
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap().block_on(f)
//! # }
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use shortcodes_parser::Arguments;
use tokio::time::Instant;
use tracing::debug;

use crate::cancellation::Cancellation;
use crate::config::EngineConfig;
use crate::context::{Context, ContextProvider};
use crate::descriptor::{ShortcodeInfo, ShortcodeMetadata};
use crate::error::{ConfigError, EvaluateError, HandlerError};
use crate::evaluator::{Evaluation, Evaluator};
use crate::handler::ShortcodeHandler;
use crate::provider::{
    CodeShortcodeProvider, ShortcodeOptions, ShortcodeProvider, TemplateShortcodeProvider,
    TemplateStore,
};
use crate::table::{ProviderRegistry, ShortcodeTable};
use crate::template::{MiniJinjaRenderer, TemplateRenderer};

pub struct Engine {
    registry: ProviderRegistry,
    context_providers: Vec<Arc<dyn ContextProvider>>,
    config: EngineConfig,
}

impl Engine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Runs every context provider against `ctx`, in registration order.
    pub fn seed_context(&self, ctx: &mut Context) {
        for provider in &self.context_providers {
            provider.contribute(ctx);
        }
    }

    /// Builds a table snapshot for `ctx`.
    pub async fn build_table(&self, ctx: &Context) -> ShortcodeTable {
        self.registry.build_table(ctx).await
    }

    /// Expands every shortcode in `input` and returns the output text.
    ///
    /// Unknown and malformed tags are echoed, failing handlers are replaced
    /// per [`EngineConfig::failure`]. Use [`evaluate_detailed`] to see what
    /// was recovered from.
    ///
    /// [`evaluate_detailed`]: Engine::evaluate_detailed
    pub async fn evaluate(&self, input: &str, ctx: &mut Context) -> Result<String, EvaluateError> {
        self.evaluate_detailed(input, ctx)
            .await
            .map(|evaluation| evaluation.output)
    }

    /// Like [`evaluate`](Engine::evaluate), also returning diagnostics.
    pub async fn evaluate_detailed(
        &self,
        input: &str,
        ctx: &mut Context,
    ) -> Result<Evaluation, EvaluateError> {
        self.run(input, ctx, None).await
    }

    /// Evaluates until done or until `cancellation` fires.
    ///
    /// On cancellation the returned error carries the output spliced so far.
    pub async fn evaluate_with_cancellation(
        &self,
        input: &str,
        ctx: &mut Context,
        cancellation: &Cancellation,
    ) -> Result<Evaluation, EvaluateError> {
        self.run(input, ctx, Some(cancellation)).await
    }

    /// Summaries of every shortcode an author can use, sorted by name.
    pub async fn list_shortcodes(&self, ctx: &Context) -> Vec<ShortcodeInfo> {
        let mut ctx = ctx.clone();
        self.seed_context(&mut ctx);
        self.build_table(&ctx).await.infos()
    }

    async fn run(
        &self,
        input: &str,
        ctx: &mut Context,
        cancellation: Option<&Cancellation>,
    ) -> Result<Evaluation, EvaluateError> {
        let deadline = self.config.timeout().map(|timeout| Instant::now() + timeout);
        self.seed_context(ctx);

        let table = interruptible(self.build_table(ctx), cancellation, deadline).await?;
        debug!(shortcodes = table.len(), bytes = input.len(), "evaluating");

        let mut evaluator = Evaluator::new(&table, &self.config);
        if let Some(cancellation) = cancellation {
            evaluator = evaluator.with_cancellation(cancellation);
        }
        if let Some(deadline) = deadline {
            evaluator = evaluator.with_deadline(deadline);
        }
        let evaluation = evaluator.evaluate(input, ctx).await?;
        if !evaluation.is_clean() {
            debug!(
                diagnostics = evaluation.diagnostics.len(),
                "evaluation finished with recoveries"
            );
        }
        Ok(evaluation)
    }
}

/// Awaits a table build unless cancelled or out of time.
///
/// Nothing has been spliced yet, so an interrupt carries empty output.
async fn interruptible<F: Future>(
    fut: F,
    cancellation: Option<&Cancellation>,
    deadline: Option<Instant>,
) -> Result<F::Output, EvaluateError> {
    let cancelled = async {
        match cancellation {
            Some(token) => token.cancelled().await,
            None => std::future::pending().await,
        }
    };
    let expired = async {
        match deadline {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending().await,
        }
    };
    tokio::select! {
        biased;
        _ = cancelled => Err(EvaluateError::Cancelled { partial: String::new() }),
        _ = expired => Err(EvaluateError::TimedOut { partial: String::new() }),
        output = fut => Ok(output),
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("registry", &self.registry)
            .field("context_providers", &self.context_providers.len())
            .field("config", &self.config)
            .finish()
    }
}

/// Assembles an [`Engine`].
///
/// Providers are queried in this order on every table build: shortcodes
/// registered on the builder, the template store, then any extra
/// providers. The override rule makes that order irrelevant for
/// template-versus-code conflicts.
#[derive(Default)]
pub struct EngineBuilder {
    options: ShortcodeOptions,
    templates: Option<Arc<dyn TemplateStore>>,
    renderer: Option<Arc<dyn TemplateRenderer>>,
    providers: Vec<Arc<dyn ShortcodeProvider>>,
    context_providers: Vec<Arc<dyn ContextProvider>>,
    config: EngineConfig,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shortcode(mut self, name: impl Into<String>, handler: impl ShortcodeHandler + 'static) -> Self {
        self.options.add_shortcode(name, handler);
        self
    }

    /// Registers a handler together with its authoring metadata.
    pub fn shortcode_with(
        mut self,
        name: impl Into<String>,
        handler: impl ShortcodeHandler + 'static,
        configure: impl FnOnce(&mut ShortcodeMetadata),
    ) -> Self {
        self.options.add_shortcode_with(name, handler, configure);
        self
    }

    pub fn shortcode_fn<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Arguments, &str, &mut Context) -> Result<String, HandlerError>
            + Send
            + Sync
            + 'static,
    {
        self.options.add_shortcode_fn(name, f);
        self
    }

    pub fn shortcodes(mut self, options: ShortcodeOptions) -> Self {
        self.options.merge(options);
        self
    }

    /// Serves template-authored shortcodes from `store`.
    ///
    /// The store is listed again on every evaluate call, so edits made
    /// through a shared handle are picked up without rebuilding the engine.
    pub fn templates(mut self, store: Arc<dyn TemplateStore>) -> Self {
        self.templates = Some(store);
        self
    }

    /// Renderer for template bodies. Defaults to [`MiniJinjaRenderer`].
    pub fn renderer(mut self, renderer: impl TemplateRenderer + 'static) -> Self {
        self.renderer = Some(Arc::new(renderer));
        self
    }

    pub fn provider(mut self, provider: impl ShortcodeProvider + 'static) -> Self {
        self.providers.push(Arc::new(provider));
        self
    }

    pub fn context_provider(mut self, provider: impl ContextProvider + 'static) -> Self {
        self.context_providers.push(Arc::new(provider));
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<Engine, ConfigError> {
        self.config.validate()?;

        let mut registry = ProviderRegistry::new();
        registry.add(Arc::new(CodeShortcodeProvider::new(self.options)));
        if let Some(store) = self.templates {
            let renderer = self
                .renderer
                .unwrap_or_else(|| Arc::new(MiniJinjaRenderer::new()));
            registry.add(Arc::new(TemplateShortcodeProvider::new(store, renderer)));
        }
        for provider in self.providers {
            registry.add(provider);
        }

        Ok(Engine {
            registry,
            context_providers: self.context_providers,
            config: self.config,
        })
    }
}
