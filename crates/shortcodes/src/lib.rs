//! Shortcode macro engine.
//!
//! Expands bracket-delimited tags such as `[bold text='x']content[/bold]`
//! embedded in text, replacing each with the output of the handler bound to
//! its name. Inner tags are expanded before outer ones, so a handler always
//! receives evaluated content.
//!
//! # Components
//!
//! - [`Engine`] / [`EngineBuilder`]: the entry point.
//! - [`ShortcodeHandler`]: behavior bound to a name. Closures work through
//!   [`handler_fn`] and [`ShortcodeOptions::add_shortcode_fn`].
//! - Providers ([`provider`]): where descriptors come from. Shortcodes
//!   registered in code and shortcodes authored as templates are merged into
//!   one [`ShortcodeTable`] per evaluate call. Authored templates win over
//!   code on a name clash.
//! - [`Context`]: a property bag handlers use to pass data down the
//!   document.
//! - [`Evaluator`]: the single left-to-right pass.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use shortcodes::{Context, Engine, InMemoryTemplateStore, ShortcodeTemplate};
//!
//! # tokio_test_block(async {
//! let store = Arc::new(InMemoryTemplateStore::new(vec![ShortcodeTemplate::new(
//!     "note",
//!     "<aside>{{ content }}</aside>",
//! )]));
//!
//! let engine = Engine::builder()
//!     .shortcode_fn("upper", |_args, content, _ctx| Ok(content.to_uppercase()))
//!     .templates(store)
//!     .build()
//!     .unwrap();
//!
//! let out = engine
//!     .evaluate("[note][upper]careful[/upper][/note] [missing]", &mut Context::new())
//!     .await
//!     .unwrap();
//! assert_eq!(out, "<aside>CAREFUL</aside> [missing]");
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap().block_on(f)
//! # }
//! ```
//!
//! # Failure handling
//!
//! Evaluation never fails because of what is in the document. Malformed and
//! unknown tags are echoed, failing handlers are replaced per
//! [`FailureBehavior`], and all of it is reported through
//! [`Engine::evaluate_detailed`]. Only cancellation and timeouts end a call
//! early, with [`EvaluateError`] carrying the partial output.

mod cancellation;
mod config;
mod context;
mod descriptor;
mod engine;
mod error;
mod evaluator;
mod handler;
pub mod provider;
mod table;
pub mod template;

pub use cancellation::Cancellation;
pub use config::{EngineConfig, FailureBehavior, UnclosedTagBehavior, DEFAULT_MAX_NESTING_DEPTH};
pub use context::{Context, ContextProvider};
pub use descriptor::{Origin, ShortcodeDescriptor, ShortcodeInfo, ShortcodeMetadata};
pub use engine::{Engine, EngineBuilder};
pub use error::{ConfigError, EvaluateError, HandlerError, ProviderError, TemplateError};
pub use evaluator::{Diagnostic, Evaluation, Evaluator};
pub use handler::{handler_fn, FnHandler, ShortcodeHandler};
pub use provider::{
    CodeShortcodeProvider, InMemoryTemplateStore, ShortcodeOptions, ShortcodeProvider,
    ShortcodeTemplate, TemplateShortcodeProvider, TemplateStore,
};
pub use table::{ProviderRegistry, ShortcodeTable};

pub use shortcodes_parser::{Argument, Arguments, ParseError};
