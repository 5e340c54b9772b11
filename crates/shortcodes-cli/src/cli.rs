//! Argument parsing and command execution.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use shortcodes::{
    Cancellation, Context, Engine, EngineConfig, EvaluateError, InMemoryTemplateStore,
};
use tracing::{info, warn};

use crate::builtins::builtins;

#[derive(Parser, Debug)]
#[command(name = "shortcodes")]
#[command(about = "Expand [shortcodes] in text", version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Expand every shortcode in a file (or stdin) and print the result
    Render {
        /// Input file; reads stdin when omitted or `-`
        input: Option<PathBuf>,

        #[command(flatten)]
        engine: EngineArgs,

        /// Seed a context value. JSON values are parsed, anything else is a string.
        #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_key_value)]
        set: Vec<(String, serde_json::Value)>,

        /// Print recovered problems to stderr
        #[arg(long)]
        diagnostics: bool,
    },

    /// List the shortcodes available for authoring
    List {
        #[command(flatten)]
        engine: EngineArgs,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(clap::Args, Debug, Default)]
pub struct EngineArgs {
    /// YAML file with authored shortcode templates
    #[arg(short, long, value_name = "FILE")]
    pub templates: Option<PathBuf>,

    /// YAML engine configuration
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

fn parse_key_value(raw: &str) -> Result<(String, serde_json::Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", raw))?;
    if key.is_empty() {
        return Err("context key must not be empty".into());
    }
    let value = serde_json::from_str(value)
        .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

impl EngineArgs {
    pub async fn engine(&self) -> Result<Engine> {
        let mut builder = Engine::builder().shortcodes(builtins());

        if let Some(path) = &self.config {
            let yaml = read(path).await?;
            let config = EngineConfig::from_yaml(&yaml)
                .with_context(|| format!("loading config from {}", path.display()))?;
            builder = builder.config(config);
        }

        if let Some(path) = &self.templates {
            let yaml = read(path).await?;
            let store = InMemoryTemplateStore::from_yaml(&yaml)
                .with_context(|| format!("loading templates from {}", path.display()))?;
            builder = builder.templates(Arc::new(store));
        }

        Ok(builder.build()?)
    }
}

async fn read(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))
}

async fn read_input(input: Option<&Path>) -> Result<String> {
    use tokio::io::AsyncReadExt;

    match input {
        Some(path) if path != Path::new("-") => read(path).await,
        _ => {
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .context("reading stdin")?;
            Ok(buf)
        }
    }
}

pub async fn run(args: Args) -> Result<()> {
    match args.command {
        Command::Render {
            input,
            engine,
            set,
            diagnostics,
        } => {
            let engine = engine.engine().await?;
            let text = read_input(input.as_deref()).await?;
            let output = render(&engine, &text, set, diagnostics).await?;
            print!("{}", output);
            Ok(())
        }
        Command::List { engine, json } => {
            let engine = engine.engine().await?;
            println!("{}", list(&engine, json).await?);
            Ok(())
        }
    }
}

/// Evaluates `text`, stopping early on Ctrl-C.
pub async fn render(
    engine: &Engine,
    text: &str,
    set: Vec<(String, serde_json::Value)>,
    diagnostics: bool,
) -> Result<String> {
    let mut ctx = Context::new();
    for (key, value) in set {
        ctx.insert(key, value);
    }

    let cancellation = Cancellation::new();
    let on_interrupt = cancellation.clone();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let result = engine
        .evaluate_with_cancellation(text, &mut ctx, &cancellation)
        .await;
    watcher.abort();

    match result {
        Ok(evaluation) => {
            if diagnostics {
                for diagnostic in &evaluation.diagnostics {
                    eprintln!("warning: {}", diagnostic);
                }
            }
            info!(
                bytes = evaluation.output.len(),
                diagnostics = evaluation.diagnostics.len(),
                "rendered"
            );
            Ok(evaluation.output)
        }
        Err(err @ EvaluateError::Cancelled { .. }) => {
            warn!(partial = err.partial().len(), "render interrupted");
            Err(err.into())
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn list(engine: &Engine, json: bool) -> Result<String> {
    let infos = engine.list_shortcodes(&Context::new()).await;
    if json {
        return Ok(serde_json::to_string_pretty(&infos)?);
    }

    let width = infos.iter().map(|i| i.name.len()).max().unwrap_or(0);
    let lines: Vec<String> = infos
        .iter()
        .map(|info| {
            let hint = info.hint.as_deref().unwrap_or("");
            format!(
                "{:width$}  {:8}  {:20}  {}",
                info.name,
                format!("{:?}", info.origin).to_lowercase(),
                info.default_shortcode,
                hint,
                width = width
            )
            .trim_end()
            .to_string()
        })
        .collect();
    Ok(lines.join("\n"))
}
