//! Error types for the shortcode engine.
//!
//! Most failures inside a document are not errors at this level: they are
//! isolated to one tag and reported as [`Diagnostic`](crate::Diagnostic)s.
//! [`EvaluateError`] is reserved for the conditions that stop an evaluate
//! call as a whole.

use thiserror::Error;

/// A shortcode handler failed. The evaluator isolates this to the one tag.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Handler-defined failure.
    #[error("{0}")]
    Message(String),

    /// A template-backed handler failed to render.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// Any other error raised by handler code.
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl HandlerError {
    pub fn msg(message: impl Into<String>) -> Self {
        HandlerError::Message(message.into())
    }
}

/// Rendering a template body failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// The template does not compile.
    #[error("template syntax error: {0}")]
    Syntax(String),

    /// The template compiled but rendering failed.
    #[error("template render error: {0}")]
    Render(String),
}

impl From<minijinja::Error> for TemplateError {
    fn from(err: minijinja::Error) -> Self {
        use minijinja::ErrorKind;

        match err.kind() {
            ErrorKind::SyntaxError
            | ErrorKind::BadEscape
            | ErrorKind::UnknownTest
            | ErrorKind::UnknownFunction
            | ErrorKind::UnknownFilter => TemplateError::Syntax(err.to_string()),
            _ => TemplateError::Render(err.to_string()),
        }
    }
}

/// A provider could not produce its descriptors.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The backing store could not be read.
    #[error("template store unavailable: {0}")]
    Store(String),

    /// Stored data could not be decoded.
    #[error("invalid template definition: {0}")]
    Invalid(String),
}

impl From<serde_yaml::Error> for ProviderError {
    fn from(err: serde_yaml::Error) -> Self {
        ProviderError::Invalid(err.to_string())
    }
}

/// Engine configuration could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid configuration value for '{key}': {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

/// Conditions that abort a whole evaluate call.
///
/// Both variants carry the output spliced before evaluation stopped.
/// Tags still open at that point are echoed unexpanded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvaluateError {
    #[error("evaluation cancelled")]
    Cancelled { partial: String },

    #[error("evaluation timed out")]
    TimedOut { partial: String },
}

impl EvaluateError {
    /// Output produced before evaluation stopped.
    pub fn partial(&self) -> &str {
        match self {
            EvaluateError::Cancelled { partial } | EvaluateError::TimedOut { partial } => partial,
        }
    }

    pub fn into_partial(self) -> String {
        match self {
            EvaluateError::Cancelled { partial } | EvaluateError::TimedOut { partial } => partial,
        }
    }
}
