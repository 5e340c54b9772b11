//! Engine configuration.
//!
//! [`EngineConfig`] can be built in code with its `with_*` methods or
//! loaded from YAML:
//!
//! ```rust
//! use shortcodes::{EngineConfig, FailureBehavior};
//!
//! let config = EngineConfig::from_yaml(r#"
//! max_nesting_depth: 16
//! failure:
//!   placeholder: "<!-- shortcode failed -->"
//! timeout_ms: 2000
//! "#).unwrap();
//!
//! assert_eq!(config.max_nesting_depth, 16);
//! assert_eq!(
//!     config.failure,
//!     FailureBehavior::Placeholder("<!-- shortcode failed -->".into())
//! );
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default limit on paired-tag nesting.
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 128;

/// What a tag whose handler failed is replaced with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureBehavior {
    /// Replace with nothing.
    #[default]
    Empty,
    /// Replace with fixed text.
    Placeholder(String),
}

impl FailureBehavior {
    pub fn replacement(&self) -> &str {
        match self {
            FailureBehavior::Empty => "",
            FailureBehavior::Placeholder(text) => text,
        }
    }
}

/// How to treat an opening tag that has no matching closing tag. Either way
/// an `UnclosedTag` diagnostic is recorded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnclosedTagBehavior {
    /// Invoke the handler with empty content, as if self-closing.
    #[default]
    Standalone,
    /// Echo the tag verbatim.
    Literal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Paired tags nested deeper than this are echoed unexpanded.
    pub max_nesting_depth: usize,
    /// Written as `failure: empty` or `failure: { placeholder: "..." }`.
    #[serde(with = "serde_yaml::with::singleton_map")]
    pub failure: FailureBehavior,
    pub unclosed: UnclosedTagBehavior,
    /// Deadline for one evaluate call, in milliseconds.
    pub timeout_ms: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
            failure: FailureBehavior::default(),
            unclosed: UnclosedTagBehavior::default(),
            timeout_ms: None,
        }
    }
}

impl EngineConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_nesting_depth == 0 {
            return Err(ConfigError::InvalidValue {
                key: "max_nesting_depth",
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }

    pub fn with_max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }

    pub fn with_failure(mut self, failure: FailureBehavior) -> Self {
        self.failure = failure;
        self
    }

    pub fn with_unclosed(mut self, unclosed: UnclosedTagBehavior) -> Self {
        self.unclosed = unclosed;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}
