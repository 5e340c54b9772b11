//! Per-evaluation property bag shared by handlers.
//!
//! A [`Context`] lives for one evaluate call. Handlers read and write it to
//! talk to each other, e.g. a heading shortcode recording entries that a
//! table-of-contents shortcode later in the same document reads back.
//! Keys and value shapes are a convention between handlers; the engine
//! attaches no meaning to them.
//!
//! [`ContextProvider`]s seed the bag before evaluation starts.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Dynamically keyed values threaded through one evaluation.
///
/// # Example
///
/// ```rust
/// use shortcodes::Context;
///
/// let mut ctx = Context::new();
/// ctx.insert("site", "Docs");
/// assert_eq!(ctx.string_value("site", "?"), "Docs");
/// assert_eq!(ctx.increment("figures"), 1);
/// assert_eq!(ctx.increment("figures"), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    values: Map<String, Value>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value, returning the previous one.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(key.into(), value.into())
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.values.get_mut(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// The value as text, or `default` when absent or null.
    ///
    /// Strings are returned as-is; other values use their JSON form.
    pub fn string_value(&self, key: &str, default: &str) -> String {
        match self.values.get(key) {
            None | Some(Value::Null) => default.to_string(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }

    /// Deserializes the value at `key` into `T`.
    ///
    /// Returns `None` when the key is missing or the shape does not fit.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.values
            .get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// Adds one to an integer counter and returns the new value.
    ///
    /// Missing or non-integer values restart at zero.
    pub fn increment(&mut self, key: &str) -> i64 {
        let next = self.values.get(key).and_then(Value::as_i64).unwrap_or(0) + 1;
        self.values.insert(key.to_string(), Value::from(next));
        next
    }

    /// Appends to a list, creating it if needed.
    ///
    /// A non-list value under `key` is replaced by a new list.
    pub fn push(&mut self, key: &str, value: impl Into<Value>) {
        let entry = self
            .values
            .entry(key.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if !entry.is_array() {
            *entry = Value::Array(Vec::new());
        }
        if let Value::Array(items) = entry {
            items.push(value.into());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// A JSON object snapshot, as exposed to templates.
    pub fn to_json(&self) -> Value {
        Value::Object(self.values.clone())
    }
}

/// Seeds a [`Context`] before each evaluate call.
///
/// Closures taking `&mut Context` implement this trait.
pub trait ContextProvider: Send + Sync {
    fn contribute(&self, ctx: &mut Context);
}

impl<F> ContextProvider for F
where
    F: Fn(&mut Context) + Send + Sync,
{
    fn contribute(&self, ctx: &mut Context) {
        self(ctx)
    }
}
