//! Request-scoped execution context.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Request-scoped context handed to resolvers, guards and directives.
///
/// Read-only after construction except for the key/value store; there is no
/// ambient global state anywhere in the engine.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Request-scoped data.
    data: HashMap<String, serde_json::Value>,
    /// Variables from the request.
    variables: HashMap<String, serde_json::Value>,
}

impl Context {
    /// Creates a new context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context with variables.
    pub fn with_variables(variables: HashMap<String, serde_json::Value>) -> Self {
        Self {
            data: HashMap::new(),
            variables,
        }
    }

    /// Sets a value in the context.
    pub fn set<T: Serialize>(&mut self, key: impl Into<String>, value: T) {
        if let Ok(v) = serde_json::to_value(value) {
            self.data.insert(key.into(), v);
        }
    }

    /// Gets a value from the context.
    pub fn get<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Option<T> {
        self.data
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Gets a variable by name.
    pub fn variable(&self, name: &str) -> Option<&serde_json::Value> {
        self.variables.get(name)
    }

    /// Returns all variables.
    pub fn variables(&self) -> &HashMap<String, serde_json::Value> {
        &self.variables
    }
}
