//! Error model for the gqx execution engine.
//!
//! Two families of errors exist:
//! - [`GraphQLError`]: wire-level errors recorded in a request's `errors`
//!   list. These never abort other requests in a batch.
//! - [`BatchError`]: fatal defects that abort the entire batch.

use crate::path::{PathSegment, ResponsePath};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A source location (1-indexed line and column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

impl Location {
    /// Creates a new location.
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// A wire-level error attached to one request's result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphQLError {
    /// The error message.
    pub message: String,
    /// The response path of the value that produced the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<PathSegment>>,
    /// Source locations, when the AST node carried one.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub locations: Vec<Location>,
    /// Error extensions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<HashMap<String, serde_json::Value>>,
}

impl GraphQLError {
    /// Creates a new error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: None,
            locations: Vec::new(),
            extensions: None,
        }
    }

    /// Attaches a response path.
    pub fn with_path(mut self, path: &ResponsePath) -> Self {
        self.path = Some(path.segments().to_vec());
        self
    }

    /// Attaches a source location.
    pub fn with_location(mut self, location: Location) -> Self {
        self.locations.push(location);
        self
    }

    /// Adds an extension entry.
    pub fn with_extension(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extensions
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value);
        self
    }

    /// Sets the error code extension.
    pub fn with_code(self, code: &str) -> Self {
        self.with_extension("code", serde_json::Value::String(code.to_string()))
    }

    /// Returns the error code extension, if set.
    pub fn code(&self) -> Option<&str> {
        self.extensions
            .as_ref()
            .and_then(|ext| ext.get("code"))
            .and_then(|v| v.as_str())
    }
}

impl std::fmt::Display for GraphQLError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// A fatal defect that aborts an entire batch.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    /// Requests with incompatible execution strategies were batched together.
    #[error("cannot batch requests with mixed execution strategies")]
    MixedStrategies,

    /// The batch exceeds the configured size limit.
    #[error("batch of {given} requests exceeds the limit of {limit}")]
    BatchTooLarge { given: usize, limit: usize },

    /// A setup or teardown hook failed.
    #[error("hook `{name}` failed: {reason}")]
    Hook { name: String, reason: String },

    /// An engine-internal invariant was violated.
    #[error("internal defect: {0}")]
    Internal(String),
}

/// Well-known error codes recorded in the `code` extension.
pub mod codes {
    /// A non-null position resolved to null.
    pub const INVALID_NULL: &str = "INVALID_NULL";
    /// An abstract type resolved to a non-member concrete type.
    pub const UNRESOLVED_TYPE: &str = "UNRESOLVED_TYPE";
    /// Aggregate pre-execution accessibility failure.
    pub const INACCESSIBLE_FIELDS: &str = "INACCESSIBLE_FIELDS";
    /// A value failed its `authorized` check.
    pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
    /// A resolver produced an enum value hidden from the current context.
    pub const HIDDEN_ENUM_VALUE: &str = "HIDDEN_ENUM_VALUE";
    /// The request exceeded the configured complexity limit.
    pub const COMPLEXITY_LIMIT: &str = "COMPLEXITY_LIMIT";
    /// The request named no executable operation.
    pub const NO_OPERATION: &str = "NO_OPERATION";
}
