//! Per-request results.

use gqx_core::GraphQLError;
use serde::{Deserialize, Serialize};

/// The result of executing one request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// The data tree, absent when no data could be computed at all.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    /// Errors recorded while executing, absent when none occurred.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<GraphQLError>>,
}

impl Response {
    /// Creates a response from data and an error list.
    pub fn new(data: Option<serde_json::Value>, errors: Vec<GraphQLError>) -> Self {
        Self {
            data,
            errors: if errors.is_empty() { None } else { Some(errors) },
        }
    }

    /// Creates a successful response with data.
    pub fn data(data: serde_json::Value) -> Self {
        Self {
            data: Some(data),
            errors: None,
        }
    }

    /// Creates an error-only response.
    pub fn errors(errors: Vec<GraphQLError>) -> Self {
        Self {
            data: None,
            errors: Some(errors),
        }
    }

    /// Returns true if the response has errors.
    pub fn has_errors(&self) -> bool {
        self.errors.as_ref().is_some_and(|e| !e.is_empty())
    }

    /// Returns true if the response has data.
    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }
}
