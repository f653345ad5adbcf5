//! Engine configuration.

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum number of requests in one batch.
    pub max_batch_size: usize,
    /// Maximum number of field selections per request, fragments expanded.
    pub max_complexity: Option<usize>,
    /// Whether `__schema`/`__type` meta fields resolve.
    pub introspection: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 64,
            max_complexity: None,
            introspection: true,
        }
    }
}

impl EngineConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum batch size.
    pub fn with_max_batch_size(mut self, size: usize) -> Self {
        self.max_batch_size = size;
        self
    }

    /// Sets the complexity limit.
    pub fn with_max_complexity(mut self, limit: usize) -> Self {
        self.max_complexity = Some(limit);
        self
    }

    /// Disables introspection (recommended for production).
    pub fn disable_introspection(mut self) -> Self {
        self.introspection = false;
        self
    }
}
