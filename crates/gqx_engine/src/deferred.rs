//! Deferred values.
//!
//! A [`Deferred`] is a value whose concrete result is not yet known. It is
//! backed either by a thunk (cheap, synchronously forcible) or by a boxed
//! future (awaited by the multiplex drain loop). A deferred may resolve to
//! another deferred; the engine drains transitively.

use crate::resolver::{ResolverError, ResolverResult};
use gqx_core::GraphQLError;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;

/// A resolved-or-pending field value.
pub enum FieldValue {
    /// A concrete value.
    Value(Value),
    /// A value produced later.
    Deferred(Deferred),
    /// A list whose elements resolve independently.
    List(Vec<ResolverResult>),
    /// Sentinel: write nothing at this path and do not descend.
    Skip,
    /// Marker: the carried value failed its `authorized` check.
    Unauthorized(Value),
    /// An error value: recorded at the path, the path becomes null.
    Error(GraphQLError),
    /// A homogeneous list of error values, recorded together.
    ErrorList(Vec<GraphQLError>),
}

impl FieldValue {
    /// A concrete null.
    pub fn null() -> Self {
        Self::Value(Value::Null)
    }

    /// Wraps a thunk as a deferred value.
    pub fn deferred<F>(f: F) -> Self
    where
        F: FnOnce() -> ResolverResult + Send + 'static,
    {
        Self::Deferred(Deferred::new(f))
    }

    /// Wraps a future as a deferred value.
    pub fn future<Fut>(fut: Fut) -> Self
    where
        Fut: Future<Output = ResolverResult> + Send + 'static,
    {
        Self::Deferred(Deferred::future(fut))
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl std::fmt::Debug for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Self::Deferred(d) => d.fmt(f),
            Self::List(items) => f.debug_tuple("List").field(&items.len()).finish(),
            Self::Skip => f.write_str("Skip"),
            Self::Unauthorized(_) => f.write_str("Unauthorized"),
            Self::Error(e) => f.debug_tuple("Error").field(&e.message).finish(),
            Self::ErrorList(es) => f.debug_tuple("ErrorList").field(&es.len()).finish(),
        }
    }
}

type Thunk = Box<dyn FnOnce() -> ResolverResult + Send>;
type BoxedFuture = Pin<Box<dyn Future<Output = ResolverResult> + Send>>;

enum Source {
    Thunk(Thunk),
    Future(BoxedFuture),
}

/// A value produced later, owned by exactly one registered continuation.
pub struct Deferred {
    source: Source,
}

impl Deferred {
    /// Creates a deferred value from a thunk.
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce() -> ResolverResult + Send + 'static,
    {
        Self {
            source: Source::Thunk(Box::new(f)),
        }
    }

    /// Creates a deferred value from a thunk producing a plain value.
    pub fn value<F>(f: F) -> Self
    where
        F: FnOnce() -> Value + Send + 'static,
    {
        Self::new(move || Ok(FieldValue::Value(f())))
    }

    /// Creates a deferred value from a future.
    pub fn future<Fut>(fut: Fut) -> Self
    where
        Fut: Future<Output = ResolverResult> + Send + 'static,
    {
        Self {
            source: Source::Future(Box::pin(fut)),
        }
    }

    /// Returns true if this deferred can be forced without awaiting.
    pub fn is_sync(&self) -> bool {
        matches!(self.source, Source::Thunk(_))
    }

    /// Resolves one step. The result may itself be deferred.
    pub async fn resolve(self) -> ResolverResult {
        match self.source {
            Source::Thunk(thunk) => thunk(),
            Source::Future(fut) => fut.await,
        }
    }

    /// Forces a thunk-backed deferred synchronously.
    ///
    /// Future-backed deferreds are handed back unchanged for the drain loop.
    pub fn try_resolve_sync(self) -> Result<ResolverResult, Deferred> {
        match self.source {
            Source::Thunk(thunk) => Ok(thunk()),
            source => Err(Self { source }),
        }
    }
}

impl std::fmt::Debug for Deferred {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.source {
            Source::Thunk(_) => f.write_str("Deferred(thunk)"),
            Source::Future(_) => f.write_str("Deferred(future)"),
        }
    }
}

impl From<ResolverError> for FieldValue {
    fn from(error: ResolverError) -> Self {
        Self::Error(GraphQLError::new(error.to_string()))
    }
}
