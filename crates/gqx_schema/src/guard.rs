//! The three-tier authorization capability.

use gqx_core::Context;
use serde_json::Value;
use std::sync::Arc;

/// The result of an `authorized` check.
///
/// `visible` and `accessible` are evaluated during static analysis and are
/// always synchronous; `authorized` runs per concrete object and may hand
/// back a deferred boolean that the engine drains through the trace before
/// branching.
pub enum GuardCheck {
    /// The outcome is known now.
    Ready(bool),
    /// The outcome is produced later, e.g. after a batched permission fetch.
    Deferred(Box<dyn FnOnce() -> bool + Send>),
}

impl GuardCheck {
    /// Shorthand for an immediate allow.
    pub fn allow() -> Self {
        Self::Ready(true)
    }

    /// Shorthand for an immediate deny.
    pub fn deny() -> Self {
        Self::Ready(false)
    }

    /// Wraps a thunk producing the outcome later.
    pub fn deferred<F>(f: F) -> Self
    where
        F: FnOnce() -> bool + Send + 'static,
    {
        Self::Deferred(Box::new(f))
    }
}

impl std::fmt::Debug for GuardCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ready(b) => f.debug_tuple("Ready").field(b).finish(),
            Self::Deferred(_) => f.debug_tuple("Deferred").finish(),
        }
    }
}

/// Per-member authorization capability.
///
/// Implemented per member kind and composed by delegation; every schema
/// member carries an `Arc<dyn Guard>` and the default allows everything.
pub trait Guard: Send + Sync {
    /// Whether the member exists at all for this context.
    ///
    /// Hidden members behave as absent from the schema.
    fn visible(&self, _ctx: &Context) -> bool {
        true
    }

    /// Whether the member may be requested by this context.
    ///
    /// Checked before execution; any failure aborts the whole request with
    /// one aggregate error.
    fn accessible(&self, _ctx: &Context) -> bool {
        true
    }

    /// Whether this concrete value may be returned for this context.
    fn authorized(&self, _parent: &Value, _ctx: &Context) -> GuardCheck {
        GuardCheck::allow()
    }
}

/// The default guard: everything visible, accessible and authorized.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl Guard for AllowAll {}

/// Returns the shared allow-all guard.
pub fn allow_all() -> Arc<dyn Guard> {
    Arc::new(AllowAll)
}
