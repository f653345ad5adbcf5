//! Directive handling.
//!
//! Built-in `skip`/`include` are pure predicates applied before selection
//! merging. Custom runtime directives wrap node evaluation with interceptor
//! chains built outermost-to-innermost in declaration order.

use crate::deferred::FieldValue;
use crate::resolver::{ResolverError, ResolverResult};
use gqx_ast::{coerce_arguments, CoercedArguments, Directive};
use gqx_core::ResponsePath;
use rustc_hash::FxHashMap;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Where a runtime directive was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveLocation {
    Field,
    FragmentSpread,
    InlineFragment,
}

/// Context handed to a runtime directive when its node is evaluated.
#[derive(Debug, Clone)]
pub struct DirectiveInvocation {
    /// The directive name.
    pub name: String,
    /// Where the directive was applied.
    pub location: DirectiveLocation,
    /// The response path of the wrapped node.
    pub path: ResponsePath,
    /// Coerced directive arguments.
    pub arguments: CoercedArguments,
    /// Number of field selections the wrapping covers.
    pub field_count: usize,
}

/// The continuation representing "run the next interceptor, or the base
/// resolution if this is the innermost one".
pub type DirectiveNext<'a> = &'a mut dyn FnMut() -> ResolverResult;

/// A custom runtime directive.
///
/// The interceptor must invoke `next` itself to produce a result and may
/// wrap the (possibly deferred) result in surrounding logic. Invoking `next`
/// more than once is a usage error and yields an internal error.
pub trait RuntimeDirective: Send + Sync {
    /// Evaluates the wrapped node.
    fn resolve(&self, invocation: &DirectiveInvocation, next: DirectiveNext<'_>) -> ResolverResult;

    /// When true, thunk-backed deferred work registered while `next` runs is
    /// drained before the chain returns, so batched loader work inside the
    /// continuation flushes independently of outer batching.
    fn isolated(&self) -> bool {
        false
    }
}

/// Registry of runtime directives by name.
#[derive(Default)]
pub struct DirectiveRegistry {
    directives: FxHashMap<String, Arc<dyn RuntimeDirective>>,
}

impl DirectiveRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a runtime directive.
    pub fn register(&mut self, name: impl Into<String>, directive: Arc<dyn RuntimeDirective>) {
        self.directives.insert(name.into(), directive);
    }

    /// Looks up a runtime directive.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn RuntimeDirective>> {
        self.directives.get(name)
    }
}

impl std::fmt::Debug for DirectiveRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectiveRegistry")
            .field("count", &self.directives.len())
            .finish()
    }
}

/// One prepared link of an interceptor chain.
#[derive(Clone)]
pub struct ChainLink {
    pub name: String,
    pub runtime: Arc<dyn RuntimeDirective>,
    pub arguments: CoercedArguments,
    pub location: DirectiveLocation,
}

impl std::fmt::Debug for ChainLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainLink")
            .field("name", &self.name)
            .field("location", &self.location)
            .finish()
    }
}

impl ChainLink {
    /// Builds the invocation handed to the interceptor.
    pub fn invocation(&self, path: &ResponsePath, field_count: usize) -> DirectiveInvocation {
        DirectiveInvocation {
            name: self.name.clone(),
            location: self.location,
            path: path.clone(),
            arguments: self.arguments.clone(),
            field_count,
        }
    }
}

/// Prepares chain links for the runtime directives applied to one node.
///
/// `skip`/`include` are consumed elsewhere; unregistered names are ignored
/// (the validator owns unknown-directive errors).
pub fn prepare_links(
    registry: &DirectiveRegistry,
    directives: &[Directive],
    location: DirectiveLocation,
    variables: &HashMap<String, Value>,
) -> Vec<ChainLink> {
    directives
        .iter()
        .filter(|d| d.name != "skip" && d.name != "include")
        .filter_map(|d| {
            registry.get(&d.name).map(|runtime| ChainLink {
                name: d.name.clone(),
                runtime: Arc::clone(runtime),
                arguments: coerce_arguments(&d.arguments, variables, &[]),
                location,
            })
        })
        .collect()
}

/// Evaluates `skip`/`include` for one selection node.
///
/// A failing check excludes the node before any merging happens.
pub fn include_selection(directives: &[Directive], variables: &HashMap<String, Value>) -> bool {
    for directive in directives {
        let condition = || {
            let args = coerce_arguments(&directive.arguments, variables, &[]);
            args.get("if").and_then(Value::as_bool).unwrap_or(false)
        };
        match directive.name.as_str() {
            "skip" if condition() => return false,
            "include" if !condition() => return false,
            _ => {}
        }
    }
    true
}

/// Runs an interceptor chain around `base`, outermost link first.
pub fn run_chain(
    links: &[(Arc<dyn RuntimeDirective>, DirectiveInvocation)],
    base: &mut dyn FnMut() -> ResolverResult,
) -> ResolverResult {
    match links.split_first() {
        None => base(),
        Some(((runtime, invocation), rest)) => {
            let mut invoked = false;
            let mut next = || {
                if invoked {
                    return Err(ResolverError::Internal(format!(
                        "directive @{} invoked its continuation more than once",
                        invocation.name
                    )));
                }
                invoked = true;
                run_chain(rest, &mut *base)
            };
            runtime.resolve(invocation, &mut next)
        }
    }
}

/// Returns a pass-through result for chains whose return value is unused.
pub fn chain_placeholder() -> ResolverResult {
    Ok(FieldValue::null())
}
