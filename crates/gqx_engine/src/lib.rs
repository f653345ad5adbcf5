//! Execution engine for gqx.
//!
//! This crate executes validated queries against a schema:
//! - `deferred`: deferred field values (thunks and futures)
//! - `resolver`: the resolver trait, function resolvers and the registry
//! - `trace`: the per-request partial response and pending-value queue
//! - `selection`: selection gathering and directive-ancestry grouping
//! - `directives`: skip/include and runtime interceptor chains
//! - `authorize`: the pre-execution accessibility pass
//! - `introspection`: `__typename`/`__schema`/`__type` payloads
//! - `evaluator`: the recursive selection evaluator
//! - `hooks`: ordered setup/teardown hook stack
//! - `multiplex`: the batch coordinator
//! - `response`: per-request results
//! - `config`: engine limits and switches

pub mod authorize;
pub mod config;
pub mod deferred;
pub mod directives;
pub mod evaluator;
pub mod hooks;
pub mod introspection;
pub mod multiplex;
pub mod resolver;
pub mod response;
pub mod selection;
pub mod trace;

pub use config::EngineConfig;
pub use deferred::{Deferred, FieldValue};
pub use directives::{
    DirectiveInvocation, DirectiveLocation, DirectiveNext, DirectiveRegistry, RuntimeDirective,
};
pub use evaluator::{Continuation, Evaluator, FieldResolution, RootUnit};
pub use hooks::{BatchHook, HookStack, RequestHook, SetupProgress};
pub use multiplex::{ExecutionStrategy, MultiplexCoordinator, Request};
pub use resolver::{
    FnResolver, Resolver, ResolverArgs, ResolverError, ResolverInfo, ResolverMap, ResolverResult,
};
pub use response::Response;
pub use selection::{GatheredSet, Gatherer, SelectionGroup};
pub use trace::{Pending, Trace};
