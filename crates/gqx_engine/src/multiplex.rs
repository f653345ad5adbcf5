//! The multiplex coordinator.
//!
//! Runs N requests under one batching window: uniform-strategy validation,
//! hook setup, per-request static analysis, eager evaluation, breadth-first
//! deferred draining across all requests, response assembly in input order,
//! and hook teardown. Request-scoped errors stay in their own response; only
//! batch-level defects surface as [`BatchError`].

use crate::authorize::check_accessible;
use crate::config::EngineConfig;
use crate::directives::DirectiveRegistry;
use crate::evaluator::{Evaluator, RootUnit};
use crate::hooks::HookStack;
use crate::resolver::ResolverMap;
use crate::response::Response;
use gqx_ast::{Document, OperationKind, Selection};
use gqx_core::{codes, BatchError, Context, GraphQLError};
use gqx_schema::Schema;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;

/// How a request wants to be executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStrategy {
    /// Shares the batch window with other requests.
    Batched,
    /// Requires a window of its own.
    Unbatched,
}

/// One request of a batch.
pub struct Request {
    pub document: Arc<Document>,
    pub operation_name: Option<String>,
    pub context: Context,
    pub root_value: Value,
    pub strategy: ExecutionStrategy,
    /// Errors recorded by validation before the request reached the engine.
    /// A non-empty list marks the request invalid; it executes nothing.
    pub static_errors: Vec<GraphQLError>,
}

impl Request {
    /// Creates a batched request over a document.
    pub fn new(document: Arc<Document>) -> Self {
        Self {
            document,
            operation_name: None,
            context: Context::new(),
            root_value: Value::Null,
            strategy: ExecutionStrategy::Batched,
            static_errors: Vec::new(),
        }
    }

    /// Selects the operation to execute by name.
    pub fn with_operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }

    /// Sets the request context.
    pub fn with_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    /// Sets the root value handed to root-field resolvers.
    pub fn with_root_value(mut self, value: Value) -> Self {
        self.root_value = value;
        self
    }

    /// Marks the request as requiring its own batch window.
    pub fn unbatched(mut self) -> Self {
        self.strategy = ExecutionStrategy::Unbatched;
        self
    }

    /// Attaches a validation error, marking the request invalid.
    pub fn with_static_error(mut self, error: GraphQLError) -> Self {
        self.static_errors.push(error);
        self
    }
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Request")
            .field("operation_name", &self.operation_name)
            .field("strategy", &self.strategy)
            .field("static_errors", &self.static_errors.len())
            .finish()
    }
}

/// Per-request state inside one batch.
enum Slot {
    /// No operation ran; the result is the recorded errors with no data.
    Static {
        errors: Vec<GraphQLError>,
        context: Context,
    },
    /// An evaluator owning the request's trace.
    Live {
        evaluator: Evaluator,
        units: VecDeque<RootUnit>,
        eager: bool,
    },
}

/// Executes batches of requests against one schema and resolver set.
pub struct MultiplexCoordinator {
    schema: Arc<Schema>,
    resolvers: Arc<ResolverMap>,
    directives: Arc<DirectiveRegistry>,
    hooks: Arc<HookStack>,
    config: Arc<EngineConfig>,
}

impl MultiplexCoordinator {
    /// Creates a coordinator with no custom directives, hooks or limits.
    pub fn new(schema: Schema, resolvers: ResolverMap) -> Self {
        Self {
            schema: Arc::new(schema),
            resolvers: Arc::new(resolvers),
            directives: Arc::new(DirectiveRegistry::new()),
            hooks: Arc::new(HookStack::new()),
            config: Arc::new(EngineConfig::default()),
        }
    }

    /// Installs the runtime directive registry.
    pub fn with_directives(mut self, directives: DirectiveRegistry) -> Self {
        self.directives = Arc::new(directives);
        self
    }

    /// Installs the hook stack.
    pub fn with_hooks(mut self, hooks: HookStack) -> Self {
        self.hooks = Arc::new(hooks);
        self
    }

    /// Installs the engine configuration.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = Arc::new(config);
        self
    }

    /// Executes one request in its own window.
    pub async fn execute_one(&self, request: Request) -> Result<Response, BatchError> {
        let mut responses = self.execute(vec![request]).await?;
        Ok(responses.remove(0))
    }

    /// Executes a batch, returning one response per request in input order.
    pub async fn execute(&self, requests: Vec<Request>) -> Result<Vec<Response>, BatchError> {
        if requests.len() > self.config.max_batch_size {
            return Err(BatchError::BatchTooLarge {
                given: requests.len(),
                limit: self.config.max_batch_size,
            });
        }
        if requests.len() > 1
            && requests
                .iter()
                .any(|r| r.strategy == ExecutionStrategy::Unbatched)
        {
            return Err(BatchError::MixedStrategies);
        }

        tracing::debug!(requests = requests.len(), "starting batch window");

        // Hooks run against the contexts before evaluators take ownership.
        let mut requests = requests;
        let mut contexts: Vec<Context> = requests
            .iter_mut()
            .map(|request| std::mem::replace(&mut request.context, Context::new()))
            .collect();

        let (progress, setup_error) = self.hooks.setup(&mut contexts);
        if let Some(error) = setup_error {
            for (index, ctx) in contexts.iter_mut().enumerate() {
                self.hooks.request_teardown(progress.request_completed[index], ctx);
            }
            self.hooks.batch_teardown(progress.batch_completed);
            return Err(error);
        }

        // Static analysis, then eager evaluation up to the first deferreds.
        let mut slots: Vec<Slot> = requests
            .into_iter()
            .zip(contexts)
            .map(|(request, context)| self.analyze(request, context))
            .collect();

        // Mutation roots run serially: each unit drains fully, futures
        // included, before the next unit starts.
        for slot in &mut slots {
            let Slot::Live {
                evaluator,
                units,
                eager: true,
            } = slot
            else {
                continue;
            };
            while let Some(unit) = units.pop_front() {
                evaluator.evaluate_unit(unit);
                while let Some(pending) = evaluator.take_pending() {
                    let result = pending.deferred.resolve().await;
                    (pending.continuation)(evaluator, result);
                }
            }
        }

        for slot in &mut slots {
            let Slot::Live {
                evaluator,
                units,
                eager: false,
            } = slot
            else {
                continue;
            };
            while let Some(unit) = units.pop_front() {
                evaluator.evaluate_unit(unit);
            }
        }

        // Breadth-first drain: one pending per request per round, so
        // batched backend work lines up across requests.
        loop {
            let mut progressed = false;
            for slot in &mut slots {
                let Slot::Live { evaluator, .. } = slot else {
                    continue;
                };
                if let Some(pending) = evaluator.take_pending() {
                    let result = pending.deferred.resolve().await;
                    (pending.continuation)(evaluator, result);
                    progressed = true;
                }
            }
            if !progressed {
                break;
            }
        }

        for (index, slot) in slots.iter_mut().enumerate() {
            let completed = progress.request_completed[index];
            match slot {
                Slot::Static { context, .. } => self.hooks.request_teardown(completed, context),
                Slot::Live { evaluator, .. } => {
                    self.hooks.request_teardown(completed, evaluator.context_mut())
                }
            }
        }
        self.hooks.batch_teardown(progress.batch_completed);

        Ok(slots
            .into_iter()
            .map(|slot| match slot {
                Slot::Static { errors, .. } => Response::errors(errors),
                Slot::Live { evaluator, .. } => evaluator.finish(),
            })
            .collect())
    }

    /// Pre-execution analysis: operation lookup, complexity limit and the
    /// accessibility pass. Failing requests become static slots.
    fn analyze(&self, request: Request, context: Context) -> Slot {
        if !request.static_errors.is_empty() {
            return Slot::Static {
                errors: request.static_errors,
                context,
            };
        }

        let operation_name = request.operation_name.as_deref();
        let Some(operation) = request.document.operation(operation_name) else {
            let message = match operation_name {
                Some(name) => format!("Unknown operation '{}'", name),
                None => "No operation selected".to_string(),
            };
            return Slot::Static {
                errors: vec![GraphQLError::new(message).with_code(codes::NO_OPERATION)],
                context,
            };
        };

        let (root_type, kind_name) = match operation.kind {
            OperationKind::Query => (self.schema.query_type(), "query"),
            OperationKind::Mutation => (self.schema.mutation_type(), "mutation"),
            OperationKind::Subscription => (self.schema.subscription_type(), "subscription"),
        };
        let Some(root_type) = root_type.map(str::to_string) else {
            return Slot::Static {
                errors: vec![GraphQLError::new(format!(
                    "Schema is not configured for {} operations",
                    kind_name
                ))
                .with_code(codes::NO_OPERATION)],
                context,
            };
        };

        if let Some(limit) = self.config.max_complexity {
            let cost = complexity(&request.document, &operation.selections, &mut Vec::new());
            if cost > limit {
                return Slot::Static {
                    errors: vec![GraphQLError::new(format!(
                        "Query has complexity {}, exceeding the limit of {}",
                        cost, limit
                    ))
                    .with_code(codes::COMPLEXITY_LIMIT)],
                    context,
                };
            }
        }

        if let Some(error) = check_accessible(
            &self.schema,
            &request.document,
            operation,
            &root_type,
            &context,
        ) {
            return Slot::Static {
                errors: vec![error],
                context,
            };
        }

        let eager = operation.kind == OperationKind::Mutation;
        let mut evaluator = Evaluator::new(
            Arc::clone(&self.schema),
            Arc::clone(&self.resolvers),
            Arc::clone(&self.directives),
            Arc::clone(&self.config),
            Arc::clone(&request.document),
            context,
            request.root_value,
            eager,
        );
        let units = match evaluator.prepare_root(operation_name) {
            Ok(units) => units.into(),
            Err(error) => {
                evaluator.push_error(error);
                VecDeque::new()
            }
        };
        Slot::Live {
            evaluator,
            units,
            eager,
        }
    }
}

impl std::fmt::Debug for MultiplexCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiplexCoordinator")
            .field("schema", &self.schema)
            .field("config", &self.config)
            .finish()
    }
}

/// Counts field selections, fragments expanded, for the complexity limit.
fn complexity(document: &Document, selections: &[Selection], spreading: &mut Vec<String>) -> usize {
    let mut count = 0;
    for selection in selections {
        match selection {
            Selection::Field(field) => {
                count += 1 + complexity(document, &field.selections, spreading);
            }
            Selection::InlineFragment(inline) => {
                count += complexity(document, &inline.selections, spreading);
            }
            Selection::FragmentSpread(spread) => {
                if spreading.iter().any(|name| name == &spread.name) {
                    continue;
                }
                if let Some(fragment) = document.fragment(&spread.name) {
                    spreading.push(spread.name.clone());
                    count += complexity(document, &fragment.selections, spreading);
                    spreading.pop();
                }
            }
        }
    }
    count
}
