//! Batch coordination: hook ordering, setup failure unwinding, per-request
//! isolation, strategy and size limits, and input-order responses.

use gqx_ast::{Document, FieldNode, Operation, OperationKind};
use gqx_core::{codes, BatchError, Context, GraphQLError};
use gqx_engine::{
    BatchHook, EngineConfig, FieldValue, HookStack, MultiplexCoordinator, Request, RequestHook,
    ResolverMap,
};
use gqx_schema::{FieldDef, ObjectDef, Schema, SchemaBuilder, TypeRef};
use serde_json::json;
use std::sync::{Arc, Mutex};

fn greeting_schema() -> Schema {
    SchemaBuilder::new()
        .query_type("Query")
        .add_type(
            ObjectDef::new("Query")
                .with_field(FieldDef::new("greeting", TypeRef::named("String")))
                .with_field(FieldDef::new("slow", TypeRef::named("String"))),
        )
        .build()
}

fn greeting_resolvers() -> ResolverMap {
    let mut resolvers = ResolverMap::new();
    resolvers.register_fn("Query", "greeting", |_, _, ctx: &Context, _| {
        let who = ctx.get::<String>("who").unwrap_or_else(|| "world".into());
        Ok(FieldValue::Value(json!(format!("hello {who}"))))
    });
    resolvers.register_fn("Query", "slow", |_, _, _, _| {
        Ok(FieldValue::future(async {
            Ok(FieldValue::Value(json!("eventually")))
        }))
    });
    resolvers
}

fn greeting_query() -> Arc<Document> {
    Arc::new(Document::new().with_operation(
        Operation::new(OperationKind::Query).with_selection(FieldNode::new("greeting").into()),
    ))
}

fn slow_query() -> Arc<Document> {
    Arc::new(Document::new().with_operation(
        Operation::new(OperationKind::Query).with_selection(FieldNode::new("slow").into()),
    ))
}

type Log = Arc<Mutex<Vec<String>>>;

struct LoggedBatchHook {
    name: &'static str,
    log: Log,
    fail: bool,
}

impl BatchHook for LoggedBatchHook {
    fn name(&self) -> &str {
        self.name
    }

    fn before(&self) -> Result<(), String> {
        if self.fail {
            return Err("refused".to_string());
        }
        self.log.lock().unwrap().push(format!("{}:before", self.name));
        Ok(())
    }

    fn after(&self) {
        self.log.lock().unwrap().push(format!("{}:after", self.name));
    }
}

struct LoggedRequestHook {
    name: &'static str,
    log: Log,
    fail: bool,
}

impl RequestHook for LoggedRequestHook {
    fn name(&self) -> &str {
        self.name
    }

    fn before(&self, _ctx: &mut Context) -> Result<(), String> {
        if self.fail {
            return Err("refused".to_string());
        }
        self.log.lock().unwrap().push(format!("{}:before", self.name));
        Ok(())
    }

    fn after(&self, _ctx: &mut Context) {
        self.log.lock().unwrap().push(format!("{}:after", self.name));
    }
}

#[tokio::test]
async fn hooks_run_in_order_and_unwind_in_reverse() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let mut hooks = HookStack::new();
    hooks.add_batch_hook(Arc::new(LoggedBatchHook {
        name: "pool",
        log: Arc::clone(&log),
        fail: false,
    }));
    hooks.add_request_hook(Arc::new(LoggedRequestHook {
        name: "auth",
        log: Arc::clone(&log),
        fail: false,
    }));
    hooks.add_request_hook(Arc::new(LoggedRequestHook {
        name: "span",
        log: Arc::clone(&log),
        fail: false,
    }));

    let coordinator = MultiplexCoordinator::new(greeting_schema(), greeting_resolvers())
        .with_hooks(hooks);
    let response = coordinator
        .execute_one(Request::new(greeting_query()))
        .await
        .unwrap();

    assert_eq!(response.data, Some(json!({"greeting": "hello world"})));
    assert_eq!(
        *log.lock().unwrap(),
        vec![
            "pool:before",
            "auth:before",
            "span:before",
            "span:after",
            "auth:after",
            "pool:after",
        ]
    );
}

#[tokio::test]
async fn failing_request_hook_unwinds_only_the_completed_prefix() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let mut hooks = HookStack::new();
    hooks.add_request_hook(Arc::new(LoggedRequestHook {
        name: "first",
        log: Arc::clone(&log),
        fail: false,
    }));
    hooks.add_request_hook(Arc::new(LoggedRequestHook {
        name: "second",
        log: Arc::clone(&log),
        fail: true,
    }));
    hooks.add_request_hook(Arc::new(LoggedRequestHook {
        name: "third",
        log: Arc::clone(&log),
        fail: false,
    }));

    let coordinator = MultiplexCoordinator::new(greeting_schema(), greeting_resolvers())
        .with_hooks(hooks);
    let result = coordinator.execute_one(Request::new(greeting_query())).await;

    match result {
        Err(BatchError::Hook { name, reason }) => {
            assert_eq!(name, "second");
            assert_eq!(reason, "refused");
        }
        other => panic!("expected hook failure, got {:?}", other),
    }
    // Only the first hook ran and only its after unwound; the third never
    // started.
    assert_eq!(*log.lock().unwrap(), vec!["first:before", "first:after"]);
}

#[tokio::test]
async fn failing_batch_hook_skips_request_hooks_entirely() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let mut hooks = HookStack::new();
    hooks.add_batch_hook(Arc::new(LoggedBatchHook {
        name: "pool",
        log: Arc::clone(&log),
        fail: true,
    }));
    hooks.add_request_hook(Arc::new(LoggedRequestHook {
        name: "auth",
        log: Arc::clone(&log),
        fail: false,
    }));

    let coordinator = MultiplexCoordinator::new(greeting_schema(), greeting_resolvers())
        .with_hooks(hooks);
    let result = coordinator.execute_one(Request::new(greeting_query())).await;

    assert!(matches!(result, Err(BatchError::Hook { name, .. }) if name == "pool"));
    assert!(log.lock().unwrap().is_empty());
}

struct Authenticate;

impl RequestHook for Authenticate {
    fn name(&self) -> &str {
        "authenticate"
    }

    fn before(&self, ctx: &mut Context) -> Result<(), String> {
        ctx.set("who", "ada");
        Ok(())
    }
}

#[tokio::test]
async fn request_hook_context_writes_reach_resolvers() {
    let mut hooks = HookStack::new();
    hooks.add_request_hook(Arc::new(Authenticate));

    let coordinator = MultiplexCoordinator::new(greeting_schema(), greeting_resolvers())
        .with_hooks(hooks);
    let response = coordinator
        .execute_one(Request::new(greeting_query()))
        .await
        .unwrap();

    assert_eq!(response.data, Some(json!({"greeting": "hello ada"})));
}

#[tokio::test]
async fn static_errors_isolate_from_valid_requests() {
    let coordinator = MultiplexCoordinator::new(greeting_schema(), greeting_resolvers());
    let invalid = Request::new(greeting_query())
        .with_static_error(GraphQLError::new("Syntax error: unexpected token"));
    let valid = Request::new(greeting_query());

    let responses = coordinator.execute(vec![invalid, valid]).await.unwrap();

    assert!(responses[0].data.is_none());
    assert_eq!(
        responses[0].errors.as_ref().unwrap()[0].message,
        "Syntax error: unexpected token"
    );
    assert_eq!(responses[1].data, Some(json!({"greeting": "hello world"})));
    assert!(responses[1].errors.is_none());
}

#[tokio::test]
async fn runtime_failures_do_not_leak_across_the_batch() {
    let mut resolvers = greeting_resolvers();
    resolvers.register_fn("Query", "greeting", |_, _, ctx: &Context, _| {
        if ctx.get::<bool>("broken").unwrap_or(false) {
            Err(gqx_engine::ResolverError::Custom("backend down".into()))
        } else {
            Ok(FieldValue::Value(json!("hello world")))
        }
    });
    let coordinator = MultiplexCoordinator::new(greeting_schema(), resolvers);

    let mut broken_ctx = Context::new();
    broken_ctx.set("broken", true);
    let responses = coordinator
        .execute(vec![
            Request::new(greeting_query()).with_context(broken_ctx),
            Request::new(greeting_query()),
        ])
        .await
        .unwrap();

    assert_eq!(responses[0].data, Some(json!({"greeting": null})));
    assert!(responses[0].has_errors());
    assert_eq!(responses[1].data, Some(json!({"greeting": "hello world"})));
    assert!(!responses[1].has_errors());
}

#[tokio::test]
async fn mixed_strategies_reject_the_whole_batch() {
    let coordinator = MultiplexCoordinator::new(greeting_schema(), greeting_resolvers());
    let result = coordinator
        .execute(vec![
            Request::new(greeting_query()),
            Request::new(greeting_query()).unbatched(),
        ])
        .await;

    assert!(matches!(result, Err(BatchError::MixedStrategies)));
}

#[tokio::test]
async fn oversized_batches_are_rejected() {
    let coordinator = MultiplexCoordinator::new(greeting_schema(), greeting_resolvers())
        .with_config(EngineConfig::new().with_max_batch_size(1));
    let result = coordinator
        .execute(vec![
            Request::new(greeting_query()),
            Request::new(greeting_query()),
        ])
        .await;

    assert!(
        matches!(result, Err(BatchError::BatchTooLarge { given: 2, limit: 1 }))
    );
}

#[tokio::test]
async fn complexity_limit_produces_a_static_error() {
    let coordinator = MultiplexCoordinator::new(greeting_schema(), greeting_resolvers())
        .with_config(EngineConfig::new().with_max_complexity(1));

    let document = Arc::new(Document::new().with_operation(
        Operation::new(OperationKind::Query)
            .with_selection(FieldNode::new("greeting").into())
            .with_selection(FieldNode::new("slow").into()),
    ));
    let response = coordinator
        .execute_one(Request::new(document))
        .await
        .unwrap();

    assert!(response.data.is_none());
    let errors = response.errors.expect("complexity error");
    assert_eq!(errors[0].code(), Some(codes::COMPLEXITY_LIMIT));
    assert_eq!(
        errors[0].message,
        "Query has complexity 2, exceeding the limit of 1"
    );
}

#[tokio::test]
async fn responses_come_back_in_input_order() {
    let coordinator = MultiplexCoordinator::new(greeting_schema(), greeting_resolvers());
    let responses = coordinator
        .execute(vec![
            Request::new(slow_query()),
            Request::new(greeting_query()),
            Request::new(slow_query()),
        ])
        .await
        .unwrap();

    assert_eq!(responses.len(), 3);
    assert_eq!(responses[0].data, Some(json!({"slow": "eventually"})));
    assert_eq!(responses[1].data, Some(json!({"greeting": "hello world"})));
    assert_eq!(responses[2].data, Some(json!({"slow": "eventually"})));
}

#[tokio::test]
async fn unknown_named_operation_is_a_static_error() {
    let coordinator = MultiplexCoordinator::new(greeting_schema(), greeting_resolvers());
    let response = coordinator
        .execute_one(Request::new(greeting_query()).with_operation_name("Missing"))
        .await
        .unwrap();

    assert!(response.data.is_none());
    let errors = response.errors.expect("unknown operation error");
    assert_eq!(errors[0].code(), Some(codes::NO_OPERATION));
}

#[tokio::test]
async fn mutation_against_a_query_only_schema_is_rejected() {
    let coordinator = MultiplexCoordinator::new(greeting_schema(), greeting_resolvers());
    let document = Arc::new(Document::new().with_operation(
        Operation::new(OperationKind::Mutation).with_selection(FieldNode::new("noop").into()),
    ));
    let response = coordinator
        .execute_one(Request::new(document))
        .await
        .unwrap();

    assert!(response.data.is_none());
    let errors = response.errors.expect("unsupported operation error");
    assert_eq!(
        errors[0].message,
        "Schema is not configured for mutation operations"
    );
}
