//! The selection evaluator.
//!
//! A recursive interpreter over one request: it gathers selections per
//! concrete type, invokes resolvers, dispatches on the declared type kind
//! and writes results into the trace. Resolution that cannot finish now is
//! parked as a deferred value plus a continuation; the coordinator resumes
//! it once the deferred produces a result.

use crate::config::EngineConfig;
use crate::deferred::{Deferred, FieldValue};
use crate::directives::{chain_placeholder, prepare_links, run_chain, DirectiveInvocation, DirectiveLocation, DirectiveRegistry, RuntimeDirective};
use crate::introspection;
use crate::resolver::{ResolverArgs, ResolverError, ResolverInfo, ResolverMap, ResolverResult};
use crate::response::Response;
use crate::selection::{GatheredSet, Gatherer, SelectionGroup};
use crate::trace::{Pending, Trace};
use gqx_ast::{coerce_arguments, Document, FieldNode, OperationKind, Selection};
use gqx_core::{codes, Context, GraphQLError, Location, ResponsePath};
use gqx_schema::{GuardCheck, Schema, TypeDef, TypeRef};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Resumes a parked resolution once its deferred value produced a result.
pub type Continuation = Box<dyn FnOnce(&mut Evaluator, ResolverResult) + Send>;

/// Everything needed to continue resolving one value at one path.
#[derive(Debug, Clone)]
pub struct FieldResolution {
    /// Where the value lands in the response tree.
    pub path: ResponsePath,
    /// The declared type at this position.
    pub ty: TypeRef,
    /// `Type.field`, for error messages.
    pub qualname: String,
    /// Sub-selections, merged across the group's occurrences.
    pub selections: Vec<Selection>,
    /// Source location of the first occurrence.
    pub location: Option<Location>,
    /// Skips the `authorized` check, set after a replacement value was
    /// substituted by the unauthorized-object hook.
    pub pre_authorized: bool,
}

/// A root field ready for evaluation.
///
/// Chain-free root selections split per response key so mutation roots run
/// serially; directive-wrapped sets stay whole so the chain fires once.
pub enum RootUnit {
    Group {
        root_type: String,
        group: SelectionGroup,
    },
    Set {
        root_type: String,
        set: GatheredSet,
    },
}

/// A field whose resolver invocation was parked behind an authorization
/// check that resolved later.
struct FieldPlan {
    parent: Value,
    parent_type: String,
    args: ResolverArgs,
    info: ResolverInfo,
    links: Vec<(Arc<dyn RuntimeDirective>, DirectiveInvocation)>,
    resolution: FieldResolution,
}

/// Per-request evaluation state.
pub struct Evaluator {
    schema: Arc<Schema>,
    resolvers: Arc<ResolverMap>,
    directives: Arc<DirectiveRegistry>,
    config: Arc<EngineConfig>,
    document: Arc<Document>,
    context: Context,
    variables: HashMap<String, Value>,
    root_value: Value,
    trace: Trace,
    errors: Vec<GraphQLError>,
    directive_seq: u64,
}

impl Evaluator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        schema: Arc<Schema>,
        resolvers: Arc<ResolverMap>,
        directives: Arc<DirectiveRegistry>,
        config: Arc<EngineConfig>,
        document: Arc<Document>,
        context: Context,
        root_value: Value,
        eager: bool,
    ) -> Self {
        let variables = context.variables().clone();
        Self {
            schema,
            resolvers,
            directives,
            config,
            document,
            context,
            variables,
            root_value,
            trace: Trace::new(eager),
            errors: Vec::new(),
            directive_seq: 0,
        }
    }

    /// The request's context object.
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Mutable access to the request's context, for teardown hooks.
    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.context
    }

    /// Records an error against this request.
    pub fn push_error(&mut self, error: GraphQLError) {
        self.errors.push(error);
    }

    /// Locates the operation and gathers its root selections into units.
    pub fn prepare_root(&mut self, operation_name: Option<&str>) -> Result<Vec<RootUnit>, GraphQLError> {
        let document = Arc::clone(&self.document);
        let Some(operation) = document.operation(operation_name) else {
            let message = match operation_name {
                Some(name) => format!("Unknown operation '{}'", name),
                None => "No operation selected".to_string(),
            };
            return Err(GraphQLError::new(message).with_code(codes::NO_OPERATION));
        };

        let kind_name = match operation.kind {
            OperationKind::Query => "query",
            OperationKind::Mutation => "mutation",
            OperationKind::Subscription => "subscription",
        };
        let root_type = match operation.kind {
            OperationKind::Query => self.schema.query_type(),
            OperationKind::Mutation => self.schema.mutation_type(),
            OperationKind::Subscription => self.schema.subscription_type(),
        };
        let Some(root_type) = root_type.map(str::to_string) else {
            return Err(GraphQLError::new(format!(
                "Schema is not configured for {} operations",
                kind_name
            ))
            .with_code(codes::NO_OPERATION));
        };

        self.trace
            .write(&ResponsePath::root(), Value::Object(Map::new()), false);

        let sets = self.gather(&operation.selections, &root_type);
        let mut units = Vec::new();
        for set in sets {
            if set.chain.is_empty() {
                for (_, group) in set.groups {
                    units.push(RootUnit::Group {
                        root_type: root_type.clone(),
                        group,
                    });
                }
            } else {
                units.push(RootUnit::Set {
                    root_type: root_type.clone(),
                    set,
                });
            }
        }
        Ok(units)
    }

    /// Evaluates one root unit eagerly, up to the first deferred values.
    pub fn evaluate_unit(&mut self, unit: RootUnit) {
        let root = self.root_value.clone();
        let path = ResponsePath::root();
        match unit {
            RootUnit::Group { root_type, group } => {
                self.evaluate_group(&root, &root_type, &path, group)
            }
            RootUnit::Set { root_type, set } => self.evaluate_set(&root, &root_type, &path, set),
        }
    }

    /// Returns true while deferred values await resolution.
    pub fn has_pending(&self) -> bool {
        self.trace.has_pending()
    }

    /// Takes the oldest parked resolution for the drain loop.
    pub fn take_pending(&mut self) -> Option<Pending> {
        self.trace.take_next()
    }

    /// Forces every thunk-backed deferred to quiescence.
    ///
    /// Future-backed deferreds stay parked for the drain loop.
    pub fn drain_sync(&mut self) {
        self.drain_thunks_from(0);
    }

    /// Consumes the evaluator, producing the request's response.
    pub fn finish(self) -> Response {
        Response::new(Some(self.trace.into_data()), self.errors)
    }

    fn gather(&mut self, selections: &[Selection], concrete_type: &str) -> Vec<GatheredSet> {
        let document = Arc::clone(&self.document);
        let directives = Arc::clone(&self.directives);
        let schema = Arc::clone(&self.schema);
        let mut gatherer = Gatherer::new(&document, &directives, &schema, &self.variables)
            .starting_at(self.directive_seq);
        let sets = gatherer.gather(selections, concrete_type);
        self.directive_seq = gatherer.next_id();
        sets
    }

    /// Registers a deferred value. Eager traces force thunks on the spot,
    /// so mutation-style serial semantics hold without a drain pass.
    fn register(&mut self, deferred: Deferred, continuation: Continuation) {
        if self.trace.is_eager() && deferred.is_sync() {
            match deferred.try_resolve_sync() {
                Ok(result) => continuation(self, result),
                Err(deferred) => self.trace.enqueue(deferred, continuation),
            }
        } else {
            self.trace.enqueue(deferred, continuation);
        }
    }

    /// Forces thunk-backed pendings from `mark` onward, including any they
    /// enqueue in turn. Future-backed pendings are left in place.
    fn drain_thunks_from(&mut self, mark: usize) {
        let mut index = mark;
        while index < self.trace.pending_len() {
            if self.trace.pending_is_sync(index) != Some(true) {
                index += 1;
                continue;
            }
            let Some(pending) = self.trace.remove_pending(index) else {
                break;
            };
            match pending.deferred.try_resolve_sync() {
                Ok(result) => (pending.continuation)(self, result),
                Err(deferred) => self.trace.insert_pending(index, Pending {
                    deferred,
                    continuation: pending.continuation,
                }),
            }
        }
    }

    fn evaluate_set(
        &mut self,
        parent: &Value,
        parent_type: &str,
        parent_path: &ResponsePath,
        set: GatheredSet,
    ) {
        if set.chain.is_empty() {
            for (_, group) in set.groups {
                self.evaluate_group(parent, parent_type, parent_path, group);
            }
            return;
        }

        let field_count = set.field_count();
        let links: Vec<(Arc<dyn RuntimeDirective>, DirectiveInvocation)> = set
            .chain
            .iter()
            .map(|link| (Arc::clone(&link.runtime), link.invocation(parent_path, field_count)))
            .collect();
        let isolated = set.chain.iter().any(|link| link.runtime.isolated());

        let mut groups = Some(set.groups);
        let result = {
            let this = &mut *self;
            let mut base = || {
                if let Some(groups) = groups.take() {
                    let mark = this.trace.pending_len();
                    for (_, group) in groups {
                        this.evaluate_group(parent, parent_type, parent_path, group);
                    }
                    if isolated {
                        this.drain_thunks_from(mark);
                    }
                }
                chain_placeholder()
            };
            run_chain(&links, &mut base)
        };
        self.finish_set_result(result, parent_path);
    }

    /// Records the outcome of a set-level interceptor chain. The fields the
    /// chain wrapped have already written themselves; only errors and
    /// late-finishing chains matter here.
    fn finish_set_result(&mut self, result: ResolverResult, parent_path: &ResponsePath) {
        match result {
            Ok(FieldValue::Deferred(deferred)) => {
                let path = parent_path.clone();
                self.register(
                    deferred,
                    Box::new(move |ev, result| ev.finish_set_result(result, &path)),
                );
            }
            Err(error) => {
                self.errors
                    .push(GraphQLError::new(error.to_string()).with_path(parent_path));
            }
            Ok(FieldValue::Error(mut error)) => {
                if error.path.is_none() {
                    error = error.with_path(parent_path);
                }
                self.errors.push(error);
            }
            Ok(FieldValue::ErrorList(errors)) => {
                for mut error in errors {
                    if error.path.is_none() {
                        error = error.with_path(parent_path);
                    }
                    self.errors.push(error);
                }
            }
            Ok(_) => {}
        }
    }

    fn evaluate_group(
        &mut self,
        parent: &Value,
        parent_type: &str,
        parent_path: &ResponsePath,
        group: SelectionGroup,
    ) {
        let schema = Arc::clone(&self.schema);
        let Some(first) = group.nodes.first() else {
            return;
        };
        let field_name = first.name.clone();
        let location = first.location;
        let path = parent_path.child_field(&group.response_key);

        if field_name == "__typename" {
            self.trace.write(&path, Value::String(parent_type.to_string()), false);
            return;
        }
        let at_query_root =
            parent_path.is_root() && schema.query_type() == Some(parent_type);
        if at_query_root && (field_name == "__schema" || field_name == "__type") {
            self.resolve_introspection(&group, &field_name, &path, location);
            return;
        }

        let Some(def) = schema.field_definition(parent_type, &field_name) else {
            let mut error = GraphQLError::new(format!(
                "Cannot query field '{}' on type '{}'",
                field_name, parent_type
            ))
            .with_path(&path);
            if let Some(location) = location {
                error = error.with_location(location);
            }
            self.errors.push(error);
            return;
        };

        let ty = def.ty.clone();
        self.trace.set_type_at_path(&path, ty.clone());

        let merged: Vec<Selection> = group
            .nodes
            .iter()
            .flat_map(|node| node.selections.iter().cloned())
            .collect();
        let selected: Vec<String> = merged
            .iter()
            .filter_map(|s| match s {
                Selection::Field(f) => Some(f.response_key().to_string()),
                _ => None,
            })
            .collect();

        let args = ResolverArgs::from_coerced(coerce_arguments(
            &first.arguments,
            &self.variables,
            &def.argument_defaults(),
        ));
        let info = ResolverInfo::new(&field_name, parent_type)
            .with_return_type(ty.to_string())
            .with_path(path.clone())
            .with_selected_fields(selected);

        let links: Vec<(Arc<dyn RuntimeDirective>, DirectiveInvocation)> = group
            .nodes
            .iter()
            .flat_map(|node| {
                prepare_links(
                    &self.directives,
                    &node.directives,
                    DirectiveLocation::Field,
                    &self.variables,
                )
            })
            .map(|link| {
                let invocation = link.invocation(&path, 1);
                (link.runtime, invocation)
            })
            .collect();

        let resolution = FieldResolution {
            path,
            ty,
            qualname: format!("{}.{}", parent_type, field_name),
            selections: merged,
            location,
            pre_authorized: false,
        };
        let plan = FieldPlan {
            parent: parent.clone(),
            parent_type: parent_type.to_string(),
            args,
            info,
            links,
            resolution,
        };

        // Field and argument `authorized` checks gate the resolver.
        let mut thunks = Vec::new();
        let mut denied = false;
        let mut checks = vec![def.guard.authorized(parent, &self.context)];
        for (name, _) in &first.arguments {
            if let Some(argument) = def.arguments.get(name) {
                checks.push(argument.guard.authorized(parent, &self.context));
            }
        }
        for check in checks {
            match check {
                GuardCheck::Ready(true) => {}
                GuardCheck::Ready(false) => denied = true,
                GuardCheck::Deferred(thunk) => thunks.push(thunk),
            }
        }

        if denied {
            self.trace.write(&plan.resolution.path, Value::Null, true);
        } else if thunks.is_empty() {
            self.run_field(plan);
        } else {
            let deferred = Deferred::new(move || {
                let allowed = thunks.into_iter().all(|thunk| thunk());
                Ok(FieldValue::Value(Value::Bool(allowed)))
            });
            self.register(
                deferred,
                Box::new(move |ev, result| {
                    let allowed =
                        matches!(result, Ok(FieldValue::Value(Value::Bool(true))));
                    if allowed {
                        ev.run_field(plan);
                    } else {
                        ev.trace.write(&plan.resolution.path, Value::Null, true);
                    }
                }),
            );
        }
    }

    /// Invokes the resolver, wrapped by any field-level interceptor chain.
    fn run_field(&mut self, plan: FieldPlan) {
        let FieldPlan {
            parent,
            parent_type,
            args,
            info,
            links,
            resolution,
        } = plan;

        let result = {
            let resolver = self.resolvers.get(&parent_type, &info.field_name);
            let context = &self.context;
            let mut base = || match resolver {
                Some(resolver) => resolver.resolve(&parent, &args, context, &info),
                None => Err(ResolverError::FieldNotFound(format!(
                    "{}.{}",
                    parent_type, info.field_name
                ))),
            };
            run_chain(&links, &mut base)
        };
        self.resolve_when_ready(result, resolution);
    }

    fn resolve_introspection(
        &mut self,
        group: &SelectionGroup,
        field_name: &str,
        path: &ResponsePath,
        location: Option<Location>,
    ) {
        if !self.config.introspection {
            let mut error = GraphQLError::new("Introspection is disabled").with_path(path);
            if let Some(location) = location {
                error = error.with_location(location);
            }
            self.errors.push(error);
            self.trace.write(path, Value::Null, false);
            return;
        }

        let schema = Arc::clone(&self.schema);
        let first = &group.nodes[0];
        let payload = if field_name == "__schema" {
            introspection::schema_payload(&schema, &self.context)
        } else {
            let args = coerce_arguments(&first.arguments, &self.variables, &[]);
            match args.get("name").and_then(Value::as_str) {
                Some(name) => introspection::type_payload(&schema, name, &self.context),
                None => Value::Null,
            }
        };

        // Project through a synthetic node carrying the merged selections.
        let mut merged = FieldNode::new(field_name);
        for node in &group.nodes {
            for selection in &node.selections {
                merged = merged.with_selection(selection.clone());
            }
        }
        let projected = introspection::project(&payload, &merged);
        self.trace.write(path, projected, false);
    }

    /// Classifies a resolver result, parking deferred values.
    pub fn resolve_when_ready(&mut self, result: ResolverResult, resolution: FieldResolution) {
        match result {
            Ok(FieldValue::Deferred(deferred)) => self.register(
                deferred,
                Box::new(move |ev, result| ev.resolve_when_ready(result, resolution)),
            ),
            other => self.continue_value(other, resolution),
        }
    }

    fn continue_value(&mut self, result: ResolverResult, resolution: FieldResolution) {
        match result {
            Err(error) => self.fail_field(GraphQLError::new(error.to_string()), resolution),
            Ok(FieldValue::Error(error)) => self.fail_field(error, resolution),
            Ok(FieldValue::ErrorList(errors)) => {
                for mut error in errors {
                    if error.path.is_none() {
                        error = error.with_path(&resolution.path);
                    }
                    self.errors.push(error);
                }
                self.trace.write(&resolution.path, Value::Null, true);
            }
            Ok(FieldValue::Skip) => {}
            Ok(FieldValue::Deferred(deferred)) => self.register(
                deferred,
                Box::new(move |ev, result| ev.resolve_when_ready(result, resolution)),
            ),
            Ok(FieldValue::Unauthorized(value)) => {
                let type_name = resolution.ty.named_type().to_string();
                self.unauthorized_object(type_name, value, resolution);
            }
            Ok(FieldValue::Value(Value::Null)) => {
                if resolution.ty.is_non_null() {
                    let mut error = GraphQLError::new(format!(
                        "Cannot return null for non-nullable field {}",
                        resolution.qualname
                    ))
                    .with_path(&resolution.path)
                    .with_code(codes::INVALID_NULL);
                    if let Some(location) = resolution.location {
                        error = error.with_location(location);
                    }
                    self.errors.push(error);
                }
                self.trace.write(&resolution.path, Value::Null, true);
            }
            Ok(value) => self.continue_field(value, resolution),
        }
    }

    /// Dispatches a concrete value on the declared type kind.
    fn continue_field(&mut self, value: FieldValue, resolution: FieldResolution) {
        let mut base = resolution.ty.clone();
        while let TypeRef::NonNull(inner) = base {
            base = *inner;
        }

        match base {
            TypeRef::NonNull(_) => unreachable!("stripped above"),
            TypeRef::List(inner) => self.continue_list(value, *inner, resolution),
            TypeRef::Named(name) => {
                let schema = Arc::clone(&self.schema);
                match schema.get_type(&name) {
                    None => self.fail_field(
                        GraphQLError::new(format!("Unknown type '{}'", name)),
                        resolution,
                    ),
                    Some(TypeDef::Scalar(_)) => match value {
                        FieldValue::Value(v) => self.trace.write(&resolution.path, v, false),
                        _ => self.fail_field(
                            GraphQLError::new(format!(
                                "Expected a scalar value for field {}",
                                resolution.qualname
                            )),
                            resolution,
                        ),
                    },
                    Some(TypeDef::Enum(def)) => {
                        let def = def.clone();
                        self.continue_enum(&def, value, resolution);
                    }
                    Some(TypeDef::Object(_)) => match value {
                        FieldValue::Value(v) => self.authorize_object(name, v, resolution),
                        _ => self.fail_field(
                            GraphQLError::new(format!(
                                "Expected an object value for field {}",
                                resolution.qualname
                            )),
                            resolution,
                        ),
                    },
                    Some(TypeDef::Interface(_)) | Some(TypeDef::Union(_)) => match value {
                        FieldValue::Value(v) => self.continue_abstract(&name, v, resolution),
                        _ => self.fail_field(
                            GraphQLError::new(format!(
                                "Expected an object value for field {}",
                                resolution.qualname
                            )),
                            resolution,
                        ),
                    },
                }
            }
        }
    }

    fn continue_list(&mut self, value: FieldValue, inner: TypeRef, resolution: FieldResolution) {
        let items: Vec<ResolverResult> = match value {
            FieldValue::List(items) => items,
            FieldValue::Value(Value::Array(values)) => values
                .into_iter()
                .map(|v| Ok(FieldValue::Value(v)))
                .collect(),
            _ => {
                return self.fail_field(
                    GraphQLError::new(format!(
                        "Expected a list value for field {}",
                        resolution.qualname
                    )),
                    resolution,
                )
            }
        };

        // Placeholder keeps one slot per element, so completion order never
        // changes element order.
        self.trace.write(
            &resolution.path,
            Value::Array(vec![Value::Null; items.len()]),
            false,
        );

        for (index, item) in items.into_iter().enumerate() {
            let path = resolution.path.child_index(index);
            self.trace.set_type_at_path(&path, inner.clone());
            let element = FieldResolution {
                path,
                ty: inner.clone(),
                qualname: resolution.qualname.clone(),
                selections: resolution.selections.clone(),
                location: resolution.location,
                pre_authorized: false,
            };
            self.resolve_when_ready(item, element);
        }
    }

    fn continue_enum(
        &mut self,
        def: &gqx_schema::EnumDef,
        value: FieldValue,
        resolution: FieldResolution,
    ) {
        let FieldValue::Value(value) = value else {
            return self.fail_field(
                GraphQLError::new(format!(
                    "Expected an enum value for field {}",
                    resolution.qualname
                )),
                resolution,
            );
        };
        let Some(name) = value.as_str() else {
            return self.fail_field(
                GraphQLError::new(format!(
                    "Enum '{}' cannot represent value: {}",
                    def.name, value
                )),
                resolution,
            );
        };
        match def.value(name) {
            None => {
                let message =
                    format!("Enum '{}' cannot represent value: \"{}\"", def.name, name);
                self.fail_field(GraphQLError::new(message), resolution);
            }
            Some(value_def) if !value_def.guard.visible(&self.context) => {
                let message =
                    format!("Enum '{}' cannot represent value: \"{}\"", def.name, name);
                self.fail_field(
                    GraphQLError::new(message).with_code(codes::HIDDEN_ENUM_VALUE),
                    resolution,
                );
            }
            Some(_) => self.trace.write(&resolution.path, value, false),
        }
    }

    fn continue_abstract(&mut self, abstract_name: &str, value: Value, resolution: FieldResolution) {
        let schema = Arc::clone(&self.schema);
        let concrete = schema.resolve_runtime_type(abstract_name, &value, &self.context);
        match concrete {
            Some(concrete) if schema.is_possible_type(abstract_name, &concrete) => {
                self.authorize_object(concrete, value, resolution);
            }
            _ => self.fail_field(
                GraphQLError::new(format!(
                    "Abstract type '{}' must resolve to an object type at runtime for field {}",
                    abstract_name, resolution.qualname
                ))
                .with_code(codes::UNRESOLVED_TYPE),
                resolution,
            ),
        }
    }

    fn authorize_object(&mut self, type_name: String, value: Value, resolution: FieldResolution) {
        if resolution.pre_authorized {
            return self.enter_object(type_name, value, resolution);
        }
        let schema = Arc::clone(&self.schema);
        let check = match schema.type_guard(&type_name) {
            Some(guard) => guard.authorized(&value, &self.context),
            None => GuardCheck::allow(),
        };
        match check {
            GuardCheck::Ready(true) => self.enter_object(type_name, value, resolution),
            GuardCheck::Ready(false) => self.unauthorized_object(type_name, value, resolution),
            GuardCheck::Deferred(thunk) => {
                let deferred = Deferred::new(move || {
                    Ok(if thunk() {
                        FieldValue::Value(value)
                    } else {
                        FieldValue::Unauthorized(value)
                    })
                });
                self.register(
                    deferred,
                    Box::new(move |ev, result| match result {
                        Ok(FieldValue::Value(value)) => ev.enter_object(type_name, value, resolution),
                        Ok(FieldValue::Unauthorized(value)) => {
                            ev.unauthorized_object(type_name, value, resolution)
                        }
                        other => ev.continue_value(other, resolution),
                    }),
                );
            }
        }
    }

    /// An object value failed its `authorized` check: consult the hook for
    /// a replacement, otherwise null the path without an error.
    fn unauthorized_object(&mut self, type_name: String, value: Value, resolution: FieldResolution) {
        let schema = Arc::clone(&self.schema);
        match schema.unauthorized_object_hook() {
            Some(hook) => match hook(&type_name, &value, &self.context) {
                Ok(replacement) => {
                    let resolution = FieldResolution {
                        pre_authorized: true,
                        ..resolution
                    };
                    self.continue_value(Ok(FieldValue::Value(replacement)), resolution);
                }
                Err(error) => {
                    let error = if error.code().is_none() {
                        error.with_code(codes::UNAUTHORIZED)
                    } else {
                        error
                    };
                    self.fail_field(error, resolution);
                }
            },
            None => self.trace.write(&resolution.path, Value::Null, true),
        }
    }

    fn enter_object(&mut self, type_name: String, value: Value, resolution: FieldResolution) {
        self.trace
            .write(&resolution.path, Value::Object(Map::new()), false);
        let sets = self.gather(&resolution.selections, &type_name);
        for set in sets {
            self.evaluate_set(&value, &type_name, &resolution.path, set);
        }
    }

    /// Records an error at the resolution's path and nulls the path, with
    /// non-null propagation applying as usual.
    fn fail_field(&mut self, mut error: GraphQLError, resolution: FieldResolution) {
        if error.path.is_none() {
            error = error.with_path(&resolution.path);
        }
        if error.locations.is_empty() {
            if let Some(location) = resolution.location {
                error = error.with_location(location);
            }
        }
        self.errors.push(error);
        self.trace.write(&resolution.path, Value::Null, true);
    }
}

impl std::fmt::Debug for Evaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Evaluator")
            .field("trace", &self.trace)
            .field("errors", &self.errors.len())
            .finish()
    }
}
