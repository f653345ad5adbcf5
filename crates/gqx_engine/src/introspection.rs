//! Introspection meta fields.
//!
//! `__typename` is answered anywhere; `__schema` and `__type` only at the
//! query root. Payloads are built eagerly from the schema, filtered by
//! member visibility, then projected down to the requested selections.

use gqx_ast::{FieldNode, Selection};
use gqx_core::Context;
use gqx_schema::{Schema, TypeDef, TypeRef};
use serde_json::{json, Map, Value};

/// Builds the `__schema` payload for this context.
pub fn schema_payload(schema: &Schema, ctx: &Context) -> Value {
    let types: Vec<Value> = schema
        .types()
        .map(|(_, def)| def)
        .filter(|def| def.guard().visible(ctx))
        .map(|def| type_summary(schema, def, ctx))
        .collect();

    let named = |name: Option<&str>| match name {
        Some(name) => json!({ "name": name }),
        None => Value::Null,
    };

    json!({
        "queryType": named(schema.query_type()),
        "mutationType": named(schema.mutation_type()),
        "subscriptionType": named(schema.subscription_type()),
        "types": types,
    })
}

/// Builds the `__type(name:)` payload, or null for unknown/hidden types.
pub fn type_payload(schema: &Schema, name: &str, ctx: &Context) -> Value {
    match schema.get_type(name) {
        Some(def) if def.guard().visible(ctx) => type_summary(schema, def, ctx),
        _ => Value::Null,
    }
}

fn type_summary(schema: &Schema, def: &TypeDef, ctx: &Context) -> Value {
    let mut summary = Map::new();
    summary.insert("name".into(), json!(def.name()));
    summary.insert("kind".into(), json!(def.kind()));

    if let Some(fields) = def.fields() {
        let fields: Vec<Value> = fields
            .values()
            .filter(|field| field.guard.visible(ctx))
            .map(|field| {
                json!({
                    "name": field.name,
                    "type": render_type(&field.ty),
                    "args": field
                        .arguments
                        .values()
                        .filter(|arg| arg.guard.visible(ctx))
                        .map(|arg| json!({ "name": arg.name, "type": render_type(&arg.ty) }))
                        .collect::<Vec<_>>(),
                })
            })
            .collect();
        summary.insert("fields".into(), Value::Array(fields));
    }

    if let TypeDef::Enum(def) = def {
        let values: Vec<Value> = def
            .values
            .iter()
            .filter(|value| value.guard.visible(ctx))
            .map(|value| json!({ "name": value.name }))
            .collect();
        summary.insert("enumValues".into(), Value::Array(values));
    }

    if def.is_abstract() {
        let possible: Vec<Value> = schema
            .possible_types(def.name())
            .into_iter()
            .map(|name| json!({ "name": name }))
            .collect();
        summary.insert("possibleTypes".into(), Value::Array(possible));
    }

    Value::Object(summary)
}

/// Renders a wrapping type reference, e.g. `[Int!]!`.
fn render_type(ty: &TypeRef) -> Value {
    json!(ty.to_string())
}

/// Projects a payload down to the requested selections.
///
/// Objects keep only the requested keys (under their response keys); lists
/// project each element. Missing keys project to null.
pub fn project(value: &Value, field: &FieldNode) -> Value {
    if field.selections.is_empty() {
        return value.clone();
    }
    project_selections(value, &field.selections)
}

fn project_selections(value: &Value, selections: &[Selection]) -> Value {
    match value {
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| project_selections(item, selections))
                .collect(),
        ),
        Value::Object(map) => {
            let mut projected = Map::new();
            for selection in selections {
                // Fragment indirection inside introspection payloads is not
                // supported; plain field selections drive the projection.
                if let Selection::Field(field) = selection {
                    let source = map.get(&field.name).unwrap_or(&Value::Null);
                    projected.insert(field.response_key().to_string(), project(source, field));
                }
            }
            Value::Object(projected)
        }
        other => other.clone(),
    }
}
