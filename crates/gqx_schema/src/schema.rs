//! The schema object consumed by the execution engine.

use crate::guard::Guard;
use crate::types::{FieldDef, ScalarDef, TypeDef};
use gqx_core::{Context, GraphQLError};
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use serde_json::Value;
use std::sync::Arc;

/// Resolves the concrete runtime type of a value for an abstract type.
pub type TypeResolverFn = dyn Fn(&Value, &Context) -> Option<String> + Send + Sync;

/// Invoked when an object value fails its `authorized` check.
///
/// Returning `Ok(value)` substitutes a replacement to continue resolution
/// with; returning `Err` records the error and nulls the path.
pub type UnauthorizedObjectHook =
    dyn Fn(&str, &Value, &Context) -> Result<Value, GraphQLError> + Send + Sync;

/// A schema: type registry, root operation types and runtime hooks.
#[derive(Clone, Default)]
pub struct Schema {
    query_type: Option<String>,
    mutation_type: Option<String>,
    subscription_type: Option<String>,
    types: IndexMap<String, TypeDef>,
    type_resolvers: FxHashMap<String, Arc<TypeResolverFn>>,
    unauthorized_object: Option<Arc<UnauthorizedObjectHook>>,
}

impl Schema {
    /// Returns the query root type name.
    pub fn query_type(&self) -> Option<&str> {
        self.query_type.as_deref()
    }

    /// Returns the mutation root type name.
    pub fn mutation_type(&self) -> Option<&str> {
        self.mutation_type.as_deref()
    }

    /// Returns the subscription root type name.
    pub fn subscription_type(&self) -> Option<&str> {
        self.subscription_type.as_deref()
    }

    /// Gets a type by name.
    pub fn get_type(&self, name: &str) -> Option<&TypeDef> {
        self.types.get(name)
    }

    /// Returns all types in declaration order.
    pub fn types(&self) -> impl Iterator<Item = (&String, &TypeDef)> {
        self.types.iter()
    }

    /// Looks up a field definition on an object or interface type.
    pub fn field_definition(&self, type_name: &str, field_name: &str) -> Option<&FieldDef> {
        self.get_type(type_name)
            .and_then(|def| def.fields())
            .and_then(|fields| fields.get(field_name))
    }

    /// Returns the concrete types an abstract type can resolve to.
    ///
    /// Unions list their members; interfaces list the objects implementing
    /// them; a concrete object is its own sole possible type.
    pub fn possible_types(&self, name: &str) -> Vec<&str> {
        match self.get_type(name) {
            Some(TypeDef::Union(def)) => def.members.iter().map(String::as_str).collect(),
            Some(TypeDef::Interface(_)) => self
                .types
                .values()
                .filter_map(|def| match def {
                    TypeDef::Object(obj) if obj.implements.iter().any(|i| i == name) => {
                        Some(obj.name.as_str())
                    }
                    _ => None,
                })
                .collect(),
            Some(TypeDef::Object(def)) => vec![def.name.as_str()],
            _ => Vec::new(),
        }
    }

    /// Returns true if `concrete` is a possible type of `abstract_name`.
    pub fn is_possible_type(&self, abstract_name: &str, concrete: &str) -> bool {
        self.possible_types(abstract_name).contains(&concrete)
    }

    /// Resolves the concrete runtime type of a value for an abstract type.
    ///
    /// Falls back to the value's `__typename` property when no resolver was
    /// registered.
    pub fn resolve_runtime_type(
        &self,
        abstract_name: &str,
        value: &Value,
        ctx: &Context,
    ) -> Option<String> {
        if let Some(resolver) = self.type_resolvers.get(abstract_name) {
            return resolver(value, ctx);
        }
        value
            .get("__typename")
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    /// Returns the unauthorized-object hook, if configured.
    pub fn unauthorized_object_hook(&self) -> Option<&Arc<UnauthorizedObjectHook>> {
        self.unauthorized_object.as_ref()
    }

    /// Returns the guard attached to a type, if the type exists.
    pub fn type_guard(&self, name: &str) -> Option<&Arc<dyn Guard>> {
        self.get_type(name).map(TypeDef::guard)
    }
}

impl std::fmt::Debug for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Schema")
            .field("query_type", &self.query_type)
            .field("mutation_type", &self.mutation_type)
            .field("type_count", &self.types.len())
            .finish()
    }
}

/// Schema builder.
#[derive(Default)]
pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    /// Creates a new schema builder with the built-in scalars registered.
    pub fn new() -> Self {
        let mut builder = Self::default();
        for name in ["Int", "Float", "String", "Boolean", "ID"] {
            builder
                .schema
                .types
                .insert(name.to_string(), TypeDef::Scalar(ScalarDef::new(name)));
        }
        builder
    }

    /// Sets the query root type.
    pub fn query_type(mut self, name: impl Into<String>) -> Self {
        self.schema.query_type = Some(name.into());
        self
    }

    /// Sets the mutation root type.
    pub fn mutation_type(mut self, name: impl Into<String>) -> Self {
        self.schema.mutation_type = Some(name.into());
        self
    }

    /// Sets the subscription root type.
    pub fn subscription_type(mut self, name: impl Into<String>) -> Self {
        self.schema.subscription_type = Some(name.into());
        self
    }

    /// Adds a type.
    pub fn add_type(mut self, type_def: impl Into<TypeDef>) -> Self {
        let type_def = type_def.into();
        self.schema
            .types
            .insert(type_def.name().to_string(), type_def);
        self
    }

    /// Registers a runtime-type resolver for an abstract type.
    pub fn type_resolver<F>(mut self, abstract_name: impl Into<String>, resolver: F) -> Self
    where
        F: Fn(&Value, &Context) -> Option<String> + Send + Sync + 'static,
    {
        self.schema
            .type_resolvers
            .insert(abstract_name.into(), Arc::new(resolver));
        self
    }

    /// Installs the unauthorized-object hook.
    pub fn unauthorized_object<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str, &Value, &Context) -> Result<Value, GraphQLError> + Send + Sync + 'static,
    {
        self.schema.unauthorized_object = Some(Arc::new(hook));
        self
    }

    /// Builds the schema.
    pub fn build(self) -> Schema {
        self.schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{InterfaceDef, ObjectDef, TypeRef, UnionDef};

    fn pet_schema() -> Schema {
        SchemaBuilder::new()
            .query_type("Query")
            .add_type(TypeDef::Object(
                ObjectDef::new("Query")
                    .with_field(FieldDef::new("pet", TypeRef::named("Pet"))),
            ))
            .add_type(TypeDef::Interface(
                InterfaceDef::new("Named")
                    .with_field(FieldDef::new("name", TypeRef::named("String"))),
            ))
            .add_type(TypeDef::Object(
                ObjectDef::new("Cat")
                    .implements("Named")
                    .with_field(FieldDef::new("name", TypeRef::named("String"))),
            ))
            .add_type(TypeDef::Object(
                ObjectDef::new("Dog")
                    .implements("Named")
                    .with_field(FieldDef::new("name", TypeRef::named("String"))),
            ))
            .add_type(TypeDef::Union(
                UnionDef::new("Pet").with_member("Cat").with_member("Dog"),
            ))
            .build()
    }

    #[test]
    fn test_field_lookup() {
        let schema = pet_schema();
        assert!(schema.field_definition("Query", "pet").is_some());
        assert!(schema.field_definition("Query", "missing").is_none());
        assert!(schema.field_definition("Pet", "name").is_none());
    }

    #[test]
    fn test_possible_types() {
        let schema = pet_schema();

        assert_eq!(schema.possible_types("Pet"), vec!["Cat", "Dog"]);
        assert_eq!(schema.possible_types("Named"), vec!["Cat", "Dog"]);
        assert_eq!(schema.possible_types("Cat"), vec!["Cat"]);
        assert!(schema.is_possible_type("Pet", "Dog"));
        assert!(!schema.is_possible_type("Pet", "Query"));
    }

    #[test]
    fn test_runtime_type_from_typename_property() {
        let schema = pet_schema();
        let value = serde_json::json!({"__typename": "Cat", "name": "Mia"});

        let resolved = schema.resolve_runtime_type("Pet", &value, &Context::new());
        assert_eq!(resolved.as_deref(), Some("Cat"));
    }

    #[test]
    fn test_registered_type_resolver_wins() {
        let schema = SchemaBuilder::new()
            .add_type(TypeDef::Union(
                UnionDef::new("Pet").with_member("Cat").with_member("Dog"),
            ))
            .type_resolver("Pet", |value, _ctx| {
                value.get("bark").map(|_| "Dog".to_string())
            })
            .build();

        let dog = serde_json::json!({"bark": true});
        assert_eq!(
            schema.resolve_runtime_type("Pet", &dog, &Context::new()),
            Some("Dog".to_string())
        );
    }
}
