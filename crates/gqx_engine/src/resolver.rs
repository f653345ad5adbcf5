//! Resolver system.
//!
//! Resolvers are synchronous functions; asynchrony and batching are expressed
//! by returning a [`FieldValue::Deferred`](crate::deferred::FieldValue) that
//! the engine drains later.

use crate::deferred::FieldValue;
use gqx_ast::CoercedArguments;
use gqx_core::{Context, ResponsePath};
use serde_json::Value;
use std::fmt::Debug;
use std::sync::Arc;

/// Arguments passed to a resolver, already coerced.
#[derive(Debug, Clone, Default)]
pub struct ResolverArgs {
    args: CoercedArguments,
}

impl ResolverArgs {
    /// Creates empty resolver args.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps coerced arguments.
    pub fn from_coerced(args: CoercedArguments) -> Self {
        Self { args }
    }

    /// Gets an argument by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.args.get(name)
    }

    /// Gets an argument as a specific type.
    pub fn get_as<T: serde::de::DeserializeOwned>(&self, name: &str) -> Option<T> {
        self.args
            .get(name)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Gets a required argument, returning an error if not found.
    pub fn require<T: serde::de::DeserializeOwned>(&self, name: &str) -> Result<T, ResolverError> {
        self.args
            .get(name)
            .ok_or_else(|| ResolverError::MissingArgument(name.to_string()))
            .and_then(|v| {
                serde_json::from_value(v.clone()).map_err(|e| {
                    ResolverError::ArgumentParse(name.to_string(), e.to_string())
                })
            })
    }

    /// Returns true if no arguments were given.
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Sets an argument.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.args.insert(name.into(), value);
    }
}

/// Info about the field being resolved.
#[derive(Debug, Clone)]
pub struct ResolverInfo {
    /// The field name being resolved.
    pub field_name: String,
    /// The owning type name.
    pub parent_type: String,
    /// The declared return type, rendered.
    pub return_type: String,
    /// Path to this field.
    pub path: ResponsePath,
    /// Response keys of the selected sub-fields.
    pub selected_fields: Vec<String>,
}

impl ResolverInfo {
    /// Creates new resolver info.
    pub fn new(field_name: impl Into<String>, parent_type: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            parent_type: parent_type.into(),
            return_type: String::new(),
            path: ResponsePath::root(),
            selected_fields: Vec::new(),
        }
    }

    /// Sets the rendered return type.
    pub fn with_return_type(mut self, ty: impl Into<String>) -> Self {
        self.return_type = ty.into();
        self
    }

    /// Sets the path.
    pub fn with_path(mut self, path: ResponsePath) -> Self {
        self.path = path;
        self
    }

    /// Sets the selected sub-fields.
    pub fn with_selected_fields(mut self, fields: Vec<String>) -> Self {
        self.selected_fields = fields;
        self
    }
}

/// Result type for resolvers.
pub type ResolverResult = Result<FieldValue, ResolverError>;

/// Error from a resolver.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ResolverError {
    /// Field not found on the parent value.
    #[error("Field not found: {0}")]
    FieldNotFound(String),

    /// Missing required argument.
    #[error("Missing required argument: {0}")]
    MissingArgument(String),

    /// Argument parse error.
    #[error("Failed to parse argument '{0}': {1}")]
    ArgumentParse(String, String),

    /// Custom error.
    #[error("{0}")]
    Custom(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Trait for field resolvers.
pub trait Resolver: Send + Sync {
    /// Resolves a field value.
    fn resolve(
        &self,
        parent: &Value,
        args: &ResolverArgs,
        ctx: &Context,
        info: &ResolverInfo,
    ) -> ResolverResult;
}

/// A boxed resolver.
pub type BoxedResolver = Box<dyn Resolver>;

/// A wrapper for resolver functions.
pub struct FnResolver {
    func: Arc<dyn Fn(&Value, &ResolverArgs, &Context, &ResolverInfo) -> ResolverResult + Send + Sync>,
}

impl FnResolver {
    /// Creates a new function resolver.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value, &ResolverArgs, &Context, &ResolverInfo) -> ResolverResult
            + Send
            + Sync
            + 'static,
    {
        Self { func: Arc::new(f) }
    }
}

impl Resolver for FnResolver {
    fn resolve(
        &self,
        parent: &Value,
        args: &ResolverArgs,
        ctx: &Context,
        info: &ResolverInfo,
    ) -> ResolverResult {
        (self.func)(parent, args, ctx, info)
    }
}

/// Default resolver that accesses properties from the parent object.
pub struct DefaultResolver;

impl Resolver for DefaultResolver {
    fn resolve(
        &self,
        parent: &Value,
        _args: &ResolverArgs,
        _ctx: &Context,
        info: &ResolverInfo,
    ) -> ResolverResult {
        let field_name = &info.field_name;
        match parent {
            Value::Object(map) => {
                if let Some(value) = map.get(field_name) {
                    Ok(FieldValue::Value(value.clone()))
                } else {
                    // Try snake_case version
                    let snake_case = to_snake_case(field_name);
                    match map.get(&snake_case) {
                        Some(value) => Ok(FieldValue::Value(value.clone())),
                        None => Ok(FieldValue::null()),
                    }
                }
            }
            Value::Null => Ok(FieldValue::null()),
            _ => Err(ResolverError::FieldNotFound(field_name.clone())),
        }
    }
}

/// Converts camelCase to snake_case.
fn to_snake_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 4);
    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                result.push('_');
            }
            result.extend(c.to_lowercase());
        } else {
            result.push(c);
        }
    }
    result
}

/// Storage for resolvers organized by type and field.
#[derive(Default)]
pub struct ResolverMap {
    /// Resolvers indexed by "TypeName.fieldName".
    resolvers: rustc_hash::FxHashMap<String, BoxedResolver>,

    /// Default resolver for unregistered fields.
    default_resolver: Option<BoxedResolver>,
}

impl ResolverMap {
    /// Creates a new resolver map with property-access fallback.
    pub fn new() -> Self {
        Self {
            resolvers: rustc_hash::FxHashMap::default(),
            default_resolver: Some(Box::new(DefaultResolver)),
        }
    }

    /// Registers a resolver for a specific type and field.
    pub fn register<R: Resolver + 'static>(
        &mut self,
        type_name: impl Into<String>,
        field_name: impl Into<String>,
        resolver: R,
    ) {
        let key = format!("{}.{}", type_name.into(), field_name.into());
        self.resolvers.insert(key, Box::new(resolver));
    }

    /// Registers a function as a resolver.
    pub fn register_fn<F>(
        &mut self,
        type_name: impl Into<String>,
        field_name: impl Into<String>,
        f: F,
    ) where
        F: Fn(&Value, &ResolverArgs, &Context, &ResolverInfo) -> ResolverResult
            + Send
            + Sync
            + 'static,
    {
        self.register(type_name, field_name, FnResolver::new(f));
    }

    /// Registers a function returning a plain value.
    pub fn register_value<F>(
        &mut self,
        type_name: impl Into<String>,
        field_name: impl Into<String>,
        f: F,
    ) where
        F: Fn(&Value, &ResolverArgs, &Context, &ResolverInfo) -> Value + Send + Sync + 'static,
    {
        self.register_fn(type_name, field_name, move |parent, args, ctx, info| {
            Ok(FieldValue::Value(f(parent, args, ctx, info)))
        });
    }

    /// Gets a resolver for a type and field.
    pub fn get(&self, type_name: &str, field_name: &str) -> Option<&dyn Resolver> {
        let key = format!("{}.{}", type_name, field_name);
        self.resolvers
            .get(&key)
            .map(|r| r.as_ref())
            .or(self.default_resolver.as_deref())
    }

    /// Sets the default resolver.
    pub fn set_default<R: Resolver + 'static>(&mut self, resolver: R) {
        self.default_resolver = Some(Box::new(resolver));
    }

    /// Removes the default resolver.
    pub fn remove_default(&mut self) {
        self.default_resolver = None;
    }
}

impl Debug for ResolverMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolverMap")
            .field("resolver_count", &self.resolvers.len())
            .field("has_default", &self.default_resolver.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolver_args() {
        let mut args = ResolverArgs::new();
        args.set("id", json!(123));
        args.set("name", json!("test"));

        assert_eq!(args.get_as::<i64>("id"), Some(123));
        assert_eq!(args.get_as::<String>("name"), Some("test".to_string()));
        assert_eq!(args.get_as::<i64>("missing"), None);
        assert!(args.require::<i64>("absent").is_err());
    }

    #[test]
    fn test_to_snake_case() {
        assert_eq!(to_snake_case("firstName"), "first_name");
        assert_eq!(to_snake_case("id"), "id");
    }

    #[test]
    fn test_default_resolver_property_access() {
        let parent = json!({"name": "Alice", "display_name": "A."});
        let args = ResolverArgs::new();
        let ctx = Context::new();

        let direct = DefaultResolver
            .resolve(&parent, &args, &ctx, &ResolverInfo::new("name", "User"))
            .unwrap();
        assert!(matches!(direct, FieldValue::Value(v) if v == json!("Alice")));

        let snake = DefaultResolver
            .resolve(&parent, &args, &ctx, &ResolverInfo::new("displayName", "User"))
            .unwrap();
        assert!(matches!(snake, FieldValue::Value(v) if v == json!("A.")));
    }

    #[test]
    fn test_resolver_map_lookup_and_fallback() {
        let mut map = ResolverMap::new();
        map.register_fn("Query", "hello", |_parent, _args, _ctx, _info| {
            Ok(FieldValue::Value(json!("Hello, World!")))
        });

        let parent = json!({"name": "Bob"});
        let args = ResolverArgs::new();
        let ctx = Context::new();

        let hello = map
            .get("Query", "hello")
            .unwrap()
            .resolve(&parent, &args, &ctx, &ResolverInfo::new("hello", "Query"))
            .unwrap();
        assert!(matches!(hello, FieldValue::Value(v) if v == json!("Hello, World!")));

        // Unregistered field falls back to property access.
        let name = map
            .get("User", "name")
            .unwrap()
            .resolve(&parent, &args, &ctx, &ResolverInfo::new("name", "User"))
            .unwrap();
        assert!(matches!(name, FieldValue::Value(v) if v == json!("Bob")));
    }

    #[test]
    fn test_resolver_map_without_default() {
        let mut map = ResolverMap::new();
        map.remove_default();
        assert!(map.get("User", "name").is_none());
    }
}
