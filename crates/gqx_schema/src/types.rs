//! Type definitions and wrapping type references.

use crate::guard::{allow_all, Guard};
use indexmap::IndexMap;
use serde_json::Value;
use std::sync::Arc;

/// A reference to a declared type, possibly wrapped in `NonNull`/`List`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    /// A named, nullable type.
    Named(String),
    /// A non-null wrapping of the inner type.
    NonNull(Box<TypeRef>),
    /// A list of the inner type.
    List(Box<TypeRef>),
}

impl TypeRef {
    /// Creates a named type reference.
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// Wraps this reference in `NonNull`.
    pub fn non_null(self) -> Self {
        Self::NonNull(Box::new(self))
    }

    /// Wraps this reference in `List`.
    pub fn list(self) -> Self {
        Self::List(Box::new(self))
    }

    /// Returns true if the outermost wrapper is `NonNull`.
    pub fn is_non_null(&self) -> bool {
        matches!(self, Self::NonNull(_))
    }

    /// Unwraps exactly one `NonNull` layer, if present.
    pub fn unwrap_non_null(&self) -> &TypeRef {
        match self {
            Self::NonNull(inner) => inner,
            other => other,
        }
    }

    /// Returns the innermost named type.
    pub fn named_type(&self) -> &str {
        match self {
            Self::Named(name) => name,
            Self::NonNull(inner) | Self::List(inner) => inner.named_type(),
        }
    }
}

impl std::fmt::Display for TypeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Named(name) => write!(f, "{}", name),
            Self::NonNull(inner) => write!(f, "{}!", inner),
            Self::List(inner) => write!(f, "[{}]", inner),
        }
    }
}

/// A type definition.
#[derive(Clone)]
pub enum TypeDef {
    Scalar(ScalarDef),
    Object(ObjectDef),
    Interface(InterfaceDef),
    Union(UnionDef),
    Enum(EnumDef),
}

impl TypeDef {
    /// Returns the type name.
    pub fn name(&self) -> &str {
        match self {
            Self::Scalar(d) => &d.name,
            Self::Object(d) => &d.name,
            Self::Interface(d) => &d.name,
            Self::Union(d) => &d.name,
            Self::Enum(d) => &d.name,
        }
    }

    /// Returns the kind as a display string (also used by introspection).
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "SCALAR",
            Self::Object(_) => "OBJECT",
            Self::Interface(_) => "INTERFACE",
            Self::Union(_) => "UNION",
            Self::Enum(_) => "ENUM",
        }
    }

    /// Returns the fields of an object or interface type.
    pub fn fields(&self) -> Option<&IndexMap<String, FieldDef>> {
        match self {
            Self::Object(d) => Some(&d.fields),
            Self::Interface(d) => Some(&d.fields),
            _ => None,
        }
    }

    /// Returns true for interface and union types.
    pub fn is_abstract(&self) -> bool {
        matches!(self, Self::Interface(_) | Self::Union(_))
    }

    /// Returns true for scalar and enum types.
    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Scalar(_) | Self::Enum(_))
    }

    /// Returns the guard attached to this type.
    pub fn guard(&self) -> &Arc<dyn Guard> {
        match self {
            Self::Scalar(d) => &d.guard,
            Self::Object(d) => &d.guard,
            Self::Interface(d) => &d.guard,
            Self::Union(d) => &d.guard,
            Self::Enum(d) => &d.guard,
        }
    }
}

impl std::fmt::Debug for TypeDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeDef")
            .field("name", &self.name())
            .field("kind", &self.kind())
            .finish()
    }
}

/// Scalar type definition.
#[derive(Clone)]
pub struct ScalarDef {
    pub name: String,
    pub description: Option<String>,
    pub guard: Arc<dyn Guard>,
}

impl ScalarDef {
    /// Creates a new scalar definition.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            guard: allow_all(),
        }
    }
}

/// Object type definition.
#[derive(Clone)]
pub struct ObjectDef {
    pub name: String,
    pub description: Option<String>,
    pub fields: IndexMap<String, FieldDef>,
    pub implements: Vec<String>,
    pub guard: Arc<dyn Guard>,
}

impl ObjectDef {
    /// Creates a new object definition.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields: IndexMap::new(),
            implements: Vec::new(),
            guard: allow_all(),
        }
    }

    /// Adds a field.
    pub fn with_field(mut self, field: FieldDef) -> Self {
        self.fields.insert(field.name.clone(), field);
        self
    }

    /// Declares an implemented interface.
    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.implements.push(interface.into());
        self
    }

    /// Attaches a guard to the type.
    pub fn with_guard(mut self, guard: Arc<dyn Guard>) -> Self {
        self.guard = guard;
        self
    }
}

/// Interface type definition.
#[derive(Clone)]
pub struct InterfaceDef {
    pub name: String,
    pub description: Option<String>,
    pub fields: IndexMap<String, FieldDef>,
    pub guard: Arc<dyn Guard>,
}

impl InterfaceDef {
    /// Creates a new interface definition.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields: IndexMap::new(),
            guard: allow_all(),
        }
    }

    /// Adds a field.
    pub fn with_field(mut self, field: FieldDef) -> Self {
        self.fields.insert(field.name.clone(), field);
        self
    }
}

/// Union type definition.
#[derive(Clone)]
pub struct UnionDef {
    pub name: String,
    pub description: Option<String>,
    pub members: Vec<String>,
    pub guard: Arc<dyn Guard>,
}

impl UnionDef {
    /// Creates a new union definition.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            members: Vec::new(),
            guard: allow_all(),
        }
    }

    /// Adds a member type.
    pub fn with_member(mut self, member: impl Into<String>) -> Self {
        self.members.push(member.into());
        self
    }
}

/// Enum type definition.
#[derive(Clone)]
pub struct EnumDef {
    pub name: String,
    pub description: Option<String>,
    pub values: Vec<EnumValueDef>,
    pub guard: Arc<dyn Guard>,
}

impl EnumDef {
    /// Creates a new enum definition.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            values: Vec::new(),
            guard: allow_all(),
        }
    }

    /// Adds a value.
    pub fn with_value(mut self, value: EnumValueDef) -> Self {
        self.values.push(value);
        self
    }

    /// Looks up a value by name.
    pub fn value(&self, name: &str) -> Option<&EnumValueDef> {
        self.values.iter().find(|v| v.name == name)
    }
}

/// Enum value definition.
#[derive(Clone)]
pub struct EnumValueDef {
    pub name: String,
    pub description: Option<String>,
    pub guard: Arc<dyn Guard>,
}

impl EnumValueDef {
    /// Creates a new enum value definition.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            guard: allow_all(),
        }
    }

    /// Attaches a guard to the value.
    pub fn with_guard(mut self, guard: Arc<dyn Guard>) -> Self {
        self.guard = guard;
        self
    }
}

/// Field definition.
#[derive(Clone)]
pub struct FieldDef {
    pub name: String,
    pub description: Option<String>,
    pub ty: TypeRef,
    pub arguments: IndexMap<String, ArgumentDef>,
    pub guard: Arc<dyn Guard>,
}

impl FieldDef {
    /// Creates a new field definition.
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            description: None,
            ty,
            arguments: IndexMap::new(),
            guard: allow_all(),
        }
    }

    /// Adds an argument.
    pub fn with_argument(mut self, argument: ArgumentDef) -> Self {
        self.arguments.insert(argument.name.clone(), argument);
        self
    }

    /// Attaches a guard to the field.
    pub fn with_guard(mut self, guard: Arc<dyn Guard>) -> Self {
        self.guard = guard;
        self
    }

    /// Argument defaults as `(name, value)` pairs, for coercion.
    pub fn argument_defaults(&self) -> Vec<(&str, Value)> {
        self.arguments
            .values()
            .filter_map(|arg| {
                arg.default_value
                    .as_ref()
                    .map(|v| (arg.name.as_str(), v.clone()))
            })
            .collect()
    }
}

impl std::fmt::Debug for FieldDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldDef")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .finish()
    }
}

/// Argument definition.
#[derive(Clone)]
pub struct ArgumentDef {
    pub name: String,
    pub description: Option<String>,
    pub ty: TypeRef,
    pub default_value: Option<Value>,
    pub guard: Arc<dyn Guard>,
}

impl ArgumentDef {
    /// Creates a new argument definition.
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            description: None,
            ty,
            default_value: None,
            guard: allow_all(),
        }
    }

    /// Sets the default value.
    pub fn with_default(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }

    /// Attaches a guard to the argument.
    pub fn with_guard(mut self, guard: Arc<dyn Guard>) -> Self {
        self.guard = guard;
        self
    }
}

impl From<ScalarDef> for TypeDef {
    fn from(def: ScalarDef) -> Self {
        TypeDef::Scalar(def)
    }
}

impl From<ObjectDef> for TypeDef {
    fn from(def: ObjectDef) -> Self {
        TypeDef::Object(def)
    }
}

impl From<InterfaceDef> for TypeDef {
    fn from(def: InterfaceDef) -> Self {
        TypeDef::Interface(def)
    }
}

impl From<UnionDef> for TypeDef {
    fn from(def: UnionDef) -> Self {
        TypeDef::Union(def)
    }
}

impl From<EnumDef> for TypeDef {
    fn from(def: EnumDef) -> Self {
        TypeDef::Enum(def)
    }
}
