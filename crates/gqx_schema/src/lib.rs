//! Schema object for the gqx execution engine.
//!
//! Schema definition and static validation live outside the engine; this
//! crate defines the schema surface the engine consumes:
//! - `types`: type definitions and wrapping type references
//! - `guard`: the visible/accessible/authorized capability
//! - `schema`: the schema object, lookups and the builder

pub mod guard;
pub mod schema;
pub mod types;

pub use guard::{allow_all, AllowAll, Guard, GuardCheck};
pub use schema::{Schema, SchemaBuilder, TypeResolverFn, UnauthorizedObjectHook};
pub use types::{
    ArgumentDef, EnumDef, EnumValueDef, FieldDef, InterfaceDef, ObjectDef, ScalarDef, TypeDef,
    TypeRef, UnionDef,
};
