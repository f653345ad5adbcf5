//! Validated document model for the gqx execution engine.
//!
//! The parser and static validator are external collaborators; this crate
//! defines the shape of the document they hand to the engine:
//! - `document`: operations, fragments, selections, directive applications
//! - `value`: constant/variable values and pure argument coercion

pub mod document;
pub mod value;

pub use document::{
    Directive, Document, FieldNode, FragmentDefinition, InlineFragmentNode, Operation,
    OperationKind, Selection, SpreadNode,
};
pub use value::{coerce_arguments, AstValue, CoercedArguments};
