//! Core types for the gqx execution engine.
//!
//! This crate provides foundational types used throughout gqx:
//! - `path`: response paths locating values in a result tree
//! - `error`: wire-level errors and the fatal batch error
//! - `context`: the request-scoped context store

pub mod context;
pub mod error;
pub mod path;

pub use context::Context;
pub use error::{codes, BatchError, GraphQLError, Location};
pub use path::{PathSegment, ResponsePath};
