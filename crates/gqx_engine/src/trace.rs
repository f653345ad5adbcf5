//! Per-request execution trace.
//!
//! The trace owns the partial response tree, the static type recorded for
//! each written path, and the queue of deferred values waiting for the drain
//! loop. One trace is exclusively owned by one request.

use crate::deferred::Deferred;
use crate::evaluator::Continuation;
use gqx_core::{PathSegment, ResponsePath};
use gqx_schema::TypeRef;
use rustc_hash::FxHashMap;
use serde_json::Value;
use std::collections::VecDeque;

/// A deferred value together with the continuation awaiting it.
pub struct Pending {
    pub deferred: Deferred,
    pub continuation: Continuation,
}

/// The per-request partial response and deferred bookkeeping.
pub struct Trace {
    data: Value,
    types: FxHashMap<ResponsePath, TypeRef>,
    pending: VecDeque<Pending>,
    eager: bool,
}

impl Trace {
    /// Creates an empty trace. `eager` selects mutation-style forcing of
    /// thunk deferreds at registration time.
    pub fn new(eager: bool) -> Self {
        Self {
            data: Value::Null,
            types: FxHashMap::default(),
            pending: VecDeque::new(),
            eager,
        }
    }

    /// Returns true if registrations force thunks synchronously.
    pub fn is_eager(&self) -> bool {
        self.eager
    }

    /// Records the declared type expected at a path.
    pub fn set_type_at_path(&mut self, path: &ResponsePath, ty: TypeRef) {
        self.types.insert(path.clone(), ty);
    }

    /// Returns the declared type recorded at a path.
    pub fn type_at_path(&self, path: &ResponsePath) -> Option<&TypeRef> {
        self.types.get(path)
    }

    /// Stores `value` at `path`.
    ///
    /// A null with `propagates_null` set bubbles upward, clearing ancestor
    /// writes until an ancestor whose recorded type permits null absorbs it.
    /// Writes into a subtree already cleared by propagation are dropped.
    pub fn write(&mut self, path: &ResponsePath, value: Value, propagates_null: bool) {
        if value.is_null() && propagates_null {
            self.propagate_null(path);
            return;
        }
        self.write_raw(path, value);
    }

    fn propagate_null(&mut self, path: &ResponsePath) {
        let mut current = path.clone();
        loop {
            let non_null = self
                .types
                .get(&current)
                .is_some_and(TypeRef::is_non_null);
            if !non_null {
                if &current != path {
                    tracing::debug!(from = %path, to = %current, "null propagated to nullable boundary");
                }
                self.write_raw(&current, Value::Null);
                return;
            }
            match current.parent() {
                Some(parent) => current = parent,
                // The root has no recorded type and absorbs any null.
                None => {
                    self.data = Value::Null;
                    return;
                }
            }
        }
    }

    fn write_raw(&mut self, path: &ResponsePath, value: Value) {
        let segments = path.segments();
        let Some(slot) = navigate(&mut self.data, segments) else {
            // An ancestor was cleared by propagation; nothing to write into.
            return;
        };
        merge_value(slot, value);
    }

    /// Consumes the trace, returning the response tree.
    pub fn into_data(self) -> Value {
        self.data
    }

    /// Registers a deferred value and its continuation.
    pub fn enqueue(&mut self, deferred: Deferred, continuation: Continuation) {
        self.pending.push_back(Pending {
            deferred,
            continuation,
        });
    }

    /// Takes the oldest pending registration, if any.
    pub fn take_next(&mut self) -> Option<Pending> {
        self.pending.pop_front()
    }

    /// Removes the pending registration at `index`.
    pub fn remove_pending(&mut self, index: usize) -> Option<Pending> {
        self.pending.remove(index)
    }

    /// Re-inserts a pending registration at `index`.
    pub fn insert_pending(&mut self, index: usize, pending: Pending) {
        self.pending.insert(index, pending);
    }

    /// Returns the number of pending registrations.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Returns whether the registration at `index` is thunk-backed.
    pub fn pending_is_sync(&self, index: usize) -> Option<bool> {
        self.pending.get(index).map(|p| p.deferred.is_sync())
    }

    /// Returns true if any deferred values await resolution.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

impl std::fmt::Debug for Trace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Trace")
            .field("eager", &self.eager)
            .field("pending", &self.pending.len())
            .field("typed_paths", &self.types.len())
            .finish()
    }
}

/// Walks the tree to the slot for `segments`, creating nothing on the way.
///
/// Returns `None` when an intermediate value is missing, null, or of the
/// wrong shape; the final segment's entry is created on demand.
fn navigate<'a>(root: &'a mut Value, segments: &[PathSegment]) -> Option<&'a mut Value> {
    let Some((last, ancestors)) = segments.split_last() else {
        return Some(root);
    };

    let mut current = root;
    for segment in ancestors {
        current = match (segment, current) {
            (PathSegment::Field(key), Value::Object(map)) => map.get_mut(key.as_str())?,
            (PathSegment::Index(i), Value::Array(items)) => items.get_mut(*i)?,
            _ => return None,
        };
    }

    match (last, current) {
        (PathSegment::Field(key), Value::Object(map)) => {
            Some(map.entry(key.as_str()).or_insert(Value::Null))
        }
        (PathSegment::Index(i), Value::Array(items)) => items.get_mut(*i),
        _ => None,
    }
}

/// Merges `new` into `existing`: objects merge key-wise (so directive-split
/// groups writing the same response key combine), anything else replaces.
fn merge_value(existing: &mut Value, new: Value) {
    match (existing, new) {
        (Value::Object(existing_map), Value::Object(new_map)) => {
            for (key, value) in new_map {
                match existing_map.get_mut(&key) {
                    Some(slot) => merge_value(slot, value),
                    None => {
                        existing_map.insert(key, value);
                    }
                }
            }
        }
        (slot, new) => *slot = new,
    }
}
