//! Pre-execution accessibility analysis.
//!
//! Walks every selection of an operation before any resolver runs, applying
//! the `accessible` check to each field, its arguments and its declared
//! return type. Any failure aborts the request with one aggregate error and
//! no data.

use gqx_ast::{Document, Operation, Selection};
use gqx_core::{codes, Context, GraphQLError};
use gqx_schema::Schema;
use std::collections::BTreeSet;

/// Checks the operation's reachable members and returns the aggregate error
/// when any of them is inaccessible to the context.
pub fn check_accessible(
    schema: &Schema,
    document: &Document,
    operation: &Operation,
    root_type: &str,
    ctx: &Context,
) -> Option<GraphQLError> {
    let mut pass = AccessPass {
        schema,
        document,
        ctx,
        inaccessible: BTreeSet::new(),
        spreading: Vec::new(),
    };
    pass.walk(&operation.selections, root_type);

    if pass.inaccessible.is_empty() {
        return None;
    }
    let members: Vec<String> = pass.inaccessible.into_iter().collect();
    Some(
        GraphQLError::new(format!(
            "Some fields in this query are not accessible: {}",
            members.join(", ")
        ))
        .with_code(codes::INACCESSIBLE_FIELDS)
        .with_extension("inaccessibleFields", serde_json::json!(members)),
    )
}

struct AccessPass<'a> {
    schema: &'a Schema,
    document: &'a Document,
    ctx: &'a Context,
    inaccessible: BTreeSet<String>,
    spreading: Vec<String>,
}

impl AccessPass<'_> {
    fn walk(&mut self, selections: &[Selection], parent_type: &str) {
        for selection in selections {
            match selection {
                Selection::Field(field) => {
                    // Meta fields have no definition and no guard.
                    if field.name.starts_with("__") {
                        continue;
                    }
                    let Some(def) = self.schema.field_definition(parent_type, &field.name)
                    else {
                        continue;
                    };

                    let qualname = format!("{}.{}", parent_type, field.name);
                    if !def.guard.accessible(self.ctx) {
                        self.inaccessible.insert(qualname.clone());
                    }
                    for argument in def.arguments.values() {
                        if !argument.guard.accessible(self.ctx) {
                            self.inaccessible
                                .insert(format!("{}.{}", qualname, argument.name));
                        }
                    }

                    let return_type = def.ty.named_type().to_string();
                    if let Some(guard) = self.schema.type_guard(&return_type) {
                        if !guard.accessible(self.ctx) {
                            self.inaccessible.insert(return_type.clone());
                        }
                    }
                    if !field.selections.is_empty() {
                        self.walk(&field.selections, &return_type);
                    }
                }
                Selection::FragmentSpread(spread) => {
                    if self.spreading.iter().any(|name| name == &spread.name) {
                        continue;
                    }
                    let Some(fragment) = self.document.fragment(&spread.name) else {
                        continue;
                    };
                    let type_condition = fragment.type_condition.clone();
                    let selections = fragment.selections.clone();
                    self.spreading.push(spread.name.clone());
                    self.walk(&selections, &type_condition);
                    self.spreading.pop();
                }
                Selection::InlineFragment(inline) => {
                    let narrowed = inline.type_condition.as_deref().unwrap_or(parent_type);
                    let narrowed = narrowed.to_string();
                    self.walk(&inline.selections, &narrowed);
                }
            }
        }
    }
}
