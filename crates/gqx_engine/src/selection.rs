//! Selection gathering.
//!
//! Flattens one level of a selection set: resolves fragment spreads and
//! inline fragments against the concrete runtime type, applies
//! `skip`/`include`, and merges fields by response key. Fields reached
//! through distinct runtime-directive applications are kept in separate
//! sets so each interceptor chain wraps exactly the fields it covers.

use crate::directives::{include_selection, prepare_links, ChainLink, DirectiveLocation, DirectiveRegistry};
use gqx_ast::{Document, FieldNode, Selection};
use gqx_schema::Schema;
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use serde_json::Value;
use std::collections::HashMap;

/// Field selections sharing one response key, merged across fragments.
#[derive(Debug, Clone)]
pub struct SelectionGroup {
    pub response_key: String,
    pub nodes: Vec<FieldNode>,
}

/// Fields gathered under one runtime-directive ancestry.
///
/// The signature identifies the exact applications wrapping these fields;
/// two spreads of the same fragment produce distinct signatures.
#[derive(Debug, Clone)]
pub struct GatheredSet {
    pub signature: Vec<u64>,
    pub chain: Vec<ChainLink>,
    pub groups: IndexMap<String, SelectionGroup>,
}

impl GatheredSet {
    /// Number of distinct response keys the set covers.
    pub fn field_count(&self) -> usize {
        self.groups.len()
    }
}

/// Walks selection sets of one document, numbering runtime-directive
/// applications so ancestry signatures stay unique across the request.
pub struct Gatherer<'a> {
    document: &'a Document,
    registry: &'a DirectiveRegistry,
    schema: &'a Schema,
    variables: &'a HashMap<String, Value>,
    next_id: u64,
}

impl<'a> Gatherer<'a> {
    pub fn new(
        document: &'a Document,
        registry: &'a DirectiveRegistry,
        schema: &'a Schema,
        variables: &'a HashMap<String, Value>,
    ) -> Self {
        Self {
            document,
            registry,
            schema,
            variables,
            next_id: 0,
        }
    }

    /// Continues numbering from an earlier gatherer of the same request.
    pub fn starting_at(mut self, next_id: u64) -> Self {
        self.next_id = next_id;
        self
    }

    /// The next application id; carried between gatherers of one request.
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Gathers the selections applying to an object of `concrete_type`.
    ///
    /// The chain-free set, when present, comes first.
    pub fn gather(&mut self, selections: &[Selection], concrete_type: &str) -> Vec<GatheredSet> {
        let mut sets: Vec<GatheredSet> = Vec::new();
        let mut by_signature: FxHashMap<Vec<u64>, usize> = FxHashMap::default();
        by_signature.insert(Vec::new(), 0);
        sets.push(GatheredSet {
            signature: Vec::new(),
            chain: Vec::new(),
            groups: IndexMap::new(),
        });

        let mut spreading = Vec::new();
        self.walk(
            selections,
            concrete_type,
            &Vec::new(),
            &Vec::new(),
            &mut sets,
            &mut by_signature,
            &mut spreading,
        );

        sets.retain(|set| !set.groups.is_empty());
        sets
    }

    #[allow(clippy::too_many_arguments)]
    fn walk(
        &mut self,
        selections: &[Selection],
        concrete_type: &str,
        signature: &[u64],
        chain: &[ChainLink],
        sets: &mut Vec<GatheredSet>,
        by_signature: &mut FxHashMap<Vec<u64>, usize>,
        spreading: &mut Vec<String>,
    ) {
        for selection in selections {
            match selection {
                Selection::Field(field) => {
                    if !include_selection(&field.directives, self.variables) {
                        continue;
                    }
                    let index = *by_signature.entry(signature.to_vec()).or_insert_with(|| {
                        sets.push(GatheredSet {
                            signature: signature.to_vec(),
                            chain: chain.to_vec(),
                            groups: IndexMap::new(),
                        });
                        sets.len() - 1
                    });
                    let key = field.response_key().to_string();
                    sets[index]
                        .groups
                        .entry(key.clone())
                        .or_insert_with(|| SelectionGroup {
                            response_key: key,
                            nodes: Vec::new(),
                        })
                        .nodes
                        .push(field.clone());
                }
                Selection::FragmentSpread(spread) => {
                    if !include_selection(&spread.directives, self.variables) {
                        continue;
                    }
                    if spreading.iter().any(|name| name == &spread.name) {
                        continue;
                    }
                    let Some(fragment) = self.document.fragment(&spread.name) else {
                        continue;
                    };
                    if !self.applies(Some(&fragment.type_condition), concrete_type) {
                        continue;
                    }
                    let links = prepare_links(
                        self.registry,
                        &spread.directives,
                        DirectiveLocation::FragmentSpread,
                        self.variables,
                    );
                    let (signature, chain) = self.extend(signature, chain, links);
                    spreading.push(spread.name.clone());
                    let selections = fragment.selections.clone();
                    self.walk(
                        &selections,
                        concrete_type,
                        &signature,
                        &chain,
                        sets,
                        by_signature,
                        spreading,
                    );
                    spreading.pop();
                }
                Selection::InlineFragment(inline) => {
                    if !include_selection(&inline.directives, self.variables) {
                        continue;
                    }
                    if !self.applies(inline.type_condition.as_deref(), concrete_type) {
                        continue;
                    }
                    let links = prepare_links(
                        self.registry,
                        &inline.directives,
                        DirectiveLocation::InlineFragment,
                        self.variables,
                    );
                    let (signature, chain) = self.extend(signature, chain, links);
                    self.walk(
                        &inline.selections,
                        concrete_type,
                        &signature,
                        &chain,
                        sets,
                        by_signature,
                        spreading,
                    );
                }
            }
        }
    }

    /// Whether a fragment's type condition matches the concrete type.
    fn applies(&self, condition: Option<&str>, concrete_type: &str) -> bool {
        match condition {
            None => true,
            Some(condition) => {
                condition == concrete_type || self.schema.is_possible_type(condition, concrete_type)
            }
        }
    }

    /// Extends the ancestry with one application's links, numbering each.
    fn extend(
        &mut self,
        signature: &[u64],
        chain: &[ChainLink],
        links: Vec<ChainLink>,
    ) -> (Vec<u64>, Vec<ChainLink>) {
        let mut signature = signature.to_vec();
        let mut chain = chain.to_vec();
        for link in links {
            signature.push(self.next_id);
            self.next_id += 1;
            chain.push(link);
        }
        (signature, chain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deferred::FieldValue;
    use crate::directives::{DirectiveInvocation, DirectiveNext, RuntimeDirective};
    use crate::resolver::ResolverResult;
    use gqx_ast::{AstValue, Directive, FragmentDefinition, InlineFragmentNode, SpreadNode};
    use gqx_schema::{FieldDef, ObjectDef, SchemaBuilder, TypeRef};
    use std::sync::Arc;

    struct Noop;

    impl RuntimeDirective for Noop {
        fn resolve(
            &self,
            _invocation: &DirectiveInvocation,
            next: DirectiveNext<'_>,
        ) -> ResolverResult {
            next()
        }
    }

    fn schema() -> Schema {
        SchemaBuilder::new()
            .query_type("Query")
            .add_type(
                ObjectDef::new("Query")
                    .with_field(FieldDef::new("a", TypeRef::named("String")))
                    .with_field(FieldDef::new("b", TypeRef::named("String")))
                    .with_field(FieldDef::new("c", TypeRef::named("String"))),
            )
            .build()
    }

    #[test]
    fn test_fields_merge_by_response_key() {
        let schema = schema();
        let registry = DirectiveRegistry::new();
        let variables = HashMap::new();
        let document = Document::new();
        let selections = vec![
            FieldNode::new("a").into(),
            FieldNode::new("a")
                .with_selection(FieldNode::new("sub").into())
                .into(),
            FieldNode::new("a").aliased("other").into(),
        ];

        let mut gatherer = Gatherer::new(&document, &registry, &schema, &variables);
        let sets = gatherer.gather(&selections, "Query");

        assert_eq!(sets.len(), 1);
        let groups = &sets[0].groups;
        assert_eq!(groups.len(), 2);
        assert_eq!(groups["a"].nodes.len(), 2);
        assert_eq!(groups["other"].nodes.len(), 1);
    }

    #[test]
    fn test_skipped_fields_are_excluded() {
        let schema = schema();
        let registry = DirectiveRegistry::new();
        let variables = HashMap::new();
        let document = Document::new();
        let selections = vec![
            FieldNode::new("a")
                .with_directive(
                    Directive::new("skip").with_argument("if", AstValue::Boolean(true)),
                )
                .into(),
            FieldNode::new("b").into(),
        ];

        let mut gatherer = Gatherer::new(&document, &registry, &schema, &variables);
        let sets = gatherer.gather(&selections, "Query");

        assert_eq!(sets.len(), 1);
        assert!(sets[0].groups.get("a").is_none());
        assert!(sets[0].groups.get("b").is_some());
    }

    #[test]
    fn test_non_matching_type_condition_is_excluded() {
        let schema = schema();
        let registry = DirectiveRegistry::new();
        let variables = HashMap::new();
        let document = Document::new();
        let selections = vec![
            Selection::InlineFragment(
                InlineFragmentNode::new(Some("Other"))
                    .with_selection(FieldNode::new("a").into()),
            ),
            Selection::InlineFragment(
                InlineFragmentNode::new(Some("Query"))
                    .with_selection(FieldNode::new("b").into()),
            ),
        ];

        let mut gatherer = Gatherer::new(&document, &registry, &schema, &variables);
        let sets = gatherer.gather(&selections, "Query");

        assert_eq!(sets.len(), 1);
        assert!(sets[0].groups.get("a").is_none());
        assert!(sets[0].groups.get("b").is_some());
    }

    #[test]
    fn test_distinct_applications_get_distinct_sets() {
        let schema = schema();
        let mut registry = DirectiveRegistry::new();
        registry.register("traced", Arc::new(Noop));
        let variables = HashMap::new();
        let document = Document::new().with_fragment(
            FragmentDefinition::new("F", "Query")
                .with_selection(FieldNode::new("a").into())
                .with_selection(FieldNode::new("b").into()),
        );
        let selections = vec![
            SpreadNode::new("F")
                .with_directive(Directive::new("traced"))
                .into(),
            Selection::InlineFragment(
                InlineFragmentNode::new(None)
                    .with_directive(Directive::new("traced"))
                    .with_selection(FieldNode::new("c").into()),
            ),
            FieldNode::new("c").aliased("bare").into(),
        ];

        let mut gatherer = Gatherer::new(&document, &registry, &schema, &variables);
        let sets = gatherer.gather(&selections, "Query");

        assert_eq!(sets.len(), 3);
        // Chain-free set first, then one set per application.
        assert!(sets[0].chain.is_empty());
        assert_eq!(sets[0].groups.len(), 1);
        assert_eq!(sets[1].chain.len(), 1);
        assert_eq!(sets[1].field_count(), 2);
        assert_eq!(sets[2].chain.len(), 1);
        assert_ne!(sets[1].signature, sets[2].signature);
    }

    #[test]
    fn test_fragment_cycles_do_not_recurse() {
        let schema = schema();
        let registry = DirectiveRegistry::new();
        let variables = HashMap::new();
        let document = Document::new().with_fragment(
            FragmentDefinition::new("Loop", "Query")
                .with_selection(FieldNode::new("a").into())
                .with_selection(SpreadNode::new("Loop").into()),
        );
        let selections = vec![SpreadNode::new("Loop").into()];

        let mut gatherer = Gatherer::new(&document, &registry, &schema, &variables);
        let sets = gatherer.gather(&selections, "Query");

        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].groups.len(), 1);
    }
}
