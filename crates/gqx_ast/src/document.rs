//! Validated executable documents.

use crate::value::AstValue;
use gqx_core::Location;
use rustc_hash::FxHashMap;

/// A validated executable document.
#[derive(Debug, Clone, Default)]
pub struct Document {
    operations: Vec<Operation>,
    fragments: FxHashMap<String, FragmentDefinition>,
}

impl Document {
    /// Creates an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an operation.
    pub fn with_operation(mut self, operation: Operation) -> Self {
        self.operations.push(operation);
        self
    }

    /// Adds a fragment definition.
    pub fn with_fragment(mut self, fragment: FragmentDefinition) -> Self {
        self.fragments.insert(fragment.name.clone(), fragment);
        self
    }

    /// Returns all operations.
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Selects the operation to execute: by name when given, otherwise the
    /// sole operation of the document.
    pub fn operation(&self, name: Option<&str>) -> Option<&Operation> {
        match name {
            Some(name) => self
                .operations
                .iter()
                .find(|op| op.name.as_deref() == Some(name)),
            None => {
                if self.operations.len() == 1 {
                    self.operations.first()
                } else {
                    None
                }
            }
        }
    }

    /// Looks up a fragment definition by name.
    pub fn fragment(&self, name: &str) -> Option<&FragmentDefinition> {
        self.fragments.get(name)
    }
}

/// The kind of operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Query,
    Mutation,
    Subscription,
}

/// An executable operation.
#[derive(Debug, Clone)]
pub struct Operation {
    pub kind: OperationKind,
    pub name: Option<String>,
    pub selections: Vec<Selection>,
}

impl Operation {
    /// Creates a new operation.
    pub fn new(kind: OperationKind) -> Self {
        Self {
            kind,
            name: None,
            selections: Vec::new(),
        }
    }

    /// Sets the operation name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Adds a selection.
    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selections.push(selection);
        self
    }
}

/// A fragment definition.
#[derive(Debug, Clone)]
pub struct FragmentDefinition {
    pub name: String,
    pub type_condition: String,
    pub selections: Vec<Selection>,
}

impl FragmentDefinition {
    /// Creates a new fragment definition.
    pub fn new(name: impl Into<String>, type_condition: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_condition: type_condition.into(),
            selections: Vec::new(),
        }
    }

    /// Adds a selection.
    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selections.push(selection);
        self
    }
}

/// A selection inside a selection set.
#[derive(Debug, Clone)]
pub enum Selection {
    Field(FieldNode),
    FragmentSpread(SpreadNode),
    InlineFragment(InlineFragmentNode),
}

/// A field selection.
#[derive(Debug, Clone)]
pub struct FieldNode {
    pub alias: Option<String>,
    pub name: String,
    pub arguments: Vec<(String, AstValue)>,
    pub directives: Vec<Directive>,
    pub selections: Vec<Selection>,
    pub location: Option<Location>,
}

impl FieldNode {
    /// Creates a new field selection.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            alias: None,
            name: name.into(),
            arguments: Vec::new(),
            directives: Vec::new(),
            selections: Vec::new(),
            location: None,
        }
    }

    /// Sets the alias.
    pub fn aliased(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Adds an argument value.
    pub fn with_argument(mut self, name: impl Into<String>, value: AstValue) -> Self {
        self.arguments.push((name.into(), value));
        self
    }

    /// Adds a directive application.
    pub fn with_directive(mut self, directive: Directive) -> Self {
        self.directives.push(directive);
        self
    }

    /// Adds a sub-selection.
    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selections.push(selection);
        self
    }

    /// Sets the source location.
    pub fn at(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// The key this field's value appears under in the response.
    pub fn response_key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

impl From<FieldNode> for Selection {
    fn from(node: FieldNode) -> Self {
        Selection::Field(node)
    }
}

/// A fragment spread selection.
#[derive(Debug, Clone)]
pub struct SpreadNode {
    pub name: String,
    pub directives: Vec<Directive>,
}

impl SpreadNode {
    /// Creates a new spread of the named fragment.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            directives: Vec::new(),
        }
    }

    /// Adds a directive application.
    pub fn with_directive(mut self, directive: Directive) -> Self {
        self.directives.push(directive);
        self
    }
}

impl From<SpreadNode> for Selection {
    fn from(node: SpreadNode) -> Self {
        Selection::FragmentSpread(node)
    }
}

/// An inline fragment selection.
#[derive(Debug, Clone)]
pub struct InlineFragmentNode {
    pub type_condition: Option<String>,
    pub directives: Vec<Directive>,
    pub selections: Vec<Selection>,
}

impl InlineFragmentNode {
    /// Creates a new inline fragment.
    pub fn new(type_condition: Option<&str>) -> Self {
        Self {
            type_condition: type_condition.map(str::to_string),
            directives: Vec::new(),
            selections: Vec::new(),
        }
    }

    /// Adds a directive application.
    pub fn with_directive(mut self, directive: Directive) -> Self {
        self.directives.push(directive);
        self
    }

    /// Adds a sub-selection.
    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selections.push(selection);
        self
    }
}

impl From<InlineFragmentNode> for Selection {
    fn from(node: InlineFragmentNode) -> Self {
        Selection::InlineFragment(node)
    }
}

/// A directive application on a selection node.
#[derive(Debug, Clone)]
pub struct Directive {
    pub name: String,
    pub arguments: Vec<(String, AstValue)>,
}

impl Directive {
    /// Creates a new directive application.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: Vec::new(),
        }
    }

    /// Adds an argument value.
    pub fn with_argument(mut self, name: impl Into<String>, value: AstValue) -> Self {
        self.arguments.push((name.into(), value));
        self
    }
}
