//! Constant and variable values attached to the document.

use serde_json::Value;
use std::collections::HashMap;

/// A literal value as written in the document, before variable substitution.
#[derive(Debug, Clone, PartialEq)]
pub enum AstValue {
    Variable(String),
    Int(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    Null,
    Enum(String),
    List(Vec<AstValue>),
    Object(Vec<(String, AstValue)>),
}

impl AstValue {
    /// Resolves this value against the request variables.
    ///
    /// An unbound variable resolves to null; validation has already ruled out
    /// variables that are required but undefined.
    pub fn resolve(&self, variables: &HashMap<String, Value>) -> Value {
        match self {
            Self::Variable(name) => variables.get(name).cloned().unwrap_or(Value::Null),
            Self::Int(i) => Value::from(*i),
            Self::Float(f) => Value::from(*f),
            Self::String(s) => Value::String(s.clone()),
            Self::Boolean(b) => Value::Bool(*b),
            Self::Null => Value::Null,
            Self::Enum(name) => Value::String(name.clone()),
            Self::List(items) => {
                Value::Array(items.iter().map(|v| v.resolve(variables)).collect())
            }
            Self::Object(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.resolve(variables)))
                    .collect(),
            ),
        }
    }
}

/// Coerced argument values keyed by argument name.
pub type CoercedArguments = HashMap<String, Value>;

/// Coerces the argument list of one node into concrete values.
///
/// Pure function: literals and variable references are resolved against
/// `variables`, then `defaults` fills in any argument the node did not
/// mention. Type-level coercion has already been performed by the validator.
pub fn coerce_arguments(
    arguments: &[(String, AstValue)],
    variables: &HashMap<String, Value>,
    defaults: &[(&str, Value)],
) -> CoercedArguments {
    let mut coerced: CoercedArguments = arguments
        .iter()
        .map(|(name, value)| (name.clone(), value.resolve(variables)))
        .collect();

    for (name, default) in defaults {
        coerced
            .entry((*name).to_string())
            .or_insert_with(|| default.clone());
    }

    coerced
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolve_literals() {
        let variables = HashMap::new();
        assert_eq!(AstValue::Int(42).resolve(&variables), json!(42));
        assert_eq!(AstValue::Boolean(true).resolve(&variables), json!(true));
        assert_eq!(AstValue::Enum("ACTIVE".into()).resolve(&variables), json!("ACTIVE"));
        assert_eq!(
            AstValue::List(vec![AstValue::Int(1), AstValue::Null]).resolve(&variables),
            json!([1, null])
        );
    }

    #[test]
    fn test_resolve_variable() {
        let mut variables = HashMap::new();
        variables.insert("size".to_string(), json!(100));

        assert_eq!(
            AstValue::Variable("size".into()).resolve(&variables),
            json!(100)
        );
        assert_eq!(
            AstValue::Variable("missing".into()).resolve(&variables),
            Value::Null
        );
    }

    #[test]
    fn test_coerce_arguments_with_defaults() {
        let mut variables = HashMap::new();
        variables.insert("id".to_string(), json!("42"));

        let arguments = vec![("id".to_string(), AstValue::Variable("id".into()))];
        let coerced = coerce_arguments(&arguments, &variables, &[("first", json!(10))]);

        assert_eq!(coerced.get("id"), Some(&json!("42")));
        assert_eq!(coerced.get("first"), Some(&json!(10)));
    }

    #[test]
    fn test_explicit_argument_wins_over_default() {
        let coerced = coerce_arguments(
            &[("first".to_string(), AstValue::Int(3))],
            &HashMap::new(),
            &[("first", json!(10))],
        );

        assert_eq!(coerced.get("first"), Some(&json!(3)));
    }
}
