//! Required-claim matching
//!
//! A claim requirement is an arbitrary JSON mapping. Each leaf becomes one
//! condition on the token's claims:
//! - scalars must be equal,
//! - arrays require every listed element to appear in the token's array,
//! - objects recurse per key,
//! - empty arrays and objects only require the claim to be present.
//!
//! The same semantics are available as Rego conditions ([`ClaimRequirements::compile`])
//! and as a Rust check ([`ClaimRequirements::is_satisfied_by`]).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Root of the token claims in the policy input document
pub const INPUT_CLAIMS_ROOT: &str = "input.token.claims";

/// Key the requirements are bound under in the policy data document
pub const DATA_KEY: &str = "required_claims";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClaimRequirements(BTreeMap<String, Value>);

impl ClaimRequirements {
    pub fn new(claims: BTreeMap<String, Value>) -> Self {
        ClaimRequirements(claims)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &BTreeMap<String, Value> {
        &self.0
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.0.insert(name.into(), value);
    }

    /// Merge another set in, later keys replacing earlier ones
    pub fn extend(&mut self, other: &ClaimRequirements) {
        for (name, value) in &other.0 {
            self.0.insert(name.clone(), value.clone());
        }
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.0.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }

    /// Rego body expressions, one per leaf, comparing the token claims to
    /// `data.required_claims`.
    pub fn compile(&self) -> Vec<String> {
        let mut conditions = Vec::new();
        for (name, value) in &self.0 {
            compile_value(&[name.as_str()], value, &mut conditions);
        }
        conditions
    }

    pub fn is_satisfied_by(&self, claims: &Value) -> bool {
        self.0
            .iter()
            .all(|(name, required)| claim_matches(claims.get(name), required))
    }
}

fn rego_ref(root: &str, path: &[&str]) -> String {
    let mut out = root.to_string();
    for segment in path {
        // JSON string literals are valid Rego strings
        let quoted = serde_json::to_string(segment).unwrap_or_else(|_| format!("\"{}\"", segment));
        out.push('[');
        out.push_str(&quoted);
        out.push(']');
    }
    out
}

fn compile_value(path: &[&str], value: &Value, out: &mut Vec<String>) {
    let input = rego_ref(INPUT_CLAIMS_ROOT, path);
    let data = rego_ref(&format!("data.{}", DATA_KEY), path);

    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, nested) in map {
                let mut nested_path = path.to_vec();
                nested_path.push(key.as_str());
                compile_value(&nested_path, nested, out);
            }
        }
        Value::Array(items) if !items.is_empty() => {
            for index in 0..items.len() {
                out.push(format!("{}[{}] == {}[_]", data, index, input));
            }
        }
        Value::Object(_) | Value::Array(_) => out.push(input),
        _ => out.push(format!("{} == {}", input, data)),
    }
}

fn claim_matches(actual: Option<&Value>, required: &Value) -> bool {
    let Some(actual) = actual else {
        return false;
    };

    match required {
        Value::Object(map) if !map.is_empty() => map
            .iter()
            .all(|(key, nested)| claim_matches(actual.get(key), nested)),
        Value::Array(items) if !items.is_empty() => match actual {
            Value::Array(present) => items
                .iter()
                .all(|item| present.iter().any(|p| values_equal(p, item))),
            _ => false,
        },
        // Presence: Rego treats a bare `false` reference as a failed condition
        Value::Object(_) | Value::Array(_) => !matches!(actual, Value::Bool(false)),
        _ => values_equal(actual, required),
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(p, q)| values_equal(p, q))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x
                    .iter()
                    .all(|(k, v)| y.get(k).is_some_and(|w| values_equal(v, w)))
        }
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn requirements(value: Value) -> ClaimRequirements {
        serde_json::from_value(value).unwrap_or_default()
    }

    #[test]
    fn test_scalar_compiles_to_equality() {
        let reqs = requirements(json!({"tier": "gold"}));
        assert_eq!(
            reqs.compile(),
            vec![r#"input.token.claims["tier"] == data.required_claims["tier"]"#]
        );
    }

    #[test]
    fn test_array_compiles_to_containment() {
        let reqs = requirements(json!({"roles": ["admin", "dev"]}));
        assert_eq!(
            reqs.compile(),
            vec![
                r#"data.required_claims["roles"][0] == input.token.claims["roles"][_]"#,
                r#"data.required_claims["roles"][1] == input.token.claims["roles"][_]"#,
            ]
        );
    }

    #[test]
    fn test_nested_object_recurses() {
        let reqs = requirements(json!({"org": {"plan": "pro", "seats": 5}}));
        let compiled = reqs.compile();
        assert_eq!(compiled.len(), 2);
        assert!(compiled[0].contains(r#"["org"]["plan"]"#));
        assert!(compiled[1].contains(r#"["org"]["seats"]"#));
    }

    #[test]
    fn test_empty_collection_means_presence() {
        let reqs = requirements(json!({"groups": []}));
        assert_eq!(reqs.compile(), vec![r#"input.token.claims["groups"]"#]);
        assert!(reqs.is_satisfied_by(&json!({"groups": ["a"]})));
        assert!(!reqs.is_satisfied_by(&json!({})));
    }

    #[test]
    fn test_keys_are_quoted() {
        let reqs = requirements(json!({"https://example.com/role": "x"}));
        assert!(reqs.compile()[0].contains(r#"["https://example.com/role"]"#));
    }

    #[test]
    fn test_is_satisfied_by() {
        let reqs = requirements(json!({
            "roles": ["admin"],
            "verified": true,
            "level": 3,
            "org": {"plan": "pro"}
        }));

        assert!(reqs.is_satisfied_by(&json!({
            "roles": ["dev", "admin"],
            "verified": true,
            "level": 3.0,
            "org": {"plan": "pro", "seats": 10}
        })));
        assert!(!reqs.is_satisfied_by(&json!({
            "roles": ["dev"],
            "verified": true,
            "level": 3,
            "org": {"plan": "pro"}
        })));
        assert!(!reqs.is_satisfied_by(&json!({
            "roles": ["admin"],
            "verified": false,
            "level": 3,
            "org": {"plan": "pro"}
        })));
        assert!(!reqs.is_satisfied_by(&json!({"roles": "admin"})));
    }

    #[test]
    fn test_extend_overrides() {
        let mut reqs = requirements(json!({"a": 1, "b": 2}));
        reqs.extend(&requirements(json!({"b": 3})));
        assert_eq!(reqs.to_value(), json!({"a": 1, "b": 3}));
    }
}
