//! Eval spec parsing and validation
//!
//! An eval spec is a small YAML document pairing a prompt with the behaviors
//! the judged response is expected to show. Validation happens here, before
//! any model call, so a broken spec surfaces as a pre-dispatch failure.

use serde::{Deserialize, Serialize};

use crate::error::{EvalError, EvalResult};

/// A parsed evaluation spec
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalSpec {
    /// Prompt sent to the model under evaluation
    pub prompt: String,

    /// Criteria the response is judged against, in order
    pub expected_behavior: Vec<String>,

    /// Optional human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Optional free-form category tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// Parse and validate a YAML eval spec.
///
/// An empty `expected_behavior` list is accepted; the judge treats it as
/// vacuously passing.
pub fn parse_eval_spec(yaml: &str) -> EvalResult<EvalSpec> {
    let value: serde_yaml::Value =
        serde_yaml::from_str(yaml).map_err(|e| EvalError::spec(format!("invalid YAML: {e}")))?;

    let prompt = match value.get("prompt") {
        Some(serde_yaml::Value::String(s)) if !s.is_empty() => s.clone(),
        Some(serde_yaml::Value::Null) | None => {
            return Err(EvalError::spec("prompt field is required"));
        }
        Some(serde_yaml::Value::String(_)) => {
            return Err(EvalError::spec("prompt field is required"));
        }
        Some(_) => return Err(EvalError::spec("prompt must be a string")),
    };

    let expected_behavior = match value.get("expected_behavior") {
        Some(serde_yaml::Value::Sequence(items)) => {
            let mut criteria = Vec::with_capacity(items.len());
            for item in items {
                match item.as_str() {
                    Some(s) => criteria.push(s.to_string()),
                    None => {
                        return Err(EvalError::spec("expected_behavior must be an array of strings"));
                    }
                }
            }
            criteria
        }
        Some(serde_yaml::Value::Null) | None => {
            return Err(EvalError::spec("expected_behavior field is required"));
        }
        Some(_) => return Err(EvalError::spec("expected_behavior must be an array")),
    };

    let description = value
        .get("description")
        .and_then(|v| v.as_str())
        .map(String::from);
    let category = value
        .get("category")
        .and_then(|v| v.as_str())
        .map(String::from);

    Ok(EvalSpec {
        prompt,
        expected_behavior,
        description,
        category,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_spec() {
        let yaml = r#"
prompt: Write a function add(a, b)
expected_behavior:
  - Should define a function
  - Should return the sum
"#;
        let spec = parse_eval_spec(yaml).unwrap();
        assert_eq!(spec.prompt, "Write a function add(a, b)");
        assert_eq!(spec.expected_behavior.len(), 2);
        assert!(spec.description.is_none());
    }

    #[test]
    fn test_parse_spec_with_optional_fields() {
        let yaml = r#"
prompt: Say hello
expected_behavior:
  - Should greet the user
description: A smoke test
category: greeting
"#;
        let spec = parse_eval_spec(yaml).unwrap();
        assert_eq!(spec.description.as_deref(), Some("A smoke test"));
        assert_eq!(spec.category.as_deref(), Some("greeting"));
    }

    #[test]
    fn test_missing_prompt() {
        let err = parse_eval_spec("expected_behavior:\n  - anything\n").unwrap_err();
        assert_eq!(err.to_string(), "prompt field is required");
    }

    #[test]
    fn test_empty_prompt_counts_as_missing() {
        let err = parse_eval_spec("prompt: \"\"\nexpected_behavior:\n  - anything\n").unwrap_err();
        assert_eq!(err.to_string(), "prompt field is required");
    }

    #[test]
    fn test_missing_expected_behavior() {
        let err = parse_eval_spec("prompt: hello\n").unwrap_err();
        assert_eq!(err.to_string(), "expected_behavior field is required");
    }

    #[test]
    fn test_expected_behavior_must_be_an_array() {
        let err = parse_eval_spec("prompt: hello\nexpected_behavior: nope\n").unwrap_err();
        assert_eq!(err.to_string(), "expected_behavior must be an array");
    }

    #[test]
    fn test_expected_behavior_items_must_be_strings() {
        let err =
            parse_eval_spec("prompt: hello\nexpected_behavior:\n  - 1\n  - two\n").unwrap_err();
        assert_eq!(err.to_string(), "expected_behavior must be an array of strings");
    }

    #[test]
    fn test_empty_expected_behavior_is_accepted() {
        let spec = parse_eval_spec("prompt: hello\nexpected_behavior: []\n").unwrap();
        assert!(spec.expected_behavior.is_empty());
    }

    #[test]
    fn test_invalid_yaml() {
        let err = parse_eval_spec("prompt: [unclosed\n").unwrap_err();
        assert!(err.to_string().starts_with("invalid YAML"));
    }
}
