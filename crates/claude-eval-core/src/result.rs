//! Evaluation result types
//!
//! Immutable records produced once per evaluation; `overall` is always the
//! conjunction of the per-criterion verdicts.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Verdict for one criterion checked against a model response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriterionResult {
    pub criterion: String,
    pub passed: bool,
    pub reason: String,
}

/// Aggregated verdict for one evaluation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub overall: bool,
    pub criteria: Vec<CriterionResult>,
}

impl EvaluationResult {
    /// Build a result from per-criterion verdicts. `overall` is the AND of
    /// every `passed` flag; an empty list is vacuously passing.
    pub fn from_criteria(criteria: Vec<CriterionResult>) -> Self {
        let overall = criteria.iter().all(|c| c.passed);
        Self { overall, criteria }
    }

    /// Synthetic failing result for a task that errored before producing a
    /// verdict. The sole criterion is named "File processing" so callers have
    /// a single failure shape to handle.
    pub fn failure(reason: impl Into<String>) -> Self {
        Self {
            overall: false,
            criteria: vec![CriterionResult {
                criterion: "File processing".to_string(),
                passed: false,
                reason: reason.into(),
            }],
        }
    }

    /// Number of criteria that passed
    pub fn passed_count(&self) -> usize {
        self.criteria.iter().filter(|c| c.passed).count()
    }
}

/// Pairs a task back to its outcome in a batch run.
///
/// The collection returned by a batch follows dispatch order, not completion
/// order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResult {
    pub file: PathBuf,
    pub result: EvaluationResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn criterion(name: &str, passed: bool) -> CriterionResult {
        CriterionResult {
            criterion: name.to_string(),
            passed,
            reason: String::new(),
        }
    }

    #[test]
    fn test_overall_is_conjunction() {
        let result = EvaluationResult::from_criteria(vec![
            criterion("a", true),
            criterion("b", true),
        ]);
        assert!(result.overall);

        let result = EvaluationResult::from_criteria(vec![
            criterion("a", true),
            criterion("b", false),
        ]);
        assert!(!result.overall);
        assert_eq!(result.passed_count(), 1);
    }

    #[test]
    fn test_empty_criteria_is_vacuously_passing() {
        let result = EvaluationResult::from_criteria(Vec::new());
        assert!(result.overall);
        assert!(result.criteria.is_empty());
    }

    #[test]
    fn test_failure_shape() {
        let result = EvaluationResult::failure("claude not found");
        assert!(!result.overall);
        assert_eq!(result.criteria.len(), 1);
        assert_eq!(result.criteria[0].criterion, "File processing");
        assert!(!result.criteria[0].passed);
        assert_eq!(result.criteria[0].reason, "claude not found");
    }

    #[test]
    fn test_serialization_round_trip() {
        let result = EvaluationResult::from_criteria(vec![criterion("defines a function", true)]);
        let json = serde_json::to_string(&result).unwrap();
        let back: EvaluationResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }
}
