//! LLM-as-a-judge scoring of model responses
//!
//! A second, cheaper model call scores the primary response against the
//! spec's criteria. The response parser is deliberately positional: the i-th
//! marker line answers the i-th criterion, regardless of wording. That
//! misattributes verdicts when the judge reorders or merges lines; the
//! behavior is kept because callers depend on it (see DESIGN.md).

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::timeout;

use crate::client::DEFAULT_TIMEOUT;
use crate::error::{EvalError, EvalResult};
use crate::model::{JUDGE_MODEL, ModelEvent, ModelService, QueryOptions};
use crate::progress::ProgressSink;
use crate::result::{CriterionResult, EvaluationResult};

const PASS_MARKER: &str = "✅";
const FAIL_MARKER: &str = "❌";

/// Preview length for streamed judge output
const JUDGE_PARTIAL_LEN: usize = 150;

/// Scores a raw model response against a criteria list via a judge call.
///
/// `evaluate` is total: every failure of the underlying call is folded into
/// an all-criteria-failed result instead of propagating.
#[derive(Clone)]
pub struct JudgeEvaluator {
    service: Arc<dyn ModelService>,
    model: String,
    timeout: Duration,
}

impl JudgeEvaluator {
    pub fn new(service: Arc<dyn ModelService>) -> Self {
        Self {
            service,
            model: JUDGE_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Judge `response` against `criteria`, in order.
    pub async fn evaluate(
        &self,
        response: &str,
        criteria: &[String],
        sink: &dyn ProgressSink,
    ) -> EvaluationResult {
        let start = Instant::now();
        sink.step_started(&format!(
            "Evaluating response against {} criteria",
            criteria.len()
        ));
        sink.debug(&format!(
            "Response length: {} characters",
            response.chars().count()
        ));

        let prompt = build_judge_prompt(response, criteria);
        sink.log_judge_prompt(&prompt);

        match self.run_judge(&prompt, sink).await {
            Ok(judge_response) => {
                sink.log_judge_response(&judge_response);
                let result =
                    EvaluationResult::from_criteria(parse_judge_response(&judge_response, criteria));
                sink.evaluation_step_completed(
                    &format!(
                        "Evaluation complete ({}/{} criteria passed)",
                        result.passed_count(),
                        criteria.len()
                    ),
                    &result,
                    Some(start.elapsed()),
                );
                result
            }
            Err(e) => {
                sink.step_failed("Judge evaluation", Some(&e.to_string()));
                EvaluationResult {
                    overall: false,
                    criteria: criteria
                        .iter()
                        .map(|criterion| CriterionResult {
                            criterion: criterion.clone(),
                            passed: false,
                            reason: "Evaluation error".to_string(),
                        })
                        .collect(),
                }
            }
        }
    }

    async fn run_judge(&self, prompt: &str, sink: &dyn ProgressSink) -> EvalResult<String> {
        let options = QueryOptions::for_model(&self.model);
        let drain = async {
            let mut rx = self.service.query(prompt, &options).await?;
            let mut text = String::new();
            while let Some(event) = rx.recv().await {
                if let ModelEvent::Result { result, is_error } = event? {
                    if is_error {
                        return Err(EvalError::judge(
                            result.unwrap_or_else(|| "judge reported an error result".to_string()),
                        ));
                    }
                    if let Some(chunk) = result {
                        if !chunk.is_empty() {
                            text.push_str(&chunk);
                            sink.partial_response(&text, JUDGE_PARTIAL_LEN);
                        }
                    }
                }
            }
            Ok(text)
        };

        match timeout(self.timeout, drain).await {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => match e {
                judge @ EvalError::Judge(_) => Err(judge),
                other => Err(EvalError::judge(other.to_string())),
            },
            Err(_) => Err(EvalError::judge(format!(
                "timed out after {} seconds",
                self.timeout.as_secs()
            ))),
        }
    }
}

fn build_judge_prompt(response: &str, criteria: &[String]) -> String {
    let numbered = criteria
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{}. {c}", i + 1))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are an evaluation judge. Evaluate the following response against \
         the given criteria.\n\n\
         Response to evaluate:\n{response}\n\n\
         Criteria to evaluate against:\n{numbered}\n\n\
         For each criterion, respond with either:\n\
         - {PASS_MARKER} [Brief reason why it passes]\n\
         - {FAIL_MARKER} [Brief reason why it fails]\n\n\
         Format your response clearly with one line per criterion."
    )
}

/// Positional verdict extraction: filter the judge text to marker lines,
/// then take the i-th such line for the i-th criterion. Criteria beyond the
/// last marker line default to failing with "No clear evaluation found".
fn parse_judge_response(judge_response: &str, criteria: &[String]) -> Vec<CriterionResult> {
    let relevant: Vec<&str> = judge_response
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter(|line| {
            let lower = line.to_lowercase();
            line.contains(PASS_MARKER)
                || line.contains(FAIL_MARKER)
                || lower.contains("pass")
                || lower.contains("fail")
        })
        .collect();

    criteria
        .iter()
        .enumerate()
        .map(|(index, criterion)| {
            let mut passed = false;
            let mut reason = "No clear evaluation found".to_string();

            if let Some(line) = relevant.get(index) {
                let lower = line.to_lowercase();
                if line.contains(PASS_MARKER) || lower.contains("pass") {
                    passed = true;
                    reason = line.replace(PASS_MARKER, "").trim().to_string();
                } else if line.contains(FAIL_MARKER) || lower.contains("fail") {
                    passed = false;
                    reason = line.replace(FAIL_MARKER, "").trim().to_string();
                }
            }

            CriterionResult {
                criterion: criterion.clone(),
                passed,
                reason,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoopSink;
    use async_trait::async_trait;
    use tokio::sync::mpsc;

    fn criteria(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_pass_and_fail_markers_in_order() {
        let judge_text = "✅ defines the function\n❌ does not return the sum";
        let results = parse_judge_response(judge_text, &criteria(&["first", "second"]));
        assert_eq!(results.len(), 2);
        assert!(results[0].passed);
        assert_eq!(results[0].reason, "defines the function");
        assert!(!results[1].passed);
        assert_eq!(results[1].reason, "does not return the sum");
    }

    #[test]
    fn test_parse_zero_marker_lines_defaults_to_failed() {
        let judge_text = "I could not really tell.\nMaybe?";
        let results = parse_judge_response(judge_text, &criteria(&["a", "b"]));
        for result in &results {
            assert!(!result.passed);
            assert_eq!(result.reason, "No clear evaluation found");
        }
    }

    #[test]
    fn test_parse_fewer_lines_than_criteria() {
        let judge_text = "✅ looks good";
        let results = parse_judge_response(judge_text, &criteria(&["a", "b", "c"]));
        assert!(results[0].passed);
        assert!(!results[1].passed);
        assert_eq!(results[1].reason, "No clear evaluation found");
        assert!(!results[2].passed);
    }

    #[test]
    fn test_parse_bare_pass_fail_words() {
        let judge_text = "1. PASS - defines a function\n2. fail: no sum";
        let results = parse_judge_response(judge_text, &criteria(&["a", "b"]));
        assert!(results[0].passed);
        assert_eq!(results[0].reason, "1. PASS - defines a function");
        assert!(!results[1].passed);
        assert_eq!(results[1].reason, "2. fail: no sum");
    }

    #[test]
    fn test_parse_skips_prose_between_marker_lines() {
        let judge_text = "Here is my evaluation:\n\n✅ good\nSome commentary.\n❌ bad";
        let results = parse_judge_response(judge_text, &criteria(&["a", "b"]));
        assert!(results[0].passed);
        assert!(!results[1].passed);
    }

    #[test]
    fn test_parse_is_positional_not_semantic() {
        // Marker lines are consumed in order even if the judge answered the
        // criteria in reverse; this misattribution is intentional.
        let judge_text = "❌ the second criterion fails\n✅ the first criterion passes";
        let results = parse_judge_response(judge_text, &criteria(&["first", "second"]));
        assert!(!results[0].passed);
        assert!(results[1].passed);
    }

    #[test]
    fn test_judge_prompt_numbers_criteria() {
        let prompt = build_judge_prompt("the response", &criteria(&["one", "two"]));
        assert!(prompt.contains("Response to evaluate:\nthe response"));
        assert!(prompt.contains("1. one\n2. two"));
        assert!(prompt.contains("one line per criterion"));
    }

    struct ScriptedJudge {
        reply: EvalResult<&'static str>,
    }

    #[async_trait]
    impl ModelService for ScriptedJudge {
        async fn query(
            &self,
            _prompt: &str,
            _options: &QueryOptions,
        ) -> EvalResult<crate::model::ModelEventReceiver> {
            let (tx, rx) = mpsc::channel(4);
            match &self.reply {
                Ok(text) => {
                    let _ = tx
                        .send(Ok(ModelEvent::Result {
                            result: Some(text.to_string()),
                            is_error: false,
                        }))
                        .await;
                }
                Err(e) => {
                    let _ = tx.send(Err(e.clone())).await;
                }
            }
            Ok(rx)
        }
    }

    #[tokio::test]
    async fn test_evaluate_scenario_both_pass() {
        let judge = JudgeEvaluator::new(Arc::new(ScriptedJudge {
            reply: Ok("✅ defines function\n✅ returns sum"),
        }));
        let result = judge
            .evaluate(
                "function add(a,b){return a+b}",
                &criteria(&["Should define a function", "Should return the sum"]),
                &NoopSink,
            )
            .await;
        assert!(result.overall);
        assert!(result.criteria.iter().all(|c| c.passed));
        assert_eq!(result.criteria[0].reason, "defines function");
    }

    #[tokio::test]
    async fn test_evaluate_empty_criteria_is_vacuously_true() {
        let judge = JudgeEvaluator::new(Arc::new(ScriptedJudge {
            reply: Ok("nothing to say"),
        }));
        let result = judge.evaluate("whatever", &[], &NoopSink).await;
        assert!(result.overall);
        assert!(result.criteria.is_empty());
    }

    #[tokio::test]
    async fn test_evaluate_never_propagates_model_failure() {
        let judge = JudgeEvaluator::new(Arc::new(ScriptedJudge {
            reply: Err(EvalError::transport("claude not found")),
        }));
        let result = judge
            .evaluate("whatever", &criteria(&["a", "b"]), &NoopSink)
            .await;
        assert!(!result.overall);
        assert_eq!(result.criteria.len(), 2);
        for criterion in &result.criteria {
            assert!(!criterion.passed);
            assert_eq!(criterion.reason, "Evaluation error");
        }
    }
}
