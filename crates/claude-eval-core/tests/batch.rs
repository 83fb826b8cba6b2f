//! End-to-end batch scenarios against a scripted model service

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use claude_eval_core::{
    BatchOptions, EvalError, EvalResult, EvalRunner, ModelEvent, ModelEventReceiver, ModelService,
    NoopSink, ProgressLevel, QueryOptions, TerminalProgressManager,
};

/// Replays canned responses: primary prompts are answered by substring match,
/// judge prompts by a fixed verdict block.
struct ReplayModel {
    /// prompt substring -> primary response
    responses: HashMap<&'static str, &'static str>,
    judge_reply: &'static str,
}

#[async_trait]
impl ModelService for ReplayModel {
    async fn query(&self, prompt: &str, _options: &QueryOptions) -> EvalResult<ModelEventReceiver> {
        let is_judge = prompt.starts_with("You are an evaluation judge");
        let text = if is_judge {
            self.judge_reply.to_string()
        } else {
            match self
                .responses
                .iter()
                .find(|(marker, _)| prompt.contains(**marker))
            {
                Some((_, reply)) => reply.to_string(),
                None => return Err(EvalError::transport("claude binary not found")),
            }
        };

        let (tx, rx) = mpsc::channel(4);
        let _ = tx
            .send(Ok(ModelEvent::Result {
                result: Some(text),
                is_error: false,
            }))
            .await;
        Ok(rx)
    }
}

fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn quiet_options(concurrency: usize) -> BatchOptions {
    BatchOptions::new(
        concurrency,
        Arc::new(TerminalProgressManager::new(ProgressLevel::Quiet)),
    )
}

#[tokio::test]
async fn add_function_scenario_passes_both_criteria() {
    let dir = tempfile::tempdir().unwrap();
    let spec = write_file(
        dir.path(),
        "add.yaml",
        "prompt: Write add(a,b)\n\
         expected_behavior:\n\
         \x20 - Should define a function\n\
         \x20 - Should return the sum\n",
    );

    let model = ReplayModel {
        responses: HashMap::from([("Write add(a,b)", "function add(a,b){return a+b}")]),
        judge_reply: "✅ defines function\n✅ returns sum",
    };
    let runner = EvalRunner::with_service(Arc::new(model));

    let result = runner.run_single(&spec, &NoopSink).await.unwrap();
    assert!(result.overall);
    assert_eq!(result.criteria.len(), 2);
    assert!(result.criteria.iter().all(|c| c.passed));
    assert_eq!(result.criteria[0].criterion, "Should define a function");
    assert_eq!(result.criteria[0].reason, "defines function");
    assert_eq!(result.criteria[1].reason, "returns sum");
}

#[tokio::test]
async fn transport_failure_is_isolated_to_its_task() {
    let dir = tempfile::tempdir().unwrap();
    let doomed = write_file(
        dir.path(),
        "doomed.yaml",
        "prompt: unknown prompt\nexpected_behavior:\n  - anything\n",
    );
    let fine = write_file(
        dir.path(),
        "fine.yaml",
        "prompt: Write add(a,b)\nexpected_behavior:\n  - Should define a function\n",
    );

    let model = ReplayModel {
        responses: HashMap::from([("Write add(a,b)", "function add(a,b){return a+b}")]),
        judge_reply: "✅ defines function",
    };
    let runner = EvalRunner::with_service(Arc::new(model));

    let results = runner
        .run_batch(vec![doomed.clone(), fine.clone()], quiet_options(2))
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].file, doomed);
    assert!(!results[0].result.overall);
    assert_eq!(results[0].result.criteria.len(), 1);
    assert_eq!(results[0].result.criteria[0].criterion, "File processing");
    assert!(
        results[0].result.criteria[0]
            .reason
            .contains("claude binary not found")
    );
    assert_eq!(results[1].file, fine);
    assert!(results[1].result.overall);
}

#[tokio::test]
async fn batch_output_length_and_order_match_input() {
    let dir = tempfile::tempdir().unwrap();
    let files: Vec<PathBuf> = (0..6)
        .map(|i| {
            write_file(
                dir.path(),
                &format!("spec{i}.yaml"),
                "prompt: Write add(a,b)\nexpected_behavior:\n  - Should define a function\n",
            )
        })
        .collect();

    let model = ReplayModel {
        responses: HashMap::from([("Write add(a,b)", "function add(a,b){return a+b}")]),
        judge_reply: "✅ defines function",
    };
    let runner = EvalRunner::with_service(Arc::new(model));

    let results = runner
        .run_batch(files.clone(), quiet_options(3))
        .await
        .unwrap();
    assert_eq!(results.len(), files.len());
    for (result, file) in results.iter().zip(&files) {
        assert_eq!(&result.file, file);
    }
}

#[tokio::test]
async fn judge_without_markers_fails_every_criterion() {
    let dir = tempfile::tempdir().unwrap();
    let spec = write_file(
        dir.path(),
        "vague.yaml",
        "prompt: Write add(a,b)\nexpected_behavior:\n  - a\n  - b\n",
    );

    let model = ReplayModel {
        responses: HashMap::from([("Write add(a,b)", "some response")]),
        judge_reply: "I am not sure what to make of this.",
    };
    let runner = EvalRunner::with_service(Arc::new(model));

    let result = runner.run_single(&spec, &NoopSink).await.unwrap();
    assert!(!result.overall);
    for criterion in &result.criteria {
        assert!(!criterion.passed);
        assert_eq!(criterion.reason, "No clear evaluation found");
    }
}
