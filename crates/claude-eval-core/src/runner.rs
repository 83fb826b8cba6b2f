//! Batch scheduler and single-evaluation driver
//!
//! `run_single` drives one evaluation end to end; `run_batch` fans a file
//! list out under a semaphore-bounded concurrency cap, isolating per-task
//! failures and returning results in dispatch order.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;

use crate::client::ModelClient;
use crate::error::{EvalError, EvalResult};
use crate::judge::JudgeEvaluator;
use crate::model::{ClaudeCodeService, ModelService};
use crate::progress::{DirectSink, ProgressSink, TerminalProgressManager};
use crate::result::{BatchResult, EvaluationResult};
use crate::spec::parse_eval_spec;

/// Default number of evaluations in flight at once
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Options for a batch run
#[derive(Clone)]
pub struct BatchOptions {
    /// Hard ceiling on simultaneously-executing tasks; zero is clamped to one
    pub concurrency: usize,
    /// Coordinator owning the terminal for the duration of the batch
    pub manager: Arc<TerminalProgressManager>,
}

impl BatchOptions {
    pub fn new(concurrency: usize, manager: Arc<TerminalProgressManager>) -> Self {
        Self {
            concurrency,
            manager,
        }
    }
}

/// Runs evaluations against a model service, serially or as a bounded batch.
#[derive(Clone)]
pub struct EvalRunner {
    client: ModelClient,
    judge: JudgeEvaluator,
}

impl EvalRunner {
    /// Runner backed by the Claude Code CLI transport
    pub fn new() -> Self {
        Self::with_service(Arc::new(ClaudeCodeService::new()))
    }

    /// Runner backed by a custom transport; tests inject mocks here
    pub fn with_service(service: Arc<dyn ModelService>) -> Self {
        Self {
            client: ModelClient::new(Arc::clone(&service)),
            judge: JudgeEvaluator::new(service),
        }
    }

    /// Override the per-call deadline for both the primary and judge calls
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = self.client.with_timeout(timeout);
        self.judge = self.judge.with_timeout(timeout);
        self
    }

    /// Run one evaluation, narrating through `sink`.
    ///
    /// Unlike [`run_batch`](Self::run_batch), errors propagate to the caller;
    /// the sink still sees the synthetic failing result first.
    pub async fn run_single(
        &self,
        file: &Path,
        sink: &dyn ProgressSink,
    ) -> EvalResult<EvaluationResult> {
        let start = Instant::now();
        let display = file.display().to_string();
        sink.start_evaluation(&display);

        match self.run_single_inner(file, sink).await {
            Ok(result) => {
                sink.evaluation_completed(&display, &result, Some(start.elapsed()));
                Ok(result)
            }
            Err(e) => {
                sink.step_failed("Evaluation", Some(&e.to_string()));
                sink.debug(&e.details());
                let failure = EvaluationResult::failure(e.to_string());
                sink.evaluation_completed(&display, &failure, None);
                Err(e)
            }
        }
    }

    async fn run_single_inner(
        &self,
        file: &Path,
        sink: &dyn ProgressSink,
    ) -> EvalResult<EvaluationResult> {
        let yaml = tokio::fs::read_to_string(file)
            .await
            .map_err(|e| EvalError::spec(format!("failed to read {}: {e}", file.display())))?;
        let spec = parse_eval_spec(&yaml)?;
        sink.debug(&format!(
            "Found {} criteria to evaluate",
            spec.expected_behavior.len()
        ));

        // The spec file's directory becomes the model's working directory.
        let cwd = file
            .canonicalize()
            .unwrap_or_else(|_| file.to_path_buf())
            .parent()
            .map(Path::to_path_buf);

        let response = self.client.execute(&spec.prompt, cwd.as_deref(), sink).await?;
        Ok(self
            .judge
            .evaluate(&response, &spec.expected_behavior, sink)
            .await)
    }

    /// Run many evaluations under a concurrency cap.
    ///
    /// The returned collection matches the input order regardless of
    /// completion order, and its length always equals the input length.
    /// Individual task failures are folded into failing results; the only
    /// propagated error is an empty task list.
    pub async fn run_batch(
        &self,
        files: Vec<PathBuf>,
        options: BatchOptions,
    ) -> EvalResult<Vec<BatchResult>> {
        if files.is_empty() {
            return Err(EvalError::invalid_input("no evaluation files to run"));
        }

        let manager = options.manager;

        // A batch of one has no interleaving risk: report straight to the
        // terminal instead of buffering.
        if files.len() == 1 {
            let mut files = files;
            let file = files.remove(0);
            let sink = DirectSink::new(manager.level());
            let result = match self.run_single(&file, &sink).await {
                Ok(result) => result,
                Err(e) => EvaluationResult::failure(e.to_string()),
            };
            return Ok(vec![BatchResult { file, result }]);
        }

        let concurrency = options.concurrency.max(1);
        if options.concurrency == 0 {
            tracing::warn!("concurrency of 0 requested; clamping to 1");
        }

        manager.start_batch(files.len(), concurrency);
        manager.debug(&format!("Using concurrency limit of {concurrency}"));

        let file_list = files.clone();
        let semaphore = Arc::new(Semaphore::new(concurrency));
        let mut handles = Vec::with_capacity(files.len());

        for (index, file) in files.into_iter().enumerate() {
            let runner = self.clone();
            let manager = Arc::clone(&manager);
            let semaphore = Arc::clone(&semaphore);

            handles.push(tokio::spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("semaphore is never closed");
                let sink = manager.create_buffered_sink(index);

                match runner.run_single(&file, sink.as_ref()).await {
                    Ok(result) => {
                        let success = result.overall;
                        manager.mark_completed(index, success);
                        BatchResult { file, result }
                    }
                    Err(e) => {
                        manager.error(&format!("Failed to process {}: {e}", file.display()));
                        manager.mark_completed(index, false);
                        BatchResult {
                            file,
                            result: EvaluationResult::failure(e.to_string()),
                        }
                    }
                }
            }));
        }

        let mut results = Vec::with_capacity(handles.len());
        for (index, handle) in handles.into_iter().enumerate() {
            match handle.await {
                Ok(batch_result) => results.push(batch_result),
                Err(e) => {
                    // A panicked task still settles as a failing result and
                    // must not poison the rest of the batch.
                    tracing::warn!(index, error = %e, "evaluation task aborted");
                    manager.mark_completed(index, false);
                    results.push(BatchResult {
                        file: file_list[index].clone(),
                        result: EvaluationResult::failure(format!("evaluation task aborted: {e}")),
                    });
                }
            }
        }

        Ok(results)
    }
}

impl Default for EvalRunner {
    fn default() -> Self {
        Self::new()
    }
}
