//! High-level model client: prompt wrapping, stream draining, timeouts

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::timeout;

use crate::error::{EvalError, EvalResult};
use crate::model::{ModelEvent, ModelService, PRIMARY_MODEL, QueryOptions};
use crate::progress::ProgressSink;

/// Default ceiling for one model call
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(180);

/// Drives one [`ModelService`] call for the primary evaluation prompt:
/// wraps the prompt, drains the event stream, enforces the deadline, and
/// narrates through the task's sink.
#[derive(Clone)]
pub struct ModelClient {
    service: Arc<dyn ModelService>,
    model: String,
    timeout: Duration,
}

impl ModelClient {
    pub fn new(service: Arc<dyn ModelService>) -> Self {
        Self {
            service,
            model: PRIMARY_MODEL.to_string(),
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

    /// Execute a prompt and return the model's final text response.
    pub async fn execute(
        &self,
        prompt: &str,
        cwd: Option<&Path>,
        sink: &dyn ProgressSink,
    ) -> EvalResult<String> {
        let start = Instant::now();
        sink.step_started("Executing prompt with Claude Code");
        sink.debug(&format!(
            "Prompt length: {} characters",
            prompt.chars().count()
        ));

        let wrapped = wrap_prompt(prompt);
        sink.log_prompt(&wrapped);

        let options = QueryOptions::for_model(&self.model).with_cwd(cwd.map(Path::to_path_buf));
        sink.debug(&format!(
            "Starting model query with working directory: {}",
            cwd.map(|p| p.display().to_string())
                .unwrap_or_else(|| ".".to_string())
        ));

        match timeout(self.timeout, self.drain(&wrapped, &options, sink)).await {
            Ok(Ok(response)) => {
                sink.step_completed("Received response from Claude", Some(start.elapsed()));
                sink.debug(&format!(
                    "Response length: {} characters",
                    response.chars().count()
                ));
                sink.log_response(&response);
                Ok(response)
            }
            Ok(Err(e)) => {
                sink.step_failed("Claude API call", Some(&e.to_string()));
                Err(e)
            }
            Err(_) => {
                let e = EvalError::timeout(self.timeout.as_secs());
                sink.step_failed("Claude API call", Some(&e.to_string()));
                Err(e)
            }
        }
    }

    async fn drain(
        &self,
        prompt: &str,
        options: &QueryOptions,
        sink: &dyn ProgressSink,
    ) -> EvalResult<String> {
        let mut rx = self.service.query(prompt, options).await?;
        let mut response = String::new();
        while let Some(event) = rx.recv().await {
            if let ModelEvent::Result { result, is_error } = event? {
                if is_error {
                    return Err(EvalError::process(result.unwrap_or_else(|| {
                        "model reported an error result".to_string()
                    })));
                }
                if let Some(text) = result {
                    if !text.is_empty() {
                        response.push_str(&text);
                        sink.partial_response(&response, 200);
                    }
                }
            }
        }
        Ok(response)
    }
}

/// Instruction preamble keeping the primary call text-only: the evaluated
/// model must answer in prose, not reach for tools or the filesystem.
fn wrap_prompt(prompt: &str) -> String {
    format!(
        "Respond to the following prompt with text only. Do NOT use any tools, \
         create/modify/delete files, or execute commands. Just provide a direct \
         text response.\n\nUser prompt: {prompt}\n\nREMEMBER: Text response only, \
         no file operations or tool usage."
    )
}
