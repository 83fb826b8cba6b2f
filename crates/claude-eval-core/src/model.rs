//! Model service seam and the Claude Code CLI transport
//!
//! The runner only depends on [`ModelService`]; the default implementation
//! spawns the `claude` binary in streaming-JSON mode and forwards its events
//! over a channel. Tests substitute scripted services at the same seam.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;

use crate::error::{EvalError, EvalResult};

/// Default model for primary evaluation prompts
pub const PRIMARY_MODEL: &str = "sonnet";

/// Default model for judge calls
pub const JUDGE_MODEL: &str = "haiku";

/// Options for one model query
#[derive(Debug, Clone)]
pub struct QueryOptions {
    pub model: String,
    pub cwd: Option<PathBuf>,
    pub permission_mode: String,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            model: PRIMARY_MODEL.to_string(),
            cwd: None,
            permission_mode: "default".to_string(),
        }
    }
}

impl QueryOptions {
    /// Options targeting a specific model with the default permission mode
    pub fn for_model(model: &str) -> Self {
        Self {
            model: model.to_string(),
            ..Self::default()
        }
    }

    /// Set the working directory the model process runs in
    pub fn with_cwd(mut self, cwd: Option<PathBuf>) -> Self {
        self.cwd = cwd;
        self
    }
}

/// One incremental event from the model transport.
///
/// Only `Result` events carry answer text; everything else is bookkeeping
/// the caller may ignore.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModelEvent {
    System {
        #[serde(default)]
        subtype: Option<String>,
    },
    Assistant {
        #[serde(default)]
        message: Option<serde_json::Value>,
    },
    Result {
        #[serde(default)]
        result: Option<String>,
        #[serde(default)]
        is_error: bool,
    },
    #[serde(other)]
    Other,
}

/// Receiving side of a model event stream
pub type ModelEventReceiver = mpsc::Receiver<EvalResult<ModelEvent>>;

/// Transport seam for language-model calls
#[async_trait]
pub trait ModelService: Send + Sync {
    /// Start a query and return the stream of incremental events.
    ///
    /// Transport failures surface either as an immediate `Err` (the process
    /// could not be launched) or as an `Err` item on the stream (the process
    /// died mid-flight).
    async fn query(&self, prompt: &str, options: &QueryOptions) -> EvalResult<ModelEventReceiver>;
}

/// [`ModelService`] backed by the Claude Code CLI in streaming JSON mode
pub struct ClaudeCodeService {
    binary: PathBuf,
}

impl ClaudeCodeService {
    pub fn new() -> Self {
        Self {
            binary: PathBuf::from("claude"),
        }
    }

    /// Use a specific binary instead of resolving `claude` from PATH
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for ClaudeCodeService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModelService for ClaudeCodeService {
    async fn query(&self, prompt: &str, options: &QueryOptions) -> EvalResult<ModelEventReceiver> {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("--print")
            .arg(prompt)
            .arg("--output-format")
            .arg("stream-json")
            .arg("--verbose")
            .arg("--model")
            .arg(&options.model)
            .arg("--permission-mode")
            .arg(&options.permission_mode)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(cwd) = &options.cwd {
            cmd.current_dir(cwd);
        }

        tracing::debug!(model = %options.model, "spawning model process");

        let mut child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                EvalError::transport(format!(
                    "{} not found; install the Claude Code CLI and ensure it is on PATH",
                    self.binary.display()
                ))
            } else {
                EvalError::transport(format!(
                    "failed to launch {}: {e}",
                    self.binary.display()
                ))
            }
        })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| EvalError::transport("model process stdout was not captured"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| EvalError::transport("model process stderr was not captured"))?;

        let (tx, rx) = mpsc::channel(64);
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let line = line.trim();
                        if line.is_empty() {
                            continue;
                        }
                        // Lines that are not valid events are skipped rather
                        // than failing the whole stream.
                        let event =
                            serde_json::from_str::<ModelEvent>(line).unwrap_or(ModelEvent::Other);
                        if tx.send(Ok(event)).await.is_err() {
                            // Receiver dropped (timeout or caller gone); the
                            // child is reaped through kill_on_drop.
                            return;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        let _ = tx
                            .send(Err(EvalError::transport(format!(
                                "failed to read model output: {e}"
                            ))))
                            .await;
                        return;
                    }
                }
            }

            let mut stderr_text = String::new();
            let _ = BufReader::new(stderr).read_to_string(&mut stderr_text).await;

            match child.wait().await {
                Ok(status) if status.success() => {}
                Ok(status) => {
                    let _ = tx
                        .send(Err(EvalError::process_exit(status.code(), stderr_text)))
                        .await;
                }
                Err(e) => {
                    let _ = tx
                        .send(Err(EvalError::transport(format!(
                            "failed to reap model process: {e}"
                        ))))
                        .await;
                }
            }
        });

        Ok(rx)
    }
}
